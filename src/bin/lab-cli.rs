use std::sync::Arc;

use clap::{Parser, Subcommand};
use observability_lab::client::{LabClient, LabResponse};

#[derive(Parser)]
#[command(name = "lab-cli")]
#[command(about = "Traffic generator for the observability lab service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "LAB_URL", default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Health,
    /// Call /hello with an optional blocking delay
    Hello {
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
    },
    /// Square a number through /slow
    Slow {
        #[arg(short, long, default_value_t = 7)]
        x: i64,
        #[arg(long)]
        cache: bool,
    },
    /// Call /error with a failure probability
    Error {
        #[arg(long, default_value_t = 0.2)]
        rate: f64,
    },
    /// Send mixed traffic and print a status summary
    Burst {
        #[arg(short = 'n', long, default_value_t = 100)]
        requests: usize,
        #[arg(short, long, default_value_t = 10)]
        concurrency: usize,
        #[arg(long, default_value_t = 0.2)]
        error_rate: f64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Arc::new(LabClient::new(&cli.url));

    match cli.command {
        Commands::Health => print_response(client.health().await?)?,
        Commands::Hello { delay_ms } => print_response(client.hello(delay_ms).await?)?,
        Commands::Slow { x, cache } => print_response(client.slow(x, cache).await?)?,
        Commands::Error { rate } => print_response(client.error(rate).await?)?,
        Commands::Burst {
            requests,
            concurrency,
            error_rate,
        } => {
            let summary =
                LabClient::burst(client.clone(), requests, concurrency, error_rate).await;
            println!(
                "{} requests in {:.2?} ({} transport errors)",
                requests, summary.elapsed, summary.transport_errors
            );
            for (status, count) in &summary.statuses {
                println!("  {}: {}", status, count);
            }
        }
    }

    Ok(())
}

fn print_response(res: LabResponse) -> Result<(), Box<dyn std::error::Error>> {
    if !res.status.is_success() {
        eprintln!("Error: service returned status {}", res.status);
    }
    println!("{}", serde_json::to_string_pretty(&res.body)?);
    eprintln!(
        "status={} elapsed={:.2?} request_id={}",
        res.status,
        res.elapsed,
        res.request_id.as_deref().unwrap_or("-")
    );
    Ok(())
}
