use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "saga-ctl")]
#[command(about = "Operator CLI for the Saga Orchestrator Service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000", env = "SAGA_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the health report (database and cache status)
    Health,
    /// Dump the Prometheus metrics exposition
    Metrics,
    /// Query the saga API index
    Sagas,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{base}/health")).send().await?;
            // 503 still carries a report worth printing.
            print_json(res, true).await?;
        }
        Commands::Metrics => {
            let res = client.get(format!("{base}/metrics")).send().await?;
            let status = res.status();
            let body = res.text().await?;
            if status.is_success() {
                print!("{body}");
            } else {
                eprintln!("Error: metrics endpoint returned status {status}");
                eprintln!("Response: {body}");
            }
        }
        Commands::Sagas => {
            let res = client.get(format!("{base}/api/sagas")).send().await?;
            print_json(res, false).await?;
        }
    }

    Ok(())
}

async fn print_json(
    res: reqwest::Response,
    accept_unavailable: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let unavailable = status == reqwest::StatusCode::SERVICE_UNAVAILABLE;
    if !status.is_success() && !(accept_unavailable && unavailable) {
        eprintln!("Error: service returned status {status}");
        if let Ok(text) = res.text().await {
            eprintln!("Response: {text}");
        }
        return Ok(());
    }

    if unavailable {
        eprintln!("Service is unhealthy ({status})");
    }
    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
