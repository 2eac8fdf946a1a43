use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "status-cli")]
#[command(about = "Query the status listener of a running service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5051")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness probe
    Live,
    /// Readiness probe
    Ready,
    /// Prometheus metrics
    Metrics,
    /// Service name, uptime, readiness and listeners
    Vars,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Live => {
            let res = client.get(format!("{}/health/live", cli.url)).send().await?;
            print_probe("live", res).await?;
        }
        Commands::Ready => {
            let res = client.get(format!("{}/ready", cli.url)).send().await?;
            print_probe("ready", res).await?;
        }
        Commands::Metrics => {
            let res = client.get(format!("{}/metrics", cli.url)).send().await?;
            print!("{}", res.error_for_status()?.text().await?);
        }
        Commands::Vars => {
            let res = client.get(format!("{}/debug/pprof/vars", cli.url)).send().await?;
            let json: Value = res.error_for_status()?.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

async fn print_probe(probe: &str, res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if status.is_success() {
        println!("{probe}: ok");
        return Ok(());
    }

    eprintln!("{probe}: failing ({status})");
    if let Ok(text) = res.text().await {
        eprintln!("Response: {}", text);
    }
    std::process::exit(1);
}
