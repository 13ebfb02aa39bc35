use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "kiosk-cli")]
#[command(about = "Management CLI for the kiosk configuration service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the reload timestamp and generation
    Status,
    /// Print the live configuration
    Show {
        /// Request-time override, e.g. --set refresh=30 (repeatable)
        #[arg(long = "set", value_parser = parse_key_value)]
        overrides: Vec<(String, String)>,
    },
    /// Ask the service to reload its config file now
    Reload,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/config/reload-timestamp", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Show { overrides } => {
            let res = client
                .get(format!("{}/config", cli.url))
                .query(&overrides)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Reload => {
            let res = client
                .post(format!("{}/config/reload", cli.url))
                .send()
                .await?;
            if res.status().is_success() {
                println!("Reload requested");
            } else {
                print_response(res).await?;
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
