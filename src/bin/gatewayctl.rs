use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use route_gateway::net::address_file::{self, MANAGEMENT_URL_FILE};

#[derive(Parser)]
#[command(name = "gatewayctl")]
#[command(about = "Management CLI for route-gateway", long_about = None)]
struct Cli {
    /// Management API base URL; read from the runtime directory when omitted.
    #[arg(short, long)]
    url: Option<String>,

    #[arg(short, long, default_value = "/var/run/route-gateway")]
    runtime_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered routes
    Routes,
    /// Register or replace a route
    AddRoute { path: String, target: String },
    /// Show the configured gateway port
    Port,
    /// Change the gateway port (applies on restart)
    SetPort { port: u16 },
    /// Check gateway status
    Status,
    /// Dump Prometheus metrics
    Metrics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = match cli.url {
        Some(url) => url,
        None => address_file::read(&cli.runtime_path, MANAGEMENT_URL_FILE).map_err(|e| {
            format!(
                "cannot read {}: {e}; is the gateway running?",
                cli.runtime_path.join(MANAGEMENT_URL_FILE).display()
            )
        })?,
    };
    let base = base.trim_end_matches('/');
    let client = reqwest::Client::builder().no_proxy().build()?;

    let res = match cli.command {
        Commands::Routes => client.get(format!("{base}/v1/gateway/routes")).send().await?,
        Commands::AddRoute { path, target } => {
            client
                .post(format!("{base}/v1/gateway/routes"))
                .json(&json!({ "path": path, "target": target }))
                .send()
                .await?
        }
        Commands::Port => client.get(format!("{base}/v1/gateway/port")).send().await?,
        Commands::SetPort { port } => {
            client
                .put(format!("{base}/v1/gateway/port"))
                .json(&json!({ "port": port }))
                .send()
                .await?
        }
        Commands::Status => client.get(format!("{base}/v1/gateway/status")).send().await?,
        Commands::Metrics => {
            let res = client.get(format!("{base}/v1/gateway/metrics")).send().await?;
            print!("{}", res.text().await?);
            return Ok(());
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: management API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
