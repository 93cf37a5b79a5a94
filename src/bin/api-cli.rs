use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "api-cli")]
#[command(about = "Operator CLI for the Secure E-Commerce API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hit the liveness endpoint
    Health,
    /// Send a request to any path and print the response
    Probe {
        /// Path relative to the base URL, e.g. /api/products
        path: String,

        #[arg(short, long, default_value = "GET")]
        method: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{base}/")).send().await?;
            let status = res.status();
            let text = res.text().await?;
            if status.is_success() {
                println!("{text}");
            } else {
                eprintln!("Error: API returned status {status}");
                eprintln!("Response: {text}");
            }
        }
        Commands::Probe { path, method } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let path = if path.starts_with('/') {
                path
            } else {
                format!("/{path}")
            };
            let res = client.request(method, format!("{base}{path}")).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    println!("Status: {status}");

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }
    Ok(())
}
