use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;
use url::Url;

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Management CLI for hot-router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the published generation
    Status,
    /// List routes and middleware
    Routes,
    /// Rebuild and publish a new generation
    Rebuild,
    /// Re-read the config file and apply it
    Reload,
    /// Enable a route by name
    EnableRoute { name: String },
    /// Disable a route by name
    DisableRoute { name: String },
    /// Enable every route in a group
    EnableGroup { group: String },
    /// Disable every route in a group
    DisableGroup { group: String },
    /// Enable a middleware
    EnableMiddleware { name: String },
    /// Disable a middleware
    DisableMiddleware { name: String },
}

impl Commands {
    /// Method and path segments under `/admin`. Segments are percent-encoded
    /// when joined, so names may contain `/` or spaces.
    fn request(&self) -> (Method, Vec<&str>) {
        match self {
            Commands::Status => (Method::GET, vec!["status"]),
            Commands::Routes => (Method::GET, vec!["routes"]),
            Commands::Rebuild => (Method::POST, vec!["rebuild"]),
            Commands::Reload => (Method::POST, vec!["reload"]),
            Commands::EnableRoute { name } => (Method::POST, vec!["routes", name.as_str(), "enable"]),
            Commands::DisableRoute { name } => (Method::POST, vec!["routes", name.as_str(), "disable"]),
            Commands::EnableGroup { group } => (Method::POST, vec!["groups", group.as_str(), "enable"]),
            Commands::DisableGroup { group } => (Method::POST, vec!["groups", group.as_str(), "disable"]),
            Commands::EnableMiddleware { name } => (Method::POST, vec!["middleware", name.as_str(), "enable"]),
            Commands::DisableMiddleware { name } => (Method::POST, vec!["middleware", name.as_str(), "disable"]),
        }
    }
}

/// `base` with `/admin/<segments...>` appended, each segment encoded.
fn admin_url(base: &str, segments: &[&str]) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| format!("{} cannot be used as a base URL", base))?
        .pop_if_empty()
        .push("admin")
        .extend(segments);
    Ok(url)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let (method, segments) = cli.command.request();
    let res = client
        .request(method, admin_url(&cli.url, &segments)?)
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
