use anyhow::{Context, Result, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dealfinder::api::create_router;
use dealfinder::config::Config;
use dealfinder::orchestrator::{MAX_RESULTS, Orchestrator, SearchRequest};

#[derive(Parser)]
#[command(name = "dealfinder", about = "Find the cheapest online match for a product photo")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        static_dir: Option<String>,
    },
    /// Search once from the command line and print JSON
    Query {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value = "")]
        hint: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value_t = MAX_RESULTS)]
        max: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(true)
        .init();

    let config = Config::from_env();

    match cli.command {
        Command::Serve { bind, static_dir } => {
            let bind = bind.unwrap_or_else(|| config.bind_addr.clone());
            let static_dir = static_dir.unwrap_or_else(|| config.static_dir.clone());

            let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
            let app = create_router(orchestrator, &static_dir);

            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("Failed to bind {bind}"))?;
            tracing::info!("Listening on http://{}", bind);
            axum::serve(listener, app).await?;
        }
        Command::Query {
            image,
            hint,
            category,
            max,
        } => {
            let orchestrator = Orchestrator::from_config(&config)?.with_max_results(max);
            let request = SearchRequest {
                image_data: Some(read_data_url(&image)?),
                hint_text: Some(hint),
                category: Some(category),
            };
            let response = orchestrator.handle(request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }
    Ok(())
}

fn read_data_url(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let media_type = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        other => bail!("Unsupported image extension: {other:?}"),
    };
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(format!("data:{media_type};base64,{}", BASE64.encode(bytes)))
}
