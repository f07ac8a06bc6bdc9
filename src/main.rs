use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use chat_relay::config::{ServerArgs, UpstreamArgs, ViewArgs};
use chat_relay::constants;
use chat_relay::relay::RelayService;
use chat_relay::web_server::{self, WebConfig};
use chat_relay::{chat, upstream};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the relay server and the browser chat UI.
    Start(ServerArgs),
    /// Chat with a running relay server from the terminal.
    Chat {
        #[arg(long, env = "RELAY_URL", default_value = constants::DEFAULT_RELAY_URL, help = "Base URL of the relay server.")]
        server_url: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// List the models offered by the upstream provider.
    Models(UpstreamArgs),
}

async fn start(args: ServerArgs) -> Result<()> {
    let client = upstream::new_client(&args.upstream.to_config())
        .context("Failed to configure upstream client")?;
    let strategy = args.prompt_strategy()?;
    info!(
        provider = %client.provider(),
        model = client.model(),
        strategy = strategy.name(),
        "Relay configured"
    );

    let web_config = WebConfig {
        allowed_origin: args.allowed_origin.clone(),
        templates_dir: args.templates_dir.clone(),
        static_dir: args.static_dir.clone(),
        view: args.view.to_view(),
    };
    let app = web_server::build_router(RelayService::new(client, strategy), &web_config)?;

    let port = args.port;
    let mut web_server_handle = tokio::spawn(async move {
        if let Err(e) = web_server::start_web_server(port, app).await {
            error!("Web server failed: {:?}", e);
        }
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tokio::select! {
        _ = &mut ctrl_c => {
            info!("Ctrl-C received, initiating shutdown...");
        }
        res = &mut web_server_handle => {
            match res {
                Ok(_) => info!("Web server task completed unexpectedly."),
                Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                Err(e) => error!("Web server task failed: {:?}", e),
            }
        }
    }

    if !web_server_handle.is_finished() {
        info!("Aborting web server task...");
        web_server_handle.abort();
    }
    info!("Shutdown complete.");
    Ok(())
}

async fn list_models(args: UpstreamArgs) -> Result<()> {
    let client = upstream::new_client(&args.to_config())
        .context("Failed to configure upstream client")?;
    let models = client
        .list_models()
        .await
        .context("Failed to list upstream models")?;
    for model in models {
        println!("{} {:?}", model.name, model.supported_methods);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for API keys and the allowed origin)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,chat_relay=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start(args) => {
            info!("Starting relay server on port {}...", args.port);
            start(args).await?;
        }
        Commands::Chat { server_url, view } => {
            chat::run_chat(&server_url, view.to_view())
                .await
                .context("Chat session failed")?;
        }
        Commands::Models(args) => list_models(args).await?,
    }

    Ok(())
}
