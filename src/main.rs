use chat_relay::config::config_search_paths;
use chat_relay::{build_router, AppState, RelayConfig, ReqwestSender, SharedLogger};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "chat-relay",
    about = "Stateless chat relay: one request shape in, many LLM providers out",
    version
)]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides PORT and the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Request log file path
    #[arg(long, default_value = "chat-relay.log")]
    log_file: PathBuf,

    /// Print config search paths and exit
    #[arg(long)]
    show_config_paths: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.show_config_paths {
        println!("Config search paths:");
        for (i, path) in config_search_paths().iter().enumerate() {
            println!("  {}. {}", i + 1, path.display());
        }
        return Ok(());
    }

    let config = RelayConfig::resolve(cli.config.as_deref(), cli.port)?;

    let logger = SharedLogger::new(&cli.log_file)?;

    info!("chat-relay v{}", env!("CARGO_PKG_VERSION"));
    info!("  Port:      {}", config.port);
    info!("  Gemini:    {}", config.endpoints.gemini_base);
    info!("  OpenAI:    {}", config.endpoints.openai_url);
    info!("  Anthropic: {}", config.endpoints.anthropic_url);
    info!("  Timeout:   {}s", config.request_timeout_secs);
    info!("  Log file:  {}", cli.log_file.display());

    logger.info(
        "startup",
        format!(
            "Starting chat-relay port={} timeout={}s",
            config.port, config.request_timeout_secs
        ),
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
        .build()?;

    let port = config.port;
    let state = Arc::new(AppState {
        config,
        sender: Arc::new(ReqwestSender::new(client)),
        logger,
    });

    let app = build_router(state);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
