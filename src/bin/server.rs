use clap::Parser;
use sheetstat::utils::{logger, validation::Validate};
use sheetstat::AppConfig;
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "sheetstat-server")]
#[command(about = "HTTP service that profiles, summarizes and exports uploaded files")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Bind address (overrides [server] host)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides [server] port and PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init_server_logger();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!(
        %addr,
        max_upload_mb = config.ingest.max_upload_mb,
        version = env!("CARGO_PKG_VERSION"),
        "sheetstat-server starting"
    );

    let app = sheetstat::server::router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
