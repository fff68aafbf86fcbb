use clap::Parser;
use pkg_api::server::{ServerConfig, start_server};
use pkg_constants::network::{CONFIG_ENV, DEFAULT_PORT, PORT_ENV};
use pkg_constants::paths::DEFAULT_SERVER_CONFIG;
use pkg_types::config::{ServerConfigFile, load_config_file};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kube-status-server", about = "Live Kubernetes service status dashboard")]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, env = CONFIG_ENV, default_value = DEFAULT_SERVER_CONFIG)]
    config: String,

    /// Port to listen on
    #[arg(long, env = PORT_ENV)]
    port: Option<u16>,

    /// Kubeconfig file (defaults to $KUBECONFIG or ~/.kube/config)
    #[arg(long)]
    kubeconfig: Option<String>,

    /// Kubeconfig context to watch at startup
    #[arg(long)]
    context: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // Load config file (returns defaults if file not found)
    let file_cfg: ServerConfigFile = load_config_file(&cli.config)?;
    info!("Config file: {}", cli.config);

    // Merge: CLI args > config file > defaults
    let port = cli.port.or(file_cfg.port).unwrap_or(DEFAULT_PORT);
    let kubeconfig = cli.kubeconfig.or(file_cfg.kubeconfig).map(PathBuf::from);
    let context = cli.context.or(file_cfg.context);

    info!("Starting kube-status-server");
    info!("  Port:       {}", port);
    info!(
        "  Kubeconfig: {}",
        kubeconfig
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "default".to_string())
    );
    info!("  Context:    {}", context.as_deref().unwrap_or("current"));

    let config = ServerConfig {
        addr: SocketAddr::from(([0, 0, 0, 0], port)),
        kubeconfig,
        context,
    };

    start_server(config).await?;

    Ok(())
}
