use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use parley_bot::application::errors::ConfigError;
use parley_bot::application::SessionManager;
use parley_bot::domain::traits::Handler;
use parley_bot::infrastructure::adapters::ConsoleTransport;
use parley_bot::infrastructure::config::Config;
use parley_bot::infrastructure::gateway::{GatewayClient, HandlerEndpoint, RemoteInvocationGateway};

#[derive(Parser)]
#[command(name = "parley-bot")]
#[command(about = "A chat session that routes commands to pluggable handlers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "parley.yaml")]
    config: String,

    /// Gateway socket (overrides config)
    #[arg(short, long)]
    socket: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the session and block until logout
    Run,
    /// Send a message through a running session
    Send { to: String, body: String },
    /// Invoke a handler registered with a running session
    Invoke { key: String, command: String },
    /// Ask a running session what it knows about a contact
    Presence { jid: String },
    /// Serve a handler from this process and register it with a running session
    ServeHandler {
        key: String,
        /// Socket to serve the handler on
        #[arg(long)]
        endpoint: Option<PathBuf>,
    },
    /// Log a running session out
    Logout,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("parley-bot v{}", env!("CARGO_PKG_VERSION"));
            return;
        }
        Commands::InitConfig => {
            init_config();
            return;
        }
        _ => {}
    }

    let command = cli.command;
    let serving_session = matches!(command, Commands::Run);
    let config = load_config(&cli.config, cli.socket, serving_session);
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = rt.block_on(async {
        match command {
            Commands::Run => run_session(config).await,
            command => run_client(config, command).await,
        }
    });
    std::process::exit(code);
}

/// Resolve configuration. A session needs credentials from the file or the
/// environment; client commands only need the socket and fall back to defaults.
fn load_config(path: &str, socket_override: Option<PathBuf>, serving_session: bool) -> Config {
    let mut config = match Config::resolve(path) {
        Ok(config) => config,
        Err(ConfigError::MissingField(field)) if !serving_session => {
            tracing::debug!("Config {} not found and {} unset, using defaults", path, field);
            Config::default().with_env()
        }
        Err(e) => {
            tracing::error!("Config {} unusable: {}", path, e);
            std::process::exit(2);
        }
    };

    if let Some(socket) = socket_override {
        config.gateway.socket = socket;
    }
    config
}

async fn run_session(config: Config) -> i32 {
    // Configuration errors abort before any connection is made
    let options = match config.session_options() {
        Ok(options) => options,
        Err(e) => {
            tracing::error!("{}", e);
            return 2;
        }
    };

    tracing::info!("Starting parley-bot as {}", options.identity);
    let session = match SessionManager::start(Arc::new(ConsoleTransport::new()), options).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to start session: {}", e);
            return 1;
        }
    };

    let gateway = if config.gateway.enabled {
        match RemoteInvocationGateway::bind(&config.gateway.socket, session.clone()).await {
            Ok(gateway) => {
                let gateway = Arc::new(gateway);
                let serving = gateway.clone();
                Some(tokio::spawn(async move {
                    if let Err(e) = serving.serve().await {
                        tracing::error!("Gateway stopped: {}", e);
                    }
                }))
            }
            Err(e) => {
                tracing::warn!("Gateway disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    session.run().await;

    if let Some(gateway) = gateway {
        gateway.abort();
        let _ = gateway.await;
    }
    0
}

async fn run_client(config: Config, command: Commands) -> i32 {
    let socket = config.gateway.socket;
    let mut client = match GatewayClient::connect(&socket).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Cannot reach session at {}: {}", socket.display(), e);
            return 1;
        }
    };

    let result = match command {
        Commands::Send { to, body } => client.send_message(&to, &body).await,
        Commands::Invoke { key, command } => client.invoke(&key, &command).await.map(|output| {
            println!("{}", output);
        }),
        Commands::Presence { jid } => client.presence(&jid).await.map(|status| {
            println!("{} is {}", jid, status.as_str());
        }),
        Commands::Logout => client.logout().await,
        Commands::ServeHandler { key, endpoint } => return serve_handler(client, key, endpoint).await,
        Commands::Run | Commands::Version | Commands::InitConfig => Ok(()),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{}", e);
            1
        }
    }
}

/// Out-of-process handler: answers with its own key and the command
struct KeyedEcho {
    key: String,
}

#[async_trait]
impl Handler for KeyedEcho {
    async fn handle(&self, command: &str) -> String {
        tracing::info!("Handling for {}: {}", self.key, command);
        format!("{} handled: {}", self.key, command)
    }
}

async fn serve_handler(mut client: GatewayClient, key: String, endpoint: Option<PathBuf>) -> i32 {
    let endpoint = endpoint.unwrap_or_else(|| {
        std::env::temp_dir().join(format!("parley-handler-{}.sock", uuid::Uuid::new_v4()))
    });

    let handler = Arc::new(KeyedEcho { key: key.clone() });
    let server = match HandlerEndpoint::bind(&endpoint, handler).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to serve handler: {}", e);
            return 1;
        }
    };

    if let Err(e) = client.register_handler(&key, server.socket_path()).await {
        tracing::error!("Failed to register handler: {}", e);
        return 1;
    }
    tracing::info!("Serving handler {} at {}", key, server.socket_path().display());

    tokio::select! {
        result = server.serve() => {
            if let Err(e) = result {
                tracing::error!("Handler endpoint stopped: {}", e);
                return 1;
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Handler {} shutting down", key);
        }
    }
    0
}

fn init_config() {
    match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to parley.yaml and adjust as needed.");
        }
        Err(e) => tracing::error!("Failed to render config: {}", e),
    }
}
