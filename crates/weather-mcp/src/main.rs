//! Weather MCP Server: entry point.

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use weather_mcp::config::{self, ProviderKind};
use weather_mcp::dispatch::{Dispatcher, DispatcherConfig};
use weather_mcp::handlers::build_registry;
use weather_mcp::protocol::ProtocolHandler;
use weather_mcp::registry::CapabilityKind;
use weather_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "weather-mcp",
    about = "MCP server exposing weather tools, resources, and prompts",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG overrides it.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Weather data source.
    #[arg(long, global = true, value_enum, default_value_t = ProviderKind::Auto)]
    provider: ProviderKind,

    /// Ignore unknown arguments instead of rejecting them.
    /// Also reads WEATHER_MCP_STRICT_ARGS.
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Start MCP server over HTTP.
    #[cfg(feature = "http")]
    ServeHttp {
        /// Listen address (host:port).
        #[arg(long, default_value = "127.0.0.1:3100")]
        addr: String,

        /// Bearer token for authentication.
        /// Also reads from WEATHER_MCP_TOKEN env var.
        #[arg(long)]
        token: Option<String>,

        /// Per-request timeout in seconds; 0 disables it.
        /// Also reads WEATHER_MCP_TIMEOUT_SECS.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   weather-mcp completions bash > ~/.local/share/bash-completion/completions/weather-mcp
    ///   weather-mcp completions zsh > ~/.zfunc/_weather-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    // stdout carries protocol frames; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Commands::Serve);
    let strict = config::resolve_strict(cli.lenient);

    match command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "weather-mcp", &mut std::io::stdout());
        }

        Commands::Serve => {
            let dispatcher = build_dispatcher(cli.provider, strict)?;
            tracing::info!("Weather MCP server (stdio)");
            let handler = ProtocolHandler::new(dispatcher);
            let transport = StdioTransport::new(handler);
            let reason = transport.run().await?;
            tracing::info!("Stdio transport closed: {reason:?}");
        }

        #[cfg(feature = "http")]
        Commands::ServeHttp {
            addr,
            token,
            timeout_secs,
        } => {
            use weather_mcp::transport::HttpTransport;

            let dispatcher = build_dispatcher(cli.provider, strict)?;

            let effective_token = config::resolve_token(token);
            let timeout = config::resolve_timeout(timeout_secs);

            tracing::info!("Weather MCP server (http)");
            if effective_token.is_some() {
                tracing::info!("Auth: bearer token required");
            }
            match timeout {
                Some(limit) => tracing::info!("Request timeout: {}s", limit.as_secs()),
                None => tracing::info!("Request timeout: disabled"),
            }

            let handler = ProtocolHandler::new(dispatcher).with_timeout(timeout);
            let transport = HttpTransport::with_token(handler, effective_token);
            transport.run(&addr).await?;
        }

        Commands::Info => {
            let dispatcher = build_dispatcher(cli.provider, strict)?;
            let registry = dispatcher.registry();
            let init = weather_mcp::types::InitializeResult::for_registry(registry);
            let names = |kind| {
                registry
                    .list(kind)
                    .iter()
                    .map(|c| c.key().to_string())
                    .collect::<Vec<_>>()
            };
            let info = serde_json::json!({
                "server": init.server_info,
                "protocol_version": init.protocol_version,
                "capabilities": init.capabilities,
                "tools": names(CapabilityKind::Tool),
                "resources": names(CapabilityKind::Resource),
                "prompts": names(CapabilityKind::Prompt),
                "strict_arguments": dispatcher.config().strict_arguments,
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Repl => {
            let dispatcher = build_dispatcher(cli.provider, strict)?;
            // Handlers may block on network I/O; keep them off the async workers.
            tokio::task::spawn_blocking(move || weather_mcp::repl::run(dispatcher)).await??;
        }
    }

    Ok(())
}

fn build_dispatcher(kind: ProviderKind, strict: bool) -> anyhow::Result<Arc<Dispatcher>> {
    let provider = config::build_provider(kind)?;
    let registry = build_registry(provider)?;
    Ok(Arc::new(Dispatcher::with_config(
        Arc::new(registry),
        DispatcherConfig {
            strict_arguments: strict,
        },
    )))
}
