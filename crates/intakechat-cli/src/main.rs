use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use intakechat_agents::{ChatRuntime, CompletionRelay, LlmProvider, OpenAiProvider};
use intakechat_channels::EmailNotifier;
use intakechat_config::{AppConfig, ConfigLoader};
use intakechat_gateway::{AppState, ChatFlow, GatewayServer, SharedState};
use intakechat_security::{ProfileValidator, RedactingWriter};
use intakechat_sources::SourceLoader;
use tracing::info;
use tracing_subscriber::EnvFilter;

const PAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Parser)]
#[command(
    name = "intakechat",
    version,
    about = "Profile intake form and grounded course-advisor chat"
)]
struct Cli {
    /// Env file read before the process environment (defaults to ./.env)
    #[arg(long, global = true, env = "INTAKECHAT_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway
    Serve {
        /// Override GATEWAY_HOST
        #[arg(long)]
        host: Option<String>,

        /// Override GATEWAY_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Validate configuration and print it with secrets masked
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = load_config(&cli)?;

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            let state = build_state(config)?;
            GatewayServer::new(state)
                .run()
                .await
                .context("gateway exited with an error")?;
        }
        Command::CheckConfig => {
            println!("{config:#?}");
            if !config.sources.document_path.exists() {
                println!(
                    "warning: document {} does not exist; chats will use a placeholder",
                    config.sources.document_path.display()
                );
            }
            println!("configuration ok");
        }
    }
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(RedactingWriter::stderr());
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.env_file {
        Some(path) => ConfigLoader::from_env_file(path),
        None => ConfigLoader::from_env(),
    }
    .context("failed to load configuration")?;
    info!(
        model = %config.llm.model,
        start_phase = %config.intake.start_phase,
        condense = config.sources.condense,
        "configuration loaded"
    );
    Ok(config)
}

fn build_state(config: AppConfig) -> Result<SharedState> {
    let llm_client = reqwest::Client::builder()
        .timeout(config.llm.timeout())
        .build()
        .context("failed to build completion HTTP client")?;
    let provider: Arc<dyn LlmProvider> = Arc::new(
        OpenAiProvider::new(
            config.llm.api_key.clone(),
            Some(config.llm.base_url.clone()),
        )
        .with_client(llm_client),
    );
    let relay = CompletionRelay::from_config(provider, &config.llm);

    let mut sources = SourceLoader::from_config(&config.sources, PAGE_FETCH_TIMEOUT)
        .context("failed to set up content sourcing")?;
    if config.sources.condense {
        sources = sources.with_condenser(relay.clone());
    }

    let notifier = EmailNotifier::new(&config.mail).context("failed to set up e-mail notifier")?;
    let runtime = ChatRuntime::new(relay, config.llm.persona.clone(), config.llm.greeting.clone());
    let flow = ChatFlow::new(
        ProfileValidator::new(config.intake.required_fields.clone()),
        Arc::new(notifier),
        Arc::new(sources),
        runtime,
    )
    .with_require_notification(config.intake.require_notification);

    Ok(Arc::new(AppState::new(config, flow)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "intakechat",
            "--log-json",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
        ])
        .unwrap();
        assert!(cli.log_json);
        match cli.command {
            Command::Serve { host, port } => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(9000));
            }
            Command::CheckConfig => panic!("expected serve"),
        }
    }

    #[test]
    fn env_file_is_global() {
        let cli = Cli::try_parse_from(["intakechat", "check-config", "--env-file", "prod.env"])
            .unwrap();
        assert_eq!(cli.env_file, Some(PathBuf::from("prod.env")));
        assert!(matches!(cli.command, Command::CheckConfig));
    }
}
