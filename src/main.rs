use std::{collections::BTreeMap, sync::Arc};

use clap::{Args, Parser, Subcommand};
use sentinel::{
    config::AppConfig,
    models::{ErrorRecord, ErrorReport},
    notification::{AlertRenderer, build_notifier},
    persistence::SqliteErrorStore,
    supervisor::Supervisor,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing `app.yaml`.
    #[arg(long, global = true, env = "SENTINEL_CONFIG_DIR")]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the intake server and alert dispatcher.
    Run,
    /// Renders a sample error and sends it through the configured notifier,
    /// bypassing storage and cooldown.
    TestAlert(TestAlertArgs),
}

#[derive(Args)]
struct TestAlertArgs {
    /// Service name shown in the alert.
    #[arg(long, default_value = "sentinel")]
    service: String,
    /// Operation name shown in the alert.
    #[arg(long, default_value = "test-alert")]
    operation: String,
    /// Error code shown in the alert.
    #[arg(long, default_value = "TEST")]
    code: String,
    /// Message shown in the alert.
    #[arg(long, default_value = "This is a test alert.")]
    message: String,
    /// Detail entries as `key=value`.
    #[arg(long = "detail", value_parser = parse_detail)]
    details: Vec<(String, String)>,
}

fn parse_detail(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
#[tracing::instrument(level = "info")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    tracing::debug!("Loading application configuration...");
    let config = AppConfig::new(cli.config_dir.as_deref())?;
    tracing::debug!(
        environment = %config.environment,
        database_url = %config.database_url,
        notifier = config.notifier.provider(),
        "Configuration loaded."
    );

    match cli.command {
        Commands::Run => run_supervisor(config).await?,
        Commands::TestAlert(args) => send_test_alert(config, args).await?,
    }

    Ok(())
}

async fn run_supervisor(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!("Initializing error store...");
    let store = Arc::new(SqliteErrorStore::new(&config.database_url).await?);
    store.run_migrations().await?;

    let supervisor = Supervisor::builder().config(config).store(store).build()?;
    tracing::info!("Starting Sentinel.");
    supervisor.run().await?;
    Ok(())
}

async fn send_test_alert(
    config: AppConfig,
    args: TestAlertArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let notifier = build_notifier(&config.notifier, &config.http_base_config)?;
    let renderer = AlertRenderer::new(&config.environment, &config.alert.visible_details);

    let report = ErrorReport {
        code: args.code,
        message: args.message,
        details: args.details.into_iter().collect::<BTreeMap<_, _>>(),
        service: args.service,
        operation: args.operation,
    };
    let record = ErrorRecord::from_report(report, chrono::Utc::now());
    let message = renderer.render(&record, notifier.channel_kind());

    notifier.send(&message.title, &message.body).await?;
    tracing::info!(notifier = notifier.name(), "Test alert sent.");
    Ok(())
}
