//! Live Roulette Result Collector
//!
//! Watches a rendered roulette table and distributes each result to
//! Discord, a local endpoint, and disk.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use roulette_collector::{
    browser::CdpPage,
    collector::Collector,
    config::Config,
    outcome::RoundOutcome,
    session::SessionManager,
    sink::{discord::STATUS_GREEN, DayFileStore, Delivery, DiscordSink, Distributor, LocalSink},
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "roulette-collector")]
#[command(about = "Collects live roulette results and fans them out to configured sinks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the collector loop
    Run,
    /// Send a test notification to the Discord webhook
    TestNotify,
    /// Probe the local sink health endpoint
    CheckSink,
    /// Re-send one day's stored results to the local sink batch endpoint
    Replay {
        /// Day to replay (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run => run(config).await,
        Commands::TestNotify => test_notify(config).await,
        Commands::CheckSink => check_sink(config).await,
        Commands::Replay { date } => replay(config, date).await,
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting roulette results collector");
    std::fs::create_dir_all(&config.storage.data_dir)?;

    // Failure to reach the browser is the only fatal error; everything past
    // this point is retried cycle by cycle.
    let page = CdpPage::attach(&config.browser, &config.casino.url).await?;
    let session = SessionManager::new(Box::new(page), config.session.clone());

    let discord = match &config.discord {
        Some(dc) => Some(DiscordSink::new(dc)?),
        None => {
            tracing::warn!("Discord not configured, webhook notifications disabled");
            None
        }
    };
    let local = match &config.local_sink {
        Some(ls) if ls.enabled => Some(LocalSink::new(ls)?),
        _ => None,
    };
    let store = DayFileStore::new(&config.storage.data_dir);
    let distributor = Distributor::new(discord, local, Some(store));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, finishing current cycle");
            let _ = shutdown_tx.send(true);
        }
    });

    tracing::info!("Monitoring: {}", config.casino.table_name);
    let mut collector = Collector::new(&config, session, distributor, shutdown_rx);
    collector.run().await;
    Ok(())
}

async fn test_notify(config: Config) -> anyhow::Result<()> {
    let dc = config
        .discord
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Discord not configured in config file"))?;
    let sink = DiscordSink::new(dc)?;

    sink.send_status(
        "🧪 Test notification — if you can read this, the webhook works",
        STATUS_GREEN,
    )
    .await?;

    let sample = RoundOutcome::new(17, Utc::now(), config.casino.table_name.clone(), "test")?;
    sink.send_result(&sample).await?;

    println!("✅ Test notifications sent");
    Ok(())
}

async fn check_sink(config: Config) -> anyhow::Result<()> {
    let ls = config
        .local_sink
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Local sink not configured in config file"))?;
    let sink = LocalSink::new(ls)?;

    if sink.health().await {
        println!("✅ Local sink is available at {}", ls.endpoint);
        Ok(())
    } else {
        anyhow::bail!("local sink health check failed for {}", ls.endpoint)
    }
}

async fn replay(config: Config, date: Option<String>) -> anyhow::Result<()> {
    let ls = config
        .local_sink
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Local sink not configured in config file"))?;
    let date = match date {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?,
        None => Utc::now().date_naive(),
    };

    let store = DayFileStore::new(&config.storage.data_dir);
    let records = store.load_day(date).await?;
    if records.is_empty() {
        println!("No stored results for {date}");
        return Ok(());
    }

    let count = records.len();
    let sink = LocalSink::new(ls)?;
    match sink.send_batch(records).await? {
        Delivery::Delivered => println!("✅ Replayed {count} results from {date}"),
        Delivery::Skipped => println!("Local sink not reachable, nothing sent"),
        Delivery::Failed(reason) => anyhow::bail!("batch send failed: {reason}"),
    }
    Ok(())
}
