use std::sync::Arc;
use anyhow::Context;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use saferide::kernel::time::SystemClock;
use saferide::services::ledger::{DryRunLedger, HttpLedgerClient, LedgerClient};
use saferide::store::InMemoryStore;
use saferide::transport::{self, TOPIC_PATTERN};
use saferide::{ProcessorConfig, Reactor};

const INBOUND_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (.env is optional)
    let _ = dotenvy::dotenv();

    // 2. Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    tracing::info!("SafeRide telemetry processor booting...");

    // 3. Config (fatal on error)
    let config = ProcessorConfig::from_env().context("invalid processor configuration")?;
    tracing::info!(?config, "Configuration loaded");

    // 4. Collaborators
    let ledger: Arc<dyn LedgerClient> = match std::env::var("SAFERIDE_LEDGER_URL") {
        Ok(url) if !url.trim().is_empty() => {
            tracing::info!(%url, "Using ledger relay");
            let client = HttpLedgerClient::new(url, config.ledger_timeout()).context("building ledger client")?;
            Arc::new(client)
        }
        _ => {
            tracing::warn!("SAFERIDE_LEDGER_URL not set, ledger records are dry-run only");
            Arc::new(DryRunLedger)
        }
    };
    let store = Arc::new(InMemoryStore::new());

    // 5. Transport (stdin, one message per line)
    let shutdown = CancellationToken::new();
    let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
    let source_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let reader = BufReader::new(tokio::io::stdin());
        transport::pump_lines(reader, tx, source_shutdown).await;
    });
    tracing::info!(topic = TOPIC_PATTERN, "Reading telemetry from stdin");

    // 6. Ctrl+C
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down...");
            signal_shutdown.cancel();
        }
    });

    // 7. Run until shutdown or EOF
    let reactor = Reactor::new(rx, store, ledger, config, Arc::new(SystemClock), shutdown);
    reactor.run().await;

    Ok(())
}
