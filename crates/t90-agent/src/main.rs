//! T90 agent: replays a vehicle bus capture through the Maxus T90 EV
//! decoder and writes metric updates as JSON lines.

use tokio::io::AsyncWrite;
use tracing_subscriber::EnvFilter;

use t90_agent::config::AgentConfig;
use t90_agent::dispatch;
use t90_agent::source::CandumpSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Load config ─────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/t90/agent.toml".to_string());

    let config = AgentConfig::from_file(&config_path)?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if config.output.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path,
        "t90-agent starting"
    );

    // ── Frame source ────────────────────────────────────────────
    let source = CandumpSource::open(
        &config.source.candump_path,
        &config.source.interface,
        config.vehicle.bus,
        config.source.realtime,
    )
    .await?;

    // ── Metric output ───────────────────────────────────────────
    let out: Box<dyn AsyncWrite + Unpin + Send> = match &config.output.metrics_path {
        Some(path) => {
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            tracing::info!(path = %path, "appending metric updates");
            Box::new(file)
        }
        None => Box::new(tokio::io::stdout()),
    };

    // ── Run ─────────────────────────────────────────────────────
    let stats = dispatch::run(source, &config.vehicle, out).await?;
    tracing::info!(
        metric_writes = stats.metric_writes,
        polls_due = stats.polls_due,
        "t90-agent stopped"
    );
    Ok(())
}
