// Pool scorer entry point.
//
// 1. Initialize tracing
// 2. Load config (copying defaults on first run)
// 3. Build the stats provider client
// 4. Run the pipeline and write the snapshot

use anyhow::Context;
use tracing::info;
use wjcpool_app::app;
use wjcpool_app::config;
use wjcpool_app::stats_client::HttpStatsSource;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("Pool scorer starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: season {} ({}), submissions in {}",
        config.stats.season, config.stats.season_type, config.paths.submissions_dir
    );

    let source =
        HttpStatsSource::from_config(&config.stats).context("failed to build HTTP client")?;

    let base_dir = std::env::current_dir().context("failed to read working directory")?;
    let outcome = app::run(&config, &base_dir, &source, chrono::Utc::now()).await?;

    for entry in &outcome.leaderboard.teams {
        info!("{:>3}. {:<24} {:>8.2}", entry.rank, entry.name, entry.score);
    }
    info!("Done: {}", outcome.snapshot_path.display());
    Ok(())
}

/// Initialize tracing to stderr, filtered by `RUST_LOG` when set.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wjcpool_app=info,wjcpool_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
