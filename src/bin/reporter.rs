use chrono::Utc;
use clap::Parser;
use pulsewatch::{
    collector::Collector, config::read_config_file, publisher::Publisher, retention, util,
};
use tracing::{error, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("pulsewatch", LevelFilter::TRACE),
        ("reporter", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    // config problems are the one fatal path: nothing useful can run without it
    let config = read_config_file(&args.file)?;
    let token = util::resolve_token(&config.store)?;

    let collector = Collector::new(&config.report)?;
    let publisher = Publisher::new(&config.store, token)?;

    let record = collector.collect().await;
    let published = publisher.publish(&record).await;

    let entry = if published {
        retention::append_entry(
            &config.maintenance.log_file,
            "Status report published",
            Utc::now(),
            &[],
        )
    } else {
        // failure is surfaced in the log only; the cron job must not fail
        error!("status publish did not succeed, giving up until the next run");
        retention::append_entry(
            &config.maintenance.log_file,
            "Status report FAILED",
            Utc::now(),
            &["publish did not succeed after 3 attempts"],
        )
    };

    if let Err(e) = entry {
        warn!("could not append run log entry: {e}");
    }

    Ok(())
}
