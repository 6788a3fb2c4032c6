use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use pulsewatch::{
    checker::Checker,
    config::read_config_file,
    notifier::{Notifier, build_alert},
    util,
};
use tracing::{info, level_filters::LevelFilter, trace, warn};
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
        ("checker", LevelFilter::TRACE),
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

    let config = read_config_file(&args.file)?;
    let checker_config = config
        .checker
        .context("no checker section in configuration")?;
    let token = util::resolve_token(&config.store)?;

    let checker = Checker::new(
        &config.store,
        token,
        checker_config.offline_after_minutes,
    )?;

    let verdict = checker.check(Utc::now()).await;
    info!("classification: {:?}", verdict.classification);

    match checker_config.alert {
        Some(email_config) => {
            if let Some(message) = build_alert(&verdict, &email_config) {
                Notifier::new(email_config).send(&message).await;
            }
        }
        None => {
            if verdict.should_alert() {
                warn!("alert condition met but no alert target configured");
            }
        }
    }

    Ok(())
}
