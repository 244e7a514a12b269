use clap::Parser;
use std::process::ExitCode;
use wiki_watch::{RunSummary, Watch};

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let start_time = std::time::Instant::now();
    match run(&args).await {
        Ok(summary) => {
            ::log::info!(
                "Run complete in {:.2} seconds: {} alerts sent ({} found)",
                start_time.elapsed().as_secs_f64(),
                summary.sent,
                summary.alerts
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> wiki_watch::Result<RunSummary> {
    let config = args.load_config()?;

    // Fails on a missing webhook before any network activity
    let watch = Watch::from_config(&config)?;

    watch.run().await
}
