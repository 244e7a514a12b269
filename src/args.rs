use clap::Parser;
use std::path::PathBuf;
use wiki_watch::WatchConfig;

#[derive(Parser, Debug)]
#[command(name = "wiki-watch")]
#[command(about = "Scans recent wiki changes and posts a batched summary to a webhook")]
#[command(version)]
pub struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Length of the trailing scan window in minutes
    #[arg(short, long)]
    pub window_minutes: Option<u64>,

    /// Number of concurrent page lookups
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Maximum number of alerts in the notification
    #[arg(long)]
    pub max_alerts: Option<usize>,
}

impl Args {
    /// Load the configuration file (or defaults) and apply overrides
    pub fn load_config(&self) -> wiki_watch::Result<WatchConfig> {
        let mut config = match &self.config {
            Some(path) => WatchConfig::from_file(path)?,
            None => WatchConfig::default(),
        };

        if let Some(minutes) = self.window_minutes {
            config.window_minutes = minutes;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrency = concurrency;
        }
        if let Some(max_alerts) = self.max_alerts {
            config.max_alerts = max_alerts;
        }

        config.apply_env();
        Ok(config)
    }
}
