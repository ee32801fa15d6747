use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono_tz::Tz;
use clap::Parser;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    name = "cabin_finder",
    version,
    about = "Polls campground reservation sites and emails when cabins open up"
)]
pub struct Cli {
    /// `<CAMPSITE_KEY>:<EMAIL>[,<EMAIL>...]`, one per campsite to watch
    #[arg(value_name = "CAMPSITE_INFO", required = true)]
    pub campsite_info: Vec<String>,

    /// JSON file with extra campsite descriptors, keyed by campsite key
    #[arg(long)]
    pub campsites: Option<PathBuf>,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,

    /// Log emails instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Hour the nightly quiet period starts
    #[arg(long, default_value_t = 23, value_parser = clap::value_parser!(u32).range(0..24))]
    pub quiet_start: u32,

    /// Hour the nightly quiet period ends
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(0..24))]
    pub quiet_end: u32,

    /// Minutes between passes, before fuzz
    #[arg(long, default_value_t = 60)]
    pub poll_minutes: u64,

    /// Timezone for today's date and the quiet period
    #[arg(long, default_value = "US/Pacific")]
    pub timezone: Tz,
}

impl Cli {
    /// Base wait between passes
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_minutes * 60)
    }
}

/// Settings read from the environment (and `.env`)
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// Sender address
    pub from_email: Option<String>,
    /// Recipient of failure reports
    pub admin_email: Option<String>,
    /// File each cycle log is flushed to when cleared
    pub log_file: Option<PathBuf>,
}

impl EnvConfig {
    /// Read the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            from_email: get("FROM_EMAIL"),
            admin_email: get("ADMIN_EMAIL"),
            log_file: get("CABIN_FINDER_LOG_FILE").map(PathBuf::from),
        }
    }

    /// Sender address, required unless emails are only logged
    pub fn sender(&self, dry_run: bool) -> Result<String> {
        match (&self.from_email, dry_run) {
            (Some(from), _) => Ok(from.clone()),
            (None, true) => Ok("cabin-finder@localhost".to_string()),
            (None, false) => bail!("FROM_EMAIL environment variable not set"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["cabin_finder", "SteepRavine:a@example.com"]).unwrap();
        assert_eq!(cli.campsite_info, vec!["SteepRavine:a@example.com"]);
        assert_eq!(cli.quiet_start, 23);
        assert_eq!(cli.quiet_end, 8);
        assert_eq!(cli.poll_interval(), Duration::from_secs(3600));
        assert_eq!(cli.timezone, chrono_tz::US::Pacific);
        assert!(!cli.once && !cli.dry_run);
    }

    #[test]
    fn test_cli_rejects_bad_hour_and_missing_campsites() {
        assert!(Cli::try_parse_from(["cabin_finder", "--quiet-start", "24", "X:a@b.c"]).is_err());
        assert!(Cli::try_parse_from(["cabin_finder"]).is_err());
    }

    #[test]
    fn test_env_config() {
        let config = env(&[
            ("FROM_EMAIL", "sender@example.com"),
            ("ADMIN_EMAIL", " "),
            ("CABIN_FINDER_LOG_FILE", "/tmp/cycle.log"),
        ]);
        assert_eq!(config.from_email.as_deref(), Some("sender@example.com"));
        assert_eq!(config.admin_email, None);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/cycle.log")));
    }

    #[test]
    fn test_sender_required_unless_dry_run() {
        let config = env(&[]);
        assert!(config.sender(false).is_err());
        assert!(config.sender(true).is_ok());
    }
}
