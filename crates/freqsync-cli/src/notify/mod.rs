//! Delivery channels for core update events.

pub mod log;
pub mod telegram;

use std::sync::Arc;
use std::time::Duration;

use freqsync_core::config::Config;
use freqsync_core::events::FanoutNotifier;

pub use log::LogNotifier;
pub use telegram::TelegramNotifier;

/// Log notifier always; Telegram when configured.
pub fn from_config(config: &Config) -> anyhow::Result<FanoutNotifier> {
    let mut fanout = FanoutNotifier::new().with(Arc::new(LogNotifier));
    if config.telegram.enabled {
        match TelegramNotifier::from_config(config, config.interval())? {
            Some(tg) => fanout = fanout.with(Arc::new(tg)),
            None => tracing::warn!("telegram notifications enabled but not fully configured"),
        }
    }
    Ok(fanout)
}

/// Seconds rendered for humans, e.g. `2.4s` or `3m 05s`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freqsync_core::config::SourceConfig;
    use std::path::PathBuf;

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(2400)), "2.4s");
        assert_eq!(format_duration(Duration::from_secs(185)), "3m 05s");
    }

    #[test]
    fn telegram_needs_token_and_chat() {
        let mut cfg = Config::new(SourceConfig::Directory {
            path: PathBuf::from("/remote"),
        });
        assert_eq!(from_config(&cfg).unwrap().len(), 1);

        cfg.telegram.enabled = true;
        cfg.telegram.bot_token = Some("123:abc".to_string());
        assert_eq!(from_config(&cfg).unwrap().len(), 1);

        cfg.telegram.chat_id = Some("-100".to_string());
        assert_eq!(from_config(&cfg).unwrap().len(), 2);
    }
}
