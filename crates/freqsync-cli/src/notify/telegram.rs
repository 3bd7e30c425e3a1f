//! Telegram Bot API notifier.
//!
//! Each core event is rendered as a legacy-Markdown message and posted to
//! `sendMessage`. Delivery failures are logged and otherwise ignored.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Local;
use freqsync_core::config::Config;
use freqsync_core::events::{Notifier, UpdateEvent};
use freqsync_core::types::{CycleSummary, DetectionStrategy, RestartOutcome};
use freqsync_core::version::first_bumped_component;
use serde::Serialize;

use super::format_duration;
use crate::output::signature;

const API_BASE: &str = "https://api.telegram.org";
const LOG_EXCERPT_CHARS: usize = 100;

pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    source: String,
    interval: Duration,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    /// `None` unless Telegram is enabled with both a token and a chat id.
    pub fn from_config(config: &Config, interval: Duration) -> anyhow::Result<Option<Self>> {
        let tg = &config.telegram;
        if !tg.is_usable() {
            return Ok(None);
        }
        let (Some(bot_token), Some(chat_id)) = (tg.bot_token.clone(), tg.chat_id.clone()) else {
            return Ok(None);
        };

        let mut builder = reqwest::Client::builder().timeout(config.http.timeout());
        if config.http.proxy.enabled {
            builder = builder.proxy(
                reqwest::Proxy::all(config.http.proxy.url()).context("invalid proxy for telegram")?,
            );
        }
        let client = builder.build().context("failed to build telegram client")?;

        Ok(Some(Self {
            client,
            api_base: API_BASE.to_string(),
            bot_token,
            chat_id,
            source: config.source.describe(),
            interval,
        }))
    }

    #[cfg(test)]
    fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Message text for `event`, or `None` for events not worth a message.
    pub fn render(&self, event: &UpdateEvent) -> Option<String> {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S");
        let source = escape_markdown(&self.source);
        let text = match event {
            UpdateEvent::UpdateAvailable {
                file,
                strategy,
                local_signature,
                remote_signature,
            } => {
                let change = match strategy {
                    DetectionStrategy::Version => {
                        version_diff_label(local_signature.as_deref(), remote_signature.as_deref())
                    }
                    DetectionStrategy::Hash => "content changed",
                };
                format!(
                    "🔔 *Update available*\n\
                     📦 Source: {source}\n\
                     📄 File: {}\n\
                     📌 Current: {}\n\
                     🆕 Remote: {}\n\
                     🔄 Change: {change}\n\
                     ⏰ Time: {now}",
                    escape_markdown(&file.name),
                    escape_markdown(&signature(*strategy, local_signature.as_deref())),
                    escape_markdown(&signature(*strategy, remote_signature.as_deref())),
                )
            }
            UpdateEvent::UpdateApplied {
                file,
                bytes_written,
            } => format!(
                "✅ *Update installed*\n\
                 📦 Source: {source}\n\
                 📄 File: {}\n\
                 💾 Size: {}\n\
                 ⏰ Time: {now}",
                escape_markdown(&file.name),
                escape_markdown(&format_file_size(Some(*bytes_written))),
            ),
            UpdateEvent::UpdateFailed { file, error } => format!(
                "❌ *Update failed*\n\
                 📦 Source: {source}\n\
                 📄 File: {}\n\
                 ⚠️ Error: {}\n\
                 ⏰ Time: {now}",
                escape_markdown(&file.name),
                escape_markdown(error),
            ),
            UpdateEvent::RestartCompleted { outcome } => render_restart(outcome, &now.to_string()),
            UpdateEvent::CycleCompleted { summary } => {
                let next = Local::now()
                    + chrono::Duration::from_std(self.interval).unwrap_or(chrono::Duration::zero());
                format!(
                    "📊 *Check complete*\n\
                     📦 Source: {source}\n\
                     🔍 Status: {}\n\
                     📁 Files: {}\n\
                     🔄 Stale: {} ({:.1}%)\n\
                     ✅ Updated: {}\n\
                     ❌ Failed: {}\n\
                     ⏰ Time: {now}\n\
                     ⏭️ Next check: {}",
                    cycle_status(summary),
                    summary.total_files,
                    summary.stale_count,
                    summary.stale_rate(),
                    summary.updated_count,
                    summary.failed_count,
                    next.format("%Y-%m-%d %H:%M:%S"),
                )
            }
            UpdateEvent::CycleAborted { error } => format!(
                "⚠️ *Check aborted*\n\
                 📦 Source: {source}\n\
                 Error: {}\n\
                 ⏰ Time: {now}",
                escape_markdown(error),
            ),
            UpdateEvent::CycleSkipped { .. } => return None,
        };
        Some(text)
    }

    async fn send(&self, text: &str) -> reqwest::Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        self.client
            .post(url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
                parse_mode: "Markdown",
                disable_web_page_preview: true,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, event: &UpdateEvent) {
        let Some(text) = self.render(event) else {
            return;
        };
        match self.send(&text).await {
            Ok(()) => tracing::debug!(event = event.name(), "telegram message sent"),
            Err(e) => {
                // reqwest errors carry the URL, which contains the bot token.
                tracing::warn!(event = event.name(), error = %e.without_url(), "telegram delivery failed")
            }
        }
    }
}

fn render_restart(outcome: &RestartOutcome, now: &str) -> String {
    let status = if outcome.succeeded {
        "restarted".to_string()
    } else {
        match outcome.failed_step {
            Some(step) => format!("failed at {step}"),
            None => "failed".to_string(),
        }
    };
    let log = match &outcome.error {
        Some(e) => e.clone(),
        None => [outcome.stop_output.trim(), outcome.start_output.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n"),
    };
    format!(
        "🐳 *Service restart*\n\
         🔍 Status: {}\n\
         ⏱️ Duration: {}\n\
         📝 Output: {}\n\
         ⏰ Time: {now}",
        escape_markdown(&status),
        escape_markdown(&format_duration(Duration::from_millis(outcome.duration_ms))),
        escape_markdown(&excerpt(&log, LOG_EXCERPT_CHARS)),
    )
}

fn cycle_status(summary: &CycleSummary) -> &'static str {
    match (summary.stale_count, summary.failed_count) {
        (0, _) => "up to date",
        (_, 0) if summary.updated_count == summary.stale_count => "updated",
        _ if summary.updated_count > 0 => "partially updated",
        _ => "update failed",
    }
}

/// Backslash-escape characters that Telegram treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|'
                | '{' | '}' | '.' | '!'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `1536` becomes `1.50 KB`. Unknown or zero sizes render as `unknown`.
pub fn format_file_size(bytes: Option<u64>) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let Some(bytes) = bytes.filter(|b| *b > 0) else {
        return "unknown".to_string();
    };
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.2} {}", UNITS[unit])
}

/// Which part of a dotted version moved forward.
pub fn version_diff_label(current: Option<&str>, remote: Option<&str>) -> &'static str {
    let (Some(current), Some(remote)) = (current, remote) else {
        return "unknown";
    };
    match first_bumped_component(current, remote) {
        Some(0) => "major version update",
        Some(1) => "minor version update",
        Some(_) => "patch version update",
        None => "no newer version",
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.is_empty() {
        return "no output".to_string();
    }
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use freqsync_core::config::SourceConfig;
    use freqsync_core::types::{FileKind, RestartStep, TrackedFile};
    use mockito::Matcher;
    use std::path::PathBuf;

    fn config() -> Config {
        let mut cfg = Config::new(SourceConfig::Directory {
            path: PathBuf::from("/srv/nfi"),
        });
        cfg.telegram.enabled = true;
        cfg.telegram.bot_token = Some("123:abc".to_string());
        cfg.telegram.chat_id = Some("-1001".to_string());
        cfg
    }

    fn notifier() -> TelegramNotifier {
        TelegramNotifier::from_config(&config(), Duration::from_secs(3600))
            .unwrap()
            .unwrap()
    }

    fn file(name: &str) -> TrackedFile {
        TrackedFile {
            name: name.to_string(),
            local_path: PathBuf::from(name),
            remote_locator: format!("/srv/nfi/{name}"),
            kind: FileKind::Strategy,
            uses_version_check: true,
            allowed_extensions: None,
            size: None,
            content_id: None,
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_markdown("NFI_X6.py"), "NFI\\_X6\\.py");
        assert_eq!(escape_markdown("plain"), "plain");
        assert_eq!(escape_markdown("a*b[c]"), "a\\*b\\[c\\]");
    }

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(None), "unknown");
        assert_eq!(format_file_size(Some(0)), "unknown");
        assert_eq!(format_file_size(Some(512)), "512.00 B");
        assert_eq!(format_file_size(Some(1536)), "1.50 KB");
        assert_eq!(format_file_size(Some(5 * 1024 * 1024)), "5.00 MB");
        assert_eq!(format_file_size(Some(3 * 1024 * 1024 * 1024 * 1024)), "3072.00 GB");
    }

    #[test]
    fn version_labels() {
        assert_eq!(version_diff_label(Some("v16.5.1"), Some("v17.0.0")), "major version update");
        assert_eq!(version_diff_label(Some("v16.5.1"), Some("v16.6.0")), "minor version update");
        assert_eq!(version_diff_label(Some("v16.5.1"), Some("v16.5.2")), "patch version update");
        assert_eq!(version_diff_label(Some("v16.5.1"), Some("v16.5.1")), "no newer version");
        assert_eq!(version_diff_label(None, Some("v1")), "unknown");
    }

    #[test]
    fn restart_log_is_truncated() {
        let outcome = RestartOutcome {
            succeeded: true,
            failed_step: None,
            error: None,
            stop_output: "x".repeat(300),
            start_output: String::new(),
            duration_ms: 1200,
        };
        let text = render_restart(&outcome, "now");
        assert!(text.contains(&format!("{}\\.\\.\\.", "x".repeat(100))));
        assert!(!text.contains(&"x".repeat(101)));
        assert!(text.contains("1\\.2s"));
    }

    #[test]
    fn failed_restart_names_the_step() {
        let outcome = RestartOutcome {
            succeeded: false,
            failed_step: Some(RestartStep::Stop),
            error: Some("boom".to_string()),
            stop_output: String::new(),
            start_output: String::new(),
            duration_ms: 10,
        };
        let text = render_restart(&outcome, "now");
        assert!(text.contains("failed at stop"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn cycle_message_has_rate_and_next_check() {
        let text = notifier()
            .render(&UpdateEvent::CycleCompleted {
                summary: CycleSummary {
                    total_files: 8,
                    stale_count: 2,
                    updated_count: 1,
                    failed_count: 1,
                    restart_performed: false,
                    timestamp: Utc::now(),
                },
            })
            .unwrap();
        assert!(text.contains("Stale: 2 (25.0%)"));
        assert!(text.contains("partially updated"));
        assert!(text.contains("Next check:"));
    }

    #[test]
    fn available_message_labels_version_change() {
        let text = notifier()
            .render(&UpdateEvent::UpdateAvailable {
                file: file("NostalgiaForInfinityX6.py"),
                strategy: DetectionStrategy::Version,
                local_signature: Some("v16.5.1".to_string()),
                remote_signature: Some("v16.6.0".to_string()),
            })
            .unwrap();
        assert!(text.contains("NostalgiaForInfinityX6\\.py"));
        assert!(text.contains("minor version update"));
    }

    #[test]
    fn applied_message_escapes_size() {
        let text = notifier()
            .render(&UpdateEvent::UpdateApplied {
                file: file("pairlist.json"),
                bytes_written: 1536,
            })
            .unwrap();
        assert!(text.contains("pairlist\\.json"));
        assert!(text.contains("Size: 1\\.50 KB"));
    }

    #[test]
    fn skipped_cycles_are_not_sent() {
        let event = UpdateEvent::CycleSkipped {
            reason: "busy".to_string(),
        };
        assert!(notifier().render(&event).is_none());
    }

    #[test]
    fn incomplete_config_yields_none() {
        let mut cfg = config();
        cfg.telegram.chat_id = None;
        assert!(TelegramNotifier::from_config(&cfg, Duration::from_secs(60))
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn posts_markdown_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "chat_id": "-1001",
                "parse_mode": "Markdown",
                "disable_web_page_preview": true,
            })))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let tg = notifier().with_api_base(&server.url());
        tg.notify(&UpdateEvent::CycleAborted {
            error: "bad config".to_string(),
        })
        .await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .with_status(500)
            .create_async()
            .await;

        let tg = notifier().with_api_base(&server.url());
        tg.notify(&UpdateEvent::UpdateFailed {
            file: file("a.json"),
            error: "timeout".to_string(),
        })
        .await;
        mock.assert_async().await;
    }
}
