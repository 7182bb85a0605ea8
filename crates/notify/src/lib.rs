use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{info, warn};

use common::{SignalAction, SignalSet};

/// Announces freshly published signal sets on Telegram.
///
/// Purely a side channel: the published file is the contract, announcements
/// are best-effort. Send failures are logged and never affect the cycle.
pub struct Notifier {
    bot: Bot,
    chat_ids: Vec<ChatId>,
}

impl Notifier {
    pub fn new(token: &str, chat_ids: &[i64]) -> Self {
        Self {
            bot: Bot::new(token),
            chat_ids: chat_ids.iter().copied().map(ChatId).collect(),
        }
    }

    pub async fn announce(&self, set: &SignalSet) {
        let text = format_signal_set(set);
        for &chat_id in &self.chat_ids {
            match self
                .bot
                .send_message(chat_id, &text)
                .parse_mode(ParseMode::Html)
                .await
            {
                Ok(_) => info!(chat_id = ?chat_id, "Signal announcement sent"),
                Err(e) => {
                    warn!(chat_id = ?chat_id, error = %e, "Failed to send Telegram announcement")
                }
            }
        }
    }
}

fn action_icon(action: SignalAction) -> &'static str {
    match action {
        SignalAction::Buy => "📈",
        SignalAction::Sell => "📉",
        SignalAction::Hold => "⏸",
    }
}

fn format_signal_set(set: &SignalSet) -> String {
    let mut text = format!(
        "<b>Signals updated</b>\n🕒 {}\n",
        set.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if set.signals.is_empty() {
        text.push_str("\nℹ️ No symbol produced a signal this cycle.");
        return text;
    }

    for record in &set.signals {
        text.push_str(&format!(
            "\n{} <b>{}</b>: {} ({:.0}%)\n<i>{}</i>\n",
            action_icon(record.action),
            record.symbol,
            record.action,
            record.confidence * 100.0,
            record.rationale,
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use common::SignalRecord;

    use super::*;

    #[test]
    fn message_lists_each_record_with_action_and_confidence() {
        let t = Utc.timestamp_opt(1_700_100_000, 0).unwrap();
        let set = SignalSet::new(
            t,
            vec![
                SignalRecord::new("BTCUSDT", SignalAction::Buy, 0.82, 100.0, t, "strong rise"),
                SignalRecord::new("ETHUSDT", SignalAction::Hold, 0.5, 50.0, t, "flat"),
            ],
        );

        let text = format_signal_set(&set);
        assert!(text.contains("<b>BTCUSDT</b>: BUY (82%)"));
        assert!(text.contains("<b>ETHUSDT</b>: HOLD (50%)"));
        assert!(text.contains("strong rise"));
    }

    #[test]
    fn empty_set_gets_a_no_signal_message() {
        let t = Utc.timestamp_opt(1_700_100_000, 0).unwrap();
        let set = SignalSet::new(t, vec![]);
        assert!(format_signal_set(&set).contains("No symbol produced a signal"));
    }
}
