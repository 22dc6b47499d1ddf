//! Telegram notification delivery.
//!
//! Notices are addressed to an audience (admin or security) rather than a
//! chat id; the gateway resolves the bot token and per-audience chat id from
//! the settings store on every send, so configuration changes take effect
//! without a restart. An unconfigured channel is not an error: `send` returns
//! `Ok(false)` and the notice is silently dropped.

use crate::{
    core::settings::{self, SettingKey},
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

/// Recipient group for an outbound notice.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Audience {
    /// The admin's Telegram chat
    Admin,
    /// The security guard's Telegram chat
    Security,
}

/// A composed notification ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Who receives the message
    pub audience: Audience,
    /// Message body, Telegram HTML
    pub text: String,
}

impl Notice {
    /// Notice addressed to the admin chat.
    #[must_use]
    pub const fn admin(text: String) -> Self {
        Self {
            audience: Audience::Admin,
            text,
        }
    }

    /// Notice addressed to the security chat.
    #[must_use]
    pub const fn security(text: String) -> Self {
        Self {
            audience: Audience::Security,
            text,
        }
    }
}

/// Outbound notification channel.
///
/// Implementations return `Ok(true)` on delivery and `Ok(false)` when the
/// channel is not configured for the audience; transport failures are real
/// errors and surface as [`Error::Notification`].
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Delivers `text` to the chat behind `audience`.
    async fn send(&self, audience: Audience, text: &str) -> Result<bool>;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram gateway backed by the settings store.
// sea-orm's `mock` feature (enabled for test builds) removes `Clone` from
// `DatabaseConnection`, so the derive is limited to non-test builds.
#[cfg_attr(not(test), derive(Clone))]
#[derive(Debug)]
pub struct TelegramGateway {
    db: DatabaseConnection,
    client: reqwest::Client,
}

impl TelegramGateway {
    /// Creates a gateway reading its configuration from `db`.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            client: reqwest::Client::new(),
        }
    }

    const fn chat_id_key(audience: Audience) -> SettingKey {
        match audience {
            Audience::Admin => SettingKey::TelegramAdminChatId,
            Audience::Security => SettingKey::TelegramSecurityChatId,
        }
    }
}

#[async_trait]
impl NotificationGateway for TelegramGateway {
    async fn send(&self, audience: Audience, text: &str) -> Result<bool> {
        let Some(token) = settings::get_setting(&self.db, SettingKey::TelegramBotToken)
            .await?
            .filter(|v| !v.is_empty())
        else {
            tracing::debug!("telegram bot token not configured, dropping notice");
            return Ok(false);
        };
        let Some(chat_id) = settings::get_setting(&self.db, Self::chat_id_key(audience))
            .await?
            .filter(|v| !v.is_empty())
        else {
            tracing::debug!(?audience, "telegram chat id not configured, dropping notice");
            return Ok(false);
        };

        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let payload = SendMessage {
            chat_id: &chat_id,
            text,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Notification {
                message: format!("Telegram request failed: {e}"),
            })?
            .json::<ApiResponse>()
            .await
            .map_err(|e| Error::Notification {
                message: format!("Telegram response unreadable: {e}"),
            })?;

        if !response.ok {
            let description = response
                .description
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(Error::Notification {
                message: format!("Telegram rejected sendMessage: {description}"),
            });
        }

        tracing::debug!(?audience, "telegram notice delivered");
        Ok(true)
    }
}

/// Sends each notice, swallowing failures.
///
/// Delivery is best effort: the state change that produced the notices has
/// already committed, so failures are logged at `warn` and never propagated.
/// Returns the number of notices actually delivered.
pub async fn dispatch(gateway: &dyn NotificationGateway, notices: Vec<Notice>) -> usize {
    let mut delivered = 0;
    for notice in notices {
        match gateway.send(notice.audience, &notice.text).await {
            Ok(true) => delivered += 1,
            Ok(false) => {
                tracing::debug!(audience = ?notice.audience, "notification channel unconfigured");
            }
            Err(e) => {
                tracing::warn!(audience = ?notice.audience, "failed to send notification: {e}");
            }
        }
    }
    delivered
}
