//! Settings operations behind the admin guard.
//!
//! Reads return the masked snapshot from `core::settings`, so secret values
//! never travel past this layer. Writes validate and hash credentials here,
//! the store below only ever sees finished values.

use crate::{
    core::{
        credentials, flat,
        settings::{self, SettingEntry, SettingKey},
    },
    errors::{Error, Result},
    ops::{Session, require_admin},
};
use sea_orm::DatabaseConnection;

/// Admin-supplied settings changes. `None` leaves the setting unchanged.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    /// Day of month after which unpaid flats count as overdue (1-28)
    pub due_date_day: Option<i32>,
    /// New admin password (raw; hashed before storage)
    pub admin_password: Option<String>,
    /// New security PIN (raw; hashed before storage)
    pub security_pin: Option<String>,
    /// Telegram bot token
    pub telegram_bot_token: Option<String>,
    /// Telegram chat ID for admin notices
    pub telegram_admin_chat_id: Option<String>,
    /// Telegram chat ID for security notices
    pub telegram_security_chat_id: Option<String>,
    /// Admin display name
    pub admin_name: Option<String>,
    /// Security guard display name
    pub security_name: Option<String>,
    /// WhatsApp number reminders are attributed to
    pub admin_whatsapp_number: Option<String>,
    /// Public URL of the web app
    pub webapp_url: Option<String>,
}

/// Returns the masked settings snapshot.
pub async fn get_settings(
    db: &DatabaseConnection,
    session: &Session,
) -> Result<Vec<SettingEntry>> {
    require_admin(session)?;
    settings::settings_snapshot(db).await
}

/// Applies an admin settings update and returns the refreshed snapshot.
///
/// Credentials are validated and argon2-hashed before they hit the store;
/// everything else is written as supplied.
pub async fn update_settings(
    db: &DatabaseConnection,
    session: &Session,
    update: SettingsUpdate,
) -> Result<Vec<SettingEntry>> {
    require_admin(session)?;

    if let Some(day) = update.due_date_day {
        if !(1..=28).contains(&day) {
            return Err(Error::Validation {
                message: format!("Due date day must be between 1 and 28, got {day}"),
            });
        }
        settings::set_setting(db, SettingKey::DueDateDay, day.to_string()).await?;
    }

    if let Some(password) = update.admin_password {
        credentials::validate_password(&password)?;
        let hash = credentials::hash_secret(&password)?;
        settings::set_setting(db, SettingKey::AdminPasswordHash, hash).await?;
    }

    if let Some(pin) = update.security_pin {
        credentials::validate_pin(&pin)?;
        let hash = credentials::hash_secret(&pin)?;
        settings::set_setting(db, SettingKey::SecurityPinHash, hash).await?;
    }

    if let Some(number) = update.admin_whatsapp_number {
        flat::validate_phone(&number)?;
        settings::set_setting(db, SettingKey::AdminWhatsappNumber, number).await?;
    }

    let plain = [
        (SettingKey::TelegramBotToken, update.telegram_bot_token),
        (SettingKey::TelegramAdminChatId, update.telegram_admin_chat_id),
        (
            SettingKey::TelegramSecurityChatId,
            update.telegram_security_chat_id,
        ),
        (SettingKey::AdminName, update.admin_name),
        (SettingKey::SecurityName, update.security_name),
        (SettingKey::WebappUrl, update.webapp_url),
    ];
    for (key, value) in plain {
        if let Some(value) = value {
            settings::set_setting(db, key, value).await?;
        }
    }

    settings::settings_snapshot(db).await
}
