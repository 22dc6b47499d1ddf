//! Runtime settings stored in the `app_config` table.
//!
//! All lookups go through the typed [`SettingKey`] enum so that key strings
//! exist in exactly one place. Secret-valued keys are never echoed back to
//! callers: the snapshot used by the settings screen only reports whether
//! they are configured. The same table holds the day-keyed markers that make
//! the daily notification tick idempotent.

use crate::{
    entities::{AppConfig, app_config},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{Set, prelude::*, sea_query::OnConflict};

/// Due date day used when the setting has never been configured.
pub const DEFAULT_DUE_DATE_DAY: i32 = 10;

/// Every admin-managed setting key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SettingKey {
    /// Day of month after which unpaid flats count as overdue (1-28)
    DueDateDay,
    /// Argon2 hash of the admin password
    AdminPasswordHash,
    /// Argon2 hash of the security guard's PIN
    SecurityPinHash,
    /// Telegram bot token used for all notices
    TelegramBotToken,
    /// Telegram chat ID receiving admin notices
    TelegramAdminChatId,
    /// Telegram chat ID receiving security notices
    TelegramSecurityChatId,
    /// Display name for the admin, shown in reports and login screens
    AdminName,
    /// Display name for the security guard
    SecurityName,
    /// WhatsApp number reminders are attributed to
    AdminWhatsappNumber,
    /// Public URL of the web app, used in reminder links
    WebappUrl,
}

impl SettingKey {
    /// All keys, in the order the settings screen lists them.
    pub const ALL: [Self; 10] = [
        Self::DueDateDay,
        Self::AdminName,
        Self::SecurityName,
        Self::AdminWhatsappNumber,
        Self::WebappUrl,
        Self::AdminPasswordHash,
        Self::SecurityPinHash,
        Self::TelegramBotToken,
        Self::TelegramAdminChatId,
        Self::TelegramSecurityChatId,
    ];

    /// String stored in the `key` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DueDateDay => "due_date_day",
            Self::AdminPasswordHash => "admin_password_hash",
            Self::SecurityPinHash => "security_pin_hash",
            Self::TelegramBotToken => "telegram_bot_token",
            Self::TelegramAdminChatId => "telegram_admin_chat_id",
            Self::TelegramSecurityChatId => "telegram_security_chat_id",
            Self::AdminName => "admin_name",
            Self::SecurityName => "security_name",
            Self::AdminWhatsappNumber => "admin_whatsapp_number",
            Self::WebappUrl => "webapp_url",
        }
    }

    /// Whether the value is a credential that must never be echoed back.
    #[must_use]
    pub const fn is_secret(self) -> bool {
        matches!(
            self,
            Self::AdminPasswordHash
                | Self::SecurityPinHash
                | Self::TelegramBotToken
                | Self::TelegramAdminChatId
                | Self::TelegramSecurityChatId
        )
    }
}

/// One row of the masked settings snapshot.
#[derive(Debug, Clone)]
pub struct SettingEntry {
    /// Which setting this row describes
    pub key: SettingKey,
    /// Plain value for non-secret keys, always `None` for secret keys
    pub value: Option<String>,
    /// Whether a non-empty value is stored
    pub configured: bool,
}

/// Reads a setting value, `None` when the key has never been set.
pub async fn get_setting<C>(db: &C, key: SettingKey) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let entry = AppConfig::find()
        .filter(app_config::Column::Key.eq(key.as_str()))
        .one(db)
        .await?;
    Ok(entry.map(|e| e.value))
}

/// Upserts a setting value.
pub async fn set_setting<C>(db: &C, key: SettingKey, value: String) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();

    let existing = AppConfig::find()
        .filter(app_config::Column::Key.eq(key.as_str()))
        .one(db)
        .await?;

    if let Some(entry) = existing {
        let mut active_model: app_config::ActiveModel = entry.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_entry = app_config::ActiveModel {
            key: Set(key.as_str().to_string()),
            value: Set(value),
            updated_at: Set(now),
        };
        new_entry.insert(db).await?;
    }

    Ok(())
}

/// Stores a setting only when it has never been set. Used by first-run
/// seeding so admin edits survive restarts.
pub async fn set_setting_if_absent<C>(db: &C, key: SettingKey, value: String) -> Result<bool>
where
    C: ConnectionTrait,
{
    if get_setting(db, key).await?.is_some() {
        return Ok(false);
    }
    set_setting(db, key, value).await?;
    Ok(true)
}

/// Reads the configured due date day, falling back to
/// [`DEFAULT_DUE_DATE_DAY`] when unset or unparsable.
pub async fn get_due_date_day(db: &DatabaseConnection) -> Result<i32> {
    let value = get_setting(db, SettingKey::DueDateDay).await?;
    Ok(value
        .and_then(|v| v.parse::<i32>().ok())
        .filter(|day| (1..=28).contains(day))
        .unwrap_or(DEFAULT_DUE_DATE_DAY))
}

/// Display name of the security guard, defaulting to `"Security"`.
pub async fn get_security_name(db: &DatabaseConnection) -> Result<String> {
    let value = get_setting(db, SettingKey::SecurityName).await?;
    Ok(value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "Security".to_string()))
}

/// Builds the masked snapshot for the settings screen. Secret keys report
/// only whether they are configured; everything else returns its value.
pub async fn settings_snapshot(db: &DatabaseConnection) -> Result<Vec<SettingEntry>> {
    let mut entries = Vec::with_capacity(SettingKey::ALL.len());
    for key in SettingKey::ALL {
        let stored = get_setting(db, key).await?;
        let configured = stored.as_deref().is_some_and(|v| !v.is_empty());
        let value = if key.is_secret() { None } else { stored };
        entries.push(SettingEntry {
            key,
            value,
            configured,
        });
    }
    Ok(entries)
}

/// Config key claimed by the daily tick for a given date.
#[must_use]
pub fn daily_marker_key(date: NaiveDate) -> String {
    format!("notif_{}_{}_{}", date.year(), date.month(), date.day())
}

/// Claims the daily notification marker for a date.
///
/// Returns `true` exactly once per date: the insert uses `ON CONFLICT DO
/// NOTHING` on the key column, so when two ticks race only one sees the row
/// actually inserted and the other gets `false`. Callers send notifications
/// only after winning the claim.
pub async fn claim_daily_marker(db: &DatabaseConnection, date: NaiveDate) -> Result<bool> {
    let model = app_config::ActiveModel {
        key: Set(daily_marker_key(date)),
        value: Set("sent".to_string()),
        updated_at: Set(Utc::now().naive_utc()),
    };

    let result = AppConfig::insert(model)
        .on_conflict(
            OnConflict::column(app_config::Column::Key)
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await;

    match result {
        Ok(_) => Ok(true),
        Err(DbErr::RecordNotInserted) => Ok(false),
        Err(e) => Err(Error::Database(e)),
    }
}
