//! Flat roster operations behind role guards.
//!
//! Every role may list the roster, but the phone number is admin-only; other
//! roles get a `has_phone` flag so the UI can still show whether a reminder
//! link exists. Updates are admin-only and do the PIN hashing here, so the
//! core layer never sees a raw secret.

use crate::{
    core::{credentials, flat},
    entities::flat as flat_entity,
    errors::{Error, Result},
    ops::{Role, Session, require_admin},
};
use sea_orm::prelude::*;

/// One roster row with role-dependent phone visibility.
#[derive(Debug, Clone)]
pub struct FlatView {
    /// Flat id
    pub id: i64,
    /// Flat number
    pub flat_number: String,
    /// Monthly maintenance amount in rupees
    pub maintenance_amount: f64,
    /// Phone number; populated only for the admin
    pub phone: Option<String>,
    /// Whether a phone number is on file
    pub has_phone: bool,
}

/// Admin-supplied flat changes. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct FlatUpdate {
    /// New monthly maintenance amount
    pub maintenance_amount: Option<f64>,
    /// New login PIN (raw; hashed before storage)
    pub pin: Option<String>,
    /// New phone number
    pub phone: Option<String>,
}

/// Lists all flats ordered by flat number.
pub async fn list_flats(db: &DatabaseConnection, session: &Session) -> Result<Vec<FlatView>> {
    let is_admin = session.role == Role::Admin;
    Ok(flat::get_all_flats(db)
        .await?
        .into_iter()
        .map(|f| {
            let has_phone = f.phone.is_some();
            FlatView {
                id: f.id,
                flat_number: f.flat_number,
                maintenance_amount: f.maintenance_amount,
                phone: if is_admin { f.phone } else { None },
                has_phone,
            }
        })
        .collect())
}

/// Applies an admin update to a flat.
///
/// The PIN must be exactly 4 digits and is argon2-hashed before it reaches
/// the database; the phone must be 10 to 15 digits.
pub async fn update_flat(
    db: &DatabaseConnection,
    session: &Session,
    flat_id: i64,
    update: FlatUpdate,
) -> Result<flat_entity::Model> {
    require_admin(session)?;

    let mut changes = flat::FlatChanges {
        maintenance_amount: update.maintenance_amount,
        ..Default::default()
    };

    if let Some(pin) = update.pin {
        credentials::validate_pin(&pin)?;
        changes.pin_hash = Some(credentials::hash_secret(&pin)?);
    }

    if let Some(phone) = update.phone {
        flat::validate_phone(&phone)?;
        changes.phone = Some(phone);
    }

    if changes.is_empty() {
        return Err(Error::Validation {
            message: "No changes supplied".to_string(),
        });
    }

    flat::update_flat(db, flat_id, changes).await
}
