//! Flat business logic - Handles flat roster lookups and admin updates.
//!
//! Flats are seeded from config.toml at startup and never deleted; the only
//! mutations are admin edits to the maintenance amount, login PIN hash, and
//! phone number. All functions are async and return Result types.

use crate::{
    entities::{Flat, flat},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Admin-editable flat fields. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct FlatChanges {
    /// New monthly maintenance amount
    pub maintenance_amount: Option<f64>,
    /// New argon2 PIN hash (hashing happens before this layer)
    pub pin_hash: Option<String>,
    /// New phone number
    pub phone: Option<String>,
}

impl FlatChanges {
    /// Whether the change set contains anything to apply.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.maintenance_amount.is_none() && self.pin_hash.is_none() && self.phone.is_none()
    }
}

/// Retrieves all flats ordered by flat number.
pub async fn get_all_flats(db: &DatabaseConnection) -> Result<Vec<flat::Model>> {
    Flat::find()
        .order_by_asc(flat::Column::FlatNumber)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a flat by its unique ID.
pub async fn get_flat_by_id(db: &DatabaseConnection, flat_id: i64) -> Result<Option<flat::Model>> {
    Flat::find_by_id(flat_id).one(db).await.map_err(Into::into)
}

/// Finds a flat by its flat number (e.g., `"101"`).
pub async fn get_flat_by_number(
    db: &DatabaseConnection,
    flat_number: &str,
) -> Result<Option<flat::Model>> {
    Flat::find()
        .filter(flat::Column::FlatNumber.eq(flat_number))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new flat, validating the flat number and amount first.
///
/// Used by the startup seeding; there is no user-facing flat creation.
pub async fn create_flat(
    db: &DatabaseConnection,
    flat_number: String,
    maintenance_amount: f64,
    pin_hash: String,
    phone: Option<String>,
) -> Result<flat::Model> {
    if flat_number.trim().is_empty() {
        return Err(Error::Validation {
            message: "Flat number cannot be empty".to_string(),
        });
    }

    if maintenance_amount <= 0.0 {
        return Err(Error::Validation {
            message: format!("Maintenance amount must be positive, got {maintenance_amount}"),
        });
    }

    let flat = flat::ActiveModel {
        flat_number: Set(flat_number.trim().to_string()),
        maintenance_amount: Set(maintenance_amount),
        pin_hash: Set(pin_hash),
        phone: Set(phone),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    flat.insert(db).await.map_err(Into::into)
}

/// Applies an admin change set to a flat.
///
/// The amount is validated here; PIN and phone format checks happen in the
/// operation layer where the raw values are still available.
pub async fn update_flat(
    db: &DatabaseConnection,
    flat_id: i64,
    changes: FlatChanges,
) -> Result<flat::Model> {
    if let Some(amount) = changes.maintenance_amount
        && amount <= 0.0
    {
        return Err(Error::Validation {
            message: format!("Maintenance amount must be positive, got {amount}"),
        });
    }

    let flat = get_flat_by_id(db, flat_id)
        .await?
        .ok_or(Error::FlatNotFound { id: flat_id })?;

    let mut active_model: flat::ActiveModel = flat.into();
    if let Some(amount) = changes.maintenance_amount {
        active_model.maintenance_amount = Set(amount);
    }
    if let Some(pin_hash) = changes.pin_hash {
        active_model.pin_hash = Set(pin_hash);
    }
    if let Some(phone) = changes.phone {
        active_model.phone = Set(Some(phone));
    }

    active_model.update(db).await.map_err(Into::into)
}

/// Validates a phone number: 10 to 15 digits, optionally prefixed with `+`.
pub fn validate_phone(phone: &str) -> Result<()> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.len() < 10 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation {
            message: "Phone number must be 10 to 15 digits".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_flat_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        // Empty flat number
        let result = create_flat(&db, String::new(), 2000.0, "hash".to_string(), None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { message: _ }
        ));

        // Non-positive amount
        let result = create_flat(&db, "101".to_string(), 0.0, "hash".to_string(), None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { message: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_get_flat() -> Result<()> {
        let db = setup_test_db().await?;

        let flat = create_test_flat(&db, "101").await?;
        assert_eq!(flat.flat_number, "101");
        assert_eq!(flat.maintenance_amount, 2000.0);
        assert!(flat.phone.is_none());

        let found = get_flat_by_number(&db, "101").await?;
        assert_eq!(found.unwrap().id, flat.id);

        let by_id = get_flat_by_id(&db, flat.id).await?;
        assert_eq!(by_id.unwrap().flat_number, "101");

        let missing = get_flat_by_number(&db, "999").await?;
        assert!(missing.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_flats_ordered() -> Result<()> {
        let db = setup_test_db().await?;

        create_test_flat(&db, "203").await?;
        create_test_flat(&db, "101").await?;
        create_test_flat(&db, "102").await?;

        let flats = get_all_flats(&db).await?;
        assert_eq!(flats.len(), 3);
        assert_eq!(flats[0].flat_number, "101");
        assert_eq!(flats[1].flat_number, "102");
        assert_eq!(flats[2].flat_number, "203");

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_flat_number_rejected() -> Result<()> {
        let db = setup_test_db().await?;

        create_test_flat(&db, "101").await?;
        let result = create_test_flat(&db, "101").await;
        assert!(result.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_flat_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let flat = create_test_flat(&db, "101").await?;

        let updated = update_flat(
            &db,
            flat.id,
            FlatChanges {
                maintenance_amount: Some(2500.0),
                pin_hash: None,
                phone: Some("9876543210".to_string()),
            },
        )
        .await?;

        assert_eq!(updated.maintenance_amount, 2500.0);
        assert_eq!(updated.phone.as_deref(), Some("9876543210"));
        // Untouched field preserved
        assert_eq!(updated.pin_hash, flat.pin_hash);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_flat_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = update_flat(
            &db,
            999,
            FlatChanges {
                maintenance_amount: Some(2500.0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::FlatNotFound { id: 999 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_flat_invalid_amount() -> Result<()> {
        let db = setup_test_db().await?;
        let flat = create_test_flat(&db, "101").await?;

        let result = update_flat(
            &db,
            flat.id,
            FlatChanges {
                maintenance_amount: Some(-10.0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { message: _ }
        ));

        Ok(())
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+919876543210").is_ok());
        assert!(validate_phone("123456789").is_err()); // too short
        assert!(validate_phone("1234567890123456").is_err()); // too long
        assert!(validate_phone("98765abcde").is_err()); // non-digits
    }
}
