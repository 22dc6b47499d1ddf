//! Role-guarded operation surface.
//!
//! One public function per externally reachable operation. Each takes a
//! [`Session`] produced by the external session provider and checks the role
//! before touching persistence; resident operations are additionally scoped
//! to the session's own flat. Token issuance and verification live outside
//! this crate.

/// Scheduled daily tick entry point
pub mod daily;
/// Flat roster operations
pub mod flats;
/// Month lifecycle operations
pub mod months;
/// Payment submission and status transitions
pub mod payments;
/// Reminder log operations
pub mod reminders;
/// Settings snapshot and updates
pub mod settings;

use crate::errors::{Error, Result};

/// Caller role as established by the external session provider.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    /// A flat's resident, scoped to that flat
    Resident,
    /// The security guard
    Security,
    /// The building admin
    Admin,
}

impl Role {
    /// String form, as stored in reminder audit rows.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::Security => "security",
            Self::Admin => "admin",
        }
    }
}

/// An authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Authenticated role
    pub role: Role,
    /// Resident's flat id, `None` for staff sessions
    pub flat_id: Option<i64>,
    /// Resident's flat number, `None` for staff sessions
    pub flat_number: Option<String>,
}

impl Session {
    /// Admin session.
    #[must_use]
    pub const fn admin() -> Self {
        Self {
            role: Role::Admin,
            flat_id: None,
            flat_number: None,
        }
    }

    /// Security session.
    #[must_use]
    pub const fn security() -> Self {
        Self {
            role: Role::Security,
            flat_id: None,
            flat_number: None,
        }
    }

    /// Resident session scoped to one flat.
    #[must_use]
    pub const fn resident(flat_id: i64, flat_number: String) -> Self {
        Self {
            role: Role::Resident,
            flat_id: Some(flat_id),
            flat_number: Some(flat_number),
        }
    }
}

fn require_admin(session: &Session) -> Result<()> {
    if session.role == Role::Admin {
        Ok(())
    } else {
        Err(Error::Forbidden { required: "admin" })
    }
}

fn require_security(session: &Session) -> Result<()> {
    if session.role == Role::Security {
        Ok(())
    } else {
        Err(Error::Forbidden { required: "security" })
    }
}

fn require_staff(session: &Session) -> Result<()> {
    match session.role {
        Role::Admin | Role::Security => Ok(()),
        Role::Resident => Err(Error::Forbidden {
            required: "admin or security",
        }),
    }
}

/// Resident sessions must carry their flat scope; a resident session without
/// one cannot be attributed and is treated as unauthenticated.
fn require_resident_flat(session: &Session) -> Result<(i64, String)> {
    if session.role != Role::Resident {
        return Err(Error::Forbidden {
            required: "resident",
        });
    }
    match (session.flat_id, &session.flat_number) {
        (Some(flat_id), Some(flat_number)) => Ok((flat_id, flat_number.clone())),
        _ => Err(Error::Unauthorized),
    }
}
