/// Database configuration and connection management
pub mod database;

/// Flat roster loading from config.toml and first-run seeding
pub mod flats;
