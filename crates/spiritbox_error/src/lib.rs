//! Error types for the Spiritbox community bot.
//!
//! This crate provides the foundation error types used throughout the
//! Spiritbox workspace. Each domain gets a kind enum plus an error struct
//! that records the source location where it was raised.

mod catalog;
mod config;
mod database;

pub use catalog::{CatalogError, CatalogErrorKind, CatalogResult};
pub use config::{ConfigError, ConfigResult};
pub use database::{DatabaseError, DatabaseErrorKind, DatabaseResult};

/// Workspace-level error variants.
#[derive(Debug, derive_more::From)]
pub enum SpiritboxErrorKind {
    /// Persistence layer error
    Database(DatabaseError),
    /// Achievement/challenge catalog error
    Catalog(CatalogError),
    /// Configuration error
    Config(ConfigError),
}

impl std::fmt::Display for SpiritboxErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpiritboxErrorKind::Database(e) => write!(f, "{}", e),
            SpiritboxErrorKind::Catalog(e) => write!(f, "{}", e),
            SpiritboxErrorKind::Config(e) => write!(f, "{}", e),
        }
    }
}

/// Spiritbox error with kind discrimination.
#[derive(Debug)]
pub struct SpiritboxError(Box<SpiritboxErrorKind>);

impl SpiritboxError {
    /// Create a new error from a kind.
    pub fn new(kind: SpiritboxErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &SpiritboxErrorKind {
        &self.0
    }
}

impl std::fmt::Display for SpiritboxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Spiritbox Error: {}", self.0)
    }
}

impl std::error::Error for SpiritboxError {}

// Generic From implementation for any type that converts to SpiritboxErrorKind
impl<T> From<T> for SpiritboxError
where
    T: Into<SpiritboxErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Spiritbox operations.
pub type SpiritboxResult<T> = std::result::Result<T, SpiritboxError>;
