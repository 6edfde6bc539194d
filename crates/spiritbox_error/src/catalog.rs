//! Achievement and challenge catalog error types.

/// Catalog error conditions.
///
/// Raised when loading or validating achievement/challenge definitions.
/// Evaluation itself never raises these; a definition that fails validation
/// is rejected at load time so typos surface early instead of silently
/// failing closed at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CatalogErrorKind {
    /// A definition names a custom condition with no registered predicate.
    UnknownCondition {
        /// Definition id carrying the bad condition
        definition: String,
        /// The unrecognized condition name
        condition: String,
    },
    /// A challenge requirement key maps to no known action.
    UnknownAction {
        /// Definition id carrying the bad requirement
        definition: String,
        /// The unrecognized requirement key
        requirement: String,
    },
    /// A definition is structurally invalid (empty requirements, bad window).
    InvalidDefinition {
        /// Definition id
        definition: String,
        /// Why it was rejected
        reason: String,
    },
    /// A seed file could not be parsed.
    Seed(String),
}

impl std::fmt::Display for CatalogErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogErrorKind::UnknownCondition {
                definition,
                condition,
            } => write!(
                f,
                "Definition '{}' names unknown custom condition '{}'",
                definition, condition
            ),
            CatalogErrorKind::UnknownAction {
                definition,
                requirement,
            } => write!(
                f,
                "Definition '{}' requirement '{}' maps to no known action",
                definition, requirement
            ),
            CatalogErrorKind::InvalidDefinition { definition, reason } => {
                write!(f, "Definition '{}' rejected: {}", definition, reason)
            }
            CatalogErrorKind::Seed(msg) => write!(f, "Catalog seed error: {}", msg),
        }
    }
}

/// Catalog error with source location tracking.
#[derive(Debug, Clone)]
pub struct CatalogError {
    /// The kind of error that occurred
    pub kind: CatalogErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CatalogError {
    /// Create a new CatalogError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CatalogErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Catalog Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for CatalogError {}

/// Result type for catalog operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
