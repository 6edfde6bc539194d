//! Catalog seed file parsing.
//!
//! Achievement definitions and hand-scheduled challenge instances are
//! administered as TOML files and loaded into the database by the
//! `seed-catalogs` subcommand. Periodic challenges are not seeded; the
//! rotation jobs generate those.

use serde::Deserialize;
use spiritbox_core::{Achievement, Challenge};
use spiritbox_error::{CatalogError, CatalogErrorKind, CatalogResult};
use std::path::Path;
use tracing::info;

/// Parsed seed file contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedCatalog {
    /// Achievement definitions
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    /// Special/event challenge instances
    #[serde(default)]
    pub challenges: Vec<Challenge>,
}

/// Read and validate a seed file.
///
/// Every definition must validate; a seed file with one bad entry is
/// rejected whole so a typo cannot half-apply.
pub fn load_seed_catalog(path: &Path) -> CatalogResult<SeedCatalog> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        CatalogError::new(CatalogErrorKind::Seed(format!(
            "cannot read {}: {}",
            path.display(),
            e
        )))
    })?;
    let catalog: SeedCatalog = toml::from_str(&raw).map_err(|e| {
        CatalogError::new(CatalogErrorKind::Seed(format!(
            "cannot parse {}: {}",
            path.display(),
            e
        )))
    })?;

    for achievement in &catalog.achievements {
        achievement.validate()?;
    }
    for challenge in &catalog.challenges {
        challenge.validate()?;
    }

    info!(
        achievements = catalog.achievements.len(),
        challenges = catalog.challenges.len(),
        path = %path.display(),
        "Loaded seed catalog"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const GOOD_SEED: &str = r#"
[[achievements]]
id = "first_words"
name = "First Words"
description = "Send your first message"
category = "activity"
rarity = "common"
points = 5
enabled = true

[achievements.requirements]
message_count = 1

[achievements.rewards]
money = 25

[[achievements]]
id = "night_owl"
name = "Night Owl"
description = "Message the dead hours"
category = "special"
rarity = "rare"
points = 20
enabled = true

[achievements.requirements]
custom_condition = "night_owl"

[achievements.rewards]
xp = 250
"#;

    #[test]
    fn test_load_good_seed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GOOD_SEED.as_bytes()).unwrap();

        let catalog = load_seed_catalog(file.path()).unwrap();
        assert_eq!(catalog.achievements.len(), 2);
        assert_eq!(catalog.achievements[0].id, "first_words");
        assert!(catalog.challenges.is_empty());
    }

    #[test]
    fn test_unknown_condition_rejects_whole_file() {
        let bad = GOOD_SEED.replace("night_owl\"", "nightowl-typo\"");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bad.as_bytes()).unwrap();

        assert!(load_seed_catalog(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_seed_error() {
        assert!(load_seed_catalog(Path::new("/nonexistent/seeds.toml")).is_err());
    }
}
