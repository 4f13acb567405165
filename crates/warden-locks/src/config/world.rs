//! World files
//!
//! A world file bundles engine configuration with named entities, so checks
//! can be run from the command line or from fixtures.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ConfigLoader, EngineConfig};
use crate::error::{Error, Result};
use crate::participant::Entity;

/// Configuration plus named entities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct World {
    /// Engine configuration
    pub config: EngineConfig,
    /// Entities by name
    pub entities: BTreeMap<String, Entity>,
}

impl World {
    /// Load a world file (YAML, TOML or JSON)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut world: World = ConfigLoader::load_from_file(path)?;
        for (name, entity) in world.entities.iter_mut() {
            if entity.name.is_empty() {
                entity.name = name.clone();
            }
        }
        Ok(world)
    }

    /// Look up an entity by name
    pub fn entity(&self, name: &str) -> Result<&Entity> {
        self.entities
            .get(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::Participant;
    use tempfile::TempDir;

    const WORLD: &str = r#"
config:
  groups:
    Builders: [can_dig]
entities:
  bob:
    id: 7
    permissions: "Builders"
  hole:
    permissions: "dig: can_dig"
"#;

    #[test]
    fn test_load_world() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("world.yaml");
        std::fs::write(&path, WORLD).unwrap();

        let world = World::load(&path).unwrap();
        assert_eq!(world.config.groups["Builders"], vec!["can_dig"]);

        let bob = world.entity("bob").unwrap();
        assert_eq!(bob.name, "bob");
        assert_eq!(bob.id(), Some(7));
        assert!(matches!(world.entity("nobody"), Err(Error::UnknownEntity(_))));
    }
}
