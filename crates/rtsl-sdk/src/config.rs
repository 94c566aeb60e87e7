//! Save/load configuration, optionally read from a TOML file.
//!
//! ```toml
//! # Most records one shard may hold before a new one is started.
//! max_assets = 65535
//! # First shard-local identity of every shard (0 is the null reference).
//! initial_id = 1
//! builtin_folder = "BuiltInAssets"
//! builtin_library = "BuiltInAssetLibrary"
//! scene_library = "SceneAssetLibrary"
//! # "breadth_first" (default) or "depth_first"
//! traversal = "breadth_first"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use rtsl_collect::TraversalOrder;
use rtsl_library::{library_key, ShardLayout};
use rtsl_store::validate_name;

use crate::error::{SdkError, SdkResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveLoadConfig {
    pub max_assets: usize,
    pub initial_id: u32,
    pub builtin_folder: String,
    pub builtin_library: String,
    pub scene_library: String,
    pub traversal: TraversalOrder,
}

impl SaveLoadConfig {
    pub const DEFAULT_MAX_ASSETS: usize = 65_535;

    /// Parse and validate a TOML document; absent keys take defaults.
    pub fn from_toml_str(content: &str) -> SdkResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SdkError::Config(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.max_assets == 0 {
            return Err(SdkError::Config("max_assets must be positive".into()));
        }
        if self.initial_id == 0 {
            return Err(SdkError::Config(
                "initial_id must be at least 1; 0 is the null reference".into(),
            ));
        }
        let last = u64::from(self.initial_id) + self.max_assets as u64 - 1;
        if last > u64::from(u32::MAX) {
            return Err(SdkError::Config(format!(
                "initial_id {} + max_assets {} overflows the shard-local counter",
                self.initial_id, self.max_assets
            )));
        }
        for (field, library) in [
            ("builtin_library", &self.builtin_library),
            ("scene_library", &self.scene_library),
        ] {
            if library.is_empty() || library.contains('/') {
                return Err(SdkError::Config(format!(
                    "{field} must be a single non-empty name"
                )));
            }
        }
        validate_name(&library_key(&self.builtin_folder, &self.builtin_library))
            .map_err(|e| SdkError::Config(e.to_string()))?;
        Ok(())
    }

    /// Shard layout for `library` under `folder`.
    pub fn layout(&self, folder: &str, library: &str) -> ShardLayout {
        ShardLayout {
            folder: folder.to_string(),
            library_name: library.to_string(),
            max_assets: self.max_assets,
            initial_id: self.initial_id,
        }
    }
}

impl Default for SaveLoadConfig {
    fn default() -> Self {
        Self {
            max_assets: Self::DEFAULT_MAX_ASSETS,
            initial_id: 1,
            builtin_folder: "BuiltInAssets".into(),
            builtin_library: "BuiltInAssetLibrary".into(),
            scene_library: "SceneAssetLibrary".into(),
            traversal: TraversalOrder::BreadthFirst,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(SaveLoadConfig::from_toml_str("").unwrap(), SaveLoadConfig::default());
    }

    #[test]
    fn partial_document_overrides() {
        let config = SaveLoadConfig::from_toml_str(
            "max_assets = 10\ntraversal = \"depth_first\"\n",
        )
        .unwrap();
        assert_eq!(config.max_assets, 10);
        assert_eq!(config.traversal, TraversalOrder::DepthFirst);
        assert_eq!(config.scene_library, "SceneAssetLibrary");
    }

    #[test]
    fn invalid_values_are_rejected() {
        for doc in [
            "max_assets = 0",
            "initial_id = 0",
            "initial_id = 4294967295\nmax_assets = 2",
            "scene_library = \"a/b\"",
            "builtin_folder = \"../up\"",
        ] {
            let err = SaveLoadConfig::from_toml_str(doc).unwrap_err();
            assert!(matches!(err, SdkError::Config(_)), "{doc}");
        }
        assert!(SaveLoadConfig::from_toml_str("max_assets = \"many\"").is_err());
    }

    #[test]
    fn load_from_file_and_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rtsl.toml");
        let config = SaveLoadConfig {
            max_assets: 7,
            ..SaveLoadConfig::default()
        };
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();
        assert_eq!(SaveLoadConfig::load(&path).unwrap(), config);
        assert!(SaveLoadConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn layout_carries_limits() {
        let layout = SaveLoadConfig::default().layout("Scenes", "SceneAssetLibrary");
        assert_eq!(layout.max_assets, 65_535);
        assert_eq!(layout.initial_id, 1);
        assert_eq!(layout.folder, "Scenes");
    }
}
