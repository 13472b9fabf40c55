use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::TagFormat;

/// Default config file name, looked up in the project directory.
pub const CONFIG_FILE: &str = "fnpack.toml";

/// fnpack.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FnpackConfig {
    #[serde(default)]
    pub build: BuildDefaults,
    /// Functions keyed by name; iteration is in name order.
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionConfig>,
}

/// Settings shared by every function in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildDefaults {
    /// Tag format for all images
    #[serde(default)]
    pub tag: TagFormat,
    /// Extra paths copied into every function's build context
    #[serde(default)]
    pub copy: Vec<String>,
    /// Free-form flags passed to `docker build`
    #[serde(default)]
    pub build_flags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionConfig {
    /// Language template name, or `dockerfile`
    pub lang: String,
    /// Directory containing the function's source
    pub handler: String,
    /// Image name without the version-control suffix
    pub image: String,
    #[serde(default)]
    pub build_args: BTreeMap<String, String>,
    #[serde(default)]
    pub build_labels: BTreeMap<String, String>,
    /// Build options declared by the language template
    #[serde(default)]
    pub build_options: Vec<String>,
    /// Extra paths copied after the global `[build].copy` list
    #[serde(default)]
    pub copy: Vec<String>,
}

impl FnpackConfig {
    /// Load from fnpack.toml in the given directory, or return defaults if not found.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        Self::load_file(&project_dir.join(CONFIG_FILE))
    }

    /// Load from an explicit file path, or return defaults if it does not exist.
    pub fn load_file(config_path: &Path) -> crate::Result<Self> {
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(config_path).map_err(|e| crate::Error::ConfigLoad {
                path: config_path.to_path_buf(),
                source: e,
            })?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        for (name, function) in &self.functions {
            let problem = if name.trim().is_empty() {
                Some("function name is empty")
            } else if function.lang.trim().is_empty() {
                Some("`lang` is required")
            } else if !crate::template::is_single_segment(&function.lang) {
                Some("`lang` must be a single template folder name")
            } else if function.handler.trim().is_empty() {
                Some("`handler` is required")
            } else if function.image.trim().is_empty() {
                Some("`image` is required")
            } else {
                None
            };

            if let Some(reason) = problem {
                return Err(crate::Error::InvalidFunction {
                    name: name.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }

    /// Extra paths for `function`: global entries first, then the function's own.
    pub fn copy_paths_for(&self, function: &FunctionConfig) -> Vec<String> {
        self.build
            .copy
            .iter()
            .chain(function.copy.iter())
            .cloned()
            .collect()
    }
}
