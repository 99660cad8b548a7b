use serde::{Deserialize, Serialize};

use crate::error::{ShadelinkError, ShadelinkResult};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub remove_unused_functions: bool,
    pub strip_const_parameters: bool,
    pub remove_empty_declarations: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            remove_unused_functions: true,
            strip_const_parameters: true,
            remove_empty_declarations: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub enabled: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShadelinkConfig {
    /// Name of the function every stage starts executing at.
    pub entry_point: String,
    /// Reserved prefix for synthesized alias names.
    pub alias_prefix: String,
    /// Emit every throttled diagnostic instead of the first plus a summary.
    pub verbose_diagnostics: bool,
    pub normalize: NormalizeConfig,
    pub reconcile: ReconcileConfig,
}

impl Default for ShadelinkConfig {
    fn default() -> Self {
        Self {
            entry_point: "main".to_string(),
            alias_prefix: "shadelink_alias_".to_string(),
            verbose_diagnostics: false,
            normalize: NormalizeConfig::default(),
            reconcile: ReconcileConfig::default(),
        }
    }
}

impl ShadelinkConfig {
    pub fn load_from_file(path: &std::path::Path) -> ShadelinkResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ShadelinkError::Config { message, .. } => ShadelinkError::config(message, path),
            other => other,
        })
    }

    pub fn from_toml_str(contents: &str) -> ShadelinkResult<Self> {
        let config: ShadelinkConfig = toml::from_str(contents)
            .map_err(|e| ShadelinkError::config(e.to_string(), "<inline>"))?;
        if config.alias_prefix.is_empty() {
            return Err(ShadelinkError::config(
                "alias_prefix must not be empty",
                "<inline>",
            ));
        }
        Ok(config)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> ShadelinkResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ShadelinkError::config(e.to_string(), path))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
