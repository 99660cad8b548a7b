//! Stage manifests: which interchange file holds which program variant.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use shadelink_ast::Document;
use shadelink_core::PatchStage;
use shadelink_transform::Pipeline;

/// A manifest like
///
/// ```toml
/// vertex = "terrain.vsh.json"
/// fragment = "terrain.fsh.json"
/// ```
///
/// Relative paths resolve against the manifest's directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct StageManifest {
    stages: BTreeMap<PatchStage, PathBuf>,
}

impl StageManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&contents, base)
            .with_context(|| format!("invalid manifest: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str, base: &Path) -> Result<Self> {
        let mut manifest: StageManifest = toml::from_str(contents)?;
        if manifest.stages.is_empty() {
            anyhow::bail!("manifest lists no stages");
        }
        for path in manifest.stages.values_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        Ok(manifest)
    }

    pub fn stages(&self) -> impl Iterator<Item = (PatchStage, &Path)> {
        self.stages.iter().map(|(stage, path)| (*stage, path.as_path()))
    }

    /// Read every listed stage into a pipeline.
    pub fn load_pipeline(&self) -> Result<Pipeline> {
        let mut pipeline = Pipeline::new();
        for (stage, path) in self.stages() {
            tracing::debug!("Loading {} from {}", stage, path.display());
            pipeline.insert(stage, load_document(path)?);
        }
        Ok(pipeline)
    }
}

/// Read a JSON interchange tree and build its document.
pub fn load_document(path: &Path) -> Result<Document> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;
    Document::from_json(&contents)
        .with_context(|| format!("failed to load syntax tree: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_resolves_relative_paths() {
        let manifest = StageManifest::from_toml_str(
            "vertex = \"a.vsh.json\"\nfragment_cutout = \"/abs/b.fsh.json\"\n",
            Path::new("shaders"),
        )
        .unwrap();
        let stages: Vec<(PatchStage, &Path)> = manifest.stages().collect();
        assert_eq!(
            stages,
            vec![
                (PatchStage::Vertex, Path::new("shaders/a.vsh.json")),
                (PatchStage::FragmentCutout, Path::new("/abs/b.fsh.json")),
            ]
        );
    }

    #[test]
    fn test_unknown_stage_is_rejected() {
        let result = StageManifest::from_toml_str("tessellation = \"t.json\"\n", Path::new("."));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_manifest_is_rejected() {
        let result = StageManifest::from_toml_str("", Path::new("."));
        assert!(result.is_err());
    }
}
