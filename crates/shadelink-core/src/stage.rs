use serde::{Deserialize, Serialize};

/// A logical position in the shader pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

impl ShaderStage {
    /// Stages in the order data flows through them.
    pub const PIPELINE: [ShaderStage; 3] = [
        ShaderStage::Vertex,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
    ];

    /// The concrete program variants that occupy this stage.
    pub fn variants(self) -> &'static [PatchStage] {
        match self {
            ShaderStage::Vertex => &[PatchStage::Vertex],
            ShaderStage::Geometry => &[PatchStage::Geometry],
            ShaderStage::Fragment => &[PatchStage::Fragment, PatchStage::FragmentCutout],
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "VERTEX"),
            ShaderStage::Geometry => write!(f, "GEOMETRY"),
            ShaderStage::Fragment => write!(f, "FRAGMENT"),
        }
    }
}

/// A concrete shader program variant.
///
/// Several variants can share one [`ShaderStage`]; e.g. the cutout fragment
/// program is an alternative consumer of the same vertex outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStage {
    Vertex,
    Geometry,
    Fragment,
    FragmentCutout,
}

impl PatchStage {
    pub fn stage(self) -> ShaderStage {
        match self {
            PatchStage::Vertex => ShaderStage::Vertex,
            PatchStage::Geometry => ShaderStage::Geometry,
            PatchStage::Fragment | PatchStage::FragmentCutout => ShaderStage::Fragment,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vertex" => Some(PatchStage::Vertex),
            "geometry" => Some(PatchStage::Geometry),
            "fragment" => Some(PatchStage::Fragment),
            "fragment_cutout" => Some(PatchStage::FragmentCutout),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PatchStage::Vertex => "vertex",
            PatchStage::Geometry => "geometry",
            PatchStage::Fragment => "fragment",
            PatchStage::FragmentCutout => "fragment_cutout",
        }
    }
}

impl std::fmt::Display for PatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
