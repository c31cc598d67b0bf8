use serde::{Deserialize, Serialize};

/// How a leaf's bytes should be interpreted when comparing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// JSON document; eligible for structural diffing.
    Json,
    /// TOML document; eligible for structural diffing.
    Toml,
    /// Opaque bytes; compared for equality only.
    #[default]
    Raw,
}

impl ContentType {
    /// Returns `true` if content of this type parses into a value tree.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Json | Self::Toml)
    }

    /// Guess the content type from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "toml" => Self::Toml,
            _ => Self::Raw,
        }
    }

    /// Guess the content type from a node name such as `"role.json"`.
    pub fn from_name(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Self::from_extension(ext),
            _ => Self::Raw,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Toml => write!(f, "toml"),
            Self::Raw => write!(f, "raw"),
        }
    }
}
