use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString, IntoStaticStr, VariantNames};
use tracing::warn;

/// The axis along which a linear layout places its windows one after another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// How a group's windows share the host rectangle.
#[derive(
    Default,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Display,
    EnumString,
    IntoStaticStr,
    VariantNames
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LayoutKind {
    /// Side-by-side columns, left to right.
    #[default]
    Vertical,
    /// Stacked rows, top to bottom.
    Horizontal,
    /// Two columns, as many rows as needed.
    #[serde(rename = "grid2x2")]
    #[strum(serialize = "grid2x2")]
    Grid2x2,
}

impl LayoutKind {
    pub fn orientation(self) -> Option<Orientation> {
        match self {
            LayoutKind::Vertical => Some(Orientation::Horizontal),
            LayoutKind::Horizontal => Some(Orientation::Vertical),
            LayoutKind::Grid2x2 => None,
        }
    }

    /// Parses a stored layout name, falling back to the default for blank or
    /// unknown values.
    pub fn from_name(name: &str) -> LayoutKind {
        let name = name.trim();
        if name.is_empty() {
            return LayoutKind::default();
        }
        name.parse().unwrap_or_else(|_| {
            warn!("Unknown layout '{name}', using {}", LayoutKind::default());
            LayoutKind::default()
        })
    }
}

impl<'de> Deserialize<'de> for LayoutKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(LayoutKind::from_name).unwrap_or_default())
    }
}
