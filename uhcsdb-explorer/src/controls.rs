//! Explorer controls and their option sets

use serde::{Deserialize, Serialize};

/// Default representation file, when present in the cache folder
pub const DEFAULT_REPRESENTATION: &str = "vgg16_block5_conv3-vlad-32.json";

/// Which control a change request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Representation,
    Manifold,
    Color,
    Size,
}

impl Control {
    pub fn as_str(&self) -> &'static str {
        match self {
            Control::Representation => "representation",
            Control::Manifold => "manifold",
            Control::Color => "color",
            Control::Size => "size",
        }
    }
}

impl std::fmt::Display for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dimensionality-reduction method that produced the 2-D layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Manifold {
    #[serde(rename = "PCA")]
    Pca,
    #[serde(rename = "t-SNE")]
    Tsne,
    #[serde(rename = "MDS")]
    Mds,
    #[serde(rename = "LLE")]
    Lle,
    Isomap,
    SpectralEmbedding,
}

impl Manifold {
    pub const ALL: [Manifold; 6] = [
        Manifold::Pca,
        Manifold::Tsne,
        Manifold::Mds,
        Manifold::Lle,
        Manifold::Isomap,
        Manifold::SpectralEmbedding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Manifold::Pca => "PCA",
            Manifold::Tsne => "t-SNE",
            Manifold::Mds => "MDS",
            Manifold::Lle => "LLE",
            Manifold::Isomap => "Isomap",
            Manifold::SpectralEmbedding => "SpectralEmbedding",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }
}

/// Numeric metadata usable as a color or size channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    AnnealTemperature,
    /// Always in minutes
    AnnealTime,
    /// Natural log of microns per pixel
    LogScale,
}

/// Marker color variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorBy {
    #[serde(rename = "primary microconstituent")]
    Microconstituent,
    #[serde(rename = "anneal_temperature")]
    AnnealTemperature,
    #[serde(rename = "anneal_time")]
    AnnealTime,
    #[serde(rename = "log(scale)")]
    LogScale,
}

impl ColorBy {
    pub const ALL: [ColorBy; 4] = [
        ColorBy::Microconstituent,
        ColorBy::AnnealTemperature,
        ColorBy::AnnealTime,
        ColorBy::LogScale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorBy::Microconstituent => "primary microconstituent",
            ColorBy::AnnealTemperature => "anneal_temperature",
            ColorBy::AnnealTime => "anneal_time",
            ColorBy::LogScale => "log(scale)",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }

    /// Numeric field behind this choice; `None` for the class palette
    pub fn field(&self) -> Option<NumericField> {
        match self {
            ColorBy::Microconstituent => None,
            ColorBy::AnnealTemperature => Some(NumericField::AnnealTemperature),
            ColorBy::AnnealTime => Some(NumericField::AnnealTime),
            ColorBy::LogScale => Some(NumericField::LogScale),
        }
    }
}

/// Marker size variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeBy {
    None,
    #[serde(rename = "anneal_temperature")]
    AnnealTemperature,
    #[serde(rename = "anneal_time")]
    AnnealTime,
}

impl SizeBy {
    pub const ALL: [SizeBy; 3] = [SizeBy::None, SizeBy::AnnealTemperature, SizeBy::AnnealTime];

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeBy::None => "None",
            SizeBy::AnnealTemperature => "anneal_temperature",
            SizeBy::AnnealTime => "anneal_time",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn field(&self) -> Option<NumericField> {
        match self {
            SizeBy::None => None,
            SizeBy::AnnealTemperature => Some(NumericField::AnnealTemperature),
            SizeBy::AnnealTime => Some(NumericField::AnnealTime),
        }
    }
}

/// Current value of every control in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub representation: String,
    pub manifold: Manifold,
    pub color: ColorBy,
    pub size: SizeBy,
}

impl ControlState {
    /// Initial controls: default representation (or the first available), t-SNE,
    /// class colors, uniform size
    pub fn initial(representations: &[String]) -> Option<Self> {
        let representation = representations
            .iter()
            .find(|r| r.as_str() == DEFAULT_REPRESENTATION)
            .or_else(|| representations.first())?
            .clone();

        Some(Self {
            representation,
            manifold: Manifold::Tsne,
            color: ColorBy::Microconstituent,
            size: SizeBy::None,
        })
    }

    /// State after setting `control` to `value`, or `None` if `value` is not one of its options
    pub fn with(&self, control: Control, value: &str, representations: &[String]) -> Option<Self> {
        let mut next = self.clone();
        match control {
            Control::Representation => {
                next.representation = representations.iter().find(|r| *r == value)?.clone();
            }
            Control::Manifold => next.manifold = Manifold::parse(value)?,
            Control::Color => next.color = ColorBy::parse(value)?,
            Control::Size => next.size = SizeBy::parse(value)?,
        }
        Some(next)
    }
}

/// Option lists for every control, as shown in the select boxes
#[derive(Debug, Clone, Serialize)]
pub struct ControlOptions {
    pub representation: Vec<String>,
    pub manifold: Vec<&'static str>,
    pub color: Vec<&'static str>,
    pub size: Vec<&'static str>,
}

impl ControlOptions {
    pub fn new(representations: &[String]) -> Self {
        Self {
            representation: representations.to_vec(),
            manifold: Manifold::ALL.iter().map(Manifold::as_str).collect(),
            color: ColorBy::ALL.iter().map(ColorBy::as_str).collect(),
            size: SizeBy::ALL.iter().map(SizeBy::as_str).collect(),
        }
    }
}
