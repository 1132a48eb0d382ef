//! Database models

use serde::{Deserialize, Serialize};

/// Microstructure classes shown by the explorer, in palette order
pub const MICROSTRUCTURE_CLASSES: [&str; 7] = [
    "spheroidite",
    "spheroidite+widmanstatten",
    "martensite",
    "network",
    "pearlite",
    "pearlite+spheroidite",
    "pearlite+widmanstatten",
];

/// Marker/border colors for each class, parallel to [`MICROSTRUCTURE_CLASSES`]
///
/// Thumbnail borders on the catalog pages use the same colors as the explorer
/// scatterplot so the two views read consistently.
pub const CLASS_COLORS: [&str; 7] = [
    "#0343df", // blue
    "#0485d1", // cerulean
    "#e50000", // red
    "#825f87", // dusty purple
    "#feb209", // saffron
    "#fedf08", // dandelion
    "#15b01a", // green
];

/// Color for a microstructure class, `None` for labels outside the fixed set
pub fn class_color(label: &str) -> Option<&'static str> {
    MICROSTRUCTURE_CLASSES
        .iter()
        .position(|c| *c == label)
        .map(|i| CLASS_COLORS[i])
}

/// Uploader/owner of micrographs
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub givenname: Option<String>,
    pub familyname: Option<String>,
    pub email: Option<String>,
    pub orcid: Option<String>,
}

impl User {
    /// Name for display: "given family" when known, otherwise the username
    pub fn display_name(&self) -> String {
        match (&self.givenname, &self.familyname) {
            (Some(given), Some(family)) => format!("{} {}", given, family),
            (Some(given), None) => given.clone(),
            (None, Some(family)) => family.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

/// Convert an anneal time to minutes
///
/// Only the `H` unit is scaled; anything else is already minutes.
pub fn anneal_minutes(time: Option<f64>, unit: Option<&str>) -> Option<f64> {
    match (time, unit) {
        (Some(t), Some("H")) => Some(t * 60.0),
        (t, _) => t,
    }
}

/// Micrograph joined with its sample, as returned by the store
///
/// Sample columns are absent when the micrograph has no sample. The anneal
/// time unit is `M` (minutes) or `H` (hours); temperatures are in °C.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MicrographRow {
    pub id: i64,
    pub path: Option<String>,
    pub mstructure_class: Option<String>,
    pub micron_bar: Option<f64>,
    pub micron_bar_units: Option<String>,
    pub micron_bar_px: Option<f64>,
    pub magnification: Option<f64>,
    pub detector: Option<String>,
    pub sample_id: Option<i64>,
    pub user_id: Option<i64>,
    pub sample_label: Option<String>,
    pub anneal_time: Option<f64>,
    pub anneal_time_unit: Option<String>,
    pub anneal_temperature: Option<f64>,
    pub cool_method: Option<String>,
}

/// Flattened micrograph + sample record used by every page and the plot
///
/// `anneal_time` is always in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrographInfo {
    pub id: i64,
    pub path: Option<String>,
    pub mstructure_class: Option<String>,
    pub micron_bar: Option<f64>,
    pub micron_bar_units: Option<String>,
    pub micron_bar_px: Option<f64>,
    pub magnification: Option<f64>,
    pub detector: Option<String>,
    pub sample_id: Option<i64>,
    pub user_id: Option<i64>,
    pub sample_label: Option<String>,
    pub anneal_time: Option<f64>,
    pub anneal_temperature: Option<f64>,
    pub cool_method: Option<String>,
}

impl From<MicrographRow> for MicrographInfo {
    fn from(row: MicrographRow) -> Self {
        let anneal_time = anneal_minutes(row.anneal_time, row.anneal_time_unit.as_deref());
        Self {
            id: row.id,
            path: row.path,
            mstructure_class: row.mstructure_class,
            micron_bar: row.micron_bar,
            micron_bar_units: row.micron_bar_units,
            micron_bar_px: row.micron_bar_px,
            magnification: row.magnification,
            detector: row.detector,
            sample_id: row.sample_id,
            user_id: row.user_id,
            sample_label: row.sample_label,
            anneal_time,
            anneal_temperature: row.anneal_temperature,
            cool_method: row.cool_method,
        }
    }
}

impl MicrographInfo {
    /// Image scale in microns per pixel
    pub fn microns_per_px(&self) -> Option<f64> {
        match (self.micron_bar, self.micron_bar_px) {
            (Some(bar), Some(px)) if px != 0.0 => Some(bar / px),
            _ => None,
        }
    }

    /// Thumbnail location relative to the catalog root
    pub fn thumbnail(&self) -> String {
        format!("static/thumbs/micrograph{}.png", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(time: Option<f64>, unit: Option<&str>) -> MicrographRow {
        MicrographRow {
            id: 1,
            path: Some("micrograph1.tif".to_string()),
            mstructure_class: Some("pearlite".to_string()),
            micron_bar: Some(10.0),
            micron_bar_units: Some("um".to_string()),
            micron_bar_px: Some(200.0),
            magnification: None,
            detector: None,
            sample_id: Some(1),
            user_id: Some(1),
            sample_label: None,
            anneal_time: time,
            anneal_time_unit: unit.map(str::to_string),
            anneal_temperature: Some(800.0),
            cool_method: None,
        }
    }

    #[test]
    fn test_hours_normalized_to_minutes() {
        let info = MicrographInfo::from(row(Some(2.0), Some("H")));
        assert_eq!(info.anneal_time, Some(120.0));
    }

    #[test]
    fn test_minutes_unchanged() {
        let info = MicrographInfo::from(row(Some(90.0), Some("M")));
        assert_eq!(info.anneal_time, Some(90.0));

        let info = MicrographInfo::from(row(None, Some("H")));
        assert_eq!(info.anneal_time, None);
    }

    #[test]
    fn test_microns_per_px() {
        let info = MicrographInfo::from(row(None, None));
        assert_eq!(info.microns_per_px(), Some(0.05));

        let mut zero_px = row(None, None);
        zero_px.micron_bar_px = Some(0.0);
        assert_eq!(MicrographInfo::from(zero_px).microns_per_px(), None);
    }

    #[test]
    fn test_class_color_lookup() {
        assert_eq!(class_color("spheroidite"), Some("#0343df"));
        assert_eq!(class_color("pearlite+widmanstatten"), Some("#15b01a"));
        assert_eq!(class_color("bainite"), None);
    }

    #[test]
    fn test_user_display_name() {
        let user = User {
            id: 1,
            username: "bdecost".to_string(),
            givenname: Some("Brian".to_string()),
            familyname: Some("DeCost".to_string()),
            email: None,
            orcid: None,
        };
        assert_eq!(user.display_name(), "Brian DeCost");

        let bare = User {
            givenname: None,
            familyname: None,
            ..user
        };
        assert_eq!(bare.display_name(), "bdecost");
    }
}
