//! Reactive projection state for one explorer session
//!
//! A [`Projection`] owns the session's plot source and control values. Every
//! control change goes through [`Projection::apply`], which recomputes the
//! derived channels and only rereads coordinates when the representation or
//! manifold actually changed. A failed change leaves everything as it was.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uhcsdb_common::db::class_color;
use uhcsdb_common::{Result, SENTINEL};

use crate::controls::{ColorBy, Control, ControlState, SizeBy};
use crate::dataset::Dataset;
use crate::embedding::CoordinateSource;
use crate::palette::{self, MASKED_COLOR};

/// Opacity of markers colored by class
pub const CLASS_ALPHA: f64 = 0.8;

/// Opacity of markers whose color or size value is missing
pub const MASKED_ALPHA: f64 = 0.3;

/// Marker size when no size variable is selected
pub const BASE_SIZE: f64 = 10.0;

/// Range added on top of [`BASE_SIZE`] for the largest value
pub const SIZE_RANGE: f64 = 30.0;

/// Marker size for missing size values
pub const MASKED_SIZE: f64 = 5.0;

/// Column-oriented plot data, one row per micrograph
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotSource {
    pub key: Vec<i64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub thumb: Vec<String>,
    pub mclass: Vec<String>,
    pub temperature: Vec<f64>,
    /// Anneal time in minutes
    pub time: Vec<f64>,
    /// Microns per pixel
    pub mag: Vec<f64>,
    pub size: Vec<f64>,
    pub c: Vec<String>,
    pub alpha: Vec<f64>,
}

/// A control change that could not be applied
#[derive(Debug, Clone, Error)]
#[error("{control}: {message}")]
pub struct ControlError {
    pub control: Control,
    pub message: String,
}

impl ControlError {
    fn new(control: Control, message: impl Into<String>) -> Self {
        Self {
            control,
            message: message.into(),
        }
    }
}

fn is_missing(v: f64) -> bool {
    v == SENTINEL || !v.is_finite()
}

/// Min and max of the values that are present
fn present_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| !is_missing(*v))
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Position of `v` between `lo` and `hi`, 0 when the range is empty
fn normalize(v: f64, lo: f64, hi: f64) -> f64 {
    let span = hi - lo;
    if span > 0.0 {
        (v - lo) / span
    } else {
        0.0
    }
}

/// Class colors at [`CLASS_ALPHA`]
pub fn class_colors(dataset: &Dataset) -> (Vec<String>, Vec<f64>) {
    let colors = dataset
        .records()
        .iter()
        .map(|r| class_color(&r.mstructure_class).unwrap_or(MASKED_COLOR).to_string())
        .collect();
    (colors, vec![CLASS_ALPHA; dataset.len()])
}

/// Reds scale over present values; missing values are black at [`MASKED_ALPHA`]
pub fn numeric_colors(values: &[f64]) -> (Vec<String>, Vec<f64>) {
    let range = present_range(values);
    values
        .iter()
        .map(|&v| match range {
            Some((lo, hi)) if !is_missing(v) => (palette::reds(normalize(v, lo, hi)), 1.0),
            _ => (MASKED_COLOR.to_string(), MASKED_ALPHA),
        })
        .unzip()
}

/// Sizes in [10, 40] over present values; missing values get [`MASKED_SIZE`]
///
/// Returns the per-marker opacity limit alongside: 1.0 for present values,
/// [`MASKED_ALPHA`] for missing ones.
pub fn numeric_sizes(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let range = present_range(values);
    values
        .iter()
        .map(|&v| match range {
            Some((lo, hi)) if !is_missing(v) => {
                (BASE_SIZE + SIZE_RANGE * normalize(v, lo, hi), 1.0)
            }
            _ => (MASKED_SIZE, MASKED_ALPHA),
        })
        .unzip()
}

/// Color, size and alpha columns for the given control values
fn style(dataset: &Dataset, color: ColorBy, size: SizeBy) -> (Vec<String>, Vec<f64>, Vec<f64>) {
    let (colors, mut alpha) = match color.field() {
        None => class_colors(dataset),
        Some(field) => numeric_colors(&dataset.values(field)),
    };

    let sizes = match size.field() {
        None => vec![BASE_SIZE; dataset.len()],
        Some(field) => {
            let (sizes, size_alpha) = numeric_sizes(&dataset.values(field));
            for (a, limit) in alpha.iter_mut().zip(size_alpha) {
                *a = a.min(limit);
            }
            sizes
        }
    };

    (colors, sizes, alpha)
}

/// Session-owned plot state
pub struct Projection {
    dataset: Arc<Dataset>,
    coordinates: Arc<dyn CoordinateSource>,
    representations: Arc<Vec<String>>,
    state: ControlState,
    plot: PlotSource,
}

impl Projection {
    /// Load the initial layout and compute every channel
    pub fn new(
        dataset: Arc<Dataset>,
        coordinates: Arc<dyn CoordinateSource>,
        representations: Arc<Vec<String>>,
        state: ControlState,
    ) -> Result<Self> {
        let keys = dataset.ids();
        let xy = coordinates.load(&state.representation, state.manifold, &keys)?;
        let (c, size, alpha) = style(&dataset, state.color, state.size);

        let records = dataset.records();
        let plot = PlotSource {
            key: keys,
            x: xy.iter().map(|p| p[0]).collect(),
            y: xy.iter().map(|p| p[1]).collect(),
            thumb: records.iter().map(|r| r.thumb.clone()).collect(),
            mclass: records.iter().map(|r| r.mstructure_class.clone()).collect(),
            temperature: records.iter().map(|r| r.anneal_temperature).collect(),
            time: records.iter().map(|r| r.anneal_time).collect(),
            mag: records.iter().map(|r| r.scale).collect(),
            size,
            c,
            alpha,
        };

        Ok(Self {
            dataset,
            coordinates,
            representations,
            state,
            plot,
        })
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn plot(&self) -> &PlotSource {
        &self.plot
    }

    /// Set one control and recompute the plot
    ///
    /// On error the plot and the control values are unchanged.
    pub fn apply(&mut self, control: Control, value: &str) -> std::result::Result<(), ControlError> {
        let next = self
            .state
            .with(control, value, &self.representations)
            .ok_or_else(|| ControlError::new(control, format!("unknown option {:?}", value)))?;

        let relayout = next.representation != self.state.representation
            || next.manifold != self.state.manifold;

        let xy = if relayout {
            info!(
                "Reloading {} / {}",
                next.representation,
                next.manifold.as_str()
            );
            let xy = self
                .coordinates
                .load(&next.representation, next.manifold, &self.plot.key)
                .map_err(|e| {
                    warn!("Keeping previous layout: {}", e);
                    ControlError::new(control, e.to_string())
                })?;
            Some(xy)
        } else {
            None
        };

        let (c, size, alpha) = style(&self.dataset, next.color, next.size);

        if let Some(xy) = xy {
            self.plot.x = xy.iter().map(|p| p[0]).collect();
            self.plot.y = xy.iter().map(|p| p[1]).collect();
        }
        self.plot.c = c;
        self.plot.size = size;
        self.plot.alpha = alpha;

        debug!("{} -> {}", control, value);
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::Manifold;
    use crate::dataset::tests::entry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uhcsdb_common::Error;

    /// Coordinates derived from the key, counting every load
    #[derive(Default)]
    struct CountingSource {
        loads: AtomicUsize,
        missing: Mutex<Vec<(String, Manifold)>>,
    }

    impl CountingSource {
        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    impl CoordinateSource for CountingSource {
        fn load(&self, representation: &str, manifold: Manifold, keys: &[i64]) -> Result<Vec<[f64; 2]>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let missing = self.missing.lock().unwrap();
            if missing.iter().any(|(r, m)| r == representation && *m == manifold) {
                return Err(Error::MissingData(format!("no {} for {}", manifold.as_str(), representation)));
            }
            let offset = match manifold {
                Manifold::Tsne => 0.0,
                _ => 100.0,
            };
            Ok(keys.iter().map(|&k| [k as f64 + offset, -(k as f64)]).collect())
        }
    }

    fn dataset() -> Arc<Dataset> {
        Arc::new(Dataset::from_entries(vec![
            entry(1, Some("spheroidite"), Some(700.0), Some((2.0, "H"))),
            entry(2, Some("martensite"), Some(1100.0), Some((5.0, "M"))),
            entry(3, Some("pearlite"), None, None),
            entry(4, Some("network"), Some(900.0), Some((90.0, "M"))),
        ]))
    }

    fn reps() -> Arc<Vec<String>> {
        Arc::new(vec!["a.json".to_string(), "b.json".to_string()])
    }

    fn projection(source: Arc<CountingSource>) -> Projection {
        let state = ControlState::initial(&reps()).unwrap();
        Projection::new(dataset(), source, reps(), state).unwrap()
    }

    #[test]
    fn test_initial_channels() {
        let source = Arc::new(CountingSource::default());
        let p = projection(source.clone());

        assert_eq!(source.loads(), 1);
        assert_eq!(p.plot().key, vec![1, 2, 3, 4]);
        assert_eq!(p.plot().x, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(p.plot().c[0], "#0343df");
        assert_eq!(p.plot().c[1], "#e50000");
        assert!(p.plot().alpha.iter().all(|a| *a == CLASS_ALPHA));
        assert!(p.plot().size.iter().all(|s| *s == BASE_SIZE));
        assert_eq!(p.plot().time, vec![120.0, 5.0, SENTINEL, 90.0]);
    }

    #[test]
    fn test_numeric_color_masks_missing_and_spans_scale() {
        let source = Arc::new(CountingSource::default());
        let mut p = projection(source);
        p.apply(Control::Color, "anneal_temperature").unwrap();

        let plot = p.plot();
        // 700 is the minimum, 1100 the maximum
        assert_eq!(plot.c[0], "#fff5f0");
        assert_eq!(plot.c[1], "#67000d");
        assert_eq!(plot.c[2], MASKED_COLOR);
        assert_eq!(plot.alpha, vec![1.0, 1.0, MASKED_ALPHA, 1.0]);
    }

    #[test]
    fn test_size_change_does_not_reload() {
        let source = Arc::new(CountingSource::default());
        let mut p = projection(source.clone());

        p.apply(Control::Size, "anneal_time").unwrap();
        p.apply(Control::Color, "log(scale)").unwrap();
        assert_eq!(source.loads(), 1);

        let plot = p.plot();
        // 5 minutes is the minimum, 120 the maximum
        assert_eq!(plot.size, vec![40.0, 10.0, MASKED_SIZE, 10.0 + 30.0 * (85.0 / 115.0)]);
    }

    #[test]
    fn test_manifold_change_reloads() {
        let source = Arc::new(CountingSource::default());
        let mut p = projection(source.clone());

        p.apply(Control::Manifold, "PCA").unwrap();
        assert_eq!(source.loads(), 2);
        assert_eq!(p.plot().x[0], 101.0);

        // Same value again is not a change
        p.apply(Control::Manifold, "PCA").unwrap();
        assert_eq!(source.loads(), 2);

        p.apply(Control::Representation, "b.json").unwrap();
        assert_eq!(source.loads(), 3);
        assert_eq!(p.state().representation, "b.json");
    }

    #[test]
    fn test_final_alpha_is_minimum_of_channels() {
        let source = Arc::new(CountingSource::default());
        let mut p = projection(source);

        // Class colors (0.8) with a size channel: present sizes leave 0.8,
        // the missing-size entry drops to 0.3
        p.apply(Control::Size, "anneal_temperature").unwrap();
        assert_eq!(p.plot().alpha, vec![CLASS_ALPHA, CLASS_ALPHA, MASKED_ALPHA, CLASS_ALPHA]);

        p.apply(Control::Color, "anneal_time").unwrap();
        assert_eq!(p.plot().alpha, vec![1.0, 1.0, MASKED_ALPHA, 1.0]);
    }

    #[test]
    fn test_failed_reload_keeps_last_good_state() {
        let source = Arc::new(CountingSource::default());
        source
            .missing
            .lock()
            .unwrap()
            .push(("a.json".to_string(), Manifold::Lle));
        let mut p = projection(source.clone());
        p.apply(Control::Color, "anneal_temperature").unwrap();
        let before_state = p.state().clone();
        let before_plot = p.plot().clone();

        let err = p.apply(Control::Manifold, "LLE").unwrap_err();
        assert_eq!(err.control, Control::Manifold);
        assert_eq!(p.state(), &before_state);
        assert_eq!(p.plot(), &before_plot);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let source = Arc::new(CountingSource::default());
        let mut p = projection(source.clone());

        let err = p.apply(Control::Representation, "missing.json").unwrap_err();
        assert_eq!(err.control, Control::Representation);
        assert_eq!(source.loads(), 1);
    }

    #[test]
    fn test_constant_values_use_lightest_color() {
        let (colors, alpha) = numeric_colors(&[5.0, 5.0, SENTINEL]);
        assert_eq!(colors, vec!["#fff5f0", "#fff5f0", MASKED_COLOR]);
        assert_eq!(alpha, vec![1.0, 1.0, MASKED_ALPHA]);

        let (sizes, _) = numeric_sizes(&[SENTINEL, SENTINEL]);
        assert_eq!(sizes, vec![MASKED_SIZE, MASKED_SIZE]);
    }
}
