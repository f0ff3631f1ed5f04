use std::{fmt, time::Duration};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::Keyed;

/// Duration of a reorder animation.
pub const REORDER_DURATION: Duration = Duration::from_millis(260);

/// Rows that moved by less than this are not animated.
pub const MIN_ANIMATED_DELTA: f64 = 1.0;

/// A cubic Bézier timing function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Easing {
    /// x of the first control point.
    pub x1: f64,
    /// y of the first control point.
    pub y1: f64,
    /// x of the second control point.
    pub x2: f64,
    /// y of the second control point.
    pub y2: f64,
}

impl Easing {
    /// Easing of reorder animations.
    pub const REORDER: Self = Self {
        x1: 0.2,
        y1: 0.8,
        x2: 0.2,
        y2: 1.0,
    };
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cubic-bezier({}, {}, {}, {})",
            self.x1, self.y1, self.x2, self.y2
        )
    }
}

/// Measures where rows are rendered.
pub trait RowLayout {
    /// Top offset of the row rendered at `index` with identity `key`.
    ///
    /// Returns `None` for rows that are not rendered.
    fn top_offset(&self, index: usize, key: &str) -> Option<f64>;
}

impl<L: RowLayout + ?Sized> RowLayout for &L {
    fn top_offset(&self, index: usize, key: &str) -> Option<f64> {
        (**self).top_offset(index, key)
    }
}

/// Rows of equal height stacked from offset zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformRowLayout {
    /// Height of one row.
    pub row_height: f64,
}

impl Default for UniformRowLayout {
    fn default() -> Self {
        Self { row_height: 1.0 }
    }
}

impl RowLayout for UniformRowLayout {
    fn top_offset(&self, index: usize, _key: &str) -> Option<f64> {
        Some(index as f64 * self.row_height)
    }
}

/// Offsets measured by the host, by identity key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasuredLayout {
    tops: IndexMap<String, f64>,
}

impl MeasuredLayout {
    /// Record the top offset of `key`.
    pub fn insert(&mut self, key: impl Into<String>, top: f64) {
        self.tops.insert(key.into(), top);
    }
}

impl FromIterator<(String, f64)> for MeasuredLayout {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            tops: iter.into_iter().collect(),
        }
    }
}

impl RowLayout for MeasuredLayout {
    fn top_offset(&self, _index: usize, key: &str) -> Option<f64> {
        self.tops.get(key).copied()
    }
}

/// Animation of one row from its previous to its new position.
#[derive(Debug, Clone, PartialEq)]
pub struct RowAnimation {
    /// Identity key of the row.
    pub key: String,
    /// Start translation, `previous_top - new_top`.
    pub from_offset: f64,
    /// End translation.
    pub to_offset: f64,
    /// Duration.
    pub duration: Duration,
    /// Timing function.
    pub easing: Easing,
}

impl RowAnimation {
    fn new(key: String, delta: f64) -> Self {
        Self {
            key,
            from_offset: delta,
            to_offset: 0.0,
            duration: REORDER_DURATION,
            easing: Easing::REORDER,
        }
    }

    /// Returns whether the row moved towards the top.
    pub fn moved_up(&self) -> bool {
        self.from_offset > 0.0
    }
}

/// Rendered positions of rows, keyed by identity.
///
/// Capture it right before replacing the rows, then consume it with
/// [`play`](Self::play) once the new rows are laid out.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "a snapshot does nothing until it is played"]
pub struct PositionSnapshot {
    tops: IndexMap<String, f64>,
    ambiguous: IndexSet<String>,
}

impl PositionSnapshot {
    /// Record the position of every rendered row.
    pub fn capture<R: Keyed>(rows: &[R], layout: &impl RowLayout) -> Self {
        Self::from_measurements(rows.iter().enumerate().filter_map(|(index, row)| {
            let key = row.identity_key();
            let top = layout.top_offset(index, &key)?;
            Some((key.into_owned(), top))
        }))
    }

    /// Build from `(key, top)` measurements.
    pub fn from_measurements(measurements: impl IntoIterator<Item = (String, f64)>) -> Self {
        let mut snapshot = Self::default();
        for (key, top) in measurements {
            if snapshot.ambiguous.contains(&key) {
                continue;
            }
            if snapshot.tops.shift_remove(&key).is_some() {
                tracing::debug!(%key, "duplicate row key, not animating it");
                snapshot.ambiguous.insert(key);
            } else {
                snapshot.tops.insert(key, top);
            }
        }
        snapshot
    }

    /// Number of uniquely keyed rows.
    pub fn len(&self) -> usize {
        self.tops.len()
    }

    /// Returns whether no row was recorded.
    pub fn is_empty(&self) -> bool {
        self.tops.is_empty()
    }

    /// Recorded top offset of `key`.
    pub fn top(&self, key: &str) -> Option<f64> {
        self.tops.get(key).copied()
    }

    /// Measure the new rows and animate every row that moved.
    pub fn play<R: Keyed>(self, rows: &[R], layout: &impl RowLayout) -> Vec<RowAnimation> {
        self.animate_to(Self::capture(rows, layout))
    }

    /// Animate from this snapshot to `next`, in the order of `next`.
    ///
    /// Rows absent from either side, rows with an ambiguous key and rows that
    /// moved by less than [`MIN_ANIMATED_DELTA`] are skipped.
    pub fn animate_to(self, next: Self) -> Vec<RowAnimation> {
        let Self {
            tops: previous,
            ambiguous,
        } = self;
        next.tops
            .into_iter()
            .filter(|(key, _)| !ambiguous.contains(key))
            .filter_map(|(key, top)| {
                let delta = previous.get(&key)? - top;
                (delta.abs() >= MIN_ANIMATED_DELTA).then(|| RowAnimation::new(key, delta))
            })
            .collect()
    }
}
