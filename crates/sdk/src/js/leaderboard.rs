use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

use crate::leaderboard::{medal, PositionSnapshot, RowAnimation};

/// Measured top offset of a rendered row.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
pub struct RowTop {
    /// Identity key of the row.
    pub key: String,
    /// Top offset in pixels.
    pub top: f64,
}

/// Arguments of [`compute_reorder`].
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
pub struct ComputeReorderArgs {
    /// Tops measured right before the rows were replaced.
    pub previous: Vec<RowTop>,
    /// Tops measured right after.
    pub next: Vec<RowTop>,
}

/// Animation of a moved row.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct JsRowAnimation {
    /// Identity key of the row.
    pub key: String,
    /// Start translation in pixels.
    pub from_offset: f64,
    /// End translation in pixels.
    pub to_offset: f64,
    /// Duration in milliseconds.
    pub duration_ms: u32,
    /// CSS timing function.
    pub easing: String,
}

impl From<RowAnimation> for JsRowAnimation {
    fn from(animation: RowAnimation) -> Self {
        Self {
            key: animation.key,
            from_offset: animation.from_offset,
            to_offset: animation.to_offset,
            duration_ms: u32::try_from(animation.duration.as_millis()).unwrap_or(u32::MAX),
            easing: animation.easing.to_string(),
        }
    }
}

/// Animations to play.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct ReorderOutput {
    /// One animation per moved row, in the order of `next`.
    pub animations: Vec<JsRowAnimation>,
}

fn snapshot(tops: Vec<RowTop>) -> PositionSnapshot {
    PositionSnapshot::from_measurements(tops.into_iter().map(|row| (row.key, row.top)))
}

/// Compute the reorder animations between two measurements.
#[wasm_bindgen(js_name = computeReorder)]
pub fn compute_reorder(args: ComputeReorderArgs) -> ReorderOutput {
    let animations = snapshot(args.previous).animate_to(snapshot(args.next));
    ReorderOutput {
        animations: animations.into_iter().map(Into::into).collect(),
    }
}

/// Medal for a rank, if any.
#[wasm_bindgen(js_name = rankMedal)]
pub fn rank_medal(rank: u32) -> Option<String> {
    medal(rank).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tops(rows: &[(&str, f64)]) -> Vec<RowTop> {
        rows.iter()
            .map(|(key, top)| RowTop {
                key: key.to_string(),
                top: *top,
            })
            .collect()
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn swapped_rows_animate() {
        let output = compute_reorder(ComputeReorderArgs {
            previous: tops(&[("alice", 0.0), ("bob", 40.0), ("carol", 80.0)]),
            next: tops(&[("bob", 0.0), ("alice", 40.0), ("carol", 80.5)]),
        });
        let keys = output
            .animations
            .iter()
            .map(|animation| (animation.key.as_str(), animation.from_offset))
            .collect::<Vec<_>>();
        assert_eq!(keys, [("bob", 40.0), ("alice", -40.0)]);
        assert_eq!(output.animations[0].duration_ms, 260);
        assert_eq!(output.animations[0].easing, "cubic-bezier(0.2, 0.8, 0.2, 1)");
    }
}
