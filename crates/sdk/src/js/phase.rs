use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

use crate::phase::{phase, CompetitionWindow};

use super::parse_time;

/// Arguments of [`competition_phase`].
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionPhaseArgs {
    /// Current time (RFC 3339).
    pub now: String,
    /// Start of the competition (RFC 3339).
    pub starts_at: String,
    /// End of the competition (RFC 3339).
    pub ends_at: String,
}

/// Evaluated phase.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionPhaseOutput {
    /// `UPCOMING`, `LIVE` or `ENDED`.
    pub phase: String,
    /// Human readable label.
    pub label: String,
    /// Whether the join panel or the leaderboard is shown.
    pub view: String,
}

/// Evaluate the phase of a competition at a given time.
#[wasm_bindgen(js_name = competitionPhase)]
pub fn competition_phase(args: CompetitionPhaseArgs) -> crate::Result<CompetitionPhaseOutput> {
    let now = parse_time("now", &args.now)?;
    let window = CompetitionWindow::new(
        parse_time("startsAt", &args.starts_at)?,
        parse_time("endsAt", &args.ends_at)?,
    );
    let phase = phase(now, &window);
    Ok(CompetitionPhaseOutput {
        phase: phase.to_string(),
        label: phase.label().to_string(),
        view: phase.view().to_string(),
    })
}
