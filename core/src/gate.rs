use crate::identification::IdentificationResult;

/// Minimum top-species confidence for answering directly.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.50;

/// What to do with an identification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Confident enough: present the analysis and answer follow-ups.
    Direct,
    /// Not confident (or nothing identified): ask the user to describe
    /// symptoms before diagnosing.
    ElicitSymptoms,
}

/// Pure decision over a canonical result: `ElicitSymptoms` when no species
/// was identified or the best species confidence is below the threshold
/// (exclusive), `Direct` otherwise. Provider scores are consumed as given,
/// never recalibrated.
pub fn assess(result: &IdentificationResult, threshold: f64) -> GateDecision {
    match result
        .species
        .iter()
        .map(|species| species.confidence)
        .reduce(f64::max)
    {
        Some(best) if best >= threshold => GateDecision::Direct,
        _ => GateDecision::ElicitSymptoms,
    }
}
