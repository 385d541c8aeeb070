use crate::model::{Resource, ResourceKind};

// Calibrated preference constants. These decide which table wins a tie on
// real floors; do not round or "simplify" them.

/// Per extra member in a combination.
pub const COMBINATION_PENALTY: f64 = 30.0;
/// Per MergedFixed member when seating a small party.
pub const MERGED_MISMATCH_PENALTY: f64 = 10.0;
/// Parties up to this size don't belong on merged hardware.
pub const SMALL_PARTY_MAX: u32 = 5;
/// A circular table inside a combination should never happen; the generator
/// excludes it, this keeps it from winning if one slips through.
pub const CIRCULAR_COMBO_PENALTY: f64 = 100.0;
/// A lone circular table is the ideal seat for 5-7 guests.
pub const CIRCULAR_IDEAL_BONUS: f64 = -50.0;
pub const CIRCULAR_IDEAL_MIN: u32 = 5;
pub const CIRCULAR_IDEAL_MAX: u32 = 7;
/// Parties of 8+ prefer members ranked above this weight.
pub const LARGE_PARTY_MIN: u32 = 8;
pub const LARGE_MEMBER_WEIGHT: f64 = 50.0;
pub const LARGE_MEMBER_BONUS: f64 = -5.0;
/// Preference rank contribution (lower weight is worse, so higher mean rank
/// pulls the score down).
pub const PRIORITY_FACTOR: f64 = 10.0;
/// Mean rank below this marks a last-resort set (the overflow resource).
pub const LOW_PRIORITY_MEAN: f64 = 0.5;
pub const LOW_PRIORITY_PENALTY: f64 = 500.0;

/// Preference score for one candidate. Lower is better.
pub fn score(members: &[&Resource], capacity: u32, party_size: u32) -> f64 {
    debug_assert!(capacity >= party_size, "candidate must fit the party");
    let waste = f64::from(capacity.saturating_sub(party_size));
    let count_penalty = COMBINATION_PENALTY * (members.len() as f64 - 1.0);

    let mut total = waste + count_penalty;

    if party_size <= SMALL_PARTY_MAX {
        let merged = members
            .iter()
            .filter(|r| r.kind == ResourceKind::MergedFixed)
            .count();
        total += MERGED_MISMATCH_PENALTY * merged as f64;
    }

    let any_circular = members.iter().any(|r| r.kind == ResourceKind::Circular);
    if members.len() > 1 && any_circular {
        total += CIRCULAR_COMBO_PENALTY;
    }
    if members.len() == 1
        && any_circular
        && (CIRCULAR_IDEAL_MIN..=CIRCULAR_IDEAL_MAX).contains(&party_size)
    {
        total += CIRCULAR_IDEAL_BONUS;
    }

    if party_size >= LARGE_PARTY_MIN {
        let large = members
            .iter()
            .filter(|r| r.priority_weight > LARGE_MEMBER_WEIGHT)
            .count();
        total += LARGE_MEMBER_BONUS * large as f64;
    }

    let mean_priority =
        members.iter().map(|r| r.priority_weight).sum::<f64>() / members.len() as f64;
    total -= PRIORITY_FACTOR * mean_priority;
    if mean_priority < LOW_PRIORITY_MEAN {
        total += LOW_PRIORITY_PENALTY;
    }

    total
}
