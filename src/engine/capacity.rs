use ulid::Ulid;

use crate::layout::Layout;
use crate::model::Resource;

use super::EngineError;

/// Members further apart than this along the stacking (y) axis are seated as
/// independent rows: no join loss, capacity is the exact sum.
pub const VERTICAL_STACK_THRESHOLD: f64 = 50.0;

/// Effective seating capacity of a resource set.
///
/// Single resource: its `max_occupancy`. Combinations lose seats at the
/// joins, modelled by the stepped formula over unit weights (MergedFixed = 2
/// units, others = 1): 2 units seat 10, each further unit adds +5 (odd
/// ordinal) or +4 (even ordinal). The constants are calibrated against the
/// physical tables; every downstream feasibility and scoring decision depends
/// on them.
pub fn effective_capacity(members: &[&Resource]) -> u32 {
    match members {
        [] => 0,
        [single] => single.max_occupancy,
        _ => {
            if is_vertical(members) {
                return members.iter().map(|r| r.max_occupancy).sum();
            }
            let units: u32 = members.iter().map(|r| r.units()).sum();
            stepped_capacity(units)
        }
    }
}

/// Resolve ids against the layout, then compute. Unknown ids are a hard
/// caller error.
pub fn capacity_of(ids: &[Ulid], layout: &Layout) -> Result<u32, EngineError> {
    let mut members = Vec::with_capacity(ids.len());
    for id in ids {
        members.push(
            layout
                .resource(id)
                .ok_or(EngineError::UnknownResource(*id))?,
        );
    }
    Ok(effective_capacity(&members))
}

/// 2u -> 10, then +5 for each odd unit ordinal, +4 for each even one:
/// 3u -> 15, 4u -> 19, 5u -> 24, 6u -> 28, 7u -> 33, 8u -> 37, ...
fn stepped_capacity(units: u32) -> u32 {
    debug_assert!(units >= 2, "combinations carry at least 2 units");
    let mut capacity = 10;
    for u in 3..=units {
        capacity += if u % 2 == 1 { 5 } else { 4 };
    }
    capacity
}

/// A combination is "vertical" when its members span more than the threshold
/// along the stacking axis. Members without a position never trigger the
/// rule.
fn is_vertical(members: &[&Resource]) -> bool {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for r in members {
        match r.position {
            Some(p) => {
                min_y = min_y.min(p.y);
                max_y = max_y.max(p.y);
            }
            None => return false,
        }
    }
    max_y - min_y > VERTICAL_STACK_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, ResourceKind};

    fn table(kind: ResourceKind, max: u32) -> Resource {
        Resource {
            id: Ulid::new(),
            kind,
            min_occupancy: 1,
            max_occupancy: max,
            priority_weight: 50.0,
            position: None,
        }
    }

    fn table_at(max: u32, y: f64) -> Resource {
        Resource {
            position: Some(Position { x: 0.0, y }),
            ..table(ResourceKind::Standard, max)
        }
    }

    #[test]
    fn single_resource_is_its_max() {
        let r = table(ResourceKind::Standard, 4);
        assert_eq!(effective_capacity(&[&r]), 4);
        let c = table(ResourceKind::Circular, 7);
        assert_eq!(effective_capacity(&[&c]), 7);
    }

    #[test]
    fn empty_set_is_zero() {
        assert_eq!(effective_capacity(&[]), 0);
    }

    #[test]
    fn stepped_formula_exact() {
        // units 2..8 -> {10, 15, 19, 24, 28, 33, 37}
        let expected = [(2, 10), (3, 15), (4, 19), (5, 24), (6, 28), (7, 33), (8, 37)];
        for (units, cap) in expected {
            let members: Vec<Resource> = (0..units)
                .map(|_| table(ResourceKind::Standard, 4))
                .collect();
            let refs: Vec<&Resource> = members.iter().collect();
            assert_eq!(effective_capacity(&refs), cap, "units = {units}");
        }
    }

    #[test]
    fn merged_fixed_counts_two_units() {
        // merged (2u) + standard (1u) = 3 units -> 15
        let m = table(ResourceKind::MergedFixed, 8);
        let s = table(ResourceKind::Standard, 4);
        assert_eq!(effective_capacity(&[&m, &s]), 15);

        // merged + merged = 4 units -> 19
        let m2 = table(ResourceKind::MergedFixed, 8);
        assert_eq!(effective_capacity(&[&m, &m2]), 19);
    }

    #[test]
    fn vertical_combination_sums_exactly() {
        let a = table_at(4, 0.0);
        let b = table_at(8, 80.0);
        assert_eq!(effective_capacity(&[&a, &b]), 12);
    }

    #[test]
    fn near_stack_uses_stepped_formula() {
        // delta of exactly 50 is NOT vertical (strictly greater required)
        let a = table_at(4, 0.0);
        let b = table_at(8, 50.0);
        assert_eq!(effective_capacity(&[&a, &b]), 10); // 2 units stepped

        let c = table_at(8, 30.0);
        assert_eq!(effective_capacity(&[&a, &c]), 10);
    }

    #[test]
    fn missing_position_never_vertical() {
        let a = table_at(4, 0.0);
        let b = table(ResourceKind::Standard, 8); // no position
        assert_eq!(effective_capacity(&[&a, &b]), 10);
    }

    #[test]
    fn capacity_of_unknown_id_fails() {
        let layout = Layout::new();
        let result = capacity_of(&[Ulid::new()], &layout);
        assert!(matches!(result, Err(EngineError::UnknownResource(_))));
    }

    #[test]
    fn capacity_of_resolves_layout() {
        let mut layout = Layout::new();
        let a = table(ResourceKind::Standard, 4);
        let b = table(ResourceKind::Standard, 4);
        let (ida, idb) = (a.id, b.id);
        layout.insert(a);
        layout.insert(b);
        assert_eq!(capacity_of(&[ida], &layout).unwrap(), 4);
        assert_eq!(capacity_of(&[ida, idb], &layout).unwrap(), 10);
    }
}
