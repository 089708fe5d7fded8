use proptest::prelude::*;

/// Property-based checks for the matcher invariants

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence;
    use crate::distance::distance;
    use crate::domain::{MatchMode, Pattern, SlotIndex};
    use crate::engine::NeuroCam;

    const MASK12: u16 = 0x0FFF;

    fn brute_force_best(cam: &NeuroCam, q: Pattern) -> (u8, SlotIndex) {
        let mut best = (u8::MAX, SlotIndex::new(usize::MAX, usize::MAX));
        for (slot, t) in cam.store().iter() {
            if !t.occupied {
                continue;
            }
            let d = distance(q, t.value, MASK12);
            if d < best.0 {
                best = (d, slot);
            }
        }
        best
    }

    // =========================================================================
    // Distance
    // =========================================================================
    proptest! {
        #[test]
        fn distance_matches_popcount(a in 0u16..4096, b in 0u16..4096) {
            let d = distance(Pattern(a), Pattern(b), MASK12);
            prop_assert_eq!(u32::from(d), (a ^ b).count_ones());
            prop_assert_eq!(d, distance(Pattern(b), Pattern(a), MASK12));
            prop_assert_eq!(distance(Pattern(a), Pattern(a), MASK12), 0);
            prop_assert!(d <= 12);
        }
    }

    // =========================================================================
    // Confidence monotonicity
    // =========================================================================
    proptest! {
        #[test]
        fn confidence_non_decreasing_in_gap(best in 1u8..=12, gap in 0u8..12) {
            let lo = confidence::score(best, Some(best + gap), 3);
            let hi = confidence::score(best, Some(best + gap + 1), 3);
            prop_assert!(hi >= lo);
        }
    }

    // =========================================================================
    // Engine agrees with a brute-force scan (first minimum in linear order)
    // =========================================================================
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn engine_matches_brute_force(q in 0u16..4096) {
            let mut cam = NeuroCam::default();
            let r = cam.search(Pattern(q), MatchMode::Fuzzy).unwrap();
            let (d, slot) = brute_force_best(&cam, Pattern(q));
            prop_assert_eq!(r.distance, d);
            prop_assert_eq!(r.slot, Some(slot));
        }

        #[test]
        fn write_then_search_round_trips(bank in 0usize..4, offset in 0usize..4, p in 0u16..4096) {
            let mut cam = NeuroCam::default();
            cam.write_template(bank, offset, Pattern(p)).unwrap();
            cam.tick();
            let r = cam.search(Pattern(p), MatchMode::Exact).unwrap();
            prop_assert!(r.valid);
            prop_assert_eq!(r.distance, 0);
            // an earlier slot may already hold the same value
            let (_, first) = brute_force_best(&cam, Pattern(p));
            prop_assert_eq!(r.slot, Some(first));
            prop_assert!(first <= SlotIndex::new(bank, offset));
        }

        #[test]
        fn latency_is_exactly_pipeline_depth(q in 0u16..4096, idle in 0usize..5) {
            let mut cam = NeuroCam::default();
            for _ in 0..idle {
                cam.tick();
            }
            let handle = cam.submit_query(Pattern(q), MatchMode::Fuzzy).unwrap();
            let depth = cam.latency();
            for _ in 1..depth {
                prop_assert!(cam.tick().is_none());
            }
            let r = cam.tick();
            prop_assert!(r.is_some());
            prop_assert_eq!(r.and_then(|r| r.handle), Some(handle));
            prop_assert_eq!(cam.now(), handle.submitted_at + depth as u64);
        }

        #[test]
        fn poll_is_idempotent(q in 0u16..4096, extra in 0usize..6) {
            let mut cam = NeuroCam::default();
            let r = cam.search(Pattern(q), MatchMode::Fuzzy).unwrap();
            for _ in 0..extra {
                cam.tick();
            }
            prop_assert_eq!(cam.poll_result(), r);
            prop_assert_eq!(cam.poll_result(), cam.poll_result());
        }
    }
}
