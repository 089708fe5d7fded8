//! Confidence from the separation between best and second-best banks.
//!
//! `confidence = min(255, (second_best - best) << shift)`, with two fixed
//! cases: an exact match always scores 255, and a field with no bank above
//! the minimum scores 0.

/// Confidence for a reduced match
#[inline]
pub fn score(best: u8, second_best: Option<u8>, shift: u8) -> u8 {
    if best == 0 {
        return u8::MAX;
    }
    match second_best {
        Some(second) => {
            let gap = u32::from(second.saturating_sub(best));
            if gap == 0 {
                return 0;
            }
            // shifts that push the gap out of a u32 saturate
            gap.checked_shl(u32::from(shift))
                .filter(|&scaled| scaled >> shift == gap)
                .map_or(u8::MAX, |scaled| scaled.min(u32::from(u8::MAX)) as u8)
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_saturates() {
        assert_eq!(score(0, None, 3), 255);
        assert_eq!(score(0, Some(1), 3), 255);
    }

    #[test]
    fn gap_scaled_by_eight() {
        assert_eq!(score(1, Some(3), 3), 16);
        assert_eq!(score(2, Some(3), 3), 8);
    }

    #[test]
    fn oversized_shift_saturates() {
        assert_eq!(score(1, Some(3), 40), 255);
        assert_eq!(score(1, Some(3), 31), 255);
        assert_eq!(score(1, Some(1), 40), 0);
    }

    #[test]
    fn missing_second_best_is_zero() {
        assert_eq!(score(4, None, 3), 0);
    }

    #[test]
    fn large_gap_clamps() {
        assert_eq!(score(1, Some(16), 3), 120);
        assert_eq!(score(1, Some(16), 5), 255);
    }
}
