//! XP ↔ level curve.
//!
//! Levels follow an inverse-square-root curve: `level = floor(0.1 * sqrt(xp))`,
//! equivalently `xp_for_level(n) = (10n)^2`. Every component that needs level
//! math goes through these functions; nothing else in the workspace computes
//! levels independently.

use serde::{Deserialize, Serialize};

/// Level derived from total XP. Negative XP is clamped to zero.
pub fn level_from_xp(xp: i64) -> i32 {
    (0.1 * (xp.max(0) as f64).sqrt()).floor() as i32
}

/// Total XP required to reach a level. Exact: `(10 * level)^2`.
pub fn xp_for_level(level: i32) -> i64 {
    let l = level.max(0) as i64;
    (10 * l) * (10 * l)
}

/// Additional XP needed from `current_xp` to reach `target_level`.
///
/// Returns zero when the target is already reached.
pub fn xp_needed_for_level(current_xp: i64, target_level: i32) -> i64 {
    (xp_for_level(target_level) - current_xp.max(0)).max(0)
}

/// Progress within the current level band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Level derived from the XP value
    pub current_level: i32,
    /// XP floor of the current level
    pub xp_for_current_level: i64,
    /// XP floor of the next level
    pub xp_for_next_level: i64,
    /// XP accumulated past the current level floor
    pub progress_xp: i64,
    /// XP between the current and next level floors
    pub needed_xp: i64,
    /// Percentage through the band, clamped to [0, 100]
    pub progress_percentage: f64,
}

/// Compute progress within the level band containing `xp`.
pub fn level_progress(xp: i64) -> LevelProgress {
    let xp = xp.max(0);
    let current_level = level_from_xp(xp);
    let xp_for_current_level = xp_for_level(current_level);
    let xp_for_next_level = xp_for_level(current_level + 1);
    let progress_xp = xp - xp_for_current_level;
    let needed_xp = xp_for_next_level - xp_for_current_level;
    let progress_percentage = if needed_xp > 0 {
        (progress_xp as f64 / needed_xp as f64 * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    LevelProgress {
        current_level,
        xp_for_current_level,
        xp_for_next_level,
        progress_xp,
        needed_xp,
        progress_percentage,
    }
}

/// Result of comparing levels before and after an XP change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUpCheck {
    /// Whether at least one level boundary was crossed upward
    pub leveled_up: bool,
    /// Level at the old XP value
    pub old_level: i32,
    /// Level at the new XP value
    pub new_level: i32,
    /// Number of levels crossed (zero when none)
    pub levels_gained: i32,
}

/// Compare the levels implied by two XP values.
///
/// A single award can cross several boundaries at once; `levels_gained`
/// reports the full span so callers can grant every intermediate reward.
pub fn check_level_up(old_xp: i64, new_xp: i64) -> LevelUpCheck {
    let old_level = level_from_xp(old_xp);
    let new_level = level_from_xp(new_xp);
    LevelUpCheck {
        leveled_up: new_level > old_level,
        old_level,
        new_level,
        levels_gained: (new_level - old_level).max(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_xp_curve_points() {
        assert_eq!(level_from_xp(0), 0);
        assert_eq!(level_from_xp(20), 0);
        assert_eq!(level_from_xp(99), 0);
        assert_eq!(level_from_xp(100), 1);
        assert_eq!(level_from_xp(9999), 9);
        assert_eq!(level_from_xp(10499), 10);
        assert_eq!(level_from_xp(1_000_000), 100);
    }

    #[test]
    fn test_negative_xp_clamped() {
        assert_eq!(level_from_xp(-50), 0);
        assert_eq!(xp_for_level(-3), 0);
        assert_eq!(xp_needed_for_level(-10, 1), 100);
    }

    #[test]
    fn test_round_trip() {
        for level in 0..=250 {
            assert_eq!(level_from_xp(xp_for_level(level)), level);
        }
    }

    #[test]
    fn test_monotonic() {
        let mut prev = 0;
        for xp in (0..200_000).step_by(137) {
            let level = level_from_xp(xp);
            assert!(level >= prev, "level regressed at xp={}", xp);
            // The floor of the derived level never exceeds the xp itself.
            assert!(xp_for_level(level) <= xp);
            prev = level;
        }
    }

    #[test]
    fn test_level_progress_band() {
        let progress = level_progress(150);
        assert_eq!(progress.current_level, 1);
        assert_eq!(progress.xp_for_current_level, 100);
        assert_eq!(progress.xp_for_next_level, 400);
        assert_eq!(progress.progress_xp, 50);
        assert_eq!(progress.needed_xp, 300);
        assert!((progress.progress_percentage - 50.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_xp_needed_already_reached() {
        assert_eq!(xp_needed_for_level(500, 2), 0);
        assert_eq!(xp_needed_for_level(399, 2), 1);
    }

    #[test]
    fn test_multi_level_jump() {
        let check = check_level_up(0, 2500);
        assert!(check.leveled_up);
        assert_eq!(check.old_level, 0);
        assert_eq!(check.new_level, 5);
        assert_eq!(check.levels_gained, 5);
    }

    #[test]
    fn test_single_level_crossing() {
        let check = check_level_up(9999, 10499);
        assert!(check.leveled_up);
        assert_eq!(check.old_level, 9);
        assert_eq!(check.new_level, 10);
        assert_eq!(check.levels_gained, 1);
    }

    #[test]
    fn test_no_level_up_within_band() {
        let check = check_level_up(0, 20);
        assert!(!check.leveled_up);
        assert_eq!(check.levels_gained, 0);
    }
}
