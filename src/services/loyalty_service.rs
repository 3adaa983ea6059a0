use crate::models::loyalty::{LoyaltyTier, TierStatus};

/// One point per this many rupiah of confirmed charge total.
pub const POINTS_PER_CURRENCY_UNIT: i64 = 10_000;

/// Ascending tier thresholds. Every non-negative balance resolves to
/// exactly one row.
const TIER_TABLE: [(LoyaltyTier, i64); 3] = [
    (LoyaltyTier::Bronze, 0),
    (LoyaltyTier::Silver, 500),
    (LoyaltyTier::Gold, 2_000),
];

pub struct LoyaltyService;

impl LoyaltyService {
    /// Points awarded for a confirmed charge total. Persisting the award
    /// (exactly once per booking) is the caller's responsibility.
    pub fn accrue(charge_total: i64) -> i64 {
        debug_assert!(charge_total >= 0);
        charge_total / POINTS_PER_CURRENCY_UNIT
    }

    /// The tier whose threshold is the largest one at or below `points`.
    pub fn tier_for(points: i64) -> LoyaltyTier {
        debug_assert!(points >= 0);

        let mut tier = TIER_TABLE[0].0;
        for (candidate, required) in TIER_TABLE {
            if points >= required {
                tier = candidate;
            }
        }
        tier
    }

    /// The next tier up and its threshold, if one exists.
    pub fn next_tier(points: i64) -> Option<(LoyaltyTier, i64)> {
        TIER_TABLE
            .iter()
            .find(|(_, required)| points < *required)
            .copied()
    }

    /// Percent progress from the current tier's threshold toward the next.
    /// 100 when the top tier is reached.
    pub fn tier_progress(points: i64) -> i64 {
        let current_floor = TIER_TABLE
            .iter()
            .rev()
            .find(|(_, required)| points >= *required)
            .map(|(_, required)| *required)
            .unwrap_or(0);

        match Self::next_tier(points) {
            None => 100,
            Some((_, next_floor)) => {
                ((points - current_floor) * 100 / (next_floor - current_floor)).clamp(0, 100)
            }
        }
    }

    pub fn tier_status(points: i64) -> TierStatus {
        TierStatus {
            points,
            tier: Self::tier_for(points),
            next_tier: Self::next_tier(points).map(|(tier, _)| tier),
            progress_percent: Self::tier_progress(points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accrual_ratio() {
        assert_eq!(LoyaltyService::accrue(2_200_000), 220);
        assert_eq!(LoyaltyService::accrue(0), 0);
        // Floor division: partial units earn nothing
        assert_eq!(LoyaltyService::accrue(9_999), 0);
        assert_eq!(LoyaltyService::accrue(19_999), 1);
    }

    #[test]
    fn test_accrual_is_deterministic() {
        assert_eq!(
            LoyaltyService::accrue(1_234_567),
            LoyaltyService::accrue(1_234_567)
        );
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(LoyaltyService::tier_for(0), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyService::tier_for(499), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyService::tier_for(500), LoyaltyTier::Silver);
        assert_eq!(LoyaltyService::tier_for(1_999), LoyaltyTier::Silver);
        assert_eq!(LoyaltyService::tier_for(2_000), LoyaltyTier::Gold);
        assert_eq!(LoyaltyService::tier_for(999_999), LoyaltyTier::Gold);
    }

    #[test]
    fn test_tier_is_total_and_monotonic() {
        let mut last = LoyaltyService::tier_for(0);
        for points in 0..5_000 {
            let tier = LoyaltyService::tier_for(points);
            assert!(tier >= last);
            last = tier;
        }
    }

    #[test]
    fn test_progress_toward_next_tier() {
        assert_eq!(LoyaltyService::tier_progress(0), 0);
        assert_eq!(LoyaltyService::tier_progress(250), 50);
        assert_eq!(LoyaltyService::tier_progress(500), 0);
        assert_eq!(LoyaltyService::tier_progress(1_250), 50);
        // Top tier reports 100, there is nothing further to climb
        assert_eq!(LoyaltyService::tier_progress(2_000), 100);
        assert_eq!(LoyaltyService::tier_progress(999_999), 100);
    }

    #[test]
    fn test_next_tier() {
        assert_eq!(
            LoyaltyService::next_tier(0),
            Some((LoyaltyTier::Silver, 500))
        );
        assert_eq!(
            LoyaltyService::next_tier(600),
            Some((LoyaltyTier::Gold, 2_000))
        );
        assert_eq!(LoyaltyService::next_tier(2_000), None);
    }

    #[test]
    fn test_tier_status_shape() {
        let status = LoyaltyService::tier_status(750);
        assert_eq!(status.points, 750);
        assert_eq!(status.tier, LoyaltyTier::Silver);
        assert_eq!(status.next_tier, Some(LoyaltyTier::Gold));
        assert_eq!(status.progress_percent, (750 - 500) * 100 / 1_500);
    }
}
