use serde::{Deserialize, Serialize};

use crate::domain::value_objects::enums::plan_tiers::PlanTier;

const BPS_PER_UNIT: i64 = 10_000;

/// Platform commission expressed in basis points (1000 bps = 10%).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CommissionRate(i32);

impl CommissionRate {
    pub const fn from_bps(bps: i32) -> Self {
        Self(bps)
    }

    pub fn bps(&self) -> i32 {
        self.0
    }

    /// `round(amount × rate)` in minor units, halves rounded up.
    pub fn fee_for(&self, amount_minor: i64) -> i64 {
        let scaled = amount_minor * i64::from(self.0);
        if scaled >= 0 {
            (scaled + BPS_PER_UNIT / 2) / BPS_PER_UNIT
        } else {
            (scaled - BPS_PER_UNIT / 2) / BPS_PER_UNIT
        }
    }
}

/// The only place commission rates are defined.
pub fn rate_for(plan: PlanTier) -> CommissionRate {
    match plan {
        PlanTier::Free => CommissionRate::from_bps(1_000),
        PlanTier::Mid => CommissionRate::from_bps(800),
        PlanTier::Pro => CommissionRate::from_bps(500),
    }
}
