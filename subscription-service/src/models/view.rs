//! Derived, per-request views. Never persisted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Subscription;

/// Value tier of a subscription for the current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueScore {
    Good,
    Average,
    Waste,
}

impl ValueScore {
    /// Tier for a period usage count. Zero is checked first.
    pub fn from_usage_count(usage_count: i64) -> Self {
        if usage_count == 0 {
            ValueScore::Waste
        } else if usage_count > 10 {
            ValueScore::Good
        } else {
            ValueScore::Average
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueScore::Good => "Good",
            ValueScore::Average => "Average",
            ValueScore::Waste => "Waste",
        }
    }
}

/// Subscription extended with its scored fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub usage_count: i64,
    pub cost_per_use: String,
    pub value_score: ValueScore,
    pub days_until_renewal: i64,
}

/// Portfolio totals for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Sum of active costs, not normalised by billing cycle.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_monthly_spend: Decimal,
    pub active_count: i64,
    pub cancelled_count: i64,
    pub waste_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_usage_is_waste() {
        assert_eq!(ValueScore::from_usage_count(0), ValueScore::Waste);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(ValueScore::from_usage_count(1), ValueScore::Average);
        assert_eq!(ValueScore::from_usage_count(10), ValueScore::Average);
        assert_eq!(ValueScore::from_usage_count(11), ValueScore::Good);
        assert_eq!(ValueScore::from_usage_count(500), ValueScore::Good);
    }

    #[test]
    fn value_score_serializes_capitalised() {
        let json = serde_json::to_string(&ValueScore::Waste).unwrap();
        assert_eq!(json, "\"Waste\"");
    }

    #[test]
    fn dashboard_spend_is_a_json_number() {
        let stats = DashboardStats {
            total_monthly_spend: Decimal::new(12098, 2),
            active_count: 3,
            cancelled_count: 1,
            waste_count: 1,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalMonthlySpend"], serde_json::json!(120.98));
        assert_eq!(json["activeCount"], 3);
        assert_eq!(json["cancelledCount"], 1);
        assert_eq!(json["wasteCount"], 1);
    }
}
