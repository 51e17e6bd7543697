//! Request bodies for the HTTP API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{
    to_money, AddGroupMember, BillingCycle, CreateGroup, CreateSubscription, UpdateSubscription,
};

fn default_true() -> bool {
    true
}

/// Largest cost a `NUMERIC(10, 2)` column holds.
fn max_cost() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

fn validate_cost(cost: &Decimal) -> Result<(), ValidationError> {
    if *cost < Decimal::ZERO {
        let mut err = ValidationError::new("cost_negative");
        err.message = Some("Cost must not be negative".into());
        return Err(err);
    }
    // Checked after rounding, 99999999.995 is stored as 100000000.00
    if to_money(*cost) > max_cost() {
        let mut err = ValidationError::new("cost_too_large");
        err.message = Some("Cost must be at most 99999999.99".into());
        return Err(err);
    }
    Ok(())
}

fn validate_split_percentage(split: &Decimal) -> Result<(), ValidationError> {
    if *split < Decimal::ZERO || *split > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("split_percentage_range");
        err.message = Some("Split percentage must be between 0 and 100".into());
        return Err(err);
    }
    Ok(())
}

fn validate_update_cost(req: &UpdateSubscriptionRequest) -> Result<(), ValidationError> {
    match &req.cost {
        Some(cost) => validate_cost(cost),
        None => Ok(()),
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    #[validate(custom(function = "validate_cost"))]
    pub cost: Decimal,
    pub billing_cycle: BillingCycle,
    pub start_date: DateTime<Utc>,
    pub trial_end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub auto_cancel: bool,
}

impl CreateSubscriptionRequest {
    pub fn into_input(self, user_id: Uuid) -> CreateSubscription {
        CreateSubscription {
            user_id,
            name: self.name.trim().to_string(),
            cost: self.cost,
            billing_cycle: self.billing_cycle,
            start_date: self.start_date,
            trial_end_date: self.trial_end_date,
            is_active: self.is_active,
            auto_cancel: self.auto_cancel,
        }
    }
}

/// Partial update. `startDate` cannot be changed after creation.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_cost"))]
pub struct UpdateSubscriptionRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    pub cost: Option<Decimal>,
    pub billing_cycle: Option<BillingCycle>,
    pub trial_end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub auto_cancel: Option<bool>,
}

impl From<UpdateSubscriptionRequest> for UpdateSubscription {
    fn from(req: UpdateSubscriptionRequest) -> Self {
        UpdateSubscription {
            name: req.name.map(|n| n.trim().to_string()),
            cost: req.cost,
            billing_cycle: req.billing_cycle,
            trial_end_date: req.trial_end_date,
            is_active: req.is_active,
            auto_cancel: req.auto_cancel,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 255, message = "Group name is required"))]
    pub name: String,
}

impl CreateGroupRequest {
    pub fn into_input(self, owner_id: Uuid) -> CreateGroup {
        CreateGroup {
            owner_id,
            name: self.name.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddGroupMemberRequest {
    #[validate(length(min = 1, max = 255, message = "Member name is required"))]
    pub member_name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_split_percentage"))]
    pub split_percentage: Decimal,
    /// Registered user behind this member, if any.
    pub user_id: Option<Uuid>,
}

impl AddGroupMemberRequest {
    pub fn into_input(self, group_id: Uuid) -> AddGroupMember {
        AddGroupMember {
            group_id,
            user_id: self.user_id,
            member_name: self.member_name.trim().to_string(),
            split_percentage: self.split_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(body: serde_json::Value) -> CreateSubscriptionRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn create_accepts_numeric_cost_and_defaults_flags() {
        let req = create(json!({
            "name": "Netflix",
            "cost": 15.99,
            "billingCycle": "monthly",
            "startDate": "2024-01-01T00:00:00Z"
        }));
        assert!(req.validate().is_ok());
        assert!(req.is_active);
        assert!(!req.auto_cancel);
        assert_eq!(req.cost, Decimal::new(1599, 2));
        assert_eq!(req.billing_cycle, BillingCycle::Monthly);
    }

    #[test]
    fn create_rejects_negative_cost_and_empty_name() {
        let req = create(json!({
            "name": "",
            "cost": "-1.00",
            "billingCycle": "yearly",
            "startDate": "2024-01-01T00:00:00Z"
        }));
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("cost"));
    }

    #[test]
    fn cost_must_fit_storage_precision() {
        let largest = create(json!({
            "name": "Enterprise Plan",
            "cost": "99999999.99",
            "billingCycle": "yearly",
            "startDate": "2024-01-01T00:00:00Z"
        }));
        assert!(largest.validate().is_ok());

        for cost in ["100000000", "1234567890.5", "99999999.995"] {
            let req = create(json!({
                "name": "Enterprise Plan",
                "cost": cost,
                "billingCycle": "yearly",
                "startDate": "2024-01-01T00:00:00Z"
            }));
            let errors = req.validate().unwrap_err();
            assert!(errors.field_errors().contains_key("cost"), "cost {}", cost);
        }

        let update = UpdateSubscriptionRequest {
            cost: Some(Decimal::new(123_456_789_050, 2)),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn unknown_billing_cycle_fails_to_parse() {
        let result: Result<CreateSubscriptionRequest, _> = serde_json::from_value(json!({
            "name": "Netflix",
            "cost": 15.99,
            "billingCycle": "weekly",
            "startDate": "2024-01-01T00:00:00Z"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn update_validates_cost_only_when_present() {
        let empty = UpdateSubscriptionRequest::default();
        assert!(empty.validate().is_ok());

        let negative = UpdateSubscriptionRequest {
            cost: Some(Decimal::new(-500, 2)),
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn member_split_must_be_a_percentage() {
        let req: AddGroupMemberRequest = serde_json::from_value(json!({
            "memberName": "John",
            "splitPercentage": 150
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: AddGroupMemberRequest =
            serde_json::from_value(json!({ "memberName": "John" })).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.split_percentage, Decimal::ZERO);
    }
}
