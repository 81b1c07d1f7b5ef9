use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{wire, wire_enum, Entity};
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Yearly,
}

wire_enum!(BudgetPeriod {
    Weekly => "weekly",
    Monthly => "monthly",
    Yearly => "yearly",
});

pub const DEFAULT_ALERT_THRESHOLD: u8 = 80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub category_id: String,
    #[serde(deserialize_with = "wire::decimal")]
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default = "default_threshold")]
    pub alert_threshold: u8,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_color: Option<String>,

    // Computed server-side, read-only
    #[serde(default, deserialize_with = "wire::optional_decimal")]
    pub spent: Option<Decimal>,
    #[serde(default, deserialize_with = "wire::optional_decimal")]
    pub remaining: Option<Decimal>,
    #[serde(default, deserialize_with = "wire::optional_decimal")]
    pub percentage_used: Option<Decimal>,
}

fn default_threshold() -> u8 {
    DEFAULT_ALERT_THRESHOLD
}

impl Budget {
    /// Whether spending has crossed the alert threshold
    pub fn is_alerting(&self) -> bool {
        self.percentage_used
            .map(|used| used >= Decimal::from(self.alert_threshold))
            .unwrap_or(false)
    }
}

impl Entity for Budget {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetInput {
    pub category_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_threshold: Option<u8>,
}

/// Update payload. There is deliberately no `category_id`: a budget's
/// category is fixed at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetUpdate {
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<BudgetPeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_threshold: Option<u8>,
}

/// Budget editor state, shared by the create and edit flows
#[derive(Debug, Clone)]
pub struct BudgetForm {
    pub category_id: String,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: String,
    pub end_date: Option<String>,
    pub alert_threshold: u8,
}

impl BudgetForm {
    pub fn from_budget(budget: &Budget) -> Self {
        Self {
            category_id: budget.category_id.clone(),
            amount: budget.amount,
            period: budget.period,
            start_date: budget.start_date.clone(),
            end_date: budget.end_date.clone(),
            alert_threshold: budget.alert_threshold,
        }
    }

    fn validate(&self) -> Result<(), ClientError> {
        if self.amount <= Decimal::ZERO {
            return Err(ClientError::invalid_field("amount", "Amount must be greater than zero"));
        }
        if self.alert_threshold > 100 {
            return Err(ClientError::invalid_field(
                "alert_threshold",
                "Alert threshold must be between 0 and 100",
            ));
        }
        if self.start_date.trim().is_empty() {
            return Err(ClientError::invalid_field("start_date", "Start date is required"));
        }
        Ok(())
    }

    pub fn into_create(self) -> Result<BudgetInput, ClientError> {
        self.validate()?;
        if self.category_id.trim().is_empty() {
            return Err(ClientError::invalid_field("category_id", "Category is required"));
        }
        Ok(BudgetInput {
            category_id: self.category_id,
            amount: self.amount,
            period: self.period,
            start_date: self.start_date,
            end_date: self.end_date.filter(|d| !d.trim().is_empty()),
            alert_threshold: Some(self.alert_threshold),
        })
    }

    /// Edit payload; whatever `category_id` the form holds is dropped
    pub fn into_update(self) -> Result<BudgetUpdate, ClientError> {
        self.validate()?;
        Ok(BudgetUpdate {
            amount: Some(self.amount),
            period: Some(self.period),
            start_date: Some(self.start_date),
            end_date: self.end_date.filter(|d| !d.trim().is_empty()),
            alert_threshold: Some(self.alert_threshold),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> BudgetForm {
        BudgetForm {
            category_id: "cat-food".into(),
            amount: Decimal::from(500),
            period: BudgetPeriod::Monthly,
            start_date: "2024-01-01".into(),
            end_date: None,
            alert_threshold: 80,
        }
    }

    #[test]
    fn test_update_payload_never_carries_category() {
        let body = serde_json::to_value(form().into_update().unwrap()).unwrap();
        assert!(body.get("category_id").is_none());
        assert_eq!(body["amount"], json!(500.0));
        assert_eq!(body["period"], "monthly");
    }

    #[test]
    fn test_create_payload_keeps_category() {
        let body = serde_json::to_value(form().into_create().unwrap()).unwrap();
        assert_eq!(body["category_id"], "cat-food");
        assert_eq!(body["alert_threshold"], 80);
    }

    #[test]
    fn test_threshold_bounds() {
        let mut bad = form();
        bad.alert_threshold = 101;
        assert!(bad.into_update().is_err());
    }

    #[test]
    fn test_computed_fields_decode_from_strings() {
        let budget: Budget = serde_json::from_value(json!({
            "id": "b-1",
            "category_id": "cat-food",
            "amount": "500.00",
            "period": "monthly",
            "start_date": "2024-01-01",
            "alert_threshold": 80,
            "spent": "450.00",
            "remaining": 50,
            "percentage_used": "90.00"
        }))
        .unwrap();
        assert_eq!(budget.spent, Some(Decimal::from(450)));
        assert_eq!(budget.remaining, Some(Decimal::from(50)));
        assert!(budget.is_alerting());
    }
}
