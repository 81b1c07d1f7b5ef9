use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::wire;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(deserialize_with = "wire::decimal")]
    pub total_balance: Decimal,
    #[serde(deserialize_with = "wire::decimal")]
    pub total_income: Decimal,
    #[serde(deserialize_with = "wire::decimal")]
    pub total_expense: Decimal,
    #[serde(deserialize_with = "wire::decimal")]
    pub net_savings: Decimal,
    #[serde(default, deserialize_with = "wire::optional_decimal")]
    pub monthly_change: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyData {
    pub month: String,
    #[serde(deserialize_with = "wire::decimal")]
    pub income: Decimal,
    #[serde(deserialize_with = "wire::decimal")]
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    #[serde(default)]
    pub category_id: Option<String>,
    pub category_name: String,
    #[serde(default)]
    pub category_color: Option<String>,
    #[serde(deserialize_with = "wire::decimal")]
    pub total: Decimal,
    #[serde(deserialize_with = "wire::decimal")]
    pub percentage: Decimal,
}
