use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{wire, wire_enum, Entity};
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

wire_enum!(TransactionType {
    Income => "income",
    Expense => "expense",
    Transfer => "transfer",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub account_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(deserialize_with = "wire::decimal")]
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub transaction_date: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,

    // Joined by the server for list and recent views
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_color: Option<String>,
    #[serde(default)]
    pub category_icon: Option<String>,
}

impl Entity for Transaction {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    pub transaction_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TransactionInput {
    /// Local checks that save a round trip; the server still has the final word
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.amount <= Decimal::ZERO {
            return Err(ClientError::invalid_field("amount", "Amount must be greater than zero"));
        }
        if self.account_id.trim().is_empty() {
            return Err(ClientError::invalid_field("account_id", "Account is required"));
        }
        if self.transaction_date.trim().is_empty() {
            return Err(ClientError::invalid_field("transaction_date", "Date is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TransactionUpdate {
    pub fn validate(&self) -> Result<(), ClientError> {
        match self.amount {
            Some(amount) if amount <= Decimal::ZERO => {
                Err(ClientError::invalid_field("amount", "Amount must be greater than zero"))
            }
            _ => Ok(()),
        }
    }
}

/// Query filters for `GET /transactions`. Each distinct filter set is its own
/// cache entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionFilters {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub account_id: Option<String>,
    pub category_id: Option<String>,
    pub kind: Option<TransactionType>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TransactionFilters {
    /// Query parameters in the order and spelling the API expects
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                params.push((key.to_string(), value));
            }
        };

        push("startDate", self.start_date.clone());
        push("endDate", self.end_date.clone());
        push("accountId", self.account_id.clone());
        push("categoryId", self.category_id.clone());
        push("type", self.kind.map(|k| k.as_str().to_string()));
        push("page", self.page.filter(|p| *p > 0).map(|p| p.to_string()));
        push("limit", self.limit.filter(|l| *l > 0).map(|l| l.to_string()));

        params
    }

    /// Stable cache scope for this filter set
    pub fn cache_scope(&self) -> String {
        self.to_query()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Pagination block of the envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: Option<PageMeta>,
}

impl<T> Page<T> {
    pub fn total(&self) -> u64 {
        self.meta
            .as_ref()
            .and_then(|m| m.total)
            .unwrap_or(self.items.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_skip_empty_values() {
        let filters = TransactionFilters {
            start_date: Some("2024-01-01".into()),
            account_id: Some(String::new()),
            kind: Some(TransactionType::Expense),
            page: Some(2),
            limit: Some(0),
            ..TransactionFilters::default()
        };
        assert_eq!(
            filters.to_query(),
            vec![
                ("startDate".to_string(), "2024-01-01".to_string()),
                ("type".to_string(), "expense".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(filters.cache_scope(), "startDate=2024-01-01&type=expense&page=2");
    }

    #[test]
    fn test_no_filters_share_the_empty_scope() {
        assert_eq!(TransactionFilters::default().cache_scope(), "");
    }

    #[test]
    fn test_input_rejects_non_positive_amount() {
        let input = TransactionInput {
            account_id: "acc-1".into(),
            category_id: None,
            kind: TransactionType::Expense,
            amount: Decimal::ZERO,
            description: "lunch".into(),
            transaction_date: "2024-01-01".into(),
            notes: None,
        };
        let err = input.validate().unwrap_err();
        assert_eq!(err.field_errors()[0].field, "amount");
    }

    #[test]
    fn test_page_meta_reads_camel_case() {
        let meta: PageMeta =
            serde_json::from_str(r#"{"page":1,"limit":20,"total":42,"totalPages":3}"#).unwrap();
        assert_eq!(meta.total_pages, Some(3));
        let page = Page::<u8> { items: vec![], meta: Some(meta) };
        assert_eq!(page.total(), 42);
    }
}
