use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::error;

use crate::database::models::{Category, TransactionType};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::handlers::utils::FieldErrors;
use crate::state::AppState;

/// Body of create and update requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub transaction_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub transaction_date: Option<NaiveDate>,
}

impl TransactionPayload {
    /// Checks the body and returns the parsed transaction type.
    pub fn validate(&self) -> Result<TransactionType, ApiError> {
        let mut errors = FieldErrors::new();
        if self.amount <= Decimal::ZERO {
            errors.add("amount", "amount must be greater than 0");
        }
        let transaction_type = self.transaction_type.parse::<TransactionType>();
        if let Err(msg) = &transaction_type {
            errors.add("transactionType", msg.clone());
        }
        if self.category_name.trim().is_empty() {
            errors.add("categoryName", "categoryName is required");
        }
        errors.into_result()?;

        transaction_type.map_err(ApiError::bad_request)
    }
}

/// Resolves a category by its case-insensitive name.
pub async fn resolve_category(state: &AppState, name: &str) -> Result<Category, ApiError> {
    match state.store.categories.get_by_name(&name.trim().to_lowercase()).await {
        Ok(category) => Ok(category),
        Err(StoreError::NotFound) => Err(ApiError::bad_request("category not found")),
        Err(e) => {
            error!(category = name, error = %e, "failed to load category");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn payload(amount: &str, kind: &str, category: &str) -> TransactionPayload {
        TransactionPayload {
            amount: dec(amount),
            transaction_type: kind.to_string(),
            description: String::new(),
            category_name: category.to_string(),
            transaction_date: None,
        }
    }

    #[test]
    fn valid_payload_yields_type() {
        assert_eq!(payload("12.50", "expense", "Food").validate().unwrap(), TransactionType::Expense);
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert!(payload("0", "income", "salary").validate().is_err());
        assert!(payload("-3", "income", "salary").validate().is_err());
    }

    #[test]
    fn rejects_unknown_type_and_missing_category() {
        let err = payload("1", "transfer", "").validate().unwrap_err();
        let body = err.to_json();
        assert!(body["field_errors"]["transactionType"].is_string());
        assert!(body["field_errors"]["categoryName"].is_string());
    }

    #[test]
    fn deserializes_camel_case_body() {
        let payload: TransactionPayload = serde_json::from_str(
            r#"{"amount": 19.99, "transactionType": "expense", "categoryName": "food", "transactionDate": "2024-03-01"}"#,
        )
        .unwrap();
        assert_eq!(payload.amount, dec("19.99"));
        assert_eq!(payload.transaction_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(payload.description, "");
    }
}
