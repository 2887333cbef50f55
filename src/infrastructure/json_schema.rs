use crate::domain::ports::EventValidator;
use crate::error::{PipelineError, Result};
use serde_json::Value;

/// Schema every `transaction.created` v1 event must satisfy.
pub const TRANSACTION_CREATED_V1: &str =
    include_str!("../../schemas/v1/transaction_created.v1.json");

/// Validates event documents against a JSON Schema compiled once at construction.
pub struct JsonSchemaValidator {
    validator: jsonschema::Validator,
}

impl JsonSchemaValidator {
    pub fn transaction_created_v1() -> Result<Self> {
        let schema: Value = serde_json::from_str(TRANSACTION_CREATED_V1)?;
        Self::from_schema(&schema)
    }

    pub fn from_schema(schema: &Value) -> Result<Self> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| PipelineError::ConfigError(format!("compile schema: {}", e)))?;
        Ok(Self { validator })
    }
}

impl EventValidator for JsonSchemaValidator {
    fn validate(&self, document: &Value) -> Result<()> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(document)
            .map(|e| e.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::ValidationError(errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::TransactionEvent;
    use crate::domain::transaction::Transaction;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use uuid::Uuid;

    fn valid_document() -> Value {
        let tx = Transaction::queued(
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec!(19.99),
            Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap(),
        );
        TransactionEvent::created(&tx).to_document().unwrap()
    }

    #[test]
    fn test_built_event_passes_v1_schema() {
        let validator = JsonSchemaValidator::transaction_created_v1().unwrap();
        assert!(validator.validate(&valid_document()).is_ok());
    }

    #[test]
    fn test_wrong_version_rejected() {
        let validator = JsonSchemaValidator::transaction_created_v1().unwrap();
        let mut doc = valid_document();
        doc["version"] = json!(2);

        let err = validator.validate(&doc).unwrap_err();
        assert!(matches!(err, PipelineError::ValidationError(_)));
    }

    #[test]
    fn test_missing_field_and_extra_field_rejected() {
        let validator = JsonSchemaValidator::transaction_created_v1().unwrap();

        let mut missing = valid_document();
        missing.as_object_mut().unwrap().remove("amount");
        assert!(validator.validate(&missing).is_err());

        let mut extra = valid_document();
        extra["note"] = json!("unexpected");
        assert!(validator.validate(&extra).is_err());
    }

    #[test]
    fn test_amount_as_string_rejected() {
        let validator = JsonSchemaValidator::transaction_created_v1().unwrap();
        let mut doc = valid_document();
        doc["amount"] = json!("19.99");
        assert!(validator.validate(&doc).is_err());
    }

    #[test]
    fn test_invalid_schema_fails_construction() {
        let result = JsonSchemaValidator::from_schema(&json!({"type": 12}));
        assert!(matches!(result, Err(PipelineError::ConfigError(_))));
    }
}
