//! Field-name validation.
//!
//! The codec itself only refuses names the wire format cannot carry (NUL
//! bytes). Storage layers persisting a collectible document apply stricter
//! rules: operator-like `$` names at the top level and dotted paths are
//! ambiguous with query syntax and are rejected before encoding.

use crate::error::ValidationError;
use crate::model::{Document, Value};

/// Which rule set to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldNameRules {
    /// Rules for a document about to be stored as a top-level record.
    Storage,
    /// Only what the wire format requires.
    Embedded,
}

/// Validates every field name in `document`, recursing into nested documents
/// and arrays.
pub fn validate_field_names(document: &Document, rules: FieldNameRules) -> Result<(), ValidationError> {
    validate_level(document, rules, true)
}

fn validate_level(document: &Document, rules: FieldNameRules, top_level: bool) -> Result<(), ValidationError> {
    for (name, value) in document {
        validate_name(name, rules, top_level)?;
        validate_nested(value, rules)?;
    }
    Ok(())
}

fn validate_nested(value: &Value, rules: FieldNameRules) -> Result<(), ValidationError> {
    match value {
        Value::Document(doc) => validate_level(doc, rules, false),
        Value::Array(items) => items.iter().try_for_each(|item| validate_nested(item, rules)),
        _ => Ok(()),
    }
}

fn validate_name(name: &str, rules: FieldNameRules, top_level: bool) -> Result<(), ValidationError> {
    if name.contains('\0') {
        return Err(ValidationError::NulInFieldName {
            name: name.to_string(),
        });
    }
    if rules == FieldNameRules::Embedded {
        return Ok(());
    }
    if name.is_empty() {
        return Err(ValidationError::EmptyFieldName);
    }
    if top_level && name.starts_with('$') {
        return Err(ValidationError::DollarPrefix {
            name: name.to_string(),
        });
    }
    if name.contains('.') {
        return Err(ValidationError::DotInFieldName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_document() {
        let doc = Document::new()
            .append("_id", 1)
            .append("name", "a")
            .append("nested", Document::new().append("$ref", "x"));
        assert_eq!(validate_field_names(&doc, FieldNameRules::Storage), Ok(()));
    }

    #[test]
    fn test_dollar_prefix_only_at_top_level() {
        let doc = Document::new().append("$set", 1);
        assert_eq!(
            validate_field_names(&doc, FieldNameRules::Storage),
            Err(ValidationError::DollarPrefix {
                name: "$set".to_string()
            })
        );
        assert_eq!(validate_field_names(&doc, FieldNameRules::Embedded), Ok(()));
    }

    #[test]
    fn test_dot_rejected_at_any_depth() {
        let doc = Document::new().append(
            "list",
            vec![Value::Document(Document::new().append("a.b", 1))],
        );
        assert_eq!(
            validate_field_names(&doc, FieldNameRules::Storage),
            Err(ValidationError::DotInFieldName {
                name: "a.b".to_string()
            })
        );
    }

    #[test]
    fn test_empty_name() {
        let doc = Document::new().append("", 1);
        assert_eq!(
            validate_field_names(&doc, FieldNameRules::Storage),
            Err(ValidationError::EmptyFieldName)
        );
        assert_eq!(validate_field_names(&doc, FieldNameRules::Embedded), Ok(()));
    }

    #[test]
    fn test_nul_rejected_under_both_rules() {
        let doc = Document::new().append("d", Document::new().append("a\0", 1));
        for rules in [FieldNameRules::Storage, FieldNameRules::Embedded] {
            assert!(matches!(
                validate_field_names(&doc, rules),
                Err(ValidationError::NulInFieldName { .. })
            ));
        }
    }
}
