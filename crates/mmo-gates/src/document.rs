//! Shared reading of YAML/JSON policy documents into a `serde_json::Value` tree.
//!
//! Both the policy loader and the profile resolver validate field-by-field on
//! the value tree so errors can name the exact gate or profile and field.

use std::path::Path;

use serde_json::{Map, Value};

/// Failure to read or parse a document, before any schema validation.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Parse(String),
}

/// Read a document from disk. `.json` files are parsed as JSON, everything
/// else as YAML.
pub fn read_document(path: &Path) -> Result<Value, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|_| DocumentError::NotFound)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    parse_document(&content, is_json)
}

/// Parse document text.
pub fn parse_document(content: &str, is_json: bool) -> Result<Value, DocumentError> {
    if is_json {
        serde_json::from_str(content).map_err(|e| DocumentError::Parse(e.to_string()))
    } else {
        let value: Value =
            serde_yaml::from_str(content).map_err(|e| DocumentError::Parse(e.to_string()))?;
        Ok(value)
    }
}

/// Human-readable name of a JSON value's type, for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// Read the document's `schema_version` as a string. Numeric versions such as
/// `0.1` in YAML are accepted and rendered back to text.
pub fn schema_version(root: &Map<String, Value>) -> Option<String> {
    match root.get("schema_version")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether a schema version belongs to a supported major line.
pub fn schema_supported(version: &str, supported_major: &str) -> bool {
    version.split('.').next() == Some(supported_major)
}

/// Parse a finite number. Only JSON numbers qualify; strings are not coerced
/// in documents.
pub fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_and_json_agree() {
        let yaml = parse_document("schema_version: \"0.1.0\"\ngates: []\n", false).unwrap();
        let json = parse_document(r#"{"schema_version": "0.1.0", "gates": []}"#, true).unwrap();
        assert_eq!(yaml, json);
    }

    #[test]
    fn test_numeric_schema_version() {
        let doc = parse_document("schema_version: 0.1\n", false).unwrap();
        let version = schema_version(doc.as_object().unwrap()).unwrap();
        assert_eq!(version, "0.1");
        assert!(schema_supported(&version, "0"));
        assert!(!schema_supported("1.0.0", "0"));
    }

    #[test]
    fn test_finite_number_rejects_strings() {
        assert_eq!(finite_number(&Value::from(3.0)), Some(3.0));
        assert_eq!(finite_number(&Value::from(2)), Some(2.0));
        assert_eq!(finite_number(&Value::from("3.0")), None);
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            parse_document("gates: [unclosed", false),
            Err(DocumentError::Parse(_))
        ));
    }
}
