//! Structural payload schemas
//!
//! Two explicit schema values replace duck-typed validation: a permissive
//! schema applied to the raw payload (field values may legitimately be
//! mapping tokens) and a strict schema applied after reconciliation
//! (values must look like real, business-plausible data again).

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Shape of an engine-minted replacement token, `<TYPE_n>`
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^<[A-Za-z0-9_]+_\d+>$").expect("valid token regex"))
}

/// Whether a value looks like a mapping token
pub(crate) fn is_token_shaped(value: &str) -> bool {
    token_pattern().is_match(value)
}

/// Validation rule for one payload field
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Field name in the payload
    pub name: String,
    /// Whether the field must be present
    pub required: bool,
    /// Optional shape check, applied to non-token string values
    pub pattern: Option<Regex>,
}

impl FieldRule {
    /// A field that must be present
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            pattern: None,
        }
    }

    /// A field that may be absent
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            pattern: None,
        }
    }

    /// Attach a shape pattern for the field's value
    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }
}

/// Structural schema for an extracted payload
#[derive(Debug, Clone)]
pub struct PayloadSchema {
    rules: Vec<FieldRule>,
    allow_tokens: bool,
}

impl PayloadSchema {
    /// Permissive schema: field values may be mapping tokens
    pub fn permissive(rules: Vec<FieldRule>) -> Self {
        Self {
            rules,
            allow_tokens: true,
        }
    }

    /// Strict schema: token-shaped values are a validation failure
    pub fn strict(rules: Vec<FieldRule>) -> Self {
        Self {
            rules,
            allow_tokens: false,
        }
    }

    /// Validate a parsed payload, returning the first failure reason.
    ///
    /// Checks, per rule: presence (if required), string-ness, the token
    /// gate (strict schemas reject token-shaped values), and the shape
    /// pattern for non-token values. Fields without a rule pass
    /// untouched.
    pub fn validate(&self, payload: &Map<String, Value>) -> std::result::Result<(), String> {
        for rule in &self.rules {
            let value = match payload.get(&rule.name) {
                Some(value) => value,
                None if rule.required => {
                    return Err(format!("missing required field '{}'", rule.name));
                }
                None => continue,
            };

            let text = value
                .as_str()
                .ok_or_else(|| format!("field '{}' is not a string", rule.name))?;

            if is_token_shaped(text) {
                if !self.allow_tokens {
                    return Err(format!(
                        "field '{}' still holds unreconciled token '{text}'",
                        rule.name
                    ));
                }
                // A token's shape is checked by the mapping store, not here.
                continue;
            }

            if let Some(ref pattern) = rule.pattern {
                if !pattern.is_match(text) {
                    return Err(format!(
                        "field '{}' value does not match expected shape",
                        rule.name
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_token_shape() {
        assert!(is_token_shaped("<PERSON_0>"));
        assert!(is_token_shaped("<IT_FISCAL_CODE_12>"));
        assert!(!is_token_shaped("Mario Rossi"));
        assert!(!is_token_shaped("<PERSON_>"));
        assert!(!is_token_shaped("PERSON_0"));
    }

    #[test]
    fn test_permissive_accepts_tokens() {
        let schema = PayloadSchema::permissive(vec![
            FieldRule::required("name"),
            FieldRule::required("city"),
        ]);
        let payload = payload(json!({"name": "<PERSON_0>", "city": "Rome"}));
        assert!(schema.validate(&payload).is_ok());
    }

    #[test]
    fn test_strict_rejects_tokens() {
        let schema = PayloadSchema::strict(vec![FieldRule::required("name")]);
        let payload = payload(json!({"name": "<PERSON_0>"}));

        let reason = schema.validate(&payload).unwrap_err();
        assert!(reason.contains("unreconciled token"));
    }

    #[test]
    fn test_missing_required_field() {
        let schema = PayloadSchema::permissive(vec![FieldRule::required("name")]);
        let payload = payload(json!({"city": "Rome"}));

        let reason = schema.validate(&payload).unwrap_err();
        assert!(reason.contains("missing required field 'name'"));
    }

    #[test]
    fn test_optional_field_may_be_absent() {
        let schema = PayloadSchema::strict(vec![FieldRule::optional("phone_number")]);
        let payload = payload(json!({"name": "Mario Rossi"}));
        assert!(schema.validate(&payload).is_ok());
    }

    #[test]
    fn test_non_string_field_rejected() {
        let schema = PayloadSchema::permissive(vec![FieldRule::required("name")]);
        let payload = payload(json!({"name": 42}));
        assert!(schema.validate(&payload).is_err());
    }

    #[test]
    fn test_pattern_applies_to_plain_values() {
        let email = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
        let schema = PayloadSchema::strict(vec![FieldRule::required("email").with_pattern(email)]);

        let good = payload(json!({"email": "mariorossi@gmail.com"}));
        assert!(schema.validate(&good).is_ok());

        let bad = payload(json!({"email": "not-an-email"}));
        assert!(schema.validate(&bad).is_err());
    }

    #[test]
    fn test_pattern_skipped_for_tokens_in_permissive() {
        let email = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
        let schema =
            PayloadSchema::permissive(vec![FieldRule::required("email").with_pattern(email)]);

        let payload = payload(json!({"email": "<EMAIL_ADDRESS_0>"}));
        assert!(schema.validate(&payload).is_ok());
    }
}
