use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ApiError;

/// RuleKind
///
/// The shape checks a field rule can express. Kept deliberately small: the
/// request surface only ever constrains string lengths and document ids.
#[derive(Debug, Clone, Copy)]
pub enum RuleKind {
    /// The value must be a string whose character count lies in `min..=max`.
    Length { min: usize, max: usize },
    /// The value must be a canonical 24-hex-character document id.
    ObjectId,
}

/// Rule
///
/// One declarative per-field rule. Route handlers declare an ordered list of
/// these; the order of declaration is the order violations are reported in.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub field: &'static str,
    pub kind: RuleKind,
    pub required: bool,
}

impl Rule {
    pub const fn required(field: &'static str, kind: RuleKind) -> Self {
        Self {
            field,
            kind,
            required: true,
        }
    }

    pub const fn optional(field: &'static str, kind: RuleKind) -> Self {
        Self {
            field,
            kind,
            required: false,
        }
    }
}

/// FieldError
///
/// A single reported violation: which field, why, and the offending value as
/// it appeared in the request (`null` when the field was absent).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[ts(type = "unknown")]
    pub value: Value,
}

/// check
///
/// Evaluates every rule in `rules` against the JSON `body`, collecting ALL
/// violations (not just the first) in declaration order. A rule whose target
/// value is absent only violates if the rule is required.
pub fn check(rules: &[Rule], body: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for rule in rules {
        let value = body.get(rule.field);

        let Some(value) = value.filter(|v| !v.is_null()) else {
            if rule.required {
                errors.push(FieldError {
                    field: rule.field.to_string(),
                    message: "is required".to_string(),
                    value: Value::Null,
                });
            }
            continue;
        };

        if let Some(message) = violation(rule.kind, value) {
            errors.push(FieldError {
                field: rule.field.to_string(),
                message,
                value: value.clone(),
            });
        }
    }

    errors
}

/// body
///
/// The short-circuiting form used by handlers: zero violations lets the
/// request proceed unmodified, any violation yields the uniform 400 envelope
/// and downstream logic is never invoked.
pub fn body(rules: &[Rule], body: &Value) -> Result<(), ApiError> {
    let errors = check(rules, body);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// path_id
///
/// Validates a path parameter against the canonical document id shape, using
/// the same error envelope as body validation.
pub fn path_id(name: &'static str, value: &str) -> Result<(), ApiError> {
    if is_object_id(value) {
        Ok(())
    } else {
        Err(ApiError::Validation(vec![FieldError {
            field: name.to_string(),
            message: "must be a valid 24 character hex id".to_string(),
            value: Value::String(value.to_string()),
        }]))
    }
}

/// is_object_id
///
/// The document store's canonical id shape: exactly 24 hex characters.
pub fn is_object_id(value: &str) -> bool {
    value.len() == 24 && value.chars().all(|c| c.is_ascii_hexdigit())
}

fn violation(kind: RuleKind, value: &Value) -> Option<String> {
    match kind {
        RuleKind::Length { min, max } => match value.as_str() {
            Some(s) if (min..=max).contains(&s.chars().count()) => None,
            _ => Some(format!("must be between {min} and {max} characters")),
        },
        RuleKind::ObjectId => match value.as_str() {
            Some(s) if is_object_id(s) => None,
            _ => Some("must be a valid 24 character hex id".to_string()),
        },
    }
}

// --- Per-route rule lists ---
// Declaration order is contract-relevant: violations are reported in this order.

pub const LOGIN_RULES: &[Rule] = &[
    Rule::required("email", RuleKind::Length { min: 3, max: 100 }),
    Rule::required("password", RuleKind::Length { min: 6, max: 100 }),
];

pub const USER_CREATE_RULES: &[Rule] = &[
    Rule::required("name", RuleKind::Length { min: 2, max: 50 }),
    Rule::required("email", RuleKind::Length { min: 3, max: 100 }),
    Rule::required("password", RuleKind::Length { min: 6, max: 100 }),
];

pub const USER_UPDATE_RULES: &[Rule] = &[
    Rule::optional("name", RuleKind::Length { min: 2, max: 50 }),
    Rule::optional("email", RuleKind::Length { min: 3, max: 100 }),
    Rule::optional("password", RuleKind::Length { min: 6, max: 100 }),
];

pub const POST_CREATE_RULES: &[Rule] = &[
    Rule::required("title", RuleKind::Length { min: 3, max: 120 }),
    Rule::required("content", RuleKind::Length { min: 1, max: 10_000 }),
    Rule::required("author", RuleKind::ObjectId),
    Rule::required("genre", RuleKind::Length { min: 2, max: 40 }),
];

pub const POST_UPDATE_RULES: &[Rule] = &[
    Rule::optional("title", RuleKind::Length { min: 3, max: 120 }),
    Rule::optional("content", RuleKind::Length { min: 1, max: 10_000 }),
    Rule::optional("genre", RuleKind::Length { min: 2, max: 40 }),
];

pub const COMMENT_CREATE_RULES: &[Rule] = &[
    Rule::required("content", RuleKind::Length { min: 1, max: 500 }),
    Rule::required("author", RuleKind::ObjectId),
    Rule::required("post", RuleKind::ObjectId),
];

pub const COMMENT_UPDATE_RULES: &[Rule] = &[Rule::optional(
    "content",
    RuleKind::Length { min: 1, max: 500 },
)];
