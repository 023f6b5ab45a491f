//! Compilation of caller filters into the connection filter grammar.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::configuration::FilterOperators;
use crate::diagnostics::Diagnostic;
use crate::diagnostics::Diagnostics;
use crate::error::SynthesisError;
use crate::introspection::Field;
use crate::introspection::NamedType;
use crate::introspection::TypeKind;

/// A normalized filter leaf. `key` names the server side field when it differs from the filter
/// key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub operator: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterCompiler<'a> {
    operators: &'a FilterOperators,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(operators: &'a FilterOperators) -> Self {
        Self { operators }
    }

    /// Compiles `filter` against the fields of `resource_type` into `{and: [clause, …]}`.
    ///
    /// Keys naming no field and keys without a value are dropped and reported. Returns `None`
    /// when no clause remains. The condition key is left for the caller.
    pub fn compile(
        &self,
        filter: &Map<String, Value>,
        resource_type: &NamedType,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Value>, SynthesisError> {
        let mut clauses = Vec::new();
        for (key, value) in filter {
            if *key == self.operators.condition_key {
                continue;
            }
            let Some(field) = resource_type.field(key) else {
                diagnostics.push(Diagnostic::UnknownFilterKey {
                    type_name: resource_type.name.clone(),
                    key: key.clone(),
                });
                continue;
            };
            let Some(spec) = self.normalize(field, value)? else {
                diagnostics.push(Diagnostic::ClearedFilterKey { key: key.clone() });
                continue;
            };
            let target = spec.key.unwrap_or_else(|| key.clone());
            let mut operation = Map::new();
            operation.insert(spec.operator, spec.value);
            let mut clause = Map::new();
            clause.insert(target, Value::Object(operation));
            clauses.push(Value::Object(clause));
        }
        if clauses.is_empty() {
            Ok(None)
        } else {
            Ok(Some(json!({ "and": clauses })))
        }
    }

    /// Normalizes the filter value given for `field`. `None` means the key was cleared.
    pub fn normalize(&self, field: &Field, value: &Value) -> Result<Option<FilterSpec>, SynthesisError> {
        let operators = self.operators;
        let spec = match value {
            Value::Null => return Ok(None),
            Value::Array(_) => FilterSpec {
                operator: operators.list_operator.clone(),
                value: value.clone(),
                key: None,
            },
            Value::Object(object) => {
                let malformed = || SynthesisError::MalformedFilterSpec {
                    field: field.name.clone(),
                };
                let operator = object
                    .get("operator")
                    .and_then(Value::as_str)
                    .ok_or_else(malformed)?;
                let value = object.get("value").ok_or_else(malformed)?;
                if value.is_null() {
                    return Ok(None);
                }
                let key = match object.get("key") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(key)) => Some(key.clone()),
                    Some(_) => return Err(malformed()),
                };
                FilterSpec {
                    operator: operator.to_string(),
                    value: value.clone(),
                    key,
                }
            }
            _ => self.default_spec(field, value)?,
        };
        Ok(Some(spec))
    }

    fn default_spec(&self, field: &Field, value: &Value) -> Result<FilterSpec, SynthesisError> {
        let operators = self.operators;
        let base = field.ty.base();
        let type_name = base.name.as_deref().unwrap_or_default();
        if !base.kind.is_leaf() {
            return Err(SynthesisError::UnsupportedFilterScalar {
                field: field.name.clone(),
                type_name: type_name.to_string(),
            });
        }
        let is = |scalars: &[String]| {
            base.kind == TypeKind::Scalar && scalars.iter().any(|scalar| scalar == type_name)
        };
        let (operator, value) = if is(&operators.string_scalars) {
            (&operators.string_operator, value.clone())
        } else if is(&operators.full_text_scalars) {
            let text = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (
                &operators.full_text_operator,
                Value::String(format!("{text}{}", operators.full_text_wildcard)),
            )
        } else {
            (&operators.equality_operator, value.clone())
        };
        Ok(FilterSpec {
            operator: operator.clone(),
            value,
            key: None,
        })
    }
}
