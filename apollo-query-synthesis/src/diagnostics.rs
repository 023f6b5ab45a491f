//! Items left out of a generated request.
//!
//! Dropping is never an error: unknown filter keys, fields that cannot be queried safely and
//! unsupported arguments are omitted and the build carries on. Each omission is recorded here so
//! callers and tooling can see what was left out.

use std::fmt;

use serde::Serialize;

/// Why an item was left out of a generated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Diagnostic {
    /// A filter key that names no field of the resource type.
    UnknownFilterKey { type_name: String, key: String },
    /// A filter key whose value was cleared.
    ClearedFilterKey { key: String },
    /// A field with required arguments on a type without configuration.
    UnconfiguredArgumentedField { type_name: String, field: String },
    /// A field with required arguments for which no arguments were synthesized.
    MissingFieldArguments { type_name: String, field: String },
    /// A field whose configuration hides it for the verb being built.
    HiddenField { type_name: String, field: String },
    /// A composite field whose type is not configured for expansion.
    UnexpandedField {
        type_name: String,
        field: String,
        field_type: String,
    },
    /// A composite field whose type already appears on the current selection path.
    RecursiveField {
        type_name: String,
        field: String,
        field_type: String,
    },
    /// An expanded field whose type has no selectable fields.
    EmptySelection {
        type_name: String,
        field: String,
        field_type: String,
    },
    /// A list argument the root operation does not declare.
    UnsupportedArgument { operation: String, argument: String },
    /// A sort key missing from the ordering enum.
    UnknownSortKey { operation: String, key: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownFilterKey { type_name, key } => {
                write!(f, "filter key `{key}` is not a field of `{type_name}`")
            }
            Diagnostic::ClearedFilterKey { key } => {
                write!(f, "filter key `{key}` has no value")
            }
            Diagnostic::UnconfiguredArgumentedField { type_name, field } => write!(
                f,
                "`{type_name}.{field}` requires arguments and `{type_name}` has no configuration"
            ),
            Diagnostic::MissingFieldArguments { type_name, field } => write!(
                f,
                "no arguments were computed for `{type_name}.{field}` which requires them"
            ),
            Diagnostic::HiddenField { type_name, field } => {
                write!(f, "`{type_name}.{field}` is hidden by configuration")
            }
            Diagnostic::UnexpandedField {
                type_name,
                field,
                field_type,
            } => write!(
                f,
                "`{type_name}.{field}` is of type `{field_type}` which is not expanded"
            ),
            Diagnostic::RecursiveField {
                type_name,
                field,
                field_type,
            } => write!(
                f,
                "`{type_name}.{field}` would expand `{field_type}` inside itself"
            ),
            Diagnostic::EmptySelection {
                type_name,
                field,
                field_type,
            } => write!(
                f,
                "`{type_name}.{field}` expands `{field_type}` which has no selectable fields"
            ),
            Diagnostic::UnsupportedArgument {
                operation,
                argument,
            } => write!(f, "`{operation}` does not accept `{argument}`"),
            Diagnostic::UnknownSortKey { operation, key } => {
                write!(f, "`{operation}` cannot be ordered by `{key}`")
            }
        }
    }
}

/// Diagnostics collected while building one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "dropped from generated request");
        self.0.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
