//! Synthesis errors.
use displaydoc::Display;
use thiserror::Error;

/// Errors raised while turning an abstract CRUD request into a GraphQL operation.
///
/// Every error is produced at build time, before any network call, and a failed build leaves
/// no side effects behind.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SynthesisError {
    /// Type "{0}" did not exist in the introspection result.
    ResourceTypeUnresolved(String),

    /// could not resolve the primary key of type "{type_name}": it has no field named "{field}"
    PrimaryKeyUnresolvable {
        /// The resource type.
        type_name: String,
        /// The primary key name derived from the single-record operation.
        field: String,
    },

    /// filter for field "{field}" of type "{type_name}" has no default operator, pass a filter spec instead
    UnsupportedFilterScalar {
        /// The filtered field.
        field: String,
        /// The base type of the filtered field.
        type_name: String,
    },

    /// filter for field "{field}" must be a filter spec with an `operator` and a `value`
    MalformedFilterSpec {
        /// The filtered field.
        field: String,
    },

    /// {0} is not yet implemented.
    UnimplementedVerb(String),

    /// invalid request: {reason}
    InvalidRequest {
        /// What is missing or wrong.
        reason: String,
    },

    /// "{name}" is not a valid GraphQL name
    InvalidName {
        /// The offending name.
        name: String,
    },

    /// response was malformed: {reason}
    MalformedResponse {
        /// The reason the response could not be decoded.
        reason: String,
    },

    /// introspection result could not be read: {reason}
    InvalidIntrospection {
        /// The reason the payload was rejected.
        reason: String,
    },
}

impl SynthesisError {
    /// A stable, machine-readable code for this error.
    pub const fn code(&self) -> &'static str {
        match self {
            SynthesisError::ResourceTypeUnresolved(_) => "RESOURCE_TYPE_UNRESOLVED",
            SynthesisError::PrimaryKeyUnresolvable { .. } => "PRIMARY_KEY_UNRESOLVABLE",
            SynthesisError::UnsupportedFilterScalar { .. } => "UNSUPPORTED_FILTER_SCALAR",
            SynthesisError::MalformedFilterSpec { .. } => "MALFORMED_FILTER_SPEC",
            SynthesisError::UnimplementedVerb(_) => "UNIMPLEMENTED_VERB",
            SynthesisError::InvalidRequest { .. } => "INVALID_REQUEST",
            SynthesisError::InvalidName { .. } => "INVALID_NAME",
            SynthesisError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            SynthesisError::InvalidIntrospection { .. } => "INVALID_INTROSPECTION",
        }
    }

    pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
        SynthesisError::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_response(reason: impl Into<String>) -> Self {
        SynthesisError::MalformedResponse {
            reason: reason.into(),
        }
    }
}
