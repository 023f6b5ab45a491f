//! Builder configuration and its YAML loader.
use std::collections::BTreeMap;

use displaydoc::Display;
use itertools::Itertools;
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not deserialize configuration: {0}
    DeserializeConfigError(serde_yaml::Error),
    /// {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
}

/// The configuration for the synthesizer.
///
/// Every section has defaults matching a PostGraphile schema built with the connection filter
/// plugin, so an empty document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Naming conventions of the target schema.
    pub naming: Naming,

    /// Filter operators used when a filter value does not name one explicitly.
    pub filters: FilterOperators,

    /// Identifier coercion.
    pub identifiers: Identifiers,

    /// Declarative per-type configuration, keyed by type name.
    ///
    /// Programmatic type configuration registered on the builder takes precedence.
    pub types: BTreeMap<String, DeclaredTypeConfig>,
}

impl Configuration {
    /// Reads a YAML configuration document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        let configuration: Configuration =
            serde_yaml::from_str(yaml).map_err(ConfigurationError::DeserializeConfigError)?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// The JSON schema of the configuration document.
    pub fn json_schema() -> RootSchema {
        schemars::schema_for!(Configuration)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let names = [
            ("naming.identifier_name", &self.naming.identifier_name),
            (
                "naming.synthetic_identifier",
                &self.naming.synthetic_identifier,
            ),
            ("naming.natural_ordering", &self.naming.natural_ordering),
            ("naming.client_mutation_id", &self.naming.client_mutation_id),
            ("filters.list_operator", &self.filters.list_operator),
            ("filters.equality_operator", &self.filters.equality_operator),
        ];
        let empty = names
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(key, _)| format!("`{key}`"))
            .join(", ");
        if !empty.is_empty() {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "configured names must not be empty",
                error: format!("{empty} is empty"),
            });
        }
        Ok(())
    }
}

/// Naming conventions of the target schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Naming {
    /// The uniform identifier every record surfaces to the caller.
    /// default: "id"
    pub identifier_name: String,

    /// Stand-in identifier argument used when a resource is not keyed by `identifier_name`.
    /// default: "nodeId"
    pub synthetic_identifier: String,

    /// Suffix of single-record operations addressed by the synthetic identifier.
    /// default: "ByNodeId"
    pub aliased_operation_suffix: String,

    /// Ordering sentinel used when no sort is requested.
    /// default: "NATURAL"
    pub natural_ordering: String,

    /// Input and payload field echoing a client supplied token, used by batch mutations.
    /// default: "clientMutationId"
    pub client_mutation_id: String,
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            identifier_name: String::from("id"),
            synthetic_identifier: String::from("nodeId"),
            aliased_operation_suffix: String::from("ByNodeId"),
            natural_ordering: String::from("NATURAL"),
            client_mutation_id: String::from("clientMutationId"),
        }
    }
}

/// Default filter operators, by scalar kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct FilterOperators {
    /// Partial-match operator for string-like scalars.
    /// default: "includesInsensitive"
    pub string_operator: String,

    /// Scalars filtered with `string_operator`.
    /// default: ["String"]
    pub string_scalars: Vec<String>,

    /// Operator for full-text scalars.
    /// default: "matches"
    pub full_text_operator: String,

    /// Scalars filtered with `full_text_operator`.
    /// default: ["FullText"]
    pub full_text_scalars: Vec<String>,

    /// Appended to full-text values.
    /// default: "*"
    pub full_text_wildcard: String,

    /// Operator for every other scalar and enum.
    /// default: "equalTo"
    pub equality_operator: String,

    /// Operator for list values.
    /// default: "in"
    pub list_operator: String,

    /// Filter key whose value is sent as the `condition` argument.
    /// default: "$condition"
    pub condition_key: String,
}

impl Default for FilterOperators {
    fn default() -> Self {
        Self {
            string_operator: String::from("includesInsensitive"),
            string_scalars: vec![String::from("String")],
            full_text_operator: String::from("matches"),
            full_text_scalars: vec![String::from("FullText")],
            full_text_wildcard: String::from("*"),
            equality_operator: String::from("equalTo"),
            list_operator: String::from("in"),
            condition_key: String::from("$condition"),
        }
    }
}

/// Identifier coercion settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Identifiers {
    /// Lower-cased scalar names whose identifiers are never parsed as integers.
    /// default: ["string", "uuid", "id"]
    pub passthrough_scalars: Vec<String>,
}

impl Default for Identifiers {
    fn default() -> Self {
        Self {
            passthrough_scalars: vec!["string".into(), "uuid".into(), "id".into()],
        }
    }
}

/// The declarative subset of a type configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeclaredTypeConfig {
    /// Only these fields are selected. Wins over `exclude_fields` when both are set.
    #[serde(default)]
    pub include_fields: Option<Vec<String>>,

    /// These fields are never selected.
    #[serde(default)]
    pub exclude_fields: Option<Vec<String>>,

    /// Fields of this type are selected with a nested selection instead of being dropped.
    #[serde(default)]
    pub expand: bool,
}
