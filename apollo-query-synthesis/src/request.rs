use apollo_compiler::ast;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;

use crate::diagnostics::Diagnostics;
use crate::error::SynthesisError;
use crate::introspection::deserialize_null_default;

/// The abstract CRUD verbs a request can be built for.
///
/// Parsing accepts the upper snake case token, the camel case name and the kebab case name,
/// case insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Verb {
    #[strum(to_string = "GET_ONE", serialize = "getOne", serialize = "get-one")]
    GetOne,
    #[strum(to_string = "GET_LIST", serialize = "getList", serialize = "get-list")]
    GetList,
    #[strum(to_string = "GET_MANY", serialize = "getMany", serialize = "get-many")]
    GetMany,
    #[strum(
        to_string = "GET_MANY_REFERENCE",
        serialize = "getManyReference",
        serialize = "get-many-reference",
        serialize = "get-many-by-relation"
    )]
    GetManyReference,
    #[strum(to_string = "CREATE")]
    Create,
    #[strum(to_string = "UPDATE")]
    Update,
    #[strum(to_string = "UPDATE_MANY", serialize = "updateMany", serialize = "update-many")]
    UpdateMany,
    #[strum(to_string = "DELETE")]
    Delete,
    #[strum(to_string = "DELETE_MANY", serialize = "deleteMany", serialize = "delete-many")]
    DeleteMany,
}

impl Verb {
    /// Parses a verb token, rejecting the empty token and unknown verbs.
    pub fn parse(token: &str) -> Result<Self, SynthesisError> {
        if token.is_empty() {
            return Err(SynthesisError::invalid_request("the verb is empty"));
        }
        token
            .parse()
            .map_err(|_| SynthesisError::UnimplementedVerb(token.to_string()))
    }
}

/// Sort order requested by the caller. `order` is upper-cased before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_order() -> String {
    String::from("ASC")
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl Pagination {
    /// Number of records skipped before this page. `None` when it does not fit in a `u64`.
    pub fn offset(&self) -> Option<u64> {
        self.page.saturating_sub(1).checked_mul(self.per_page)
    }
}

/// Verb-specific request parameters, in the shape a CRUD orchestration layer sends them.
///
/// A JSON `null` stands for an absent value: `null` identifiers are skipped and `null` filter
/// values clear their key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestParams {
    /// Identifier for get-one, update and delete.
    pub id: Option<Value>,
    /// Identifiers for get-many, update-many and delete-many.
    #[serde(deserialize_with = "deserialize_null_default")]
    pub ids: Vec<Value>,
    #[serde(deserialize_with = "deserialize_null_default")]
    pub filter: Map<String, Value>,
    #[serde(deserialize_with = "deserialize_sort")]
    pub sort: Option<Sort>,
    pub pagination: Option<Pagination>,
    /// Record data for create and update.
    #[serde(deserialize_with = "deserialize_null_default")]
    pub data: Map<String, Value>,
    pub previous_data: Option<Value>,
    /// Relation field for get-many-reference.
    pub target: Option<String>,
}

// A sort without a field (`sort: {}`) means no sort.
fn deserialize_sort<'de, D>(deserializer: D) -> Result<Option<Sort>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct PartialSort {
        field: Option<String>,
        order: Option<String>,
    }

    let sort = <Option<PartialSort>>::deserialize(deserializer)?;
    Ok(sort.and_then(|sort| {
        sort.field.filter(|field| !field.is_empty()).map(|field| Sort {
            field,
            order: sort.order.unwrap_or_else(default_order),
        })
    }))
}

/// What a response decoder produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// A GraphQL request body as posted by a transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    pub query: String,
    pub operation_name: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, Value>,
}

/// How a response to the generated document is decoded.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ResponseDecoder {
    /// `data.<field>`
    Record { field: String },
    /// `data.<field>.<record>`
    PayloadRecord { field: String, record: String },
    /// `data.<field>.nodes`, with `data.<field>.totalCount` when selected.
    Connection { field: String, total: bool },
    /// `data.<alias>` for every alias, in order, leaving out missing records.
    Records { aliases: Vec<String> },
    /// The identifier echoed by every aliased mutation payload, in order.
    Identifiers {
        batch: Vec<(String, Value)>,
        client_mutation_id: Option<String>,
    },
}

impl ResponseDecoder {
    fn decode(&self, data: &Map<String, Value>) -> Result<QueryResult, SynthesisError> {
        match self {
            ResponseDecoder::Record { field } => Ok(QueryResult {
                data: member(data, field)?.clone(),
                total: None,
            }),
            ResponseDecoder::PayloadRecord { field, record } => {
                let payload = member(data, field)?;
                let data = match payload {
                    Value::Null => Value::Null,
                    Value::Object(payload) => member(payload, record)?.clone(),
                    _ => return Err(SynthesisError::malformed_response(format!(
                        "`{field}` is not an object"
                    ))),
                };
                Ok(QueryResult { data, total: None })
            }
            ResponseDecoder::Connection { field, total } => {
                let connection = match member(data, field)? {
                    // A nullable connection may come back empty.
                    Value::Null => {
                        return Ok(QueryResult {
                            data: Value::Array(Vec::new()),
                            total: None,
                        });
                    }
                    Value::Object(connection) => connection,
                    _ => {
                        return Err(SynthesisError::malformed_response(format!(
                            "`{field}` is not a connection"
                        )));
                    }
                };
                let nodes = member(connection, "nodes")?.clone();
                let total = if *total {
                    member(connection, "totalCount")?.as_u64()
                } else {
                    None
                };
                Ok(QueryResult { data: nodes, total })
            }
            ResponseDecoder::Records { aliases } => {
                let mut records = Vec::with_capacity(aliases.len());
                for alias in aliases {
                    match member(data, alias)? {
                        Value::Null => {}
                        record => records.push(record.clone()),
                    }
                }
                Ok(QueryResult {
                    data: Value::Array(records),
                    total: None,
                })
            }
            ResponseDecoder::Identifiers {
                batch,
                client_mutation_id,
            } => {
                let mut identifiers = Vec::with_capacity(batch.len());
                for (alias, requested) in batch {
                    let echoed = match member(data, alias)? {
                        Value::Null => {
                            identifiers.push(Value::Null);
                            continue;
                        }
                        payload => client_mutation_id
                            .as_deref()
                            .and_then(|key| payload.get(key))
                            .and_then(Value::as_str),
                    };
                    identifiers.push(decode_identifier(echoed, requested));
                }
                Ok(QueryResult {
                    data: Value::Array(identifiers),
                    total: None,
                })
            }
        }
    }
}

// The echoed token is the identifier's string form; give it back in the requested shape.
fn decode_identifier(echoed: Option<&str>, requested: &Value) -> Value {
    match (echoed, requested) {
        (Some(echoed), Value::Number(_)) => echoed
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| requested.clone()),
        (Some(echoed), _) => Value::String(echoed.to_string()),
        (None, _) => requested.clone(),
    }
}

fn member<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a Value, SynthesisError> {
    object
        .get(key)
        .ok_or_else(|| SynthesisError::malformed_response(format!("`{key}` is missing")))
}

/// A generated request: the operation document, its variables and the decoder for its response.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    document: ast::Document,
    operation_name: String,
    variables: Map<String, Value>,
    decoder: ResponseDecoder,
    diagnostics: Diagnostics,
}

impl RequestEnvelope {
    pub(crate) fn new(
        document: ast::Document,
        operation_name: String,
        variables: Map<String, Value>,
        decoder: ResponseDecoder,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            document,
            operation_name,
            variables,
            decoder,
            diagnostics,
        }
    }

    pub fn document(&self) -> &ast::Document {
        &self.document
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    /// Values for exactly the variables the document declares.
    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    /// Items the build left out.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Decodes a server response (`{"data": …}`) to the document.
    pub fn parse_response(&self, response: &Value) -> Result<QueryResult, SynthesisError> {
        let data = response
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| SynthesisError::malformed_response("`data` is missing"))?;
        self.decoder.decode(data)
    }

    /// The body a transport posts for this request.
    pub fn to_graphql_request(&self) -> GraphQLRequest {
        GraphQLRequest {
            query: self.document.serialize().no_indent().to_string(),
            operation_name: self.operation_name.clone(),
            variables: self.variables.clone(),
        }
    }
}
