use std::sync::OnceLock;

use apollo_compiler::ExecutableDocument;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::validation::Valid;
use apollo_query_synthesis::IntrospectionSchema;
use apollo_query_synthesis::QueryBuilder;
use apollo_query_synthesis::RequestEnvelope;
use apollo_query_synthesis::RequestParams;
use apollo_query_synthesis::SynthesisError;
use serde_json::Value;

const LIBRARY: &str = include_str!("testdata/library.graphql");

pub(crate) fn schema() -> &'static Valid<Schema> {
    static SCHEMA: OnceLock<Valid<Schema>> = OnceLock::new();
    SCHEMA.get_or_init(|| Schema::parse_and_validate(LIBRARY, "library.graphql").unwrap())
}

pub(crate) fn introspection() -> IntrospectionSchema {
    IntrospectionSchema::from_schema(schema())
}

pub(crate) fn builder() -> QueryBuilder {
    QueryBuilder::builder()
        .introspection(introspection())
        .build()
}

pub(crate) fn params(params: Value) -> RequestParams {
    serde_json::from_value(params).unwrap()
}

/// Builds a request with the default builder and checks it against the library schema.
pub(crate) fn build(verb: &str, resource: &str, request: Value) -> RequestEnvelope {
    let envelope = builder().build(verb, resource, &params(request)).unwrap();
    assert_valid(&envelope);
    envelope
}

pub(crate) fn build_err(verb: &str, resource: &str, request: Value) -> SynthesisError {
    builder()
        .build(verb, resource, &params(request))
        .unwrap_err()
}

/// The document validates against the schema and declares exactly the variables it carries.
pub(crate) fn assert_valid(envelope: &RequestEnvelope) {
    let request = envelope.to_graphql_request();
    if let Err(invalid) =
        ExecutableDocument::parse_and_validate(schema(), &request.query, "request.graphql")
    {
        panic!("{}\n{}", request.query, invalid.errors);
    }
    let declared = operation(envelope)
        .variables
        .iter()
        .map(|variable| variable.name.to_string())
        .collect::<Vec<_>>();
    let provided = envelope.variables().keys().cloned().collect::<Vec<_>>();
    assert_eq!(declared, provided);
    assert_eq!(
        operation(envelope).name.as_ref().map(|name| name.as_str()),
        Some(envelope.operation_name())
    );
}

pub(crate) fn operation(envelope: &RequestEnvelope) -> &ast::OperationDefinition {
    match envelope.document().definitions.as_slice() {
        [ast::Definition::OperationDefinition(operation)] => operation,
        other => panic!("expected a single operation, got {other:?}"),
    }
}

pub(crate) fn fields(selection_set: &[ast::Selection]) -> Vec<&ast::Field> {
    selection_set
        .iter()
        .map(|selection| match selection {
            ast::Selection::Field(field) => &**field,
            other => panic!("expected a field, got {other:?}"),
        })
        .collect()
}

/// The root fields of the operation.
pub(crate) fn root_fields(envelope: &RequestEnvelope) -> Vec<&ast::Field> {
    fields(&operation(envelope).selection_set)
}

/// The response keys of a selection set, rendered `alias: name` when aliased.
pub(crate) fn response_keys(selection_set: &[ast::Selection]) -> Vec<String> {
    fields(selection_set)
        .into_iter()
        .map(|field| match &field.alias {
            Some(alias) => format!("{alias}: {}", field.name),
            None => field.name.to_string(),
        })
        .collect()
}

pub(crate) fn argument_names(field: &ast::Field) -> Vec<&str> {
    field
        .arguments
        .iter()
        .map(|argument| argument.name.as_str())
        .collect()
}

pub(crate) fn child<'a>(field: &'a ast::Field, name: &str) -> &'a ast::Field {
    fields(&field.selection_set)
        .into_iter()
        .find(|child| child.name.as_str() == name)
        .unwrap_or_else(|| panic!("`{}` does not select `{name}`", field.name))
}
