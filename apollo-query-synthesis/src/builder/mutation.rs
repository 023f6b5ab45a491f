use apollo_compiler::ast;
use serde_json::Map;
use serde_json::Value;

use super::BuildContext;
use super::identifier_token;
use crate::document;
use crate::document::AliasAllocator;
use crate::document::OperationBuilder;
use crate::error::SynthesisError;
use crate::introspection::NamedType;
use crate::request::RequestEnvelope;
use crate::request::RequestParams;
use crate::request::ResponseDecoder;
use crate::schema::capitalize;

const INPUT: &str = "input";
const PATCH: &str = "patch";

/// `createT(input: $input) { single { … } }` with `$input = {single: data}`.
pub(super) fn create(
    context: &mut BuildContext<'_>,
    params: &RequestParams,
) -> Result<RequestEnvelope, SynthesisError> {
    let resource = context.resource;
    let operation_name = format!("create{}", resource.type_name);
    context.require_operation(&operation_name)?;

    let record_type = nested_input_type(context, &operation_name, &resource.single)
        .or_else(|| context.index.get_type(&format!("{}Input", resource.type_name)));
    let mut input = Map::new();
    input.insert(
        resource.single.clone(),
        Value::Object(map_input(context, &params.data, record_type)),
    );
    record_mutation(context, &operation_name, input)
}

/// `updateT(input: $input) { single { … } }` with `$input = {id, patch}`.
pub(super) fn update(
    context: &mut BuildContext<'_>,
    params: &RequestParams,
) -> Result<RequestEnvelope, SynthesisError> {
    let raw = context.require_id(params)?;
    let primary_key = context.primary_key;
    let operation_name = primary_key.update_operation_name.as_str();
    context.require_operation(operation_name)?;

    let patch = map_input(context, &params.data, patch_type(context, operation_name));
    let mut input = Map::new();
    input.insert(primary_key.id_argument_name.clone(), context.encode_id(raw));
    input.insert(PATCH.to_string(), Value::Object(patch));
    record_mutation(context, operation_name, input)
}

/// `deleteT(input: $input) { single { … } }` with `$input = {id}`.
pub(super) fn delete(
    context: &mut BuildContext<'_>,
    params: &RequestParams,
) -> Result<RequestEnvelope, SynthesisError> {
    let raw = context.require_id(params)?;
    let primary_key = context.primary_key;
    let operation_name = primary_key.delete_operation_name.as_str();
    context.require_operation(operation_name)?;

    let mut input = Map::new();
    input.insert(primary_key.id_argument_name.clone(), context.encode_id(raw));
    record_mutation(context, operation_name, input)
}

/// One aliased `updateT` per identifier, all carrying the same patch.
pub(super) fn update_many(
    context: &mut BuildContext<'_>,
    params: &RequestParams,
) -> Result<RequestEnvelope, SynthesisError> {
    let primary_key = context.primary_key;
    let operation_name = primary_key.update_operation_name.as_str();
    context.require_operation(operation_name)?;
    let patch = map_input(context, &params.data, patch_type(context, operation_name));
    let label = format!("updateMany{}", context.resource.type_name);
    batch(context, params, operation_name, &label, "update", Some(patch))
}

/// One aliased `deleteT` per identifier.
pub(super) fn delete_many(
    context: &mut BuildContext<'_>,
    params: &RequestParams,
) -> Result<RequestEnvelope, SynthesisError> {
    let primary_key = context.primary_key;
    let operation_name = primary_key.delete_operation_name.as_str();
    context.require_operation(operation_name)?;
    let label = format!("deleteMany{}", context.resource.type_name);
    batch(context, params, operation_name, &label, "k", None)
}

/// The mutation `operation_name` taking `input` and returning the record in its payload.
fn record_mutation(
    context: &mut BuildContext<'_>,
    operation_name: &str,
    input: Map<String, Value>,
) -> Result<RequestEnvelope, SynthesisError> {
    let selection_set = context.project()?;
    let resource = context.resource;
    let single = resource.single.as_str();

    let mut operation = OperationBuilder::mutation(operation_name)?;
    let input_type =
        context.argument_type(operation_name, INPUT, default_input_type(operation_name)?)?;
    let input = operation.variable(INPUT, input_type, Value::Object(input))?;
    let record = document::field(None, document::name(single)?, Vec::new(), selection_set);
    operation.select(document::field(
        None,
        document::name(operation_name)?,
        vec![document::argument(INPUT, input)?],
        vec![record],
    ));
    Ok(context.finish(
        operation,
        operation_name,
        ResponseDecoder::PayloadRecord {
            field: operation_name.to_string(),
            record: single.to_string(),
        },
    ))
}

fn batch(
    context: &mut BuildContext<'_>,
    params: &RequestParams,
    operation_name: &str,
    label: &str,
    alias_prefix: &str,
    patch: Option<Map<String, Value>>,
) -> Result<RequestEnvelope, SynthesisError> {
    let ids = context.require_ids(params);
    if ids.is_empty() {
        return Err(SynthesisError::invalid_request(format!(
            "{} requires at least one identifier",
            context.verb
        )));
    }
    let index = context.index;
    let primary_key = context.primary_key;
    let configuration = context.configuration;
    let client_mutation_id = configuration.naming.client_mutation_id.as_str();
    let accepts_token = index
        .argument_type(operation_name, INPUT)
        .is_some_and(|input| input.input_field(client_mutation_id).is_some());
    let echoes_token = index
        .return_type(operation_name)
        .is_some_and(|payload| payload.field(client_mutation_id).is_some());
    let input_type =
        context.argument_type(operation_name, INPUT, default_input_type(operation_name)?)?;
    let payload_selection = if accepts_token && echoes_token {
        document::leaf(client_mutation_id)?
    } else {
        document::leaf("__typename")?
    };

    let mut operation = OperationBuilder::mutation(label)?;
    let mut aliases = AliasAllocator::new();
    let mut variables = AliasAllocator::new();
    let mut decoded = Vec::with_capacity(ids.len());
    for id in ids {
        let token = identifier_token(id);
        let mut input = Map::new();
        input.insert(primary_key.id_argument_name.clone(), context.encode_id(id));
        if accepts_token {
            input.insert(client_mutation_id.to_string(), Value::String(token.clone()));
        }
        if let Some(patch) = &patch {
            input.insert(PATCH.to_string(), Value::Object(patch.clone()));
        }

        let alias = aliases.allocate(alias_prefix, &token)?;
        let variable = variables.allocate("arg", &token)?;
        let value =
            operation.variable(variable.as_str(), input_type.clone(), Value::Object(input))?;
        operation.select(document::field(
            Some(alias.clone()),
            document::name(operation_name)?,
            vec![document::argument(INPUT, value)?],
            vec![payload_selection.clone()],
        ));
        decoded.push((alias.to_string(), id.clone()));
    }
    Ok(context.finish(
        operation,
        label,
        ResponseDecoder::Identifiers {
            batch: decoded,
            client_mutation_id: (accepts_token && echoes_token)
                .then(|| client_mutation_id.to_string()),
        },
    ))
}

/// `CreateBookInput!` for `createBook`, used when the operation does not declare `input`.
fn default_input_type(operation_name: &str) -> Result<ast::Type, SynthesisError> {
    Ok(ast::Type::NonNullNamed(document::name(&format!(
        "{}Input",
        capitalize(operation_name)
    ))?))
}

/// The type of input field `field` of the `input` argument of `operation_name`.
fn nested_input_type<'a>(
    context: &BuildContext<'a>,
    operation_name: &str,
    field: &str,
) -> Option<&'a NamedType> {
    let index = context.index;
    index
        .argument_type(operation_name, INPUT)?
        .input_field(field)?
        .ty
        .base_name()
        .and_then(|name| index.get_type(name))
}

fn patch_type<'a>(context: &BuildContext<'a>, operation_name: &str) -> Option<&'a NamedType> {
    nested_input_type(context, operation_name, PATCH)
        .or_else(|| context.index.get_type(&format!("{}Patch", context.resource.type_name)))
}

/// Copies the caller's record data into the shape of `input_type`.
///
/// Only declared input fields are copied. A value whose field on the resource type has a
/// configured value coercion is replaced by the coerced value. Without a known input type every
/// value is copied.
fn map_input(
    context: &BuildContext<'_>,
    data: &Map<String, Value>,
    input_type: Option<&NamedType>,
) -> Map<String, Value> {
    let coerce = |key: &str, value: &Value| {
        context
            .resource_type
            .field(key)
            .and_then(|field| field.ty.base_name())
            .and_then(|type_name| context.type_configs.get(type_name))
            .and_then(|config| config.coerce_input_value(value))
            .unwrap_or_else(|| value.clone())
    };
    match input_type {
        Some(input_type) => input_type
            .input_fields
            .iter()
            .filter_map(|field| {
                data.get(&field.name)
                    .map(|value| (field.name.clone(), coerce(&field.name, value)))
            })
            .collect(),
        None => data
            .iter()
            .map(|(key, value)| (key.clone(), coerce(key, value)))
            .collect(),
    }
}
