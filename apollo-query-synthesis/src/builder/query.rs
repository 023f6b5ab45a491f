use apollo_compiler::Node;
use apollo_compiler::ast;
use heck::ToShoutySnakeCase;
use serde_json::Map;
use serde_json::Value;

use super::BuildContext;
use super::identifier_token;
use crate::diagnostics::Diagnostic;
use crate::document;
use crate::document::AliasAllocator;
use crate::document::OperationBuilder;
use crate::error::SynthesisError;
use crate::filter::FilterCompiler;
use crate::request::RequestEnvelope;
use crate::request::RequestParams;
use crate::request::ResponseDecoder;
use crate::request::Sort;

const FILTER: &str = "filter";
const CONDITION: &str = "condition";
const ORDER_BY: &str = "orderBy";

/// Pagination values are sent as GraphQL `Int`, which is 32-bit signed.
fn graphql_int(name: &str, value: Option<u64>) -> Result<Value, SynthesisError> {
    value
        .and_then(|value| i32::try_from(value).ok())
        .map(Value::from)
        .ok_or_else(|| {
            SynthesisError::invalid_request(format!(
                "pagination `{name}` does not fit in a GraphQL Int"
            ))
        })
}

fn int() -> Result<ast::Type, SynthesisError> {
    Ok(ast::Type::NonNullNamed(document::name("Int")?))
}

/// `single(id: $id) { … }`
pub(super) fn get_one(
    context: &mut BuildContext<'_>,
    params: &RequestParams,
) -> Result<RequestEnvelope, SynthesisError> {
    let raw = context.require_id(params)?;
    let primary_key = context.primary_key;
    let operation_name = primary_key.single_record_operation_name.as_str();
    context.require_operation(operation_name)?;
    let selection_set = context.project()?;

    let mut operation = OperationBuilder::query(operation_name)?;
    let id_type = context.argument_type(
        operation_name,
        &primary_key.id_argument_name,
        ast::Type::NonNullNamed(document::name(&primary_key.id_argument_type)?),
    )?;
    let id = operation.variable(&primary_key.id_argument_name, id_type, context.encode_id(raw))?;
    operation.select(document::field(
        None,
        document::name(operation_name)?,
        vec![document::argument(&primary_key.id_argument_name, id)?],
        selection_set,
    ));
    Ok(context.finish(
        operation,
        operation_name,
        ResponseDecoder::Record {
            field: operation_name.to_string(),
        },
    ))
}

/// `plural(first: $first, offset: $offset, filter: $filter, condition: $condition,
/// orderBy: $orderBy) { nodes { … } totalCount }`, each optional argument only when the
/// operation declares it.
pub(super) fn get_list(
    context: &mut BuildContext<'_>,
    params: &RequestParams,
    filter: &Map<String, Value>,
) -> Result<RequestEnvelope, SynthesisError> {
    let index = context.index;
    let configuration = context.configuration;
    let resource = context.resource;
    let plural = resource.plural.as_str();
    context.require_operation(plural)?;

    let compiled_filter = FilterCompiler::new(&configuration.filters).compile(
        filter,
        context.resource_type,
        &mut context.diagnostics,
    )?;
    let condition = filter
        .get(&configuration.filters.condition_key)
        .filter(|condition| !condition.is_null());
    let selection_set = context.project()?;

    let pagination = params.pagination.unwrap_or_default();
    let mut operation = OperationBuilder::query(plural)?;
    let first = graphql_int("perPage", Some(pagination.per_page))?;
    let offset = graphql_int("offset", pagination.offset())?;
    let first = operation.variable("first", int()?, first)?;
    let offset = operation.variable("offset", int()?, offset)?;
    let mut arguments = vec![
        document::argument("first", first)?,
        document::argument("offset", offset)?,
    ];

    let optional_arguments = [
        (FILTER, compiled_filter),
        (CONDITION, condition.cloned()),
        (ORDER_BY, order_by(context, params.sort.as_ref())),
    ];
    for (argument, value) in optional_arguments {
        let Some(value) = value else {
            continue;
        };
        let Some(declared) = index.argument(plural, argument) else {
            context.diagnostics.push(Diagnostic::UnsupportedArgument {
                operation: plural.to_string(),
                argument: argument.to_string(),
            });
            continue;
        };
        let variable =
            operation.variable(argument, document::to_ast_type(&declared.ty)?, value)?;
        arguments.push(document::argument(argument, variable)?);
    }

    let total = index
        .return_type(plural)
        .is_some_and(|connection| connection.field("totalCount").is_some());
    let mut connection = vec![document::field(
        None,
        document::name("nodes")?,
        Vec::new(),
        selection_set,
    )];
    if total {
        connection.push(document::leaf("totalCount")?);
    }
    operation.select(document::field(
        None,
        document::name(plural)?,
        arguments,
        connection,
    ));
    Ok(context.finish(
        operation,
        plural,
        ResponseDecoder::Connection {
            field: plural.to_string(),
            total,
        },
    ))
}

/// The ordering to send, `None` when the operation offers no ordering besides natural.
///
/// A requested key missing from the ordering enum falls back to natural ordering.
fn order_by(context: &mut BuildContext<'_>, sort: Option<&Sort>) -> Option<Value> {
    let configuration = context.configuration;
    let naming = &configuration.naming;
    let resource = context.resource;
    let plural = resource.plural.as_str();
    let index = context.index;
    let Some(ordering) = index.ordering_enum(plural, ORDER_BY, &naming.natural_ordering) else {
        if sort.is_some() {
            context.diagnostics.push(Diagnostic::UnsupportedArgument {
                operation: plural.to_string(),
                argument: ORDER_BY.to_string(),
            });
        }
        return None;
    };
    let key = match sort {
        Some(sort) => {
            let primary_key = context.primary_key;
            let field = if primary_key.alias_required && sort.field == naming.identifier_name {
                &primary_key.field_name
            } else {
                &sort.field
            };
            let key = format!(
                "{}_{}",
                field.to_shouty_snake_case(),
                sort.order.to_uppercase()
            );
            if ordering.has_enum_value(&key) {
                key
            } else {
                context.diagnostics.push(Diagnostic::UnknownSortKey {
                    operation: plural.to_string(),
                    key,
                });
                naming.natural_ordering.clone()
            }
        }
        None => naming.natural_ordering.clone(),
    };
    Some(Value::Array(vec![Value::String(key)]))
}

/// `plural(filter: {id: {in: $ids}}) { nodes { … } }`, or the unfiltered list when the list
/// operation takes no filter. Resources addressed through the synthetic identifier are fetched
/// with one aliased single-record lookup per identifier instead.
pub(super) fn get_many(
    context: &mut BuildContext<'_>,
    params: &RequestParams,
) -> Result<RequestEnvelope, SynthesisError> {
    let ids = context.require_ids(params);
    if context.primary_key.alias_required {
        return get_many_by_lookup(context, &ids);
    }
    let index = context.index;
    let primary_key = context.primary_key;
    let resource = context.resource;
    let plural = resource.plural.as_str();
    context.require_operation(plural)?;
    let selection_set = context.project()?;

    let mut operation = OperationBuilder::query(plural)?;
    let mut arguments = Vec::new();
    if index.supports_argument(plural, FILTER) {
        let encoded = ids.iter().map(|id| context.encode_key(id)).collect();
        let ids_type = ast::Type::List(Box::new(ast::Type::NonNullNamed(document::name(
            &primary_key.scalar_type,
        )?)));
        let ids = operation.variable("ids", ids_type, Value::Array(encoded))?;
        let list = ast::Value::Object(vec![(
            document::name(&context.configuration.filters.list_operator)?,
            ids,
        )]);
        let filter = ast::Value::Object(vec![(
            document::name(&primary_key.field_name)?,
            Node::new(list),
        )]);
        arguments.push(document::argument(FILTER, Node::new(filter))?);
    }
    let nodes = document::field(None, document::name("nodes")?, Vec::new(), selection_set);
    operation.select(document::field(
        None,
        document::name(plural)?,
        arguments,
        vec![nodes],
    ));
    Ok(context.finish(
        operation,
        plural,
        ResponseDecoder::Connection {
            field: plural.to_string(),
            total: false,
        },
    ))
}

fn get_many_by_lookup(
    context: &mut BuildContext<'_>,
    ids: &[&Value],
) -> Result<RequestEnvelope, SynthesisError> {
    if ids.is_empty() {
        return Err(SynthesisError::invalid_request(
            "GET_MANY requires at least one identifier",
        ));
    }
    let primary_key = context.primary_key;
    let operation_name = primary_key.single_record_operation_name.as_str();
    context.require_operation(operation_name)?;
    let selection_set = context.project()?;
    let id_type = context.argument_type(
        operation_name,
        &primary_key.id_argument_name,
        ast::Type::NonNullNamed(document::name(&primary_key.id_argument_type)?),
    )?;

    let resource = context.resource;
    let plural = resource.plural.as_str();
    let mut operation = OperationBuilder::query(plural)?;
    let mut aliases = AliasAllocator::new();
    let mut variables = AliasAllocator::new();
    let mut decoded = Vec::with_capacity(ids.len());
    for id in ids {
        let token = identifier_token(id);
        let alias = aliases.allocate("k", &token)?;
        let variable = variables.allocate(&primary_key.id_argument_name, &token)?;
        let value = operation.variable(variable.as_str(), id_type.clone(), context.encode_id(id))?;
        operation.select(document::field(
            Some(alias.clone()),
            document::name(operation_name)?,
            vec![document::argument(&primary_key.id_argument_name, value)?],
            selection_set.clone(),
        ));
        decoded.push(alias.to_string());
    }
    Ok(context.finish(
        operation,
        plural,
        ResponseDecoder::Records { aliases: decoded },
    ))
}

/// A list filtered on the relation field, merged with the caller's filter.
pub(super) fn get_many_reference(
    context: &mut BuildContext<'_>,
    params: &RequestParams,
) -> Result<RequestEnvelope, SynthesisError> {
    let target = params
        .target
        .as_deref()
        .filter(|target| !target.is_empty())
        .ok_or_else(|| SynthesisError::invalid_request("GET_MANY_REFERENCE requires a `target`"))?;
    let id = context.require_id(params)?;
    let related = match context
        .resource_type
        .field(target)
        .and_then(|field| field.ty.base_name())
    {
        Some(scalar) => context.codec().encode(scalar, id),
        None => id.clone(),
    };

    let mut filter = Map::new();
    filter.insert(target.to_string(), related);
    for (key, value) in &params.filter {
        filter.insert(key.clone(), value.clone());
    }
    get_list(context, params, &filter)
}
