use apollo_compiler::ast::OperationType;
use apollo_query_synthesis::Diagnostic;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value;
use serde_json::json;

use crate::common::argument_names;
use crate::common::build;
use crate::common::build_err;
use crate::common::child;
use crate::common::operation;
use crate::common::response_keys;
use crate::common::root_fields;

const BOOK_FIELDS: [&str; 7] = [
    "nodeId",
    "id",
    "title",
    "authorId",
    "summary",
    "published",
    "location",
];

#[test_log::test]
fn get_one_selects_the_record_by_id() {
    let envelope = build("GET_ONE", "books", json!({ "id": "1" }));
    assert_eq!(
        envelope.to_graphql_request().query.trim(),
        "query book($id: Int!) { book(id: $id) { nodeId id title authorId summary published location { geojson srid x y } } }"
    );
    assert_eq!(Value::Object(envelope.variables().clone()), json!({ "id": 1 }));
    assert_eq!(operation(&envelope).operation_type, OperationType::Query);

    let dropped = envelope
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    assert_eq!(
        dropped,
        [
            "`Book.author` is of type `Author` which is not expanded",
            "`Book.excerpt` requires arguments and `Book` has no configuration",
        ]
    );
}

#[rstest]
#[case("books")]
#[case("book")]
#[case("Book")]
#[case("Books")]
fn resource_names_are_normalized(#[case] resource: &str) {
    let envelope = build("GET_ONE", resource, json!({ "id": 1 }));
    assert_eq!(envelope.operation_name(), "book");
}

#[rstest]
#[case("GET_ONE")]
#[case("getOne")]
#[case("get-one")]
#[case("get_one")]
fn verb_spellings_are_equivalent(#[case] verb: &str) {
    let envelope = build(verb, "books", json!({ "id": 1 }));
    assert_eq!(
        envelope.to_graphql_request(),
        build("GET_ONE", "books", json!({ "id": 1 })).to_graphql_request()
    );
}

#[test]
fn get_one_surfaces_the_node_identifier_as_id() {
    let envelope = build(
        "GET_ONE",
        "favoriteBooks",
        json!({ "id": "WyJmYXZvcml0ZV9ib29rcyIsIjk3OC0wIl0=" }),
    );
    let root = root_fields(&envelope);
    assert_eq!(root[0].name.as_str(), "favoriteBookByNodeId");
    assert_eq!(argument_names(root[0]), ["nodeId"]);
    assert_eq!(
        response_keys(&root[0].selection_set),
        ["id: nodeId", "isbn", "title", "rating"]
    );
    assert_eq!(
        Value::Object(envelope.variables().clone()),
        json!({ "nodeId": "WyJmYXZvcml0ZV9ib29rcyIsIjk3OC0wIl0=" })
    );
}

#[test]
fn uuid_identifiers_pass_through() {
    let envelope = build(
        "GET_ONE",
        "profiles",
        json!({ "id": "02d07429-c2a7-4494-aec9-e8bde9176e86" }),
    );
    assert_eq!(
        Value::Object(envelope.variables().clone()),
        json!({ "id": "02d07429-c2a7-4494-aec9-e8bde9176e86" })
    );
}

#[test_log::test]
fn get_list_declares_every_supported_argument() {
    let envelope = build(
        "GET_LIST",
        "books",
        json!({
            "pagination": { "page": 2, "perPage": 5 },
            "sort": { "field": "title", "order": "desc" },
            "filter": {
                "title": "dune",
                "summary": "space",
                "published": true,
                "authorId": [1, 2],
                "$condition": { "authorId": 3 },
                "publisher": "Chilton"
            }
        }),
    );
    let root = root_fields(&envelope);
    assert_eq!(root[0].name.as_str(), "books");
    assert_eq!(
        argument_names(root[0]),
        ["first", "offset", "filter", "condition", "orderBy"]
    );
    assert_eq!(response_keys(&root[0].selection_set), ["nodes", "totalCount"]);
    assert_eq!(
        response_keys(&child(root[0], "nodes").selection_set),
        BOOK_FIELDS
    );
    assert_eq!(
        Value::Object(envelope.variables().clone()),
        json!({
            "first": 5,
            "offset": 5,
            "filter": {
                "and": [
                    { "title": { "includesInsensitive": "dune" } },
                    { "summary": { "matches": "space*" } },
                    { "published": { "equalTo": true } },
                    { "authorId": { "in": [1, 2] } }
                ]
            },
            "condition": { "authorId": 3 },
            "orderBy": ["TITLE_DESC"]
        })
    );
    assert_eq!(
        envelope.diagnostics().iter().next(),
        Some(&Diagnostic::UnknownFilterKey {
            type_name: "Book".to_string(),
            key: "publisher".to_string(),
        })
    );
}

#[test]
fn get_list_defaults_to_the_first_page_in_natural_order() {
    let envelope = build("GET_LIST", "books", json!({}));
    assert_eq!(
        argument_names(root_fields(&envelope)[0]),
        ["first", "offset", "orderBy"]
    );
    assert_eq!(
        Value::Object(envelope.variables().clone()),
        json!({ "first": 10, "offset": 0, "orderBy": ["NATURAL"] })
    );
}

#[test]
fn filter_specs_override_the_default_operator() {
    let envelope = build(
        "GET_LIST",
        "books",
        json!({
            "filter": {
                "authorId": { "operator": "greaterThan", "value": 3 },
                "title": { "operator": "equalTo", "value": null },
                "id": null
            }
        }),
    );
    assert_eq!(
        envelope.variables()["filter"],
        json!({ "and": [{ "authorId": { "greaterThan": 3 } }] })
    );
    assert!(envelope.diagnostics().iter().any(|diagnostic| matches!(
        diagnostic,
        Diagnostic::ClearedFilterKey { key } if key == "title"
    )));
}

#[test]
fn unknown_sort_keys_fall_back_to_natural_order() {
    let envelope = build(
        "GET_LIST",
        "books",
        json!({ "sort": { "field": "rating", "order": "ASC" } }),
    );
    assert_eq!(envelope.variables()["orderBy"], json!(["NATURAL"]));
    assert!(envelope.diagnostics().iter().any(|diagnostic| matches!(
        diagnostic,
        Diagnostic::UnknownSortKey { key, .. } if key == "RATING_ASC"
    )));
}

#[test]
fn sorting_by_id_uses_the_backend_key() {
    let envelope = build(
        "GET_LIST",
        "favoriteBooks",
        json!({ "sort": { "field": "id" } }),
    );
    assert_eq!(envelope.variables()["orderBy"], json!(["ISBN_ASC"]));
}

#[test]
fn unsupported_list_arguments_are_left_out() {
    let envelope = build(
        "GET_LIST",
        "authors",
        json!({
            "sort": { "field": "name" },
            "filter": { "name": "Herbert" }
        }),
    );
    let root = root_fields(&envelope);
    assert_eq!(argument_names(root[0]), ["first", "offset"]);
    assert_eq!(
        response_keys(&child(root[0], "nodes").selection_set),
        ["id", "name"]
    );
    let unsupported = envelope
        .diagnostics()
        .iter()
        .filter_map(|diagnostic| match diagnostic {
            Diagnostic::UnsupportedArgument { argument, .. } => Some(argument.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(unsupported, ["orderBy", "filter"]);
}

#[test]
fn connections_without_a_total_select_nodes_only() {
    let envelope = build("GET_LIST", "profiles", json!({}));
    assert_eq!(
        response_keys(&root_fields(&envelope)[0].selection_set),
        ["nodes"]
    );
}

#[test]
fn get_many_filters_the_list_by_key() {
    let envelope = build("GET_MANY", "books", json!({ "ids": ["1", 2, null] }));
    let root = root_fields(&envelope);
    assert_eq!(root[0].name.as_str(), "books");
    assert_eq!(argument_names(root[0]), ["filter"]);
    assert_eq!(response_keys(&root[0].selection_set), ["nodes"]);
    assert_eq!(
        Value::Object(envelope.variables().clone()),
        json!({ "ids": [1, 2] })
    );
}

#[test]
fn get_many_looks_up_aliased_keys_one_by_one() {
    let envelope = build("GET_MANY", "favoriteBooks", json!({ "ids": ["fb:1", "fb:2"] }));
    assert_eq!(envelope.operation_name(), "favoriteBooks");
    assert_eq!(
        response_keys(&operation(&envelope).selection_set),
        [
            "kfb_1: favoriteBookByNodeId",
            "kfb_2: favoriteBookByNodeId"
        ]
    );
    assert_eq!(
        Value::Object(envelope.variables().clone()),
        json!({ "nodeIdfb_1": "fb:1", "nodeIdfb_2": "fb:2" })
    );
}

#[test]
fn get_many_without_a_filter_argument_lists_everything() {
    let envelope = build("GET_MANY", "authors", json!({ "ids": [1, 2] }));
    assert_eq!(envelope.operation_name(), "authors");
    let root = root_fields(&envelope);
    assert_eq!(root[0].name.as_str(), "authors");
    assert!(argument_names(root[0]).is_empty());
    assert_eq!(response_keys(&root[0].selection_set), ["nodes"]);
    assert!(envelope.variables().is_empty());
}

#[test]
fn get_many_reference_filters_on_the_target() {
    let envelope = build(
        "GET_MANY_REFERENCE",
        "books",
        json!({
            "target": "authorId",
            "id": "3",
            "filter": { "published": true }
        }),
    );
    assert_eq!(envelope.operation_name(), "books");
    assert_eq!(
        envelope.variables()["filter"],
        json!({
            "and": [
                { "authorId": { "equalTo": 3 } },
                { "published": { "equalTo": true } }
            ]
        })
    );
}

#[test]
fn unknown_resources_are_rejected() {
    let err = build_err("GET_ONE", "unknownResources", json!({ "id": 1 }));
    assert_eq!(
        err.to_string(),
        r#"Type "UnknownResource" did not exist in the introspection result."#
    );
}

#[rstest]
#[case("GET_SOMETHING", "books", json!({}), "UNIMPLEMENTED_VERB")]
#[case("GET_ONE", "books", json!({}), "INVALID_REQUEST")]
#[case("GET_MANY", "favoriteBooks", json!({ "ids": [] }), "INVALID_REQUEST")]
#[case("GET_MANY_REFERENCE", "books", json!({ "id": 3 }), "INVALID_REQUEST")]
#[case("GET_LIST", "books", json!({ "filter": { "title": { "op": "eq" } } }), "MALFORMED_FILTER_SPEC")]
#[case("GET_LIST", "books", json!({ "filter": { "author": 1 } }), "UNSUPPORTED_FILTER_SCALAR")]
#[case("GET_LIST", "books", json!({ "pagination": { "page": 10_000_000_000u64, "perPage": 10_000_000_000u64 } }), "INVALID_REQUEST")]
#[case("GET_LIST", "books", json!({ "pagination": { "page": 3, "perPage": 3_000_000_000u64 } }), "INVALID_REQUEST")]
#[case("GET_LIST", "books", json!({ "pagination": { "page": 2_000_000, "perPage": 2_000 } }), "INVALID_REQUEST")]
fn invalid_requests_fail_before_anything_is_sent(
    #[case] verb: &str,
    #[case] resource: &str,
    #[case] params: Value,
    #[case] code: &str,
) {
    assert_eq!(build_err(verb, resource, params).code(), code);
}
