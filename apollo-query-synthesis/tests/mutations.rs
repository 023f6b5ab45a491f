use apollo_compiler::ast::OperationType;
use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;

use crate::common::argument_names;
use crate::common::build;
use crate::common::build_err;
use crate::common::child;
use crate::common::operation;
use crate::common::response_keys;
use crate::common::root_fields;

#[test_log::test]
fn create_maps_data_onto_the_input_type() {
    let envelope = build(
        "CREATE",
        "books",
        json!({
            "data": {
                "title": "Dune",
                "authorId": 3,
                "location": {
                    "x": 1.5,
                    "y": 2.5,
                    "geojson": { "type": "Point", "coordinates": [1.5, 2.5] }
                },
                "author": { "name": "Frank Herbert" }
            }
        }),
    );
    assert_eq!(operation(&envelope).operation_type, OperationType::Mutation);
    assert_eq!(envelope.operation_name(), "createBook");
    let root = root_fields(&envelope);
    assert_eq!(root[0].name.as_str(), "createBook");
    assert_eq!(argument_names(root[0]), ["input"]);
    assert_eq!(response_keys(&root[0].selection_set), ["book"]);
    assert_eq!(
        Value::Object(envelope.variables().clone()),
        json!({
            "input": {
                "book": {
                    "title": "Dune",
                    "authorId": 3,
                    "location": { "type": "Point", "coordinates": [1.5, 2.5] }
                }
            }
        })
    );
}

#[test]
fn create_uses_the_record_field_of_the_resource() {
    let envelope = build(
        "CREATE",
        "favoriteBooks",
        json!({ "data": { "isbn": "978-0", "rating": 4 } }),
    );
    assert_eq!(
        Value::Object(envelope.variables().clone()),
        json!({ "input": { "favoriteBook": { "isbn": "978-0", "rating": 4 } } })
    );
    assert_eq!(
        response_keys(&child(root_fields(&envelope)[0], "favoriteBook").selection_set),
        ["id: nodeId", "isbn", "title", "rating"]
    );
}

#[test]
fn update_sends_the_identifier_and_a_patch() {
    let envelope = build(
        "UPDATE",
        "books",
        json!({
            "id": "7",
            "data": { "id": 7, "title": "Dune Messiah", "nodeId": "WyJib29rcyIsN10=" },
            "previousData": { "id": 7, "title": "Dune" }
        }),
    );
    assert_eq!(envelope.operation_name(), "updateBook");
    assert_eq!(
        Value::Object(envelope.variables().clone()),
        json!({
            "input": {
                "id": 7,
                "patch": { "id": 7, "title": "Dune Messiah" }
            }
        })
    );
}

#[test]
fn aliased_keys_are_updated_through_the_node_identifier() {
    let envelope = build(
        "UPDATE",
        "favoriteBooks",
        json!({ "id": "fb:1", "data": { "rating": 5 } }),
    );
    assert_eq!(envelope.operation_name(), "updateFavoriteBookByNodeId");
    assert_eq!(
        Value::Object(envelope.variables().clone()),
        json!({ "input": { "nodeId": "fb:1", "patch": { "rating": 5 } } })
    );
}

#[test]
fn delete_selects_the_deleted_record() {
    let envelope = build("DELETE", "books", json!({ "id": 7 }));
    assert_eq!(envelope.operation_name(), "deleteBook");
    assert_eq!(
        Value::Object(envelope.variables().clone()),
        json!({ "input": { "id": 7 } })
    );

    let envelope = build(
        "DELETE",
        "profiles",
        json!({ "id": "02d07429-c2a7-4494-aec9-e8bde9176e86" }),
    );
    let root = root_fields(&envelope);
    assert_eq!(root[0].name.as_str(), "deleteProfile");
    assert_eq!(
        response_keys(&child(root[0], "profile").selection_set),
        ["id", "handle"]
    );
}

#[test_log::test]
fn update_many_aliases_one_update_per_identifier() {
    let envelope = build(
        "UPDATE_MANY",
        "books",
        json!({ "ids": ["51231", "3221123"], "data": { "published": true } }),
    );
    assert_eq!(envelope.operation_name(), "updateManyBook");
    let root = root_fields(&envelope);
    assert_eq!(
        response_keys(&operation(&envelope).selection_set),
        ["update51231: updateBook", "update3221123: updateBook"]
    );
    for field in root {
        assert_eq!(response_keys(&field.selection_set), ["clientMutationId"]);
    }
    assert_eq!(
        Value::Object(envelope.variables().clone()),
        json!({
            "arg51231": {
                "id": 51231,
                "clientMutationId": "51231",
                "patch": { "published": true }
            },
            "arg3221123": {
                "id": 3221123,
                "clientMutationId": "3221123",
                "patch": { "published": true }
            }
        })
    );
}

#[test]
fn delete_many_without_mutation_ids_selects_the_typename() {
    let envelope = build(
        "DELETE_MANY",
        "profiles",
        json!({
            "ids": [
                "02d07429-c2a7-4494-aec9-e8bde9176e86",
                "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d"
            ]
        }),
    );
    assert_eq!(envelope.operation_name(), "deleteManyProfile");
    assert_eq!(
        response_keys(&operation(&envelope).selection_set),
        [
            "k02d07429_c2a7_4494_aec9_e8bde9176e86: deleteProfile",
            "k9b1deb4d_3b7d_4bad_9bdd_2b0d7b3dcb6d: deleteProfile"
        ]
    );
    for field in root_fields(&envelope) {
        assert_eq!(response_keys(&field.selection_set), ["__typename"]);
    }
    assert_eq!(
        envelope.variables()["arg02d07429_c2a7_4494_aec9_e8bde9176e86"],
        json!({ "id": "02d07429-c2a7-4494-aec9-e8bde9176e86" })
    );
}

#[test]
fn repeated_identifiers_get_distinct_aliases() {
    let envelope = build("DELETE_MANY", "books", json!({ "ids": [4, "4"] }));
    assert_eq!(
        response_keys(&operation(&envelope).selection_set),
        ["k4: deleteBook", "k4_1: deleteBook"]
    );
}

#[test]
fn batch_verbs_need_identifiers() {
    assert_eq!(
        build_err("UPDATE_MANY", "books", json!({ "ids": [] })).code(),
        "INVALID_REQUEST"
    );
    assert_eq!(
        build_err("DELETE_MANY", "books", json!({ "ids": [null] })).code(),
        "INVALID_REQUEST"
    );
    assert_eq!(
        build_err("UPDATE", "books", json!({ "data": {} })).code(),
        "INVALID_REQUEST"
    );
}
