//! Field selection for a resource type.

use apollo_compiler::Node;
use apollo_compiler::ast;

use crate::configuration::Naming;
use crate::diagnostics::Diagnostic;
use crate::diagnostics::Diagnostics;
use crate::document;
use crate::error::SynthesisError;
use crate::introspection::Field;
use crate::introspection::NamedType;
use crate::request::Verb;
use crate::schema::PrimaryKey;
use crate::schema::SchemaIndex;
use crate::type_config::TypeConfigMap;

/// Computes the selection set requested for a type.
///
/// Projection is a pure function of its inputs; every call starts from scratch.
#[derive(Clone, Copy)]
pub struct FieldProjector<'a> {
    index: &'a SchemaIndex,
    type_configs: &'a TypeConfigMap,
    naming: &'a Naming,
}

impl<'a> FieldProjector<'a> {
    pub fn new(index: &'a SchemaIndex, type_configs: &'a TypeConfigMap, naming: &'a Naming) -> Self {
        Self {
            index,
            type_configs,
            naming,
        }
    }

    /// The selection set of `type_name` when building a `verb` request.
    ///
    /// `primary_key` is the key of the resource being selected. When it requires an alias its
    /// identity field is surfaced under the uniform identifier name.
    pub fn project(
        &self,
        type_name: &str,
        primary_key: Option<&PrimaryKey>,
        verb: Verb,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<ast::Selection>, SynthesisError> {
        let ty = self
            .index
            .get_type(type_name)
            .ok_or_else(|| SynthesisError::ResourceTypeUnresolved(type_name.to_string()))?;
        let mut path = vec![ty.name.clone()];
        let selections = self.project_type(ty, primary_key, verb, &mut path, diagnostics)?;
        if selections.is_empty() {
            return Err(SynthesisError::invalid_request(format!(
                "no field of `{type_name}` can be selected"
            )));
        }
        Ok(selections)
    }

    fn project_type(
        &self,
        ty: &NamedType,
        primary_key: Option<&PrimaryKey>,
        verb: Verb,
        path: &mut Vec<String>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<ast::Selection>, SynthesisError> {
        let mut selections = Vec::new();
        for field in &ty.fields {
            if let Some(selection) =
                self.project_field(ty, field, primary_key, verb, path, diagnostics)?
            {
                selections.push(selection);
            }
        }
        Ok(selections)
    }

    fn project_field(
        &self,
        owner: &NamedType,
        field: &Field,
        primary_key: Option<&PrimaryKey>,
        verb: Verb,
        path: &mut Vec<String>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<ast::Selection>, SynthesisError> {
        let owner_config = self.type_configs.get(&owner.name);
        let dropped = |diagnostics: &mut Diagnostics, diagnostic| {
            diagnostics.push(diagnostic);
            Ok(None)
        };

        if field.has_required_arguments() && owner_config.is_none() {
            return dropped(
                diagnostics,
                Diagnostic::UnconfiguredArgumentedField {
                    type_name: owner.name.clone(),
                    field: field.name.clone(),
                },
            );
        }

        if owner_config.is_some_and(|config| !config.is_field_visible(&field.name, verb)) {
            return dropped(
                diagnostics,
                Diagnostic::HiddenField {
                    type_name: owner.name.clone(),
                    field: field.name.clone(),
                },
            );
        }

        let mut alias = None;
        if let Some(primary_key) = primary_key.filter(|primary_key| primary_key.alias_required) {
            if field.name == primary_key.identity_field {
                alias = Some(document::name(&self.naming.identifier_name)?);
            } else if field.name == self.naming.identifier_name {
                // The uniform identifier is taken by the aliased identity field.
                return dropped(
                    diagnostics,
                    Diagnostic::HiddenField {
                        type_name: owner.name.clone(),
                        field: field.name.clone(),
                    },
                );
            }
        }

        let mut arguments = Vec::new();
        if !field.args.is_empty() {
            if let Some(computed) =
                owner_config.and_then(|config| config.arguments_for_field(&field.name, &field.args))
            {
                for (name, value) in &computed {
                    arguments.push(document::argument(
                        name,
                        Node::new(document::literal(value)?),
                    )?);
                }
            }
            let missing_required = field.args.iter().any(|arg| {
                arg.is_required()
                    && !arguments
                        .iter()
                        .any(|provided| provided.name.as_str() == arg.name.as_str())
            });
            if missing_required {
                return dropped(
                    diagnostics,
                    Diagnostic::MissingFieldArguments {
                        type_name: owner.name.clone(),
                        field: field.name.clone(),
                    },
                );
            }
        }

        let base = field.ty.base();
        let field_type = base.name.as_deref().unwrap_or_default();
        let selection_set = if base.kind.is_composite() {
            let expand = self
                .type_configs
                .get(field_type)
                .is_some_and(|config| config.is_expanded());
            if !expand {
                return dropped(
                    diagnostics,
                    Diagnostic::UnexpandedField {
                        type_name: owner.name.clone(),
                        field: field.name.clone(),
                        field_type: field_type.to_string(),
                    },
                );
            }
            if path.iter().any(|visited| visited == field_type) {
                return dropped(
                    diagnostics,
                    Diagnostic::RecursiveField {
                        type_name: owner.name.clone(),
                        field: field.name.clone(),
                        field_type: field_type.to_string(),
                    },
                );
            }
            let Some(nested) = self.index.get_type(field_type) else {
                return Err(SynthesisError::ResourceTypeUnresolved(field_type.to_string()));
            };
            path.push(nested.name.clone());
            let selection_set = self.project_type(nested, None, verb, path, diagnostics);
            path.pop();
            let selection_set = selection_set?;
            if selection_set.is_empty() {
                return dropped(
                    diagnostics,
                    Diagnostic::EmptySelection {
                        type_name: owner.name.clone(),
                        field: field.name.clone(),
                        field_type: field_type.to_string(),
                    },
                );
            }
            selection_set
        } else {
            Vec::new()
        };

        Ok(Some(document::field(
            alias,
            document::name(&field.name)?,
            arguments,
            selection_set,
        )))
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::Schema;
    use pretty_assertions::assert_eq;
    use serde_json::Map;
    use serde_json::json;

    use super::*;
    use crate::introspection::IntrospectionSchema;
    use crate::schema::Resource;
    use crate::schema::primary_key;
    use crate::type_config::FieldSelector;
    use crate::type_config::TypeConfig;

    const SDL: &str = r#"
        type Query {
          book(id: Int!): Book
          favoriteBookByNodeId(nodeId: ID!): FavoriteBook
          favoriteBook(isbn: String!): FavoriteBook
        }
        type Book {
          id: Int!
          title: String
          genre: Genre
          tags: [String!]
          author: Author
          location: GeometryPoint
          greet(name: String!, punctuation: String): String
          words(limit: Int): [String]
        }
        type Author { id: Int! name: String books: [Book!]! }
        type GeometryPoint { x: Float y: Float geojson: String }
        type FavoriteBook { nodeId: ID! id: Int isbn: String! title: String }
        enum Genre { FICTION ESSAY }
    "#;

    fn index() -> SchemaIndex {
        let schema = Schema::parse_and_validate(SDL, "schema.graphql").unwrap();
        SchemaIndex::new(&IntrospectionSchema::from_schema(&schema))
    }

    fn project(
        type_configs: &TypeConfigMap,
        type_name: &str,
        primary_key: Option<&PrimaryKey>,
    ) -> (String, Diagnostics) {
        let index = index();
        let naming = Naming::default();
        let mut diagnostics = Diagnostics::new();
        let selections = FieldProjector::new(&index, type_configs, &naming)
            .project(type_name, primary_key, Verb::GetOne, &mut diagnostics)
            .unwrap();
        let mut operation = document::OperationBuilder::query("Root").unwrap();
        operation.select(document::field(
            None,
            document::name("root").unwrap(),
            Vec::new(),
            selections,
        ));
        let (document, _) = operation.build();
        let text = document.serialize().no_indent().to_string();
        let selection = text
            .trim()
            .strip_prefix("query Root { ")
            .and_then(|text| text.strip_suffix(" }"))
            .unwrap();
        (selection.to_string(), diagnostics)
    }

    #[test]
    fn defaults_select_leaves_and_expand_geometry() {
        let (selection, diagnostics) = project(&TypeConfigMap::built_in(), "Book", None);
        assert_eq!(
            selection,
            "root { id title genre tags location { x y geojson } words }"
        );
        let dropped = diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(
            dropped,
            vec![
                "`Book.author` is of type `Author` which is not expanded",
                "`Book.greet` requires arguments and `Book` has no configuration",
            ]
        );
    }

    #[test]
    fn included_object_fields_still_need_expansion() {
        let type_configs = TypeConfigMap::new().with(
            "Book",
            TypeConfig::new().include_fields(FieldSelector::names(["id", "author"])),
        );
        let (selection, _) = project(&type_configs, "Book", None);
        assert_eq!(selection, "root { id }");
    }

    #[test]
    fn arguments_are_synthesized_from_configuration() {
        let type_configs = TypeConfigMap::new().with(
            "Book",
            TypeConfig::new()
                .include_fields(FieldSelector::names(["id", "greet"]))
                .compute_arguments_for_field(|field, args| {
                    assert_eq!(field, "greet");
                    assert_eq!(args.len(), 2);
                    let mut arguments = Map::new();
                    arguments.insert("name".to_string(), json!("Ada"));
                    Some(arguments)
                }),
        );
        let (selection, _) = project(&type_configs, "Book", None);
        assert_eq!(selection, r#"root { id greet(name: "Ada") }"#);
    }

    #[test]
    fn required_arguments_left_unsynthesized_drop_the_field() {
        let type_configs = TypeConfigMap::new().with("Book", TypeConfig::new());
        let (selection, diagnostics) = project(&type_configs, "Book", None);
        assert!(!selection.contains("greet"));
        assert!(diagnostics.iter().any(|diagnostic| matches!(
            diagnostic,
            Diagnostic::MissingFieldArguments { field, .. } if field == "greet"
        )));
    }

    #[test]
    fn mutually_expanded_types_stop_at_the_cycle() {
        let type_configs = TypeConfigMap::new()
            .with("Author", TypeConfig::new().expand(true))
            .with(
                "Book",
                TypeConfig::new()
                    .expand(true)
                    .exclude_fields(FieldSelector::names(["greet", "words", "location"])),
            );
        let (selection, diagnostics) = project(&type_configs, "Book", None);
        assert_eq!(selection, "root { id title genre tags author { id name } }");
        assert!(diagnostics.iter().any(|diagnostic| matches!(
            diagnostic,
            Diagnostic::RecursiveField { field, .. } if field == "books"
        )));
    }

    #[test]
    fn aliased_keys_surface_the_uniform_identifier() {
        let index = index();
        let naming = Naming::default();
        let key =
            primary_key::resolve(&index, &Resource::new("favoriteBook").unwrap(), &naming).unwrap();
        let (selection, _) = project(&TypeConfigMap::new(), "FavoriteBook", Some(&key));
        assert_eq!(selection, "root { id: nodeId isbn title }");
    }
}
