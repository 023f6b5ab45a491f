//! Structured construction of operation documents.
//!
//! Documents are assembled as an [`ast::Document`] and only turned into text by its serializer,
//! so names, literals and aliases never go through string interpolation.

use std::collections::HashSet;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::OperationType;
use serde_json::Map;
use serde_json::Value;

use crate::error::SynthesisError;
use crate::introspection::TypeKind;
use crate::introspection::TypeRef;

/// Validates a GraphQL name.
pub(crate) fn name(value: &str) -> Result<Name, SynthesisError> {
    Name::new(value).map_err(|_| SynthesisError::InvalidName {
        name: value.to_string(),
    })
}

/// An operation under construction, holding variable declarations together with their values so
/// the two can never disagree.
pub(crate) struct OperationBuilder {
    operation_type: OperationType,
    name: Name,
    variable_definitions: Vec<Node<ast::VariableDefinition>>,
    variables: Map<String, Value>,
    selection_set: Vec<ast::Selection>,
}

impl OperationBuilder {
    pub(crate) fn query(operation_name: &str) -> Result<Self, SynthesisError> {
        Self::new(OperationType::Query, operation_name)
    }

    pub(crate) fn mutation(operation_name: &str) -> Result<Self, SynthesisError> {
        Self::new(OperationType::Mutation, operation_name)
    }

    fn new(operation_type: OperationType, operation_name: &str) -> Result<Self, SynthesisError> {
        Ok(Self {
            operation_type,
            name: name(operation_name)?,
            variable_definitions: Vec::new(),
            variables: Map::new(),
            selection_set: Vec::new(),
        })
    }

    /// Declares `$variable: ty` bound to `value` and returns a reference to it.
    pub(crate) fn variable(
        &mut self,
        variable: &str,
        ty: ast::Type,
        value: Value,
    ) -> Result<Node<ast::Value>, SynthesisError> {
        let variable_name = name(variable)?;
        if self.variables.contains_key(variable) {
            return Err(SynthesisError::invalid_request(format!(
                "variable `${variable}` is declared twice"
            )));
        }
        self.variable_definitions
            .push(Node::new(ast::VariableDefinition {
                name: variable_name.clone(),
                ty: Node::new(ty),
                default_value: None,
                directives: Default::default(),
            }));
        self.variables.insert(variable.to_string(), value);
        Ok(Node::new(ast::Value::Variable(variable_name)))
    }

    pub(crate) fn select(&mut self, selection: ast::Selection) {
        self.selection_set.push(selection);
    }

    pub(crate) fn build(self) -> (ast::Document, Map<String, Value>) {
        let mut document = ast::Document::new();
        document
            .definitions
            .push(ast::Definition::OperationDefinition(Node::new(
                ast::OperationDefinition {
                    operation_type: self.operation_type,
                    name: Some(self.name),
                    variables: self.variable_definitions,
                    directives: Default::default(),
                    selection_set: self.selection_set,
                },
            )));
        (document, self.variables)
    }
}

/// A field selection.
pub(crate) fn field(
    alias: Option<Name>,
    field_name: Name,
    arguments: Vec<Node<ast::Argument>>,
    selection_set: Vec<ast::Selection>,
) -> ast::Selection {
    ast::Selection::Field(Node::new(ast::Field {
        alias,
        name: field_name,
        arguments,
        directives: Default::default(),
        selection_set,
    }))
}

/// A leaf field selection without alias or arguments.
pub(crate) fn leaf(field_name: &str) -> Result<ast::Selection, SynthesisError> {
    Ok(field(None, name(field_name)?, Vec::new(), Vec::new()))
}

pub(crate) fn argument(
    argument_name: &str,
    value: Node<ast::Value>,
) -> Result<Node<ast::Argument>, SynthesisError> {
    Ok(Node::new(ast::Argument {
        name: name(argument_name)?,
        value,
    }))
}

/// Converts a JSON value into a GraphQL literal. Object keys must be valid names.
pub(crate) fn literal(value: &Value) -> Result<ast::Value, SynthesisError> {
    Ok(match value {
        Value::Null => ast::Value::Null,
        Value::Bool(boolean) => ast::Value::Boolean(*boolean),
        Value::Number(number) if number.is_f64() => {
            ast::Value::Float(ast::FloatValue::new_parsed(&number.to_string()))
        }
        Value::Number(number) => ast::Value::Int(ast::IntValue::new_parsed(&number.to_string())),
        Value::String(string) => ast::Value::String(string.clone()),
        Value::Array(items) => ast::Value::List(
            items
                .iter()
                .map(|item| literal(item).map(Node::new))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(object) => ast::Value::Object(
            object
                .iter()
                .map(|(key, item)| Ok((name(key)?, Node::new(literal(item)?))))
                .collect::<Result<_, SynthesisError>>()?,
        ),
    })
}

/// Converts an introspected type reference into a type usable in a variable declaration.
pub(crate) fn to_ast_type(ty: &TypeRef) -> Result<ast::Type, SynthesisError> {
    let malformed = || SynthesisError::InvalidIntrospection {
        reason: "type reference is missing its wrapped type or name".to_string(),
    };
    match ty.kind {
        TypeKind::NonNull => {
            let inner = ty.of_type.as_deref().ok_or_else(malformed)?;
            match to_ast_type(inner)? {
                ast::Type::Named(named) => Ok(ast::Type::NonNullNamed(named)),
                ast::Type::List(list) => Ok(ast::Type::NonNullList(list)),
                ast::Type::NonNullNamed(_) | ast::Type::NonNullList(_) => Err(malformed()),
            }
        }
        TypeKind::List => {
            let inner = ty.of_type.as_deref().ok_or_else(malformed)?;
            Ok(ast::Type::List(Box::new(to_ast_type(inner)?)))
        }
        _ => {
            let type_name = ty.name.as_deref().ok_or_else(malformed)?;
            Ok(ast::Type::Named(name(type_name)?))
        }
    }
}

/// Replaces every character that may not appear in a name with `_`.
pub(crate) fn escape(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Hands out aliases and variable names derived from caller values, unique within one document.
#[derive(Default)]
pub(crate) struct AliasAllocator {
    used: HashSet<String>,
}

impl AliasAllocator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `prefix` followed by the escaped `raw` value, suffixed with a counter on collision.
    pub(crate) fn allocate(&mut self, prefix: &str, raw: &str) -> Result<Name, SynthesisError> {
        let base = format!("{prefix}{}", escape(raw));
        let mut candidate = base.clone();
        let mut counter = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{base}_{counter}");
            counter += 1;
        }
        let alias = name(&candidate)?;
        self.used.insert(candidate);
        Ok(alias)
    }
}
