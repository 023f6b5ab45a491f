//! A serde model of a GraphQL introspection result.
//!
//! Only the parts the synthesizer consults are modelled: named types with their fields, input
//! fields and enum values, and the root operations (the fields of the query and mutation root
//! types), each with its argument list.

mod compiler;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::SynthesisError;

/// The `__TypeKind` of a type or type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

impl TypeKind {
    /// Types whose values need a selection set when queried.
    pub fn is_composite(self) -> bool {
        matches!(self, TypeKind::Object | TypeKind::Interface | TypeKind::Union)
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, TypeKind::Scalar | TypeKind::Enum)
    }
}

/// A possibly wrapped reference to a named type, as found in `type` and `ofType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<TypeRef>>,
}

impl TypeRef {
    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            of_type: None,
        }
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self {
            kind: TypeKind::NonNull,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    pub fn list(inner: TypeRef) -> Self {
        Self {
            kind: TypeKind::List,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    pub fn is_non_null(&self) -> bool {
        self.kind == TypeKind::NonNull
    }

    /// Strips a single non-null wrapper, if present.
    pub fn nullable(&self) -> &TypeRef {
        match (&self.kind, &self.of_type) {
            (TypeKind::NonNull, Some(inner)) => inner,
            _ => self,
        }
    }

    /// Strips every list and non-null wrapper.
    pub fn base(&self) -> &TypeRef {
        let mut current = self;
        while let Some(inner) = &current.of_type {
            current = inner;
        }
        current
    }

    pub fn base_name(&self) -> Option<&str> {
        self.base().name.as_deref()
    }
}

/// An argument or input object field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValue {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub default_value: Option<String>,
}

impl InputValue {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value: None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}

/// A field of an object or interface type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub args: Vec<InputValue>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl Field {
    pub fn has_required_arguments(&self) -> bool {
        self.args.iter().any(InputValue::is_required)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
}

/// An entry of `__schema.types`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedType {
    pub kind: TypeKind,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub fields: Vec<Field>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub input_fields: Vec<InputValue>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub enum_values: Vec<EnumValue>,
}

impl NamedType {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn input_field(&self, name: &str) -> Option<&InputValue> {
        self.input_fields.iter().find(|field| field.name == name)
    }

    pub fn has_enum_value(&self, name: &str) -> bool {
        self.enum_values.iter().any(|value| value.name == name)
    }
}

/// A root operation: a field of the query or mutation root type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub args: Vec<InputValue>,
    /// The return type. Some producers of `queries` omit it.
    #[serde(rename = "type", default)]
    pub ty: Option<TypeRef>,
}

impl Operation {
    pub fn argument(&self, name: &str) -> Option<&InputValue> {
        self.args.iter().find(|arg| arg.name == name)
    }
}

impl From<Field> for Operation {
    fn from(field: Field) -> Self {
        Self {
            name: field.name,
            args: field.args,
            ty: Some(field.ty),
        }
    }
}

/// The introspection result handed to the synthesizer. Never mutated once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionSchema {
    #[serde(default)]
    pub types: Vec<NamedType>,
    #[serde(default)]
    pub queries: Vec<Operation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchema {
    #[serde(default)]
    query_type: Option<RootTypeName>,
    #[serde(default)]
    mutation_type: Option<RootTypeName>,
    #[serde(default)]
    types: Vec<NamedType>,
}

#[derive(Deserialize)]
struct RootTypeName {
    name: String,
}

impl IntrospectionSchema {
    /// Reads the response of a standard introspection query.
    ///
    /// Accepts the full response (`{"data": {"__schema": …}}`), its data (`{"__schema": …}`) or
    /// the schema object itself. The root operations are the fields of the query and mutation
    /// root types.
    pub fn from_introspection_response(response: &Value) -> Result<Self, SynthesisError> {
        let schema = response
            .get("data")
            .unwrap_or(response)
            .get("__schema")
            .or_else(|| response.get("__schema"))
            .unwrap_or(response);
        let raw: RawSchema = serde_json::from_value(schema.clone()).map_err(|err| {
            SynthesisError::InvalidIntrospection {
                reason: err.to_string(),
            }
        })?;

        let roots = [raw.query_type, raw.mutation_type]
            .into_iter()
            .flatten()
            .map(|root| root.name)
            .collect::<Vec<_>>();
        if roots.is_empty() {
            return Err(SynthesisError::InvalidIntrospection {
                reason: "schema declares neither a query nor a mutation type".to_string(),
            });
        }
        let queries = raw
            .types
            .iter()
            .filter(|ty| roots.contains(&ty.name))
            .flat_map(|ty| ty.fields.iter().cloned().map(Operation::from))
            .collect();

        Ok(Self {
            types: raw.types,
            queries,
        })
    }
}

// NOTE: this deserialize helper is used to transform `null` to Default::default()
pub(crate) fn deserialize_null_default<'de, D, T: Default + Deserialize<'de>>(
    deserializer: D,
) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
{
    <Option<T>>::deserialize(deserializer).map(|x| x.unwrap_or_default())
}
