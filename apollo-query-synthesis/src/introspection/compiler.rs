use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::ast::OperationType;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::FieldDefinition;
use apollo_compiler::schema::InputValueDefinition;

use super::EnumValue;
use super::Field;
use super::InputValue;
use super::IntrospectionSchema;
use super::NamedType;
use super::Operation;
use super::TypeKind;
use super::TypeRef;

impl IntrospectionSchema {
    /// Builds the introspection model from an SDL schema, producing what an introspection query
    /// against a server exposing `schema` would return.
    pub fn from_schema(schema: &Schema) -> Self {
        let types = schema
            .types
            .iter()
            .filter(|(name, _)| !name.starts_with("__"))
            .map(|(name, ty)| named_type(schema, name.as_str(), ty))
            .collect::<Vec<_>>();

        let queries = [OperationType::Query, OperationType::Mutation]
            .into_iter()
            .filter_map(|operation_type| schema.root_operation(operation_type))
            .filter_map(|root| types.iter().find(|ty| ty.name == root.as_str()))
            .flat_map(|root| root.fields.iter().cloned().map(Operation::from))
            .collect();

        Self { types, queries }
    }
}

fn named_type(schema: &Schema, name: &str, ty: &ExtendedType) -> NamedType {
    let mut named = NamedType {
        kind: kind_of(ty),
        name: name.to_string(),
        fields: Vec::new(),
        input_fields: Vec::new(),
        enum_values: Vec::new(),
    };
    match ty {
        ExtendedType::Object(object) => {
            named.fields = object
                .fields
                .values()
                .map(|field| field_of(schema, field))
                .collect();
        }
        ExtendedType::Interface(interface) => {
            named.fields = interface
                .fields
                .values()
                .map(|field| field_of(schema, field))
                .collect();
        }
        ExtendedType::InputObject(input) => {
            named.input_fields = input
                .fields
                .values()
                .map(|field| input_value_of(schema, field))
                .collect();
        }
        ExtendedType::Enum(enumeration) => {
            named.enum_values = enumeration
                .values
                .keys()
                .map(|value| EnumValue {
                    name: value.to_string(),
                })
                .collect();
        }
        ExtendedType::Scalar(_) | ExtendedType::Union(_) => {}
    }
    named
}

fn kind_of(ty: &ExtendedType) -> TypeKind {
    match ty {
        ExtendedType::Scalar(_) => TypeKind::Scalar,
        ExtendedType::Object(_) => TypeKind::Object,
        ExtendedType::Interface(_) => TypeKind::Interface,
        ExtendedType::Union(_) => TypeKind::Union,
        ExtendedType::Enum(_) => TypeKind::Enum,
        ExtendedType::InputObject(_) => TypeKind::InputObject,
    }
}

fn field_of(schema: &Schema, field: &FieldDefinition) -> Field {
    Field {
        name: field.name.to_string(),
        args: field
            .arguments
            .iter()
            .map(|arg| input_value_of(schema, arg))
            .collect(),
        ty: type_ref(schema, &field.ty),
    }
}

fn input_value_of(schema: &Schema, value: &InputValueDefinition) -> InputValue {
    InputValue {
        name: value.name.to_string(),
        ty: type_ref(schema, &value.ty),
        default_value: value.default_value.as_ref().map(|value| value.to_string()),
    }
}

fn type_ref(schema: &Schema, ty: &ast::Type) -> TypeRef {
    match ty {
        ast::Type::Named(name) => named_ref(schema, name),
        ast::Type::NonNullNamed(name) => TypeRef::non_null(named_ref(schema, name)),
        ast::Type::List(inner) => TypeRef::list(type_ref(schema, inner)),
        ast::Type::NonNullList(inner) => TypeRef::non_null(TypeRef::list(type_ref(schema, inner))),
    }
}

fn named_ref(schema: &Schema, name: &ast::NamedType) -> TypeRef {
    // Undefined names only occur in invalid schemas; treat them as opaque scalars.
    let kind = schema
        .types
        .get(name)
        .map(kind_of)
        .unwrap_or(TypeKind::Scalar);
    TypeRef::named(kind, name.as_str())
}
