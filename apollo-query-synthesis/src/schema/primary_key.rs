use crate::configuration::Naming;
use crate::error::SynthesisError;
use crate::schema::Resource;
use crate::schema::SchemaIndex;

/// Arguments of a single-record operation that never name the primary key.
pub const RESERVED_ARGUMENTS: [&str; 6] = ["first", "last", "offset", "before", "after", "filter"];

/// How records of one resource type are identified and addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    /// The backend key field.
    pub field_name: String,
    /// The scalar type of the key field.
    pub scalar_type: String,
    /// The argument single-record operations take the identifier under.
    pub id_argument_name: String,
    /// The scalar type of `id_argument_name`.
    pub id_argument_type: String,
    pub single_record_operation_name: String,
    pub delete_operation_name: String,
    pub update_operation_name: String,
    /// Whether the key field is surfaced under the uniform identifier name by an alias.
    pub alias_required: bool,
    /// The backend field surfaced as the uniform identifier.
    pub identity_field: String,
}

/// Resolves the primary key of `resource`.
///
/// The first argument of the single-record operation that is not a pagination or filter
/// argument names the key field, `naming.identifier_name` when there is none. A key that is not
/// the uniform identifier is addressed through the synthetic identifier instead, with operation
/// names carrying the aliased operation suffix.
pub(crate) fn resolve(
    index: &SchemaIndex,
    resource: &Resource,
    naming: &Naming,
) -> Result<PrimaryKey, SynthesisError> {
    let resource_type = index
        .get_type(&resource.type_name)
        .ok_or_else(|| SynthesisError::ResourceTypeUnresolved(resource.type_name.clone()))?;

    let field_name = index
        .operation(&resource.single)
        .and_then(|operation| {
            operation
                .args
                .iter()
                .find(|arg| !RESERVED_ARGUMENTS.contains(&arg.name.as_str()))
        })
        .map(|arg| arg.name.clone())
        .unwrap_or_else(|| naming.identifier_name.clone());

    let scalar_type = resource_type
        .field(&field_name)
        .and_then(|field| field.ty.nullable().base_name())
        .ok_or_else(|| SynthesisError::PrimaryKeyUnresolvable {
            type_name: resource.type_name.clone(),
            field: field_name.clone(),
        })?
        .to_string();

    let primary_key = if field_name == naming.identifier_name {
        PrimaryKey {
            id_argument_name: field_name.clone(),
            id_argument_type: scalar_type.clone(),
            single_record_operation_name: resource.single.clone(),
            delete_operation_name: format!("delete{}", resource.type_name),
            update_operation_name: format!("update{}", resource.type_name),
            alias_required: false,
            identity_field: field_name.clone(),
            field_name,
            scalar_type,
        }
    } else {
        let suffix = &naming.aliased_operation_suffix;
        let single_record_operation_name = format!("{}{suffix}", resource.single);
        let id_argument_type = index
            .argument(&single_record_operation_name, &naming.synthetic_identifier)
            .and_then(|arg| arg.ty.base_name())
            .unwrap_or("ID")
            .to_string();
        let identity_field = if resource_type.field(&naming.synthetic_identifier).is_some() {
            naming.synthetic_identifier.clone()
        } else {
            field_name.clone()
        };
        PrimaryKey {
            id_argument_name: naming.synthetic_identifier.clone(),
            id_argument_type,
            single_record_operation_name,
            delete_operation_name: format!("delete{}{suffix}", resource.type_name),
            update_operation_name: format!("update{}{suffix}", resource.type_name),
            alias_required: true,
            identity_field,
            field_name,
            scalar_type,
        }
    };
    tracing::debug!(
        type_name = %resource.type_name,
        field = %primary_key.field_name,
        alias_required = primary_key.alias_required,
        "resolved primary key"
    );
    Ok(primary_key)
}
