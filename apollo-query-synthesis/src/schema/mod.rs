//! Lookup structures over an introspection result.

pub(crate) mod primary_key;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

use indexmap::IndexMap;
use inflector::Inflector;
use parking_lot::RwLock;

pub use self::primary_key::PrimaryKey;
use crate::configuration::Naming;
use crate::error::SynthesisError;
use crate::introspection::InputValue;
use crate::introspection::IntrospectionSchema;
use crate::introspection::NamedType;
use crate::introspection::Operation;
use crate::introspection::TypeKind;

/// Type name to type.
pub type TypeMap = IndexMap<String, NamedType>;

/// Root operation name to operation.
pub type QueryMap = IndexMap<String, Operation>;

/// Indexes types by name. The last of several types sharing a name wins.
pub fn index_types(types: &[NamedType]) -> TypeMap {
    types
        .iter()
        .map(|ty| (ty.name.clone(), ty.clone()))
        .collect()
}

/// Indexes root operations by name. The last of several operations sharing a name wins.
pub fn index_operations(operations: &[Operation]) -> QueryMap {
    operations
        .iter()
        .map(|operation| (operation.name.clone(), operation.clone()))
        .collect()
}

/// The names derived from a resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// `FavoriteBook`
    pub type_name: String,
    /// `favoriteBook`, the single-record operation and the mutation payload field.
    pub single: String,
    /// `favoriteBooks`, the list operation.
    pub plural: String,
}

impl Resource {
    /// Derives the names for a resource given in any case and number: `favoriteBooks`,
    /// `favoriteBook` and `FavoriteBook` all name the `FavoriteBook` type.
    pub fn new(resource_name: &str) -> Result<Self, SynthesisError> {
        if resource_name.is_empty() {
            return Err(SynthesisError::invalid_request("the resource name is empty"));
        }
        let singular = resource_name.to_singular();
        let type_name = capitalize(&singular);
        let single = lowercase(&type_name);
        let plural = single.to_plural();
        Ok(Self {
            type_name,
            single,
            plural,
        })
    }
}

pub(crate) fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn lowercase(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name-keyed indexes over an introspection result and the capability checks made against them.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    types: TypeMap,
    queries: QueryMap,
}

impl SchemaIndex {
    pub fn new(introspection: &IntrospectionSchema) -> Self {
        Self {
            types: index_types(&introspection.types),
            queries: index_operations(&introspection.queries),
        }
    }

    pub fn get_type(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.queries.get(name)
    }

    /// The declared argument `argument` of root operation `operation`.
    pub fn argument(&self, operation: &str, argument: &str) -> Option<&InputValue> {
        self.operation(operation)
            .and_then(|operation| operation.argument(argument))
    }

    pub fn supports_argument(&self, operation: &str, argument: &str) -> bool {
        self.argument(operation, argument).is_some()
    }

    /// The ordering enum behind `argument` of `operation`, when it offers any ordering besides
    /// `natural`.
    pub fn ordering_enum(&self, operation: &str, argument: &str, natural: &str) -> Option<&NamedType> {
        let ordering = self
            .argument(operation, argument)?
            .ty
            .base_name()
            .and_then(|name| self.get_type(name))?;
        let non_trivial = ordering.kind == TypeKind::Enum
            && ordering
                .enum_values
                .iter()
                .any(|value| value.name != natural);
        non_trivial.then_some(ordering)
    }

    /// The named type `operation` returns, with list and non-null wrappers removed.
    pub fn return_type(&self, operation: &str) -> Option<&NamedType> {
        self.operation(operation)?
            .ty
            .as_ref()?
            .base_name()
            .and_then(|name| self.get_type(name))
    }

    /// The named type of the input object `argument` of `operation` accepts.
    pub fn argument_type(&self, operation: &str, argument: &str) -> Option<&NamedType> {
        self.argument(operation, argument)?
            .ty
            .base_name()
            .and_then(|name| self.get_type(name))
    }
}

/// Owns an introspection result, builds its [`SchemaIndex`] on first use and caches the primary
/// key of every resource type it resolves.
///
/// Both caches are pure functions of the introspection result, which never changes once the
/// registry is built.
#[derive(Debug)]
pub struct SchemaRegistry {
    introspection: IntrospectionSchema,
    index: OnceLock<SchemaIndex>,
    primary_keys: RwLock<HashMap<String, Arc<PrimaryKey>>>,
}

impl SchemaRegistry {
    pub fn new(introspection: IntrospectionSchema) -> Self {
        Self {
            introspection,
            index: OnceLock::new(),
            primary_keys: RwLock::new(HashMap::new()),
        }
    }

    pub fn introspection(&self) -> &IntrospectionSchema {
        &self.introspection
    }

    pub fn index(&self) -> &SchemaIndex {
        self.index
            .get_or_init(|| SchemaIndex::new(&self.introspection))
    }

    /// The primary key of `resource`. Resolution failures are not cached.
    pub fn primary_key(
        &self,
        resource: &Resource,
        naming: &Naming,
    ) -> Result<Arc<PrimaryKey>, SynthesisError> {
        if let Some(primary_key) = self.primary_keys.read().get(&resource.type_name) {
            return Ok(primary_key.clone());
        }
        let primary_key = Arc::new(primary_key::resolve(self.index(), resource, naming)?);
        Ok(self
            .primary_keys
            .write()
            .entry(resource.type_name.clone())
            .or_insert(primary_key)
            .clone())
    }
}
