//! Per-type configuration.
//!
//! A type may restrict which of its fields are selected, opt in to being expanded when it
//! appears as the type of another type's field, synthesize arguments for argumented fields, and
//! coerce a fetched value back into the shape its input type accepts. Each capability is
//! independently optional; [`TypeStrategy`] provides a no-op default for all of them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;

use crate::configuration::DeclaredTypeConfig;
use crate::introspection::InputValue;
use crate::request::Verb;

/// Computes literal arguments for a field from its name and declared arguments.
pub type ArgumentsFn = dyn Fn(&str, &[InputValue]) -> Option<Map<String, Value>> + Send + Sync;

/// Turns a value as returned by a query into a value accepted by an input.
pub type CoercionFn = dyn Fn(&Value) -> Value + Send + Sync;

/// Per-type behaviour consulted while selecting fields and mapping inputs.
pub trait TypeStrategy: Send + Sync + fmt::Debug {
    /// Whether `field` is selected when building a `verb` request.
    fn is_field_visible(&self, _field: &str, _verb: Verb) -> bool {
        true
    }

    /// Whether fields of this type are expanded into a nested selection.
    fn is_expanded(&self) -> bool {
        false
    }

    /// Literal arguments for an argumented field, `None` to pass none.
    fn arguments_for_field(&self, _field: &str, _args: &[InputValue]) -> Option<Map<String, Value>> {
        None
    }

    /// Coerces a queried value into an input value, `None` when this type has no coercion.
    fn coerce_input_value(&self, _value: &Value) -> Option<Value> {
        None
    }
}

/// A set of fields, either listed by name or chosen by a predicate over the field name and the
/// verb being built.
#[derive(Clone)]
pub enum FieldSelector {
    Names(Vec<String>),
    Predicate(Arc<dyn Fn(&str, Verb) -> bool + Send + Sync>),
}

impl FieldSelector {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldSelector::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn predicate(predicate: impl Fn(&str, Verb) -> bool + Send + Sync + 'static) -> Self {
        FieldSelector::Predicate(Arc::new(predicate))
    }

    pub fn matches(&self, field: &str, verb: Verb) -> bool {
        match self {
            FieldSelector::Names(names) => names.iter().any(|name| name == field),
            FieldSelector::Predicate(predicate) => predicate(field, verb),
        }
    }
}

impl fmt::Debug for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSelector::Names(names) => f.debug_tuple("Names").field(names).finish(),
            FieldSelector::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// A closure-backed [`TypeStrategy`].
#[derive(Clone, Default)]
pub struct TypeConfig {
    include_fields: Option<FieldSelector>,
    exclude_fields: Option<FieldSelector>,
    expand: bool,
    compute_arguments_for_field: Option<Arc<ArgumentsFn>>,
    query_value_to_input_value: Option<Arc<CoercionFn>>,
}

impl TypeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects only the matching fields. Takes precedence over [`TypeConfig::exclude_fields`].
    pub fn include_fields(mut self, selector: FieldSelector) -> Self {
        self.include_fields = Some(selector);
        self
    }

    pub fn exclude_fields(mut self, selector: FieldSelector) -> Self {
        self.exclude_fields = Some(selector);
        self
    }

    pub fn expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    pub fn compute_arguments_for_field(
        mut self,
        compute: impl Fn(&str, &[InputValue]) -> Option<Map<String, Value>> + Send + Sync + 'static,
    ) -> Self {
        self.compute_arguments_for_field = Some(Arc::new(compute));
        self
    }

    pub fn query_value_to_input_value(
        mut self,
        coerce: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.query_value_to_input_value = Some(Arc::new(coerce));
        self
    }
}

impl From<&DeclaredTypeConfig> for TypeConfig {
    fn from(declared: &DeclaredTypeConfig) -> Self {
        Self {
            include_fields: declared.include_fields.clone().map(FieldSelector::Names),
            exclude_fields: declared.exclude_fields.clone().map(FieldSelector::Names),
            expand: declared.expand,
            ..Default::default()
        }
    }
}

impl TypeStrategy for TypeConfig {
    fn is_field_visible(&self, field: &str, verb: Verb) -> bool {
        // The allow-list wins when both lists are configured.
        if let Some(include) = &self.include_fields {
            return include.matches(field, verb);
        }
        if let Some(exclude) = &self.exclude_fields {
            return !exclude.matches(field, verb);
        }
        true
    }

    fn is_expanded(&self) -> bool {
        self.expand
    }

    fn arguments_for_field(&self, field: &str, args: &[InputValue]) -> Option<Map<String, Value>> {
        self.compute_arguments_for_field
            .as_ref()
            .and_then(|compute| compute(field, args))
    }

    fn coerce_input_value(&self, value: &Value) -> Option<Value> {
        self.query_value_to_input_value
            .as_ref()
            .map(|coerce| coerce(value))
    }
}

impl fmt::Debug for TypeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConfig")
            .field("include_fields", &self.include_fields)
            .field("exclude_fields", &self.exclude_fields)
            .field("expand", &self.expand)
            .field(
                "compute_arguments_for_field",
                &self.compute_arguments_for_field.is_some(),
            )
            .field(
                "query_value_to_input_value",
                &self.query_value_to_input_value.is_some(),
            )
            .finish()
    }
}

/// Type strategies keyed by type name.
#[derive(Clone, Debug, Default)]
pub struct TypeConfigMap {
    strategies: HashMap<String, Arc<dyn TypeStrategy>>,
}

impl TypeConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration applied to every schema unless overridden: PostGIS geometry types are
    /// expanded and written back through their `geojson` member.
    pub fn built_in() -> Self {
        let mut map = Self::new();
        for type_name in ["GeometryPoint", "GeometryGeometry", "GeographyPoint"] {
            map.insert(
                type_name,
                TypeConfig::new()
                    .expand(true)
                    .query_value_to_input_value(|value| {
                        value
                            .get("geojson")
                            .cloned()
                            .unwrap_or_else(|| value.clone())
                    }),
            );
        }
        map
    }

    pub fn insert(&mut self, type_name: impl Into<String>, strategy: impl TypeStrategy + 'static) {
        self.strategies
            .insert(type_name.into(), Arc::new(strategy));
    }

    pub fn with(mut self, type_name: impl Into<String>, strategy: impl TypeStrategy + 'static) -> Self {
        self.insert(type_name, strategy);
        self
    }

    /// Adds every entry of `other`, replacing entries of the same type.
    pub fn extend(&mut self, other: &TypeConfigMap) {
        for (name, strategy) in &other.strategies {
            self.strategies.insert(name.clone(), strategy.clone());
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&dyn TypeStrategy> {
        self.strategies.get(type_name).map(|strategy| strategy.as_ref())
    }
}
