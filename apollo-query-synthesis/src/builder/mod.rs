//! The per-verb request builder.

mod mutation;
mod query;

use apollo_compiler::ast;
use serde_json::Value;

use crate::configuration::Configuration;
use crate::diagnostics::Diagnostics;
use crate::document;
use crate::document::OperationBuilder;
use crate::error::SynthesisError;
use crate::identifier::IdentifierCodec;
use crate::introspection::IntrospectionSchema;
use crate::introspection::NamedType;
use crate::projection::FieldProjector;
use crate::request::RequestEnvelope;
use crate::request::RequestParams;
use crate::request::ResponseDecoder;
use crate::request::Verb;
use crate::schema::PrimaryKey;
use crate::schema::Resource;
use crate::schema::SchemaIndex;
use crate::schema::SchemaRegistry;
use crate::type_config::TypeConfig;
use crate::type_config::TypeConfigMap;

/// Builds GraphQL requests for abstract CRUD requests against one introspected schema.
///
/// ```ignore
/// let builder = QueryBuilder::builder()
///     .introspection(introspection)
///     .build();
/// let request = builder.build("GET_ONE", "books", &params)?;
/// ```
#[derive(Debug)]
pub struct QueryBuilder {
    registry: SchemaRegistry,
    configuration: Configuration,
    type_configs: TypeConfigMap,
}

#[buildstructor::buildstructor]
impl QueryBuilder {
    /// Type configuration is layered: built-in configuration first, then the `types` section of
    /// `configuration`, then `type_configs`. A later layer replaces an earlier one per type.
    #[builder(visibility = "pub")]
    fn new(
        introspection: IntrospectionSchema,
        configuration: Option<Configuration>,
        type_configs: Option<TypeConfigMap>,
    ) -> Self {
        let configuration = configuration.unwrap_or_default();
        let mut merged = TypeConfigMap::built_in();
        for (type_name, declared) in &configuration.types {
            merged.insert(type_name.clone(), TypeConfig::from(declared));
        }
        if let Some(type_configs) = &type_configs {
            merged.extend(type_configs);
        }
        Self {
            registry: SchemaRegistry::new(introspection),
            configuration,
            type_configs: merged,
        }
    }
}

impl QueryBuilder {
    /// Builds the request for `verb` on `resource_name`.
    ///
    /// The resource name may be given in any case and number. Every failure happens here, before
    /// anything is sent.
    #[tracing::instrument(skip_all, fields(verb = %verb, resource = %resource_name), err)]
    pub fn build(
        &self,
        verb: &str,
        resource_name: &str,
        params: &RequestParams,
    ) -> Result<RequestEnvelope, SynthesisError> {
        if verb.is_empty() {
            return Err(SynthesisError::invalid_request("the verb is empty"));
        }
        let resource = Resource::new(resource_name)?;
        let index = self.registry.index();
        let resource_type = index
            .get_type(&resource.type_name)
            .ok_or_else(|| SynthesisError::ResourceTypeUnresolved(resource.type_name.clone()))?;
        let verb = Verb::parse(verb)?;
        let primary_key = self
            .registry
            .primary_key(&resource, &self.configuration.naming)?;

        let mut context = BuildContext {
            index,
            configuration: &self.configuration,
            type_configs: &self.type_configs,
            resource: &resource,
            resource_type,
            primary_key: &primary_key,
            verb,
            diagnostics: Diagnostics::new(),
        };
        let envelope = match verb {
            Verb::GetOne => query::get_one(&mut context, params),
            Verb::GetList => query::get_list(&mut context, params, &params.filter),
            Verb::GetMany => query::get_many(&mut context, params),
            Verb::GetManyReference => query::get_many_reference(&mut context, params),
            Verb::Create => mutation::create(&mut context, params),
            Verb::Update => mutation::update(&mut context, params),
            Verb::UpdateMany => mutation::update_many(&mut context, params),
            Verb::Delete => mutation::delete(&mut context, params),
            Verb::DeleteMany => mutation::delete_many(&mut context, params),
        }?;
        tracing::debug!(
            operation = envelope.operation_name(),
            dropped = envelope.diagnostics().len(),
            "built request"
        );
        Ok(envelope)
    }
}

/// Everything one build consults, plus the diagnostics it collects.
pub(crate) struct BuildContext<'a> {
    index: &'a SchemaIndex,
    configuration: &'a Configuration,
    type_configs: &'a TypeConfigMap,
    resource: &'a Resource,
    resource_type: &'a NamedType,
    primary_key: &'a PrimaryKey,
    verb: Verb,
    diagnostics: Diagnostics,
}

impl BuildContext<'_> {
    /// The selection set of the resource type.
    fn project(&mut self) -> Result<Vec<ast::Selection>, SynthesisError> {
        FieldProjector::new(self.index, self.type_configs, &self.configuration.naming).project(
            &self.resource.type_name,
            Some(self.primary_key),
            self.verb,
            &mut self.diagnostics,
        )
    }

    fn codec(&self) -> IdentifierCodec<'_> {
        IdentifierCodec::new(&self.configuration.identifiers, self.type_configs)
    }

    /// The identifier in the form the identifier argument accepts.
    fn encode_id(&self, raw: &Value) -> Value {
        self.codec().encode(&self.primary_key.id_argument_type, raw)
    }

    /// The identifier in the form the key field accepts.
    fn encode_key(&self, raw: &Value) -> Value {
        self.codec().encode(&self.primary_key.scalar_type, raw)
    }

    fn require_id<'p>(&self, params: &'p RequestParams) -> Result<&'p Value, SynthesisError> {
        params
            .id
            .as_ref()
            .filter(|id| !id.is_null())
            .ok_or_else(|| {
                SynthesisError::invalid_request(format!("{} requires an `id`", self.verb))
            })
    }

    /// The requested identifiers, without the absent ones.
    fn require_ids<'p>(&self, params: &'p RequestParams) -> Vec<&'p Value> {
        params.ids.iter().filter(|id| !id.is_null()).collect()
    }

    fn require_operation(&self, operation: &str) -> Result<(), SynthesisError> {
        if self.index.operation(operation).is_none() {
            return Err(SynthesisError::invalid_request(format!(
                "the schema has no `{operation}` operation for {}",
                self.verb
            )));
        }
        Ok(())
    }

    /// The declared type of `argument` of `operation`, or `fallback` when it is not declared.
    fn argument_type(
        &self,
        operation: &str,
        argument: &str,
        fallback: ast::Type,
    ) -> Result<ast::Type, SynthesisError> {
        match self.index.argument(operation, argument) {
            Some(declared) => document::to_ast_type(&declared.ty),
            None => Ok(fallback),
        }
    }

    fn finish(
        &mut self,
        operation: OperationBuilder,
        operation_name: &str,
        decoder: ResponseDecoder,
    ) -> RequestEnvelope {
        let (document, variables) = operation.build();
        RequestEnvelope::new(
            document,
            operation_name.to_string(),
            variables,
            decoder,
            std::mem::take(&mut self.diagnostics),
        )
    }
}

/// Renders an identifier as the token echoed back through `clientMutationId`.
fn identifier_token(id: &Value) -> String {
    match id {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    }
}
