//! Synthesizes GraphQL operations for abstract CRUD requests.
//!
//! A [`QueryBuilder`] holds one introspected schema. Given a verb such as `GET_LIST`, a resource
//! name and request parameters it produces a [`RequestEnvelope`]: the operation document, its
//! variables and the decoder that turns the eventual response back into records.
//!
//! ```ignore
//! let builder = QueryBuilder::builder()
//!     .introspection(IntrospectionSchema::from_introspection_response(&schema)?)
//!     .build();
//! let envelope = builder.build("GET_ONE", "books", &params)?;
//! let request = envelope.to_graphql_request();
//! // … send `request`, then:
//! let result = envelope.parse_response(&response)?;
//! ```
//!
//! Nothing is sent over the network by this crate.

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

mod builder;
pub mod configuration;
pub mod diagnostics;
pub(crate) mod document;
pub mod error;
pub mod filter;
pub mod identifier;
pub mod introspection;
pub mod projection;
pub mod request;
pub mod schema;
pub mod type_config;

pub use crate::builder::QueryBuilder;
pub use crate::configuration::Configuration;
pub use crate::configuration::ConfigurationError;
pub use crate::diagnostics::Diagnostic;
pub use crate::diagnostics::Diagnostics;
pub use crate::error::SynthesisError;
pub use crate::introspection::IntrospectionSchema;
pub use crate::request::GraphQLRequest;
pub use crate::request::QueryResult;
pub use crate::request::RequestEnvelope;
pub use crate::request::RequestParams;
pub use crate::request::Verb;
pub use crate::type_config::FieldSelector;
pub use crate::type_config::TypeConfig;
pub use crate::type_config::TypeConfigMap;
pub use crate::type_config::TypeStrategy;
