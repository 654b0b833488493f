//! # Configkit
//!
//! Builds and validates the structural configuration of message-driven
//! applications.
//!
//! ## Model
//!
//! An [`Application`] is a named collection of handlers. Each handler is an
//! aggregate, process, integration or projection, and declares from its
//! `configure()` method:
//!
//! - exactly one [`Identity`] (a name and a UUID key);
//! - the messages it consumes and produces, each with a [`MessageRole`].
//!
//! The builders ([`from_aggregate`], ..., [`from_application`]) call
//! `configure()` once, enforce the structural rules for the handler kind and
//! return an immutable configuration, or the first [`Error`] found.

pub mod application;
pub mod builder;
pub mod configurer;
pub mod entity;
pub mod error;
pub mod handler;
pub mod identity;
pub mod ledger;
pub mod message;
pub mod route;
pub mod set;
pub mod visitor;

pub use application::ApplicationConfig;
pub use application::ApplicationConfigurer;
pub use application::ApplicationEntity;
pub use application::RichApplication;
pub use application::from_application;
pub use application::from_application_with;
pub use builder::from_aggregate;
pub use builder::from_aggregate_with;
pub use builder::from_integration;
pub use builder::from_integration_with;
pub use builder::from_process;
pub use builder::from_process_with;
pub use builder::from_projection;
pub use builder::from_projection_with;
pub use configurer::AggregateConfigurer;
pub use configurer::IntegrationConfigurer;
pub use configurer::ProcessConfigurer;
pub use configurer::ProjectionConfigurer;
pub use entity::Entity;
pub use entity::HandlerConfig;
pub use entity::HandlerEntity;
pub use entity::HandlerType;
pub use entity::RichAggregate;
pub use entity::RichHandler;
pub use entity::RichIntegration;
pub use entity::RichProcess;
pub use entity::RichProjection;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
pub use error::abort;
pub use error::recover;
pub use handler::AggregateMessageHandler;
pub use handler::Application;
pub use handler::DeliveryPolicy;
pub use handler::IntegrationMessageHandler;
pub use handler::ProcessMessageHandler;
pub use handler::ProjectionMessageHandler;
pub use identity::Identity;
pub use ledger::EntityMessageNames;
pub use ledger::EntityMessageTypes;
pub use ledger::RoleMap;
pub use message::MessageName;
pub use message::MessageRole;
pub use message::MessageType;
pub use message::MessageTypeRegistry;
pub use route::executes_command;
pub use route::handles_command;
pub use route::handles_event;
pub use route::records_event;
pub use route::schedules_timeout;
pub use set::ApplicationSet;
pub use set::HandlerSet;
pub use set::RichHandlerSet;
pub use visitor::AcceptRichVisitor;
pub use visitor::AcceptVisitor;
pub use visitor::RichVisitor;
pub use visitor::Visitor;
