//! Shared fixtures: message types and handler stubs whose `configure()` is a
//! closure supplied by the test.

#![allow(dead_code)]

use std::sync::Arc;

use configkit::AggregateConfigurer;
use configkit::AggregateMessageHandler;
use configkit::Application;
use configkit::ApplicationConfigurer;
use configkit::IntegrationConfigurer;
use configkit::IntegrationMessageHandler;
use configkit::ProcessConfigurer;
use configkit::ProcessMessageHandler;
use configkit::ProjectionConfigurer;
use configkit::ProjectionMessageHandler;
use configkit::Result;
use tracing_subscriber::EnvFilter;

pub const APP_KEY: &str = "8b3f2c6a-1d4e-4f7a-9b0c-2e5d8f1a3c6b";
pub const AGG_KEY: &str = "c1a2b3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d";
pub const PROC_KEY: &str = "d2b3c4e5-f6a7-4b8c-9d0e-1f2a3b4c5d6e";
pub const INT_KEY: &str = "e3c4d5f6-a7b8-4c9d-8e1f-2a3b4c5d6e7f";
pub const PROJ_KEY: &str = "f4d5e6a7-b8c9-4dae-9f2a-3b4c5d6e7f80";

pub struct Cmd1;
pub struct Cmd2;
pub struct Evt1;
pub struct Evt2;
pub struct Timeout1;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_test_writer().try_init();
}

macro_rules! stub {
    ($stub:ident, $trait:ident, $configurer:ident) => {
        pub struct $stub {
            type_name: &'static str,
            configure: Box<dyn Fn(&mut $configurer<'_>) -> Result<()> + Send + Sync>,
        }

        impl $stub {
            pub fn new(
                type_name: &'static str,
                configure: impl Fn(&mut $configurer<'_>) -> Result<()> + Send + Sync + 'static,
            ) -> Arc<Self> {
                Arc::new(Self { type_name, configure: Box::new(configure) })
            }
        }

        impl $trait for $stub {
            fn configure(&self, c: &mut $configurer<'_>) -> Result<()> {
                (self.configure)(c)
            }

            fn type_name(&self) -> &'static str {
                self.type_name
            }
        }
    };
}

stub!(AppStub, Application, ApplicationConfigurer);
stub!(AggregateStub, AggregateMessageHandler, AggregateConfigurer);
stub!(ProcessStub, ProcessMessageHandler, ProcessConfigurer);
stub!(IntegrationStub, IntegrationMessageHandler, IntegrationConfigurer);
stub!(ProjectionStub, ProjectionMessageHandler, ProjectionConfigurer);

/// Consumes `Cmd1` and produces `Evt1`.
pub fn aggregate() -> Arc<AggregateStub> {
    AggregateStub::new("app::Agg", |c| {
        c.identity("agg", AGG_KEY)?;
        c.consumes_command_type::<Cmd1>()?;
        c.produces_event_type::<Evt1>()
    })
}

/// Consumes `Evt1`, produces `Cmd2` and schedules `Timeout1`.
pub fn process() -> Arc<ProcessStub> {
    ProcessStub::new("app::Proc", |c| {
        c.identity("proc", PROC_KEY)?;
        c.consumes_event_type::<Evt1>()?;
        c.produces_command_type::<Cmd2>()?;
        c.schedules_timeout_type::<Timeout1>()
    })
}

/// Consumes `Cmd2` and produces `Evt2`.
pub fn integration() -> Arc<IntegrationStub> {
    IntegrationStub::new("app::Int", |c| {
        c.identity("int", INT_KEY)?;
        c.consumes_command_type::<Cmd2>()?;
        c.produces_event_type::<Evt2>()
    })
}

/// Consumes `Evt1` and `Evt2`.
pub fn projection() -> Arc<ProjectionStub> {
    ProjectionStub::new("app::Proj", |c| {
        c.identity("proj", PROJ_KEY)?;
        c.consumes_event_type::<Evt1>()?;
        c.consumes_event_type::<Evt2>()
    })
}
