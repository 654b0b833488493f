//! # Visitors
//!
//! Dispatches over configurations by kind. Visiting a set stops at the first
//! error returned by a visit method and returns it.

use crate::application::ApplicationConfig;
use crate::application::ApplicationEntity;
use crate::application::RichApplication;
use crate::entity::HandlerConfig;
use crate::entity::HandlerType;
use crate::entity::RichAggregate;
use crate::entity::RichHandler;
use crate::entity::RichIntegration;
use crate::entity::RichProcess;
use crate::entity::RichProjection;

/// Visits plain configurations. Every method defaults to doing nothing.
pub trait Visitor {
    type Error;

    fn visit_application(&mut self, _a: &ApplicationConfig) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_aggregate(&mut self, _h: &HandlerConfig) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_process(&mut self, _h: &HandlerConfig) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_integration(&mut self, _h: &HandlerConfig) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_projection(&mut self, _h: &HandlerConfig) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Visits rich configurations. Every method defaults to doing nothing.
pub trait RichVisitor {
    type Error;

    fn visit_rich_application(&mut self, _a: &RichApplication) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_rich_aggregate(&mut self, _h: &RichAggregate) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_rich_process(&mut self, _h: &RichProcess) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_rich_integration(&mut self, _h: &RichIntegration) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_rich_projection(&mut self, _h: &RichProjection) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Something that can be passed to a [`Visitor`].
pub trait AcceptVisitor {
    fn accept_visitor<V: Visitor + ?Sized>(&self, v: &mut V) -> Result<(), V::Error>;
}

/// Something that can be passed to a [`RichVisitor`].
pub trait AcceptRichVisitor {
    fn accept_rich_visitor<V: RichVisitor + ?Sized>(&self, v: &mut V) -> Result<(), V::Error>;
}

impl AcceptVisitor for HandlerConfig {
    fn accept_visitor<V: Visitor + ?Sized>(&self, v: &mut V) -> Result<(), V::Error> {
        match self.handler_type {
            HandlerType::Aggregate => v.visit_aggregate(self),
            HandlerType::Process => v.visit_process(self),
            HandlerType::Integration => v.visit_integration(self),
            HandlerType::Projection => v.visit_projection(self),
        }
    }
}

impl AcceptVisitor for RichHandler {
    fn accept_visitor<V: Visitor + ?Sized>(&self, v: &mut V) -> Result<(), V::Error> {
        use crate::entity::HandlerEntity;
        self.config().accept_visitor(v)
    }
}

impl AcceptRichVisitor for RichHandler {
    fn accept_rich_visitor<V: RichVisitor + ?Sized>(&self, v: &mut V) -> Result<(), V::Error> {
        match self {
            Self::Aggregate(h) => v.visit_rich_aggregate(h),
            Self::Process(h) => v.visit_rich_process(h),
            Self::Integration(h) => v.visit_rich_integration(h),
            Self::Projection(h) => v.visit_rich_projection(h),
        }
    }
}

impl AcceptVisitor for ApplicationConfig {
    fn accept_visitor<V: Visitor + ?Sized>(&self, v: &mut V) -> Result<(), V::Error> {
        v.visit_application(self)
    }
}

impl AcceptVisitor for RichApplication {
    fn accept_visitor<V: Visitor + ?Sized>(&self, v: &mut V) -> Result<(), V::Error> {
        v.visit_application(self.config())
    }
}

impl AcceptRichVisitor for RichApplication {
    fn accept_rich_visitor<V: RichVisitor + ?Sized>(&self, v: &mut V) -> Result<(), V::Error> {
        v.visit_rich_application(self)
    }
}
