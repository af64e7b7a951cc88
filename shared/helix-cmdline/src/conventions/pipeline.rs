use std::any::type_name;
use std::collections::VecDeque;
use std::fmt;

use tracing::debug;

use super::ConventionContext;
use crate::error::{CmdlineError, Result};

/// A reusable convention: configures commands, options, hooks or services.
pub trait CommandLineConvention {
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    fn register(&self, context: &mut ConventionContext<'_>) -> anyhow::Result<()>;
}

type DelegateConvention = Box<dyn FnOnce(&mut ConventionContext<'_>) -> anyhow::Result<()>>;

pub enum Convention {
    Object(Box<dyn CommandLineConvention>),
    Delegate(DelegateConvention),
}

impl Convention {
    pub fn object(convention: impl CommandLineConvention + 'static) -> Self {
        Self::Object(Box::new(convention))
    }

    pub fn delegate<F>(delegate: F) -> Self
    where
        F: FnOnce(&mut ConventionContext<'_>) -> anyhow::Result<()> + 'static,
    {
        Self::Delegate(Box::new(delegate))
    }

    fn label(&self, position: usize) -> String {
        match self {
            Self::Object(convention) => convention.name().to_string(),
            Self::Delegate(_) => format!("delegate #{position}"),
        }
    }

    fn apply(self, context: &mut ConventionContext<'_>) -> anyhow::Result<()> {
        match self {
            Self::Object(convention) => convention.register(context),
            Self::Delegate(delegate) => delegate(context),
        }
    }
}

impl fmt::Debug for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(convention) => write!(f, "Convention::Object({})", convention.name()),
            Self::Delegate(_) => f.write_str("Convention::Delegate"),
        }
    }
}

/// Conventions in application order. No dependency ordering is computed.
#[derive(Debug, Default)]
pub struct ConventionPipeline {
    conventions: VecDeque<Convention>,
}

impl ConventionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepend(&mut self, convention: Convention) {
        self.conventions.push_front(convention);
    }

    pub fn append(&mut self, convention: Convention) {
        self.conventions.push_back(convention);
    }

    pub fn len(&self) -> usize {
        self.conventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conventions.is_empty()
    }

    /// Applies every convention once, in order, stopping at the first failure.
    pub(crate) fn apply(self, context: &mut ConventionContext<'_>) -> Result<()> {
        let total = self.conventions.len();
        for (index, convention) in self.conventions.into_iter().enumerate() {
            let position = index + 1;
            let label = convention.label(position);
            debug!(convention = %label, position, total, "Applying convention");

            convention.apply(context).map_err(|source| CmdlineError::Convention {
                convention: label,
                source,
            })?;
        }
        Ok(())
    }
}
