//! Typed command handlers and run delegates.
//!
//! A typed handler is constructed from the [`ServiceResolver`] every time its
//! command is selected (constructor injection through [`FromServices`]) and
//! receives the resolver again in `execute` (method injection). Handlers can
//! be synchronous ([`CommandHandler`]) or asynchronous
//! ([`AsyncCommandHandler`]); the engine normalises both to an exit code.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;

use crate::domain::ApplicationState;
use crate::services::ServiceResolver;
use crate::tree::CommandNode;

/// Name and shape of a typed command added with `add_command::<T>()`.
pub trait CommandDefinition {
    const NAME: &'static str;

    /// Adds options, aliases or nested commands to the node created for this command.
    fn configure(command: &mut CommandNode) {
        let _ = command;
    }
}

pub trait FromServices: Sized {
    fn from_services(services: &ServiceResolver<'_>) -> anyhow::Result<Self>;
}

pub trait CommandHandler: FromServices + 'static {
    fn execute(self, services: &ServiceResolver<'_>) -> anyhow::Result<i32>;
}

#[async_trait(?Send)]
pub trait AsyncCommandHandler: FromServices + 'static {
    async fn execute(self, services: &ServiceResolver<'_>) -> anyhow::Result<i32>;
}

/// Return values accepted from run delegates.
pub trait IntoExitCode {
    fn into_exit_code(self) -> anyhow::Result<i32>;
}

impl IntoExitCode for i32 {
    fn into_exit_code(self) -> anyhow::Result<i32> {
        Ok(self)
    }
}

impl IntoExitCode for () {
    fn into_exit_code(self) -> anyhow::Result<i32> {
        Ok(0)
    }
}

impl<E> IntoExitCode for Result<i32, E>
where
    E: Into<anyhow::Error>,
{
    fn into_exit_code(self) -> anyhow::Result<i32> {
        self.map_err(Into::into)
    }
}

pub(crate) enum Invocation<'r> {
    Ready(anyhow::Result<i32>),
    Pending(LocalBoxFuture<'r, anyhow::Result<i32>>),
}

type DelegateFn = dyn Fn(&ApplicationState) -> anyhow::Result<i32> + Send + Sync;
type InvokeFn = dyn for<'r> Fn(&'r ServiceResolver<'r>) -> Invocation<'r> + Send + Sync;

#[derive(Clone)]
pub(crate) enum Handler {
    Delegate(Arc<DelegateFn>),
    Typed {
        type_name: &'static str,
        invoke: Arc<InvokeFn>,
    },
}

impl Handler {
    pub(crate) fn delegate<F, R>(delegate: F) -> Self
    where
        F: Fn(&ApplicationState) -> R + Send + Sync + 'static,
        R: IntoExitCode,
    {
        Self::Delegate(Arc::new(move |state: &ApplicationState| {
            delegate(state).into_exit_code()
        }))
    }

    pub(crate) fn typed<T: CommandHandler>() -> Self {
        Self::Typed {
            type_name: type_name::<T>(),
            invoke: invoker(|services| {
                Invocation::Ready(
                    T::from_services(services).and_then(|handler| handler.execute(services)),
                )
            }),
        }
    }

    pub(crate) fn typed_async<T: AsyncCommandHandler>() -> Self {
        Self::Typed {
            type_name: type_name::<T>(),
            invoke: invoker(|services| {
                Invocation::Pending(Box::pin(async move {
                    match T::from_services(services) {
                        Ok(handler) => handler.execute(services).await,
                        Err(err) => Err(err),
                    }
                }))
            }),
        }
    }

    pub(crate) const fn type_name(&self) -> Option<&'static str> {
        match self {
            Self::Delegate(_) => None,
            Self::Typed { type_name, .. } => Some(*type_name),
        }
    }

    pub(crate) fn invoke<'r>(&self, services: &'r ServiceResolver<'r>) -> Invocation<'r> {
        match self {
            Self::Delegate(delegate) => Invocation::Ready(delegate(services.state())),
            Self::Typed { invoke, .. } => invoke(services),
        }
    }
}

fn invoker<F>(invoke: F) -> Arc<InvokeFn>
where
    F: for<'r> Fn(&'r ServiceResolver<'r>) -> Invocation<'r> + Send + Sync + 'static,
{
    Arc::new(invoke)
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delegate(_) => f.write_str("Handler::Delegate"),
            Self::Typed { type_name, .. } => write!(f, "Handler::Typed({type_name})"),
        }
    }
}
