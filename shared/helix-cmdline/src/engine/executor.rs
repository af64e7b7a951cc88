use std::fmt;
use std::sync::Arc;

use futures::future::LocalBoxFuture;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, trace};

use super::command_line::{CommandLine, command_label};
use super::validation::{self, ValidationError};
use crate::domain::{ApplicationState, BoundOptions, ExecutionOutcome};
use crate::error::{CmdlineError, Result};
use crate::handler::{Handler, Invocation};
use crate::ports::ServiceProvider;
use crate::services::{PhysicalConsole, ServiceResolver};
use crate::tree::{CommandNode, NodeRole};

enum Step<'a> {
    Done(ExecutionOutcome),
    Dispatch(&'a Handler),
}

/// Result of one parse, ready to dispatch.
pub struct Executor<'a> {
    line: &'a CommandLine,
    selected: &'a CommandNode,
    path: Vec<String>,
    state: Arc<ApplicationState>,
    options: Arc<BoundOptions>,
    information: Option<String>,
    validation_errors: Vec<ValidationError>,
    host: Option<Arc<dyn ServiceProvider>>,
}

impl<'a> Executor<'a> {
    pub(super) fn new(
        line: &'a CommandLine,
        selected: &'a CommandNode,
        path: Vec<String>,
        state: ApplicationState,
        options: BoundOptions,
        information: Option<String>,
        validation_errors: Vec<ValidationError>,
    ) -> Self {
        Self {
            line,
            selected,
            path,
            state: Arc::new(state),
            options: Arc::new(options),
            information,
            validation_errors,
            host: None,
        }
    }

    pub const fn selected_command(&self) -> &'a CommandNode {
        self.selected
    }

    pub fn command_path(&self) -> &[String] {
        &self.path
    }

    pub fn application_state(&self) -> &ApplicationState {
        &self.state
    }

    pub fn bound_options(&self) -> &BoundOptions {
        &self.options
    }

    pub fn is_default_command(&self) -> bool {
        self.state.is_default_command()
    }

    pub const fn is_showing_information(&self) -> bool {
        self.information.is_some()
    }

    /// Rendered help or version text, when that is all this parse produced.
    pub fn information(&self) -> Option<&str> {
        self.information.as_deref()
    }

    pub fn validation_errors(&self) -> &[ValidationError] {
        &self.validation_errors
    }

    /// Resolves host services from `provider` for this execution instead of the builder's factory.
    #[must_use]
    pub fn with_service_provider(mut self, provider: Arc<dyn ServiceProvider>) -> Self {
        self.host = Some(provider);
        self
    }

    /// Dispatches the selected command, blocking on a current-thread runtime if its handler is async.
    pub fn execute(self) -> Result<ExecutionOutcome> {
        let handler = match self.prepare()? {
            Step::Done(outcome) => return Ok(outcome),
            Step::Dispatch(handler) => handler,
        };

        let resolver = self.resolver();
        let result = match handler.invoke(&resolver) {
            Invocation::Ready(result) => result,
            Invocation::Pending(future) => self.block_on(future)?,
        };
        self.finish(result)
    }

    /// Dispatches the selected command, awaiting async handlers on the current runtime.
    pub async fn execute_async(self) -> Result<ExecutionOutcome> {
        let handler = match self.prepare()? {
            Step::Done(outcome) => return Ok(outcome),
            Step::Dispatch(handler) => handler,
        };

        let resolver = self.resolver();
        let result = match handler.invoke(&resolver) {
            Invocation::Ready(result) => result,
            Invocation::Pending(future) => future.await,
        };
        self.finish(result)
    }

    fn prepare(&self) -> Result<Step<'a>> {
        if let Some(text) = &self.information {
            PhysicalConsole::shared().write_out(text)?;
            return Ok(Step::Done(ExecutionOutcome::Informational));
        }

        if !self.validation_errors.is_empty() {
            let code = match &self.line.validation_handler {
                Some(handler) => handler(&self.validation_errors),
                None => validation::report(&self.validation_errors)?,
            };
            return Ok(Step::Done(ExecutionOutcome::ValidationFailed(code)));
        }

        let handler = match (self.selected.bound_handler(), self.selected.role()) {
            (Some(handler), _) => Some(handler),
            (None, NodeRole::Run) => self
                .line
                .root
                .bound_handler()
                .or(self.line.default_handler.as_ref()),
            (None, NodeRole::Root) => self.line.default_handler.as_ref(),
            (None, NodeRole::Named) => {
                return Err(CmdlineError::MissingHandler(self.label()));
            }
        };

        match handler {
            Some(handler) => {
                trace!(command = %self.label(), handler = ?handler, "Dispatching");
                Ok(Step::Dispatch(handler))
            }
            None => {
                debug!("No default action configured");
                Ok(Step::Done(ExecutionOutcome::NoAction))
            }
        }
    }

    /// Drives an async handler from synchronous code, reusing a surrounding multi-thread runtime.
    fn block_on(
        &self,
        future: LocalBoxFuture<'_, anyhow::Result<i32>>,
    ) -> Result<anyhow::Result<i32>> {
        let Ok(handle) = Handle::try_current() else {
            trace!("Blocking on async handler");
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(CmdlineError::Runtime)?;
            return Ok(runtime.block_on(future));
        };

        match handle.runtime_flavor() {
            RuntimeFlavor::MultiThread => {
                trace!("Blocking on async handler inside the caller's runtime");
                Ok(tokio::task::block_in_place(|| handle.block_on(future)))
            }
            _ => Err(CmdlineError::NestedRuntime(self.label())),
        }
    }

    fn resolver(&self) -> ServiceResolver<'a> {
        ServiceResolver::new(
            Arc::clone(&self.state),
            Arc::clone(&self.options),
            &self.line.services,
            self.line.provider_factory.as_deref(),
        )
        .with_host(self.host.clone())
    }

    fn finish(&self, result: anyhow::Result<i32>) -> Result<ExecutionOutcome> {
        result
            .map(ExecutionOutcome::Completed)
            .map_err(|source| CmdlineError::Handler {
                command: self.label(),
                source,
            })
    }

    fn label(&self) -> String {
        command_label(&self.line.root, &self.path)
    }
}

impl fmt::Debug for Executor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("command", &self.label())
            .field("state", &self.state)
            .field("information", &self.information.is_some())
            .field("validation_errors", &self.validation_errors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::any::TypeId;

    use super::*;
    use crate::CommandLineBuilder;
    use crate::ports::SharedService;

    struct Fixed(u32);

    impl ServiceProvider for Fixed {
        fn get_service(&self, service: TypeId) -> Option<SharedService> {
            (service == TypeId::of::<u32>()).then(|| Arc::new(self.0) as SharedService)
        }
    }

    #[test]
    fn test_named_command_without_handler_is_an_error() {
        let mut builder = CommandLineBuilder::new("git");
        builder.command("remote", |_| {});
        let line = builder.build().expect("builds");

        let err = line.execute(["remote"]).unwrap_err();
        assert_eq!(err.to_string(), "No handler defined for command `git remote`");
    }

    #[test]
    fn test_root_handler_wins_over_default_for_both_paths() {
        let mut builder = CommandLineBuilder::new("app");
        builder.on_run(|_| 1);
        builder.root_mut().on_execute(|_| 2);
        let line = builder.build().expect("builds");

        assert_eq!(line.execute(Vec::<String>::new()).expect("runs"), Some(2));
        assert_eq!(line.execute(["run"]).expect("runs"), Some(2));
    }

    #[test]
    fn test_handler_error_carries_command_and_source() {
        let mut builder = CommandLineBuilder::new("app");
        builder.command("fail", |c| {
            c.on_execute(|_| -> anyhow::Result<i32> { Err(anyhow::anyhow!("disk full")) });
        });
        let line = builder.build().expect("builds");

        let err = line.execute(["fail"]).unwrap_err();
        assert_eq!(err.to_string(), "Command `app fail` failed: disk full");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_per_execution_provider_override() {
        let mut builder = CommandLineBuilder::new("app");
        builder.service_provider_factory(|_| Fixed(1));
        builder.command("show", |c| {
            c.handler::<Show>();
        });
        let line = builder.build().expect("builds");

        assert_eq!(line.execute(["show"]).expect("runs"), Some(1));
        let executor = line
            .parse(["show"])
            .expect("parses")
            .with_service_provider(Arc::new(Fixed(7)));
        assert_eq!(executor.execute().expect("runs"), ExecutionOutcome::Completed(7));
    }

    struct Show(Arc<u32>);

    impl crate::FromServices for Show {
        fn from_services(services: &ServiceResolver<'_>) -> anyhow::Result<Self> {
            Ok(Self(services.require::<u32>()?))
        }
    }

    impl crate::CommandHandler for Show {
        fn execute(self, _services: &ServiceResolver<'_>) -> anyhow::Result<i32> {
            Ok(i32::try_from(*self.0)?)
        }
    }
}
