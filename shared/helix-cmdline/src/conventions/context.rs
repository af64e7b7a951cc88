use std::any::Any;

use crate::builder::Composition;
use crate::domain::{ApplicationState, LogLevel};
use crate::handler::{AsyncCommandHandler, CommandDefinition, CommandHandler, IntoExitCode};
use crate::ports::{CandidateFinder, ModuleProvider};
use crate::services::ServiceCollection;
use crate::tree::{CommandNode, OptionSpec};

/// What a convention can see and change while the command line is being built.
pub struct ConventionContext<'a> {
    composition: &'a mut Composition,
    modules: Option<&'a dyn ModuleProvider>,
    candidates: Option<&'a dyn CandidateFinder>,
}

impl<'a> ConventionContext<'a> {
    pub(crate) fn new(
        composition: &'a mut Composition,
        modules: Option<&'a dyn ModuleProvider>,
        candidates: Option<&'a dyn CandidateFinder>,
    ) -> Self {
        Self {
            composition,
            modules,
            candidates,
        }
    }

    pub fn root(&self) -> &CommandNode {
        &self.composition.root
    }

    pub fn root_mut(&mut self) -> &mut CommandNode {
        &mut self.composition.root
    }

    pub fn command<F>(&mut self, name: impl Into<String>, configure: F) -> &mut CommandNode
    where
        F: FnOnce(&mut CommandNode),
    {
        self.composition.root.command(name, configure)
    }

    pub fn add_command<T>(&mut self) -> &mut CommandNode
    where
        T: CommandDefinition + CommandHandler,
    {
        self.composition.root.add_command::<T>()
    }

    pub fn add_async_command<T>(&mut self) -> &mut CommandNode
    where
        T: CommandDefinition + AsyncCommandHandler,
    {
        self.composition.root.add_async_command::<T>()
    }

    pub fn module_provider(&self) -> Option<&'a dyn ModuleProvider> {
        self.modules
    }

    pub fn candidate_finder(&self) -> Option<&'a dyn CandidateFinder> {
        self.candidates
    }

    pub fn services_mut(&mut self) -> &mut ServiceCollection {
        &mut self.composition.services
    }

    pub fn add_service<T: Any + Send + Sync>(&mut self, service: T) -> &mut Self {
        self.composition.services.add(service);
        self
    }

    /// Default level configured so far, used when no verbosity option is given.
    pub fn log_level(&self) -> Option<LogLevel> {
        self.composition.log_level
    }

    pub fn set_log_level(&mut self, level: LogLevel) -> &mut Self {
        self.composition.log_level = Some(level);
        self
    }

    pub fn add_global_option(&mut self, option: OptionSpec) -> &mut Self {
        self.composition.add_global_option(option);
        self
    }

    pub fn on_parse<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&ApplicationState) + Send + Sync + 'static,
    {
        self.composition.on_parse(hook);
        self
    }

    pub fn on_run<F, R>(&mut self, delegate: F) -> &mut Self
    where
        F: Fn(&ApplicationState) -> R + Send + Sync + 'static,
        R: IntoExitCode,
    {
        self.composition.on_run(delegate);
        self
    }

    pub fn default_command<T: CommandHandler>(&mut self) -> &mut Self {
        self.composition.default_command::<T>();
        self
    }

    pub fn default_async_command<T: AsyncCommandHandler>(&mut self) -> &mut Self {
        self.composition.default_async_command::<T>();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModuleInfo;
    use crate::{CommandLineBuilder, RUN_COMMAND};

    #[test]
    fn test_conventions_see_discovery_and_shape_the_tree() {
        let mut builder = CommandLineBuilder::new("app").with_modules(vec![
            ModuleInfo::new("app", "1.0.0"),
            ModuleInfo::new("plugin", "0.3.0").with_reference("app"),
        ]);
        builder.append_delegate(|context| {
            let plugins = context
                .candidate_finder()
                .map(|finder| finder.find_candidates(&["app"]))
                .unwrap_or_default();
            for plugin in plugins {
                context.command(plugin.name, |_| {});
            }
            context.set_log_level(LogLevel::Warning);
            context.add_service(5_u8);
            Ok(())
        });
        builder.append_delegate(|context| {
            anyhow::ensure!(context.root().subcommand(RUN_COMMAND).is_some(), "run missing");
            anyhow::ensure!(context.log_level() == Some(LogLevel::Warning), "level not kept");
            Ok(())
        });

        let line = builder.build().expect("builds");
        assert!(line.root().subcommand("plugin").is_some());
        assert_eq!(line.default_log_level(), Some(LogLevel::Warning));
    }
}
