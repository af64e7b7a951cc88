//! Builder that composes conventions, commands and services into a [`CommandLine`].

use std::any::Any;
use std::sync::Arc;

use tracing::debug;

use crate::config::Settings;
use crate::conventions::{CommandLineConvention, Convention, ConventionContext, ConventionPipeline};
use crate::domain::{ApplicationState, LogLevel, ModuleInfo};
use crate::engine::{CommandLine, ParseHook, ValidationError, ValidationHandler};
use crate::error::Result;
use crate::handler::{
    AsyncCommandHandler, CommandDefinition, CommandHandler, Handler, IntoExitCode,
};
use crate::ports::{CandidateFinder, ModuleProvider, ServiceProvider, StaticModules};
use crate::services::{ProviderFactory, ServiceCollection};
use crate::tree::{CommandNode, OptionSpec, globals, to_clap, validate_tree};

/// Everything conventions and the builder contribute before the tree is frozen.
pub(crate) struct Composition {
    pub(crate) root: CommandNode,
    pub(crate) services: ServiceCollection,
    pub(crate) on_parse: Vec<ParseHook>,
    pub(crate) default_handler: Option<Handler>,
    pub(crate) log_level: Option<LogLevel>,
    pub(crate) validation_handler: Option<Arc<ValidationHandler>>,
}

impl Composition {
    fn new(name: impl Into<String>) -> Self {
        let mut root = CommandNode::root(name);
        for option in globals::standard_options() {
            root.option(option);
        }

        Self {
            root,
            services: ServiceCollection::new(),
            on_parse: Vec::new(),
            default_handler: None,
            log_level: None,
            validation_handler: None,
        }
    }

    pub(crate) fn add_global_option(&mut self, option: OptionSpec) {
        self.root.option(option.inherited());
    }

    pub(crate) fn on_parse<F>(&mut self, hook: F)
    where
        F: Fn(&ApplicationState) + Send + Sync + 'static,
    {
        self.on_parse.push(Arc::new(hook));
    }

    pub(crate) fn on_run<F, R>(&mut self, delegate: F)
    where
        F: Fn(&ApplicationState) -> R + Send + Sync + 'static,
        R: IntoExitCode,
    {
        self.default_handler = Some(Handler::delegate(delegate));
    }

    pub(crate) fn default_command<T: CommandHandler>(&mut self) {
        self.default_handler = Some(Handler::typed::<T>());
    }

    pub(crate) fn default_async_command<T: AsyncCommandHandler>(&mut self) {
        self.default_handler = Some(Handler::typed_async::<T>());
    }
}

/// Collects conventions, commands, hooks and services, then freezes them with [`build`](Self::build).
pub struct CommandLineBuilder {
    composition: Composition,
    conventions: ConventionPipeline,
    modules: Option<Arc<dyn ModuleProvider>>,
    candidates: Option<Arc<dyn CandidateFinder>>,
    entry_module: Option<ModuleInfo>,
    provider_factory: Option<Arc<ProviderFactory>>,
}

impl CommandLineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            composition: Composition::new(name),
            conventions: ConventionPipeline::new(),
            modules: None,
            candidates: None,
            entry_module: None,
            provider_factory: None,
        }
    }

    /// Seeds the root name, about text and default log level from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut builder = Self::new(settings.name.clone());
        if let Some(about) = &settings.about {
            builder.composition.root.about(about.clone());
        }
        builder.composition.log_level = settings.log_level;
        builder
    }

    #[must_use]
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.composition.root.about(about);
        self
    }

    #[must_use]
    pub fn with_module_provider(mut self, provider: impl ModuleProvider + 'static) -> Self {
        self.modules = Some(Arc::new(provider));
        self
    }

    #[must_use]
    pub fn with_candidate_finder(mut self, finder: impl CandidateFinder + 'static) -> Self {
        self.candidates = Some(Arc::new(finder));
        self
    }

    /// Uses one module list for both discovery handles.
    #[must_use]
    pub fn with_modules(mut self, modules: Vec<ModuleInfo>) -> Self {
        let modules = Arc::new(StaticModules::new(modules));
        self.modules = Some(Arc::clone(&modules) as Arc<dyn ModuleProvider>);
        self.candidates = Some(modules);
        self
    }

    /// Module whose version metadata backs `--version`.
    #[must_use]
    pub fn entry_module(mut self, module: ModuleInfo) -> Self {
        self.entry_module = Some(module);
        self
    }

    pub fn prepend_convention(&mut self, convention: impl CommandLineConvention + 'static) -> &mut Self {
        self.conventions.prepend(Convention::object(convention));
        self
    }

    pub fn append_convention(&mut self, convention: impl CommandLineConvention + 'static) -> &mut Self {
        self.conventions.append(Convention::object(convention));
        self
    }

    pub fn add_convention(&mut self, convention: impl CommandLineConvention + 'static) -> &mut Self {
        self.append_convention(convention)
    }

    pub fn prepend_delegate<F>(&mut self, delegate: F) -> &mut Self
    where
        F: FnOnce(&mut ConventionContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.conventions.prepend(Convention::delegate(delegate));
        self
    }

    pub fn append_delegate<F>(&mut self, delegate: F) -> &mut Self
    where
        F: FnOnce(&mut ConventionContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.conventions.append(Convention::delegate(delegate));
        self
    }

    pub const fn root_mut(&mut self) -> &mut CommandNode {
        &mut self.composition.root
    }

    /// Adds a named command under the root and returns it.
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

    /// Delegate run when no command (or `run`) is given.
    pub fn on_run<F, R>(&mut self, delegate: F) -> &mut Self
    where
        F: Fn(&ApplicationState) -> R + Send + Sync + 'static,
        R: IntoExitCode,
    {
        self.composition.on_run(delegate);
        self
    }

    /// Hook run after every successful parse, before any handler.
    pub fn on_parse<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&ApplicationState) + Send + Sync + 'static,
    {
        self.composition.on_parse(hook);
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

    pub fn log_level(&mut self, level: LogLevel) -> &mut Self {
        self.composition.log_level = Some(level);
        self
    }

    pub fn add_global_option(&mut self, option: OptionSpec) -> &mut Self {
        self.composition.add_global_option(option);
        self
    }

    pub fn add_service<T: Any + Send + Sync>(&mut self, service: T) -> &mut Self {
        self.composition.services.add(service);
        self
    }

    /// Host container built lazily, at most once per execution, from the bound state.
    pub fn service_provider_factory<F, P>(&mut self, factory: F) -> &mut Self
    where
        F: Fn(&ApplicationState) -> P + Send + Sync + 'static,
        P: ServiceProvider + 'static,
    {
        self.provider_factory = Some(Arc::new(move |state: &ApplicationState| {
            Arc::new(factory(state)) as Arc<dyn ServiceProvider>
        }));
        self
    }

    /// Replaces the default reporting of option validation failures.
    pub fn on_validation_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&[ValidationError]) -> i32 + Send + Sync + 'static,
    {
        self.composition.validation_handler = Some(Arc::new(handler));
        self
    }

    /// Applies conventions in order, attaches help everywhere and checks the tree.
    ///
    /// The first failing convention aborts the build.
    pub fn build(self) -> Result<CommandLine> {
        let Self {
            mut composition,
            conventions,
            modules,
            candidates,
            entry_module,
            provider_factory,
        } = self;

        composition.root.push_subcommand(CommandNode::run());

        let mut context =
            ConventionContext::new(&mut composition, modules.as_deref(), candidates.as_deref());
        conventions.apply(&mut context)?;

        composition.root.ensure_help();
        validate_tree(&composition.root)?;

        let entry = entry_module
            .or_else(|| modules.as_ref().and_then(|m| m.modules().into_iter().next()))
            .unwrap_or_else(|| ModuleInfo::new(composition.root.name(), "0.0.0"));
        let command = to_clap(&composition.root, &entry);

        debug!(
            root = composition.root.name(),
            commands = composition.root.subcommands().len(),
            version = %entry.version,
            "Built command line"
        );

        Ok(CommandLine::new(composition, command, provider_factory, entry))
    }
}
