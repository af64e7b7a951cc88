use std::fmt;

use crate::domain::ApplicationState;
use crate::handler::{AsyncCommandHandler, CommandDefinition, CommandHandler, Handler, IntoExitCode};

use super::OptionSpec;

pub const RUN_COMMAND: &str = "run";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeRole {
    Root,
    Run,
    Named,
}

/// One entry of the command tree: the root, the synthetic `run` command, or a named sub-command.
#[derive(Clone)]
pub struct CommandNode {
    name: String,
    about: Option<String>,
    extended_help: Option<String>,
    aliases: Vec<String>,
    options: Vec<OptionSpec>,
    subcommands: Vec<CommandNode>,
    handler: Option<Handler>,
    allow_external_args: bool,
    help_option: bool,
    hidden: bool,
    role: NodeRole,
}

impl CommandNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: None,
            extended_help: None,
            aliases: Vec::new(),
            options: Vec::new(),
            subcommands: Vec::new(),
            handler: None,
            allow_external_args: false,
            help_option: false,
            hidden: false,
            role: NodeRole::Named,
        }
    }

    pub(crate) fn root(name: impl Into<String>) -> Self {
        let mut node = Self::new(name);
        node.role = NodeRole::Root;
        node.help_option = true;
        node.allow_external_args = true;
        node
    }

    pub(crate) fn run() -> Self {
        let mut node = Self::new(RUN_COMMAND);
        node.role = NodeRole::Run;
        node.about = Some("Run the application".to_string());
        node.extended_help = Some("Default action if no command is given".to_string());
        node.allow_external_args = true;
        node
    }

    pub fn about(&mut self, about: impl Into<String>) -> &mut Self {
        self.about = Some(about.into());
        self
    }

    pub fn extended_help(&mut self, text: impl Into<String>) -> &mut Self {
        self.extended_help = Some(text.into());
        self
    }

    pub fn alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn option(&mut self, option: OptionSpec) -> &mut Self {
        self.options.push(option);
        self
    }

    /// Captures unexpected trailing arguments instead of failing the parse.
    pub fn allow_external_args(&mut self, allow: bool) -> &mut Self {
        self.allow_external_args = allow;
        self
    }

    pub fn help_option(&mut self, enabled: bool) -> &mut Self {
        self.help_option = enabled;
        self
    }

    pub fn hidden(&mut self, hidden: bool) -> &mut Self {
        self.hidden = hidden;
        self
    }

    /// Adds a child command and returns it for further configuration.
    pub fn command<F>(&mut self, name: impl Into<String>, configure: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        let mut child = Self::new(name);
        configure(&mut child);
        let index = self.subcommands.len();
        self.subcommands.push(child);
        &mut self.subcommands[index]
    }

    /// Adds a typed command whose handler is built from services on every invocation.
    pub fn add_command<T>(&mut self) -> &mut Self
    where
        T: CommandDefinition + CommandHandler,
    {
        self.command(T::NAME, |node| {
            T::configure(node);
            node.handler = Some(Handler::typed::<T>());
        })
    }

    pub fn add_async_command<T>(&mut self) -> &mut Self
    where
        T: CommandDefinition + AsyncCommandHandler,
    {
        self.command(T::NAME, |node| {
            T::configure(node);
            node.handler = Some(Handler::typed_async::<T>());
        })
    }

    /// Runs `delegate` with the bound application state when this command is selected.
    pub fn on_execute<F, R>(&mut self, delegate: F) -> &mut Self
    where
        F: Fn(&ApplicationState) -> R + Send + Sync + 'static,
        R: IntoExitCode,
    {
        self.handler = Some(Handler::delegate(delegate));
        self
    }

    pub fn handler<T: CommandHandler>(&mut self) -> &mut Self {
        self.handler = Some(Handler::typed::<T>());
        self
    }

    pub fn async_handler<T: AsyncCommandHandler>(&mut self) -> &mut Self {
        self.handler = Some(Handler::typed_async::<T>());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.about.as_deref()
    }

    pub fn long_description(&self) -> Option<&str> {
        self.extended_help.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn subcommands(&self) -> &[Self] {
        &self.subcommands
    }

    pub fn subcommand(&self, name: &str) -> Option<&Self> {
        self.subcommands.iter().find(|c| c.answers_to(name))
    }

    pub fn subcommand_mut(&mut self, name: &str) -> Option<&mut Self> {
        self.subcommands.iter_mut().find(|c| c.answers_to(name))
    }

    /// Follows `path` from this node, one sub-command name per segment.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |node, segment| node.subcommand(segment.as_ref()))
    }

    pub const fn has_help_option(&self) -> bool {
        self.help_option
    }

    pub const fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Type name of the typed handler, if one is bound.
    pub fn handler_type(&self) -> Option<&'static str> {
        self.handler.as_ref().and_then(Handler::type_name)
    }

    pub const fn allows_external_args(&self) -> bool {
        self.allow_external_args
    }

    pub const fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub(crate) const fn role(&self) -> NodeRole {
        self.role
    }

    pub(crate) const fn bound_handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    pub(crate) fn push_subcommand(&mut self, node: Self) {
        self.subcommands.push(node);
    }

    pub(crate) fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Depth-first: attaches a help option to this node and every descendant.
    pub(crate) fn ensure_help(&mut self) {
        self.help_option = true;
        for child in &mut self.subcommands {
            child.ensure_help();
        }
    }

    /// Visits every node depth-first, parents before children.
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&Self),
    {
        visit(self);
        for child in &self.subcommands {
            child.walk(visit);
        }
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("subcommands", &self.subcommands)
            .field("handler", &self.handler_type().or(self.handler.as_ref().map(|_| "delegate")))
            .field("help_option", &self.help_option)
            .finish_non_exhaustive()
    }
}
