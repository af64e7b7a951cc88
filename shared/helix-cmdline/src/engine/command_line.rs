use std::fmt;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{ArgMatches, Command};
use tracing::{debug, error, trace};

use super::executor::Executor;
use super::validation::{self, ValidationError, ValidationHandler};
use crate::builder::Composition;
use crate::domain::{ApplicationState, BoundOptions, ExecutionOutcome, LogLevel, ModuleInfo};
use crate::error::{CmdlineError, Result};
use crate::handler::Handler;
use crate::services::{PhysicalConsole, ProviderFactory, ServiceCollection};
use crate::tree::globals::{DEBUG, LOG_LEVEL, TRACE, VERBOSE};
use crate::tree::{CommandNode, NodeRole, OptionKind, OptionSpec, REMAINING_ARGS};

pub(crate) type ParseHook = Arc<dyn Fn(&ApplicationState) + Send + Sync>;

/// A built command line. Every `parse`/`execute` call is independent.
pub struct CommandLine {
    pub(super) root: CommandNode,
    command: Command,
    pub(super) services: ServiceCollection,
    on_parse: Vec<ParseHook>,
    pub(super) default_handler: Option<Handler>,
    default_log_level: Option<LogLevel>,
    pub(super) validation_handler: Option<Arc<ValidationHandler>>,
    pub(super) provider_factory: Option<Arc<ProviderFactory>>,
    entry: ModuleInfo,
}

impl CommandLine {
    pub(crate) fn new(
        composition: Composition,
        command: Command,
        provider_factory: Option<Arc<ProviderFactory>>,
        entry: ModuleInfo,
    ) -> Self {
        Self {
            root: composition.root,
            command,
            services: composition.services,
            on_parse: composition.on_parse,
            default_handler: composition.default_handler,
            default_log_level: composition.log_level,
            validation_handler: composition.validation_handler,
            provider_factory,
            entry,
        }
    }

    pub const fn root(&self) -> &CommandNode {
        &self.root
    }

    pub const fn entry_module(&self) -> &ModuleInfo {
        &self.entry
    }

    pub const fn default_log_level(&self) -> Option<LogLevel> {
        self.default_log_level
    }

    pub const fn services(&self) -> &ServiceCollection {
        &self.services
    }

    /// Parses `args` (without the program name) and binds the application state.
    ///
    /// No handler runs; parse hooks do, unless help or version was requested
    /// or an option value failed validation.
    pub fn parse<I, S>(&self, args: I) -> Result<Executor<'_>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        trace!(?args, "Parsing command line");

        let argv = std::iter::once(self.root.name().to_string()).chain(args.iter().cloned());
        match self.command.clone().try_get_matches_from(argv) {
            Ok(matches) => Ok(self.bind(&matches)),
            Err(err) if is_informational(err.kind()) => {
                let path = self.scan_path(&args);
                debug!(path = ?path, "Showing help or version");
                Ok(self.informational(path, err.render().to_string()))
            }
            Err(err) => Err(CmdlineError::Parse(err)),
        }
    }

    /// Parses and dispatches; `None` means nothing ran and nothing needs reporting.
    pub fn execute<I, S>(&self, args: I) -> Result<Option<i32>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.execute_outcome(args).map(ExecutionOutcome::exit_code)
    }

    pub fn execute_outcome<I, S>(&self, args: I) -> Result<ExecutionOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse(args)?.execute()
    }

    /// Same as [`execute`](Self::execute), awaiting async handlers on the caller's runtime.
    pub async fn execute_async<I, S>(&self, args: I) -> Result<Option<i32>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let executor = self.parse(args)?;
        executor.execute_async().await.map(ExecutionOutcome::exit_code)
    }

    /// Executes and reduces every outcome to a process exit code.
    ///
    /// Parse errors are printed through clap; other errors go to stderr.
    pub fn run<I, S>(&self, args: I) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.execute(args) {
            Ok(code) => code.unwrap_or(0),
            Err(CmdlineError::Parse(err)) => {
                let _ = err.print();
                err.exit_code()
            }
            Err(err) => {
                error!(error = %err, "Command line failed");
                let _ = PhysicalConsole::shared().write_err(&format!("error: {err}\n"));
                err.exit_code()
            }
        }
    }

    /// Help text of the command at `path` (names or aliases below the root).
    pub fn help_text<S: AsRef<str>>(&self, path: &[S]) -> Option<String> {
        let mut command = self.command.clone();
        command.build();

        let mut current = &mut command;
        for segment in path {
            current = current.find_subcommand_mut(segment.as_ref())?;
        }
        Some(current.render_help().to_string())
    }

    fn bind(&self, matches: &ArgMatches) -> Executor<'_> {
        let mut chain = vec![(&self.root, matches)];
        let mut node = &self.root;
        let mut current = matches;
        while let Some((name, sub)) = current.subcommand() {
            let Some(child) = node.subcommand(name) else {
                break;
            };
            chain.push((child, sub));
            node = child;
            current = sub;
        }

        let path: Vec<String> = chain[1..].iter().map(|(n, _)| n.name().to_string()).collect();
        let mut options = BoundOptions::new(path.clone());
        let mut errors = Vec::new();

        // Inherited values are propagated by clap to every level; read them at the deepest.
        for (owner, owner_matches) in &chain {
            for option in owner.options() {
                let source = if option.is_inherited() { current } else { *owner_matches };
                bind_option(option, source, &mut options, &mut errors);
            }
        }

        let remaining = if node.allows_external_args() {
            string_values(current, REMAINING_ARGS).unwrap_or_default()
        } else {
            Vec::new()
        };

        let state = ApplicationState {
            remaining_arguments: remaining,
            verbose: options.flag(VERBOSE),
            trace: options.flag(TRACE),
            debug: options.flag(DEBUG),
            explicit_log_level: options.value(LOG_LEVEL).and_then(|v| v.parse().ok()),
            default_log_level: self.default_log_level,
            is_default_command: matches!(node.role(), NodeRole::Root | NodeRole::Run),
        };

        debug!(
            command = %command_label(&self.root, &path),
            level = %state.log_level(),
            default = state.is_default_command,
            "Selected command"
        );

        if errors.is_empty() {
            for hook in &self.on_parse {
                hook(&state);
            }
        } else {
            debug!(failures = errors.len(), "Option validation failed");
        }

        Executor::new(self, node, path, state, options, None, errors)
    }

    fn informational(&self, path: Vec<String>, text: String) -> Executor<'_> {
        let node = self.root.find(&path).unwrap_or(&self.root);
        let state = ApplicationState {
            default_log_level: self.default_log_level,
            is_default_command: true,
            ..ApplicationState::default()
        };
        let options = BoundOptions::new(path.clone());
        Executor::new(self, node, path, state, options, Some(text), Vec::new())
    }

    /// Best-effort command path for a parse clap short-circuited.
    fn scan_path(&self, args: &[String]) -> Vec<String> {
        let mut node = &self.root;
        let mut inherited: Vec<&OptionSpec> = Vec::new();
        let mut path = Vec::new();
        let mut tokens = args.iter();

        while let Some(token) = tokens.next() {
            if token == "--" {
                break;
            }

            if token.starts_with('-') {
                let (flag, inline) = token
                    .split_once('=')
                    .map_or((token.as_str(), false), |(flag, _)| (flag, true));
                let takes_value = inherited
                    .iter()
                    .copied()
                    .chain(node.options())
                    .any(|o| o.takes_value() && o.matches_token(flag));
                if takes_value && !inline {
                    tokens.next();
                }
                continue;
            }

            let Some(child) = node.subcommand(token) else {
                break;
            };
            inherited.extend(node.options().iter().filter(|o| o.is_inherited()));
            path.push(child.name().to_string());
            node = child;
        }

        path
    }
}

impl fmt::Debug for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandLine")
            .field("root", &self.root)
            .field("services", &self.services)
            .field("entry", &self.entry)
            .field("default_log_level", &self.default_log_level)
            .finish_non_exhaustive()
    }
}

const fn is_informational(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

fn bind_option(
    option: &OptionSpec,
    matches: &ArgMatches,
    options: &mut BoundOptions,
    errors: &mut Vec<ValidationError>,
) {
    match option.kind() {
        OptionKind::Flag => {
            if matches!(matches.try_get_one::<bool>(option.id()), Ok(Some(true))) {
                options.set_flag(option.id());
            }
        }
        OptionKind::Single | OptionKind::Multiple => {
            if let Some(values) = string_values(matches, option.id()) {
                validation::check(option, &values, errors);
                options.set_values(option.id(), values);
            }
        }
    }
}

fn string_values(matches: &ArgMatches, id: &str) -> Option<Vec<String>> {
    matches
        .try_get_many::<String>(id)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
}

pub(super) fn command_label(root: &CommandNode, path: &[String]) -> String {
    std::iter::once(root.name())
        .chain(path.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::CommandLineBuilder;
    use crate::tree::RUN_COMMAND;

    fn git() -> CommandLine {
        let mut builder = CommandLineBuilder::new("git");
        builder
            .command("remote", |c| {
                c.option(OptionSpec::single("name").short('n').long("name"));
            })
            .command("add", |c| {
                c.on_execute(|_| 1);
            });
        builder.build().expect("builds")
    }

    #[test]
    fn test_parse_selects_deepest_command() {
        let line = git();
        let executor = line.parse(["remote", "--name", "origin", "add", "-d"]).expect("parses");

        assert_eq!(executor.command_path(), ["remote", "add"]);
        assert_eq!(executor.selected_command().name(), "add");
        assert!(!executor.is_default_command());
        assert!(executor.application_state().debug);
        assert_eq!(executor.bound_options().value("name"), Some("origin"));
        assert!(executor.bound_options().flag(DEBUG));
    }

    #[test]
    fn test_parse_without_arguments_selects_root() {
        let line = git();
        let executor = line.parse(Vec::<String>::new()).expect("parses");
        assert!(executor.is_default_command());
        assert_eq!(executor.selected_command().name(), "git");
        assert!(!executor.is_showing_information());
    }

    #[test]
    fn test_help_marks_parse_as_informational() {
        let line = git();
        let executor = line.parse(["remote", "--name", "x", "--help"]).expect("help is not an error");
        assert!(executor.is_showing_information());
        assert!(executor.is_default_command());
        assert_eq!(executor.selected_command().name(), "remote");
        assert!(executor.information().is_some_and(|text| text.contains("Usage")));
    }

    #[test]
    fn test_unknown_option_is_a_parse_error() {
        let err = git().parse(["--nope"]).unwrap_err();
        assert!(matches!(err, CmdlineError::Parse(ref e) if e.kind() == ErrorKind::UnknownArgument));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_log_level_value_is_a_parse_error() {
        assert!(matches!(git().parse(["-l"]), Err(CmdlineError::Parse(_))));
    }

    #[test]
    fn test_parse_hooks_run_on_parse_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hook = Arc::clone(&seen);
        let mut builder = CommandLineBuilder::new("app");
        builder.on_parse(move |state| {
            if let Ok(mut seen) = hook.lock() {
                seen.push(state.log_level());
            }
        });
        let line = builder.build().expect("builds");

        line.parse(["--loglevel", "warning"]).expect("parses");
        line.parse(["--help"]).expect("parses");
        line.parse(["-l", "bogus"]).expect("parses");

        assert_eq!(*seen.lock().expect("lock"), vec![LogLevel::Warning]);
    }

    #[test]
    fn test_scan_path_skips_option_values() {
        let line = git();
        let args: Vec<String> = ["--name=x", "-l", "remote", "remote", "-n", "add", "add"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(line.scan_path(&args), vec!["remote", "add"]);
        assert!(line.scan_path(&["--".to_string(), "remote".to_string()]).is_empty());
    }

    #[test]
    fn test_help_text_for_nested_command() {
        let line = git();
        let help = line.help_text(&["remote", "add"]).expect("command exists");
        assert!(help.contains("--verbose"), "{help}");
        assert!(help.contains("--help"), "{help}");
        assert!(line.help_text(&["missing"]).is_none());
        assert!(line.help_text(&[RUN_COMMAND]).is_some_and(|h| h.contains("Run the application")));
    }
}
