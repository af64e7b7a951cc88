use std::collections::HashSet;

use clap::{Arg, ArgAction, Command};

use super::{CommandNode, NodeRole, OptionSpec, RUN_COMMAND};
use crate::domain::ModuleInfo;
use crate::error::{CmdlineError, Result};

/// Argument id under which trailing arguments are collected.
pub(crate) const REMAINING_ARGS: &str = "remaining";

const VERSION_ARG: &str = "version";
const HELP_ARG: &str = "help";

/// Rejects trees clap would refuse or silently misparse.
pub(crate) fn validate_tree(root: &CommandNode) -> Result<()> {
    check_name(root.name(), root.name())?;
    let mut inherited = Vec::new();
    let mut path = vec![root.name()];
    validate_node(root, &mut inherited, &mut path)
}

fn validate_node<'a>(
    node: &'a CommandNode,
    inherited: &mut Vec<&'a OptionSpec>,
    path: &mut Vec<&'a str>,
) -> Result<()> {
    let label = path.join(" ");
    check_options(node, inherited, &label)?;

    let depth = inherited.len();
    inherited.extend(node.options().iter().filter(|o| o.is_inherited()));

    let mut seen = HashSet::new();
    for child in node.subcommands() {
        if node.role() == NodeRole::Root
            && child.role() != NodeRole::Run
            && child.answers_to(RUN_COMMAND)
        {
            return Err(CmdlineError::Configuration(format!(
                "`{RUN_COMMAND}` is reserved for the default command of `{label}`"
            )));
        }

        for name in std::iter::once(child.name()).chain(child.aliases().iter().map(String::as_str)) {
            check_name(name, &label)?;
            if !seen.insert(name) {
                return Err(CmdlineError::Configuration(format!(
                    "duplicate command name `{name}` under `{label}`"
                )));
            }
        }

        path.push(child.name());
        validate_node(child, inherited, path)?;
        path.pop();
    }

    inherited.truncate(depth);
    Ok(())
}

fn check_name(name: &str, parent: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(CmdlineError::Configuration(format!(
            "invalid command name `{name}` under `{parent}`"
        )));
    }
    Ok(())
}

fn check_options(node: &CommandNode, inherited: &[&OptionSpec], label: &str) -> Result<()> {
    let mut ids: Vec<&str> = inherited.iter().map(|o| o.id()).collect();
    let mut shorts: Vec<char> = inherited.iter().filter_map(|o| o.short_name()).collect();
    let mut longs: Vec<&str> = inherited.iter().copied().flat_map(long_names).collect();

    if node.has_help_option() {
        ids.push(HELP_ARG);
        shorts.push('h');
        longs.push(HELP_ARG);
    }
    if node.role() == NodeRole::Root {
        ids.push(VERSION_ARG);
        longs.push(VERSION_ARG);
    }
    if node.allows_external_args() {
        ids.push(REMAINING_ARGS);
    }

    let clash = |what: String| {
        CmdlineError::Configuration(format!("{what} on `{label}` clashes with an existing option"))
    };

    for option in node.options() {
        if option.id().is_empty() {
            return Err(CmdlineError::Configuration(format!(
                "option without an id on `{label}`"
            )));
        }
        if ids.contains(&option.id()) {
            return Err(clash(format!("option `{}`", option.id())));
        }
        ids.push(option.id());

        if let Some(short) = option.short_name() {
            if shorts.contains(&short) {
                return Err(clash(format!("flag `-{short}`")));
            }
            shorts.push(short);
        }

        for long in long_names(option) {
            if longs.contains(&long) {
                return Err(clash(format!("flag `--{long}`")));
            }
            longs.push(long);
        }
    }

    Ok(())
}

fn long_names(option: &OptionSpec) -> impl Iterator<Item = &str> {
    option
        .long_name()
        .into_iter()
        .chain(option.aliases().iter().map(String::as_str))
}

/// Converts the finished tree into the clap command used for every parse.
pub(crate) fn to_clap(root: &CommandNode, entry: &ModuleInfo) -> Command {
    to_command(root)
        .disable_version_flag(true)
        .version(entry.version.clone())
        .long_version(entry.long_version())
        .arg(
            Arg::new(VERSION_ARG)
                .long(VERSION_ARG)
                .action(ArgAction::Version)
                .help("Print version"),
        )
}

fn to_command(node: &CommandNode) -> Command {
    let mut command = Command::new(node.name().to_string())
        .disable_help_flag(!node.has_help_option())
        .disable_help_subcommand(true)
        .args_override_self(true)
        .hide(node.is_hidden());

    if let Some(about) = node.description() {
        command = command.about(about.to_string());
    }
    if let Some(text) = node.long_description() {
        command = command.long_about(text.to_string());
    }
    for alias in node.aliases() {
        command = command.alias(alias.clone());
    }

    command = command.args(node.options().iter().map(OptionSpec::to_arg));

    if node.allows_external_args() {
        command = command.arg(
            Arg::new(REMAINING_ARGS)
                .value_name("ARGS")
                .help("Arguments passed through to the application")
                .action(ArgAction::Append)
                .num_args(1..)
                .trailing_var_arg(true),
        );
    }

    command.subcommands(node.subcommands().iter().map(to_command))
}
