use std::fmt;
use std::sync::Arc;

use clap::{Arg, ArgAction};

pub type OptionValidator = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Flag,
    Single,
    Multiple,
}

/// One option declared on a command node.
///
/// Inherited options are declared once and accepted by every descendant
/// without redeclaration.
#[derive(Clone)]
pub struct OptionSpec {
    id: String,
    kind: OptionKind,
    short: Option<char>,
    long: Option<String>,
    aliases: Vec<String>,
    help: Option<String>,
    value_name: Option<String>,
    inherited: bool,
    hidden: bool,
    validator: Option<OptionValidator>,
}

impl OptionSpec {
    fn new(id: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            id: id.into(),
            kind,
            short: None,
            long: None,
            aliases: Vec::new(),
            help: None,
            value_name: None,
            inherited: false,
            hidden: false,
            validator: None,
        }
    }

    pub fn flag(id: impl Into<String>) -> Self {
        Self::new(id, OptionKind::Flag)
    }

    pub fn single(id: impl Into<String>) -> Self {
        Self::new(id, OptionKind::Single)
    }

    pub fn multiple(id: impl Into<String>) -> Self {
        Self::new(id, OptionKind::Multiple)
    }

    #[must_use]
    pub const fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    #[must_use]
    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn value_name(mut self, name: impl Into<String>) -> Self {
        self.value_name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }

    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    #[must_use]
    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn kind(&self) -> OptionKind {
        self.kind
    }

    pub const fn short_name(&self) -> Option<char> {
        self.short
    }

    pub fn long_name(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub const fn is_inherited(&self) -> bool {
        self.inherited
    }

    pub const fn takes_value(&self) -> bool {
        !matches!(self.kind, OptionKind::Flag)
    }

    /// `--long`, `-s` or the bare id, for messages.
    pub fn display_name(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(short)) => format!("-{short}"),
            (None, None) => self.id.clone(),
        }
    }

    /// True when `token` (without any `=value` suffix) names this option.
    pub fn matches_token(&self, token: &str) -> bool {
        if let Some(long) = token.strip_prefix("--") {
            return self.long.as_deref() == Some(long) || self.aliases.iter().any(|a| a == long);
        }

        let mut chars = token.strip_prefix('-').unwrap_or_default().chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if Some(c) == self.short)
    }

    pub fn validate(&self, value: &str) -> Result<(), String> {
        self.validator.as_ref().map_or(Ok(()), |validate| validate(value))
    }

    pub const fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    pub(crate) fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.id.clone())
            .global(self.inherited)
            .hide(self.hidden);

        if let Some(short) = self.short {
            arg = arg.short(short);
        }
        if let Some(long) = &self.long {
            arg = arg.long(long.clone());
        }
        for alias in &self.aliases {
            arg = arg.alias(alias.clone());
        }
        if let Some(help) = &self.help {
            arg = arg.help(help.clone());
        }
        if let Some(value_name) = &self.value_name {
            arg = arg.value_name(value_name.clone());
        }

        match self.kind {
            OptionKind::Flag => arg.action(ArgAction::SetTrue),
            OptionKind::Single => arg.action(ArgAction::Set).num_args(1),
            OptionKind::Multiple => arg.action(ArgAction::Append).num_args(1),
        }
    }
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("short", &self.short)
            .field("long", &self.long)
            .field("inherited", &self.inherited)
            .field("validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}
