/// What a single `execute` produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// A handler or delegate ran and returned this code.
    Completed(i32),
    /// Help or version text was written instead of running anything.
    Informational,
    /// The default path was selected and nothing is configured to run for it.
    NoAction,
    /// Option validation failed; the code comes from the validation error handler.
    ValidationFailed(i32),
}

impl ExecutionOutcome {
    /// Caller-facing result: `None` means there is nothing more to do.
    pub const fn exit_code(self) -> Option<i32> {
        match self {
            Self::Completed(code) | Self::ValidationFailed(code) => Some(code),
            Self::Informational => Some(0),
            Self::NoAction => None,
        }
    }

    pub const fn is_informational(self) -> bool {
        matches!(self, Self::Informational)
    }
}
