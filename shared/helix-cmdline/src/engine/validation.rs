use std::fmt;

use crate::error::Result;
use crate::services::PhysicalConsole;
use crate::tree::OptionSpec;

pub(crate) type ValidationHandler = dyn Fn(&[ValidationError]) -> i32 + Send + Sync;

/// An option value rejected by its validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub option: String,
    pub value: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.option, self.message)
    }
}

/// Runs the option's validator over every bound value.
pub(crate) fn check(option: &OptionSpec, values: &[String], errors: &mut Vec<ValidationError>) {
    if !option.has_validator() {
        return;
    }

    for value in values {
        if let Err(message) = option.validate(value) {
            errors.push(ValidationError {
                option: option.display_name(),
                value: value.clone(),
                message,
            });
        }
    }
}

/// Writes one `error:` line per failure to stderr and returns 1.
pub(crate) fn report(errors: &[ValidationError]) -> Result<i32> {
    let console = PhysicalConsole::shared();
    for error in errors {
        console.write_err(&format!("error: {error}\n"))?;
    }
    Ok(1)
}
