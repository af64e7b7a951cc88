//! Parsing and dispatch of a built command line.

mod command_line;
mod executor;
mod validation;

pub use command_line::CommandLine;
pub(crate) use command_line::ParseHook;
pub use executor::Executor;
pub use validation::ValidationError;
pub(crate) use validation::ValidationHandler;
