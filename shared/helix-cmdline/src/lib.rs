//! Convention-driven command-line applications on top of clap.
//!
//! A [`CommandLineBuilder`] collects conventions, commands, hooks and
//! services. [`CommandLineBuilder::build`] applies the conventions in order,
//! adds the implicit `run` command, attaches help to every command and checks
//! the tree. The resulting [`CommandLine`] parses arguments, binds the global
//! verbosity options into an [`ApplicationState`] and dispatches the selected
//! command's handler with its dependencies resolved by a [`ServiceResolver`].

pub mod builder;
pub mod config;
pub mod conventions;
pub mod domain;
pub mod engine;
pub mod error;
pub mod handler;
pub mod logging;
pub mod ports;
pub mod services;
pub mod tree;

pub use builder::CommandLineBuilder;
pub use config::Settings;
pub use conventions::{CommandLineConvention, Convention, ConventionContext, ConventionPipeline};
pub use domain::{ApplicationState, BoundOptions, ExecutionOutcome, LogLevel, ModuleInfo};
pub use engine::{CommandLine, Executor, ValidationError};
pub use error::{CmdlineError, Result};
pub use handler::{AsyncCommandHandler, CommandDefinition, CommandHandler, FromServices, IntoExitCode};
pub use ports::{CandidateFinder, ModuleProvider, ServiceProvider, SharedService, StaticModules};
pub use services::{PhysicalConsole, ServiceCollection, ServiceResolver};
pub use tree::{CommandNode, OptionKind, OptionSpec, RUN_COMMAND};
