pub mod log_level;
pub mod module;
pub mod options;
pub mod outcome;
pub mod state;

pub use log_level::LogLevel;
pub use module::ModuleInfo;
pub use options::BoundOptions;
pub use outcome::ExecutionOutcome;
pub use state::ApplicationState;
