pub mod discovery;
pub mod provider;

pub use discovery::{CandidateFinder, ModuleProvider, StaticModules};
pub use provider::{ServiceProvider, SharedService};
