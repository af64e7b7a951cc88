//! Conventions: units of configuration applied to the command tree during build.

mod context;
mod pipeline;

pub use context::ConventionContext;
pub use pipeline::{CommandLineConvention, Convention, ConventionPipeline};
