mod finalize;
pub(crate) mod globals;
mod node;
mod option;

pub(crate) use finalize::{REMAINING_ARGS, to_clap, validate_tree};
pub(crate) use node::NodeRole;
pub use node::{CommandNode, RUN_COMMAND};
pub use option::{OptionKind, OptionSpec, OptionValidator};
