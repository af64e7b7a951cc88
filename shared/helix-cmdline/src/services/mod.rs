mod collection;
mod console;
mod resolver;

pub use collection::ServiceCollection;
pub use console::PhysicalConsole;
pub(crate) use resolver::ProviderFactory;
pub use resolver::ServiceResolver;
