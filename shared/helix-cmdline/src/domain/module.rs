use serde::{Deserialize, Serialize};

/// Build metadata of a compiled module, used for `--version` and discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub version: String,
    pub informational_version: Option<String>,
    pub references: Vec<String>,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            informational_version: None,
            references: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_informational_version(mut self, informational: impl Into<String>) -> Self {
        self.informational_version = Some(informational.into());
        self
    }

    #[must_use]
    pub fn with_reference(mut self, module: impl Into<String>) -> Self {
        self.references.push(module.into());
        self
    }

    pub fn informational_version(&self) -> &str {
        self.informational_version.as_deref().unwrap_or(&self.version)
    }

    /// Text printed by `--version`: the version, plus the informational version when it differs.
    pub fn long_version(&self) -> String {
        let informational = self.informational_version();
        if informational == self.version {
            self.version.clone()
        } else {
            format!("{} ({informational})", self.version)
        }
    }

    pub fn references(&self, module: &str) -> bool {
        self.references.iter().any(|r| r == module)
    }
}

/// [`ModuleInfo`] of the calling crate, read from Cargo's environment at compile time.
#[macro_export]
macro_rules! module_info {
    () => {
        $crate::ModuleInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    };
    ($informational:expr) => {
        $crate::ModuleInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
            .with_informational_version($informational)
    };
}
