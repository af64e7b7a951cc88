use crate::domain::ModuleInfo;

/// Enumerates the modules visible to conventions.
pub trait ModuleProvider: Send + Sync {
    fn modules(&self) -> Vec<ModuleInfo>;
}

/// Finds modules that reference any of the given modules.
pub trait CandidateFinder: Send + Sync {
    fn find_candidates(&self, references: &[&str]) -> Vec<ModuleInfo>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticModules {
    modules: Vec<ModuleInfo>,
}

impl StaticModules {
    pub const fn new(modules: Vec<ModuleInfo>) -> Self {
        Self { modules }
    }
}

impl ModuleProvider for StaticModules {
    fn modules(&self) -> Vec<ModuleInfo> {
        self.modules.clone()
    }
}

impl CandidateFinder for StaticModules {
    fn find_candidates(&self, references: &[&str]) -> Vec<ModuleInfo> {
        self.modules
            .iter()
            .filter(|m| references.iter().any(|r| m.references(r)))
            .cloned()
            .collect()
    }
}
