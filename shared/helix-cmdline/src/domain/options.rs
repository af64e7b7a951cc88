use std::collections::{BTreeMap, BTreeSet};

/// Option values bound along the selected command path, keyed by option id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundOptions {
    command_path: Vec<String>,
    flags: BTreeSet<String>,
    values: BTreeMap<String, Vec<String>>,
}

impl BoundOptions {
    pub(crate) fn new(command_path: Vec<String>) -> Self {
        Self {
            command_path,
            ..Self::default()
        }
    }

    pub(crate) fn set_flag(&mut self, id: impl Into<String>) {
        self.flags.insert(id.into());
    }

    pub(crate) fn set_values(&mut self, id: impl Into<String>, values: Vec<String>) {
        self.values.insert(id.into(), values);
    }

    /// Names of the selected command and its ancestors below the root.
    pub fn command_path(&self) -> &[String] {
        &self.command_path
    }

    pub fn flag(&self, id: &str) -> bool {
        self.flags.contains(id)
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        self.values
            .get(id)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    pub fn values(&self, id: &str) -> &[String] {
        self.values.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn is_present(&self, id: &str) -> bool {
        self.flag(id) || self.values.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_returns_last_occurrence() {
        let mut options = BoundOptions::new(vec!["remote".into(), "add".into()]);
        options.set_values("tag", vec!["a".into(), "b".into()]);
        options.set_flag("force");

        assert_eq!(options.value("tag"), Some("b"));
        assert_eq!(options.values("tag"), ["a".to_string(), "b".to_string()]);
        assert!(options.flag("force"));
        assert!(options.is_present("tag"));
        assert!(!options.is_present("missing"));
        assert!(options.values("missing").is_empty());
        assert_eq!(options.command_path(), ["remote", "add"]);
    }
}
