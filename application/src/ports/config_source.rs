//! Configuration source port
//!
//! Tools may declare `required_config_keys` (API keys, endpoints). The
//! registry asks a [`ConfigSource`] whether each key is present when a tool
//! is registered; missing keys make the tool unavailable for live use.

use std::collections::HashMap;

/// Read-only lookup of configuration values by key
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// A key counts as present only when it has a non-empty value
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.trim().is_empty())
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Source with no values, for tools that declare no required keys
pub struct EmptyConfigSource;

impl ConfigSource for EmptyConfigSource {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}
