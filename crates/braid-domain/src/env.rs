//! Per-label environment stores.
//!
//! An [`EnvStore`] holds, per variable name, an ordered recipe
//! ([`EnvBuilder`]) for computing the variable's value from whatever value it
//! had before. Stores are registered against label patterns and applied to a
//! base environment in match-specificity order by the build driver.

use std::collections::BTreeMap;

/// The environment a store applies to, and the one an action receives.
pub type Environment = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvType {
    /// An opaque value.
    #[default]
    SimpleValue,
    /// A colon-separated path list; prepends and appends deduplicate.
    Path,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvMode {
    Append,
    Replace,
    Prepend,
}

/// A recipe for one environment variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvBuilder {
    prepend_list: Vec<String>,
    append_list: Vec<String>,
    retain_old_value: bool,
    env_type: EnvType,
    erased: bool,
}

impl Default for EnvBuilder {
    fn default() -> Self {
        EnvBuilder {
            prepend_list: Vec::new(),
            append_list: Vec::new(),
            retain_old_value: true,
            env_type: EnvType::SimpleValue,
            erased: false,
        }
    }
}

impl EnvBuilder {
    pub fn new() -> Self {
        EnvBuilder::default()
    }

    pub fn set_type(&mut self, env_type: EnvType) {
        self.env_type = env_type;
    }

    pub fn env_type(&self) -> EnvType {
        self.env_type
    }

    /// True iff applying this builder would leave the variable untouched.
    pub fn is_empty(&self) -> bool {
        !self.erased && self.prepend_list.is_empty() && self.append_list.is_empty()
    }

    pub fn is_erased(&self) -> bool {
        self.erased
    }

    pub fn erase(&mut self) {
        self.prepend_list.clear();
        self.append_list.clear();
        self.retain_old_value = true;
        self.erased = true;
    }

    /// Replace the value outright: the old value is discarded.
    pub fn set(&mut self, value: impl Into<String>) {
        self.prepend_list = vec![value.into()];
        self.append_list.clear();
        self.retain_old_value = false;
        self.erased = false;
    }

    pub fn prepend(&mut self, value: impl Into<String>) {
        match self.env_type {
            EnvType::SimpleValue => {
                self.erased = false;
                self.prepend_list.insert(0, value.into());
            }
            EnvType::Path => self.ensure_prepended(value),
        }
    }

    pub fn append(&mut self, value: impl Into<String>) {
        match self.env_type {
            EnvType::SimpleValue => {
                self.erased = false;
                self.append_list.push(value.into());
            }
            EnvType::Path => self.ensure_appended(value),
        }
    }

    /// Move `value` to the front of the prepend list, deduplicating.
    pub fn ensure_prepended(&mut self, value: impl Into<String>) {
        self.erased = false;
        let value = value.into();
        self.prepend_list.retain(|existing| *existing != value);
        self.prepend_list.insert(0, value);
    }

    /// Move `value` to the back of the append list, deduplicating.
    pub fn ensure_appended(&mut self, value: impl Into<String>) {
        self.erased = false;
        let value = value.into();
        self.append_list.retain(|existing| *existing != value);
        self.append_list.push(value);
    }

    /// Fold another builder's instructions into this one. The other
    /// builder's type and retain flag win.
    pub fn merge(&mut self, other: &EnvBuilder) {
        if other.erased {
            self.erase();
            return;
        }
        self.env_type = other.env_type;
        self.retain_old_value = other.retain_old_value;
        for value in &other.prepend_list {
            self.ensure_prepended(value.clone());
        }
        for value in &other.append_list {
            self.ensure_appended(value.clone());
        }
    }

    /// Compute the variable's new value given its old one. `None` means the
    /// variable should be removed.
    pub fn value(&self, old_value: Option<&str>) -> Option<String> {
        if self.erased {
            return None;
        }
        let mut parts: Vec<&str> = self.prepend_list.iter().map(String::as_str).collect();
        if self.retain_old_value {
            if let Some(old) = old_value {
                parts.push(old);
            }
        }
        parts.extend(self.append_list.iter().map(String::as_str));
        Some(parts.join(":"))
    }
}

/// A set of variable recipes, applied together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvStore {
    vars: BTreeMap<String, EnvBuilder>,
}

impl EnvStore {
    pub fn new() -> Self {
        EnvStore::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// The builder for `name`, inventing one if there isn't one yet.
    pub fn builder_for(&mut self, name: &str) -> &mut EnvBuilder {
        self.vars.entry(name.to_string()).or_default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.builder_for(name).set(value);
    }

    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.builder_for(name).append(value);
    }

    pub fn prepend(&mut self, name: &str, value: impl Into<String>) {
        self.builder_for(name).prepend(value);
    }

    pub fn ensure_appended(&mut self, name: &str, value: impl Into<String>) {
        self.builder_for(name).ensure_appended(value);
    }

    pub fn ensure_prepended(&mut self, name: &str, value: impl Into<String>) {
        self.builder_for(name).ensure_prepended(value);
    }

    pub fn set_type(&mut self, name: &str, env_type: EnvType) {
        self.builder_for(name).set_type(env_type);
    }

    pub fn erase(&mut self, name: &str) {
        self.builder_for(name).erase();
    }

    pub fn op(&mut self, name: &str, mode: EnvMode, value: impl Into<String>) {
        match mode {
            EnvMode::Append => self.append(name, value),
            EnvMode::Replace => self.set(name, value),
            EnvMode::Prepend => self.prepend(name, value),
        }
    }

    /// Merge another store into this one; the other store's instructions
    /// override or augment ours.
    pub fn merge(&mut self, other: &EnvStore) {
        for (name, builder) in &other.vars {
            self.builder_for(name).merge(builder);
        }
    }

    /// Apply every recipe to `env` in variable-name order.
    pub fn apply(&self, env: &mut Environment) {
        for (name, builder) in &self.vars {
            let old_value = env.get(name).map(String::as_str);
            match builder.value(old_value) {
                Some(value) => {
                    env.insert(name.clone(), value);
                }
                None => {
                    env.remove(name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_discards_the_old_value() {
        let mut store = EnvStore::new();
        store.set("NAME", "new");
        let mut env = Environment::new();
        env.insert("NAME".to_string(), "old".to_string());
        store.apply(&mut env);
        assert_eq!(env.get("NAME").map(String::as_str), Some("new"));
    }

    #[test]
    fn append_and_prepend_keep_the_old_value() {
        let mut store = EnvStore::new();
        store.prepend("PATH", "/first");
        store.append("PATH", "/last");
        let mut env = Environment::new();
        env.insert("PATH".to_string(), "/old".to_string());
        store.apply(&mut env);
        assert_eq!(env.get("PATH").map(String::as_str), Some("/first:/old:/last"));
    }

    #[test]
    fn path_type_prepends_deduplicate() {
        let mut builder = EnvBuilder::new();
        builder.set_type(EnvType::Path);
        builder.prepend("/a");
        builder.prepend("/b");
        builder.prepend("/a");
        assert_eq!(builder.value(None).as_deref(), Some("/a:/b"));
    }

    #[test]
    fn erase_removes_the_variable() {
        let mut store = EnvStore::new();
        store.erase("GONE");
        let mut env = Environment::new();
        env.insert("GONE".to_string(), "x".to_string());
        store.apply(&mut env);
        assert!(!env.contains_key("GONE"));
    }

    #[test]
    fn erase_is_a_noop_for_absent_variables() {
        let mut store = EnvStore::new();
        store.erase("NEVER_SET");
        let mut env = Environment::new();
        store.apply(&mut env);
        assert!(env.is_empty());
    }

    #[test]
    fn merge_overrides_with_the_other_stores_instructions() {
        let mut base = EnvStore::new();
        base.set("A", "base");
        base.set("B", "base");
        let mut over = EnvStore::new();
        over.set("B", "override");
        over.erase("A");
        base.merge(&over);
        let mut env = Environment::new();
        base.apply(&mut env);
        assert!(!env.contains_key("A"));
        assert_eq!(env.get("B").map(String::as_str), Some("override"));
    }

    #[test]
    fn setting_again_revives_an_erased_builder() {
        let mut builder = EnvBuilder::new();
        builder.erase();
        builder.set("back");
        assert_eq!(builder.value(Some("old")).as_deref(), Some("back"));
    }
}
