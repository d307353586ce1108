//! Exertion data payload.

use crate::ExertionId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
pub use serde_json::Value;

/// Path-addressed inputs and outputs of an exertion.
///
/// Entries keep insertion order so traces and printed results read in the
/// order the caller built them. The `owner` back-reference names the
/// exertion that currently carries this context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    name: String,
    #[serde(default)]
    entries: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<ExertionId>,
}

impl Context {
    /// Create an empty named context.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder form of [`Context::put`].
    pub fn with(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(path, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind a value at `path`, returning the previous value.
    pub fn put(&mut self, path: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(path.into(), value.into())
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        self.entries.shift_remove(path)
    }

    /// Copy every entry of `other` into this context, overwriting on conflict.
    pub fn merge(&mut self, other: &Context) {
        for (path, value) in &other.entries {
            self.entries.insert(path.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The exertion this context is bound to.
    pub fn owner(&self) -> Option<ExertionId> {
        self.owner
    }

    pub fn set_owner(&mut self, owner: ExertionId) {
        self.owner = Some(owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_get_keeps_order() {
        let mut ctx = Context::new("calc");
        ctx.put("arg/x", 1);
        ctx.put("arg/y", 2);
        ctx.put("result", json!(null));

        let paths: Vec<_> = ctx.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["arg/x", "arg/y", "result"]);
        assert_eq!(ctx.get("arg/y"), Some(&json!(2)));
    }

    #[test]
    fn test_put_returns_previous() {
        let mut ctx = Context::default();
        assert!(ctx.put("a", "x").is_none());
        assert_eq!(ctx.put("a", "y"), Some(json!("x")));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_merge_overwrites() {
        let mut a = Context::new("a").with("x", 1).with("y", 2);
        let b = Context::new("b").with("y", 20).with("z", 30);
        a.merge(&b);
        assert_eq!(a.get("y"), Some(&json!(20)));
        assert_eq!(a.get("z"), Some(&json!(30)));
        assert_eq!(a.name(), "a");
    }

    #[test]
    fn test_remove_preserves_order_of_rest() {
        let mut ctx = Context::new("c").with("a", 1).with("b", 2).with("c", 3);
        assert_eq!(ctx.remove("a"), Some(json!(1)));
        let paths: Vec<_> = ctx.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["b", "c"]);
    }
}
