//! `ExecutionContext`: espacio clave/valor mutable, propiedad exclusiva de
//! una ejecución. `ContextView` es una instantánea de sólo lectura: no expone
//! ninguna operación de escritura, así que no hay escrituras silenciosamente
//! perdidas sobre copias.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    entries: BTreeMap<String, Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserta o sobrescribe.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.entries.get(key).and_then(Value::as_i64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn view(&self) -> ContextView {
        ContextView { inner: self.clone() }
    }
}

/// Instantánea inmutable de un contexto.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContextView {
    inner: ExecutionContext,
}

impl ContextView {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner.get_str(key)
    }
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.inner.get_i64(key)
    }
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_is_detached_from_owner() {
        let mut ctx = ExecutionContext::new();
        ctx.put("a", 1);
        let view = ctx.view();
        ctx.put("a", 2);
        assert_eq!(view.get_i64("a"), Some(1));
        assert_eq!(ctx.get_i64("a"), Some(2));
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut ctx = ExecutionContext::new();
        ctx.put("k", "v");
        assert_eq!(serde_json::to_string(&ctx).expect("ser"), r#"{"k":"v"}"#);
    }
}
