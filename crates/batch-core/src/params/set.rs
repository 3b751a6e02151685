//! `ParameterSet`: bolsa inmutable clave -> parámetro tipado.
//!
//! Se almacena en un `BTreeMap`, por lo que la igualdad y la serialización
//! no dependen del orden de inserción.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::value::{JobParameter, ParamValue};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    entries: BTreeMap<String, JobParameter>,
}

impl ParameterSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> ParameterSetBuilder {
        ParameterSetBuilder::default()
    }

    /// Builder pre-cargado con las entradas actuales (el set original no se
    /// modifica).
    pub fn to_builder(&self) -> ParameterSetBuilder {
        ParameterSetBuilder { entries: self.entries.clone() }
    }

    pub fn get(&self, key: &str) -> Option<&JobParameter> {
        self.entries.get(key)
    }

    pub fn get_value(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key).map(|p| &p.value)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.get_value(key) {
            Some(ParamValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        match self.get_value(key) {
            Some(ParamValue::Long(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        match self.get_value(key) {
            Some(ParamValue::Double(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_date(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.get_value(key) {
            Some(ParamValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JobParameter)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sólo las entradas identificantes, como objeto JSON `{key: {type, value}}`.
    pub fn identifying_json(&self) -> Value {
        let mut map = Map::new();
        for (k, p) in self.entries.iter().filter(|(_, p)| p.identifying) {
            map.insert(k.clone(), serde_json::to_value(&p.value).unwrap_or(Value::Null));
        }
        Value::Object(map)
    }

    /// Nuevo set sin las claves indicadas.
    pub fn without_keys<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> ParameterSet {
        let mut entries = self.entries.clone();
        for k in keys {
            entries.remove(k);
        }
        ParameterSet { entries }
    }

    /// Unión; en conflicto gana `other`.
    pub fn merged_with(&self, other: &ParameterSet) -> ParameterSet {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        ParameterSet { entries }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParameterSetBuilder {
    entries: BTreeMap<String, JobParameter>,
}

impl ParameterSetBuilder {
    pub fn add_parameter(mut self, key: impl Into<String>, parameter: JobParameter) -> Self {
        self.entries.insert(key.into(), parameter);
        self
    }
    pub fn add_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_parameter(key, JobParameter::identifying(ParamValue::String(value.into())))
    }
    pub fn add_long(self, key: impl Into<String>, value: i64) -> Self {
        self.add_parameter(key, JobParameter::identifying(ParamValue::Long(value)))
    }
    pub fn add_double(self, key: impl Into<String>, value: f64) -> Self {
        self.add_parameter(key, JobParameter::identifying(ParamValue::Double(value)))
    }
    pub fn add_date(self, key: impl Into<String>, value: DateTime<Utc>) -> Self {
        self.add_parameter(key, JobParameter::identifying(ParamValue::Date(value)))
    }
    /// Parámetro que viaja con la ejecución pero no forma parte de la identidad.
    pub fn add_non_identifying(self, key: impl Into<String>, value: ParamValue) -> Self {
        self.add_parameter(key, JobParameter::new(value, false))
    }
    pub fn build(self) -> ParameterSet {
        ParameterSet { entries: self.entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_insertion_order() {
        let a = ParameterSet::builder().add_string("name", "x").add_long("n", 2).build();
        let b = ParameterSet::builder().add_long("n", 2).add_string("name", "x").build();
        assert_eq!(a, b);
        let c = ParameterSet::builder().add_long("n", 3).add_string("name", "x").build();
        assert_ne!(a, c);
    }

    #[test]
    fn typed_getters_do_not_coerce() {
        let p = ParameterSet::builder().add_long("n", 2).add_string("s", "2").build();
        assert_eq!(p.get_long("n"), Some(2));
        assert_eq!(p.get_long("s"), None);
        assert_eq!(p.get_string("s"), Some("2"));
    }

    #[test]
    fn identifying_json_skips_non_identifying_entries() {
        let p = ParameterSet::builder().add_string("a", "1")
                                       .add_non_identifying("b", ParamValue::Long(9))
                                       .build();
        let v = p.identifying_json();
        assert!(v.get("a").is_some());
        assert!(v.get("b").is_none());
    }

    #[test]
    fn serde_roundtrip_keeps_types() {
        let p = ParameterSet::builder().add_double("ratio", 0.5).add_non_identifying("x", ParamValue::String("y".into())).build();
        let s = serde_json::to_string(&p).expect("ser");
        let back: ParameterSet = serde_json::from_str(&s).expect("de");
        assert_eq!(p, back);
    }
}
