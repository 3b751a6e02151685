//! Validadores concretos reutilizables.

use std::fmt;

use super::{InvalidParameters, ParametersValidator};
use crate::params::ParameterSet;

/// Claves requeridas + opcionales. Si la lista de opcionales no está vacía,
/// cualquier clave fuera de ambas listas se rechaza.
#[derive(Debug, Clone, Default)]
pub struct DefaultParametersValidator {
    required: Vec<String>,
    optional: Vec<String>,
}

impl DefaultParametersValidator {
    pub fn new<R, O>(required: R, optional: O) -> Self
        where R: IntoIterator,
              R::Item: Into<String>,
              O: IntoIterator,
              O::Item: Into<String>
    {
        Self { required: required.into_iter().map(Into::into).collect(),
               optional: optional.into_iter().map(Into::into).collect() }
    }
}

impl ParametersValidator for DefaultParametersValidator {
    fn name(&self) -> &str {
        "default"
    }

    fn validate(&self, params: &ParameterSet) -> Result<(), InvalidParameters> {
        let missing: Vec<&str> = self.required.iter().map(String::as_str).filter(|k| !params.contains_key(k)).collect();
        if !missing.is_empty() {
            return Err(InvalidParameters::new(self.name(), format!("missing required keys: {missing:?}")));
        }
        if !self.optional.is_empty() {
            let unknown: Vec<&str> = params.keys()
                                           .filter(|k| !self.required.iter().any(|r| r == k) && !self.optional.iter().any(|o| o == k))
                                           .collect();
            if !unknown.is_empty() {
                return Err(InvalidParameters::new(self.name(), format!("unexpected keys: {unknown:?}")));
            }
        }
        Ok(())
    }
}

/// Conjunto cerrado de valores (comparación sin distinguir mayúsculas). Una
/// clave ausente no es un error aquí.
#[derive(Debug, Clone)]
pub struct AllowedValuesValidator {
    key: String,
    allowed: Vec<String>,
}

impl AllowedValuesValidator {
    pub fn new<I>(key: impl Into<String>, allowed: I) -> Self
        where I: IntoIterator,
              I::Item: Into<String>
    {
        Self { key: key.into(),
               allowed: allowed.into_iter().map(Into::into).collect() }
    }
}

impl ParametersValidator for AllowedValuesValidator {
    fn name(&self) -> &str {
        "allowed-values"
    }

    fn validate(&self, params: &ParameterSet) -> Result<(), InvalidParameters> {
        let Some(v) = params.get_value(&self.key) else {
            return Ok(());
        };
        let v = v.to_string();
        if self.allowed.iter().any(|a| a.eq_ignore_ascii_case(&v)) {
            Ok(())
        } else {
            Err(InvalidParameters::new(self.name(),
                                       format!("'{}'={v} not in {:?}", self.key, self.allowed)))
        }
    }
}

/// Cuando `key == value` (comparación exacta salvo `case_insensitive`), las
/// claves `required` deben estar presentes.
#[derive(Debug, Clone)]
pub struct ConditionalRequiredValidator {
    key: String,
    value: String,
    required: Vec<String>,
    ignore_case: bool,
}

impl ConditionalRequiredValidator {
    pub fn new<I>(key: impl Into<String>, value: impl Into<String>, required: I) -> Self
        where I: IntoIterator,
              I::Item: Into<String>
    {
        Self { key: key.into(),
               value: value.into(),
               required: required.into_iter().map(Into::into).collect(),
               ignore_case: false }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    fn matches(&self, actual: &str) -> bool {
        if self.ignore_case {
            actual.eq_ignore_ascii_case(&self.value)
        } else {
            actual == self.value
        }
    }
}

impl ParametersValidator for ConditionalRequiredValidator {
    fn name(&self) -> &str {
        "conditional-required"
    }

    fn validate(&self, params: &ParameterSet) -> Result<(), InvalidParameters> {
        let active = params.get_value(&self.key).map(|v| self.matches(&v.to_string())).unwrap_or(false);
        if !active {
            return Ok(());
        }
        let missing: Vec<&str> = self.required.iter().map(String::as_str).filter(|k| !params.contains_key(k)).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(InvalidParameters::new(self.name(),
                                       format!("{}={} requires {missing:?}", self.key, self.value)))
        }
    }
}

/// Las claves presentes no pueden ser strings vacíos o sólo espacios.
#[derive(Debug, Clone)]
pub struct NonBlankValidator {
    keys: Vec<String>,
}

impl NonBlankValidator {
    pub fn new<I>(keys: I) -> Self
        where I: IntoIterator,
              I::Item: Into<String>
    {
        Self { keys: keys.into_iter().map(Into::into).collect() }
    }
}

impl ParametersValidator for NonBlankValidator {
    fn name(&self) -> &str {
        "non-blank"
    }

    fn validate(&self, params: &ParameterSet) -> Result<(), InvalidParameters> {
        for k in &self.keys {
            if let Some(v) = params.get_value(k) {
                if v.to_string().trim().is_empty() {
                    return Err(InvalidParameters::new(self.name(), format!("'{k}' must not be blank")));
                }
            }
        }
        Ok(())
    }
}

/// Al menos una de las claves debe estar presente.
#[derive(Debug, Clone)]
pub struct AnyKeyPresentValidator {
    keys: Vec<String>,
}

impl AnyKeyPresentValidator {
    pub fn new<I>(keys: I) -> Self
        where I: IntoIterator,
              I::Item: Into<String>
    {
        Self { keys: keys.into_iter().map(Into::into).collect() }
    }
}

impl ParametersValidator for AnyKeyPresentValidator {
    fn name(&self) -> &str {
        "any-key-present"
    }

    fn validate(&self, params: &ParameterSet) -> Result<(), InvalidParameters> {
        if self.keys.iter().any(|k| params.contains_key(k)) {
            Ok(())
        } else {
            Err(InvalidParameters::new(self.name(), format!("one of {:?} is required", self.keys)))
        }
    }
}

type ValidateFn = dyn Fn(&ParameterSet) -> Result<(), String> + Send + Sync;

/// Validador ad-hoc a partir de un closure.
pub struct FnValidator {
    name: String,
    f: Box<ValidateFn>,
}

impl FnValidator {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
        where F: Fn(&ParameterSet) -> Result<(), String> + Send + Sync + 'static
    {
        Self { name: name.into(),
               f: Box::new(f) }
    }
}

impl fmt::Debug for FnValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator").field("name", &self.name).finish()
    }
}

impl ParametersValidator for FnValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, params: &ParameterSet) -> Result<(), InvalidParameters> {
        (self.f)(params).map_err(|reason| InvalidParameters::new(self.name.clone(), reason))
    }
}
