//! Pipeline de validación de parámetros.
//!
//! Cada validador es un valor independiente que recibe el `ParameterSet`
//! completo (sólo lectura). `CompositeValidator` los ejecuta por prioridad
//! explícita (ascendente; empates en orden de registro) y se detiene en el
//! primer fallo.

pub mod composite;
pub mod rules;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::ParameterSet;

pub use composite::CompositeValidator;
pub use rules::{AllowedValuesValidator, AnyKeyPresentValidator, ConditionalRequiredValidator, DefaultParametersValidator, FnValidator, NonBlankValidator};

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[error("invalid parameters ({validator}): {reason}")]
pub struct InvalidParameters {
    pub validator: String,
    pub reason: String,
}

impl InvalidParameters {
    pub fn new(validator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { validator: validator.into(),
               reason: reason.into() }
    }
}

pub trait ParametersValidator: Send + Sync + Debug {
    fn name(&self) -> &str;
    fn validate(&self, params: &ParameterSet) -> Result<(), InvalidParameters>;
}
