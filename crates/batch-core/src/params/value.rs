use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Escalar tipado de un parámetro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    String(String),
    Long(i64),
    Double(f64),
    Date(DateTime<Utc>),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::String(_) => "string",
            ParamValue::Long(_) => "long",
            ParamValue::Double(_) => "double",
            ParamValue::Date(_) => "date",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::String(s) => write!(f, "{s}"),
            ParamValue::Long(v) => write!(f, "{v}"),
            ParamValue::Double(v) => write!(f, "{v}"),
            ParamValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
        }
    }
}

/// Entrada de un `ParameterSet`: valor + si participa en la identidad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobParameter {
    pub value: ParamValue,
    #[serde(default = "default_identifying")]
    pub identifying: bool,
}

fn default_identifying() -> bool {
    true
}

impl JobParameter {
    pub fn new(value: ParamValue, identifying: bool) -> Self {
        Self { value, identifying }
    }
    pub fn identifying(value: ParamValue) -> Self {
        Self::new(value, true)
    }
}
