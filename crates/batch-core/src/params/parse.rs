//! Sintaxis textual de parámetros (CLI):
//!
//! ```text
//! name=value               string identificante
//! run.id(long)=3           long
//! ratio(double)=0.5        double
//! day(date)=2024-01-31T00:00:00Z
//! trace=abc,false          no identificante
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::set::ParameterSet;
use super::value::{JobParameter, ParamValue};

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum ParamParseError {
    #[error("expected key=value, got '{0}'")] MissingEquals(String),
    #[error("empty parameter key in '{0}'")] EmptyKey(String),
    #[error("unknown parameter type '{0}'")] UnknownType(String),
    #[error("invalid {ty} value for '{key}': {value}")]
    InvalidValue { key: String, ty: String, value: String },
}

pub fn parse_cli_param(raw: &str) -> Result<(String, JobParameter), ParamParseError> {
    let (lhs, rhs) = raw.split_once('=').ok_or_else(|| ParamParseError::MissingEquals(raw.to_string()))?;
    let (key, ty) = match (lhs.find('('), lhs.strip_suffix(')')) {
        (Some(open), Some(inner)) => (&lhs[..open], &inner[open + 1..]),
        _ => (lhs, "string"),
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(ParamParseError::EmptyKey(raw.to_string()));
    }
    let (value, identifying) = match rhs.rsplit_once(',') {
        Some((v, "false")) => (v, false),
        Some((v, "true")) => (v, true),
        _ => (rhs, true),
    };
    let invalid = || ParamParseError::InvalidValue { key: key.to_string(),
                                                     ty: ty.to_string(),
                                                     value: value.to_string() };
    let value = match ty.to_ascii_lowercase().as_str() {
        "string" => ParamValue::String(value.to_string()),
        "long" => ParamValue::Long(value.trim().parse().map_err(|_| invalid())?),
        "double" => ParamValue::Double(value.trim().parse().map_err(|_| invalid())?),
        "date" => ParamValue::Date(parse_date(value.trim()).ok_or_else(invalid)?),
        other => return Err(ParamParseError::UnknownType(other.to_string())),
    };
    Ok((key.to_string(), JobParameter::new(value, identifying)))
}

/// Acepta RFC 3339 o una fecha simple `YYYY-MM-DD` (medianoche UTC).
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
                                            .and_then(|d| d.and_hms_opt(0, 0, 0))
                                            .map(|dt| dt.and_utc())
}

pub fn parse_cli_params<I, S>(raw: I) -> Result<ParameterSet, ParamParseError>
    where I: IntoIterator<Item = S>,
          S: AsRef<str>
{
    let mut b = ParameterSet::builder();
    for r in raw {
        let (k, p) = parse_cli_param(r.as_ref())?;
        b = b.add_parameter(k, p);
    }
    Ok(b.build())
}
