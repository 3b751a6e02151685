//! Parámetros de job: valores tipados, conjunto inmutable, identidad y
//! resolución (incrementers).
//!
//! Flujo típico en el launcher:
//! 1. El llamador construye un `ParameterSet` (builder o `parse_cli_params`).
//! 2. `IdentityResolver::resolve` aplica el incrementer configurado.
//! 3. `JobIdentity::hash` fija la identidad (sólo entradas `identifying`).

pub mod identity;
pub mod incrementer;
pub mod parse;
pub mod set;
pub mod value;

pub use identity::JobIdentity;
pub use incrementer::{DailyTimeStamper, IdentityResolver, ParametersIncrementer, RunIdIncrementer, RUN_DATE_KEY, RUN_ID_KEY};
pub use parse::{parse_cli_param, parse_cli_params, ParamParseError};
pub use set::{ParameterSet, ParameterSetBuilder};
pub use value::{JobParameter, ParamValue};
