//! Módulo de hashing y canonicalización JSON.
//!
//! La identidad de una ejecución (`JobIdentity`) se deriva de un JSON
//! canónico: claves ordenadas y sin espacios, de modo que dos `ParameterSet`
//! con los mismos pares produzcan siempre el mismo hash.

pub mod canonical_json;
pub mod hash;

pub use canonical_json::to_canonical_json;
pub use hash::{hash_str, hash_value};
