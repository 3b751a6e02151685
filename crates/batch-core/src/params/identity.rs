//! Identidad de una instancia de job: `(job_name, parámetros identificantes)`.

use serde_json::json;

use super::set::ParameterSet;
use crate::hashing::hash_value;

#[derive(Debug, Clone, PartialEq)]
pub struct JobIdentity {
    pub job_name: String,
    pub parameters: ParameterSet,
}

impl JobIdentity {
    pub fn new(job_name: impl Into<String>, parameters: ParameterSet) -> Self {
        Self { job_name: job_name.into(),
               parameters }
    }

    /// Hash estable (blake3 sobre JSON canónico). Independiente del orden de
    /// inserción y de las entradas no identificantes.
    pub fn hash(&self) -> String {
        hash_value(&json!({
            "job_name": self.job_name,
            "parameters": self.parameters.identifying_json(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn hash_ignores_order_and_non_identifying() {
        let a = ParameterSet::builder().add_string("name", "n").add_long("run.id", 1).build();
        let b = ParameterSet::builder().add_long("run.id", 1)
                                       .add_string("name", "n")
                                       .add_non_identifying("trace", ParamValue::String("t".into()))
                                       .build();
        assert_eq!(JobIdentity::new("job", a.clone()).hash(), JobIdentity::new("job", b).hash());
        assert_ne!(JobIdentity::new("job", a.clone()).hash(), JobIdentity::new("other", a).hash());
    }
}
