//! Validadores de parámetros de los jobs de demostración.

use batch_core::validation::{AllowedValuesValidator, AnyKeyPresentValidator, CompositeValidator, ConditionalRequiredValidator, DefaultParametersValidator, NonBlankValidator};

pub const MODES: [&str; 3] = ["FULL", "DELTA", "FILE"];

/// `name` y `mode` obligatorios; `mode` en FULL/DELTA/FILE (sin distinguir
/// mayúsculas). Sólo `mode=DELTA` exacto exige `startDate` y `endDate`, y
/// sólo `mode=FILE` exige `fileName`.
pub fn job_parameter_validator() -> CompositeValidator {
    CompositeValidator::new().register(0,
                                       DefaultParametersValidator::new(["name", "mode"],
                                                                       ["startDate", "endDate", "fileName", "currentDate"]))
                             .register(1, AllowedValuesValidator::new("mode", MODES))
                             .register(2, ConditionalRequiredValidator::new("mode", "DELTA", ["startDate", "endDate"]))
                             .register(3, ConditionalRequiredValidator::new("mode", "FILE", ["fileName"]))
                             .register(4, NonBlankValidator::new(["name"]))
}

/// Exige `run.id` o `timestamp` para distinguir instancias.
pub fn run_id_validator() -> AnyKeyPresentValidator {
    AnyKeyPresentValidator::new(["run.id", "timestamp"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use batch_core::{ParameterSet, ParametersValidator};

    fn params(pairs: &[(&str, &str)]) -> ParameterSet {
        pairs.iter()
             .fold(ParameterSet::builder(), |b, (k, v)| b.add_string(*k, *v))
             .build()
    }

    #[test]
    fn full_mode_needs_only_name_and_mode() {
        let v = job_parameter_validator();
        assert!(v.validate(&params(&[("name", "kim"), ("mode", "FULL")])).is_ok());
    }

    #[test]
    fn missing_mode_reported_by_first_validator() {
        let err = job_parameter_validator().validate(&params(&[("name", "kim")]))
                                           .expect_err("mode missing");
        assert!(err.reason.contains("mode"), "{err}");
    }

    #[test]
    fn unknown_mode_rejected() {
        let err = job_parameter_validator().validate(&params(&[("name", "kim"), ("mode", "PARTIAL")]))
                                           .expect_err("bad mode");
        assert!(err.reason.contains("PARTIAL"), "{err}");
    }

    #[test]
    fn delta_requires_date_range() {
        let v = job_parameter_validator();
        assert!(v.validate(&params(&[("name", "kim"), ("mode", "DELTA"), ("startDate", "2025-01-01")]))
                 .is_err());
        assert!(v.validate(&params(&[("name", "kim"),
                                     ("mode", "DELTA"),
                                     ("startDate", "2025-01-01"),
                                     ("endDate", "2025-01-31")]))
                 .is_ok());
    }

    #[test]
    fn lowercase_mode_passes_without_mode_specific_keys() {
        let v = job_parameter_validator();
        assert!(v.validate(&params(&[("name", "kim"), ("mode", "delta")])).is_ok());
        assert!(v.validate(&params(&[("name", "kim"), ("mode", "file")])).is_ok());
    }

    #[test]
    fn file_requires_file_name() {
        let v = job_parameter_validator();
        assert!(v.validate(&params(&[("name", "kim"), ("mode", "FILE")])).is_err());
        assert!(v.validate(&params(&[("name", "kim"), ("mode", "FILE"), ("fileName", "in.csv")]))
                 .is_ok());
    }

    #[test]
    fn run_id_or_timestamp() {
        let v = run_id_validator();
        assert!(v.validate(&ParameterSet::default()).is_err());
        assert!(v.validate(&params(&[("timestamp", "1")])).is_ok());
    }
}
