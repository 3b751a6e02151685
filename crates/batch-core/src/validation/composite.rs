use std::sync::Arc;

use log::debug;

use super::{InvalidParameters, ParametersValidator};
use crate::params::ParameterSet;

#[derive(Debug, Default, Clone)]
pub struct CompositeValidator {
    entries: Vec<(i32, Arc<dyn ParametersValidator>)>,
}

impl CompositeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un validador con prioridad (menor = antes). El orden entre
    /// prioridades iguales es el de registro.
    pub fn register(mut self, priority: i32, validator: impl ParametersValidator + 'static) -> Self {
        self.register_arc(priority, Arc::new(validator));
        self
    }

    pub fn register_arc(&mut self, priority: i32, validator: Arc<dyn ParametersValidator>) {
        self.entries.push((priority, validator));
        // sort_by_key es estable
        self.entries.sort_by_key(|(p, _)| *p);
    }

    /// Nombres en orden de ejecución.
    pub fn order(&self) -> Vec<String> {
        self.entries.iter().map(|(_, v)| v.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ParametersValidator for CompositeValidator {
    fn name(&self) -> &str {
        "composite"
    }

    fn validate(&self, params: &ParameterSet) -> Result<(), InvalidParameters> {
        for (priority, v) in &self.entries {
            debug!("validator '{}' (priority {priority})", v.name());
            v.validate(params)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FnValidator;
    use parking_lot::Mutex;

    #[test]
    fn runs_by_priority_and_stops_at_first_failure() {
        let calls = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let mk = |name: &'static str, ok: bool| {
            let calls = calls.clone();
            FnValidator::new(name, move |_p: &ParameterSet| {
                calls.lock().push(name);
                if ok {
                    Ok(())
                } else {
                    Err(format!("{name} rejected"))
                }
            })
        };
        let composite = CompositeValidator::new().register(20, mk("late", true))
                                                 .register(10, mk("fails", false))
                                                 .register(0, mk("first", true))
                                                 .register(10, mk("tie-after-fails", true));
        assert_eq!(composite.order(), vec!["first", "fails", "tie-after-fails", "late"]);
        let err = composite.validate(&ParameterSet::empty()).expect_err("must fail");
        assert_eq!(err.validator, "fails");
        assert_eq!(*calls.lock(), vec!["first", "fails"]);
    }
}
