//! Incrementers y resolución de parámetros previa al arranque.
//!
//! Un incrementer genera los parámetros de identidad de la siguiente
//! ejecución a partir de los de la anterior. Si el job tiene incrementer, las
//! claves que éste controla SIEMPRE se regeneran: los valores aportados por
//! el llamador para esas claves se descartan (con `warn!`).

use std::fmt::Debug;
use std::sync::Arc;

use log::warn;

use super::set::ParameterSet;
use crate::clock::{Clock, SystemClock};

pub const RUN_ID_KEY: &str = "run.id";
pub const RUN_DATE_KEY: &str = "run.date";

pub trait ParametersIncrementer: Send + Sync + Debug {
    /// Claves que el incrementer genera.
    fn keys(&self) -> Vec<&'static str>;
    /// Parámetros generados (sólo `keys()`) a partir de la ejecución previa.
    fn next(&self, previous: Option<&ParameterSet>) -> ParameterSet;
}

/// `run.id` = anterior + 1 (1 si no hay ejecución previa).
#[derive(Debug, Default, Clone, Copy)]
pub struct RunIdIncrementer;

impl ParametersIncrementer for RunIdIncrementer {
    fn keys(&self) -> Vec<&'static str> {
        vec![RUN_ID_KEY]
    }
    fn next(&self, previous: Option<&ParameterSet>) -> ParameterSet {
        let prev = previous.and_then(|p| p.get_long(RUN_ID_KEY)).unwrap_or(0);
        ParameterSet::builder().add_long(RUN_ID_KEY, prev + 1).build()
    }
}

/// `run.date` = fecha ISO de hoy, `run.id` = epoch millis.
pub struct DailyTimeStamper {
    clock: Arc<dyn Clock>,
}

impl Debug for DailyTimeStamper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyTimeStamper").finish()
    }
}

impl DailyTimeStamper {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for DailyTimeStamper {
    fn default() -> Self {
        Self::new()
    }
}

impl ParametersIncrementer for DailyTimeStamper {
    fn keys(&self) -> Vec<&'static str> {
        vec![RUN_DATE_KEY, RUN_ID_KEY]
    }
    fn next(&self, _previous: Option<&ParameterSet>) -> ParameterSet {
        let now = self.clock.wall();
        ParameterSet::builder().add_string(RUN_DATE_KEY, now.format("%Y-%m-%d").to_string())
                               .add_long(RUN_ID_KEY, now.timestamp_millis())
                               .build()
    }
}

/// Resolución de los parámetros efectivos de una ejecución.
pub struct IdentityResolver;

impl IdentityResolver {
    /// - Sin incrementer: devuelve `supplied` sin cambios.
    /// - Con incrementer: `supplied` sin las claves del incrementer, unido a
    ///   `incrementer.next(prior)`.
    pub fn resolve(job_name: &str,
                   supplied: &ParameterSet,
                   prior: Option<&ParameterSet>,
                   incrementer: Option<&dyn ParametersIncrementer>)
                   -> ParameterSet {
        let Some(inc) = incrementer else {
            return supplied.clone();
        };
        let owned = inc.keys();
        for k in owned.iter().filter(|k| supplied.contains_key(k)) {
            warn!("job '{job_name}': parameter '{k}' is generated by the incrementer; supplied value dropped");
        }
        supplied.without_keys(owned.iter().copied()).merged_with(&inc.next(prior))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;

    #[test]
    fn no_incrementer_returns_supplied_unchanged() {
        let p = ParameterSet::builder().add_long(RUN_ID_KEY, 42).build();
        assert_eq!(IdentityResolver::resolve("j", &p, None, None), p);
    }

    #[test]
    fn run_id_incrementer_overrides_caller_value() {
        let prior = ParameterSet::builder().add_long(RUN_ID_KEY, 4).build();
        let supplied = ParameterSet::builder().add_long(RUN_ID_KEY, 99).add_string("name", "x").build();
        let out = IdentityResolver::resolve("j", &supplied, Some(&prior), Some(&RunIdIncrementer));
        assert_eq!(out.get_long(RUN_ID_KEY), Some(5));
        assert_eq!(out.get_string("name"), Some("x"));
    }

    #[test]
    fn run_id_starts_at_one() {
        let out = IdentityResolver::resolve("j", &ParameterSet::empty(), None, Some(&RunIdIncrementer));
        assert_eq!(out.get_long(RUN_ID_KEY), Some(1));
    }

    #[test]
    fn daily_time_stamper_uses_clock() {
        let clock = FakeClock::new();
        let stamper = DailyTimeStamper::with_clock(Arc::new(clock.clone()));
        let out = stamper.next(None);
        assert_eq!(out.get_string(RUN_DATE_KEY), Some(clock.wall().format("%Y-%m-%d").to_string().as_str()));
        assert_eq!(out.get_long(RUN_ID_KEY), Some(clock.wall().timestamp_millis()));
    }
}
