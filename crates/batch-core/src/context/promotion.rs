//! Promoción de claves del contexto del step al contexto del job.

use log::debug;

use crate::constants::EXIT_COMPLETED;
use crate::context::ExecutionContext;
use crate::execution::{BatchStatus, ExitStatus, StepExecution};
use crate::listener::StepListener;

/// Copia `keys` del contexto del step al del job (sobrescribiendo) sólo si
/// el step terminó COMPLETED y su exit code está en `statuses`. En fallo el
/// contexto del job no se toca, aunque la clave existiera en el step.
#[derive(Debug, Clone)]
pub struct PromotionListener {
    keys: Vec<String>,
    statuses: Vec<String>,
}

impl PromotionListener {
    pub fn new<I>(keys: I) -> Self
        where I: IntoIterator,
              I::Item: Into<String>
    {
        Self { keys: keys.into_iter().map(Into::into).collect(),
               statuses: vec![EXIT_COMPLETED.to_string()] }
    }

    /// Exit codes que habilitan la promoción (por defecto sólo `COMPLETED`).
    pub fn with_statuses<I>(mut self, statuses: I) -> Self
        where I: IntoIterator,
              I::Item: Into<String>
    {
        self.statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Devuelve las claves efectivamente copiadas.
    pub fn promote(&self, step: &StepExecution, job_context: &mut ExecutionContext) -> Vec<String> {
        if step.status != BatchStatus::Completed || !self.statuses.iter().any(|s| *s == step.exit_status.exit_code) {
            debug!("step '{}' ended {} / {}: no promotion", step.step_name, step.status, step.exit_status);
            return Vec::new();
        }
        let mut promoted = Vec::new();
        for key in &self.keys {
            if let Some(v) = step.context.get(key) {
                job_context.put(key.clone(), v.clone());
                promoted.push(key.clone());
            }
        }
        promoted
    }
}

impl StepListener for PromotionListener {
    fn after_step(&self, step: &StepExecution, job_context: &mut ExecutionContext) -> Option<ExitStatus> {
        self.promote(step, job_context);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn step_with_key(status: BatchStatus, exit: ExitStatus) -> StepExecution {
        let mut s = StepExecution::new(Uuid::new_v4(), "s");
        s.status = status;
        s.exit_status = exit;
        s.context.put("promotedKey", "value-from-step1");
        s.context.put("other", 1);
        s
    }

    #[test]
    fn promotes_declared_keys_on_success() {
        let mut job = ExecutionContext::new();
        job.put("promotedKey", "old");
        let keys = PromotionListener::new(["promotedKey"]).promote(&step_with_key(BatchStatus::Completed, ExitStatus::completed()), &mut job);
        assert_eq!(keys, vec!["promotedKey"]);
        assert_eq!(job.get_str("promotedKey"), Some("value-from-step1"));
        assert!(!job.contains_key("other"));
    }

    #[test]
    fn no_promotion_on_failure() {
        let mut job = ExecutionContext::new();
        let l = PromotionListener::new(["promotedKey"]);
        assert!(l.promote(&step_with_key(BatchStatus::Failed, ExitStatus::failed()), &mut job).is_empty());
        assert!(l.promote(&step_with_key(BatchStatus::Completed, ExitStatus::failed()), &mut job).is_empty());
        assert!(job.is_empty());
    }
}
