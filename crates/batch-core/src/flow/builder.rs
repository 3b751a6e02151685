//! Builder fluido del grafo:
//!
//! ```ignore
//! FlowBuilder::start("init").on("FAILED").to("fail")
//!                           .from("init").on("*").to("process")
//!                           .from("process").on("FAILED").to("fail")
//!                           .from("process").on("*").end()
//!                           .build()?
//! ```

use indexmap::IndexMap;

use super::graph::{FlowGraph, Target, Transition};
use crate::constants::EXIT_FAILED;
use crate::errors::BatchError;

#[derive(Debug, Clone)]
pub struct FlowBuilder {
    start: String,
    current: String,
    transitions: IndexMap<String, Vec<Transition>>,
}

impl FlowBuilder {
    pub fn start(step: impl Into<String>) -> Self {
        let step = step.into();
        Self { start: step.clone(),
               current: step,
               transitions: IndexMap::new() }
    }

    /// Cambia el step origen de las próximas aristas.
    pub fn from(mut self, step: impl Into<String>) -> Self {
        self.current = step.into();
        self
    }

    pub fn on(self, pattern: impl Into<String>) -> TransitionBuilder {
        TransitionBuilder { flow: self,
                            pattern: pattern.into() }
    }

    /// Encadenamiento lineal desde el step actual: `FAILED` -> fail,
    /// `*` -> `step`. El nuevo step pasa a ser el actual.
    pub fn next(self, step: impl Into<String>) -> Self {
        let step = step.into();
        let b = self.on(EXIT_FAILED).fail().on("*").to(step.clone());
        b.from(step)
    }

    fn push(mut self, pattern: String, target: Target) -> Self {
        self.transitions.entry(self.current.clone()).or_default().push(Transition { pattern, target });
        self
    }

    pub fn build(self) -> Result<FlowGraph, BatchError> {
        if self.start.trim().is_empty() {
            return Err(BatchError::FlowDefinition("empty start step name".into()));
        }
        for (from, ts) in &self.transitions {
            for (i, t) in ts.iter().enumerate() {
                if t.pattern.is_empty() {
                    return Err(BatchError::FlowDefinition(format!("empty pattern on '{from}'")));
                }
                if ts[..i].iter().any(|p| p.pattern == t.pattern) {
                    return Err(BatchError::FlowDefinition(format!("duplicate pattern '{}' on '{from}'", t.pattern)));
                }
            }
        }
        Ok(FlowGraph::new(self.start, self.transitions))
    }
}

pub struct TransitionBuilder {
    flow: FlowBuilder,
    pattern: String,
}

impl TransitionBuilder {
    pub fn to(self, step: impl Into<String>) -> FlowBuilder {
        self.flow.push(self.pattern, Target::Step(step.into()))
    }
    pub fn end(self) -> FlowBuilder {
        self.flow.push(self.pattern, Target::End { exit_code: None })
    }
    pub fn end_with(self, exit_code: impl Into<String>) -> FlowBuilder {
        self.flow.push(self.pattern, Target::End { exit_code: Some(exit_code.into()) })
    }
    pub fn fail(self) -> FlowBuilder {
        self.flow.push(self.pattern, Target::Fail)
    }
    pub fn stop(self) -> FlowBuilder {
        self.flow.push(self.pattern, Target::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_pattern_rejected() {
        let err = FlowBuilder::start("a").on("*").to("b").from("a").on("*").end().build().expect_err("dup");
        assert!(matches!(err, BatchError::FlowDefinition(_)));
    }

    #[test]
    fn step_names_in_first_seen_order() {
        let g = FlowBuilder::start("init").on("FAILED").to("fail").from("init").on("*").to("process").build().expect("flow");
        assert_eq!(g.step_names(), vec!["init", "fail", "process"]);
    }
}
