//! `Job`: definición inmutable (nombre, grafo, fábricas de steps, validador,
//! incrementer y listeners), compartida entre ejecuciones vía `Arc`.
//!
//! Los steps se construyen por ejecución a partir de fábricas que reciben
//! los parámetros ya resueltos: nada se inyecta de forma tardía.
//!
//! ```ignore
//! let job = JobBuilder::new("X").step("init", |_p| Ok(TaskletStep::from_fn(init)))
//!                               .step("process", |p| build_chunk_step(p))
//!                               .flow(FlowBuilder::start("init").on("*").to("process"))
//!                               .build()?;
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::errors::{BatchError, StepFault};
use crate::flow::{FlowBuilder, FlowGraph};
use crate::listener::{JobListener, StepListener};
use crate::params::{ParameterSet, ParametersIncrementer};
use crate::step::Step;
use crate::validation::ParametersValidator;

pub type StepFactory = Arc<dyn Fn(&ParameterSet) -> Result<Box<dyn Step>, StepFault> + Send + Sync>;

#[derive(Clone)]
pub struct StepEntry {
    pub factory: StepFactory,
    pub listeners: Vec<Arc<dyn StepListener>>,
}

pub struct Job {
    name: String,
    flow: FlowGraph,
    steps: IndexMap<String, StepEntry>,
    validator: Option<Arc<dyn ParametersValidator>>,
    incrementer: Option<Arc<dyn ParametersIncrementer>>,
    listeners: Vec<Arc<dyn JobListener>>,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
         .field("name", &self.name)
         .field("steps", &self.steps.keys().collect::<Vec<_>>())
         .field("flow", &self.flow)
         .field("validator", &self.validator)
         .field("incrementer", &self.incrementer)
         .field("listeners", &self.listeners.len())
         .finish()
    }
}

impl Job {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn flow(&self) -> &FlowGraph {
        &self.flow
    }
    pub fn step(&self, name: &str) -> Option<&StepEntry> {
        self.steps.get(name)
    }
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }
    pub fn validator(&self) -> Option<&dyn ParametersValidator> {
        self.validator.as_deref()
    }
    pub fn incrementer(&self) -> Option<&dyn ParametersIncrementer> {
        self.incrementer.as_deref()
    }
    pub fn listeners(&self) -> &[Arc<dyn JobListener>] {
        &self.listeners
    }
}

pub struct JobBuilder {
    name: String,
    flow: Option<FlowBuilder>,
    steps: IndexMap<String, StepEntry>,
    validator: Option<Arc<dyn ParametersValidator>>,
    incrementer: Option<Arc<dyn ParametersIncrementer>>,
    listeners: Vec<Arc<dyn JobListener>>,
}

impl JobBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               flow: None,
               steps: IndexMap::new(),
               validator: None,
               incrementer: None,
               listeners: Vec::new() }
    }

    /// Registra un step con su fábrica. El orden de registro define el flujo
    /// lineal por defecto cuando no se declara `flow`.
    pub fn step<F, S>(mut self, name: impl Into<String>, factory: F) -> Self
        where F: Fn(&ParameterSet) -> Result<S, StepFault> + Send + Sync + 'static,
              S: Step + 'static
    {
        let factory: StepFactory = Arc::new(move |p: &ParameterSet| factory(p).map(|s| Box::new(s) as Box<dyn Step>));
        self.steps.insert(name.into(),
                          StepEntry { factory,
                                      listeners: Vec::new() });
        self
    }

    /// Listener de step; se ignora si el step aún no está registrado.
    pub fn step_listener(mut self, step: &str, listener: impl StepListener + 'static) -> Self {
        if let Some(entry) = self.steps.get_mut(step) {
            entry.listeners.push(Arc::new(listener));
        }
        self
    }

    pub fn listener(mut self, listener: impl JobListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn shared_listener(mut self, listener: Arc<dyn JobListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn validator(mut self, validator: impl ParametersValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn incrementer(mut self, incrementer: impl ParametersIncrementer + 'static) -> Self {
        self.incrementer = Some(Arc::new(incrementer));
        self
    }

    pub fn flow(mut self, flow: FlowBuilder) -> Self {
        self.flow = Some(flow);
        self
    }

    pub fn build(self) -> Result<Job, BatchError> {
        if self.steps.is_empty() {
            return Err(BatchError::FlowDefinition(format!("job '{}' has no steps", self.name)));
        }
        let flow = match self.flow {
            Some(fb) => fb.build()?,
            None => {
                let names: Vec<&String> = self.steps.keys().collect();
                FlowGraph::linear(&names).ok_or_else(|| BatchError::FlowDefinition("empty linear flow".into()))?
            }
        };
        for name in flow.step_names() {
            if !self.steps.contains_key(name) {
                return Err(BatchError::FlowDefinition(format!("job '{}': flow references unknown step '{name}'", self.name)));
            }
        }
        Ok(Job { name: self.name,
                 flow,
                 steps: self.steps,
                 validator: self.validator,
                 incrementer: self.incrementer,
                 listeners: self.listeners })
    }
}
