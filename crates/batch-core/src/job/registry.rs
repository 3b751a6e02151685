use std::sync::Arc;

use indexmap::IndexMap;
use log::warn;

use super::Job;

/// Jobs conocidos por nombre, en orden de registro.
#[derive(Debug, Default, Clone)]
pub struct JobRegistry {
    jobs: IndexMap<String, Arc<Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, job: Job) {
        let name = job.name().to_string();
        if self.jobs.insert(name.clone(), Arc::new(job)).is_some() {
            warn!("job '{name}' registered twice; keeping the latest definition");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Job>> {
        self.jobs.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.jobs.keys().map(String::as_str).collect()
    }
}
