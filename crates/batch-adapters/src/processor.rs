//! Transformación contra una API externa (simulada).

use std::sync::Arc;
use std::time::Duration;

use batch_core::{ItemProcessor, StepFault};
use chrono::Utc;
use log::{debug, info};

use crate::entities::{BatchInput, BatchOutput};

pub trait ExternalApi: Send + Sync {
    fn call(&self, input: &str) -> Result<String, StepFault>;

    fn process_response(&self, response: &str) -> String {
        response.to_string()
    }
}

/// Responde `"Processed: <input>"` tras una latencia fija.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedApi {
    latency: Duration,
}

impl SimulatedApi {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl ExternalApi for SimulatedApi {
    fn call(&self, input: &str) -> Result<String, StepFault> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        debug!("external api called for data: {input}");
        Ok(format!("Processed: {input}"))
    }
}

/// `BatchInput` -> `BatchOutput`. Las filas ya procesadas se descartan.
#[derive(Clone)]
pub struct ApiCallProcessor {
    api: Arc<dyn ExternalApi>,
}

impl ApiCallProcessor {
    pub fn new(api: impl ExternalApi + 'static) -> Self {
        Self { api: Arc::new(api) }
    }

    pub fn shared(api: Arc<dyn ExternalApi>) -> Self {
        Self { api }
    }
}

impl ItemProcessor<BatchInput, BatchOutput> for ApiCallProcessor {
    fn process(&mut self, item: BatchInput) -> Result<Option<BatchOutput>, StepFault> {
        if item.processed {
            debug!("input {} already processed; dropped", item.id);
            return Ok(None);
        }
        let response = self.api.call(&item.data).map_err(|e| StepFault::process(format!("input {}: {}", item.id, e.message)))?;
        let processed_data = self.api.process_response(&response);
        info!("processed item id={} name={}", item.id, item.name);
        Ok(Some(BatchOutput { input_id: item.id,
                              name: item.name,
                              original_data: item.data,
                              processed_data,
                              api_response: response,
                              processed_at: Utc::now() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: i64, processed: bool) -> BatchInput {
        BatchInput { id,
                     name: format!("TestData-{id}"),
                     data: format!("Data-{id}"),
                     status: 0,
                     processed }
    }

    struct DownApi;
    impl ExternalApi for DownApi {
        fn call(&self, _input: &str) -> Result<String, StepFault> {
            Err(StepFault::process("503"))
        }
    }

    #[test]
    fn maps_input_through_api() {
        let mut p = ApiCallProcessor::new(SimulatedApi::default());
        let out = p.process(input(7, false)).expect("ok").expect("kept");
        assert_eq!(out.input_id, 7);
        assert_eq!(out.processed_data, "Processed: Data-7");
        assert_eq!(out.original_data, "Data-7");
    }

    #[test]
    fn processed_rows_are_dropped_and_api_faults_surface() {
        let mut p = ApiCallProcessor::new(SimulatedApi::default());
        assert!(p.process(input(1, true)).expect("ok").is_none());
        let mut down = ApiCallProcessor::new(DownApi);
        let err = down.process(input(2, false)).expect_err("fault");
        assert!(err.message.contains("input 2"));
    }
}
