//! Writers de `BatchOutput`.

use batch_core::{ItemWriter, StepFault};
use log::info;

use crate::entities::BatchOutput;
use crate::table::{InputTable, OutputTable};

/// Guarda las salidas y marca sus entradas como procesadas. Idempotente por
/// `input_id`, de modo que reescribir un chunk tras un reinicio es seguro.
#[derive(Debug, Clone)]
pub struct TableWriter {
    inputs: InputTable,
    outputs: OutputTable,
}

impl TableWriter {
    pub fn new(inputs: InputTable, outputs: OutputTable) -> Self {
        Self { inputs, outputs }
    }
}

impl ItemWriter<BatchOutput> for TableWriter {
    fn write(&mut self, items: &[BatchOutput]) -> Result<(), StepFault> {
        info!("writing {} BatchOutput items", items.len());
        self.outputs.save_all(items);
        let ids: Vec<i64> = items.iter().map(|o| o.input_id).collect();
        self.inputs.mark_processed(&ids);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::table::NewInput;

    #[test]
    fn table_writer_marks_inputs_processed() {
        let inputs = InputTable::new();
        inputs.insert_all([NewInput { name: "a".into(),
                                      data: "d".into(),
                                      status: 1 }]);
        let outputs = OutputTable::new();
        let mut w = TableWriter::new(inputs.clone(), outputs.clone());
        w.write(&[BatchOutput { input_id: 1,
                                name: "a".into(),
                                original_data: "d".into(),
                                processed_data: "Processed: d".into(),
                                api_response: "Processed: d".into(),
                                processed_at: Utc::now() }])
         .expect("write");
        assert_eq!(outputs.len(), 1);
        assert_eq!(inputs.count_unprocessed(), 0);
    }
}
