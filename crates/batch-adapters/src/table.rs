//! Tablas en memoria compartidas entre steps (clonar comparte los datos).

use std::sync::Arc;

use parking_lot::Mutex;

use crate::entities::{BatchInput, BatchOutput};

#[derive(Debug, Default)]
struct InputRows {
    rows: Vec<BatchInput>,
    next_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct InputTable {
    inner: Arc<Mutex<InputRows>>,
}

/// Fila nueva, sin id (lo asigna la tabla).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInput {
    pub name: String,
    pub data: String,
    pub status: i32,
}

impl InputTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().rows.len()
    }

    pub fn count_unprocessed(&self) -> usize {
        self.inner.lock().rows.iter().filter(|r| !r.processed).count()
    }

    /// Inserta las filas con ids crecientes; devuelve los ids asignados.
    pub fn insert_all(&self, rows: impl IntoIterator<Item = NewInput>) -> Vec<i64> {
        let mut g = self.inner.lock();
        let mut ids = Vec::new();
        for r in rows {
            g.next_id += 1;
            let id = g.next_id;
            g.rows.push(BatchInput { id,
                                     name: r.name,
                                     data: r.data,
                                     status: r.status,
                                     processed: false });
            ids.push(id);
        }
        ids
    }

    /// Filas no procesadas con `id > after_id`, ordenadas por id.
    pub fn unprocessed_after(&self, after_id: i64) -> Vec<BatchInput> {
        let g = self.inner.lock();
        let mut out: Vec<BatchInput> = g.rows.iter().filter(|r| !r.processed && r.id > after_id).cloned().collect();
        out.sort_by_key(|r| r.id);
        out
    }

    pub fn mark_processed(&self, ids: &[i64]) {
        let mut g = self.inner.lock();
        for r in g.rows.iter_mut().filter(|r| ids.contains(&r.id)) {
            r.processed = true;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutputTable {
    rows: Arc<Mutex<Vec<BatchOutput>>>,
}

impl OutputTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert por `input_id`: reescribir un chunk tras un reinicio no duplica.
    pub fn save_all(&self, items: &[BatchOutput]) {
        let mut g = self.rows.lock();
        for item in items {
            match g.iter().position(|o| o.input_id == item.input_id) {
                Some(i) => g[i] = item.clone(),
                None => g.push(item.clone()),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    pub fn rows(&self) -> Vec<BatchOutput> {
        self.rows.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn new_input(i: i32) -> NewInput {
        NewInput { name: format!("TestData-{i}"),
                   data: format!("Data-{i}"),
                   status: i % 10 }
    }

    #[test]
    fn ids_grow_and_unprocessed_filters() {
        let t = InputTable::new();
        assert_eq!(t.insert_all((1..=4).map(new_input)), vec![1, 2, 3, 4]);
        t.mark_processed(&[2]);
        let ids: Vec<i64> = t.unprocessed_after(1).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 4]);
        assert_eq!(t.count_unprocessed(), 3);
    }

    #[test]
    fn output_save_is_idempotent_per_input() {
        let out = OutputTable::new();
        let row = BatchOutput { input_id: 1,
                                name: "n".into(),
                                original_data: "d".into(),
                                processed_data: "Processed: d".into(),
                                api_response: "Processed: d".into(),
                                processed_at: Utc::now() };
        out.save_all(&[row.clone()]);
        out.save_all(&[row]);
        assert_eq!(out.len(), 1);
    }
}
