//! Reader paginado sobre `InputTable` (filas `processed = false`, por id).
//!
//! Estado reanudable en el contexto del step:
//! - `reader.read.count`: items leídos hasta el último commit.
//! - `reader.last.id`: id de la última fila leída; al reabrir, la lectura
//!   continúa con `id > last_id`.

use std::collections::VecDeque;

use batch_core::constants::READ_COUNT_KEY;
use batch_core::{ExecutionContext, ItemReader, StepFault};
use log::debug;

use crate::entities::BatchInput;
use crate::table::InputTable;

pub const LAST_ID_KEY: &str = "reader.last.id";

pub struct TableReader {
    table: InputTable,
    page_size: usize,
    page: VecDeque<BatchInput>,
    last_id: i64,
    read_count: i64,
    exhausted: bool,
}

impl TableReader {
    pub fn new(table: InputTable) -> Self {
        Self::with_page_size(table, 10)
    }

    pub fn with_page_size(table: InputTable, page_size: usize) -> Self {
        Self { table,
               page_size: page_size.max(1),
               page: VecDeque::new(),
               last_id: 0,
               read_count: 0,
               exhausted: false }
    }

    fn fetch_page(&mut self) {
        let rows = self.table.unprocessed_after(self.last_id);
        self.exhausted = rows.len() <= self.page_size;
        self.page.extend(rows.into_iter().take(self.page_size));
        debug!("table reader fetched page of {} (after id {})", self.page.len(), self.last_id);
    }
}

impl ItemReader<BatchInput> for TableReader {
    fn open(&mut self, ctx: &ExecutionContext) -> Result<(), StepFault> {
        self.read_count = ctx.get_i64(READ_COUNT_KEY).unwrap_or(0);
        self.last_id = ctx.get_i64(LAST_ID_KEY).unwrap_or(0);
        self.page.clear();
        self.exhausted = false;
        if self.read_count > 0 {
            debug!("table reader resuming after id {} ({} already read)", self.last_id, self.read_count);
        }
        Ok(())
    }

    fn read(&mut self) -> Result<Option<BatchInput>, StepFault> {
        if self.page.is_empty() && !self.exhausted {
            self.fetch_page();
        }
        let Some(row) = self.page.pop_front() else {
            return Ok(None);
        };
        self.last_id = row.id;
        self.read_count += 1;
        Ok(Some(row))
    }

    fn update(&mut self, ctx: &mut ExecutionContext) -> Result<(), StepFault> {
        ctx.put(READ_COUNT_KEY, self.read_count);
        ctx.put(LAST_ID_KEY, self.last_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::NewInput;

    fn table(n: i32) -> InputTable {
        let t = InputTable::new();
        t.insert_all((1..=n).map(|i| NewInput { name: format!("TestData-{i}"),
                                                data: format!("Data-{i}"),
                                                status: i % 10 }));
        t
    }

    fn drain(r: &mut TableReader) -> Vec<i64> {
        let mut ids = Vec::new();
        while let Some(row) = r.read().expect("read") {
            ids.push(row.id);
        }
        ids
    }

    #[test]
    fn reads_all_unprocessed_rows_across_pages() {
        let t = table(7);
        t.mark_processed(&[3]);
        let mut r = TableReader::with_page_size(t, 2);
        r.open(&ExecutionContext::new()).expect("open");
        assert_eq!(drain(&mut r), vec![1, 2, 4, 5, 6, 7]);
    }

    #[test]
    fn resumes_from_saved_position() {
        let t = table(5);
        let mut r = TableReader::with_page_size(t.clone(), 2);
        r.open(&ExecutionContext::new()).expect("open");
        r.read().expect("read");
        r.read().expect("read");
        let mut ctx = ExecutionContext::new();
        r.update(&mut ctx).expect("update");
        assert_eq!(ctx.get_i64(READ_COUNT_KEY), Some(2));

        let mut resumed = TableReader::with_page_size(t, 2);
        resumed.open(&ctx).expect("open");
        assert_eq!(drain(&mut resumed), vec![3, 4, 5]);
        let mut ctx2 = ExecutionContext::new();
        resumed.update(&mut ctx2).expect("update");
        assert_eq!(ctx2.get_i64(READ_COUNT_KEY), Some(5));
    }
}
