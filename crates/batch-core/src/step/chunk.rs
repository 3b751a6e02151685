//! Chunk step: read -> process -> write con atomicidad por chunk.
//!
//! Un fault en lectura, proceso o escritura abandona el chunk actual
//! completo (no se aplican sus contadores ni se llama a `update`); los chunks
//! confirmados antes permanecen.

use log::{debug, warn};

use super::item::{ItemProcessor, ItemReader, ItemWriter, PassThroughProcessor};
use super::{Step, StepKind, StepScope};
use crate::constants::DEFAULT_CHUNK_SIZE;
use crate::errors::{FaultKind, StepFault};
use crate::policy::{ChunkState, CompletionPolicy, CountPolicy};

pub struct ChunkStep<I, O> {
    reader: Box<dyn ItemReader<I>>,
    processor: Box<dyn ItemProcessor<I, O>>,
    writer: Box<dyn ItemWriter<O>>,
    policy: Box<dyn CompletionPolicy>,
}

/// Contadores de un chunk antes de confirmarlo.
struct ChunkTally {
    read: usize,
    written: usize,
    skipped: usize,
    exhausted: bool,
}

impl<I: Send + 'static, O: Send + 'static> ChunkStep<I, O> {
    pub fn builder() -> ChunkStepBuilder<I, O> {
        ChunkStepBuilder::new()
    }

    fn run_chunks(&mut self, scope: &mut StepScope<'_>) -> Result<(), StepFault> {
        loop {
            if scope.stop_requested() {
                debug!("step '{}': stop requested at chunk boundary", scope.step_name());
                scope.mark_stopped();
                return Ok(());
            }
            match self.chunk(scope) {
                Ok(tally) => {
                    if tally.read == 0 {
                        return Ok(());
                    }
                    self.reader.update(scope.step_context_mut())?;
                    scope.record_commit(tally.read, tally.written, tally.skipped)?;
                    if tally.exhausted {
                        return Ok(());
                    }
                }
                Err(fault) => {
                    warn!("step '{}': chunk rolled back: {fault}", scope.step_name());
                    scope.record_rollback(&fault.to_string());
                    return Err(fault);
                }
            }
        }
    }

    /// Llena un chunk y lo escribe. Un lote vacío (todo descartado) no se
    /// entrega al writer.
    fn chunk(&mut self, scope: &mut StepScope<'_>) -> Result<ChunkTally, StepFault> {
        self.policy.reset(scope.clock().now());
        let mut batch = Vec::new();
        let mut tally = ChunkTally { read: 0,
                                     written: 0,
                                     skipped: 0,
                                     exhausted: false };
        loop {
            // Un chunk lee al menos un item: sólo el reader puede cerrarlo vacío.
            if tally.read > 0 {
                let state = ChunkState { item_count: tally.read,
                                         now: scope.clock().now() };
                if self.policy.is_complete(&state) {
                    break;
                }
            }
            let Some(item) = self.reader.read()? else {
                tally.exhausted = true;
                break;
            };
            tally.read += 1;
            match self.processor.process(item)? {
                Some(out) => batch.push(out),
                None => tally.skipped += 1,
            }
        }
        if !batch.is_empty() {
            self.writer.write(&batch)?;
        }
        tally.written = batch.len();
        Ok(tally)
    }
}

impl<I: Send + 'static, O: Send + 'static> Step for ChunkStep<I, O> {
    fn kind(&self) -> StepKind {
        StepKind::Chunk
    }

    fn execute(&mut self, scope: &mut StepScope<'_>) -> Result<(), StepFault> {
        self.reader.open(scope.step_context())?;
        let result = self.run_chunks(scope);
        let closed = self.reader.close();
        result?;
        closed
    }
}

pub struct ChunkStepBuilder<I, O> {
    reader: Option<Box<dyn ItemReader<I>>>,
    processor: Option<Box<dyn ItemProcessor<I, O>>>,
    writer: Option<Box<dyn ItemWriter<O>>>,
    policy: Option<Box<dyn CompletionPolicy>>,
}

impl<I: Send + 'static, O: Send + 'static> ChunkStepBuilder<I, O> {
    pub fn new() -> Self {
        Self { reader: None,
               processor: None,
               writer: None,
               policy: None }
    }

    pub fn reader(mut self, reader: impl ItemReader<I> + 'static) -> Self {
        self.reader = Some(Box::new(reader));
        self
    }

    pub fn processor(mut self, processor: impl ItemProcessor<I, O> + 'static) -> Self {
        self.processor = Some(Box::new(processor));
        self
    }

    pub fn writer(mut self, writer: impl ItemWriter<O> + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    /// Atajo para `CountPolicy(size)`.
    pub fn chunk_size(self, size: usize) -> Self {
        self.completion_policy(CountPolicy::new(size))
    }

    pub fn completion_policy(mut self, policy: impl CompletionPolicy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    pub fn build(self) -> Result<ChunkStep<I, O>, StepFault> {
        let missing = |what: &str| StepFault::new(FaultKind::Configuration, format!("chunk step without {what}"));
        Ok(ChunkStep { reader: self.reader.ok_or_else(|| missing("reader"))?,
                       processor: self.processor.ok_or_else(|| missing("processor"))?,
                       writer: self.writer.ok_or_else(|| missing("writer"))?,
                       policy: self.policy.unwrap_or_else(|| Box::new(CountPolicy::new(DEFAULT_CHUNK_SIZE))) })
    }
}

impl<I: Send + 'static, O: Send + 'static> Default for ChunkStepBuilder<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> ChunkStepBuilder<T, T> {
    pub fn pass_through(self) -> Self {
        self.processor(PassThroughProcessor)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::event::BatchEventKind;
    use crate::policy::{CompositePolicy, TimeoutPolicy};
    use crate::step::scope::testing::Harness;
    use crate::step::IterReader;

    fn collecting_writer(out: Arc<Mutex<Vec<Vec<i32>>>>) -> impl ItemWriter<i32> {
        move |items: &[i32]| -> Result<(), StepFault> {
            out.lock().push(items.to_vec());
            Ok(())
        }
    }

    #[test]
    fn three_items_chunk_size_two_produce_two_batches() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let mut step = ChunkStep::builder().reader(IterReader::new(vec![1, 2, 3]))
                                           .pass_through()
                                           .writer(collecting_writer(out.clone()))
                                           .chunk_size(2)
                                           .build()
                                           .expect("build");
        let mut h = Harness::new();
        h.run(&mut step).expect("ok");
        assert_eq!(*out.lock(), vec![vec![1, 2], vec![3]]);
        assert_eq!((h.step.read_count, h.step.write_count, h.step.commit_count), (3, 3, 2));
    }

    #[test]
    fn writer_fault_on_second_flush_keeps_first_batch_only() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let sink = out.clone();
        let mut flushes = 0;
        let writer = move |items: &[i32]| -> Result<(), StepFault> {
            flushes += 1;
            if flushes == 2 {
                return Err(StepFault::write("sink down"));
            }
            sink.lock().push(items.to_vec());
            Ok(())
        };
        let mut step = ChunkStep::builder().reader(IterReader::new(1..=6))
                                           .pass_through()
                                           .writer(writer)
                                           .chunk_size(2)
                                           .build()
                                           .expect("build");
        let mut h = Harness::new();
        let err = h.run(&mut step).expect_err("write fault");
        assert_eq!(err.kind, FaultKind::Write);
        assert_eq!(*out.lock(), vec![vec![1, 2]]);
        assert_eq!((h.step.write_count, h.step.commit_count, h.step.rollback_count), (2, 1, 1));
        assert!(matches!(h.sink.events.last(), Some(BatchEventKind::ChunkRolledBack { .. })));
    }

    #[test]
    fn dropped_items_count_as_skips_and_empty_batch_is_not_written() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let mut step = ChunkStep::builder().reader(IterReader::new(vec![1, 2, 3, 4]))
                                           .processor(|i: i32| -> Result<Option<i32>, StepFault> { Ok(if i <= 2 { None } else { Some(i * 10) }) })
                                           .writer(collecting_writer(out.clone()))
                                           .chunk_size(2)
                                           .build()
                                           .expect("build");
        let mut h = Harness::new();
        h.run(&mut step).expect("ok");
        assert_eq!(*out.lock(), vec![vec![30, 40]]);
        assert_eq!((h.step.read_count, h.step.write_count, h.step.skip_count, h.step.commit_count), (4, 2, 2, 2));
    }

    #[test]
    fn process_fault_abandons_whole_chunk() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let mut step = ChunkStep::builder().reader(IterReader::new(vec![1, 2, 3, 4]))
                                           .processor(|i: i32| if i == 4 { Err(StepFault::process("bad item")) } else { Ok(Some(i)) })
                                           .writer(collecting_writer(out.clone()))
                                           .chunk_size(2)
                                           .build()
                                           .expect("build");
        let mut h = Harness::new();
        assert!(h.run(&mut step).is_err());
        assert_eq!(*out.lock(), vec![vec![1, 2]]);
        assert_eq!(h.step.read_count, 2);
    }

    /// Reader que avanza el reloj en cada lectura (items lentos).
    struct SlowReader {
        items: Vec<i32>,
        clock: crate::clock::FakeClock,
    }

    impl ItemReader<i32> for SlowReader {
        fn read(&mut self) -> Result<Option<i32>, StepFault> {
            if self.items.is_empty() {
                return Ok(None);
            }
            self.clock.advance_ms(1000);
            Ok(Some(self.items.remove(0)))
        }
    }

    #[test]
    fn timeout_closes_chunk_before_count() {
        let mut h = Harness::new();
        let out = Arc::new(Mutex::new(Vec::new()));
        let policy = CompositePolicy::default().with(CountPolicy::new(5)).with(TimeoutPolicy::from_millis(3000));
        let mut step = ChunkStep::builder().reader(SlowReader { items: (1..=8).collect(),
                                                                clock: h.clock.clone() })
                                           .pass_through()
                                           .writer(collecting_writer(out.clone()))
                                           .completion_policy(policy)
                                           .build()
                                           .expect("build");
        h.run(&mut step).expect("ok");
        // 4 lecturas => 4000ms > 3000ms, el chunk se cierra con 4 items
        assert_eq!(*out.lock(), vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]]);
    }

    #[test]
    fn zero_timeout_still_drains_source_one_item_per_chunk() {
        let mut h = Harness::new();
        let out = Arc::new(Mutex::new(Vec::new()));
        let mut step = ChunkStep::builder().reader(SlowReader { items: (1..=5).collect(),
                                                                clock: h.clock.clone() })
                                           .pass_through()
                                           .writer(collecting_writer(out.clone()))
                                           .completion_policy(TimeoutPolicy::from_millis(0))
                                           .build()
                                           .expect("build");
        h.run(&mut step).expect("ok");
        assert_eq!(*out.lock(), vec![vec![1], vec![2], vec![3], vec![4], vec![5]]);
        assert_eq!((h.step.read_count, h.step.write_count, h.step.commit_count), (5, 5, 5));
    }

    #[test]
    fn stop_is_honoured_at_chunk_boundary() {
        let mut h = Harness::new();
        let stop = h.stop.clone();
        let out = Arc::new(Mutex::new(Vec::new()));
        let sink = out.clone();
        let writer = move |items: &[i32]| -> Result<(), StepFault> {
            sink.lock().push(items.to_vec());
            stop.request();
            Ok(())
        };
        let mut step = ChunkStep::builder().reader(IterReader::new(1..=6))
                                           .pass_through()
                                           .writer(writer)
                                           .chunk_size(2)
                                           .build()
                                           .expect("build");
        let outcome = h.run(&mut step).expect("ok");
        assert!(outcome.stopped);
        assert_eq!(*out.lock(), vec![vec![1, 2]]);
        assert_eq!(h.step.commit_count, 1);
    }
}
