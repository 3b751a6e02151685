//! Contratos de colaboradores de un chunk step.

use crate::context::ExecutionContext;
use crate::errors::StepFault;

/// Fuente perezosa y finita de items. `open`/`update`/`close` permiten
/// readers con estado reanudable: `update` se invoca tras cada commit y el
/// contexto resultante se persiste con el step.
pub trait ItemReader<I>: Send {
    fn open(&mut self, _ctx: &ExecutionContext) -> Result<(), StepFault> {
        Ok(())
    }
    /// `Ok(None)` = fin de datos.
    fn read(&mut self) -> Result<Option<I>, StepFault>;
    fn update(&mut self, _ctx: &mut ExecutionContext) -> Result<(), StepFault> {
        Ok(())
    }
    fn close(&mut self) -> Result<(), StepFault> {
        Ok(())
    }
}

/// Transformación de un item; `Ok(None)` descarta el item sin fallar el chunk.
pub trait ItemProcessor<I, O>: Send {
    fn process(&mut self, item: I) -> Result<Option<O>, StepFault>;
}

impl<I, O, F> ItemProcessor<I, O> for F where F: FnMut(I) -> Result<Option<O>, StepFault> + Send
{
    fn process(&mut self, item: I) -> Result<Option<O>, StepFault> {
        self(item)
    }
}

/// Sumidero de lotes. Nunca recibe un lote vacío.
pub trait ItemWriter<O>: Send {
    fn write(&mut self, items: &[O]) -> Result<(), StepFault>;
}

impl<O, F> ItemWriter<O> for F where F: FnMut(&[O]) -> Result<(), StepFault> + Send
{
    fn write(&mut self, items: &[O]) -> Result<(), StepFault> {
        self(items)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughProcessor;

impl<T: Send> ItemProcessor<T, T> for PassThroughProcessor {
    fn process(&mut self, item: T) -> Result<Option<T>, StepFault> {
        Ok(Some(item))
    }
}

/// Reader sobre un iterador en memoria (sin estado reanudable).
pub struct IterReader<T> {
    inner: Box<dyn Iterator<Item = T> + Send>,
}

impl<T> IterReader<T> {
    pub fn new<It>(items: It) -> Self
        where It: IntoIterator<Item = T>,
              It::IntoIter: Send + 'static
    {
        Self { inner: Box::new(items.into_iter()) }
    }
}

impl<T> ItemReader<T> for IterReader<T> {
    fn read(&mut self) -> Result<Option<T>, StepFault> {
        Ok(self.inner.next())
    }
}
