//! Contrato del almacén de ejecuciones + implementación en memoria.

mod memory;
mod types;

pub use memory::InMemoryExecutionRepository;
pub use types::{check_instance, ExecutionRepository};
