//! Contexto de ejecución (step o job) y promoción step -> job.

pub mod execution_context;
pub mod promotion;

pub use execution_context::{ContextView, ExecutionContext};
pub use promotion::PromotionListener;
