//! Registros de ejecución (job y step), estados y reportes derivados.

pub mod model;
pub mod report;
pub mod status;

pub use model::{JobExecution, StepExecution};
pub use report::{format_duration, throughput, JobReport, StepReport};
pub use status::{BatchStatus, ExitStatus};
