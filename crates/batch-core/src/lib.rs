//! batch-core: motor de jobs batch orientado a chunks.
//!
//! Piezas (de las hojas hacia arriba): parámetros e identidad, validación,
//! políticas de completitud, contexto de ejecución, executors de step,
//! orquestador de flujo y contrato del repositorio de ejecuciones.
pub mod clock;
pub mod constants;
pub mod context;
pub mod errors;
pub mod event;
pub mod execution;
pub mod flow;
pub mod hashing;
pub mod job;
pub mod listener;
pub mod params;
pub mod policy;
pub mod repo;
pub mod step;
pub mod validation;

pub use clock::{Clock, FakeClock, SystemClock};
pub use context::{ContextView, ExecutionContext, PromotionListener};
pub use errors::{BatchError, FaultKind, RepositoryError, StepFault};
pub use event::{event_codes, BatchEvent, BatchEventKind};
pub use execution::{BatchStatus, ExitStatus, JobExecution, JobReport, StepExecution, StepReport};
pub use flow::{FlowBuilder, FlowGraph, Route, Target};
pub use job::{Job, JobBuilder, JobExecutionHandle, JobLauncher, JobRegistry, JobRunner, RestartState};
pub use listener::{JobListener, PerformanceListener, StepListener};
pub use params::{parse_cli_params, DailyTimeStamper, IdentityResolver, JobIdentity, JobParameter, ParamValue, ParameterSet, ParametersIncrementer, RunIdIncrementer};
pub use policy::{ChunkState, CompletionPolicy, CompositePolicy, CountPolicy, TimeoutPolicy};
pub use repo::{ExecutionRepository, InMemoryExecutionRepository};
pub use step::{CallableTasklet, ChunkStep, ItemProcessor, ItemReader, ItemWriter, IterReader, RepeatStatus, Step, StepScope, StopSignal, Tasklet, TaskletStep};
pub use validation::{CompositeValidator, InvalidParameters, ParametersValidator};
