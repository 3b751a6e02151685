//! Tipos de evento emitidos por el orquestador y los executors.
//!
//! Rol en el flujo:
//! - Cada ejecución de job emite eventos al `ExecutionRepository`, que les
//!   asigna `seq` en orden de llegada.
//! - Son un contrato observable: permiten auditar qué chunks se confirmaron,
//!   qué transiciones se tomaron y cuándo se promovió contexto.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::execution::BatchStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BatchEventKind {
    /// Primer evento de una ejecución. `restart` indica que existía una
    /// ejecución previa fallida/detenida de la misma instancia.
    JobStarted { job_name: String, identity_hash: String, restart: bool },
    StepStarted { step_name: String },
    /// Step omitido en un reinicio porque ya había completado; su exit code
    /// previo se reutiliza para enrutar.
    StepSkipped { step_name: String, exit_code: String },
    /// Chunk confirmado. `commit` es el número de commit dentro del step.
    ChunkCommitted { step_name: String, commit: u64, read: usize, written: usize },
    /// Chunk abandonado por un fault: nada de este chunk se escribió.
    ChunkRolledBack { step_name: String, reason: String },
    StepFinished { step_name: String, status: BatchStatus, exit_code: String },
    ContextPromoted { step_name: String, keys: Vec<String> },
    TransitionTaken { from: String, exit_code: String, to: String },
    JobFinished { status: BatchStatus, exit_code: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEvent {
    pub seq: u64, // asignado por el repositorio (orden append)
    pub job_execution_id: Uuid,
    pub kind: BatchEventKind,
    pub ts: DateTime<Utc>,
}

impl BatchEventKind {
    /// Código compacto de una letra (útil en tests y en la CLI).
    pub fn code(&self) -> &'static str {
        match self {
            BatchEventKind::JobStarted { .. } => "J",
            BatchEventKind::StepStarted { .. } => "S",
            BatchEventKind::StepSkipped { .. } => "K",
            BatchEventKind::ChunkCommitted { .. } => "C",
            BatchEventKind::ChunkRolledBack { .. } => "R",
            BatchEventKind::StepFinished { .. } => "F",
            BatchEventKind::ContextPromoted { .. } => "P",
            BatchEventKind::TransitionTaken { .. } => "T",
            BatchEventKind::JobFinished { .. } => "E",
        }
    }
}

pub fn event_codes(events: &[BatchEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.kind.code()).collect()
}
