//! Estado estructural (`BatchStatus`) vs señal de salida (`ExitStatus`).
//!
//! El estado dice si la ejecución terminó bien o mal; la señal de salida es
//! el string que el flujo usa para enrutar. Un step puede terminar
//! COMPLETED con exit code FAILED (fallo deliberado sin fault).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{EXIT_COMPLETED, EXIT_EXECUTING, EXIT_FAILED, EXIT_NOOP, EXIT_STOPPED, EXIT_UNKNOWN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Starting,
    Started,
    Completed,
    Failed,
    Stopped,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Starting => "STARTING",
            BatchStatus::Started => "STARTED",
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::Failed => "FAILED",
            BatchStatus::Stopped => "STOPPED",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, BatchStatus::Starting | BatchStatus::Started)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_running()
    }

    pub fn is_unsuccessful(&self) -> bool {
        matches!(self, BatchStatus::Failed | BatchStatus::Stopped)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STARTING" => Ok(BatchStatus::Starting),
            "STARTED" => Ok(BatchStatus::Started),
            "COMPLETED" => Ok(BatchStatus::Completed),
            "FAILED" => Ok(BatchStatus::Failed),
            "STOPPED" => Ok(BatchStatus::Stopped),
            other => Err(format!("unknown batch status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    pub exit_code: String,
    pub exit_description: String,
}

impl ExitStatus {
    pub fn new(exit_code: impl Into<String>) -> Self {
        Self { exit_code: exit_code.into(),
               exit_description: String::new() }
    }
    pub fn completed() -> Self {
        Self::new(EXIT_COMPLETED)
    }
    pub fn failed() -> Self {
        Self::new(EXIT_FAILED)
    }
    pub fn stopped() -> Self {
        Self::new(EXIT_STOPPED)
    }
    pub fn noop() -> Self {
        Self::new(EXIT_NOOP)
    }
    pub fn unknown() -> Self {
        Self::new(EXIT_UNKNOWN)
    }
    pub fn executing() -> Self {
        Self::new(EXIT_EXECUTING)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.exit_description = description.into();
        self
    }

    pub fn is_failed(&self) -> bool {
        self.exit_code == EXIT_FAILED
    }

    /// Exit status por defecto para un estado terminal.
    pub fn for_status(status: BatchStatus) -> Self {
        match status {
            BatchStatus::Completed => Self::completed(),
            BatchStatus::Failed => Self::failed(),
            BatchStatus::Stopped => Self::stopped(),
            BatchStatus::Starting | BatchStatus::Started => Self::executing(),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_roundtrip() {
        for s in [BatchStatus::Starting, BatchStatus::Started, BatchStatus::Completed, BatchStatus::Failed, BatchStatus::Stopped] {
            assert_eq!(s.as_str().parse::<BatchStatus>(), Ok(s));
        }
        assert!("RUNNING".parse::<BatchStatus>().is_err());
    }
}
