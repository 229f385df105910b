// Document export trigger: launches the exporter inside the web container, fire-and-forget.

use std::process::Stdio;
use tokio::process::Command;

use crate::config::BackupConfig;

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct BackupTrigger {
    program: String,
    args: Vec<String>,
}

impl BackupTrigger {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &BackupConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    /// Spawns the export and returns its pid without waiting for completion.
    /// The exit status is only logged.
    pub fn start(&self) -> Result<Option<u32>, BackupError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| BackupError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let pid = child.id();
        tracing::info!(program = %self.program, pid, "Backup export started");

        let program = self.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    tracing::info!(program = %program, "Backup export finished")
                }
                Ok(status) => tracing::warn!(
                    program = %program,
                    code = status.code(),
                    "Backup export exited with failure"
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    operation = "backup_wait",
                    "Backup export could not be awaited"
                ),
            }
        });
        Ok(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let trigger = BackupTrigger::new("optilink-no-such-program", vec![]);
        let err = trigger.start().unwrap_err();
        let BackupError::Spawn { program, .. } = &err;
        assert_eq!(program, "optilink-no-such-program");
        assert!(err.to_string().starts_with("failed to start"));
    }

    #[tokio::test]
    async fn existing_program_starts() {
        let trigger = BackupTrigger::new("true", vec![]);
        assert!(trigger.start().is_ok());
    }
}
