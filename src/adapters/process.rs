use crate::domain::ports::{ProcessOutput, ProcessRunner};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Spawns real child processes and captures their output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        tracing::debug!("Running {} with {} arguments", program, args.len());

        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
