use crate::domain::model::{Matchbox, Outcome};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Named-field lookup over the caller's credentials and URLs.
pub trait ConfigProvider: Send + Sync {
    fn get_config_item(&self, key: &str) -> Result<&str>;
    fn keys(&self) -> Vec<&str>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the child was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs an external program to completion.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput>;
}

/// One acquisition method (API or Mongo export).
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn acquire(&self) -> Result<Outcome<Matchbox>>;
}
