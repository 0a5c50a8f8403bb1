pub mod api;
pub mod connector;
pub mod mongo;

pub use crate::domain::model::{Dataset, Matchbox, Outcome};
pub use crate::domain::ports::{ConfigProvider, DataSource, ProcessOutput, ProcessRunner};
pub use crate::utils::error::Result;
