pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::process::SystemProcessRunner;
pub use config::Config;
pub use crate::core::connector::{Connector, ConnectorOptions};
pub use domain::model::{Dataset, Matchbox, Method, MongoCollection, Outcome, RawDump, SessionToken};
pub use domain::ports::{ConfigProvider, ProcessOutput, ProcessRunner};
pub use utils::error::{MatchboxError, Result};
