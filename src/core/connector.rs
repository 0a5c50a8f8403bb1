use crate::adapters::process::SystemProcessRunner;
use crate::core::api::{raw_dump_name, ApiSource, IDENTITY_ENDPOINT};
use crate::core::mongo::MongoSource;
use crate::domain::model::{Matchbox, Method, MongoCollection, Outcome, RawDump, RequestParams};
use crate::domain::ports::{ConfigProvider, DataSource, ProcessRunner};
use crate::utils::date::{dump_file_name, format_date, DateFormat};
use crate::utils::error::Result;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;

/// Caller-owned settings for one acquisition run.
///
/// `method`, `mongo_collection` and `make_raw` are kept as the raw strings the
/// caller handed over; they are checked when the run starts so that a bad
/// value ends in [`Outcome::Aborted`] rather than a hard error.
#[derive(Debug, Clone)]
pub struct ConnectorOptions {
    pub method: String,
    pub params: RequestParams,
    pub mongo_collection: Option<String>,
    pub make_raw: Option<String>,
    pub quiet: bool,
    pub output_dir: PathBuf,
}

impl ConnectorOptions {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: RequestParams::new(),
            mongo_collection: None,
            make_raw: None,
            quiet: false,
            output_dir: PathBuf::from("."),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn mongo_collection(mut self, collection: impl Into<String>) -> Self {
        self.mongo_collection = Some(collection.into());
        self
    }

    pub fn make_raw(mut self, make_raw: impl Into<String>) -> Self {
        self.make_raw = Some(make_raw.into());
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

pub struct Connector {
    options: ConnectorOptions,
    client: Client,
    runner: Arc<dyn ProcessRunner>,
    auth_endpoint: String,
    date: NaiveDate,
}

impl Connector {
    pub fn new(options: ConnectorOptions) -> Self {
        Self {
            options,
            client: Client::new(),
            runner: Arc::new(SystemProcessRunner),
            auth_endpoint: IDENTITY_ENDPOINT.to_string(),
            date: Local::now().date_naive(),
        }
    }

    pub fn with_process_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_auth_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.auth_endpoint = endpoint.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Date used for dump file names; defaults to today.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn options(&self) -> &ConnectorOptions {
        &self.options
    }

    fn abort(reason: String) -> Outcome<Matchbox> {
        tracing::error!("{}", reason);
        Outcome::Aborted(reason)
    }

    /// Run the configured acquisition method once.
    ///
    /// Configuration mistakes and an exhausted export come back as
    /// `Aborted`; an exhausted login or a failed API page as `Fatal`.
    /// File and transport failures are returned as `Err`.
    pub async fn acquire<C: ConfigProvider>(&self, config: &C) -> Result<Outcome<Matchbox>> {
        let method = match self.options.method.parse::<Method>() {
            Ok(method) => method,
            Err(reason) => return Ok(Self::abort(reason)),
        };

        let raw_dump = match self.options.make_raw.as_deref().map(str::parse::<RawDump>) {
            None => None,
            Some(Ok(raw)) => Some(raw),
            Some(Err(reason)) => return Ok(Self::abort(reason)),
        };
        if raw_dump.is_some() && !self.options.quiet {
            tracing::info!(
                "Making a raw MATCHBox dump that can be loaded for development purposes \
                 rather than a live call to MATCHBox prior to parsing and filtering."
            );
        }

        let today = format_date(self.date, DateFormat::Short);
        let quiet = self.options.quiet;

        let source: Box<dyn DataSource + '_> = match method {
            Method::Api => {
                tracing::warn!(
                    "API calls are soon to be deprecated. Please transition to MongoDB calls."
                );
                let mut source = ApiSource::new(
                    &self.client,
                    config,
                    &self.options.params,
                    &self.auth_endpoint,
                    today,
                )
                .quiet(quiet);
                if let Some(raw) = &raw_dump {
                    source = source.with_raw_dump(
                        self.options.output_dir.join(raw_dump_name(raw, self.date)),
                    );
                }
                Box::new(source)
            }
            Method::Mongo => {
                let collection = match self.options.mongo_collection.as_deref() {
                    None => {
                        return Ok(Self::abort(
                            "You must input a collection when making the MongoDB call."
                                .to_string(),
                        ))
                    }
                    Some(name) => match name.parse::<MongoCollection>() {
                        Ok(collection) => collection,
                        Err(reason) => return Ok(Self::abort(reason)),
                    },
                };

                let file_name = match &raw_dump {
                    Some(RawDump::File(path)) => path.clone(),
                    _ => PathBuf::from(dump_file_name(collection.as_str(), self.date)),
                };
                let outfile = self.options.output_dir.join(file_name);

                Box::new(
                    MongoSource::new(config, self.runner.as_ref(), collection, outfile, today)
                        .keep_raw(raw_dump.is_some())
                        .quiet(quiet),
                )
            }
        };

        tracing::debug!("Acquiring MATCHBox data with method {}", method);
        source.acquire().await
    }
}
