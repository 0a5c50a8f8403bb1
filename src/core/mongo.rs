use crate::domain::model::{Dataset, Matchbox, Method, MongoCollection, Outcome};
use crate::domain::ports::{ConfigProvider, DataSource, ProcessRunner};
use crate::utils::error::{MatchboxError, Result};
use crate::utils::json::{make_json, read_json};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const EXPORT_PROGRAM: &str = "mongoexport";
pub const EXPORT_HOSTS: &str = "adultmatch-production-shard-00-00-tnrm0.mongodb.net:27017,\
adultmatch-production-shard-00-01-tnrm0.mongodb.net:27017,\
adultmatch-production-shard-00-02-tnrm0.mongodb.net:27017";
pub const EXPORT_DATABASE: &str = "Match";
pub const AUTH_DATABASE: &str = "admin";
pub const EXPORT_ATTEMPTS: u32 = 4;

/// Argument list for one `mongoexport` run writing a JSON array to `outfile`.
pub fn export_args(user: &str, pass: &str, collection: MongoCollection, outfile: &Path) -> Vec<String> {
    vec![
        "--host".to_string(),
        EXPORT_HOSTS.to_string(),
        "--ssl".to_string(),
        "--username".to_string(),
        user.to_string(),
        "--password".to_string(),
        pass.to_string(),
        "--authenticationDatabase".to_string(),
        AUTH_DATABASE.to_string(),
        "--db".to_string(),
        EXPORT_DATABASE.to_string(),
        "--collection".to_string(),
        collection.as_str().to_string(),
        "--type".to_string(),
        "json".to_string(),
        "--jsonArray".to_string(),
        "--out".to_string(),
        outfile.to_string_lossy().into_owned(),
    ]
}

/// Bulk export of one MATCHBox collection through `mongoexport`.
pub struct MongoSource<'a, C: ConfigProvider> {
    config: &'a C,
    runner: &'a dyn ProcessRunner,
    collection: MongoCollection,
    outfile: PathBuf,
    keep_raw: bool,
    today: String,
    quiet: bool,
}

impl<'a, C: ConfigProvider> MongoSource<'a, C> {
    pub fn new(
        config: &'a C,
        runner: &'a dyn ProcessRunner,
        collection: MongoCollection,
        outfile: PathBuf,
        today: String,
    ) -> Self {
        Self {
            config,
            runner,
            collection,
            outfile,
            keep_raw: false,
            today,
            quiet: false,
        }
    }

    /// Leave the export on disk (pretty-printed) instead of deleting it.
    pub fn keep_raw(mut self, keep: bool) -> Self {
        self.keep_raw = keep;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// `true` once an attempt exits 0.
    async fn export(&self, args: &[String]) -> Result<bool> {
        for attempt in 1..=EXPORT_ATTEMPTS {
            let output = self.runner.run(EXPORT_PROGRAM, args).await?;

            if output.success() {
                if !self.quiet {
                    tracing::info!("Completed Mongo DB export successfully.");
                }
                return Ok(true);
            }

            tracing::error!(
                "Error getting data from mongoDB (exit {:?}). Attempt {}/{}.",
                output.exit_code,
                attempt,
                EXPORT_ATTEMPTS
            );
            if !output.stderr.trim().is_empty() {
                tracing::error!("{}", output.stderr.trim());
            }
        }

        Ok(false)
    }
}

#[async_trait]
impl<'a, C: ConfigProvider> DataSource for MongoSource<'a, C> {
    async fn acquire(&self) -> Result<Outcome<Matchbox>> {
        let user = self.config.get_config_item("mongo_user")?;
        let pass = self.config.get_config_item("mongo_pass")?;
        let args = export_args(user, pass, self.collection, &self.outfile);

        if !self.export(&args).await? {
            let reason = "Can not get a MongoDB data dump! Can not continue.".to_string();
            tracing::error!("{}", reason);
            return Ok(Outcome::Aborted(reason));
        }

        let data = read_json(&self.outfile)?;
        let matchbox = Matchbox::new(Method::Mongo, self.today.clone());

        if !self.keep_raw {
            std::fs::remove_file(&self.outfile)?;
            let records = match data {
                Value::Array(records) => records,
                _ => {
                    return Err(MatchboxError::ExportError {
                        message: format!(
                            "{} does not hold a JSON array",
                            self.outfile.display()
                        ),
                    })
                }
            };
            return Ok(Outcome::Loaded(matchbox.with_data(Dataset::new(records))));
        }

        // 保留檔案時只重寫成易讀格式，不放進記憶體
        make_json(&self.outfile, &data, true)?;
        tracing::info!("Done making a raw MATCHBox data dump file.");
        Ok(Outcome::Loaded(matchbox.with_raw_dump(self.outfile.clone())))
    }
}
