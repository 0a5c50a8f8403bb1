use crate::core::connector::ConnectorOptions;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "matchbox")]
#[command(about = "Pull a raw MATCHBox dataset from the API or a MongoDB export")]
pub struct CliArgs {
    /// Acquisition method: "api" or "mongo"
    #[arg(short, long)]
    pub method: String,

    /// Path to the JSON or TOML credentials file
    #[arg(short, long, default_value = "matchbox_conf.json")]
    pub config: String,

    /// MongoDB collection to export ("patient" or "treatmentArms")
    #[arg(long)]
    pub collection: Option<String>,

    /// Extra API query parameter, KEY=VALUE (repeatable)
    #[arg(long = "param", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Keep a raw dump: "mb", "ta" or an explicit file name
    #[arg(long)]
    pub make_raw: Option<String>,

    #[arg(long, default_value = ".")]
    pub output_dir: String,

    /// Suppress progress messages
    #[arg(short, long)]
    pub quiet: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Print the acquired dataset as JSON on stdout
    #[arg(long)]
    pub print: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub log_json: bool,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{}`", s))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

impl CliArgs {
    pub fn connector_options(&self) -> ConnectorOptions {
        let mut options = ConnectorOptions::new(self.method.clone())
            .quiet(self.quiet)
            .output_dir(self.output_dir.clone());

        for (key, value) in &self.params {
            options = options.param(key.clone(), value.clone());
        }
        if let Some(collection) = &self.collection {
            options = options.mongo_collection(collection.clone());
        }
        if let Some(make_raw) = &self.make_raw {
            options = options.make_raw(make_raw.clone());
        }
        options
    }
}

impl Validate for CliArgs {
    fn validate(&self) -> Result<()> {
        validate_path("config", &self.config)?;
        validate_path("output_dir", &self.output_dir)?;
        if let Some(make_raw) = &self.make_raw {
            validate_non_empty_string("make_raw", make_raw)?;
        }
        Ok(())
    }
}
