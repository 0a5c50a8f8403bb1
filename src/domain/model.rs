use crate::utils::json::print_json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Extra query parameters sent with every API page request.
pub type RequestParams = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<Value>,
}

impl Dataset {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.records.iter()
    }

    /// Append one page of records, keeping arrival order.
    pub fn extend_page(&mut self, page: Vec<Value>) {
        self.records.extend(page);
    }

    pub fn into_records(self) -> Vec<Value> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Result of one acquisition run.
///
/// `Aborted` means the run gave up and handed control back without a usable
/// instance. `Fatal` means the run hit an unrecoverable retrieval failure;
/// front ends are expected to stop the process with a non-zero status.
#[derive(Debug)]
pub enum Outcome<T> {
    Loaded(T),
    Aborted(String),
    Fatal(String),
}

impl<T> Outcome<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Outcome::Loaded(_))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::Fatal(_))
    }

    pub fn loaded(self) -> Option<T> {
        match self {
            Outcome::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Loaded(_) => None,
            Outcome::Aborted(reason) | Outcome::Fatal(reason) => Some(reason),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Loaded(value) => Outcome::Loaded(f(value)),
            Outcome::Aborted(reason) => Outcome::Aborted(reason),
            Outcome::Fatal(reason) => Outcome::Fatal(reason),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn authorization_header(&self) -> String {
        format!("bearer {}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Api,
    Mongo,
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "api" => Ok(Method::Api),
            "mongo" => Ok(Method::Mongo),
            other => Err(format!(
                "method {} is not a valid method! Choose only from \"api\" or \"mongo\".",
                other
            )),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Api => f.write_str("api"),
            Method::Mongo => f.write_str("mongo"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MongoCollection {
    Patient,
    TreatmentArms,
}

impl MongoCollection {
    pub const ALL: [MongoCollection; 2] = [MongoCollection::Patient, MongoCollection::TreatmentArms];

    pub fn as_str(&self) -> &'static str {
        match self {
            MongoCollection::Patient => "patient",
            MongoCollection::TreatmentArms => "treatmentArms",
        }
    }
}

impl FromStr for MongoCollection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MongoCollection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = MongoCollection::ALL.iter().map(|c| c.as_str()).collect();
                format!(
                    "collection {} is not valid. Please only choose from: {}",
                    s,
                    allowed.join(", ")
                )
            })
    }
}

/// How a durable raw dump is named. `mb` and `ta` pick the dated default
/// name, anything else is taken as an explicit file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDump {
    Mb,
    Ta,
    File(PathBuf),
}

impl FromStr for RawDump {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("make_raw must be \"mb\", \"ta\" or a file name".to_string()),
            "mb" => Ok(RawDump::Mb),
            "ta" => Ok(RawDump::Ta),
            name => Ok(RawDump::File(PathBuf::from(name))),
        }
    }
}

/// A usable connector instance holding whatever one run acquired.
#[derive(Debug)]
pub struct Matchbox {
    method: Method,
    today: String,
    api_data: Dataset,
    token: Option<SessionToken>,
    raw_dump: Option<PathBuf>,
}

impl Matchbox {
    pub(crate) fn new(method: Method, today: String) -> Self {
        Self {
            method,
            today,
            api_data: Dataset::default(),
            token: None,
            raw_dump: None,
        }
    }

    pub(crate) fn with_data(mut self, data: Dataset) -> Self {
        self.api_data = data;
        self
    }

    pub(crate) fn with_token(mut self, token: SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    pub(crate) fn with_raw_dump(mut self, path: PathBuf) -> Self {
        self.raw_dump = Some(path);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// `MMDDYY` stamp of the run.
    pub fn today(&self) -> &str {
        &self.today
    }

    pub fn api_data(&self) -> &Dataset {
        &self.api_data
    }

    pub fn into_dataset(self) -> Dataset {
        self.api_data
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    pub fn raw_dump(&self) -> Option<&Path> {
        self.raw_dump.as_deref()
    }
}

impl fmt::Display for Matchbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = print_json(&self.api_data).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
