use crate::domain::model::{Dataset, Matchbox, Method, Outcome, RawDump, RequestParams, SessionToken};
use crate::domain::ports::{ConfigProvider, DataSource};
use crate::utils::date::dump_file_name;
use crate::utils::error::{MatchboxError, Result};
use crate::utils::json::make_json;
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::{json, Value};
use std::ops::RangeInclusive;
use std::path::PathBuf;

pub const IDENTITY_ENDPOINT: &str = "https://ncimatch.auth0.com/oauth/ro";
pub const AUTH_SCOPE: &str = "openid roles email profile";
pub const AUTH_ATTEMPTS: u32 = 4;
/// The API is read page by page over a fixed range; it never signals a last page.
pub const API_PAGES: RangeInclusive<u32> = 1..=13;

struct Credentials<'a> {
    url: &'a str,
    username: &'a str,
    password: &'a str,
    client_name: &'a str,
    client_id: &'a str,
}

impl<'a> Credentials<'a> {
    fn from_config<C: ConfigProvider>(config: &'a C) -> Result<Self> {
        let url = config.get_config_item("url")?;
        validate_url("url", url)?;

        Ok(Self {
            url,
            username: config.get_config_item("username")?,
            password: config.get_config_item("password")?,
            client_name: config.get_config_item("client_name")?,
            client_id: config.get_config_item("client_id")?,
        })
    }
}

/// Pulls the patient dataset from the MATCHBox REST API.
pub struct ApiSource<'a, C: ConfigProvider> {
    client: &'a Client,
    config: &'a C,
    params: &'a RequestParams,
    auth_endpoint: &'a str,
    raw_dump: Option<PathBuf>,
    today: String,
    quiet: bool,
}

impl<'a, C: ConfigProvider> ApiSource<'a, C> {
    pub fn new(
        client: &'a Client,
        config: &'a C,
        params: &'a RequestParams,
        auth_endpoint: &'a str,
        today: String,
    ) -> Self {
        Self {
            client,
            config,
            params,
            auth_endpoint,
            raw_dump: None,
            today,
            quiet: false,
        }
    }

    /// Write the accumulated dataset to `path` once all pages are in.
    pub fn with_raw_dump(mut self, path: PathBuf) -> Self {
        self.raw_dump = Some(path);
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Password-grant token exchange, retried immediately on any non-2xx
    /// status. `None` once every attempt has failed.
    async fn get_token(&self, creds: &Credentials<'_>) -> Result<Option<SessionToken>> {
        let body = json!({
            "client_id": creds.client_id,
            "username": creds.username,
            "password": creds.password,
            "grant_type": "password",
            "scope": AUTH_SCOPE,
            "connection": creds.client_name,
        });

        for attempt in 1..=AUTH_ATTEMPTS {
            tracing::debug!("Requesting token from {} (attempt {})", self.auth_endpoint, attempt);
            let response = self.client.post(self.auth_endpoint).json(&body).send().await?;
            let status = response.status();

            if status.is_success() {
                let payload: Value = response.json().await?;
                let token = payload
                    .get("id_token")
                    .and_then(Value::as_str)
                    .ok_or_else(|| MatchboxError::AuthenticationError {
                        message: "token response has no id_token".to_string(),
                    })?;
                return Ok(Some(SessionToken::new(token)));
            }

            tracing::error!(
                "Got an error trying to get an Auth0 token ({})! Attempt {} of {}.",
                status,
                attempt,
                AUTH_ATTEMPTS
            );
        }

        Ok(None)
    }

    /// `Ok(Err(reason))` is a failed page; the whole run stops on it.
    async fn fetch_page(
        &self,
        url: &str,
        token: &SessionToken,
        page: u32,
    ) -> Result<std::result::Result<Vec<Value>, String>> {
        let mut query = self.params.clone();
        query.insert("page".to_string(), page.to_string());

        let response = self
            .client
            .get(url)
            .query(&query)
            .header(AUTHORIZATION, token.authorization_header())
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("page {} -> {}", page, status);
        if !status.is_success() {
            return Ok(Err(format!(
                "Can not access MATCHBox data. Page {} returned {}",
                page, status
            )));
        }

        match response.json::<Value>().await? {
            Value::Array(items) => Ok(Ok(items)),
            _ => Ok(Err(format!(
                "Can not access MATCHBox data. Page {} is not a JSON array",
                page
            ))),
        }
    }
}

#[async_trait]
impl<'a, C: ConfigProvider> DataSource for ApiSource<'a, C> {
    async fn acquire(&self) -> Result<Outcome<Matchbox>> {
        let creds = Credentials::from_config(self.config)?;

        let token = match self.get_token(&creds).await? {
            Some(token) => token,
            None => {
                let reason = format!(
                    "Could not get an Auth0 token after {} attempts",
                    AUTH_ATTEMPTS
                );
                tracing::error!("{}", reason);
                return Ok(Outcome::Fatal(reason));
            }
        };

        let mut dataset = Dataset::default();
        for page in API_PAGES {
            match self.fetch_page(creds.url, &token, page).await? {
                Ok(items) => dataset.extend_page(items),
                Err(reason) => {
                    tracing::error!("{}", reason);
                    return Ok(Outcome::Fatal(reason));
                }
            }
        }

        if !self.quiet {
            tracing::info!("Completed the call successfully!");
            tracing::info!("   -> return len: {}", dataset.len());
        }

        let mut matchbox = Matchbox::new(Method::Api, self.today.clone()).with_token(token);
        if let Some(path) = &self.raw_dump {
            make_json(path, &dataset, true)?;
            if !self.quiet {
                tracing::info!("Raw MATCHBox dump written to {}", path.display());
            }
            matchbox = matchbox.with_raw_dump(path.clone());
        }

        Ok(Outcome::Loaded(matchbox.with_data(dataset)))
    }
}

/// Default raw dump name for the API path: the `mb`/`ta` tag, or the
/// caller's own file name.
pub fn raw_dump_name(raw: &RawDump, date: chrono::NaiveDate) -> PathBuf {
    match raw {
        RawDump::Mb => PathBuf::from(dump_file_name("mb", date)),
        RawDump::Ta => PathBuf::from(dump_file_name("ta", date)),
        RawDump::File(path) => path.clone(),
    }
}
