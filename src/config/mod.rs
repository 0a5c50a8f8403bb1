#[cfg(feature = "cli")]
pub mod cli;

use crate::core::ConfigProvider;
use crate::utils::error::{MatchboxError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Credentials and URLs for a MATCHBox connection, keyed by item name
/// (`url`, `username`, `password`, `client_name`, `client_id`,
/// `mongo_user`, `mongo_pass`).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Config {
    items: BTreeMap<String, String>,
}

impl Config {
    /// 從 JSON 或 TOML 檔案載入設定（依副檔名判斷）
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let content = Self::substitute_env_vars(&content);

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| MatchboxError::ConfigParseError {
                message: format!("JSON parsing error: {}", e),
            })?;

        let serde_json::Value::Object(map) = value else {
            return Err(MatchboxError::ConfigParseError {
                message: "config file must hold a single JSON object".to_string(),
            });
        };

        Ok(map
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table =
            toml::from_str(content).map_err(|e| MatchboxError::ConfigParseError {
                message: format!("TOML parsing error: {}", e),
            })?;

        Ok(table
            .into_iter()
            .map(|(key, value)| match value {
                toml::Value::String(s) => (key, s),
                other => (key, other.to_string()),
            })
            .collect())
    }

    /// 替換環境變數 (例如 ${MONGO_PASS})，找不到的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            items: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigProvider for Config {
    fn get_config_item(&self, key: &str) -> Result<&str> {
        self.items
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| MatchboxError::MissingConfigError {
                field: key.to_string(),
            })
    }

    fn keys(&self) -> Vec<&str> {
        self.items.keys().map(String::as_str).collect()
    }
}

// 不輸出密碼等內容，只列出 key
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("keys", &self.keys())
            .finish()
    }
}
