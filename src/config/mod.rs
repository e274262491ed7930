#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.palvelutietovaranto.suomi.fi/api/v11";
pub const DEFAULT_PROVINCE_NAME: &str = "Varsinais-Suomi";
pub const DEFAULT_MUNICIPALITY_NAMES: [&str; 27] = [
    "Aura",
    "Kaarina",
    "Kemiönsaari",
    "Koski Tl",
    "Kustavi",
    "Laitila",
    "Lieto",
    "Loimaa",
    "Marttila",
    "Masku",
    "Mynämäki",
    "Naantali",
    "Nousiainen",
    "Oripää",
    "Paimio",
    "Parainen",
    "Pyhäranta",
    "Pöytyä",
    "Raisio",
    "Rusko",
    "Salo",
    "Sauvo",
    "Somero",
    "Taivassalo",
    "Turku",
    "Uusikaupunki",
    "Vehmaa",
];
/// Upper bound the catalog accepts for `guids` in one detail request.
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    pub mongo: MongoConfig,
    #[serde(default)]
    pub region: RegionSpec,
    #[serde(default)]
    pub sync: SyncOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: default_timeout_seconds(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    #[serde(default = "default_mongo_port")]
    pub port: u16,
    /// Database named in the connection URI, used for authentication.
    pub auth_database: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_true")]
    pub tls: bool,
    #[serde(default = "default_true")]
    pub tls_insecure: bool,
    #[serde(default = "default_replica_set")]
    pub replica_set: Option<String>,
    #[serde(default)]
    pub retry_writes: bool,
    #[serde(default = "default_max_idle_time_ms")]
    pub max_idle_time_ms: Option<u64>,
}

/// Target region: one province and the municipalities that belong to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionSpec {
    pub province_name: String,
    pub municipality_names: Vec<String>,
}

impl Default for RegionSpec {
    fn default() -> Self {
        Self {
            province_name: DEFAULT_PROVINCE_NAME.to_string(),
            municipality_names: DEFAULT_MUNICIPALITY_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

/// Which list query feeds the service round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceScope {
    /// Every service in the catalog; the suitability filter narrows it down.
    #[default]
    All,
    Province,
    Municipalities,
}

impl FromStr for ServiceScope {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ServiceScope::All),
            "province" => Ok(ServiceScope::Province),
            "municipalities" => Ok(ServiceScope::Municipalities),
            other => Err(SyncError::InvalidConfigValueError {
                field: "service_scope".to_string(),
                value: other.to_string(),
                reason: "Expected one of: all, province, municipalities".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    #[serde(default)]
    pub service_scope: ServiceScope,
    #[serde(default = "default_true")]
    pub include_whole_country: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            service_scope: ServiceScope::All,
            include_whole_country: true,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_mongo_port() -> u16 {
    27017
}

fn default_database() -> String {
    "service_db".to_string()
}

fn default_true() -> bool {
    true
}

fn default_replica_set() -> Option<String> {
    Some("globaldb".to_string())
}

fn default_max_idle_time_ms() -> Option<u64> {
    Some(120_000)
}

fn parse_var<T: FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SyncError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: "Not a valid number".to_string(),
        })
}

impl SyncConfig {
    /// 從環境變數載入配置
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 以任意查詢函式載入配置（測試時可傳入固定的對照表）
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| SyncError::MissingConfigError {
                field: key.to_string(),
            })
        };

        let mut upstream = UpstreamConfig::default();
        if let Some(api_url) = lookup("PTV_API_URL") {
            upstream.api_url = api_url;
        }
        if let Some(timeout) = lookup("PTV_REQUEST_TIMEOUT_SECONDS") {
            upstream.timeout_seconds = parse_var("PTV_REQUEST_TIMEOUT_SECONDS", &timeout)?;
        }

        let port = match lookup("MONGO_PORT") {
            Some(port) => parse_var("MONGO_PORT", &port)?,
            None => default_mongo_port(),
        };

        let mongo = MongoConfig {
            username: required("MONGO_USERNAME")?,
            password: required("MONGO_PASSWORD")?,
            host: required("MONGO_HOST")?,
            port,
            auth_database: lookup("MONGO_DB"),
            database: lookup("SERVICE_DB").unwrap_or_else(default_database),
            tls: true,
            tls_insecure: true,
            replica_set: default_replica_set(),
            retry_writes: false,
            max_idle_time_ms: default_max_idle_time_ms(),
        };

        let mut sync = SyncOptions::default();
        if let Some(scope) = lookup("PTV_SERVICE_SCOPE") {
            sync.service_scope = scope.parse()?;
        }

        Ok(Self {
            upstream,
            mongo,
            region: RegionSpec::default(),
            sync,
        })
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SyncError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content, |key| std::env::var(key).ok())?;

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }
}

/// 替換 `${VAR}` 形式的環境變數；找不到的變數保持原樣
pub fn substitute_env_vars<F>(content: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SyncError::ConfigError {
        message: format!("Invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

impl MongoConfig {
    /// Connection string with the client options the hosted cluster expects.
    pub fn connection_uri(&self) -> Result<String> {
        let invalid = |reason: &str| SyncError::InvalidConfigValueError {
            field: "mongo.host".to_string(),
            value: self.host.clone(),
            reason: reason.to_string(),
        };

        let mut url = Url::parse(&format!("mongodb://{}:{}", self.host, self.port))
            .map_err(|e| invalid(&e.to_string()))?;
        url.set_username(&self.username)
            .map_err(|_| invalid("Cannot attach credentials to host"))?;
        url.set_password(Some(&self.password))
            .map_err(|_| invalid("Cannot attach credentials to host"))?;
        // the URI spec requires the slash before options even without a database
        url.set_path(&format!("/{}", self.auth_database.as_deref().unwrap_or_default()));

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("tls", &self.tls.to_string());
            if self.tls_insecure {
                query.append_pair("tlsInsecure", "true");
            }
            if let Some(replica_set) = &self.replica_set {
                query.append_pair("replicaSet", replica_set);
            }
            query.append_pair("retryWrites", &self.retry_writes.to_string());
            if let Some(max_idle) = self.max_idle_time_ms {
                query.append_pair("maxIdleTimeMS", &max_idle.to_string());
            }
            query.append_pair("appName", &format!("@{}@", self.username));
        }

        Ok(url.to_string())
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("upstream.api_url", &self.upstream.api_url)?;
        validation::validate_range("upstream.batch_size", self.upstream.batch_size, 1, MAX_BATCH_SIZE)?;
        validation::validate_range("upstream.timeout_seconds", self.upstream.timeout_seconds, 1, 3600)?;

        validation::validate_non_empty_string("mongo.username", &self.mongo.username)?;
        validation::validate_non_empty_string("mongo.password", &self.mongo.password)?;
        validation::validate_non_empty_string("mongo.host", &self.mongo.host)?;
        validation::validate_non_empty_string("mongo.database", &self.mongo.database)?;

        validation::validate_non_empty_string("region.province_name", &self.region.province_name)?;
        validation::validate_name_list("region.municipality_names", &self.region.municipality_names)?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}
