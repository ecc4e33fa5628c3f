use crate::core::document::REALTY_NAMESPACE;
use crate::core::importer::{ListingErrorPolicy, SiteInfo, DEFAULT_SITE_NAME, DEFAULT_SITE_URL};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

static RE_ENV_VAR: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub import: ImportOptions,
    #[serde(default)]
    pub store: StoreConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SITE_NAME.to_string(),
            url: DEFAULT_SITE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportOptions {
    #[serde(default)]
    pub only_load: bool,
    #[serde(default)]
    pub on_listing_error: ListingErrorPolicy,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub output_path: String,
    pub export_csv: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            export_csv: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl ImportConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| {
            ImportError::configuration(format!("TOML parsing error: {}", e))
        })
    }

    /// 替換環境變數 (例如 ${FEED_PATH})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        let re = RE_ENV_VAR
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn site_info(&self) -> SiteInfo {
        SiteInfo {
            name: self.site.name.clone(),
            url: self.site.url.clone(),
        }
    }

    pub fn namespace(&self) -> &str {
        self.import.namespace.as_deref().unwrap_or(REALTY_NAMESPACE)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }
}

impl Validate for ImportConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.source.path {
            validation::validate_path("source.path", path)?;
        }

        validation::validate_non_empty_string("site.name", &self.site.name)?;
        validation::validate_url("site.url", &self.site.url)?;
        validation::validate_path("store.output_path", &self.store.output_path)?;

        if let Some(csv) = &self.store.export_csv {
            validation::validate_path("store.export_csv", csv)?;
        }

        if let Some(namespace) = &self.import.namespace {
            validation::validate_non_empty_string("import.namespace", namespace)?;
        }

        if let Some(level) = self.log_level() {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level) {
                return Err(ImportError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.to_string(),
                    reason: format!("Unsupported level. Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        Ok(())
    }
}
