// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::storage::OutputFormat;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Target site addressing
    #[serde(default)]
    pub site: SiteConfig,

    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Output location and format
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.site.domain.trim().is_empty() {
            return Err(AppError::validation("site.domain is empty"));
        }
        if !self.site.search_path.starts_with('/') {
            return Err(AppError::validation("site.search_path must start with /"));
        }
        url::Url::parse(&self.site.search_url())?;
        if self.crawler.user_agents.is_empty() {
            return Err(AppError::validation("crawler.user_agents is empty"));
        }
        if self.crawler.user_agents.iter().any(|ua| ua.trim().is_empty()) {
            return Err(AppError::validation(
                "crawler.user_agents contains an empty entry",
            ));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.output.dir.trim().is_empty() {
            return Err(AppError::validation("output.dir is empty"));
        }
        Ok(())
    }
}

/// Target site addressing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Hostname of the exam archive
    #[serde(default = "defaults::domain")]
    pub domain: String,

    /// Path of the exam search form page
    #[serde(default = "defaults::search_path")]
    pub search_path: String,
}

impl SiteConfig {
    /// Full URL of the exam search page.
    pub fn search_url(&self) -> String {
        format!("https://{}{}", self.domain, self.search_path)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: defaults::domain(),
            search_path: defaults::search_path(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent headers, rotated across requests
    #[serde(default = "defaults::user_agents")]
    pub user_agents: Vec<String>,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agents: defaults::user_agents(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Output location and format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for the default output file
    #[serde(default = "defaults::output_dir")]
    pub dir: String,

    /// Serialization format
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
            format: OutputFormat::default(),
        }
    }
}

mod defaults {
    pub fn domain() -> String {
        "acty.mta.ac.il".to_string()
    }

    pub fn search_path() -> String {
        "/library/pages/examssearch.aspx/".to_string()
    }

    pub fn user_agents() -> Vec<String> {
        vec!["Mozilla/5.0 (compatible; exam-crawler/0.1)".to_string()]
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn request_delay() -> u64 {
        100
    }

    pub fn max_concurrent() -> usize {
        8
    }

    pub fn output_dir() -> String {
        "output".to_string()
    }
}
