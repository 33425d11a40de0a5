use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub news_api: NewsApiConfig,
    #[serde(default)]
    pub refiner: RefinerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewsApiConfig {
    #[serde(default = "default_news_base_url")]
    pub base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Revalidation window in minutes; 0 disables response reuse
    #[serde(default = "default_revalidate_minutes")]
    pub revalidate_minutes: u64,
    #[serde(default = "default_news_timeout")]
    pub timeout_secs: u64,
    /// Name of the environment variable holding the provider credential
    #[serde(default = "default_news_api_key_env")]
    pub api_key_env: String,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_news_base_url(),
            language: default_language(),
            page_size: default_page_size(),
            revalidate_minutes: default_revalidate_minutes(),
            timeout_secs: default_news_timeout(),
            api_key_env: default_news_api_key_env(),
        }
    }
}

impl NewsApiConfig {
    pub fn api_key(&self) -> Option<String> {
        read_key(&self.api_key_env)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefinerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_model_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_model_base_url(),
            model: default_model(),
            api_key_env: default_model_api_key_env(),
            timeout_secs: default_model_timeout(),
        }
    }
}

impl RefinerConfig {
    pub fn api_key(&self) -> Option<String> {
        read_key(&self.api_key_env)
    }
}

fn read_key(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_news_base_url() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_page_size() -> u32 {
    40
}

fn default_revalidate_minutes() -> u64 {
    15
}

fn default_news_timeout() -> u64 {
    30
}

fn default_news_api_key_env() -> String {
    "NEWS_API_KEY".to_string()
}

fn default_true() -> bool {
    true
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_model_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_model_timeout() -> u64 {
    10
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}
