use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::path::Path;
use teloxide::types::{ChatId, Recipient};

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Staff chat that receives order notifications and prompts
    pub chat_id: Recipient,
    /// Base URL of the order-fulfillment mini app
    pub web_app_url: Url,
    pub api_url: Url,
    /// Route calls through the Bot API test environment (`/bot<token>/test/<method>`)
    pub test_environment: bool,
}

impl TelegramConfig {
    /// Base for every Bot API method URL. Never log this: it embeds the token.
    pub fn method_base(&self) -> String {
        let api = self.api_url.as_str().trim_end_matches('/');
        if self.test_environment {
            format!("{}/bot{}/test", api, self.bot_token)
        } else {
            format!("{}/bot{}", api, self.bot_token)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Raw file layout (loose — every field optional so env vars can fill gaps) ──

#[derive(Debug, Deserialize, Default)]
pub struct RawConfig {
    #[serde(default)]
    telegram: RawTelegram,
    #[serde(default)]
    server: RawServer,
}

#[derive(Debug, Deserialize, Default)]
struct RawTelegram {
    bot_token: Option<String>,
    chat_id: Option<toml::Value>,
    web_app_url: Option<String>,
    api_url: Option<String>,
    test_environment: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct RawServer {
    host: Option<String>,
    port: Option<u16>,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Numeric strings become chat ids, anything else is treated as a `@channel` username.
pub fn parse_recipient(raw: &str) -> Option<Recipient> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) => Some(Recipient::Id(ChatId(id))),
        Err(_) => Some(Recipient::ChannelUsername(raw.to_string())),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("Invalid boolean value: {}", other),
    }
}

impl RawConfig {
    /// Read the TOML file if it exists; a missing file yields an empty layer.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl Config {
    /// Load `.env`, the optional TOML file, and the process environment.
    pub fn load(path: &Path) -> Result<Self> {
        dotenv::dotenv().ok();
        let raw = RawConfig::from_file(path)?;
        Self::resolve(raw, |key| std::env::var(key).ok())
    }

    /// Merge the file layer with environment lookups; environment wins.
    pub fn resolve<F>(raw: RawConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let RawConfig { telegram, server } = raw;

        let bot_token = non_empty(env("BOT_TOKEN"))
            .or(non_empty(telegram.bot_token))
            .context("BOT_TOKEN is not set (env or [telegram] bot_token)")?;

        let chat_id = match non_empty(env("CHAT_ID")) {
            Some(raw) => parse_recipient(&raw),
            None => match telegram.chat_id {
                Some(toml::Value::Integer(id)) => Some(Recipient::Id(ChatId(id))),
                Some(toml::Value::String(s)) => parse_recipient(&s),
                Some(other) => anyhow::bail!("[telegram] chat_id has unsupported type: {}", other),
                None => None,
            },
        }
        .context("CHAT_ID is not set (env or [telegram] chat_id)")?;

        let web_app_url = non_empty(env("WEB_APP_URL"))
            .or(non_empty(telegram.web_app_url))
            .context("WEB_APP_URL is not set (env or [telegram] web_app_url)")?;
        let web_app_url = Url::parse(&web_app_url)
            .with_context(|| format!("WEB_APP_URL is not a valid URL: {}", web_app_url))?;

        let api_url = non_empty(env("TELEGRAM_API_URL"))
            .or(non_empty(telegram.api_url))
            .unwrap_or_else(default_api_url);
        let api_url = Url::parse(&api_url)
            .with_context(|| format!("Telegram API URL is not valid: {}", api_url))?;

        let test_environment = match non_empty(env("TELEGRAM_TEST_ENV")) {
            Some(raw) => parse_flag(&raw).context("TELEGRAM_TEST_ENV")?,
            None => telegram.test_environment.unwrap_or(true),
        };

        let host = non_empty(env("HOST"))
            .or(non_empty(server.host))
            .unwrap_or_else(default_host);

        let port = match non_empty(env("PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port number: {}", raw))?,
            None => server.port.unwrap_or_else(default_port),
        };

        Ok(Config {
            telegram: TelegramConfig {
                bot_token,
                chat_id,
                web_app_url,
                api_url,
                test_environment,
            },
            server: ServerConfig { host, port },
        })
    }
}
