use std::{collections::BTreeMap, net::SocketAddr};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "site.toml";

#[derive(Deserialize, Clone)]
pub struct Config {
    pub server: Option<ServerConfig>,
    pub store: StoreConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

impl Config {
    /// Layers `SITE_`-prefixed environment variables over the TOML file,
    /// with `__` separating nested keys (`SITE_STORE__WRITE_TOKEN`).
    pub fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("SITE_").split("__"))
    }

    pub fn load(path: &str) -> figment::Result<Self> {
        Self::figment(path).extract()
    }
}

#[derive(Deserialize, Clone)]
pub struct ServerConfig {
    pub site_name: String,
    pub owner: String,
    pub description: String,
    #[serde(default)]
    pub footer_links: BTreeMap<String, String>,
    pub addr: SocketAddr,
    pub domain: Option<String>,
}

#[derive(Deserialize, Clone)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    Sanity(SanityConfig),
    Sqlite {
        url: String,
    },
    Memory {
        #[serde(default)]
        write_token: Option<String>,
    },
}

#[derive(Deserialize, Clone)]
pub struct SanityConfig {
    pub project_id: String,
    pub dataset: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Overrides `https://<project_id>.api.sanity.io`.
    pub api_host: Option<String>,
    pub read_token: Option<String>,
    pub write_token: Option<String>,
}

fn default_api_version() -> String {
    "2024-01-01".to_string()
}

#[derive(Deserialize, Clone)]
pub struct MailConfig {
    #[serde(default = "default_mail_api")]
    pub api_url: String,
    /// Without a key, contact messages are only logged.
    pub api_key: Option<String>,
    #[serde(default = "default_mail_from")]
    pub from: String,
    #[serde(default = "default_mail_to")]
    pub to: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: default_mail_api(),
            api_key: None,
            from: default_mail_from(),
            to: default_mail_to(),
        }
    }
}

fn default_mail_api() -> String {
    "https://api.resend.com".to_string()
}

fn default_mail_from() -> String {
    "Contact Form <noreply@localhost>".to_string()
}

fn default_mail_to() -> String {
    "owner@localhost".to_string()
}
