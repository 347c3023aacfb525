use std::{
    env,
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{errors::Error, Result};

/// Where the chat document lives when deployed as a cloud function.
const SERVERLESS_CHATS_PATH: &str = "serverless_function_source_code/config.json";
const DEFAULT_CHATS_PATH: &str = "config.json";
const DEFAULT_PORT: u16 = 8080;

/// How updates reach the bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Polling,
    Webhook,
}

impl FromStr for Transport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "polling" | "poll" => Ok(Self::Polling),
            "webhook" => Ok(Self::Webhook),
            other => Err(Error::Config(format!(
                "RETG_TRANSPORT must be 'polling' or 'webhook', got '{other}'"
            ))),
        }
    }
}

/// Process settings, read from the environment once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    /// Handle without `@`; resolved via `getMe` when unset.
    pub bot_username: Option<String>,
    pub chats_path: PathBuf,
    pub transport: Transport,
    pub webhook_token: String,
    pub listen_addr: SocketAddr,
    pub debug: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_vars(env_str)
    }

    /// Build the config from `var`, which looks up one variable by name.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty_var = |key: &str| var(key).and_then(non_empty);

        let bot_token = non_empty_var("BOT_TOKEN").ok_or_else(|| {
            Error::Config("BOT_TOKEN environment variable is required".to_string())
        })?;
        let bot_username =
            non_empty_var("BOT_USERNAME").map(|u| u.trim_start_matches('@').to_string());

        let chats_path = non_empty_var("RETG_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(default_chats_path);

        let transport = match non_empty_var("RETG_TRANSPORT") {
            Some(v) => v.parse()?,
            None => Transport::Polling,
        };

        let webhook_token = var("WEBHOOK_TOKEN").unwrap_or_default();
        if transport == Transport::Webhook && webhook_token.trim().is_empty() {
            return Err(Error::Config(
                "WEBHOOK_TOKEN is required with RETG_TRANSPORT=webhook".to_string(),
            ));
        }

        let listen_addr = match non_empty_var("RETG_LISTEN_ADDR") {
            Some(v) => v.trim().parse::<SocketAddr>().map_err(|e| {
                Error::Config(format!("RETG_LISTEN_ADDR '{v}' is not a socket address: {e}"))
            })?,
            None => {
                let port = var("PORT")
                    .and_then(|s| s.trim().parse::<u16>().ok())
                    .unwrap_or(DEFAULT_PORT);
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let debug = var("RETG_DEBUG").is_some_and(|s| parse_bool(&s));

        Ok(Self {
            bot_token,
            bot_username,
            chats_path,
            transport,
            webhook_token,
            listen_addr,
            debug,
        })
    }
}

/// `RETG_CONFIG`, else the serverless bundle path if present, else `config.json`.
pub fn chats_path_from_env() -> PathBuf {
    env_path("RETG_CONFIG").unwrap_or_else(default_chats_path)
}

fn default_chats_path() -> PathBuf {
    let serverless = PathBuf::from(SERVERLESS_CHATS_PATH);
    if serverless.exists() {
        serverless
    } else {
        PathBuf::from(DEFAULT_CHATS_PATH)
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
