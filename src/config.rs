use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

// 10 MB in bytes
const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_SESSION_CAPACITY: u64 = 64;
const DEFAULT_SESSION_IDLE_SECS: u64 = 1800;
const DEFAULT_PREVIEW_ROWS: usize = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_file_size: usize,
    pub session_capacity: u64,
    pub session_idle: Duration,
    pub report_font_path: Option<PathBuf>,
    pub preview_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            session_capacity: DEFAULT_SESSION_CAPACITY,
            session_idle: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            report_font_path: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", name, value)),
        None => Ok(default),
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_or(
            "BIND_ADDR",
            lookup("BIND_ADDR"),
            SocketAddr::from_str(DEFAULT_BIND_ADDR)?,
        )?;
        let session_idle_secs = parse_or("SESSION_IDLE_SECS", lookup("SESSION_IDLE_SECS"), DEFAULT_SESSION_IDLE_SECS)?;

        Ok(Config {
            bind_addr,
            max_file_size: parse_or("MAX_FILE_SIZE", lookup("MAX_FILE_SIZE"), DEFAULT_MAX_FILE_SIZE)?,
            session_capacity: parse_or("SESSION_CAPACITY", lookup("SESSION_CAPACITY"), DEFAULT_SESSION_CAPACITY)?,
            session_idle: Duration::from_secs(session_idle_secs),
            report_font_path: lookup("REPORT_FONT_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            preview_rows: parse_or("PREVIEW_ROWS", lookup("PREVIEW_ROWS"), DEFAULT_PREVIEW_ROWS)?,
        })
    }

    /// Reads the configured report font, if any.
    pub fn load_report_font(&self) -> Result<Option<Vec<u8>>> {
        self.report_font_path
            .as_ref()
            .map(|path| {
                std::fs::read(path).with_context(|| format!("Failed to read REPORT_FONT_PATH {}", path.display()))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.session_capacity, 64);
        assert_eq!(config.session_idle, Duration::from_secs(1800));
        assert_eq!(config.preview_rows, 20);
        assert!(config.report_font_path.is_none());
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let config = Config::from_lookup(lookup(&[
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("MAX_FILE_SIZE", "1024"),
            ("REPORT_FONT_PATH", "/fonts/NotoSansCJK.ttf"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.report_font_path, Some(PathBuf::from("/fonts/NotoSansCJK.ttf")));
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = Config::from_lookup(lookup(&[("SESSION_CAPACITY", "many")])).unwrap_err();
        assert!(err.to_string().contains("SESSION_CAPACITY"));
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let config = Config {
            report_font_path: Some(PathBuf::from("/nonexistent/font.ttf")),
            ..Config::default()
        };
        assert!(config.load_report_font().is_err());
        assert!(Config::default().load_report_font().unwrap().is_none());
    }
}
