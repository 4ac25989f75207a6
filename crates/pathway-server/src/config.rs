use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub admin_key: Option<String>,
    pub cors_origin: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("PATHWAY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("PATHWAY_PORT")
            .unwrap_or_else(|| "5174".into())
            .parse()
            .context("PATHWAY_PORT must be a port number")?;
        let db_path: PathBuf = lookup("PATHWAY_DB_PATH")
            .unwrap_or_else(|| "data/pathfinder.sqlite".into())
            .into();
        let admin_key = lookup("PATHWAY_ADMIN_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let cors_origin = lookup("PATHWAY_CORS_ORIGIN").unwrap_or_else(|| "*".into());

        Ok(Self {
            host,
            port,
            db_path,
            admin_key,
            cors_origin,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }
}
