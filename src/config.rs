//! Runtime configuration, read from the environment with defaults suited to
//! local development.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB: &str = "storefeed.db";
const DEFAULT_CATALOG_URL: &str = "https://api-ecomm.sdvor.com/occ/v2/sd/products/search";
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 6 * 60 * 60;
const DEFAULT_PAGE_SIZE: u32 = 15;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_path: String,
    pub catalog_url: String,
    pub sync_interval: Duration,
    pub page_size: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env_or("STOREFEED_ADDR", DEFAULT_ADDR)
            .parse()
            .context("invalid STOREFEED_ADDR")?;
        let sync_interval_secs: u64 =
            env_or("STOREFEED_SYNC_INTERVAL_SECS", &DEFAULT_SYNC_INTERVAL_SECS.to_string())
                .parse()
                .context("invalid STOREFEED_SYNC_INTERVAL_SECS")?;
        let page_size: u32 = env_or("STOREFEED_PAGE_SIZE", &DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .context("invalid STOREFEED_PAGE_SIZE")?;

        Ok(Self {
            bind_addr,
            database_path: env_or("STOREFEED_DB", DEFAULT_DB),
            catalog_url: env_or("STOREFEED_CATALOG_URL", DEFAULT_CATALOG_URL),
            sync_interval: Duration::from_secs(sync_interval_secs),
            page_size,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
