use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub refresh_ttl_days: i64,
}

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub platform: String,
    pub polka_key: String,
    pub filepath_root: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub hash: HashConfig,
}

/// Upper bound on the refresh-token horizon, about ten years.
const MAX_REFRESH_TTL_DAYS: i64 = 3650;

fn parse_key<T, F>(lookup: &F, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .with_context(|| format!("{key} has an invalid value: {v:?}"))
        })
        .transpose()
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} is not set"));

        let database_url = lookup("DATABASE_URL")
            .or_else(|| lookup("DB_URL"))
            .context("DATABASE_URL is not set")?;

        let defaults = HashConfig::default();
        let hash = HashConfig {
            memory_kib: parse_key(&lookup, "PASSWORD_HASH_MEMORY_KIB")?
                .unwrap_or(defaults.memory_kib),
            iterations: parse_key(&lookup, "PASSWORD_HASH_ITERATIONS")?
                .unwrap_or(defaults.iterations),
            parallelism: parse_key(&lookup, "PASSWORD_HASH_PARALLELISM")?
                .unwrap_or(defaults.parallelism),
        };

        let refresh_ttl_days: i64 =
            parse_key(&lookup, "REFRESH_TOKEN_TTL_DAYS")?.unwrap_or(60);
        if !(1..=MAX_REFRESH_TTL_DAYS).contains(&refresh_ttl_days) {
            anyhow::bail!(
                "REFRESH_TOKEN_TTL_DAYS must be between 1 and {MAX_REFRESH_TTL_DAYS}, got {refresh_ttl_days}"
            );
        }

        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            refresh_ttl_days,
        };

        Ok(Self {
            database_url,
            platform: lookup("PLATFORM").unwrap_or_else(|| "prod".into()),
            polka_key: required("POLKA_KEY")?,
            filepath_root: lookup("FILEPATH_ROOT").unwrap_or_else(|| ".".into()),
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_key(&lookup, "APP_PORT")?.unwrap_or(8080),
            jwt,
            hash,
        })
    }

    pub fn is_dev(&self) -> bool {
        self.platform == "dev"
    }
}
