use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    /// When set, document writes require a valid bearer token.
    pub auth_required_for_writes: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let secret = lookup("JWT_SECRET").context("JWT_SECRET is not set")?;

        let ttl_seconds = match lookup("EXPIRES_IN") {
            Some(raw) => parse_expiry(&raw).with_context(|| format!("invalid EXPIRES_IN {raw:?}"))?,
            None => 24 * 60 * 60,
        };

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "reliefhub".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "reliefhub-users".into()),
            ttl_seconds,
        };

        let port = lookup("PORT")
            .or_else(|| lookup("APP_PORT"))
            .map(|v| v.parse::<u16>().with_context(|| format!("invalid port {v:?}")))
            .transpose()?
            .unwrap_or(5000);

        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .map(|v| {
                v.parse::<u32>()
                    .with_context(|| format!("invalid DB_MAX_CONNECTIONS {v:?}"))
            })
            .transpose()?
            .unwrap_or(10);

        Ok(Self {
            database_url,
            max_connections,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt,
            auth_required_for_writes: lookup("AUTH_REQUIRED_FOR_WRITES")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

/// Parses token lifetimes such as `3600`, `45s`, `30m`, `12h` or `7d` into seconds.
pub fn parse_expiry(raw: &str) -> anyhow::Result<i64> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    if digits.is_empty() {
        bail!("missing amount");
    }
    let amount: i64 = digits.parse()?;
    let scale = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => bail!("unknown unit {other:?}"),
    };
    if amount == 0 {
        bail!("expiry must be positive");
    }
    amount
        .checked_mul(scale)
        .context("expiry overflows")
}
