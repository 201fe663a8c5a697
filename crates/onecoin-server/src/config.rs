use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub token_ttl_hours: i64,
    pub cors_origin: String,
    pub admin_emails: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = lookup("ONECOIN_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("ONECOIN_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let port = lookup("ONECOIN_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("ONECOIN_PORT must be a port number")?;

        let token_ttl_hours = lookup("ONECOIN_TOKEN_TTL_HOURS")
            .unwrap_or_else(|| "24".into())
            .parse()
            .context("ONECOIN_TOKEN_TTL_HOURS must be a whole number of hours")?;
        if token_ttl_hours <= 0 {
            bail!("ONECOIN_TOKEN_TTL_HOURS must be positive");
        }

        let admin_emails = lookup("ONECOIN_ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(|e| e.trim().to_ascii_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            jwt_secret,
            db_path: lookup("ONECOIN_DB_PATH")
                .unwrap_or_else(|| "onecoin.db".into())
                .into(),
            host: lookup("ONECOIN_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            token_ttl_hours,
            cors_origin: lookup("ONECOIN_CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:4200".into()),
            admin_emails,
        })
    }
}
