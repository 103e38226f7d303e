use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Attributes of the session cookie carrying the access token.
#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub domain: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeedConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub allowed_origins: Vec<String>,
    pub admin: Option<AdminSeedConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "userdesk".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "userdesk-users".into()),
            ttl_minutes: lookup("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(60),
        };

        let domain = lookup("COOKIE_DOMAIN").filter(|v| !v.trim().is_empty());
        if domain.is_none() {
            warn!("COOKIE_DOMAIN is not set in the configuration");
        }
        let cookie = CookieConfig {
            name: lookup("COOKIE_NAME").unwrap_or_else(|| "access_token_cookie".into()),
            secure: flag(lookup("COOKIE_SECURE"), false),
            http_only: flag(lookup("COOKIE_HTTP_ONLY"), true),
            domain,
            path: lookup("COOKIE_PATH").unwrap_or_else(|| "/".into()),
        };

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(|| vec!["http://localhost:3000".into()]);

        let admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeedConfig { email, password }),
            _ => {
                warn!("ADMIN_EMAIL or ADMIN_PASSWORD is not set in the configuration");
                None
            }
        };

        Ok(Self {
            database_url,
            jwt,
            cookie,
            allowed_origins,
            admin,
        })
    }
}

/// Database URL only, for the CLI commands that never touch JWT or cookies.
pub fn database_url_from_env() -> anyhow::Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL is not set")
}

fn flag(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == "true" || v == "1" || v == "yes" => true,
        Some(v) if v == "false" || v == "0" || v == "no" => false,
        _ => default,
    }
}
