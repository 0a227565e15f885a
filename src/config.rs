use serde::Deserialize;
use std::str::FromStr;

const DEFAULT_GENDERIZE_URL: &str = "https://api.genderize.io";
const DEFAULT_NATIONALIZE_URL: &str = "https://api.nationalize.io";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub port: u16,
    pub genderize_url: String,
    pub nationalize_url: String,
    pub enrichment_enabled: bool,
    pub enrichment_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: database_url_from_env()?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 10)?,
            run_migrations: parse_var("RUN_MIGRATIONS", true)?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            genderize_url: http_url_var("GENDERIZE_URL", DEFAULT_GENDERIZE_URL)?,
            nationalize_url: http_url_var("NATIONALIZE_URL", DEFAULT_NATIONALIZE_URL)?,
            enrichment_enabled: parse_var("ENRICHMENT_ENABLED", true)?,
            enrichment_timeout_secs: parse_var("ENRICHMENT_TIMEOUT_SECS", 5)?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Genderize URL: {}", config.genderize_url);
        tracing::debug!("Nationalize URL: {}", config.nationalize_url);
        tracing::debug!(
            "Enrichment enabled: {} (timeout {}s)",
            config.enrichment_enabled,
            config.enrichment_timeout_secs
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// Reads `DATABASE_URL` (or `DB_URL`), falling back to the discrete
/// `DB_HOST`/`DB_PORT`/`DB_USER`/`DB_PASSWORD`/`DB_NAME` variables.
fn database_url_from_env() -> anyhow::Result<String> {
    if let Ok(url) = std::env::var("DATABASE_URL").or_else(|_| std::env::var("DB_URL")) {
        if url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL cannot be empty");
        }
        if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
            anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
        }
        return Ok(url);
    }

    let required = |key: &str| {
        std::env::var(key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{} environment variable required when DATABASE_URL is not set",
                    key
                )
            })
    };

    let host = required("DB_HOST")?;
    let user = required("DB_USER")?;
    let name = required("DB_NAME")?;
    let password = std::env::var("DB_PASSWORD").unwrap_or_default();
    let port: u16 = parse_var("DB_PORT", 5432)?;

    build_database_url(&host, port, &user, &password, &name)
}

/// Assembles a Postgres URL, percent-encoding credentials.
pub fn build_database_url(
    host: &str,
    port: u16,
    user: &str,
    password: &str,
    name: &str,
) -> anyhow::Result<String> {
    let mut url = url::Url::parse(&format!("postgres://{}:{}/{}", host, port, name))
        .map_err(|e| anyhow::anyhow!("Invalid database host or name: {}", e))?;
    url.set_username(user)
        .map_err(|_| anyhow::anyhow!("Invalid database user"))?;
    if !password.is_empty() {
        url.set_password(Some(password))
            .map_err(|_| anyhow::anyhow!("Invalid database password"))?;
    }
    Ok(url.to_string())
}

fn http_url_var(key: &str, default: &str) -> anyhow::Result<String> {
    let url = std::env::var(key).unwrap_or_else(|_| default.to_string());
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", key);
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, raw)),
        _ => Ok(default),
    }
}
