//! Service settings from the process environment (optionally seeded from `.env` by the binary).

use crate::error::ConfigError;
use crate::repository::{FulfillmentPolicy, ItemStockPolicy};
use sqlx::postgres::PgConnectOptions;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_PROJECT: &str = "storefront";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILENAME: &str = "logs.log";
const DEFAULT_LOG_RETENTION: usize = 3;
const DEFAULT_POSTGRES_PORT: u16 = 5432;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct Settings {
    pub project: String,
    pub bind_addr: String,
    pub log: LogSettings,
    pub database: DatabaseSettings,
    pub fulfillment: FulfillmentPolicy,
}

/// Where and how much to log. Stdout always gets the same events as the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    pub dir: PathBuf,
    /// File name prefix; the rotation date is appended.
    pub filename: String,
    /// Rotated daily files kept before the oldest is removed.
    pub retention: usize,
}

#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    pub options: PgConnectOptions,
    pub max_connections: u32,
}

impl Settings {
    /// Read settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the raw value for a variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let options = match get("DATABASE_URL") {
            Some(url) => PgConnectOptions::from_str(&url).map_err(|e| ConfigError::Invalid {
                key: "DATABASE_URL",
                message: e.to_string(),
            })?,
            None => {
                let port = match get("POSTGRES_PORT") {
                    Some(p) => p.parse::<u16>().map_err(|e| ConfigError::Invalid {
                        key: "POSTGRES_PORT",
                        message: e.to_string(),
                    })?,
                    None => DEFAULT_POSTGRES_PORT,
                };
                PgConnectOptions::new()
                    .username(&get("POSTGRES_USER").ok_or(ConfigError::Missing("POSTGRES_USER"))?)
                    .password(&get("POSTGRES_PASSWORD").ok_or(ConfigError::Missing("POSTGRES_PASSWORD"))?)
                    .host(&get("POSTGRES_HOST").ok_or(ConfigError::Missing("POSTGRES_HOST"))?)
                    .port(port)
                    .database(&get("POSTGRES_DB").ok_or(ConfigError::Missing("POSTGRES_DB"))?)
            }
        };

        let max_connections = positive("DATABASE_MAX_CONNECTIONS", get("DATABASE_MAX_CONNECTIONS"))?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let log = LogSettings {
            level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.into()),
            dir: get("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.into()).into(),
            filename: get("LOG_FILENAME").unwrap_or_else(|| DEFAULT_LOG_FILENAME.into()),
            retention: positive("LOG_RETENTION", get("LOG_RETENTION"))?.unwrap_or(DEFAULT_LOG_RETENTION),
        };

        let mut fulfillment = FulfillmentPolicy::default();
        if let Some(v) = get("ORDER_ITEM_STOCK_POLICY") {
            fulfillment.item_updates = v.parse::<ItemStockPolicy>().map_err(|e| ConfigError::Invalid {
                key: "ORDER_ITEM_STOCK_POLICY",
                message: e.to_string(),
            })?;
        }
        if let Some(v) = get("ORDER_LOCK_STOCK_ROWS") {
            fulfillment.lock_stock_rows = parse_bool(&v).ok_or_else(|| ConfigError::Invalid {
                key: "ORDER_LOCK_STOCK_ROWS",
                message: format!("expected true or false, got '{}'", v),
            })?;
        }

        Ok(Settings {
            project: get("PROJECT_NAME").unwrap_or_else(|| DEFAULT_PROJECT.into()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            log,
            database: DatabaseSettings {
                options,
                max_connections,
            },
            fulfillment,
        })
    }
}

fn positive<N>(key: &'static str, raw: Option<String>) -> Result<Option<N>, ConfigError>
where
    N: FromStr + PartialOrd + Default,
{
    match raw {
        None => Ok(None),
        Some(raw) => match raw.parse::<N>() {
            Ok(n) if n > N::default() => Ok(Some(n)),
            _ => Err(ConfigError::Invalid {
                key,
                message: format!("expected a positive integer, got '{}'", raw),
            }),
        },
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn builds_dsn_from_parts() {
        let settings = Settings::from_lookup(lookup(&[
            ("POSTGRES_HOST", "db"),
            ("POSTGRES_PORT", "6543"),
            ("POSTGRES_DB", "shop"),
            ("POSTGRES_USER", "app"),
            ("POSTGRES_PASSWORD", "secret"),
        ]))
        .unwrap();
        let options = &settings.database.options;
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "app");
        assert_eq!(options.get_database(), Some("shop"));
        assert_eq!(settings.database.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(settings.project, "storefront");
        assert_eq!(settings.bind_addr, DEFAULT_BIND_ADDR);
    }

    #[test]
    fn database_url_wins_over_parts() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/other"),
            ("POSTGRES_HOST", "ignored"),
        ]))
        .unwrap();
        assert_eq!(settings.database.options.get_host(), "localhost");
        assert_eq!(settings.database.options.get_database(), Some("other"));
    }

    #[test]
    fn credentials_are_not_url_encoded_by_hand() {
        let settings = Settings::from_lookup(lookup(&[
            ("POSTGRES_HOST", "db"),
            ("POSTGRES_DB", "shop"),
            ("POSTGRES_USER", "app@corp"),
            ("POSTGRES_PASSWORD", "p@ss:w/rd"),
        ]))
        .unwrap();
        let options = &settings.database.options;
        assert_eq!(options.get_username(), "app@corp");
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), DEFAULT_POSTGRES_PORT);
        assert_eq!(options.get_database(), Some("shop"));
    }

    #[test]
    fn unparseable_database_url_is_invalid() {
        let err = Settings::from_lookup(lookup(&[("DATABASE_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DATABASE_URL", .. }));
    }

    #[test]
    fn missing_part_is_reported() {
        let err = Settings::from_lookup(lookup(&[("POSTGRES_HOST", "db")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("POSTGRES_USER")));
    }

    #[test]
    fn bad_port_is_invalid() {
        let err = Settings::from_lookup(lookup(&[
            ("POSTGRES_HOST", "db"),
            ("POSTGRES_PORT", "port"),
            ("POSTGRES_DB", "shop"),
            ("POSTGRES_USER", "app"),
            ("POSTGRES_PASSWORD", "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "POSTGRES_PORT", .. }));
    }

    #[test]
    fn fulfillment_policy_from_env() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("ORDER_ITEM_STOCK_POLICY", "reserve"),
            ("ORDER_LOCK_STOCK_ROWS", "false"),
        ]))
        .unwrap();
        assert_eq!(settings.fulfillment.item_updates, ItemStockPolicy::Reserve);
        assert!(!settings.fulfillment.lock_stock_rows);

        let defaults = Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/shop")])).unwrap();
        assert_eq!(defaults.fulfillment, FulfillmentPolicy::default());

        let err = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("ORDER_ITEM_STOCK_POLICY", "sometimes"),
        ]))
        .unwrap_err();
        match err {
            ConfigError::Invalid { key, message } => {
                assert_eq!(key, "ORDER_ITEM_STOCK_POLICY");
                assert!(message.contains("'sometimes'"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn log_settings_default_and_override() {
        let defaults = Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/shop")])).unwrap();
        assert_eq!(
            defaults.log,
            LogSettings {
                level: "info".into(),
                dir: PathBuf::from("logs"),
                filename: "logs.log".into(),
                retention: 3,
            }
        );

        let custom = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("LOG_LEVEL", "debug"),
            ("LOG_DIR", "/var/log/storefront"),
            ("LOG_FILENAME", "api.log"),
            ("LOG_RETENTION", "7"),
        ]))
        .unwrap();
        assert_eq!(custom.log.level, "debug");
        assert_eq!(custom.log.dir, PathBuf::from("/var/log/storefront"));
        assert_eq!(custom.log.filename, "api.log");
        assert_eq!(custom.log.retention, 7);

        let err = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("LOG_RETENTION", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "LOG_RETENTION", .. }));
    }

    #[test]
    fn zero_connections_rejected() {
        let err = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DATABASE_MAX_CONNECTIONS", .. }));
    }
}
