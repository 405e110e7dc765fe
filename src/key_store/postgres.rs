//! Postgres-backed key registration for the local registry server.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use super::{ApiKeyStore, KeyStoreError};
use crate::config::schema::PsqlConfig;

/// Super-user permission row understood by the registry server.
const REGISTER_KEY: &str = r#"
INSERT INTO iglu_permissions (apikey, vendor, wildcard, schema_action, key_action)
VALUES ($1::uuid, '', TRUE, 'CREATE_VENDOR'::schema_action, '{"CREATE","DELETE"}'::key_action[])
ON CONFLICT (apikey) DO NOTHING
"#;

pub struct PgApiKeyStore {
    pool: PgPool,
}

impl PgApiKeyStore {
    /// Build the store. The pool connects on first use, so startup does not
    /// depend on the datastore being up.
    pub fn new(config: &PsqlConfig) -> Result<Self, KeyStoreError> {
        let (host, port) = config
            .host_port()
            .ok_or_else(|| KeyStoreError::InvalidAddress(config.addr.clone()))?;

        let options = PgConnectOptions::new()
            .host(host)
            .port(port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        Ok(Self { pool })
    }
}

#[async_trait]
impl ApiKeyStore for PgApiKeyStore {
    async fn register(&self, api_key: &str) -> Result<(), KeyStoreError> {
        let result = sqlx::query(REGISTER_KEY)
            .bind(api_key)
            .execute(&self.pool)
            .await?;
        tracing::info!(inserted = result.rows_affected(), "Registry API key registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_is_rejected() {
        let config = PsqlConfig {
            addr: "db:port".to_string(),
            ..PsqlConfig::default()
        };
        assert!(matches!(
            PgApiKeyStore::new(&config),
            Err(KeyStoreError::InvalidAddress(addr)) if addr == "db:port"
        ));
    }

    #[tokio::test]
    async fn test_unreachable_datastore_is_database_error() {
        let config = PsqlConfig {
            addr: "127.0.0.1:1".to_string(),
            acquire_timeout_secs: 1,
            ..PsqlConfig::default()
        };
        let store = PgApiKeyStore::new(&config).unwrap();

        let err = store
            .register("123e4567-e89b-12d3-a456-426614174000")
            .await
            .unwrap_err();
        assert!(matches!(err, KeyStoreError::Database(_)));
    }
}
