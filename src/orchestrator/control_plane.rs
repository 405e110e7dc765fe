//! Per-operation orchestration: validate, mutate one artifact, restart one
//! service.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::forms::{required, CredentialsForm, DomainNameForm, ExternalRegistryForm, LocalApiKeyForm};
use crate::config::ManagedConfig;
use crate::error::{ControlPlaneError, Result};
use crate::key_store::ApiKeyStore;
use crate::observability::metrics;
use crate::proxy_config;
use crate::resolver::{self, RegistryEntry};
use crate::services::{RestartDispatcher, ServiceManager, ServiceName};
use crate::storage::{write_atomic, FileLocks};
use crate::validator::{self, UrlProbe, ValidationError};

/// The orchestration engine. Cheap to clone; all clones share locks.
#[derive(Clone)]
pub struct ControlPlane {
    inner: Arc<Inner>,
}

struct Inner {
    config: Arc<ManagedConfig>,
    probe: Arc<dyn UrlProbe>,
    keys: Arc<dyn ApiKeyStore>,
    restarts: RestartDispatcher,
    locks: FileLocks,
}

impl ControlPlane {
    pub fn new(
        config: Arc<ManagedConfig>,
        probe: Arc<dyn UrlProbe>,
        keys: Arc<dyn ApiKeyStore>,
        services: Arc<dyn ServiceManager>,
    ) -> Self {
        let restarts = RestartDispatcher::new(services, &config.services);
        Self {
            inner: Arc::new(Inner {
                config,
                probe,
                keys,
                restarts,
                locks: FileLocks::new(),
            }),
        }
    }

    pub fn config(&self) -> &ManagedConfig {
        &self.inner.config
    }

    /// Run `op` and record its outcome.
    async fn observed<T, F>(&self, operation: &'static str, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let result = op.await;
        match &result {
            Ok(_) => metrics::record_operation(operation, "ok", start),
            Err(e) => {
                if e.is_restart_failure() {
                    tracing::error!(operation, error = %e, "Configuration committed but service restart failed");
                } else {
                    tracing::warn!(operation, error = %e, "Operation rejected");
                }
                metrics::record_operation(operation, e.kind(), start);
            }
        }
        result
    }

    /// Run one read-modify-write under the file's lock, off the async
    /// workers.
    async fn mutate<F>(&self, path: &Path, edit: F) -> Result<()>
    where
        F: FnOnce(&Path) -> Result<()> + Send + 'static,
    {
        let _guard = self.inner.locks.lock(path).await;
        let owned: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || edit(&owned))
            .await
            .map_err(|e| ControlPlaneError::WriteFailed {
                path: path.to_path_buf(),
                source: io::Error::other(e),
            })?
    }

    /// `PUT /restart-services`
    pub async fn restart_services(&self) -> Result<()> {
        self.observed("restart_services", self.inner.restarts.restart_all())
            .await
    }

    /// `POST /enrichments`
    pub async fn upload_enrichment(&self, filename: &str, contents: &[u8]) -> Result<()> {
        self.observed("upload_enrichment", async {
            validator::check_enrichment_filename(filename)?;
            let text = std::str::from_utf8(contents).map_err(|_| ValidationError::InvalidJson)?;
            if !validator::is_json(text) {
                return Err(ValidationError::InvalidJson.into());
            }

            let path = self.config().enrichment_path(filename);
            let bytes = contents.to_vec();
            self.mutate(&path, move |p| write_atomic(p, &bytes)).await?;
            tracing::info!(path = %path.display(), bytes = contents.len(), "Enrichment stored");

            self.inner
                .restarts
                .restart_service(ServiceName::EnrichmentEngine)
                .await
        })
        .await
    }

    /// `POST /iglu-config`
    ///
    /// The registry server's own configuration is stored as uploaded.
    pub async fn upload_registry_server_config(&self, contents: &[u8]) -> Result<()> {
        self.observed("upload_registry_server_config", async {
            let path = self.config().registry_server_config_path();
            let bytes = contents.to_vec();
            self.mutate(&path, move |p| write_atomic(p, &bytes)).await?;
            tracing::info!(path = %path.display(), bytes = contents.len(), "Registry server configuration stored");

            self.inner
                .restarts
                .restart_service(ServiceName::RegistryServer)
                .await
        })
        .await
    }

    /// `POST /external-iglu`
    pub async fn add_external_registry(&self, form: &ExternalRegistryForm) -> Result<()> {
        self.observed("add_external_registry", async {
            let entry = self.validate_external_registry(form).await?;

            let path = self.config().resolver_path();
            let policy = self.config().resolver.on_duplicate;
            self.mutate(&path, move |p| {
                resolver::add_external_registry(p, &entry, policy).map(|_| ())
            })
            .await?;

            self.inner
                .restarts
                .restart_service(ServiceName::EnrichmentEngine)
                .await
        })
        .await
    }

    /// Cheap checks first; the network probe runs last.
    async fn validate_external_registry(
        &self,
        form: &ExternalRegistryForm,
    ) -> std::result::Result<RegistryEntry, ValidationError> {
        let vendor_prefix = required(&form.vendor_prefix, "vendor_prefix")?;
        let uri = required(&form.uri, "uri")?;
        let name = required(&form.name, "name")?;
        let priority = validator::parse_priority(required(&form.priority, "priority")?)?;

        let api_key = form.apikey.as_deref().filter(|key| !key.is_empty());
        if let Some(key) = api_key {
            if !validator::is_valid_uuid(key) {
                return Err(ValidationError::InvalidUuid);
            }
        }

        let local = &self.config().resolver.local_registry_uri;
        if uri.trim_end_matches('/') == local.trim_end_matches('/') {
            return Err(ValidationError::LocalRegistryUri(uri.to_string()));
        }

        if !self.inner.probe.is_reachable(uri).await {
            return Err(ValidationError::UnreachableUrl);
        }

        Ok(RegistryEntry {
            vendor_prefix: vendor_prefix.to_string(),
            uri: uri.to_string(),
            api_key: api_key.map(str::to_string),
            name: name.to_string(),
            priority,
        })
    }

    /// `POST /local-iglu-apikey`
    ///
    /// The key is registered in the registry datastore before the resolver
    /// refers to it.
    pub async fn set_local_registry_api_key(&self, form: &LocalApiKeyForm) -> Result<()> {
        self.observed("set_local_registry_api_key", async {
            let api_key = required(&form.local_iglu_apikey, "local_iglu_apikey")?;
            if !validator::is_valid_uuid(api_key) {
                return Err(ValidationError::InvalidUuid.into());
            }

            self.inner
                .keys
                .register(api_key)
                .await
                .map_err(|source| ControlPlaneError::KeyRegistrationFailed { source })?;

            let path = self.config().resolver_path();
            let local = self.config().resolver.local_registry_uri.clone();
            let key = api_key.to_string();
            self.mutate(&path, move |p| resolver::set_local_registry_api_key(p, &local, &key))
                .await?;

            self.inner
                .restarts
                .restart_service(ServiceName::EnrichmentEngine)
                .await
        })
        .await
    }

    /// `POST /credentials`
    pub async fn change_credentials(&self, form: &CredentialsForm) -> Result<()> {
        self.observed("change_credentials", async {
            let username = required(&form.new_username, "new_username")?;
            let password = required(&form.new_password, "new_password")?;
            validator::check_credential("new_username", username)?;
            validator::check_credential("new_password", password)?;

            let path = self.config().proxy_config_path();
            let (username, password) = (username.to_string(), password.to_string());
            self.mutate(&path, move |p| proxy_config::change_credentials(p, &username, &password))
                .await?;

            self.inner
                .restarts
                .restart_service(ServiceName::ReverseProxy)
                .await
        })
        .await
    }

    /// `POST /domain-name`
    pub async fn change_domain_name(&self, form: &DomainNameForm) -> Result<()> {
        self.observed("change_domain_name", async {
            let domain = required(&form.domain_name, "domain_name")?;
            validator::check_host_domain_name(domain)?;

            let path = self.config().proxy_config_path();
            let domain = domain.to_string();
            self.mutate(&path, move |p| proxy_config::change_domain_name(p, &domain))
                .await?;

            self.inner
                .restarts
                .restart_service(ServiceName::ReverseProxy)
                .await
        })
        .await
    }

    /// `GET /version`
    pub async fn version(&self) -> Result<String> {
        let path = &self.config().version_file_path;
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ControlPlaneError::ReadFailed {
                path: path.clone(),
                source,
            })
    }
}
