//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use control_plane::config::ManagedConfig;
use control_plane::key_store::{ApiKeyStore, KeyStoreError};
use control_plane::services::{RestartError, ServiceManager, ServiceName};
use control_plane::validator::UrlProbe;
use control_plane::{ControlPlane, HttpServer, Shutdown};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const LOCAL_REGISTRY_URI: &str = "http://localhost:8081/api";

pub const RESOLVER: &str = r#"{
  "schema": "iglu:com.snowplowanalytics.iglu/resolver-config/jsonschema/1-0-1",
  "data": {
    "cacheSize": 500,
    "repositories": [
      {
        "name": "Iglu Central",
        "priority": 0,
        "vendorPrefixes": ["com.snowplowanalytics"],
        "connection": { "http": { "uri": "http://iglucentral.com" } }
      },
      {
        "name": "Iglu Server",
        "priority": 0,
        "vendorPrefixes": ["com.snowplowanalytics"],
        "connection": { "http": { "uri": "http://localhost:8081/api", "apikey": "PLACEHOLDER" } }
      }
    ]
  }
}
"#;

pub const CADDYFILE: &str = "*:80 {\n  tls off\n  basicauth \"USERNAME_PLACEHOLDER\" PASSWORD_PLACEHOLDER {\n    /home\n    /kibana\n    /control-plane\n  }\n  redir /home /home/\n  proxy / localhost:8080\n}\n";

pub const IGLU_SERVER_CONF: &str = "repo-server {\n  interface = \"0.0.0.0\"\n  port = 8081\n}\n";

pub const VERSION: &str = "0.8.0\n";

/// Records restarts; fails every restart while `failing` is set.
#[derive(Default)]
pub struct RecordingServices {
    calls: Mutex<Vec<ServiceName>>,
    failing: AtomicBool,
}

impl RecordingServices {
    pub fn calls(&self) -> Vec<ServiceName> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ServiceManager for RecordingServices {
    async fn restart(&self, service: ServiceName) -> Result<(), RestartError> {
        self.calls.lock().unwrap().push(service);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RestartError::Other("unit entered failed state".into()));
        }
        Ok(())
    }
}

/// Records registered keys; refuses them while `failing` is set.
#[derive(Default)]
pub struct RecordingKeyStore {
    keys: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl RecordingKeyStore {
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ApiKeyStore for RecordingKeyStore {
    async fn register(&self, api_key: &str) -> Result<(), KeyStoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(KeyStoreError::Other("connection refused".into()));
        }
        self.keys.lock().unwrap().push(api_key.to_string());
        Ok(())
    }
}

/// Answers every probe with a fixed verdict.
pub struct StaticProbe(pub AtomicBool);

impl StaticProbe {
    pub fn new(reachable: bool) -> Self {
        Self(AtomicBool::new(reachable))
    }
}

#[async_trait]
impl UrlProbe for StaticProbe {
    async fn is_reachable(&self, _uri: &str) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A populated appliance layout in a temporary directory.
pub struct Appliance {
    pub dir: TempDir,
    pub config: ManagedConfig,
    pub services: Arc<RecordingServices>,
    pub keys: Arc<RecordingKeyStore>,
    pub probe: Arc<StaticProbe>,
}

impl Appliance {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let enrichments = dir.path().join("enrichments");
        let configs = dir.path().join("configs");
        fs::create_dir_all(&enrichments).unwrap();
        fs::create_dir_all(&configs).unwrap();

        let mut config = ManagedConfig::default();
        config.dirs.enrichments = enrichments;
        config.dirs.config = configs;
        config.version_file_path = dir.path().join("VERSION");

        fs::write(config.resolver_path(), RESOLVER).unwrap();
        fs::write(config.proxy_config_path(), CADDYFILE).unwrap();
        fs::write(config.registry_server_config_path(), IGLU_SERVER_CONF).unwrap();
        fs::write(&config.version_file_path, VERSION).unwrap();

        Self {
            dir,
            config,
            services: Arc::new(RecordingServices::default()),
            keys: Arc::new(RecordingKeyStore::default()),
            probe: Arc::new(StaticProbe::new(true)),
        }
    }

    pub fn control_plane(&self) -> ControlPlane {
        ControlPlane::new(
            Arc::new(self.config.clone()),
            self.probe.clone(),
            self.keys.clone(),
            self.services.clone(),
        )
    }

    pub fn resolver_path(&self) -> PathBuf {
        self.config.resolver_path()
    }

    pub fn proxy_config_path(&self) -> PathBuf {
        self.config.proxy_config_path()
    }

    pub fn read(&self, path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    /// Serve the control plane on an ephemeral port.
    pub async fn serve(&self) -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = HttpServer::new(self.control_plane());
        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();

        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        TestServer {
            addr,
            shutdown,
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
        }
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
