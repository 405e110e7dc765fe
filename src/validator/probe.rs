//! Reachability probing for registry endpoints.
//!
//! # Responsibilities
//! - Decide whether a registry URI answers at all before it is persisted
//! - Bound the probe with a timeout so a dead host cannot stall the request

use std::time::Duration;

use async_trait::async_trait;

use crate::config::ProbeConfig;

/// Opaque "does this URI answer" capability.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn is_reachable(&self, uri: &str) -> bool;
}

/// Probe backed by a real HTTP GET.
///
/// 2xx and 3xx count as reachable. Redirects are not followed: a redirect
/// already proves the endpoint is alive.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("control-plane/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlProbe for HttpProbe {
    async fn is_reachable(&self, uri: &str) -> bool {
        let url = match url::Url::parse(uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                tracing::debug!(uri = %uri, scheme = %url.scheme(), "Unsupported probe scheme");
                return false;
            }
            Err(e) => {
                tracing::debug!(uri = %uri, error = %e, "Unparsable probe URI");
                return false;
            }
        };

        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                let reachable = status.is_success() || status.is_redirection();
                if !reachable {
                    tracing::warn!(uri = %uri, status = %status, "Probe failed: non-success status");
                }
                reachable
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(uri = %uri, "Probe failed: timeout");
                false
            }
            Err(e) => {
                tracing::warn!(uri = %uri, error = %e, "Probe failed: connection error");
                false
            }
        }
    }
}
