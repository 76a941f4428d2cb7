//! Byte-fetching abstraction over the concrete HTTP transport.
//!
//! Concrete HTTP transport is out of scope (spec §1); this trait is the
//! seam the archive cache calls through, mirroring the asset-reader
//! trait pattern used elsewhere for the same reason — swap transports
//! without touching call sites.

use crate::errors::{Result, RwxError};

/// Fetches raw bytes for a URL. Implementations decide retry/timeout
/// policy; the cache treats any error as a network failure (spec §7).
pub trait ByteFetcher: Send + Sync {
    fn fetch_bytes(&self, url: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// [`ByteFetcher`] backed by `ehttp`, available behind the `http` feature.
#[cfg(feature = "http")]
pub struct EhttpFetcher;

#[cfg(feature = "http")]
impl ByteFetcher for EhttpFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let request = ehttp::Request::get(url);
        let (tx, rx) = futures::channel::oneshot::channel();
        ehttp::fetch(request, move |result| {
            let _ = tx.send(result);
        });
        let response = rx.await.map_err(|_| RwxError::Fetch {
            url: url.to_string(),
            message: "fetch task was dropped before completing".to_string(),
        })?;
        match response {
            Ok(resp) if resp.ok => Ok(resp.bytes),
            Ok(resp) => Err(RwxError::Fetch {
                url: url.to_string(),
                message: format!("HTTP status {}", resp.status),
            }),
            Err(message) => Err(RwxError::Fetch {
                url: url.to_string(),
                message,
            }),
        }
    }
}

/// A fetcher with no backing transport; any call reports
/// [`RwxError::FeatureNotEnabled`]. Used when the `http` feature is off
/// but a [`ByteFetcher`] is still required by the type signature.
pub struct NullFetcher;

impl ByteFetcher for NullFetcher {
    async fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>> {
        Err(RwxError::FeatureNotEnabled("http"))
    }
}
