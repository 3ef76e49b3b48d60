//! Best-effort download of remote bundle sources.
//!
//! Each URL is fetched at most once across runs: bodies are stored in the
//! content cache under `remote.{digest(url)}.{type}`. Failures are logged
//! and yield no body, they never abort the bundle.

use std::cell::OnceCell;

use reqwest::blocking::Client;

use crate::{debug, log};

use super::{ContentCache, Digest, FetchError, canonical_url};

/// Blocking HTTP fetcher memoized through the content cache.
pub struct RemoteFetcher {
    cache: ContentCache,
    client: OnceCell<Result<Client, String>>,
}

impl RemoteFetcher {
    pub fn new(cache: ContentCache) -> Self {
        Self {
            cache,
            client: OnceCell::new(),
        }
    }

    /// Cache entry name for a canonical URL.
    pub fn entry_name(url: &str, kind: &str) -> String {
        format!("remote.{}.{}", Digest::of(url).id(), kind)
    }

    /// Fetch the body of a remote identifier.
    ///
    /// Returns cached bytes when present, otherwise performs one GET.
    /// Any failure is logged with the offending URL and returns `None`.
    pub fn fetch(&self, identifier: &str, kind: &str) -> Option<Vec<u8>> {
        let url = canonical_url(identifier);
        let name = Self::entry_name(&url, kind);

        if let Some(body) = self.cache.get(&name) {
            debug!("fetch"; "cached {}", url);
            return Some(body);
        }

        log!("fetch"; "downloading {}", url);
        match self.download(&url) {
            Ok(body) => {
                if let Err(e) = self.cache.put(&name, &body) {
                    log!("fetch"; "failed to cache {}: {}", url, e);
                }
                Some(body)
            }
            Err(e) => {
                log!("fetch"; "failed to download {}: {}", url, e);
                None
            }
        }
    }

    /// Single GET attempt; non-success status codes are errors.
    fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let client = self
            .client
            .get_or_init(|| Client::builder().build().map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| FetchError::Client(e.clone()))?;

        let body = client.get(url).send()?.error_for_status()?.bytes()?;
        Ok(body.to_vec())
    }
}
