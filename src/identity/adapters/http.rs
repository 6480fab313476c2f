//! HTTP adapter fetching a JSON Web Key Set from the identity provider.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;

use crate::identity::ports::{KeySourceError, KeySourceResult, SigningKeySource};

/// Fetches signing keys from a JWKS endpoint.
#[derive(Debug, Clone)]
pub struct HttpJwksSource {
    client: reqwest::Client,
    url: String,
}

impl HttpJwksSource {
    /// Creates a source for the given JWKS URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Creates a source sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Returns the JWKS URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SigningKeySource for HttpJwksSource {
    async fn fetch(&self) -> KeySourceResult<JwkSet> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(KeySourceError::unavailable)?;

        response.json::<JwkSet>().await.map_err(|err| {
            if err.is_decode() {
                KeySourceError::Malformed(err.to_string())
            } else {
                KeySourceError::unavailable(err)
            }
        })
    }
}
