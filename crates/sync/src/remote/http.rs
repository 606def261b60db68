//! JSON-over-HTTP client for the remote cart service.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | cart list | `GET {base}/cart` |
//! | cart create | `POST {base}/cart` |
//! | cart update | `PATCH {base}/cart/{id}` |
//! | cart delete | `DELETE {base}/cart/{id}` |
//! | cart clear | `DELETE {base}/cart` |
//! | wishlist list | `GET {base}/wishlist` |
//! | wishlist create | `POST {base}/wishlist` |
//! | wishlist delete | `DELETE {base}/wishlist/{id}` |

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use basket_core::{CartLine, CartLineId, Identity, ProductId, WishlistEntry, WishlistEntryId};

use super::wire::{CreateEntry, RemoteCartLine, RemoteWishlistEntry, UpdateQuantity};
use super::{CreateLine, RemoteCart, RemoteError, RemoteWishlist};

/// Characters of an error body kept in [`RemoteError::Api`].
const ERROR_BODY_LIMIT: usize = 200;

/// HTTP client for the remote cart and wishlist service.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRemote {
    /// Create a client for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the URL cannot be a
    /// base.
    pub fn new(base_url: Url) -> Result<Self, RemoteError> {
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidEndpoint(base_url.to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, identity: &Identity) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &identity.access_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, RemoteError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(RemoteError::RateLimited(retry_after));
        }

        let url = response.url().to_string();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(url));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Cart service returned non-success status"
            );
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse cart service response"
            );
            RemoteError::Parse(e)
        })
    }
}

#[async_trait]
impl RemoteCart for HttpRemote {
    #[instrument(skip(self, identity))]
    async fn list(&self, identity: &Identity) -> Result<Vec<CartLine>, RemoteError> {
        let url = self.endpoint(&["cart"])?;
        let lines: Vec<RemoteCartLine> = self
            .send_json(self.request(Method::GET, url, identity))
            .await?;
        debug!(count = lines.len(), "Fetched remote cart");
        Ok(lines.into_iter().map(CartLine::from).collect())
    }

    #[instrument(skip(self, identity), fields(product_id = %line.product_id))]
    async fn create(&self, identity: &Identity, line: &CreateLine) -> Result<CartLine, RemoteError> {
        let url = self.endpoint(&["cart"])?;
        let created: RemoteCartLine = self
            .send_json(self.request(Method::POST, url, identity).json(line))
            .await?;
        Ok(created.into())
    }

    #[instrument(skip(self, identity), fields(line_id = %id))]
    async fn update(
        &self,
        identity: &Identity,
        id: &CartLineId,
        quantity: u32,
    ) -> Result<CartLine, RemoteError> {
        let url = self.endpoint(&["cart", id.value()])?;
        let updated: RemoteCartLine = self
            .send_json(
                self.request(Method::PATCH, url, identity)
                    .json(&UpdateQuantity { quantity }),
            )
            .await?;
        Ok(updated.into())
    }

    #[instrument(skip(self, identity), fields(line_id = %id))]
    async fn delete(&self, identity: &Identity, id: &CartLineId) -> Result<(), RemoteError> {
        let url = self.endpoint(&["cart", id.value()])?;
        self.send(self.request(Method::DELETE, url, identity))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, identity))]
    async fn clear(&self, identity: &Identity) -> Result<(), RemoteError> {
        let url = self.endpoint(&["cart"])?;
        self.send(self.request(Method::DELETE, url, identity))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteWishlist for HttpRemote {
    #[instrument(skip(self, identity))]
    async fn list(&self, identity: &Identity) -> Result<Vec<WishlistEntry>, RemoteError> {
        let url = self.endpoint(&["wishlist"])?;
        let entries: Vec<RemoteWishlistEntry> = self
            .send_json(self.request(Method::GET, url, identity))
            .await?;
        debug!(count = entries.len(), "Fetched remote wishlist");
        Ok(entries.into_iter().map(WishlistEntry::from).collect())
    }

    #[instrument(skip(self, identity), fields(product_id = %product_id))]
    async fn create(
        &self,
        identity: &Identity,
        product_id: &ProductId,
    ) -> Result<WishlistEntry, RemoteError> {
        let url = self.endpoint(&["wishlist"])?;
        let created: RemoteWishlistEntry = self
            .send_json(
                self.request(Method::POST, url, identity)
                    .json(&CreateEntry { product_id }),
            )
            .await?;
        Ok(created.into())
    }

    #[instrument(skip(self, identity), fields(entry_id = %id))]
    async fn delete(&self, identity: &Identity, id: &WishlistEntryId) -> Result<(), RemoteError> {
        let url = self.endpoint(&["wishlist", id.value()])?;
        self.send(self.request(Method::DELETE, url, identity))
            .await?;
        Ok(())
    }
}
