//! REST backend client.
//!
//! Routes: `GET/POST {base}/products`, `GET/PUT/DELETE {base}/products/{id}`.

use super::{ProductService, ProductServiceError};
use crate::types::{NewProduct, Product, ProductId};
use futures::future::BoxFuture;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// [`ProductService`] backed by the catalog REST API
#[derive(Debug, Clone)]
pub struct HttpProductService {
    client: Client,
    base_url: String,
}

impl HttpProductService {
    /// Create a client for the API rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`ProductServiceError::Request`] if the HTTP client can't be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProductServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProductServiceError::Request(e.to_string()))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create a service from a preconfigured client
    #[must_use]
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The API root, without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/products", self.base_url)
    }

    fn item_url(&self, id: ProductId) -> String {
        format!("{}/products/{id}", self.base_url)
    }
}

/// Map a non-success status to the error taxonomy
///
/// `id` is the product the request addressed, if any.
async fn check_status(
    response: Response,
    id: Option<ProductId>,
) -> Result<Response, ProductServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), %body, "Catalog API returned an error");

    Err(match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => ProductServiceError::NotFound { id },
        (StatusCode::NOT_FOUND, None) => {
            ProductServiceError::Request(format!("Not found: {status}"))
        },
        (status, _) if status.is_server_error() => {
            ProductServiceError::Request(format!("Server error: {status}"))
        },
        (status, _) if status.is_client_error() => {
            if body.trim().is_empty() {
                ProductServiceError::Validation(format!("Request rejected: {status}"))
            } else {
                ProductServiceError::Validation(body)
            }
        },
        (status, _) => ProductServiceError::Request(format!("Unexpected status: {status}")),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProductServiceError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ProductServiceError::Request(format!("Invalid response body: {e}")))
}

fn transport(e: &reqwest::Error) -> ProductServiceError {
    ProductServiceError::Request(e.to_string())
}

impl ProductService for HttpProductService {
    fn get_all_products(&self) -> BoxFuture<'_, Result<Vec<Product>, ProductServiceError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.collection_url())
                .send()
                .await
                .map_err(|e| transport(&e))?;

            decode(check_status(response, None).await?).await
        })
    }

    fn get_product_by_id(
        &self,
        id: ProductId,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.item_url(id))
                .send()
                .await
                .map_err(|e| transport(&e))?;

            decode(check_status(response, Some(id)).await?).await
        })
    }

    fn create_product(
        &self,
        product: NewProduct,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.collection_url())
                .json(&product)
                .send()
                .await
                .map_err(|e| transport(&e))?;

            decode(check_status(response, None).await?).await
        })
    }

    fn update_product(
        &self,
        id: ProductId,
        product: Product,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>> {
        Box::pin(async move {
            let response = self
                .client
                .put(self.item_url(id))
                .json(&product)
                .send()
                .await
                .map_err(|e| transport(&e))?;

            decode(check_status(response, Some(id)).await?).await
        })
    }

    fn delete_product(&self, id: ProductId) -> BoxFuture<'_, Result<(), ProductServiceError>> {
        Box::pin(async move {
            let response = self
                .client
                .delete(self.item_url(id))
                .send()
                .await
                .map_err(|e| transport(&e))?;

            check_status(response, Some(id)).await.map(|_| ())
        })
    }
}
