//! Product data sources.
//!
//! [`ProductService`] is the asynchronous CRUD contract the effect pipeline
//! drives. Two implementations ship with the crate:
//!
//! - [`HttpProductService`]: the REST backend
//! - [`MockProductService`]: an in-memory catalog with simulated latency

use crate::config::{CatalogConfig, DataSource};
use crate::notification::FALLBACK_ERROR_MESSAGE;
use crate::types::{NewProduct, Product, ProductId};
use futures::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;

/// REST backend
pub mod http;

/// In-memory backend
pub mod mock;

pub use http::HttpProductService;
pub use mock::MockProductService;

/// Errors reported by a product data source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductServiceError {
    /// No product has the requested id
    #[error("Produto com ID {id} não encontrado")]
    NotFound {
        /// The requested id
        id: ProductId,
    },

    /// The backend rejected the submitted data
    #[error("{0}")]
    Validation(String),

    /// Transport failure, server error or undecodable response
    #[error("{0}")]
    Request(String),

    /// Failure with no further detail
    #[error("{}", FALLBACK_ERROR_MESSAGE)]
    Unknown,
}

impl ProductServiceError {
    /// Text carried by the failure action: the display string, or the
    /// generic fallback when that is blank
    #[must_use]
    pub fn failure_text(&self) -> String {
        let text = self.to_string();
        if text.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            text
        }
    }
}

/// Asynchronous CRUD contract for the catalog backend
///
/// Object-safe so the environment can hold an `Arc<dyn ProductService>`.
///
/// # Example
///
/// ```ignore
/// let products = service.get_all_products().await?;
/// let created = service.create_product(new_product).await?;
/// service.delete_product(created.id).await?;
/// ```
pub trait ProductService: Send + Sync {
    /// Fetch every product in server order
    ///
    /// # Errors
    ///
    /// Returns [`ProductServiceError::Request`] if the backend can't be reached.
    fn get_all_products(&self) -> BoxFuture<'_, Result<Vec<Product>, ProductServiceError>>;

    /// Fetch one product
    ///
    /// # Errors
    ///
    /// Returns [`ProductServiceError::NotFound`] if no product has `id`.
    fn get_product_by_id(&self, id: ProductId)
    -> BoxFuture<'_, Result<Product, ProductServiceError>>;

    /// Store a new product; the backend assigns its id
    ///
    /// # Errors
    ///
    /// Returns [`ProductServiceError::Validation`] if the data is rejected.
    fn create_product(
        &self,
        product: NewProduct,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>>;

    /// Replace the product with `id`
    ///
    /// The returned record keeps `id` whatever `product.id` says.
    ///
    /// # Errors
    ///
    /// Returns [`ProductServiceError::NotFound`] if no product has `id`.
    fn update_product(
        &self,
        id: ProductId,
        product: Product,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>>;

    /// Delete the product with `id`
    ///
    /// # Errors
    ///
    /// Returns [`ProductServiceError::NotFound`] if no product has `id`.
    fn delete_product(&self, id: ProductId) -> BoxFuture<'_, Result<(), ProductServiceError>>;
}

/// Build the data source selected by `config`
///
/// # Errors
///
/// Returns [`ProductServiceError::Request`] if the HTTP client can't be built.
pub fn from_config(config: &CatalogConfig) -> Result<Arc<dyn ProductService>, ProductServiceError> {
    match config.data_source {
        DataSource::Mock => Ok(Arc::new(MockProductService::with_delay(config.mock_delay))),
        DataSource::Http => Ok(Arc::new(HttpProductService::new(
            &config.api_url,
            config.request_timeout,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ProductServiceError::NotFound { id: 999 };
        assert_eq!(err.failure_text(), "Produto com ID 999 não encontrado");
    }

    #[test]
    fn test_blank_messages_fall_back() {
        assert_eq!(
            ProductServiceError::Request("  ".to_string()).failure_text(),
            "Ocorreu um erro"
        );
        assert_eq!(ProductServiceError::Unknown.failure_text(), "Ocorreu um erro");
        assert_eq!(
            ProductServiceError::Validation("price must be positive".to_string()).failure_text(),
            "price must be positive"
        );
    }
}
