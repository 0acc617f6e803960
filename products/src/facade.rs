//! View-facing API for the products feature.
//!
//! [`ProductsFacade`] turns verbs into actions and exposes the memoized
//! selectors as read handles. Every verb comes in two shapes:
//!
//! - fire-and-forget (`load_products`, `create_product`, ...): returns once
//!   the action is dispatched; the outcome shows up in state, and waiting on
//!   the returned handle also covers the toast it raises
//! - request/response (`*_and_wait`): resolves with the matching success or
//!   failure action, bounded by the configured request timeout
//!
//! A write ignored because another of the same verb is in flight resolves
//! with that in-flight write's outcome.

use crate::notification::OperationKind;
use crate::reducer::{ProductsEnvironment, ProductsReducer};
use crate::selectors::ProductSelectors;
use crate::types::{NewProduct, Product, ProductId, ProductsAction, ProductsState};
use crate::ProductsStore;
use catalog_runtime::{EffectHandle, StoreConfig, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors from request/response facade calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FacadeError {
    /// The Store rejected the action or the wait failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operation completed with a failure action
    #[error("{kind} failed: {message}")]
    Operation {
        /// Which operation failed
        kind: OperationKind,
        /// Failure message carried by the action
        message: String,
    },
}

/// Verbs and read handles over a products Store
#[derive(Clone)]
pub struct ProductsFacade {
    store: ProductsStore,
    selectors: Arc<ProductSelectors>,
    request_timeout: Duration,
    shutdown_timeout: Duration,
}

impl ProductsFacade {
    /// Build a Store with an empty document around `env`
    #[must_use]
    pub fn new(env: ProductsEnvironment, config: StoreConfig, request_timeout: Duration) -> Self {
        let shutdown_timeout = config.default_shutdown_timeout;
        let store = ProductsStore::with_config(
            ProductsState::new(),
            ProductsReducer::new(),
            env,
            config,
        );
        Self::from_store(store, request_timeout, shutdown_timeout)
    }

    /// Wrap an existing Store
    #[must_use]
    pub fn from_store(
        store: ProductsStore,
        request_timeout: Duration,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            store,
            selectors: Arc::new(ProductSelectors::new()),
            request_timeout,
            shutdown_timeout,
        }
    }

    /// The underlying Store
    #[must_use]
    pub const fn store(&self) -> &ProductsStore {
        &self.store
    }

    // ========== Fire-and-forget verbs ==========

    /// Request the catalog
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn load_products(&self) -> Result<EffectHandle, StoreError> {
        self.store.send_cascading(ProductsAction::LoadProducts).await
    }

    /// Request creation of a product
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn create_product(&self, product: NewProduct) -> Result<EffectHandle, StoreError> {
        self.store.send_cascading(ProductsAction::CreateProduct { product }).await
    }

    /// Request replacement of the product with `id`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn update_product(
        &self,
        id: ProductId,
        product: Product,
    ) -> Result<EffectHandle, StoreError> {
        self.store
            .send_cascading(ProductsAction::UpdateProduct { id, product })
            .await
    }

    /// Request deletion of the product with `id`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn delete_product(&self, id: ProductId) -> Result<EffectHandle, StoreError> {
        self.store.send_cascading(ProductsAction::DeleteProduct { id }).await
    }

    /// Open a product in the detail view, or close it with `None`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn set_selected_product(&self, product: Option<Product>) -> Result<(), StoreError> {
        self.store
            .send(ProductsAction::SetSelectedProduct { product })
            .await
            .map(|_| ())
    }

    /// Close the detail view
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn clear_selected_product(&self) -> Result<(), StoreError> {
        self.store
            .send(ProductsAction::ClearSelectedProduct)
            .await
            .map(|_| ())
    }

    /// Dismiss the last error
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn clear_error(&self) -> Result<(), StoreError> {
        self.store.send(ProductsAction::ClearError).await.map(|_| ())
    }

    // ========== Request/response verbs ==========

    async fn request(
        &self,
        action: ProductsAction,
        answers: fn(&ProductsAction) -> bool,
    ) -> Result<ProductsAction, FacadeError> {
        let label = action.action_type();
        let outcome = self
            .store
            .send_and_wait_for(action, answers, self.request_timeout)
            .await?;
        tracing::debug!(request = label, outcome = outcome.action_type(), "Request settled");
        Ok(outcome)
    }

    /// Load the catalog and return it
    ///
    /// # Errors
    ///
    /// - [`FacadeError::Operation`]: the load failed
    /// - [`FacadeError::Store`]: shutdown in progress, or no answer within the timeout
    pub async fn load_products_and_wait(&self) -> Result<Vec<Product>, FacadeError> {
        let outcome = self
            .request(ProductsAction::LoadProducts, |a| {
                matches!(
                    a,
                    ProductsAction::LoadProductsSuccess { .. }
                        | ProductsAction::LoadProductsFailure { .. }
                )
            })
            .await?;

        match outcome {
            ProductsAction::LoadProductsSuccess { products } => Ok(products),
            other => Err(operation_error(OperationKind::Load, &other)),
        }
    }

    /// Create a product and return the stored record
    ///
    /// # Errors
    ///
    /// - [`FacadeError::Operation`]: the creation failed
    /// - [`FacadeError::Store`]: shutdown in progress, or no answer within the timeout
    pub async fn create_product_and_wait(
        &self,
        product: NewProduct,
    ) -> Result<Product, FacadeError> {
        let outcome = self
            .request(ProductsAction::CreateProduct { product }, |a| {
                matches!(
                    a,
                    ProductsAction::CreateProductSuccess { .. }
                        | ProductsAction::CreateProductFailure { .. }
                )
            })
            .await?;

        match outcome {
            ProductsAction::CreateProductSuccess { product } => Ok(product),
            other => Err(operation_error(OperationKind::Create, &other)),
        }
    }

    /// Replace a product and return the stored record
    ///
    /// # Errors
    ///
    /// - [`FacadeError::Operation`]: the update failed
    /// - [`FacadeError::Store`]: shutdown in progress, or no answer within the timeout
    pub async fn update_product_and_wait(
        &self,
        id: ProductId,
        product: Product,
    ) -> Result<Product, FacadeError> {
        let outcome = self
            .request(ProductsAction::UpdateProduct { id, product }, |a| {
                matches!(
                    a,
                    ProductsAction::UpdateProductSuccess { .. }
                        | ProductsAction::UpdateProductFailure { .. }
                )
            })
            .await?;

        match outcome {
            ProductsAction::UpdateProductSuccess { product } => Ok(product),
            other => Err(operation_error(OperationKind::Update, &other)),
        }
    }

    /// Delete a product
    ///
    /// # Errors
    ///
    /// - [`FacadeError::Operation`]: the deletion failed
    /// - [`FacadeError::Store`]: shutdown in progress, or no answer within the timeout
    pub async fn delete_product_and_wait(&self, id: ProductId) -> Result<ProductId, FacadeError> {
        let outcome = self
            .request(ProductsAction::DeleteProduct { id }, |a| {
                matches!(
                    a,
                    ProductsAction::DeleteProductSuccess { .. }
                        | ProductsAction::DeleteProductFailure { .. }
                )
            })
            .await?;

        match outcome {
            ProductsAction::DeleteProductSuccess { id } => Ok(id),
            other => Err(operation_error(OperationKind::Delete, &other)),
        }
    }

    // ========== Read handles ==========

    /// The current state snapshot
    pub async fn snapshot(&self) -> Arc<ProductsState> {
        self.store.snapshot().await
    }

    /// Every product; the same `Arc` until the list's snapshot changes
    pub async fn products(&self) -> Arc<Vec<Product>> {
        let snapshot = self.snapshot().await;
        self.selectors.all_products.select(&snapshot)
    }

    /// Whether a request is outstanding
    pub async fn loading(&self) -> bool {
        let snapshot = self.snapshot().await;
        *self.selectors.loading.select(&snapshot)
    }

    /// Message of the last failure
    pub async fn error(&self) -> Arc<Option<String>> {
        let snapshot = self.snapshot().await;
        self.selectors.error.select(&snapshot)
    }

    /// The product open in the detail view
    pub async fn selected_product(&self) -> Arc<Option<Product>> {
        let snapshot = self.snapshot().await;
        self.selectors.selected_product.select(&snapshot)
    }

    /// The listed product with `id`; the same `Arc` until the snapshot changes
    pub async fn product_by_id(&self, id: ProductId) -> Arc<Option<Product>> {
        let snapshot = self.snapshot().await;
        self.selectors.product(&snapshot, id)
    }

    /// Stop accepting verbs and wait for in-flight requests
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if requests are still running
    /// after the configured shutdown timeout.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.store.shutdown(self.shutdown_timeout).await
    }
}

impl std::fmt::Debug for ProductsFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductsFacade")
            .field("request_timeout", &self.request_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

fn operation_error(kind: OperationKind, outcome: &ProductsAction) -> FacadeError {
    FacadeError::Operation {
        kind,
        message: outcome
            .failure_message()
            .unwrap_or(crate::notification::FALLBACK_ERROR_MESSAGE)
            .to_string(),
    }
}
