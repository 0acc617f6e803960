//! Product catalog administration core.
//!
//! The unidirectional pipeline between a view and the catalog backend:
//!
//! - [`types`]: the product model, the [`ProductsState`] document and the
//!   [`ProductsAction`] vocabulary
//! - [`reducer`]: the pure state transitions
//! - [`effects`]: data-source calls with switch/exhaust concurrency and
//!   user notifications
//! - [`selectors`]: memoized read projections
//! - [`facade`]: verbs and read handles for the view
//! - [`service`]: the REST and in-memory data sources
//!
//! # Quick Start
//!
//! ```no_run
//! use catalog_products::{ProductsEnvironment, ProductsFacade, MockProductService, TracingNotifier};
//! use catalog_runtime::StoreConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = ProductsEnvironment::new(
//!     Arc::new(MockProductService::new()),
//!     Arc::new(TracingNotifier),
//! );
//! let facade = ProductsFacade::new(env, StoreConfig::default(), Duration::from_secs(30));
//!
//! let products = facade.load_products_and_wait().await?;
//! println!("{} products", products.len());
//!
//! facade.delete_product_and_wait(products[0].id).await?;
//! facade.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod effects;
pub mod facade;
pub mod notification;
pub mod reducer;
pub mod selectors;
pub mod service;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::{CatalogConfig, ConfigError, DataSource};
pub use facade::{FacadeError, ProductsFacade};
pub use notification::{OperationKind, TracingNotifier};
pub use reducer::{ProductsEnvironment, ProductsReducer};
pub use selectors::ProductSelectors;
pub use service::{
    HttpProductService, MockProductService, ProductService, ProductServiceError,
};
pub use types::{NewProduct, Product, ProductId, ProductsAction, ProductsState};

/// Store specialized to the products feature
pub type ProductsStore =
    catalog_runtime::Store<ProductsState, ProductsAction, ProductsEnvironment, ProductsReducer>;
