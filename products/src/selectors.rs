//! Read projections over the products document.
//!
//! The free functions are the plain projections. [`ProductSelectors`] wraps
//! them in memoized [`Selector`]s: selecting twice from the same snapshot
//! returns the same `Arc`, so a view can skip re-rendering with
//! [`Arc::ptr_eq`].

use crate::types::{Product, ProductId, ProductsState};
use catalog_core::selector::Selector;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Every product, in server order
#[must_use]
pub fn all_products(state: &ProductsState) -> Vec<Product> {
    state.products.clone()
}

/// Whether a request is outstanding
#[must_use]
pub const fn loading(state: &ProductsState) -> bool {
    state.loading
}

/// Message of the last failure
#[must_use]
pub fn error(state: &ProductsState) -> Option<String> {
    state.error.clone()
}

/// The product open in the detail view
#[must_use]
pub fn selected_product(state: &ProductsState) -> Option<Product> {
    state.selected_product.clone()
}

/// The product with `id`, if listed
#[must_use]
pub fn product_by_id(state: &ProductsState, id: ProductId) -> Option<Product> {
    state.get(id).cloned()
}

/// Memoized selectors for the products document
#[derive(Debug)]
pub struct ProductSelectors {
    /// See [`all_products`]
    pub all_products: Selector<ProductsState, Vec<Product>>,
    /// See [`loading`]
    pub loading: Selector<ProductsState, bool>,
    /// See [`error`]
    pub error: Selector<ProductsState, Option<String>>,
    /// See [`selected_product`]
    pub selected_product: Selector<ProductsState, Option<Product>>,
    by_id: Mutex<HashMap<ProductId, Arc<Selector<ProductsState, Option<Product>>>>>,
}

impl ProductSelectors {
    /// Fresh selectors with empty caches
    #[must_use]
    pub fn new() -> Self {
        Self {
            all_products: Selector::new(all_products),
            loading: Selector::new(loading),
            error: Selector::new(error),
            selected_product: Selector::new(selected_product),
            by_id: Mutex::new(HashMap::new()),
        }
    }

    /// A memoized selector for the product with `id`
    ///
    /// Each call builds an independent selector with its own cache.
    #[must_use]
    pub fn product_by_id(id: ProductId) -> Selector<ProductsState, Option<Product>> {
        Selector::new(move |state: &ProductsState| product_by_id(state, id))
    }

    /// Select every product from `snapshot`
    pub fn products(&self, snapshot: &Arc<ProductsState>) -> Arc<Vec<Product>> {
        self.all_products.select(snapshot)
    }

    /// Select the product with `id` through a selector kept per id
    pub fn product(&self, snapshot: &Arc<ProductsState>, id: ProductId) -> Arc<Option<Product>> {
        let selector = {
            let mut by_id = self.by_id.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                by_id
                    .entry(id)
                    .or_insert_with(|| Arc::new(Self::product_by_id(id))),
            )
        };
        selector.select(snapshot)
    }
}

impl Default for ProductSelectors {
    fn default() -> Self {
        Self::new()
    }
}
