//! Reducer logic for the products document.
//!
//! State transitions live in [`ProductsReducer::apply`], a pure function of
//! the current document and the action. The [`Reducer`] impl runs it and then
//! asks the effect pipeline for the request's I/O.

use crate::effects;
use crate::service::ProductService;
use crate::types::{ProductsAction, ProductsState};
use catalog_core::{effect::Effect, notification::Notifier, reducer::Reducer, SmallVec};
use std::sync::Arc;

/// Environment dependencies for the products reducer
#[derive(Clone)]
pub struct ProductsEnvironment {
    /// Catalog backend
    pub service: Arc<dyn ProductService>,
    /// Toast sink
    pub notifier: Arc<dyn Notifier>,
}

impl ProductsEnvironment {
    /// Creates a new `ProductsEnvironment`
    #[must_use]
    pub fn new(service: Arc<dyn ProductService>, notifier: Arc<dyn Notifier>) -> Self {
        Self { service, notifier }
    }
}

impl std::fmt::Debug for ProductsEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductsEnvironment").finish_non_exhaustive()
    }
}

/// Reducer for the products document
#[derive(Clone, Debug, Default)]
pub struct ProductsReducer;

impl ProductsReducer {
    /// Creates a new `ProductsReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Applies an action to state
    ///
    /// Total over every action; unknown ids are ignored.
    pub fn apply(state: &mut ProductsState, action: &ProductsAction) {
        match action {
            // ========== Requests ==========
            ProductsAction::LoadProducts
            | ProductsAction::CreateProduct { .. }
            | ProductsAction::UpdateProduct { .. }
            | ProductsAction::DeleteProduct { .. } => {
                state.loading = true;
                state.error = None;
            },

            // ========== Successes ==========
            ProductsAction::LoadProductsSuccess { products } => {
                state.products.clone_from(products);
                state.loading = false;
                state.error = None;
            },
            ProductsAction::CreateProductSuccess { product } => {
                state.products.push(product.clone());
                state.loading = false;
                state.error = None;
            },
            ProductsAction::UpdateProductSuccess { product } => {
                for existing in state.products.iter_mut().filter(|p| p.id == product.id) {
                    existing.clone_from(product);
                }
                state.loading = false;
                state.error = None;
            },
            ProductsAction::DeleteProductSuccess { id } => {
                state.products.retain(|p| p.id != *id);
                state.loading = false;
                state.error = None;
            },

            // ========== Failures ==========
            ProductsAction::LoadProductsFailure { error }
            | ProductsAction::CreateProductFailure { error }
            | ProductsAction::UpdateProductFailure { error }
            | ProductsAction::DeleteProductFailure { error } => {
                state.loading = false;
                state.error = Some(error.clone());
            },

            // ========== UI ==========
            ProductsAction::SetSelectedProduct { product } => {
                state.selected_product.clone_from(product);
            },
            ProductsAction::ClearSelectedProduct => {
                state.selected_product = None;
            },
            ProductsAction::ClearError => {
                state.error = None;
            },
        }
    }
}

impl Reducer for ProductsReducer {
    type State = ProductsState;
    type Action = ProductsAction;
    type Environment = ProductsEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        tracing::trace!(action = action.action_type(), "Reducing");
        Self::apply(state, &action);
        effects::for_action(action, env)
    }
}
