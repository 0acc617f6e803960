//! Effect pipeline for the products feature.
//!
//! Each request action maps to one keyed effect that calls the data source
//! exactly once and answers with the matching success or failure action.
//! Loads are latest-wins ([`Effect::switch`]); writes are first-wins per verb
//! ([`Effect::exhaust`]).
//!
//! Toasts hang off the outcome actions rather than the request: an outcome
//! only reaches the reducer once the runtime has confirmed its ticket is
//! current, so a superseded load or a result dropped during shutdown never
//! shows anything to the user.

use crate::notification::OperationKind;
use crate::reducer::ProductsEnvironment;
use crate::service::ProductServiceError;
use crate::types::{NewProduct, Product, ProductId, ProductsAction};
use catalog_core::effect::{Effect, EffectId};
use catalog_core::notification::Notification;
use catalog_core::{smallvec, SmallVec};
use std::future::Future;

/// Family of catalog loads
pub const LOAD: EffectId = EffectId::new("products.load");
/// Family of product creations
pub const CREATE: EffectId = EffectId::new("products.create");
/// Family of product updates
pub const UPDATE: EffectId = EffectId::new("products.update");
/// Family of product deletions
pub const DELETE: EffectId = EffectId::new("products.delete");

/// Effects for `action`
///
/// Requests get their data-source call, applied outcomes get their toast,
/// UI intents get nothing.
#[must_use]
pub fn for_action(
    action: ProductsAction,
    env: &ProductsEnvironment,
) -> SmallVec<[Effect<ProductsAction>; 4]> {
    match action {
        ProductsAction::LoadProducts => smallvec![load_products(env)],
        ProductsAction::CreateProduct { product } => smallvec![create_product(env, product)],
        ProductsAction::UpdateProduct { id, product } => {
            smallvec![update_product(env, id, product)]
        },
        ProductsAction::DeleteProduct { id } => smallvec![delete_product(env, id)],
        outcome => outcome_notification(&outcome)
            .map(|notification| notify(env, notification))
            .into_iter()
            .collect(),
    }
}

/// The toast for an outcome action, if it warrants one
///
/// Successful loads stay silent.
#[must_use]
pub fn outcome_notification(action: &ProductsAction) -> Option<Notification> {
    match action {
        ProductsAction::LoadProductsSuccess { .. } => OperationKind::Load.success_notification(),
        ProductsAction::CreateProductSuccess { .. } => {
            OperationKind::Create.success_notification()
        },
        ProductsAction::UpdateProductSuccess { .. } => {
            OperationKind::Update.success_notification()
        },
        ProductsAction::DeleteProductSuccess { .. } => {
            OperationKind::Delete.success_notification()
        },
        ProductsAction::LoadProductsFailure { .. } => Some(OperationKind::Load.error_notification()),
        ProductsAction::CreateProductFailure { .. } => {
            Some(OperationKind::Create.error_notification())
        },
        ProductsAction::UpdateProductFailure { .. } => {
            Some(OperationKind::Update.error_notification())
        },
        ProductsAction::DeleteProductFailure { .. } => {
            Some(OperationKind::Delete.error_notification())
        },
        _ => None,
    }
}

/// Hand `notification` to the environment's sink; feeds nothing back
#[must_use]
pub fn notify(env: &ProductsEnvironment, notification: Notification) -> Effect<ProductsAction> {
    let notifier = env.notifier.clone();

    Effect::future(async move {
        notifier.notify(notification);
        None
    })
}

/// Fetch the catalog, superseding any load still in flight
#[must_use]
pub fn load_products(env: &ProductsEnvironment) -> Effect<ProductsAction> {
    let service = env.service.clone();

    run(
        OperationKind::Load,
        async move { service.get_all_products().await },
        |products| ProductsAction::LoadProductsSuccess { products },
        |error| ProductsAction::LoadProductsFailure { error },
    )
    .switch(LOAD)
}

/// Create a product unless a creation is already in flight
#[must_use]
pub fn create_product(env: &ProductsEnvironment, product: NewProduct) -> Effect<ProductsAction> {
    let service = env.service.clone();

    run(
        OperationKind::Create,
        async move { service.create_product(product).await },
        |product| ProductsAction::CreateProductSuccess { product },
        |error| ProductsAction::CreateProductFailure { error },
    )
    .exhaust(CREATE)
}

/// Replace a product unless an update is already in flight
#[must_use]
pub fn update_product(
    env: &ProductsEnvironment,
    id: ProductId,
    product: Product,
) -> Effect<ProductsAction> {
    let service = env.service.clone();

    run(
        OperationKind::Update,
        async move { service.update_product(id, product).await },
        |product| ProductsAction::UpdateProductSuccess { product },
        |error| ProductsAction::UpdateProductFailure { error },
    )
    .exhaust(UPDATE)
}

/// Delete a product unless a deletion is already in flight
#[must_use]
pub fn delete_product(env: &ProductsEnvironment, id: ProductId) -> Effect<ProductsAction> {
    let service = env.service.clone();

    run(
        OperationKind::Delete,
        async move { service.delete_product(id).await },
        move |()| ProductsAction::DeleteProductSuccess { id },
        |error| ProductsAction::DeleteProductFailure { error },
    )
    .exhaust(DELETE)
}

/// Await `call` and map the outcome to an action
fn run<T, Fut, S, F>(
    kind: OperationKind,
    call: Fut,
    on_success: S,
    on_failure: F,
) -> Effect<ProductsAction>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, ProductServiceError>> + Send + 'static,
    S: FnOnce(T) -> ProductsAction + Send + 'static,
    F: FnOnce(String) -> ProductsAction + Send + 'static,
{
    Effect::future(async move {
        match call.await {
            Ok(value) => {
                tracing::debug!(operation = %kind, "Catalog request succeeded");
                Some(on_success(value))
            },
            Err(error) => {
                tracing::warn!(operation = %kind, %error, "Catalog request failed");
                Some(on_failure(error.failure_text()))
            },
        }
    })
}
