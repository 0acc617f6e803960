//! End-to-end scenarios through the Store, the effect pipeline and the mock
//! data source.

#![allow(clippy::unwrap_used)]

mod common;

use catalog_core::notification::{Notification, Severity};
use catalog_products::{
    FacadeError, MockProductService, OperationKind, ProductServiceError, ProductsAction,
};
use catalog_runtime::StoreError;
use catalog_testing::RecordingNotifier;
use common::{
    GatedFirstLoad, ScriptedProductService, facade_with, new_product, product, store_with,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn load_fetches_the_seeded_catalog() -> Result<(), StoreError> {
    let notifier = RecordingNotifier::new();
    let store = store_with(Arc::new(MockProductService::new()), notifier.clone());

    let mut handle = store.send_cascading(ProductsAction::LoadProducts).await?;
    assert!(store.state(|s| s.loading).await);

    handle.wait().await;

    let state = store.snapshot().await;
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(state.products.len(), 12);
    assert_eq!(
        state.products.first().map(|p| p.title.as_str()),
        Some("Fjallraven - Foldsack No. 1 Backpack, Fits 15 Laptops")
    );
    assert!(notifier.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn create_appends_with_next_id_and_notifies() -> Result<(), StoreError> {
    let notifier = RecordingNotifier::new();
    let store = store_with(Arc::new(MockProductService::new()), notifier.clone());

    store.send_cascading(ProductsAction::LoadProducts).await?.wait().await;
    store
        .send_cascading(ProductsAction::CreateProduct {
            product: new_product("Fone Bluetooth"),
        })
        .await?
        .wait()
        .await;

    let state = store.snapshot().await;
    assert_eq!(state.products.len(), 13);
    let created = state.products.last().unwrap();
    assert_eq!(created.id, 13);
    assert_eq!(created.title, "Fone Bluetooth");
    assert!(!state.loading);
    assert_eq!(
        notifier.notifications(),
        vec![Notification::success("Sucesso", "Produto criado com sucesso")]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn update_replaces_only_the_target() -> Result<(), StoreError> {
    let notifier = RecordingNotifier::new();
    let store = store_with(Arc::new(MockProductService::new()), notifier.clone());
    store.send_cascading(ProductsAction::LoadProducts).await?.wait().await;
    let before = store.snapshot().await;

    let mut replacement = before.products[2].clone();
    replacement.price = 42.0;
    store
        .send_cascading(ProductsAction::UpdateProduct {
            id: replacement.id,
            product: replacement.clone(),
        })
        .await?
        .wait()
        .await;

    let after = store.snapshot().await;
    for (old, new) in before.products.iter().zip(&after.products) {
        if old.id == replacement.id {
            assert_eq!(new, &replacement);
        } else {
            assert_eq!(old, new);
        }
    }
    assert_eq!(
        notifier.last().map(|n| n.detail),
        Some("Produto atualizado com sucesso".to_string())
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn deleting_a_missing_product_reports_the_failure() -> Result<(), StoreError> {
    let notifier = RecordingNotifier::new();
    let store = store_with(Arc::new(MockProductService::new()), notifier.clone());
    store.send_cascading(ProductsAction::LoadProducts).await?.wait().await;

    store
        .send_cascading(ProductsAction::DeleteProduct { id: 999 })
        .await?
        .wait()
        .await;

    let state = store.snapshot().await;
    assert!(!state.loading);
    assert_eq!(
        state.error.as_deref(),
        Some("Produto com ID 999 não encontrado")
    );
    assert_eq!(state.products.len(), 12);
    assert_eq!(
        notifier.notifications(),
        vec![Notification::error("Erro", "Não foi possível deletar o produto")]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn second_create_while_one_is_in_flight_is_ignored() -> Result<(), StoreError> {
    let service = Arc::new(ScriptedProductService::new(Duration::from_millis(500)));
    let notifier = RecordingNotifier::new();
    let store = store_with(service.clone(), notifier.clone());

    let mut first = store
        .send_cascading(ProductsAction::CreateProduct {
            product: new_product("Primeiro"),
        })
        .await?;
    let mut second = store
        .send_cascading(ProductsAction::CreateProduct {
            product: new_product("Segundo"),
        })
        .await?;
    first.wait().await;
    second.wait().await;

    assert_eq!(ScriptedProductService::calls(&service.create_calls), 1);
    let state = store.snapshot().await;
    assert_eq!(state.products.len(), 1);
    assert_eq!(state.products[0].title, "Primeiro");
    assert!(!state.loading);
    assert_eq!(notifier.count(Severity::Success), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn different_write_verbs_do_not_block_each_other() -> Result<(), StoreError> {
    let service = Arc::new(ScriptedProductService::new(Duration::from_millis(500)));
    let store = store_with(service.clone(), RecordingNotifier::new());

    let mut create = store
        .send_cascading(ProductsAction::CreateProduct {
            product: new_product("Novo"),
        })
        .await?;
    let mut delete = store.send_cascading(ProductsAction::DeleteProduct { id: 1 }).await?;
    create.wait().await;
    delete.wait().await;

    assert_eq!(ScriptedProductService::calls(&service.create_calls), 1);
    assert_eq!(ScriptedProductService::calls(&service.delete_calls), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn newer_load_supersedes_a_slower_one() -> Result<(), StoreError> {
    let service = Arc::new(ScriptedProductService::new(Duration::ZERO));
    service.script_load(Duration::from_millis(800), Ok(vec![product(1, "Antigo")]));
    service.script_load(
        Duration::from_millis(100),
        Ok(vec![product(1, "Novo"), product(2, "Outro")]),
    );
    let store = store_with(service.clone(), RecordingNotifier::new());

    let mut first = store.send_cascading(ProductsAction::LoadProducts).await?;
    // Let the first load reach the data source
    tokio::task::yield_now().await;
    let mut second = store.send_cascading(ProductsAction::LoadProducts).await?;
    second.wait().await;
    first.wait().await;

    // Let any stray completion run before checking
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(ScriptedProductService::calls(&service.load_calls), 2);
    let state = store.snapshot().await;
    assert_eq!(
        state.products.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
        vec!["Novo", "Outro"]
    );
    assert!(!state.loading);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn newer_load_wins_even_when_it_finishes_last() -> Result<(), StoreError> {
    let service = Arc::new(ScriptedProductService::new(Duration::ZERO));
    service.script_load(
        Duration::from_millis(50),
        Err(ProductServiceError::Request("conexão recusada".to_string())),
    );
    service.script_load(Duration::from_millis(400), Ok(vec![product(7, "Atual")]));
    let notifier = RecordingNotifier::new();
    let store = store_with(service.clone(), notifier.clone());

    let mut first = store.send_cascading(ProductsAction::LoadProducts).await?;
    // Let the first load reach the data source
    tokio::task::yield_now().await;
    let mut second = store.send_cascading(ProductsAction::LoadProducts).await?;
    first.wait().await;

    // The superseded failure never reached the document or the user
    assert!(store.state(|s| s.loading).await);
    assert_eq!(store.state(|s| s.error.clone()).await, None);

    second.wait().await;
    let state = store.snapshot().await;
    assert_eq!(state.products.iter().map(|p| p.id).collect::<Vec<_>>(), vec![7]);
    assert!(!state.loading);
    assert!(notifier.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn superseded_load_failure_never_reaches_the_user() -> Result<(), StoreError> {
    let service = Arc::new(GatedFirstLoad::new());
    let notifier = RecordingNotifier::new();
    let store = store_with(service.clone(), notifier.clone());

    let mut first = store.send_cascading(ProductsAction::LoadProducts).await?;
    service.entered.notified().await;
    let mut second = store.send_cascading(ProductsAction::LoadProducts).await?;
    second.wait().await;

    // The first load fails only after the second one has been applied
    service.release();
    first.wait().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = store.snapshot().await;
    assert_eq!(state.products.len(), 12);
    assert_eq!(state.error, None);
    assert!(!state.loading);
    assert!(notifier.is_empty(), "got {:?}", notifier.notifications());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn write_finishing_during_shutdown_is_silent() -> Result<(), StoreError> {
    let service = Arc::new(ScriptedProductService::new(Duration::from_millis(500)));
    let notifier = RecordingNotifier::new();
    let store = store_with(service.clone(), notifier.clone());

    let _create = store
        .send_cascading(ProductsAction::CreateProduct {
            product: new_product("Atrasado"),
        })
        .await?;
    store.shutdown(Duration::from_secs(5)).await?;

    assert_eq!(ScriptedProductService::calls(&service.create_calls), 1);
    assert!(store.state(|s| s.products.is_empty()).await);
    assert!(notifier.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_load_keeps_previous_list_and_notifies() -> Result<(), StoreError> {
    let service = Arc::new(ScriptedProductService::new(Duration::ZERO));
    service.script_load(Duration::from_millis(10), Ok(vec![product(1, "Mantido")]));
    service.script_load(
        Duration::from_millis(10),
        Err(ProductServiceError::Request(String::new())),
    );
    let notifier = RecordingNotifier::new();
    let store = store_with(service, notifier.clone());

    store.send_cascading(ProductsAction::LoadProducts).await?.wait().await;
    store.send_cascading(ProductsAction::LoadProducts).await?.wait().await;

    let state = store.snapshot().await;
    assert_eq!(state.products.len(), 1);
    assert_eq!(state.error.as_deref(), Some("Ocorreu um erro"));
    assert_eq!(
        notifier.last(),
        Some(Notification::error(
            "Erro",
            "Não foi possível carregar os produtos"
        ))
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn loading_is_false_at_rest_after_every_verb() -> Result<(), StoreError> {
    let store = store_with(Arc::new(MockProductService::new()), RecordingNotifier::new());

    let actions = [
        ProductsAction::LoadProducts,
        ProductsAction::CreateProduct {
            product: new_product("Relógio"),
        },
        ProductsAction::DeleteProduct { id: 2 },
        ProductsAction::DeleteProduct { id: 2 },
        ProductsAction::UpdateProduct {
            id: 500,
            product: product(500, "Inexistente"),
        },
    ];

    for action in actions {
        let mut handle = store.send_cascading(action).await?;
        assert!(store.state(|s| s.loading).await);
        handle.wait().await;
        assert!(!store.state(|s| s.loading).await);
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unchanged_document_keeps_snapshot_identity() -> Result<(), StoreError> {
    let facade = facade_with(Arc::new(MockProductService::new()), RecordingNotifier::new());
    facade.load_products().await?.wait().await;

    let before = facade.products().await;
    facade.clear_error().await?;
    facade.clear_selected_product().await?;
    let after = facade.products().await;
    assert!(Arc::ptr_eq(&before, &after));

    facade.delete_product(1).await?.wait().await;
    let changed = facade.products().await;
    assert!(!Arc::ptr_eq(&before, &changed));
    assert_eq!(changed.len(), 11);
    Ok(())
}

mod facade {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn request_response_verbs() -> Result<(), FacadeError> {
        let notifier = RecordingNotifier::new();
        let facade = facade_with(Arc::new(MockProductService::new()), notifier.clone());

        let products = facade.load_products_and_wait().await?;
        assert_eq!(products.len(), 12);

        let created = facade.create_product_and_wait(new_product("Caneca")).await?;
        assert_eq!(created.id, 13);
        assert_eq!(*facade.product_by_id(13).await, Some(created.clone()));

        let mut edited = created.clone();
        edited.title = "Caneca térmica".to_string();
        let updated = facade.update_product_and_wait(13, edited.clone()).await?;
        assert_eq!(updated, edited);

        assert_eq!(facade.delete_product_and_wait(13).await?, 13);
        assert_eq!(*facade.product_by_id(13).await, None);
        assert!(!facade.loading().await);
        assert_eq!(notifier.count(Severity::Success), 3);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn failure_maps_to_operation_error() {
        let facade = facade_with(Arc::new(MockProductService::new()), RecordingNotifier::new());

        let result = facade.delete_product_and_wait(999).await;

        assert_eq!(
            result,
            Err(FacadeError::Operation {
                kind: OperationKind::Delete,
                message: "Produto com ID 999 não encontrado".to_string(),
            })
        );
        assert_eq!(
            *facade.error().await,
            Some("Produto com ID 999 não encontrado".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ignored_write_resolves_with_in_flight_outcome() -> Result<(), FacadeError> {
        let service = Arc::new(ScriptedProductService::new(Duration::from_millis(300)));
        let facade = facade_with(service.clone(), RecordingNotifier::new());

        let (first, second) = tokio::join!(
            facade.create_product_and_wait(new_product("Vencedor")),
            facade.create_product_and_wait(new_product("Ignorado")),
        );

        assert_eq!(first?.title, "Vencedor");
        assert_eq!(second?.title, "Vencedor");
        assert_eq!(ScriptedProductService::calls(&service.create_calls), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn selection_round_trip() -> Result<(), StoreError> {
        let facade = facade_with(Arc::new(MockProductService::new()), RecordingNotifier::new());
        let chosen = product(4, "Escolhido");

        facade.set_selected_product(Some(chosen.clone())).await?;
        assert_eq!(*facade.selected_product().await, Some(chosen));

        facade.clear_selected_product().await?;
        assert_eq!(*facade.selected_product().await, None);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_rejects_new_verbs() -> Result<(), StoreError> {
        let facade = facade_with(Arc::new(MockProductService::new()), RecordingNotifier::new());

        facade.load_products().await?;
        facade.shutdown().await?;

        assert!(matches!(
            facade.load_products().await,
            Err(StoreError::ShutdownInProgress)
        ));
        assert_eq!(
            facade.create_product_and_wait(new_product("Tarde")).await,
            Err(FacadeError::Store(StoreError::ShutdownInProgress))
        );
        Ok(())
    }
}
