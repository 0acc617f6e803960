//! Shared fixtures for integration tests

#![allow(dead_code, clippy::unwrap_used)]

use catalog_products::{
    MockProductService, NewProduct, Product, ProductId, ProductService, ProductServiceError,
    ProductsEnvironment, ProductsFacade, ProductsReducer, ProductsState, ProductsStore,
};
use catalog_runtime::StoreConfig;
use catalog_testing::RecordingNotifier;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Scripted answer for one `get_all_products` call
pub struct LoadReply {
    pub delay: Duration,
    pub result: Result<Vec<Product>, ProductServiceError>,
}

/// Data source that counts calls and replays scripted load answers
///
/// Writes go to an in-memory catalog after `write_delay`. Loads pop the
/// next scripted reply, or read the catalog when the script is empty.
pub struct ScriptedProductService {
    catalog: MockProductService,
    loads: Mutex<VecDeque<LoadReply>>,
    write_delay: Duration,
    pub load_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl ScriptedProductService {
    pub fn new(write_delay: Duration) -> Self {
        Self {
            catalog: MockProductService::with_delay(Duration::ZERO),
            loads: Mutex::new(VecDeque::new()),
            write_delay,
            load_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn script_load(&self, delay: Duration, result: Result<Vec<Product>, ProductServiceError>) {
        self.loads
            .lock()
            .unwrap()
            .push_back(LoadReply { delay, result });
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl ProductService for ScriptedProductService {
    fn get_all_products(&self) -> BoxFuture<'_, Result<Vec<Product>, ProductServiceError>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.loads.lock().unwrap().pop_front();
        Box::pin(async move {
            match reply {
                Some(reply) => {
                    tokio::time::sleep(reply.delay).await;
                    reply.result
                },
                None => self.catalog.get_all_products().await,
            }
        })
    }

    fn get_product_by_id(
        &self,
        id: ProductId,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>> {
        self.catalog.get_product_by_id(id)
    }

    fn create_product(
        &self,
        product: NewProduct,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            tokio::time::sleep(self.write_delay).await;
            self.catalog.create_product(product).await
        })
    }

    fn update_product(
        &self,
        id: ProductId,
        product: Product,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            tokio::time::sleep(self.write_delay).await;
            self.catalog.update_product(id, product).await
        })
    }

    fn delete_product(&self, id: ProductId) -> BoxFuture<'_, Result<(), ProductServiceError>> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            tokio::time::sleep(self.write_delay).await;
            self.catalog.delete_product(id).await
        })
    }
}

/// Data source whose first load parks its worker thread, then fails
///
/// The first `get_all_products` signals `entered` and blocks until
/// [`release`](Self::release), so its task cannot be aborted in between.
/// Later loads and all writes use the seeded catalog.
pub struct GatedFirstLoad {
    catalog: MockProductService,
    gate: Mutex<Option<mpsc::Receiver<()>>>,
    opener: Mutex<Option<mpsc::Sender<()>>>,
    pub entered: Notify,
}

impl GatedFirstLoad {
    pub fn new() -> Self {
        let (opener, gate) = mpsc::channel();
        Self {
            catalog: MockProductService::with_delay(Duration::ZERO),
            gate: Mutex::new(Some(gate)),
            opener: Mutex::new(Some(opener)),
            entered: Notify::new(),
        }
    }

    pub fn release(&self) {
        if let Some(opener) = self.opener.lock().unwrap().take() {
            opener.send(()).unwrap();
        }
    }
}

impl ProductService for GatedFirstLoad {
    fn get_all_products(&self) -> BoxFuture<'_, Result<Vec<Product>, ProductServiceError>> {
        let gate = self.gate.lock().unwrap().take();
        Box::pin(async move {
            match gate {
                Some(gate) => {
                    self.entered.notify_one();
                    gate.recv().unwrap();
                    Err(ProductServiceError::Request("conexão recusada".to_string()))
                },
                None => self.catalog.get_all_products().await,
            }
        })
    }

    fn get_product_by_id(
        &self,
        id: ProductId,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>> {
        self.catalog.get_product_by_id(id)
    }

    fn create_product(
        &self,
        product: NewProduct,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>> {
        self.catalog.create_product(product)
    }

    fn update_product(
        &self,
        id: ProductId,
        product: Product,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>> {
        self.catalog.update_product(id, product)
    }

    fn delete_product(&self, id: ProductId) -> BoxFuture<'_, Result<(), ProductServiceError>> {
        self.catalog.delete_product(id)
    }
}

pub fn store_with(service: Arc<dyn ProductService>, notifier: RecordingNotifier) -> ProductsStore {
    ProductsStore::new(
        ProductsState::default(),
        ProductsReducer::new(),
        ProductsEnvironment::new(service, Arc::new(notifier)),
    )
}

pub fn facade_with(
    service: Arc<dyn ProductService>,
    notifier: RecordingNotifier,
) -> ProductsFacade {
    ProductsFacade::new(
        ProductsEnvironment::new(service, Arc::new(notifier)),
        StoreConfig::default().with_shutdown_timeout(Duration::from_secs(5)),
        Duration::from_secs(10),
    )
}

pub fn new_product(title: &str) -> NewProduct {
    NewProduct {
        title: title.to_string(),
        price: 79.9,
        description: "Produto criado pelos testes de integração".to_string(),
        category: "electronics".to_string(),
        image: "https://example.com/produto.png".to_string(),
    }
}

pub fn product(id: ProductId, title: &str) -> Product {
    Product::from_new(id, new_product(title))
}
