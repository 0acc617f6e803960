//! Catalog demo binary
//!
//! Walks the products pipeline through a load, a create, an update, a
//! delete and a failing delete, printing the document after each step.

use catalog_products::validation::validate_form;
use catalog_products::{
    service, CatalogConfig, FacadeError, NewProduct, ProductsEnvironment, ProductsFacade,
    ProductsState, TracingNotifier,
};
use catalog_runtime::StoreConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_state(step: &str, state: &ProductsState) {
    println!("\n--- {step} ---");
    println!(
        "products: {} | loading: {} | error: {}",
        state.count(),
        state.loading,
        state.error.as_deref().unwrap_or("-")
    );
    for product in state.products.iter().rev().take(3).rev() {
        println!("  #{:<3} {:<60} {:>8.2}", product.id, product.title, product.price);
    }
}

fn report(result: Result<impl std::fmt::Debug, FacadeError>) {
    match result {
        Ok(value) => println!("ok: {value:?}"),
        Err(e) => println!("failed: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_products=debug,catalog_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CatalogConfig::from_env()?;
    tracing::info!(?config, "Starting catalog demo");
    println!("=== Catalog Demo ({:?} data source) ===", config.data_source);

    let env = ProductsEnvironment::new(service::from_config(&config)?, Arc::new(TracingNotifier));
    let facade = ProductsFacade::new(
        env,
        StoreConfig::default().with_shutdown_timeout(config.shutdown_timeout),
        config.request_timeout,
    );

    // Load
    report(facade.load_products_and_wait().await.map(|p| p.len()));
    print_state("after load", &*facade.snapshot().await);

    // Create
    let draft = NewProduct {
        title: "Teclado Mecânico".to_string(),
        price: 349.9,
        description: "Teclado mecânico com switches marrons e iluminação".to_string(),
        category: "electronics".to_string(),
        image: "https://example.com/teclado.png".to_string(),
    };
    if let Err(errors) = validate_form(&draft) {
        for error in errors {
            println!("{:?}: {}", error.field, error.rule.message());
        }
        return Ok(());
    }
    let created = facade.create_product_and_wait(draft).await;
    let created_id = created.as_ref().map(|p| p.id).ok();
    report(created);
    print_state("after create", &*facade.snapshot().await);

    // Update
    if let Some(id) = created_id {
        if let Some(mut product) = (*facade.product_by_id(id).await).clone() {
            product.price = 299.9;
            report(facade.update_product_and_wait(id, product).await);
            print_state("after update", &*facade.snapshot().await);
        }

        // Delete
        report(facade.delete_product_and_wait(id).await);
        print_state("after delete", &*facade.snapshot().await);
    }

    // Failing delete
    report(facade.delete_product_and_wait(999).await);
    print_state("after failing delete", &*facade.snapshot().await);
    facade.clear_error().await?;

    facade.shutdown().await?;
    println!("\n=== Demo Complete ===");
    Ok(())
}
