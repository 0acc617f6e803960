//! In-memory catalog with simulated network latency.

use super::{ProductService, ProductServiceError};
use crate::types::{NewProduct, Product, ProductId};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Latency applied to every call by [`MockProductService::new`]
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug)]
struct Catalog {
    products: Vec<Product>,
    next_id: ProductId,
}

/// In-memory [`ProductService`]
///
/// Starts with twelve sample products (ids 1 through 12); the next created
/// product gets id 13. Every call waits for the configured delay before
/// touching the catalog. Clones share the same catalog.
#[derive(Debug, Clone)]
pub struct MockProductService {
    catalog: Arc<Mutex<Catalog>>,
    delay: Duration,
}

impl MockProductService {
    /// Seeded catalog with the default 1.5 s latency
    #[must_use]
    pub fn new() -> Self {
        Self::with_delay(DEFAULT_DELAY)
    }

    /// Seeded catalog with a custom latency (`Duration::ZERO` for tests)
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self::with_products(seed_products(), delay)
    }

    /// Catalog holding `products`; new ids continue after the largest one
    #[must_use]
    pub fn with_products(products: Vec<Product>, delay: Duration) -> Self {
        let next_id = products.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Self {
            catalog: Arc::new(Mutex::new(Catalog { products, next_id })),
            delay,
        }
    }

    /// Current catalog contents, bypassing the delay
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.with_catalog(|catalog| catalog.products.clone())
    }

    fn with_catalog<T>(&self, f: impl FnOnce(&mut Catalog) -> T) -> T {
        let mut catalog = self.catalog.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut catalog)
    }

    async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for MockProductService {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects records the data model forbids
fn check_fields(title: &str, price: f64) -> Result<(), ProductServiceError> {
    if title.trim().is_empty() {
        return Err(ProductServiceError::Validation(
            "O título do produto é obrigatório".to_string(),
        ));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(ProductServiceError::Validation(format!(
            "Preço inválido: {price}"
        )));
    }
    Ok(())
}

impl ProductService for MockProductService {
    fn get_all_products(&self) -> BoxFuture<'_, Result<Vec<Product>, ProductServiceError>> {
        Box::pin(async move {
            self.wait().await;
            Ok(self.products())
        })
    }

    fn get_product_by_id(
        &self,
        id: ProductId,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>> {
        Box::pin(async move {
            self.wait().await;
            self.with_catalog(|catalog| {
                catalog
                    .products
                    .iter()
                    .find(|p| p.id == id)
                    .cloned()
                    .ok_or(ProductServiceError::NotFound { id })
            })
        })
    }

    fn create_product(
        &self,
        product: NewProduct,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>> {
        Box::pin(async move {
            self.wait().await;
            check_fields(&product.title, product.price)?;

            Ok(self.with_catalog(|catalog| {
                let created = Product::from_new(catalog.next_id, product);
                catalog.next_id += 1;
                catalog.products.push(created.clone());
                created
            }))
        })
    }

    fn update_product(
        &self,
        id: ProductId,
        product: Product,
    ) -> BoxFuture<'_, Result<Product, ProductServiceError>> {
        Box::pin(async move {
            self.wait().await;
            check_fields(&product.title, product.price)?;

            self.with_catalog(|catalog| {
                let slot = catalog
                    .products
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or(ProductServiceError::NotFound { id })?;
                *slot = Product { id, ..product };
                Ok(slot.clone())
            })
        })
    }

    fn delete_product(&self, id: ProductId) -> BoxFuture<'_, Result<(), ProductServiceError>> {
        Box::pin(async move {
            self.wait().await;
            self.with_catalog(|catalog| {
                let index = catalog
                    .products
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or(ProductServiceError::NotFound { id })?;
                catalog.products.remove(index);
                Ok(())
            })
        })
    }
}

fn seed(
    id: ProductId,
    title: &str,
    price: f64,
    description: &str,
    category: &str,
    image: &str,
) -> Product {
    Product {
        id,
        title: title.to_string(),
        price,
        description: description.to_string(),
        category: category.to_string(),
        image: image.to_string(),
    }
}

const BOOK_IMAGE: &str = "https://viverdeblog.com/wp-content/uploads/2017/04/como-escrever-um-livro-topo.png";
const JACKET_IMAGE: &str = "https://m.media-amazon.com/images/I/71JCtuGbc4L.jpg";
const ROSE_IMAGE: &str = "https://img.freepik.com/fotos-gratis/fotografia-em-close-up-de-uma-rosa-vermelha-com-orvalho-em-cima-de-uma-preta_181624-28079.jpg?semt=ais_hybrid&w=740&q=80";
const SSD_IMAGE: &str = "https://palaciodasferramentas.com.br/media/catalog/product/R/R/RRIZEAAVYURDFOCJSQTF.jpg?optimize=high&bg-color=255,255,255&fit=bounds&height=600&width=600&canvas=600:600";

/// The twelve sample products the mock starts with
#[must_use]
pub fn seed_products() -> Vec<Product> {
    vec![
        seed(
            1,
            "Fjallraven - Foldsack No. 1 Backpack, Fits 15 Laptops",
            109.95,
            "Your perfect pack for everyday use and walks in the forest. Stash your laptop (up to 15 inches) in the padded sleeve, your everyday",
            "men's clothing",
            BOOK_IMAGE,
        ),
        seed(
            2,
            "Mens Casual Premium Slim Fit T-Shirts",
            22.3,
            "Slim-fitting style, contrast raglan long sleeve, three-button henley placket, light weight & soft fabric for breathable and comfortable wearing.",
            "men's clothing",
            BOOK_IMAGE,
        ),
        seed(
            3,
            "Mens Cotton Jacket",
            55.99,
            "Great outerwear jackets for Spring/Autumn/Winter, suitable for many occasions, such as working, hiking, camping, mountain/rock climbing, cycling, traveling or other outdoors.",
            "men's clothing",
            JACKET_IMAGE,
        ),
        seed(
            4,
            "Mens Casual Slim Fit",
            15.99,
            "The color could be slightly different between on the screen and in practice. / Please note that body builds vary by person, therefore, detailed size information should be reviewed below on the product description.",
            "men's clothing",
            JACKET_IMAGE,
        ),
        seed(
            5,
            "John Hardy Women's Legends Naga Gold & Silver Dragon Station Chain Bracelet",
            695.0,
            "From our Legends Collection, the Naga was inspired by the mythical water dragon that protects the ocean's pearl. Wear facing inward to be bestowed with love and abundance, or outward for protection.",
            "jewelery",
            "https://fakestoreapi.com/img/71pWzhdJNwL._AC_UL640_QL65_ML3_.jpg",
        ),
        seed(
            6,
            "Solid Gold Petite Micropave",
            168.0,
            "Satisfaction Guaranteed. Return or exchange any order within 30 days.Designed and sold by Hafeez Center in the United States.",
            "jewelery",
            JACKET_IMAGE,
        ),
        seed(
            7,
            "White Gold Plated Princess",
            9.99,
            "Classic Created Wedding Engagement Solitaire Diamond Promise Ring for Her. Gifts to spoil your love more for Engagement, Wedding, Anniversary, Valentine's Day...",
            "jewelery",
            ROSE_IMAGE,
        ),
        seed(
            8,
            "Pierced Owl Rose Gold Plated Stainless Steel Double",
            10.99,
            "Rose Gold Plated Double Flared Tunnel Plug Earrings. Made of 316L Stainless Steel",
            "jewelery",
            ROSE_IMAGE,
        ),
        seed(
            9,
            "WD 2TB Elements Portable External Hard Drive - USB 3.0",
            64.0,
            "USB 3.0 and USB 2.0 Compatibility Fast data transfers Improve PC Performance High Capacity; Compatibility Formatted NTFS for Windows 10, Windows 8.1, Windows 7; Reformatting may be required for other operating systems",
            "electronics",
            "https://fakestoreapi.com/img/61IBBVJvSDL._AC_SY879_.jpg",
        ),
        seed(
            10,
            "SanDisk SSD PLUS 1TB Internal SSD - SATA III 6 Gb/s",
            109.0,
            "Easy upgrade for faster boot up, shutdown, application load and response (As compared to 5400 RPM SATA 2.5\" hard drive; Based on published specifications and internal benchmarking tests using PCMark vantage scores)",
            "electronics",
            SSD_IMAGE,
        ),
        seed(
            11,
            "Silicon Power 256GB SSD 3D NAND A55 SLC Cache Performance Boost",
            109.0,
            "3D NAND flash are applied to deliver high transfer speeds Remarkable transfer speeds that enable faster bootup and improved overall system performance",
            "electronics",
            SSD_IMAGE,
        ),
        seed(
            12,
            "BIYLACLESEN Women's 3-in-1 Snowboard Jacket Winter Coats",
            56.99,
            "Note:The Jackets is US standard size, Please choose size as your usual wear Material: 100% Polyester; Detachable Liner Fabric: Warm Fleece.",
            "women's clothing",
            "https://fakestoreapi.com/img/51Y5NI-I5jL._AC_UX679_.jpg",
        ),
    ]
}
