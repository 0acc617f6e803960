//! Domain types for the products feature.
//!
//! A catalog is an ordered list of products owned by the backend. The client
//! keeps one [`ProductsState`] document and changes it only through
//! [`ProductsAction`]s.

use catalog_macros::Action;
use serde::{Deserialize, Serialize};

/// Server-assigned product identifier
pub type ProductId = u64;

/// A catalog record
///
/// Serialized with exactly these field names; the client passes records
/// through to the backend unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique, immutable, assigned by the backend
    pub id: ProductId,
    /// Display name
    pub title: String,
    /// Price, never negative
    pub price: f64,
    /// Long description
    pub description: String,
    /// Category label
    pub category: String,
    /// Image URL
    pub image: String,
}

impl Product {
    /// Builds a product from creation data and an assigned id
    #[must_use]
    pub fn from_new(id: ProductId, data: NewProduct) -> Self {
        Self {
            id,
            title: data.title,
            price: data.price,
            description: data.description,
            category: data.category,
            image: data.image,
        }
    }

    /// The record's fields without its id
    #[must_use]
    pub fn to_new(&self) -> NewProduct {
        NewProduct {
            title: self.title.clone(),
            price: self.price,
            description: self.description.clone(),
            category: self.category.clone(),
            image: self.image.clone(),
        }
    }
}

/// Creation payload: a product before the backend assigns its id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name
    pub title: String,
    /// Price, never negative
    pub price: f64,
    /// Long description
    pub description: String,
    /// Category label
    pub category: String,
    /// Image URL
    pub image: String,
}

/// The products document
///
/// `loading` is true exactly while a request is outstanding; `error` holds the
/// message of the last failure until the next request or `ClearError`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProductsState {
    /// Products in server order
    pub products: Vec<Product>,
    /// Product open in the detail/edit view
    pub selected_product: Option<Product>,
    /// Whether a request is outstanding
    pub loading: bool,
    /// Last failure message
    pub error: Option<String>,
}

impl ProductsState {
    /// Creates an empty document
    #[must_use]
    pub const fn new() -> Self {
        Self {
            products: Vec::new(),
            selected_product: None,
            loading: false,
            error: None,
        }
    }

    /// Returns the number of products
    #[must_use]
    pub fn count(&self) -> usize {
        self.products.len()
    }

    /// Returns a product by id
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

/// Every input to the products reducer
///
/// Each request is answered by exactly one success or failure action once
/// its effect runs. The remaining variants are UI intents handled
/// synchronously.
#[derive(Action, Clone, Debug, PartialEq)]
pub enum ProductsAction {
    // ========== Load ==========
    /// Fetch the whole catalog
    #[request]
    LoadProducts,

    /// Catalog fetched
    #[success]
    LoadProductsSuccess {
        /// Products in server order
        products: Vec<Product>,
    },

    /// Catalog fetch failed
    #[failure]
    LoadProductsFailure {
        /// Failure message
        error: String,
    },

    // ========== Create ==========
    /// Create a product
    #[request]
    CreateProduct {
        /// Creation payload
        product: NewProduct,
    },

    /// Product created
    #[success]
    CreateProductSuccess {
        /// The stored record with its assigned id
        product: Product,
    },

    /// Creation failed
    #[failure]
    CreateProductFailure {
        /// Failure message
        error: String,
    },

    // ========== Update ==========
    /// Replace the product with the given id
    #[request]
    UpdateProduct {
        /// Product to replace
        id: ProductId,
        /// Full replacement record
        product: Product,
    },

    /// Product replaced
    #[success]
    UpdateProductSuccess {
        /// The stored record
        product: Product,
    },

    /// Replacement failed
    #[failure]
    UpdateProductFailure {
        /// Failure message
        error: String,
    },

    // ========== Delete ==========
    /// Delete the product with the given id
    #[request]
    DeleteProduct {
        /// Product to delete
        id: ProductId,
    },

    /// Product deleted
    #[success]
    DeleteProductSuccess {
        /// Deleted product
        id: ProductId,
    },

    /// Deletion failed
    #[failure]
    DeleteProductFailure {
        /// Failure message
        error: String,
    },

    // ========== UI ==========
    /// Open (or close, with `None`) a product in the detail view
    SetSelectedProduct {
        /// Product to select
        product: Option<Product>,
    },

    /// Close the detail view
    ClearSelectedProduct,

    /// Dismiss the last error
    ClearError,
}

impl ProductsAction {
    /// Failure message carried by a failure action
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::LoadProductsFailure { error }
            | Self::CreateProductFailure { error }
            | Self::UpdateProductFailure { error }
            | Self::DeleteProductFailure { error } => Some(error),
            _ => None,
        }
    }
}
