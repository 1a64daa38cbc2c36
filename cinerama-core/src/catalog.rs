use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use cinerama_shared::{Movie, Product, Showing};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Read access to the movie/showtime/product catalog. Plain CRUD owned by
/// the backend; the checkout flow only ever reads it.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn get_showing(&self, showing_id: Uuid) -> ApiResult<Showing>;

    async fn get_movie(&self, movie_id: Uuid) -> ApiResult<Movie>;

    /// Active products only; inactive entries never reach the cart
    async fn list_products(&self) -> ApiResult<Vec<Product>>;
}

/// Catalog stand-in for tests and local runs
pub struct InMemoryCatalog {
    showings: Mutex<HashMap<Uuid, Showing>>,
    movies: Mutex<HashMap<Uuid, Movie>>,
    products: Mutex<Vec<Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            showings: Mutex::new(HashMap::new()),
            movies: Mutex::new(HashMap::new()),
            products: Mutex::new(Vec::new()),
        }
    }

    pub fn insert_showing(&self, showing: Showing) {
        self.showings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(showing.id, showing);
    }

    pub fn insert_movie(&self, movie: Movie) {
        self.movies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(movie.id, movie);
    }

    pub fn insert_product(&self, product: Product) {
        self.products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(product);
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogApi for InMemoryCatalog {
    async fn get_showing(&self, showing_id: Uuid) -> ApiResult<Showing> {
        self.showings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&showing_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("showing {showing_id}")))
    }

    async fn get_movie(&self, movie_id: Uuid) -> ApiResult<Movie> {
        self.movies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("movie {movie_id}")))
    }

    async fn list_products(&self) -> ApiResult<Vec<Product>> {
        Ok(self
            .products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|p| p.active)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inactive_products_are_filtered() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_product(Product {
            id: Uuid::new_v4(),
            name: "Popcorn".to_string(),
            price_cents: 850,
            image_url: None,
            active: true,
        });
        catalog.insert_product(Product {
            id: Uuid::new_v4(),
            name: "Discontinued combo".to_string(),
            price_cents: 1200,
            image_url: None,
            active: false,
        });

        let products = catalog.list_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Popcorn");
    }
}
