use async_trait::async_trait;
use cinerama_core::{ApiResult, CatalogApi};
use cinerama_shared::{Movie, Product, Showing};
use uuid::Uuid;

use crate::http::HttpClient;

/// REST binding of the catalog reads the checkout flow depends on
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: HttpClient,
}

impl CatalogClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn get_showing(&self, showing_id: Uuid) -> ApiResult<Showing> {
        self.http.get(&format!("showings/{showing_id}")).await
    }

    async fn get_movie(&self, movie_id: Uuid) -> ApiResult<Movie> {
        self.http.get(&format!("movies/{movie_id}")).await
    }

    async fn list_products(&self) -> ApiResult<Vec<Product>> {
        let products: Vec<Product> = self.http.get("products?active=true").await?;
        // Some deployments ignore the query flag
        Ok(products.into_iter().filter(|p| p.active).collect())
    }
}
