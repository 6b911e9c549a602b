//! Read-through catalog with in-memory caching.
//!
//! Products and categories change rarely and are read on every cart render,
//! so lookups are cached for a short TTL.

mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use shopfront_core::{CategoryId, ProductId};

pub use cache::{CacheKey, CacheValue};

use crate::gateway::{Direction, Filter, Gateway, GatewayError};
use crate::models::{Category, Product};

/// Default cache TTL.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

const CACHE_CAPACITY: u64 = 1000;

/// Catalog reads through a [`Gateway`], cached with `moka`.
pub struct Catalog<G> {
    gateway: Arc<G>,
    cache: Cache<CacheKey, CacheValue>,
}

impl<G: Gateway> Catalog<G> {
    /// Create a catalog with the default cache TTL.
    #[must_use]
    pub fn new(gateway: Arc<G>) -> Self {
        Self::with_ttl(gateway, DEFAULT_CACHE_TTL)
    }

    /// Create a catalog whose cached entries expire after `ttl`.
    #[must_use]
    pub fn with_ttl(gateway: Arc<G>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        Self { gateway, cache }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, GatewayError> {
        let cache_key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.gateway.select_one(&Filter::by_id(id)).await?;

        self.cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// All products, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, GatewayError> {
        self.product_list(CacheKey::Products, Filter::new()).await
    }

    /// Products in one category, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn products_in_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, GatewayError> {
        self.product_list(
            CacheKey::CategoryProducts(category_id),
            Filter::new().eq("category_id", category_id),
        )
        .await
    }

    async fn product_list(
        &self,
        cache_key: CacheKey,
        filter: Filter,
    ) -> Result<Vec<Product>, GatewayError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&cache_key).await {
            debug!(count = products.len(), "Cache hit for product list");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .gateway
            .select(&filter.order_by("name", Direction::Asc))
            .await?;

        for product in &products {
            self.cache
                .insert(
                    CacheKey::Product(product.id),
                    CacheValue::Product(Box::new(product.clone())),
                )
                .await;
        }
        self.cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` if no category has this slug.
    #[instrument(skip(self))]
    pub async fn category_by_slug(&self, slug: &str) -> Result<Category, GatewayError> {
        let cache_key = CacheKey::Category(slug.to_owned());
        if let Some(CacheValue::Category(category)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(*category);
        }

        let category: Category = self
            .gateway
            .select_one(&Filter::new().eq("slug", slug))
            .await?;

        self.cache
            .insert(cache_key, CacheValue::Category(Box::new(category.clone())))
            .await;

        Ok(category)
    }

    /// All categories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, GatewayError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .gateway
            .select(&Filter::new().order_by("name", Direction::Asc))
            .await?;

        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// Drop every cached entry, e.g. after seeding or a price change.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        debug!("Catalog cache cleared");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::gateway::InMemoryGateway;
    use crate::models::{NewCategory, NewProduct, ProductPatch};

    fn draft(name: &str, price: i64, category_id: Option<CategoryId>) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: None,
            price: Decimal::new(price, 2),
            category_id,
            image_url: None,
            in_stock: true,
        }
    }

    #[tokio::test]
    async fn test_products_sorted_by_name() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.insert::<Product>(&draft("Zebra Mug", 1200, None)).await.unwrap();
        gateway.insert::<Product>(&draft("Apple Tee", 2500, None)).await.unwrap();

        let catalog = Catalog::new(gateway);
        let names: Vec<_> = catalog
            .products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Apple Tee", "Zebra Mug"]);
    }

    #[tokio::test]
    async fn test_product_is_cached_until_invalidated() {
        let gateway = Arc::new(InMemoryGateway::new());
        let product: Product = gateway.insert(&draft("Mug", 1200, None)).await.unwrap();
        let catalog = Catalog::new(Arc::clone(&gateway));

        assert_eq!(catalog.product(product.id).await.unwrap().price, Decimal::new(1200, 2));

        let patch = ProductPatch {
            price: Some(Decimal::new(900, 2)),
            ..ProductPatch::default()
        };
        gateway.update::<Product, _>(product.id, &patch).await.unwrap();
        assert_eq!(catalog.product(product.id).await.unwrap().price, Decimal::new(1200, 2));

        catalog.invalidate_all().await;
        assert_eq!(catalog.product(product.id).await.unwrap().price, Decimal::new(900, 2));
    }

    #[tokio::test]
    async fn test_products_in_category() {
        let gateway = Arc::new(InMemoryGateway::new());
        let mugs: Category = gateway
            .insert(&NewCategory {
                name: "Mugs".to_owned(),
                slug: "mugs".to_owned(),
            })
            .await
            .unwrap();
        gateway.insert::<Product>(&draft("Mug", 1200, Some(mugs.id))).await.unwrap();
        gateway.insert::<Product>(&draft("Tee", 2500, None)).await.unwrap();

        let catalog = Catalog::new(gateway);
        let category = catalog.category_by_slug("mugs").await.unwrap();
        let products = catalog.products_in_category(category.id).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Mug");
        assert_eq!(catalog.categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_product_not_found() {
        let catalog = Catalog::new(Arc::new(InMemoryGateway::new()));
        let err = catalog.product(ProductId::from_uuid(uuid::Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound));
    }
}
