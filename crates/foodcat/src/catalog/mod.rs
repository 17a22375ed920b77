use crate::config::{create_client, CatalogConfig};
use crate::prelude::{eprintln, *};
use colored::{ColoredString, Colorize};
use foodcat_core::api::{
    categories_url, interpret_lookup, product_url, search_url, Lookup, LookupResponse,
    SearchResponse,
};
use foodcat_core::product::{parse_categories, Category, GradeColor, ProductSummary};
use foodcat_core::session::SearchRequest;
use std::future::Future;
use std::time::Duration;

pub mod categories;
pub mod controller;
pub mod product;
pub mod search;

// Re-export public data functions
pub use categories::categories_data;
pub use product::product_data;
pub use search::search_data;

/// Transport failures and 5xx responses are retried once.
const MAX_ATTEMPTS: usize = 2;
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Access to the remote product database
///
/// The shell executes every session command through this trait, so the
/// controller can run against an in-memory catalog in tests.
pub trait CatalogApi {
    /// Fetch one page of product summaries
    fn search(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<Vec<ProductSummary>>> + Send;

    /// Look up a single product by barcode
    fn lookup(&self, barcode: &str) -> impl Future<Output = Result<Lookup>> + Send;

    /// Fetch the full category taxonomy, sorted by name
    fn categories(&self) -> impl Future<Output = Result<Vec<Category>>> + Send;
}

/// [`CatalogApi`] backed by the Open Food Facts HTTP API
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            base_url: config.base_url.clone(),
        })
    }

    /// Build a catalog client from the global CLI options
    pub fn from_global(global: &crate::Global) -> Result<Self> {
        let config = CatalogConfig::resolve(global)?;

        if global.verbose {
            eprintln!("Catalog API Base: {}", config.base_url);
        }

        Self::new(&config)
    }

    /// GET with a single retry on transport errors and server errors
    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let mut attempt = 1;

        loop {
            log::debug!("GET {url} (attempt {attempt})");

            match self.client.get(url).send().await {
                Ok(response) if response.status().is_server_error() && attempt < MAX_ATTEMPTS => {
                    log::warn!("GET {url} returned HTTP {}, retrying", response.status());
                }
                Ok(response) => return Ok(response),
                Err(e) if attempt < MAX_ATTEMPTS => {
                    log::warn!("GET {url} failed: {e}, retrying");
                }
                Err(e) => return Err(Error::Network(f!("Request to {} failed: {}", url, e)).into()),
            }

            attempt += 1;
            tokio::time::sleep(RETRY_DELAY).await;
        }
    }
}

impl CatalogApi for HttpCatalog {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<ProductSummary>> {
        let url = search_url(
            &self.base_url,
            request.page,
            &request.term,
            &request.category,
        );
        let response = self.get(&url).await?;

        if !response.status().is_success() {
            return Err(Error::Network(f!(
                "Failed to fetch search page {}: HTTP {}",
                request.page,
                response.status()
            ))
            .into());
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse search response: {}", e))?;

        log::debug!(
            "search page {} returned {} products",
            request.page,
            body.products.len()
        );

        Ok(body.products)
    }

    async fn lookup(&self, barcode: &str) -> Result<Lookup> {
        let url = product_url(&self.base_url, barcode);
        let response = self.get(&url).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }

        if !response.status().is_success() {
            return Err(Error::Network(f!(
                "Failed to fetch product {}: HTTP {}",
                barcode,
                response.status()
            ))
            .into());
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse product {}: {}", barcode, e))?;

        Ok(interpret_lookup(body))
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let url = categories_url(&self.base_url);
        let response = self.get(&url).await?;

        if !response.status().is_success() {
            return Err(Error::Network(f!(
                "Failed to fetch categories: HTTP {}",
                response.status()
            ))
            .into());
        }

        match response.json::<serde_json::Value>().await {
            Ok(value) => Ok(parse_categories(&value)),
            Err(e) => {
                log::warn!("Malformed category response, continuing without categories: {e}");
                Ok(Vec::new())
            }
        }
    }
}

/// Colour a grade letter for terminal output
pub fn paint_grade(grade: &str, color: GradeColor) -> ColoredString {
    let badge = f!(" {grade} ");
    match color {
        GradeColor::Green => badge.white().on_green(),
        GradeColor::Lime => badge.black().on_bright_green(),
        GradeColor::Yellow => badge.black().on_yellow(),
        GradeColor::Orange => badge.white().on_truecolor(249, 115, 22),
        GradeColor::Red => badge.white().on_red(),
    }
    .bold()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;
    use axum::{http::StatusCode, routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        f!("http://{addr}")
    }

    fn catalog(base_url: String) -> HttpCatalog {
        HttpCatalog::new(&CatalogConfig {
            base_url,
            timeout: Duration::from_secs(5),
            user_agent: "foodcat/test".to_string(),
        })
        .unwrap()
    }

    fn request(page: usize) -> SearchRequest {
        SearchRequest {
            generation: 1,
            page,
            term: "milk".to_string(),
            category: String::new(),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retried_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/cgi/search.pl",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        (StatusCode::INTERNAL_SERVER_ERROR, "boom")
                    } else {
                        (
                            StatusCode::OK,
                            r#"{"products":[{"product_name":"Milk","code":"1"}]}"#,
                        )
                    }
                }
            }),
        );
        let api = catalog(serve(router).await);

        let products = api.search(&request(1)).await.unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name.as_deref(), Some("Milk"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_repeated_server_error_surfaces_after_two_attempts() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/cgi/search.pl",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::SERVICE_UNAVAILABLE, "down")
                }
            }),
        );
        let api = catalog(serve(router).await);

        let err = api.search(&request(2)).await.unwrap_err();

        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Network(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/api/v0/product/4000.json",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::BAD_REQUEST, "bad request")
                }
            }),
        );
        let api = catalog(serve(router).await);

        let err = api.lookup("4000").await.unwrap_err();

        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Network(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let router = Router::new().route(
            "/api/v0/product/0000.json",
            get(|| async { (StatusCode::NOT_FOUND, "no such product") }),
        );
        let api = catalog(serve(router).await);

        assert_eq!(api.lookup("0000").await.unwrap(), Lookup::NotFound);
    }

    #[tokio::test]
    async fn test_lookup_found() {
        let router = Router::new().route(
            "/api/v0/product/3017620422003.json",
            get(|| async {
                r#"{"status":1,"product":{"product_name":"Nutella","code":"3017620422003"}}"#
            }),
        );
        let api = catalog(serve(router).await);

        match api.lookup("3017620422003").await.unwrap() {
            Lookup::Found(detail) => {
                assert_eq!(detail.summary.name.as_deref(), Some("Nutella"))
            }
            Lookup::NotFound => panic!("expected a product"),
        }
    }

    #[tokio::test]
    async fn test_malformed_categories_degrade_to_empty() {
        let router = Router::new().route(
            "/categories.json",
            get(|| async { "<html>maintenance</html>" }),
        );
        let api = catalog(serve(router).await);

        assert!(api.categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_categories_are_sorted_by_name() {
        let router = Router::new().route(
            "/categories.json",
            get(|| async {
                r#"{"tags":[{"id":"en:teas","name":"Teas"},{"id":"en:beers","name":"Beers"}]}"#
            }),
        );
        let api = catalog(serve(router).await);

        let names: Vec<String> = api
            .categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(names, vec!["Beers", "Teas"]);
    }
}
