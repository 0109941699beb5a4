//! Log in against a running storefront API and list the first page of products.
//!
//!     STOREFRONT_BASE_URL=http://127.0.0.1:8000 STOREFRONT_LOG_HTTP=true \
//!     DEMO_EMAIL=shop@example.com DEMO_PASSWORD=secret cargo run --example login
use storefront_client::service::{AuthLoginIn, ProductQuery, Role};
use storefront_client::{ApiClient, ClientConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storefront_client=debug")))
        .init();

    let config = ClientConfig::load(None).unwrap();
    let api = ApiClient::builder().config(config).build().unwrap();

    let login = AuthLoginIn {
        email: std::env::var("DEMO_EMAIL").unwrap(),
        password: std::env::var("DEMO_PASSWORD").unwrap(),
        role: Role::Merchant,
    };
    api.auth().login(&login).await.unwrap();

    let page = api
        .products()
        .list(&ProductQuery {
            page: Some(1),
            page_size: Some(10),
            ..ProductQuery::default()
        })
        .await
        .unwrap();
    println!("{} products", page.total);
    for product in page.items {
        println!("{:>8}  {:<32} {:>8.2}  {:?}", product.id, product.name, product.price, product.status);
    }
}
