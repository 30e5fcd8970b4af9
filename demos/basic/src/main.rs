use std::net::SocketAddr;

use axum::{routing::get_service, Router};
use tower::ServiceBuilder;
use tower_thumbor_url::{TransformationOptions, UrlBuilder, UrlGeneratorBuilder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

const DEFAULT_SECURITY_KEY: &str = "my-security-key";
const DEFAULT_SERVER: &str = "http://localhost:8888/";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(
            |_| "demo_basic=debug,tower_thumbor_url=debug".into(),
        )))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    // Configuration, named after thumbor's own settings.
    let security_key =
        std::env::var("THUMBOR_SECURITY_KEY").unwrap_or_else(|_| DEFAULT_SECURITY_KEY.into());
    let server: Url = std::env::var("THUMBOR_SERVER")
        .unwrap_or_else(|_| DEFAULT_SERVER.into())
        .parse()?;

    // URL construction.
    let options = TransformationOptions::new("www.rustacean.net/assets/rustacean-orig-noshadow.png")
        .width(150)
        .height(100)
        .smart(true);
    let signed_url = UrlBuilder::new(security_key.as_str()).generate(&options)?;
    tracing::info!(%signed_url, "Signed path for the thumbor server");

    // Service set up.
    let url_generator = UrlGeneratorBuilder::new(security_key)
        .set_server(server)
        .build();

    // Nest service within an Axum app at `/gen_url` path.
    let url_generator_service = get_service(ServiceBuilder::new().service(url_generator));
    let app = Router::new().nest_service("/gen_url", url_generator_service);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!(%addr, "Try /gen_url?image_url=my.server.com/image.jpg&width=300&height=200");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
