//! # Overview
//!
//! This crate builds thumbor image URLs: it encodes a set of
//! [`TransformationOptions`] into the one canonical path thumbor understands,
//! signs that path with HMAC-SHA1, and decodes paths back into options.
//!
//! ```rust
//! use tower_thumbor_url::{path, TransformationOptions, UrlBuilder};
//!
//! let builder = UrlBuilder::new("my-security-key");
//! let options = TransformationOptions::new("my.server.com/some/path/to/image.jpg")
//!     .width(300)
//!     .height(200);
//!
//! let url = builder.generate(&options)?;
//! assert_eq!(
//!     url,
//!     "/8ammJH8D-7tXy6kU3lTvoXlhu4o=/300x200/my.server.com/some/path/to/image.jpg"
//! );
//! assert!(builder.validate(&url));
//!
//! let decoded = path::parse("300x200/my.server.com/some/path/to/image.jpg");
//! assert_eq!(decoded, Some(options));
//! # Ok::<(), tower_thumbor_url::ValidationError>(())
//! ```
//!
//! # Usage with an `axum` application
//!
//! [`UrlGenerator`] is a `tower` service that generates URLs from query
//! parameters, for clients that must not hold the key themselves.
//!
//! ```rust,no_run
//! use std::net::SocketAddr;
//!
//! use axum::{routing::get_service, Router};
//! use tower::ServiceBuilder;
//! use tower_thumbor_url::UrlGeneratorBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let url_generator = UrlGeneratorBuilder::new("my-security-key")
//!         .set_server("http://localhost:8888/".parse()?)
//!         .build();
//!
//!     // GET /gen_url?image_url=my.server.com/image.jpg&width=300&height=200
//!     let url_generator_service = get_service(ServiceBuilder::new().service(url_generator));
//!     let app = Router::new().nest_service("/gen_url", url_generator_service);
//!
//!     let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
//!     let listener = tokio::net::TcpListener::bind(&addr).await?;
//!     axum::serve(listener, app.into_make_service()).await?;
//!
//!     Ok(())
//! }
//! ```
#![warn(
    clippy::all,
    nonstandard_style,
    future_incompatible,
    missing_docs,
    missing_debug_implementations
)]
#![forbid(unsafe_code)]

mod error;
mod key;
mod options;
pub mod path;
mod service;
mod signed;

pub use error::ValidationError;
pub use key::Key;
pub use options::{
    Crop, Dimension, FitIn, HorizontalAlignment, TransformationOptions, Trim, TrimPosition,
    VerticalAlignment,
};
pub use service::{options_from_query, QueryError, UrlGenerator, UrlGeneratorBuilder};
pub use signed::{Signer, UrlBuilder};
