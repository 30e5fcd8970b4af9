use std::{
    convert::Infallible,
    str::FromStr,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures_util::future::{ready, Ready};
use http::{header, HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::Full;
use tower_service::Service;
use url::Url;

use crate::{
    error::ValidationError,
    key::Key,
    options::{Crop, Dimension, Trim, TransformationOptions},
    signed::UrlBuilder,
};

const DEFAULT_SERVER: &str = "http://localhost:8888/";

const CROP_PARAMS: [&str; 4] = ["crop_left", "crop_top", "crop_right", "crop_bottom"];

/// Reasons a URL generation request is rejected.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryError {
    /// A dimension is neither a number nor `orig`.
    #[error("The {name} value '{value}' is not an integer.")]
    NotAnInteger {
        /// Query parameter name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },

    /// A dimension is a negative number.
    #[error("The {name} value '{value}' must not be negative.")]
    Negative {
        /// Query parameter name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },

    /// A flag is not one of `true`, `false`, `1`, `0`, `yes`, `no`, `on`, `off`.
    #[error("The {name} value '{value}' is not a boolean.")]
    NotABoolean {
        /// Query parameter name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },

    /// The tolerance part of `trim` is not a number.
    #[error("The trim tolerance '{0}' is not an integer.")]
    InvalidTrimTolerance(String),

    /// Some, but not all, crop bounds were given.
    #[error(
        "Missing values for cropping. Expected all 'crop_left', 'crop_top', 'crop_right', \
         'crop_bottom' values."
    )]
    MissingCrop,

    /// A crop bound is not a non-negative integer.
    #[error(
        "Invalid values for cropping. Expected all 'crop_left', 'crop_top', 'crop_right', \
         'crop_bottom' to be integers."
    )]
    InvalidCrop,

    /// The assembled options are invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// `tower` service answering `GET` requests with a generated thumbor URL.
///
/// Options are read from the query string, e.g.
/// `?image_url=my.server.com/a.jpg&width=300&height=200&smart=true`. The
/// response body is the configured server followed by the generated URL.
#[derive(Debug, Clone)]
pub struct UrlGenerator {
    builder: UrlBuilder,
    server: String,
}

/// Builder for [`UrlGenerator`].
#[derive(Debug)]
pub struct UrlGeneratorBuilder {
    key: Key,
    server: Option<Url>,
}

impl UrlGeneratorBuilder {
    /// Create a new [`UrlGeneratorBuilder`] with the provided [`Key`].
    pub fn new(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            server: None,
        }
    }

    /// Configure the thumbor server generated URLs point at.
    ///
    /// Defaults to `http://localhost:8888/`.
    pub fn set_server(self, server: Url) -> Self {
        Self {
            server: Some(server),
            ..self
        }
    }

    /// Build the [`UrlGenerator`].
    pub fn build(self) -> UrlGenerator {
        let mut server = self
            .server
            .map(String::from)
            .unwrap_or_else(|| DEFAULT_SERVER.to_owned());
        if !server.ends_with('/') {
            server.push('/');
        }

        UrlGenerator {
            builder: UrlBuilder::new(self.key),
            server,
        }
    }
}

impl<ReqBody> Service<Request<ReqBody>> for UrlGenerator {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if req.method() != Method::GET {
            tracing::warn!(method = %req.method(), "method not allowed");
            let mut res = text_response(StatusCode::METHOD_NOT_ALLOWED, String::new());
            res.headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET"));
            return ready(Ok(res));
        }

        let query = req.uri().query().unwrap_or_default();
        let generated = options_from_query(query).and_then(|options| {
            self.builder
                .generate(&options)
                .map_err(QueryError::Validation)
        });

        let res = match generated {
            Ok(url) => {
                let body = format!("{}{}", self.server, url.trim_matches('/'));
                text_response(StatusCode::OK, body)
            }

            Err(err) => {
                tracing::warn!(err = %err, "could not generate url");
                text_response(StatusCode::BAD_REQUEST, err.to_string())
            }
        };

        ready(Ok(res))
    }
}

fn text_response(status_code: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut res = Response::new(Full::from(Bytes::from(body)));
    *res.status_mut() = status_code;
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    res
}

/// Assemble options from a URL generation query string.
pub fn options_from_query(query: &str) -> Result<TransformationOptions, QueryError> {
    let params: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    let param = |name: &str| {
        params
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    let image_url = param("image_url").ok_or(ValidationError::MissingImageUrl)?;
    let mut options = TransformationOptions::new(image_url);

    if let Some(width) = param("width") {
        options.width = parse_dimension("width", width)?;
    }
    if let Some(height) = param("height") {
        options.height = parse_dimension("height", height)?;
    }

    if CROP_PARAMS.iter().any(|name| param(name).is_some()) {
        let mut bounds = [0; 4];
        for (bound, name) in bounds.iter_mut().zip(CROP_PARAMS) {
            let value = param(name).ok_or(QueryError::MissingCrop)?;
            *bound = value.parse().map_err(|_| QueryError::InvalidCrop)?;
        }
        let [left, top, right, bottom] = bounds;
        options.crop = Crop::new(left, top, right, bottom);
    }

    if let Some(halign) = param("halign") {
        options.halign = halign.parse()?;
    }
    if let Some(valign) = param("valign") {
        options.valign = valign.parse()?;
    }

    options.smart = parse_flag("smart", param("smart"))?;
    options.meta = parse_flag("meta", param("meta"))?;
    options.horizontal_flip = parse_flag("flip", param("flip"))?;
    options.vertical_flip = parse_flag("flop", param("flop"))?;
    options.unsafe_url = parse_flag("unsafe", param("unsafe"))?;

    if parse_flag("fit_in", param("fit_in"))? {
        options = options.fit_in();
    }
    if parse_flag("full_fit_in", param("full_fit_in"))? {
        options = options.full_fit_in();
    }
    if parse_flag("adaptive_fit_in", param("adaptive_fit_in"))? {
        options = options.adaptive_fit_in();
    }
    if parse_flag("adaptive_full_fit_in", param("adaptive_full_fit_in"))? {
        options = options.adaptive_full_fit_in();
    }

    if let Some(trim) = param("trim") {
        options.trim = parse_trim(trim)?;
    }

    options = options.filters(
        params
            .iter()
            .filter(|(key, value)| key == "filters" && !value.is_empty())
            .map(|(_, value)| value.as_str()),
    );

    Ok(options)
}

fn parse_dimension(name: &'static str, value: &str) -> Result<Dimension, QueryError> {
    Dimension::from_str(value).map_err(|_| {
        if value.parse::<i64>().is_ok() {
            QueryError::Negative {
                name,
                value: value.to_owned(),
            }
        } else {
            QueryError::NotAnInteger {
                name,
                value: value.to_owned(),
            }
        }
    })
}

fn parse_flag(name: &'static str, value: Option<&str>) -> Result<bool, QueryError> {
    let Some(value) = value else {
        return Ok(false);
    };

    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(QueryError::NotABoolean {
            name,
            value: value.to_owned(),
        }),
    }
}

// `trim=true` enables plain trimming; anything else is `<position>[:<tolerance>]`
// with either part allowed to be empty.
fn parse_trim(value: &str) -> Result<Option<Trim>, QueryError> {
    if let Ok(enabled) = parse_flag("trim", Some(value)) {
        return Ok(enabled.then_some(Trim::Enabled));
    }

    let (position, tolerance) = value.split_once(':').unwrap_or((value, ""));
    let position = match position {
        "" => None,
        position => Some(position.parse()?),
    };
    let tolerance = match tolerance {
        "" => None,
        tolerance => Some(
            tolerance
                .parse()
                .map_err(|_| QueryError::InvalidTrimTolerance(tolerance.to_owned()))?,
        ),
    };

    Ok(Some(Trim::Anchored {
        position,
        tolerance,
    }))
}
