//! Canonical path encoding of [`TransformationOptions`].
//!
//! A path is a `/`-joined list of optional segments in a fixed order, followed
//! by the image locator:
//!
//! ```text
//! [debug/][meta/][trim/][crop/][fit-in/][dimensions/][halign/][valign/][smart/][filters/]image
//! ```
//!
//! Segments holding default values are never written, so every set of options
//! has exactly one path. That path is what gets signed.
use std::{borrow::Cow, sync::OnceLock};

use regex::{Captures, Regex};

use crate::{
    error::ValidationError,
    options::{
        Crop, Dimension, FitIn, HorizontalAlignment, Trim, TransformationOptions, TrimPosition,
        VerticalAlignment,
    },
};

// Segment order matters: later segments rely on earlier ones having consumed
// their trailing slash.
const OPTIONS_PATTERN: &str = concat!(
    r"(?:(?P<debug>debug)/)?",
    r"(?:(?P<meta>meta)/)?",
    r"(?:(?P<trim>trim",
    r"(?P<trim_anchor>:(?P<trim_position>top-left|bottom-right)?)?",
    r"(?::(?P<trim_tolerance>[0-9]+))?",
    r")/)?",
    r"(?:(?P<crop_left>[0-9]+)x(?P<crop_top>[0-9]+):",
    r"(?P<crop_right>[0-9]+)x(?P<crop_bottom>[0-9]+)/)?",
    r"(?:(?P<adaptive>adaptive-)?(?P<full>full-)?(?P<fit_in>fit-in)/)?",
    r"(?:(?P<horizontal_flip>-)?(?P<width>[0-9]+|orig)?",
    r"x(?P<vertical_flip>-)?(?P<height>[0-9]+|orig)?/)?",
    r"(?:(?P<halign>left|right|center)/)?",
    r"(?:(?P<valign>top|bottom|middle)/)?",
    r"(?:(?P<smart>smart)/)?",
    r"(?:filters:(?P<filters>.+?\))/)?",
    r"(?P<image>[^/].*)",
);

// A signature is the padded URL-safe Base64 of a 20-byte HMAC-SHA1 digest.
const URL_PREFIX_PATTERN: &str = r"(?:(?P<unsafe>unsafe)|(?P<signature>[A-Za-z0-9_-]{27}=))/";

static PATH_PATTERN: OnceLock<Regex> = OnceLock::new();
static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn path_pattern() -> &'static Regex {
    PATH_PATTERN.get_or_init(|| {
        Regex::new(&format!("^/?{OPTIONS_PATTERN}$")).expect("path pattern must compile")
    })
}

fn url_pattern() -> &'static Regex {
    URL_PATTERN.get_or_init(|| {
        Regex::new(&format!("^/?{URL_PREFIX_PATTERN}{OPTIONS_PATTERN}$"))
            .expect("url pattern must compile")
    })
}

/// Serialize options into their canonical, unsigned path.
///
/// The result has no leading slash and ends with the image locator.
///
/// # Errors
///
/// Fails when the image locator is empty, or when a fit-in mode is requested
/// without a width or height.
///
/// # Example
///
/// ```rust
/// use tower_thumbor_url::{path, TransformationOptions};
///
/// let options = TransformationOptions::new("/my.server.com/image.jpg")
///     .width(300)
///     .height(200)
///     .fit_in();
///
/// assert_eq!(path::serialize(&options)?, "fit-in/300x200/my.server.com/image.jpg");
///
/// let invalid = TransformationOptions::new("my.server.com/image.jpg").fit_in();
/// assert!(path::serialize(&invalid).is_err());
/// # Ok::<(), tower_thumbor_url::ValidationError>(())
/// ```
pub fn serialize(options: &TransformationOptions) -> Result<String, ValidationError> {
    let image = options.image_locator();
    if image.is_empty() {
        return Err(ValidationError::MissingImageUrl);
    }

    let mut segments: Vec<Cow<'_, str>> = Vec::new();

    if options.meta {
        segments.push("meta".into());
    }

    if let Some(trim) = &options.trim {
        segments.push(trim.to_string().into());
    }

    if !options.crop.is_empty() {
        segments.push(options.crop.to_string().into());
    }

    let has_dimensions = options.width.is_set() || options.height.is_set();
    if let Some(fit_in) = &options.fit_in {
        if !has_dimensions {
            return Err(ValidationError::FitInWithoutDimensions);
        }
        segments.push(fit_in.to_string().into());
    }

    if has_dimensions || options.horizontal_flip || options.vertical_flip {
        segments.push(
            format!(
                "{}x{}",
                flipped(options.width, options.horizontal_flip, has_dimensions),
                flipped(options.height, options.vertical_flip, has_dimensions)
            )
            .into(),
        );
    }

    if options.halign != HorizontalAlignment::Center {
        segments.push(options.halign.as_str().into());
    }

    if options.valign != VerticalAlignment::Middle {
        segments.push(options.valign.as_str().into());
    }

    if options.smart {
        segments.push("smart".into());
    }

    if !options.filters.is_empty() {
        segments.push(format!("filters:{}", options.filters.join(":")).into());
    }

    segments.push(image.into());

    Ok(segments.join("/"))
}

// A flipped zero stays `0` while the other axis is set; `-0` only appears
// when neither dimension is.
fn flipped(dimension: Dimension, flip: bool, has_dimensions: bool) -> String {
    if flip && (dimension.is_set() || !has_dimensions) {
        format!("-{dimension}")
    } else {
        dimension.to_string()
    }
}

/// Parse an unsigned path back into options.
///
/// Absent segments take their default values. Returns `None` when `path` does
/// not follow the grammar, including numbers too large for a `u32`.
///
/// # Example
///
/// ```rust
/// use tower_thumbor_url::{path, Dimension};
///
/// let options = path::parse("-300x200/smart/my.server.com/image.jpg").unwrap();
/// assert_eq!(options.width, Dimension::Pixels(300));
/// assert!(options.horizontal_flip);
/// assert!(options.smart);
/// assert_eq!(options.image_url, "my.server.com/image.jpg");
///
/// assert!(path::parse("").is_none());
/// ```
pub fn parse(path: &str) -> Option<TransformationOptions> {
    let Some(captures) = path_pattern().captures(path) else {
        tracing::debug!("path does not follow the thumbor grammar");
        return None;
    };

    options_from_captures(&captures)
}

/// An externally visible URL, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    /// The signature segment; `None` for `unsafe/` URLs.
    pub signature: Option<String>,

    /// The unsigned path following the signature or `unsafe` marker.
    pub path: String,

    /// Decoded options. `unsafe_url` reflects the marker.
    pub options: TransformationOptions,
}

/// Parse a signed (`/<signature>/<path>`) or unsafe (`unsafe/<path>`) URL.
///
/// The signature is not checked; see [`Signer::verify`](crate::Signer::verify).
///
/// # Example
///
/// ```rust
/// use tower_thumbor_url::path;
///
/// let url = "/8ammJH8D-7tXy6kU3lTvoXlhu4o=/300x200/my.server.com/some/path/to/image.jpg";
/// let parsed = path::parse_url(url).unwrap();
///
/// assert_eq!(parsed.signature.as_deref(), Some("8ammJH8D-7tXy6kU3lTvoXlhu4o="));
/// assert_eq!(parsed.path, "300x200/my.server.com/some/path/to/image.jpg");
/// assert!(!parsed.options.unsafe_url);
/// ```
pub fn parse_url(url: &str) -> Option<ParsedUrl> {
    let Some(captures) = url_pattern().captures(url) else {
        tracing::debug!("url does not follow the thumbor grammar");
        return None;
    };

    let (prefix, signature) = match (captures.name("unsafe"), captures.name("signature")) {
        (Some(marker), _) => (marker, None),
        (None, Some(signature)) => (signature, Some(signature.as_str().to_owned())),
        (None, None) => return None,
    };
    let path = url.get(prefix.end() + 1..)?.to_owned();

    let mut options = options_from_captures(&captures)?;
    options.unsafe_url = signature.is_none();

    Some(ParsedUrl {
        signature,
        path,
        options,
    })
}

fn options_from_captures(captures: &Captures<'_>) -> Option<TransformationOptions> {
    let present = |name: &str| captures.name(name).is_some();

    let trim = if present("trim") {
        let tolerance = captures
            .name("trim_tolerance")
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .ok()?;
        if !present("trim_anchor") && tolerance.is_none() {
            Some(Trim::Enabled)
        } else {
            let position = captures
                .name("trim_position")
                .map(|m| m.as_str().parse::<TrimPosition>())
                .transpose()
                .ok()?;
            Some(Trim::Anchored {
                position,
                // A zero tolerance is never written, so it reads back as absent.
                tolerance: tolerance.filter(|&tolerance| tolerance != 0),
            })
        }
    } else {
        None
    };

    let crop = Crop::new(
        number_or_zero(captures, "crop_left")?,
        number_or_zero(captures, "crop_top")?,
        number_or_zero(captures, "crop_right")?,
        number_or_zero(captures, "crop_bottom")?,
    );

    let fit_in = present("fit_in").then(|| FitIn {
        adaptive: present("adaptive"),
        full: present("full"),
    });

    let halign = captures
        .name("halign")
        .map_or(Ok(HorizontalAlignment::Center), |m| m.as_str().parse())
        .ok()?;
    let valign = captures
        .name("valign")
        .map_or(Ok(VerticalAlignment::Middle), |m| m.as_str().parse())
        .ok()?;

    let filters = captures
        .name("filters")
        .map(|m| split_filters(m.as_str()))
        .unwrap_or_default();

    Some(TransformationOptions {
        image_url: captures.name("image")?.as_str().to_owned(),
        width: dimension(captures, "width")?,
        height: dimension(captures, "height")?,
        horizontal_flip: present("horizontal_flip"),
        vertical_flip: present("vertical_flip"),
        halign,
        valign,
        smart: present("smart"),
        meta: present("meta"),
        debug: present("debug"),
        trim,
        crop,
        fit_in,
        filters,
        unsafe_url: false,
    })
}

fn number_or_zero(captures: &Captures<'_>, name: &str) -> Option<u32> {
    captures
        .name(name)
        .map_or(Some(0), |m| m.as_str().parse().ok())
}

fn dimension(captures: &Captures<'_>, name: &str) -> Option<Dimension> {
    captures
        .name(name)
        .map_or(Some(Dimension::UNSET), |m| m.as_str().parse().ok())
}

// Filter arguments may themselves contain `:`, e.g. a watermark URL, so only
// split outside parentheses.
fn split_filters(filters: &str) -> Vec<String> {
    let mut split = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, c) in filters.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => {
                split.push(filters[start..index].to_owned());
                start = index + 1;
            }
            _ => {}
        }
    }
    split.push(filters[start..].to_owned());

    split
}
