//! Typed description of a thumbor transformation.
//!
//! [`TransformationOptions`] is what gets serialized into a canonical path by
//! [`path::serialize`](crate::path::serialize) and what
//! [`path::parse`](crate::path::parse) reconstructs from one.
use std::{fmt, str::FromStr};

use crate::error::ValidationError;

/// A resize dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// Exact pixel count; zero means "not specified".
    Pixels(u32),

    /// Keep the original size of the source image on this axis.
    Orig,
}

impl Dimension {
    /// Unset dimensions are a zero pixel count.
    pub const UNSET: Dimension = Dimension::Pixels(0);

    /// Whether this dimension carries information, i.e. is `orig` or
    /// non-zero.
    pub const fn is_set(&self) -> bool {
        !matches!(self, Dimension::Pixels(0))
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::UNSET
    }
}

impl From<u32> for Dimension {
    fn from(pixels: u32) -> Self {
        Dimension::Pixels(pixels)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Pixels(pixels) => write!(f, "{pixels}"),
            Dimension::Orig => f.write_str("orig"),
        }
    }
}

impl FromStr for Dimension {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "orig" {
            return Ok(Dimension::Orig);
        }
        s.parse().map(Dimension::Pixels)
    }
}

/// Horizontal anchor used when cropping to the requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlignment {
    /// `left`
    Left,
    /// `center`
    #[default]
    Center,
    /// `right`
    Right,
}

impl HorizontalAlignment {
    /// Path token for this alignment.
    pub const fn as_str(&self) -> &'static str {
        match self {
            HorizontalAlignment::Left => "left",
            HorizontalAlignment::Center => "center",
            HorizontalAlignment::Right => "right",
        }
    }
}

impl FromStr for HorizontalAlignment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(HorizontalAlignment::Left),
            "center" => Ok(HorizontalAlignment::Center),
            "right" => Ok(HorizontalAlignment::Right),
            _ => Err(ValidationError::InvalidHorizontalAlignment(s.to_owned())),
        }
    }
}

impl fmt::Display for HorizontalAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vertical anchor used when cropping to the requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlignment {
    /// `top`
    Top,
    /// `middle`
    #[default]
    Middle,
    /// `bottom`
    Bottom,
}

impl VerticalAlignment {
    /// Path token for this alignment.
    pub const fn as_str(&self) -> &'static str {
        match self {
            VerticalAlignment::Top => "top",
            VerticalAlignment::Middle => "middle",
            VerticalAlignment::Bottom => "bottom",
        }
    }
}

impl FromStr for VerticalAlignment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(VerticalAlignment::Top),
            "middle" => Ok(VerticalAlignment::Middle),
            "bottom" => Ok(VerticalAlignment::Bottom),
            _ => Err(ValidationError::InvalidVerticalAlignment(s.to_owned())),
        }
    }
}

impl fmt::Display for VerticalAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Corner whose pixel color is used as the border color to trim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimPosition {
    /// `top-left`
    TopLeft,
    /// `bottom-right`
    BottomRight,
}

impl TrimPosition {
    /// Path token for this position.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TrimPosition::TopLeft => "top-left",
            TrimPosition::BottomRight => "bottom-right",
        }
    }
}

impl FromStr for TrimPosition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top-left" => Ok(TrimPosition::TopLeft),
            "bottom-right" => Ok(TrimPosition::BottomRight),
            _ => Err(ValidationError::InvalidTrimPosition(s.to_owned())),
        }
    }
}

impl fmt::Display for TrimPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Removal of uniformly colored borders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trim {
    /// Plain `trim`, with the server's default anchor and no tolerance.
    Enabled,

    /// `trim:<position>[:<tolerance>]`; either part may be left out.
    Anchored {
        /// Corner to sample; rendered as an empty string when absent.
        position: Option<TrimPosition>,
        /// Color distance still considered part of the border.
        tolerance: Option<u32>,
    },
}

impl fmt::Display for Trim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trim::Enabled => f.write_str("trim"),
            Trim::Anchored {
                position,
                tolerance,
            } => {
                f.write_str("trim:")?;
                if let Some(position) = position {
                    f.write_str(position.as_str())?;
                }
                if let Some(tolerance) = tolerance.filter(|&tolerance| tolerance != 0) {
                    write!(f, ":{tolerance}")?;
                }
                Ok(())
            }
        }
    }
}

/// Manual crop rectangle, in source image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Crop {
    /// Left edge.
    pub left: u32,
    /// Top edge.
    pub top: u32,
    /// Right edge.
    pub right: u32,
    /// Bottom edge.
    pub bottom: u32,
}

impl Crop {
    /// Create a crop rectangle from its top-left and bottom-right corners.
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// An all-zero rectangle means "no crop".
    pub const fn is_empty(&self) -> bool {
        self.left == 0 && self.top == 0 && self.right == 0 && self.bottom == 0
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}:{}x{}",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Fit-in resize mode and its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FitIn {
    /// Swap the bounds when that suits the image orientation better.
    pub adaptive: bool,
    /// Fill the bounds on the smaller axis instead of the larger one.
    pub full: bool,
}

impl fmt::Display for FitIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.adaptive {
            f.write_str("adaptive-")?;
        }
        if self.full {
            f.write_str("full-")?;
        }
        f.write_str("fit-in")
    }
}

/// Everything that describes a single thumbor transformation.
///
/// Built with [`TransformationOptions::new`] and the chainable setters;
/// unspecified fields keep their defaults, which are never encoded.
///
/// # Example
///
/// ```rust
/// use tower_thumbor_url::{path, Crop, HorizontalAlignment, TransformationOptions};
///
/// let options = TransformationOptions::new("my.server.com/some/path/to/image.jpg")
///     .width(300)
///     .height(200)
///     .crop(Crop::new(10, 10, 200, 200))
///     .halign(HorizontalAlignment::Left)
///     .smart(true);
///
/// assert_eq!(
///     path::serialize(&options)?,
///     "10x10:200x200/300x200/left/smart/my.server.com/some/path/to/image.jpg"
/// );
/// # Ok::<(), tower_thumbor_url::ValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct TransformationOptions {
    /// Locator of the source image, as given.
    pub image_url: String,
    /// Target width.
    pub width: Dimension,
    /// Target height.
    pub height: Dimension,
    /// Mirror along the vertical axis (`flip`).
    pub horizontal_flip: bool,
    /// Mirror along the horizontal axis (`flop`).
    pub vertical_flip: bool,
    /// Horizontal crop anchor.
    pub halign: HorizontalAlignment,
    /// Vertical crop anchor.
    pub valign: VerticalAlignment,
    /// Use focal point detection instead of the alignments.
    pub smart: bool,
    /// Ask for the JSON metadata of the operation instead of the image.
    pub meta: bool,
    /// Only ever set by parsing a path that carries the `debug` marker.
    pub debug: bool,
    /// Border trimming.
    pub trim: Option<Trim>,
    /// Manual crop, applied before resizing.
    pub crop: Crop,
    /// Fit-in resize mode.
    pub fit_in: Option<FitIn>,
    /// Filter expressions such as `brightness(20)`, in application order.
    pub filters: Vec<String>,
    /// Produce an `unsafe/` URL instead of a signed one.
    pub unsafe_url: bool,
}

impl TransformationOptions {
    /// Options for `image_url` with every transformation left at its default.
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            width: Dimension::UNSET,
            height: Dimension::UNSET,
            horizontal_flip: false,
            vertical_flip: false,
            halign: HorizontalAlignment::Center,
            valign: VerticalAlignment::Middle,
            smart: false,
            meta: false,
            debug: false,
            trim: None,
            crop: Crop::default(),
            fit_in: None,
            filters: Vec::new(),
            unsafe_url: false,
        }
    }

    /// Set resize width in pixels.
    pub fn width(self, width: u32) -> Self {
        Self {
            width: Dimension::Pixels(width),
            ..self
        }
    }

    /// Set resize height in pixels.
    pub fn height(self, height: u32) -> Self {
        Self {
            height: Dimension::Pixels(height),
            ..self
        }
    }

    /// Keep the source image width.
    pub fn orig_width(self) -> Self {
        Self {
            width: Dimension::Orig,
            ..self
        }
    }

    /// Keep the source image height.
    pub fn orig_height(self) -> Self {
        Self {
            height: Dimension::Orig,
            ..self
        }
    }

    /// Mirror the image horizontally.
    pub fn horizontal_flip(self, horizontal_flip: bool) -> Self {
        Self {
            horizontal_flip,
            ..self
        }
    }

    /// Mirror the image vertically.
    pub fn vertical_flip(self, vertical_flip: bool) -> Self {
        Self {
            vertical_flip,
            ..self
        }
    }

    /// Set horizontal alignment.
    pub fn halign(self, halign: HorizontalAlignment) -> Self {
        Self { halign, ..self }
    }

    /// Set vertical alignment.
    pub fn valign(self, valign: VerticalAlignment) -> Self {
        Self { valign, ..self }
    }

    /// Toggle smart cropping.
    pub fn smart(self, smart: bool) -> Self {
        Self { smart, ..self }
    }

    /// Toggle metadata output.
    pub fn meta(self, meta: bool) -> Self {
        Self { meta, ..self }
    }

    /// Set border trimming.
    pub fn trim(self, trim: Trim) -> Self {
        Self {
            trim: Some(trim),
            ..self
        }
    }

    /// Set the manual crop rectangle.
    pub fn crop(self, crop: Crop) -> Self {
        Self { crop, ..self }
    }

    /// Request `fit-in`.
    pub fn fit_in(self) -> Self {
        self.merge_fit_in(FitIn::default())
    }

    /// Request `full-fit-in`.
    pub fn full_fit_in(self) -> Self {
        self.merge_fit_in(FitIn {
            adaptive: false,
            full: true,
        })
    }

    /// Request `adaptive-fit-in`.
    pub fn adaptive_fit_in(self) -> Self {
        self.merge_fit_in(FitIn {
            adaptive: true,
            full: false,
        })
    }

    /// Request `adaptive-full-fit-in`.
    pub fn adaptive_full_fit_in(self) -> Self {
        self.merge_fit_in(FitIn {
            adaptive: true,
            full: true,
        })
    }

    // Fit-in requests compose: modifiers accumulate into a single mode.
    fn merge_fit_in(self, requested: FitIn) -> Self {
        let current = self.fit_in.unwrap_or_default();
        Self {
            fit_in: Some(FitIn {
                adaptive: current.adaptive || requested.adaptive,
                full: current.full || requested.full,
            }),
            ..self
        }
    }

    /// Append a single filter expression.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Append several filter expressions, keeping their order.
    pub fn filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.extend(filters.into_iter().map(Into::into));
        self
    }

    /// Select an `unsafe/` URL instead of a signed one.
    pub fn unsafe_url(self, unsafe_url: bool) -> Self {
        Self { unsafe_url, ..self }
    }

    /// The image locator with any leading slashes removed.
    pub fn image_locator(&self) -> &str {
        self.image_url.trim_start_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_from_str() {
        assert_eq!("orig".parse::<Dimension>(), Ok(Dimension::Orig));
        assert_eq!("300".parse::<Dimension>(), Ok(Dimension::Pixels(300)));
        assert_eq!(Dimension::from(300), Dimension::Pixels(300));
        assert!("-3".parse::<Dimension>().is_err());
        assert!("wide".parse::<Dimension>().is_err());
    }

    #[test]
    fn dimension_is_set() {
        assert!(!Dimension::default().is_set());
        assert!(Dimension::Pixels(1).is_set());
        assert!(Dimension::Orig.is_set());
    }

    #[test]
    fn alignments_reject_unknown_values() {
        assert_eq!(
            "wrong".parse::<HorizontalAlignment>(),
            Err(ValidationError::InvalidHorizontalAlignment("wrong".into()))
        );
        assert_eq!(
            "wrong".parse::<VerticalAlignment>(),
            Err(ValidationError::InvalidVerticalAlignment("wrong".into()))
        );
        assert_eq!(
            "right".parse::<HorizontalAlignment>(),
            Ok(HorizontalAlignment::Right)
        );
        assert_eq!(
            "bottom".parse::<VerticalAlignment>(),
            Ok(VerticalAlignment::Bottom)
        );
    }

    #[test]
    fn trim_rendering() {
        assert_eq!(Trim::Enabled.to_string(), "trim");
        let anchored = |position, tolerance| Trim::Anchored {
            position,
            tolerance,
        };
        assert_eq!(
            anchored(Some(TrimPosition::BottomRight), Some(15)).to_string(),
            "trim:bottom-right:15"
        );
        assert_eq!(
            anchored(Some(TrimPosition::TopLeft), None).to_string(),
            "trim:top-left"
        );
        assert_eq!(anchored(None, Some(15)).to_string(), "trim::15");
        assert_eq!(anchored(None, None).to_string(), "trim:");
    }

    #[test]
    fn zero_trim_tolerance_is_omitted() {
        let anchored = |position, tolerance| Trim::Anchored {
            position,
            tolerance,
        };
        assert_eq!(
            anchored(Some(TrimPosition::TopLeft), Some(0)).to_string(),
            "trim:top-left"
        );
        assert_eq!(anchored(None, Some(0)).to_string(), "trim:");
    }

    #[test]
    fn fit_in_requests_compose() {
        let options = TransformationOptions::new("a.jpg").fit_in();
        assert_eq!(options.fit_in, Some(FitIn::default()));

        let options = TransformationOptions::new("a.jpg")
            .full_fit_in()
            .adaptive_fit_in();
        assert_eq!(
            options.fit_in,
            Some(FitIn {
                adaptive: true,
                full: true
            })
        );
        assert_eq!(
            options.fit_in.map(|f| f.to_string()).as_deref(),
            Some("adaptive-full-fit-in")
        );
    }

    #[test]
    fn filters_keep_order() {
        let options = TransformationOptions::new("a.jpg")
            .filter("brightness(20)")
            .filters(["contrast(10)", "grayscale()"]);
        assert_eq!(
            options.filters,
            vec!["brightness(20)", "contrast(10)", "grayscale()"]
        );
    }

    #[test]
    fn image_locator_strips_leading_slashes() {
        assert_eq!(
            TransformationOptions::new("//a/b.jpg").image_locator(),
            "a/b.jpg"
        );
    }
}
