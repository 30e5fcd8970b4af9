/// Reasons a [`TransformationOptions`](crate::TransformationOptions) cannot
/// be turned into a path.
///
/// The messages are meant to be shown to whoever supplied the options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// The image locator is empty, or consists only of slashes.
    #[error("The image_url argument is mandatory.")]
    MissingImageUrl,

    /// Unknown horizontal alignment (`.0`).
    #[error("Only \"left\", \"center\" and \"right\" are valid values for horizontal alignment.")]
    InvalidHorizontalAlignment(String),

    /// Unknown vertical alignment (`.0`).
    #[error("Only \"top\", \"middle\" and \"bottom\" are valid values for vertical alignment.")]
    InvalidVerticalAlignment(String),

    /// Unknown trim anchor (`.0`).
    #[error("Only \"top-left\" and \"bottom-right\" are valid values for trim position.")]
    InvalidTrimPosition(String),

    /// A fit-in mode was requested but neither width nor height is set.
    #[error("When using fit-in or full-fit-in, you must specify width and/or height.")]
    FitInWithoutDimensions,
}
