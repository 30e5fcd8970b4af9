use base64::{engine::general_purpose::URL_SAFE, Engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;
use tracing::instrument;

use crate::{error::ValidationError, options::TransformationOptions, path, Key};

type HmacSha1 = Hmac<Sha1>;

/// Signs canonical paths and verifies their signatures.
///
/// Signatures are the URL-safe, padded Base64 encoding of the HMAC-SHA1 of the
/// path, which is what thumbor servers expect.
#[derive(Debug, Clone)]
pub struct Signer {
    key: Key,
}

impl Signer {
    /// Create a new [`Signer`] with the provided [`Key`].
    pub fn new(key: impl Into<Key>) -> Self {
        Self { key: key.into() }
    }

    /// Sign a canonical path.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tower_thumbor_url::Signer;
    ///
    /// let signer = Signer::new("my-security-key");
    /// assert_eq!(
    ///     signer.sign("300x200/my.server.com/some/path/to/image.jpg"),
    ///     "8ammJH8D-7tXy6kU3lTvoXlhu4o="
    /// );
    /// ```
    pub fn sign(&self, path: &str) -> String {
        // Every call gets its own MAC state, so a shared `Signer` is safe to use
        // from many threads.
        let mut mac =
            HmacSha1::new_from_slice(self.key.as_slice()).expect("HMAC can take key of any size");
        mac.update(path.as_bytes());
        URL_SAFE.encode(mac.finalize().into_bytes())
    }

    /// Verify a given signature and path.
    ///
    /// The comparison takes the same time wherever the first differing byte
    /// is.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tower_thumbor_url::Signer;
    ///
    /// let signer = Signer::new("my-security-key");
    /// let path = "300x200/my.server.com/some/path/to/image.jpg";
    ///
    /// assert!(signer.verify("8ammJH8D-7tXy6kU3lTvoXlhu4o=", path));
    /// let tampered = "300x201/my.server.com/some/path/to/image.jpg";
    /// assert!(!signer.verify("8ammJH8D-7tXy6kU3lTvoXlhu4o=", tampered));
    /// ```
    pub fn verify(&self, signature: &str, path: &str) -> bool {
        let expected = self.sign(path);
        let verified: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();
        if !verified {
            tracing::warn!("signature does not match path");
        }
        verified
    }
}

/// Builds the externally visible URL for a set of options.
///
/// # Example
///
/// ```rust
/// use tower_thumbor_url::{Crop, TransformationOptions, UrlBuilder};
///
/// let builder = UrlBuilder::new("my-security-key");
/// let options = TransformationOptions::new("my.server.com/some/path/to/image.jpg")
///     .width(300)
///     .height(200)
///     .crop(Crop::new(10, 10, 200, 200));
///
/// assert_eq!(
///     builder.generate(&options)?,
///     "/B35oBEIwztbc3jm7vsdqLez2C78=/10x10:200x200/300x200/my.server.com/some/path/to/image.jpg"
/// );
/// assert_eq!(
///     builder.generate(&options.unsafe_url(true))?,
///     "unsafe/10x10:200x200/300x200/my.server.com/some/path/to/image.jpg"
/// );
/// # Ok::<(), tower_thumbor_url::ValidationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    signer: Signer,
}

impl UrlBuilder {
    /// Create a new [`UrlBuilder`] signing with the provided [`Key`].
    pub fn new(key: impl Into<Key>) -> Self {
        Self {
            signer: Signer::new(key),
        }
    }

    /// The signer used for signed URLs.
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Generates the URL for `options`.
    ///
    /// Unsafe options yield `unsafe/<path>`, everything else
    /// `/<signature>/<path>`.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] of [`path::serialize`] unchanged.
    #[instrument(skip_all, err)]
    pub fn generate(&self, options: &TransformationOptions) -> Result<String, ValidationError> {
        let path = path::serialize(options)?;

        if options.unsafe_url {
            return Ok(format!("unsafe/{path}"));
        }

        let signature = self.signer.sign(&path);
        Ok(format!("/{signature}/{path}"))
    }

    /// Checks a previously generated signed URL against this builder's key.
    ///
    /// Unsafe URLs and URLs that do not follow the path grammar never
    /// validate.
    pub fn validate(&self, url: &str) -> bool {
        let Some(parsed) = path::parse_url(url) else {
            tracing::warn!("could not parse url");
            return false;
        };

        let Some(signature) = parsed.signature else {
            tracing::warn!("url is unsafe, not signed");
            return false;
        };

        self.signer.verify(&signature, &parsed.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Crop;

    const KEY: &str = "my-security-key";
    const IMAGE_URL: &str = "my.server.com/some/path/to/image.jpg";

    #[test]
    fn sign_matches_reference_signatures() {
        let signer = Signer::new(KEY);
        assert_eq!(signer.sign("foobar"), "Ps9zGfg37B3_O_hdDRHm6LEajPo=");
        assert_eq!(signer.sign(IMAGE_URL), "w604AzX3JeZ6sexJMBvZIzupjIM=");
    }

    #[test]
    fn sign_uses_utf8_for_text_keys() {
        let signer = Signer::new("cafécompãodequeijo");
        assert_eq!(signer.sign(IMAGE_URL), "CjYqux5TMD-XpVeAG6WbG2eDVAI=");
    }

    #[test]
    fn signatures_are_padded_url_safe_base64() {
        let signature = Signer::new(KEY).sign("fit-in/-300x200/left/top/smart/a.jpg");
        assert_eq!(signature.len(), 28);
        assert!(signature.ends_with('='));
        assert!(!signature.contains('+') && !signature.contains('/'));
    }

    #[test]
    fn verify_own_signature() {
        let signer = Signer::new(Key::generate());
        let path = "300x200/a.jpg";
        let signature = signer.sign(path);

        assert!(signer.verify(&signature, path));
        assert!(!signer.verify(&signature, "300x200/a.jpgx"));
        assert!(!signer.verify(&signature[..27], path));
        assert!(!signer.verify("", path));
        assert!(!Signer::new("other-key").verify(&signature, path));
    }

    #[test]
    fn signing_is_deterministic_across_threads() {
        let signer = Signer::new(KEY);
        let expected: Vec<String> = (0..8)
            .map(|i| signer.sign(&format!("{i}x0/a.jpg")))
            .collect();

        std::thread::scope(|scope| {
            for (i, expected) in expected.iter().enumerate() {
                let signer = &signer;
                scope.spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(&signer.sign(&format!("{i}x0/a.jpg")), expected);
                    }
                });
            }
        });
    }

    #[test]
    fn generate_signed_urls() {
        let builder = UrlBuilder::new(KEY);

        let options = TransformationOptions::new(IMAGE_URL).width(300).height(200);
        assert_eq!(
            builder.generate(&options).unwrap(),
            format!("/8ammJH8D-7tXy6kU3lTvoXlhu4o=/300x200/{IMAGE_URL}")
        );

        let options = options
            .crop(Crop::new(10, 10, 200, 200))
            .filters(["brightness(20)", "contrast(10)"]);
        let expected = format!(
            "/as8U2DbUUtTMgvPF26LkjS3MocY=/10x10:200x200/300x200/\
             filters:brightness(20):contrast(10)/{IMAGE_URL}"
        );
        assert_eq!(builder.generate(&options).unwrap(), expected);
        // No state carries over between calls.
        assert_eq!(builder.generate(&options).unwrap(), expected);
    }

    #[test]
    fn generate_unsafe_urls() {
        let builder = UrlBuilder::new(KEY);

        let options = TransformationOptions::new(IMAGE_URL).unsafe_url(true);
        assert_eq!(builder.generate(&options).unwrap(), format!("unsafe/{IMAGE_URL}"));

        let options = TransformationOptions::new(IMAGE_URL)
            .width(100)
            .height(140)
            .smart(true)
            .unsafe_url(true);
        assert_eq!(
            builder.generate(&options).unwrap(),
            format!("unsafe/100x140/smart/{IMAGE_URL}")
        );

        let options = TransformationOptions::new(IMAGE_URL).crop(Crop::new(10, 20, 30, 40));
        assert!(builder.generate(&options).unwrap().starts_with('/'));
        assert!(!builder.generate(&options).unwrap().starts_with("unsafe"));
    }

    #[test]
    fn generate_propagates_validation_errors() {
        let builder = UrlBuilder::new(KEY);

        assert_eq!(
            builder.generate(&TransformationOptions::new("")),
            Err(ValidationError::MissingImageUrl)
        );
        assert_eq!(
            builder.generate(&TransformationOptions::new(IMAGE_URL).fit_in()),
            Err(ValidationError::FitInWithoutDimensions)
        );
        assert_eq!(
            builder.generate(&TransformationOptions::new(IMAGE_URL).fit_in().unsafe_url(true)),
            Err(ValidationError::FitInWithoutDimensions)
        );
    }

    #[test]
    fn validate_generated_urls() {
        let builder = UrlBuilder::new(KEY);
        let image_url = "s.glbimg.com/et/bb/f/original/2011/03/24/VN0JiwzmOw0b0lg.jpg";
        let options = TransformationOptions::new(image_url)
            .width(300)
            .height(200)
            .smart(true);

        let url = builder.generate(&options).unwrap();
        assert!(builder.validate(&url));
        assert!(!UrlBuilder::new("another-key").validate(&url));
        assert!(!builder.validate(&url.replace("300x200", "300x201")));
        assert!(!builder.validate(&builder.generate(&options.unsafe_url(true)).unwrap()));
        assert!(!builder.validate("not a url"));
    }
}
