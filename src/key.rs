// Adapted from: https://github.com/rwf2/cookie-rs/blob/ba46fc5e97a1271435f38509d109e125a473bc82/src/secure/key.rs
const GENERATED_KEY_LENGTH: usize = 64;

/// Secret used for signing URLs.
///
/// Thumbor security keys are shared strings of arbitrary length, so any byte
/// sequence is accepted. Text is used as its UTF-8 encoding.
#[derive(Clone)]
pub struct Key(Vec<u8>);

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;

        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Key {}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key").finish()
    }
}

impl Key {
    /// Generates a key of 64 bytes from a secure, random source.
    ///
    /// Only useful when the same process both signs and verifies; a thumbor
    /// server needs the key configured as its `SECURITY_KEY`.
    ///
    /// # Panics
    ///
    /// Panics if randomness cannot be retrieved from the operating system. See
    /// [`Key::try_generate()`] for a non-panicking version.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tower_thumbor_url::Key;
    ///
    /// let key = Key::generate();
    /// assert_eq!(key.as_slice().len(), 64);
    /// ```
    pub fn generate() -> Key {
        Self::try_generate().expect("failed to generate `Key` from randomness")
    }

    /// Attempts to generate a random key. If randomness cannot be retrieved
    /// from the underlying operating system, returns `None`.
    pub fn try_generate() -> Option<Key> {
        use rand::RngCore;

        let mut rng = rand::thread_rng();
        let mut bytes = vec![0; GENERATED_KEY_LENGTH];
        rng.try_fill_bytes(&mut bytes).ok()?;
        Some(Key(bytes))
    }

    /// Returns the key as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Key {
    fn from(key: &[u8]) -> Self {
        Key(key.to_vec())
    }
}

impl From<Vec<u8>> for Key {
    fn from(key: Vec<u8>) -> Self {
        Key(key)
    }
}

impl From<&str> for Key {
    /// # Example
    ///
    /// ```rust
    /// use tower_thumbor_url::Key;
    ///
    /// let key = Key::from("my-security-key");
    /// assert_eq!(key.as_slice(), b"my-security-key");
    /// ```
    fn from(key: &str) -> Self {
        Key(key.as_bytes().to_vec())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Key(key.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_keys_are_utf8() {
        let key = Key::from("téste");
        assert_eq!(key.as_slice(), "téste".as_bytes());
        assert_eq!(key, Key::from("téste".to_string()));
    }

    #[test]
    fn equality_compares_contents() {
        assert_eq!(Key::from(&b"abc"[..]), Key::from(vec![b'a', b'b', b'c']));
        assert_ne!(Key::from("abc"), Key::from("abd"));
        assert_ne!(Key::from("abc"), Key::from("abcd"));
    }

    #[test]
    fn debug_does_not_leak_material() {
        let rendered = format!("{:?}", Key::from("my-security-key"));
        assert_eq!(rendered, "Key");
    }

    #[test]
    fn generated_keys_differ() {
        let a = Key::generate();
        let b = Key::generate();
        assert_eq!(a.as_slice().len(), GENERATED_KEY_LENGTH);
        assert_ne!(a, b);
    }
}
