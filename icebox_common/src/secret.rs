use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// A configuration value that must never appear in logs: the JWT signing secret, API keys, and
/// the like. Both `Debug` and `Display` print a redaction marker, so a `Secret` can sit inside a
/// `#[derive(Debug)]` config struct safely. The only way at the inner value is an explicit
/// [`Secret::reveal`] call, which keeps every access grep-able.
pub struct Secret<T>(T);

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn reveal(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Default> Default for Secret<T> {
    fn default() -> Self {
        Self(T::default())
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

#[cfg(test)]
mod test {
    use super::Secret;

    #[test]
    fn secrets_never_format_their_contents() {
        let secret = Secret::new("hunter2".to_string());
        assert_eq!(format!("{secret}"), "[REDACTED]");
        assert!(!format!("{secret:?}").contains("hunter2"));
        assert_eq!(secret.reveal(), "hunter2");
        assert_eq!(secret.into_inner(), "hunter2");
    }
}
