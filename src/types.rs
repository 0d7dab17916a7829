//! Secure types for handling sensitive data.
//!
//! Provides a string wrapper that prevents accidental exposure of secret
//! values through logging, debugging, or serialization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string wrapper that redacts its contents in Debug, Display, and serialization.
///
/// Secret values held by the cache, the in-memory backend, and configuration
/// preloads are stored as `SecretString` so they never leak through structured
/// logging or Debug output. The underlying memory is zeroed when dropped.
///
/// - Debug output shows `SecretString([REDACTED])`
/// - Display output shows `[REDACTED]`
/// - Serialization outputs `"[REDACTED]"` (never the actual value)
/// - Deserialization accepts actual secret values (e.g. from config files)
/// - To read the actual value, call [`SecretString::expose_secret`] explicitly
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Never serialize the actual secret value.
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(SecretString(value))
    }
}

impl SecretString {
    /// Creates a new SecretString from a string value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the underlying secret value.
    ///
    /// Only use where the value is actually needed; never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Consumes the SecretString and returns the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }

    /// Returns the length of the secret without exposing the value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Default for SecretString {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_redacts_debug() {
        let secret = SecretString::new("super-secret-value");
        let debug_output = format!("{:?}", secret);

        assert_eq!(debug_output, "SecretString([REDACTED])");
        assert!(!debug_output.contains("super-secret"));
    }

    #[test]
    fn test_secret_string_redacts_display() {
        let secret = SecretString::new("super-secret-value");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_secret_string_expose() {
        let secret = SecretString::new("my-secret");
        assert_eq!(secret.expose_secret(), "my-secret");
        assert_eq!(secret.len(), 9);
        assert!(!secret.is_empty());
    }

    #[test]
    fn test_secret_string_into_inner() {
        let secret = SecretString::new("my-secret");
        assert_eq!(secret.into_inner(), "my-secret");
    }

    #[test]
    fn test_secret_string_serialization_redacts() {
        let secret = SecretString::new("super-secret-value");
        let json = serde_json::to_string(&secret).unwrap();

        assert_eq!(json, "\"[REDACTED]\"");
        assert!(!json.contains("super-secret"));
    }

    #[test]
    fn test_secret_string_deserialization_accepts_values() {
        let secret: SecretString = serde_json::from_str("\"my-actual-secret\"").unwrap();
        assert_eq!(secret.expose_secret(), "my-actual-secret");
    }

    #[test]
    fn test_secret_string_equality_and_conversions() {
        let from_string: SecretString = "same".to_string().into();
        let from_str: SecretString = "same".into();
        assert_eq!(from_string, from_str);
        assert_ne!(from_str, SecretString::new("different"));
    }
}
