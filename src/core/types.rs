//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Iri`] - Validated absolute identifier (URI/IRI)
//! - [`NodeId`] - Identifier of a node in the internal package model
//! - [`ObjectId`] - Identifier of a domain object
//! - [`NodeTypeId`] - Identifier of a profile node type
//! - [`PropertyTypeId`] - Identifier of a profile property type
//! - [`Fingerprint`] - Content hash over a canonical graph serialization
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use ipmkit::core::types::{Iri, NodeId, ObjectId};
//!
//! // Valid constructions
//! let iri = Iri::new("http://example.org/node/1").unwrap();
//! let node = NodeId::new("urn:uuid:4b6f7a0e-0000-4000-8000-000000000001").unwrap();
//! let object = ObjectId::mint("urn:uuid:");
//! assert!(object.as_str().starts_with("urn:uuid:"));
//!
//! // Invalid constructions fail at creation time
//! assert!(Iri::new("no scheme here").is_err());
//! assert!(NodeId::new("").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidIri(String),

    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),
}

/// A validated absolute identifier.
///
/// Identifiers must look like an absolute IRI:
/// - Cannot be empty
/// - Must start with a scheme (`[A-Za-z][A-Za-z0-9+.-]*:`)
/// - Cannot contain whitespace or ASCII control characters
/// - Cannot contain `<`, `>`, `"`, `{`, `}`, `|`, `\`, `^` or a backtick
///
/// No further normalization is applied; two identifiers are equal only if
/// their text is equal.
///
/// # Example
///
/// ```
/// use ipmkit::core::types::Iri;
///
/// let iri = Iri::new("http://dataconservancy.org/internal-package-model/IPMNode").unwrap();
/// assert_eq!(iri.scheme(), "http");
///
/// assert!(Iri::new("").is_err());
/// assert!(Iri::new("1http://bad").is_err());
/// assert!(Iri::new("http://has space").is_err());
/// assert!(Iri::new("urn:<bracket>").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iri(String);

impl Iri {
    /// Create a new validated identifier.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidIri` if the text is not an absolute IRI.
    pub fn new(iri: impl Into<String>) -> Result<Self, TypeError> {
        let iri = iri.into();
        Self::validate(&iri)?;
        Ok(Self(iri))
    }

    fn validate(iri: &str) -> Result<(), TypeError> {
        if iri.is_empty() {
            return Err(TypeError::InvalidIri("identifier cannot be empty".into()));
        }

        let colon = iri.find(':').ok_or_else(|| {
            TypeError::InvalidIri(format!("identifier '{iri}' has no scheme"))
        })?;
        let scheme = &iri[..colon];
        let mut chars = scheme.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => {
                return Err(TypeError::InvalidIri(format!(
                    "identifier '{iri}' scheme must start with a letter"
                )))
            }
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-')) {
            return Err(TypeError::InvalidIri(format!(
                "identifier '{iri}' has an invalid scheme"
            )));
        }

        const INVALID_CHARS: [char; 8] = ['<', '>', '"', '{', '}', '|', '\\', '^'];
        for c in iri.chars() {
            if c.is_whitespace() || c.is_control() {
                return Err(TypeError::InvalidIri(format!(
                    "identifier '{}' cannot contain whitespace or control characters",
                    iri.escape_debug()
                )));
            }
            if INVALID_CHARS.contains(&c) || c == '`' {
                return Err(TypeError::InvalidIri(format!(
                    "identifier '{iri}' cannot contain '{c}'"
                )));
            }
        }

        Ok(())
    }

    /// Wrap a vocabulary constant known to be valid.
    pub(crate) fn from_static(iri: &'static str) -> Self {
        debug_assert!(Self::validate(iri).is_ok(), "invalid vocabulary IRI {iri}");
        Self(iri.to_string())
    }

    /// The scheme part (text before the first `:`).
    pub fn scheme(&self) -> &str {
        match self.0.find(':') {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Iri {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Iri {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Iri> for String {
    fn from(iri: Iri) -> Self {
        iri.0
    }
}

impl AsRef<str> for Iri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Iri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declares an identifier newtype over [`Iri`].
macro_rules! iri_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Iri);

        impl $name {
            /// Create a new validated identifier.
            ///
            /// # Errors
            ///
            /// Returns `TypeError::InvalidIri` if the text is not an absolute IRI.
            pub fn new(iri: impl Into<String>) -> Result<Self, TypeError> {
                Iri::new(iri).map(Self)
            }

            /// Get the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Get the underlying IRI.
            pub fn as_iri(&self) -> &Iri {
                &self.0
            }
        }

        impl From<Iri> for $name {
            fn from(iri: Iri) -> Self {
                Self(iri)
            }
        }

        impl From<$name> for Iri {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.into()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

iri_newtype!(
    /// Stable identifier of a node in the internal package model.
    ///
    /// Unique within one tree and preserved across save/reload.
    NodeId
);

iri_newtype!(
    /// Identifier of a domain object bound to a node.
    ObjectId
);

iri_newtype!(
    /// Identifier of a node type declared by a domain profile.
    NodeTypeId
);

iri_newtype!(
    /// Identifier of a property type declared by a domain profile.
    PropertyTypeId
);

impl NodeId {
    /// Mint a fresh node identifier under `base` (e.g. `urn:uuid:`).
    pub fn mint(base: &str) -> Self {
        Self(Iri(format!("{}{}", base, uuid::Uuid::new_v4())))
    }
}

impl ObjectId {
    /// Mint a fresh domain object identifier under `base` (e.g. `urn:uuid:`).
    ///
    /// # Example
    ///
    /// ```
    /// use ipmkit::core::types::ObjectId;
    ///
    /// let a = ObjectId::mint("http://example.org/objects/");
    /// let b = ObjectId::mint("http://example.org/objects/");
    /// assert_ne!(a, b);
    /// assert!(a.as_str().starts_with("http://example.org/objects/"));
    /// ```
    pub fn mint(base: &str) -> Self {
        Self(Iri(format!("{}{}", base, uuid::Uuid::new_v4())))
    }
}

/// A stable hash over a canonical graph serialization.
///
/// The fingerprint is computed over the serialized statement lines of a
/// graph. Lines are sorted before hashing so the fingerprint does not depend
/// on statement order.
///
/// # Example
///
/// ```
/// use ipmkit::core::types::Fingerprint;
///
/// let lines = vec![
///     "<urn:a> <urn:p> \"1\" .".to_string(),
///     "<urn:b> <urn:p> \"2\" .".to_string(),
/// ];
/// let reversed: Vec<String> = lines.iter().rev().cloned().collect();
///
/// assert_eq!(Fingerprint::compute(&lines), Fingerprint::compute(&reversed));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from a set of statement lines.
    pub fn compute(lines: &[String]) -> Self {
        let mut sorted: Vec<&String> = lines.iter().collect();
        sorted.sort();

        let mut hasher = Sha256::new();
        for line in sorted {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }

        Self(hex::encode(hasher.finalize()))
    }

    /// Fingerprint of a graph's N-Triples lines.
    pub fn of_graph(graph: &crate::rdf::Graph) -> Self {
        Self::compute(&crate::rdf::ntriples::lines(graph))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod iri {
        use super::*;

        #[test]
        fn valid_iris() {
            assert!(Iri::new("http://example.org/a").is_ok());
            assert!(Iri::new("https://example.org/a#frag").is_ok());
            assert!(Iri::new("urn:uuid:1234").is_ok());
            assert!(Iri::new("file:///tmp/content/a.txt").is_ok());
            assert!(Iri::new("x-custom+v1.2:thing").is_ok());
        }

        #[test]
        fn empty_rejected() {
            assert!(Iri::new("").is_err());
        }

        #[test]
        fn missing_scheme_rejected() {
            assert!(Iri::new("relative/path").is_err());
            assert!(Iri::new(":nothing").is_err());
        }

        #[test]
        fn bad_scheme_rejected() {
            assert!(Iri::new("1abc:def").is_err());
            assert!(Iri::new("ab_c:def").is_err());
        }

        #[test]
        fn whitespace_rejected() {
            assert!(Iri::new("http://a b").is_err());
            assert!(Iri::new("http://a\tb").is_err());
            assert!(Iri::new("http://a\nb").is_err());
        }

        #[test]
        fn special_chars_rejected() {
            assert!(Iri::new("urn:a<b").is_err());
            assert!(Iri::new("urn:a>b").is_err());
            assert!(Iri::new("urn:a\"b").is_err());
            assert!(Iri::new("urn:a{b").is_err());
            assert!(Iri::new("urn:a|b").is_err());
            assert!(Iri::new("urn:a\\b").is_err());
            assert!(Iri::new("urn:a^b").is_err());
            assert!(Iri::new("urn:a`b").is_err());
        }

        #[test]
        fn scheme_accessor() {
            let iri = Iri::new("urn:uuid:abc").unwrap();
            assert_eq!(iri.scheme(), "urn");
        }

        #[test]
        fn serde_roundtrip() {
            let iri = Iri::new("http://example.org/x").unwrap();
            let json = serde_json::to_string(&iri).unwrap();
            assert_eq!(json, "\"http://example.org/x\"");
            let parsed: Iri = serde_json::from_str(&json).unwrap();
            assert_eq!(iri, parsed);
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<Iri, _> = serde_json::from_str("\"not an iri\"");
            assert!(result.is_err());
        }
    }

    mod newtypes {
        use super::*;

        #[test]
        fn node_id_wraps_iri() {
            let id = NodeId::new("urn:node:1").unwrap();
            assert_eq!(id.as_str(), "urn:node:1");
            assert_eq!(id.as_iri().scheme(), "urn");
            assert_eq!(id.to_string(), "urn:node:1");
        }

        #[test]
        fn minted_ids_are_unique() {
            let a = NodeId::mint("urn:uuid:");
            let b = NodeId::mint("urn:uuid:");
            assert_ne!(a, b);

            let o = ObjectId::mint("urn:uuid:");
            assert!(Iri::new(o.as_str()).is_ok());
        }

        #[test]
        fn conversions() {
            let iri = Iri::new("http://example.org/types/File").unwrap();
            let type_id = NodeTypeId::from(iri.clone());
            let back: Iri = type_id.into();
            assert_eq!(back, iri);
        }

        #[test]
        fn serde_roundtrip() {
            let id = PropertyTypeId::new("http://example.org/props/title").unwrap();
            let json = serde_json::to_string(&id).unwrap();
            let parsed: PropertyTypeId = serde_json::from_str(&json).unwrap();
            assert_eq!(id, parsed);
        }
    }

    mod fingerprint {
        use super::*;

        #[test]
        fn deterministic() {
            let lines = vec!["a".to_string(), "b".to_string()];
            assert_eq!(Fingerprint::compute(&lines), Fingerprint::compute(&lines));
        }

        #[test]
        fn order_independent() {
            let a = vec!["x".to_string(), "y".to_string(), "z".to_string()];
            let b = vec!["z".to_string(), "x".to_string(), "y".to_string()];
            assert_eq!(Fingerprint::compute(&a), Fingerprint::compute(&b));
        }

        #[test]
        fn different_content_different_fingerprint() {
            let a = vec!["x".to_string()];
            let b = vec!["y".to_string()];
            assert_ne!(Fingerprint::compute(&a), Fingerprint::compute(&b));
        }

        #[test]
        fn empty_input() {
            let fp = Fingerprint::compute(&[]);
            assert_eq!(fp.as_str().len(), 64);
        }
    }
}
