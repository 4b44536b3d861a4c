//! Namespace-qualified paths.
//!
//! A path renders as `/<scheme>/<identifier>[/<extension>...]`:
//!
//! ```text
//! /named/alice/docs/readme.txt     mutable name, resolved by a naming service
//! /content/<64 hex>/docs/readme.txt  content id, walked through the object graph
//! ```
//!
//! The scheme is decided once, when the path is built. Segments are never
//! escaped and never interpreted beyond the scheme marker.

use crate::error::{Error, Result};
use crate::hash::Hash;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Segment separator.
pub const SEPARATOR: char = '/';

/// Addressing scheme named by a path's first segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Mutable name: `/named/<name>`.
    Named,
    /// Content id: `/content/<hash>`.
    Content,
}

impl Scheme {
    /// Marker segment for this scheme.
    pub fn marker(&self) -> &'static str {
        match self {
            Scheme::Named => "named",
            Scheme::Content => "content",
        }
    }

    /// Scheme for a marker segment, if it is one.
    pub fn from_marker(segment: &str) -> Option<Self> {
        match segment {
            "named" => Some(Scheme::Named),
            "content" => Some(Scheme::Content),
            _ => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// An immutable, scheme-tagged sequence of path segments.
///
/// `segments[0]` is always the scheme marker. Construction does not enforce
/// the presence of an identifier: `/named` is a valid `Path` value that name
/// resolution later rejects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    scheme: Scheme,
    segments: Vec<String>,
}

impl Path {
    /// Parse a path string.
    ///
    /// Leading and trailing separators are trimmed before splitting. A bare
    /// 64-character hex id is read as `/content/<id>`.
    pub fn parse(s: &str) -> Result<Self> {
        if !s.starts_with(SEPARATOR) {
            if Hash::is_hex_id(s) {
                return Ok(Path {
                    scheme: Scheme::Content,
                    segments: vec![Scheme::Content.marker().to_string(), s.to_string()],
                });
            }
            return Err(Error::malformed_path(s, "path must begin with '/'"));
        }

        let trimmed = s.trim_matches(SEPARATOR);
        Self::build(trimmed.split(SEPARATOR).map(str::to_string).collect(), s)
    }

    /// Build a path from segments, the first being the scheme marker.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let rendered = render(&segments);
        Self::build(segments, &rendered)
    }

    fn build(segments: Vec<String>, original: &str) -> Result<Self> {
        let first = segments
            .first()
            .ok_or_else(|| Error::malformed_path(original, "path has no segments"))?;

        let scheme = Scheme::from_marker(first).ok_or_else(|| {
            Error::malformed_path(original, format!("unknown scheme {:?}", first))
        })?;

        Ok(Path { scheme, segments })
    }

    /// `/content/<hash>[/<extensions>...]`.
    pub fn content<I, S>(hash: &Hash, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments = vec![Scheme::Content.marker().to_string(), hash.to_hex()];
        segments.extend(extensions.into_iter().map(Into::into));
        Path {
            scheme: Scheme::Content,
            segments,
        }
    }

    /// `/named/<name>`.
    pub fn named(name: impl Into<String>) -> Self {
        Path {
            scheme: Scheme::Named,
            segments: vec![Scheme::Named.marker().to_string(), name.into()],
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn is_named(&self) -> bool {
        self.scheme == Scheme::Named
    }

    /// All segments, scheme marker included.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The second segment, if present.
    pub fn identifier(&self) -> Option<&str> {
        self.segments.get(1).map(String::as_str)
    }

    /// Segments after the identifier; empty if there are none.
    pub fn extensions(&self) -> &[String] {
        self.segments.get(2..).unwrap_or(&[])
    }

    /// A new path with `extensions` appended after this path's segments.
    pub fn join<I, S>(&self, extensions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Path::from_segments(
            self.segments
                .iter()
                .cloned()
                .chain(extensions.into_iter().map(Into::into)),
        )
    }
}

fn render(segments: &[String]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push(SEPARATOR);
        out.push_str(segment);
    }
    out
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.segments))
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Path::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_with_extensions() {
        let path = Path::parse("/named/alice/docs/readme.txt").unwrap();
        assert_eq!(path.scheme(), Scheme::Named);
        assert_eq!(path.identifier(), Some("alice"));
        assert_eq!(path.extensions(), ["docs", "readme.txt"]);
        assert_eq!(path.to_string(), "/named/alice/docs/readme.txt");
    }

    #[test]
    fn test_parse_trims_outer_separators() {
        let path = Path::parse("/content/QmXYZ/docs/").unwrap();
        assert_eq!(path.segments(), ["content", "QmXYZ", "docs"]);
        assert_eq!(path.to_string(), "/content/QmXYZ/docs");
    }

    #[test]
    fn test_parse_marker_only() {
        let path = Path::parse("/named/").unwrap();
        assert!(path.is_named());
        assert_eq!(path.segments(), ["named"]);
        assert_eq!(path.identifier(), None);
        assert!(path.extensions().is_empty());
    }

    #[test]
    fn test_parse_keeps_empty_interior_segments() {
        let path = Path::parse("/named//docs").unwrap();
        assert_eq!(path.identifier(), Some(""));
        assert_eq!(path.extensions(), ["docs"]);
    }

    #[test]
    fn test_parse_rejects_unknown_scheme() {
        let err = Path::parse("/ipfs/abc").unwrap_err();
        assert!(matches!(err, Error::MalformedPath { .. }));
        assert!(matches!(Path::parse("/").unwrap_err(), Error::MalformedPath { .. }));
        assert!(matches!(Path::parse("").unwrap_err(), Error::MalformedPath { .. }));
        assert!(matches!(Path::parse("named/alice").unwrap_err(), Error::MalformedPath { .. }));
    }

    #[test]
    fn test_parse_bare_hash() {
        let hash = Hash::hash_bytes(b"bare");
        let path = Path::parse(&hash.to_hex()).unwrap();
        assert_eq!(path, Path::content(&hash, Vec::<String>::new()));
        assert_eq!(path.to_string(), format!("/content/{}", hash));
    }

    #[test]
    fn test_from_segments() {
        let path = Path::from_segments(["content", "abc", "x"]).unwrap();
        assert_eq!(path.to_string(), "/content/abc/x");

        let empty: Vec<String> = Vec::new();
        assert!(matches!(
            Path::from_segments(empty).unwrap_err(),
            Error::MalformedPath { .. }
        ));
        assert!(matches!(
            Path::from_segments(["bogus", "abc"]).unwrap_err(),
            Error::MalformedPath { .. }
        ));
    }

    #[test]
    fn test_join_appends_in_order() {
        let base = Path::parse("/content/QmXYZ").unwrap();
        let joined = base.join(["docs", "readme.txt"]).unwrap();
        assert_eq!(joined.to_string(), "/content/QmXYZ/docs/readme.txt");
        assert_eq!(base.to_string(), "/content/QmXYZ");
    }

    #[test]
    fn test_serde_as_string() {
        let path = Path::parse("/named/alice/a").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"/named/alice/a\"");
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<Path>("\"/nope/x\"").is_err());
    }

    use proptest::prelude::*;

    fn arb_segment() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9._-]{1,16}"
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Rendering then parsing preserves scheme and every segment.
        #[test]
        fn prop_render_parse_preserves_segments(
            named in any::<bool>(),
            id in arb_segment(),
            rest in prop::collection::vec(arb_segment(), 0..8),
        ) {
            let scheme = if named { Scheme::Named } else { Scheme::Content };
            let mut segments = vec![scheme.marker().to_string(), id];
            segments.extend(rest);

            let path = Path::from_segments(segments.clone())?;
            let reparsed = Path::parse(&path.to_string())?;
            prop_assert_eq!(reparsed.scheme(), scheme);
            prop_assert_eq!(reparsed.segments(), segments.as_slice());
        }
    }
}
