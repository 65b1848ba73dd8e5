//! Station name canonicalization.
//!
//! Source station lists spell the same stop in several ways
//! ("Friedrichstr." vs "Friedrichstraße", "Hermannstraße" vs
//! "Hermann-Strasse"). The canonical key collapses those spellings so the
//! geocoder is asked about each physical station once.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized form of a station name, used only as a cache key.
///
/// Built with [`CanonicalKey::from_raw`]; the display name of a station is
/// never replaced by its key.
///
/// # Examples
///
/// ```
/// use transit_map::stations::CanonicalKey;
///
/// let a = CanonicalKey::from_raw("  S+U Friedrichstraße ");
/// let b = CanonicalKey::from_raw("s+u friedrichstrasse");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "s+u friedrichstrasse");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Normalize a raw station name.
    pub fn from_raw(raw: &str) -> Self {
        CanonicalKey(normalize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalize a raw station name.
///
/// Steps, in order: trim, eszett to "ss", drop periods, hyphens to spaces,
/// lowercase, collapse whitespace runs. The final collapse also trims, so a
/// period or hyphen at either end cannot leave a stray space behind and the
/// function stays idempotent.
pub fn normalize(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .replace(['ß', 'ẞ'], "ss")
        .replace('.', "")
        .replace('-', " ")
        .to_lowercase();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
