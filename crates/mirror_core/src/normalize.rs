use std::fmt;

use url::{ParseError, Url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The reference cannot be parsed as a URL at all.
    Malformed {
        reference: String,
        source: ParseError,
    },
    /// The reference is relative but no base location was supplied.
    MissingBase { reference: String },
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::Malformed { reference, source } => {
                write!(f, "malformed reference {reference:?}: {source}")
            }
            NormalizeError::MissingBase { reference } => {
                write!(f, "relative reference {reference:?} without a base location")
            }
        }
    }
}

impl std::error::Error for NormalizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NormalizeError::Malformed { source, .. } => Some(source),
            NormalizeError::MissingBase { .. } => None,
        }
    }
}

/// Turns a possibly-relative reference into an absolute, fragment-free URL.
///
/// An already-absolute reference is returned as-is apart from fragment
/// removal, so normalization is idempotent. A relative reference inherits
/// scheme and host from `base` and is joined against the directory of
/// `base`'s path, with dot segments collapsed.
pub fn normalize(reference: &str, base: Option<&Url>) -> Result<Url, NormalizeError> {
    let reference = reference.trim();
    match Url::parse(reference) {
        Ok(mut absolute) => {
            absolute.set_fragment(None);
            Ok(absolute)
        }
        Err(ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(|| NormalizeError::MissingBase {
                reference: reference.to_string(),
            })?;
            let mut resolved = base.join(reference).map_err(|source| NormalizeError::Malformed {
                reference: reference.to_string(),
                source,
            })?;
            resolved.set_fragment(None);
            Ok(resolved)
        }
        Err(source) => Err(NormalizeError::Malformed {
            reference: reference.to_string(),
            source,
        }),
    }
}
