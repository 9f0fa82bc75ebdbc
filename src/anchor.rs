//! Composite keys identifying annotation markers on a rendered page.
//!
//! A marker is addressed by `{opus}@{element}@{annotation}@{model}`. The
//! same key is used to create the marker, to remove it, and to look up the
//! annotation when it is clicked, so none of the four parts may contain
//! the separator.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScoreError};

/// Separator between the four components of a key.
pub const SEPARATOR: char = '@';

/// Characters escaped when an id is used in a CSS selector.
const SELECTOR_SPECIALS: &[char] = &[':', '.', '[', ']', ',', '=', '@'];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorKey {
    opus_ref: String,
    element_id: String,
    annotation_id: String,
    model_code: String,
}

impl AnchorKey {
    /// Build a key, rejecting empty components and components that contain
    /// the separator.
    pub fn new(
        opus_ref: &str,
        element_id: &str,
        annotation_id: &str,
        model_code: &str,
    ) -> Result<Self> {
        for part in [opus_ref, element_id, annotation_id, model_code] {
            if part.is_empty() || part.contains(SEPARATOR) {
                return Err(ScoreError::InvalidAnchorKey(format!(
                    "{opus_ref}{SEPARATOR}{element_id}{SEPARATOR}{annotation_id}{SEPARATOR}{model_code}"
                )));
            }
        }
        Ok(Self {
            opus_ref: opus_ref.to_string(),
            element_id: element_id.to_string(),
            annotation_id: annotation_id.to_string(),
            model_code: model_code.to_string(),
        })
    }

    pub fn opus_ref(&self) -> &str {
        &self.opus_ref
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn annotation_id(&self) -> &str {
        &self.annotation_id
    }

    pub fn model_code(&self) -> &str {
        &self.model_code
    }

    /// `#`-prefixed selector with the reserved characters backslash-escaped.
    pub fn css_selector(&self) -> String {
        css_id_selector(&self.to_string())
    }
}

impl fmt::Display for AnchorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            self.opus_ref, self.element_id, self.annotation_id, self.model_code
        )
    }
}

impl FromStr for AnchorKey {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        match parts.as_slice() {
            [opus, element, annotation, model] => AnchorKey::new(opus, element, annotation, model),
            _ => Err(ScoreError::InvalidAnchorKey(s.to_string())),
        }
    }
}

/// Id of the glyph path inside the marker of an element.
pub fn icon_id(element_id: &str) -> String {
    format!("icon:{element_id}")
}

/// Escape an arbitrary id for use in a CSS `#id` selector.
pub fn css_id_selector(id: &str) -> String {
    let mut out = String::with_capacity(id.len() + 8);
    out.push('#');
    for c in id.chars() {
        if SELECTOR_SPECIALS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_escapes_reserved_characters() {
        let key = AnchorKey::new("coll:opus.1", "n12", "5", "quality").unwrap();
        assert_eq!(key.css_selector(), r"#coll\:opus\.1\@n12\@5\@quality");
    }

    #[test]
    fn display_and_parse_round_trip() {
        let key = AnchorKey::new("corpus:opusA", "n12", "5", "quality").unwrap();
        assert_eq!(key.to_string(), "corpus:opusA@n12@5@quality");
        let back: AnchorKey = key.to_string().parse().unwrap();
        assert_eq!(back, key);
        assert_eq!(back.element_id(), "n12");
        assert_eq!(back.annotation_id(), "5");
    }

    #[test]
    fn parts_may_not_contain_the_separator() {
        assert!(AnchorKey::new("opus", "n1", "a@b", "quality").is_err());
        assert!(AnchorKey::new("", "n1", "5", "quality").is_err());
    }

    #[test]
    fn parse_requires_four_parts() {
        assert!("a@b@c".parse::<AnchorKey>().is_err());
        assert!("a@b@c@d@e".parse::<AnchorKey>().is_err());
        assert!("a@@c@d".parse::<AnchorKey>().is_err());
    }
}
