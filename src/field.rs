//! Tagged field values for ASTM records.
//!
//! Re-architected per `spec.md` §9 ("Dynamic field types") from the source's
//! untyped `str | list | None` fields into a variant that enforces its
//! nesting invariant at construction time rather than at serialization time:
//! a component holds only scalars, a repeated field holds only components.

use std::fmt;

/// One value within an ASTM record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// An empty field, encoded as nothing between its surrounding separators.
    Absent,
    /// A plain text value.
    Scalar(Vec<u8>),
    /// An ordered list of scalars, joined by the component separator.
    /// Trailing `Absent` components are stripped on encode.
    Component(Vec<ComponentItem>),
    /// An ordered list of components, joined by the repeat separator.
    /// Trailing absent repeats are preserved (the separator is not trimmed).
    Repeated(Vec<Vec<ComponentItem>>),
}

/// A single scalar slot inside a `Field::Component` or one repeat of a
/// `Field::Repeated`. Components may only nest scalars, never further
/// components or repeats — enforced here rather than left to serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentItem {
    Absent,
    Scalar(Vec<u8>),
}

impl ComponentItem {
    pub fn text(s: impl Into<String>) -> Self {
        ComponentItem::Scalar(s.into().into_bytes())
    }
}

impl Field {
    /// A scalar field built from any textual value.
    pub fn text(s: impl Into<String>) -> Self {
        Field::Scalar(s.into().into_bytes())
    }

    /// A scalar field built from raw bytes (used for non-ASCII/session
    /// encoded content).
    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Field::Scalar(b.into())
    }

    /// Builds a component field from scalar items.
    pub fn component(items: impl IntoIterator<Item = ComponentItem>) -> Self {
        Field::Component(items.into_iter().collect())
    }

    /// Builds a repeated-component field. Each repeat is itself a list of
    /// scalar items (a component).
    pub fn repeated(repeats: impl IntoIterator<Item = Vec<ComponentItem>>) -> Self {
        Field::Repeated(repeats.into_iter().collect())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    /// The scalar bytes of this field, if it is a plain scalar.
    pub fn as_scalar(&self) -> Option<&[u8]> {
        match self {
            Field::Scalar(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Absent => Ok(()),
            Field::Scalar(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Field::Component(items) => {
                write!(
                    f,
                    "{}",
                    items
                        .iter()
                        .map(|i| match i {
                            ComponentItem::Absent => String::new(),
                            ComponentItem::Scalar(b) => String::from_utf8_lossy(b).into_owned(),
                        })
                        .collect::<Vec<_>>()
                        .join("^")
                )
            }
            Field::Repeated(reps) => {
                write!(
                    f,
                    "{}",
                    reps.iter()
                        .map(|comp| comp
                            .iter()
                            .map(|i| match i {
                                ComponentItem::Absent => String::new(),
                                ComponentItem::Scalar(b) =>
                                    String::from_utf8_lossy(b).into_owned(),
                            })
                            .collect::<Vec<_>>()
                            .join("^"))
                        .collect::<Vec<_>>()
                        .join("\\")
                )
            }
        }
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Field::Absent
        } else {
            Field::text(s)
        }
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        if s.is_empty() {
            Field::Absent
        } else {
            Field::Scalar(s.into_bytes())
        }
    }
}

impl From<Option<&str>> for Field {
    fn from(s: Option<&str>) -> Self {
        match s {
            Some(s) => Field::from(s),
            None => Field::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_from_empty_str() {
        assert_eq!(Field::from(""), Field::Absent);
    }

    #[test]
    fn scalar_display() {
        assert_eq!(Field::text("H").to_string(), "H");
    }

    #[test]
    fn component_display_joins_with_caret() {
        let f = Field::component(vec![ComponentItem::text("A"), ComponentItem::text("B")]);
        assert_eq!(f.to_string(), "A^B");
    }

    #[test]
    fn repeated_display_joins_with_backslash() {
        let f = Field::repeated(vec![
            vec![ComponentItem::text("A")],
            vec![ComponentItem::text("B")],
        ]);
        assert_eq!(f.to_string(), "A\\B");
    }
}
