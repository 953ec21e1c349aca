use roxmltree::Node;

use crate::error::XsdError;
use crate::particle::MaxOccurs;

/// Conversion of an attribute's literal into its ·actual value·.
pub trait ActualValue<'a>: Sized {
    fn convert(src: &'a str, attribute: &'static str) -> Result<Self, XsdError>;
}

impl<'a> ActualValue<'a> for &'a str {
    fn convert(src: &'a str, _attribute: &'static str) -> Result<Self, XsdError> {
        Ok(src)
    }
}

impl ActualValue<'_> for String {
    fn convert(src: &str, _attribute: &'static str) -> Result<Self, XsdError> {
        Ok(src.to_string())
    }
}

impl ActualValue<'_> for bool {
    fn convert(src: &str, attribute: &'static str) -> Result<Self, XsdError> {
        match src.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(invalid(attribute, src)),
        }
    }
}

impl ActualValue<'_> for u64 {
    fn convert(src: &str, attribute: &'static str) -> Result<Self, XsdError> {
        src.trim().parse().map_err(|_| invalid(attribute, src))
    }
}

impl ActualValue<'_> for MaxOccurs {
    fn convert(src: &str, attribute: &'static str) -> Result<Self, XsdError> {
        // unbounded, if the maxOccurs [attribute] equals unbounded, otherwise the ·actual value·
        // of the maxOccurs [attribute]
        match src.trim() {
            "unbounded" => Ok(MaxOccurs::Unbounded),
            other => u64::convert(other, attribute).map(MaxOccurs::Count),
        }
    }
}

pub(crate) fn invalid(attribute: &'static str, value: &str) -> XsdError {
    XsdError::InvalidValue {
        attribute,
        value: value.to_string(),
    }
}

/// Reads and converts an optional attribute.
pub fn actual_value<'a, T: ActualValue<'a>>(
    node: Node<'a, '_>,
    attribute: &'static str,
) -> Result<Option<T>, XsdError> {
    node.attribute(attribute)
        .map(|v| T::convert(v, attribute))
        .transpose()
}

/// Reads and converts an attribute that must be present on `node`.
pub fn required_value<'a, T: ActualValue<'a>>(
    node: Node<'a, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<T, XsdError> {
    actual_value(node, attribute)?.ok_or(XsdError::MissingAttribute { element, attribute })
}

/// Collapses whitespace as the `collapse` whiteSpace facet does for documentation text.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_occurs_parses_unbounded_and_counts() {
        assert_eq!(
            MaxOccurs::convert("unbounded", "maxOccurs").unwrap(),
            MaxOccurs::Unbounded
        );
        assert_eq!(
            MaxOccurs::convert(" 3 ", "maxOccurs").unwrap(),
            MaxOccurs::Count(3)
        );
        assert!(MaxOccurs::convert("many", "maxOccurs").is_err());
    }

    #[test]
    fn booleans_accept_lexical_forms() {
        assert!(bool::convert("1", "abstract").unwrap());
        assert!(!bool::convert("false", "abstract").unwrap());
        assert!(bool::convert("yes", "abstract").is_err());
    }

    #[test]
    fn collapse_whitespace_joins_words() {
        assert_eq!(collapse_whitespace("  a\n\tb  c "), "a b c");
    }
}
