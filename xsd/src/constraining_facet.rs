use roxmltree::Node;

use crate::{
    annotation::documentation,
    error::XsdError,
    values::{invalid, required_value, ActualValue},
};

/// Constraining facet (pt. 2, §4.3)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Facet {
    /// length (pt. 2, §4.3.1)
    Length(u64),
    /// minLength (pt. 2, §4.3.2)
    MinLength(u64),
    /// maxLength (pt. 2, §4.3.3)
    MaxLength(u64),
    /// pattern (pt. 2, §4.3.4)
    Pattern(String),
    /// enumeration (pt. 2, §4.3.5)
    Enumeration(Vec<EnumerationValue>),
    /// whiteSpace (pt. 2, §4.3.6)
    WhiteSpace(WhiteSpaceValue),
    /// maxInclusive (pt. 2, §4.3.7)
    MaxInclusive(String),
    /// maxExclusive (pt. 2, §4.3.8)
    MaxExclusive(String),
    /// minExclusive (pt. 2, §4.3.9)
    MinExclusive(String),
    /// minInclusive (pt. 2, §4.3.10)
    MinInclusive(String),
    /// totalDigits (pt. 2, §4.3.11)
    TotalDigits(u64),
    /// fractionDigits (pt. 2, §4.3.12)
    FractionDigits(u64),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumerationValue {
    pub value: String,
    pub documentation: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WhiteSpaceValue {
    Preserve,
    Replace,
    Collapse,
}

impl ActualValue<'_> for WhiteSpaceValue {
    fn convert(src: &str, attribute: &'static str) -> Result<Self, XsdError> {
        match src.trim() {
            "preserve" => Ok(Self::Preserve),
            "replace" => Ok(Self::Replace),
            "collapse" => Ok(Self::Collapse),
            _ => Err(invalid(attribute, src)),
        }
    }
}

impl WhiteSpaceValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Replace => "replace",
            Self::Collapse => "collapse",
        }
    }
}

impl Facet {
    /// The facet's element name in schema documents.
    pub fn name(&self) -> &'static str {
        match self {
            Facet::Length(_) => "length",
            Facet::MinLength(_) => "minLength",
            Facet::MaxLength(_) => "maxLength",
            Facet::Pattern(_) => "pattern",
            Facet::Enumeration(_) => "enumeration",
            Facet::WhiteSpace(_) => "whiteSpace",
            Facet::MaxInclusive(_) => "maxInclusive",
            Facet::MaxExclusive(_) => "maxExclusive",
            Facet::MinExclusive(_) => "minExclusive",
            Facet::MinInclusive(_) => "minInclusive",
            Facet::TotalDigits(_) => "totalDigits",
            Facet::FractionDigits(_) => "fractionDigits",
        }
    }

    /// Checks whether `self` is of the same kind as `other`. This effectively only compares the
    /// _discriminant_, i.e. ignores the data.
    pub fn is_of_same_kind_as(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn is_facet_tag(tag: &str) -> bool {
        matches!(
            tag,
            "length"
                | "minLength"
                | "maxLength"
                | "pattern"
                | "enumeration"
                | "whiteSpace"
                | "maxInclusive"
                | "maxExclusive"
                | "minExclusive"
                | "minInclusive"
                | "totalDigits"
                | "fractionDigits"
                | "assertion"
                | "explicitTimezone"
        )
    }

    /// Maps the facet children of a `<restriction>` to facets.
    ///
    /// `<pattern>` and `<enumeration>` may occur several times but map to a single facet each:
    /// multiple patterns are joined into one regular expression with `|`-separated branches,
    /// enumeration values are collected in document order.
    pub(crate) fn map_from_xml(facets: &[Node]) -> Result<Vec<Self>, XsdError> {
        let mut patterns = Vec::new();
        let mut enumerations = Vec::new();
        let mut mapped = Vec::new();

        for facet in facets.iter().copied() {
            let tag = facet.tag_name().name();
            let mapped_facet = match tag {
                "pattern" => {
                    patterns.push(required_value::<String>(facet, "pattern", "value")?);
                    continue;
                }
                "enumeration" => {
                    enumerations.push(EnumerationValue {
                        value: required_value::<String>(facet, "enumeration", "value")?,
                        documentation: documentation(facet),
                    });
                    continue;
                }
                "length" => Facet::Length(required_value(facet, "length", "value")?),
                "minLength" => Facet::MinLength(required_value(facet, "minLength", "value")?),
                "maxLength" => Facet::MaxLength(required_value(facet, "maxLength", "value")?),
                "whiteSpace" => Facet::WhiteSpace(required_value(facet, "whiteSpace", "value")?),
                "maxInclusive" => {
                    Facet::MaxInclusive(required_value(facet, "maxInclusive", "value")?)
                }
                "maxExclusive" => {
                    Facet::MaxExclusive(required_value(facet, "maxExclusive", "value")?)
                }
                "minInclusive" => {
                    Facet::MinInclusive(required_value(facet, "minInclusive", "value")?)
                }
                "minExclusive" => {
                    Facet::MinExclusive(required_value(facet, "minExclusive", "value")?)
                }
                "totalDigits" => Facet::TotalDigits(required_value(facet, "totalDigits", "value")?),
                "fractionDigits" => {
                    Facet::FractionDigits(required_value(facet, "fractionDigits", "value")?)
                }
                _ => {
                    tracing::debug!("ignoring unsupported facet <{tag}>");
                    continue;
                }
            };
            mapped.push(mapped_facet);
        }

        if !patterns.is_empty() {
            // If there is only one <pattern>, then the actual value of its value [attribute],
            // otherwise the concatenation of the actual values of all the <pattern> [children]'s
            // value [attributes], in order, separated by '|'.
            mapped.push(Facet::Pattern(patterns.join("|")));
        }
        if !enumerations.is_empty() {
            mapped.push(Facet::Enumeration(enumerations));
        }

        Ok(mapped)
    }
}

/// Lookup helpers over an ordered facet list.
pub trait FacetsExt {
    fn find_facet<T>(&self, f: impl Fn(&Facet) -> Option<T>) -> Option<T>;

    fn enumeration(&self) -> Option<&[EnumerationValue]>;
}

impl FacetsExt for [Facet] {
    fn find_facet<T>(&self, f: impl Fn(&Facet) -> Option<T>) -> Option<T> {
        self.iter().rev().find_map(f)
    }

    fn enumeration(&self) -> Option<&[EnumerationValue]> {
        self.iter().rev().find_map(|f| match f {
            Facet::Enumeration(values) => Some(values.as_slice()),
            _ => None,
        })
    }
}
