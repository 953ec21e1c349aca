//! Chooses the Rust type and cardinality of every property.

use xcg_xsd::{Facet, FacetsExt, MaxOccurs, XsBuiltin};

use crate::{
    config::GeneratorConfig,
    graph::{Property, PropertyKind, TypeGraph, TypeKind, TypeRef, Variety},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Cardinality {
    #[default]
    Required,
    Optional,
    /// Zero or more values; never additionally optional.
    Collection,
}

/// Target types that are not generated but taken from Rust or well-known crates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    BigInt,
    Decimal,
    F32,
    F64,
    String,
    DateTimeOffset,
    NaiveDate,
    NaiveDateTime,
    NaiveTime,
    Bytes,
    /// Raw XML of `anyType` content and wildcards.
    AnyXml,
}

impl Primitive {
    /// The Rust type the primitive is emitted as.
    pub fn rust_type(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::BigInt => "num_bigint::BigInt",
            Self::Decimal => "rust_decimal::Decimal",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String | Self::AnyXml => "String",
            Self::DateTimeOffset => "chrono::DateTime<chrono::FixedOffset>",
            Self::NaiveDate => "chrono::NaiveDate",
            Self::NaiveDateTime => "chrono::NaiveDateTime",
            Self::NaiveTime => "chrono::NaiveTime",
            Self::Bytes => "Vec<u8>",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetType {
    Primitive(Primitive),
    /// A generated type (complex type or enumeration).
    Type(TypeRef),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MappedType {
    pub target: TargetType,
    /// Serialization hint for targets that do not identify their schema type on their own.
    pub qualifier: Option<&'static str>,
    /// The declared type is a list type; each value holds several items.
    pub list: bool,
}

impl Default for MappedType {
    fn default() -> Self {
        Self::primitive(Primitive::String)
    }
}

impl MappedType {
    fn primitive(primitive: Primitive) -> Self {
        Self {
            target: TargetType::Primitive(primitive),
            qualifier: None,
            list: false,
        }
    }
}

/// `minOccurs == 0` with at most one occurrence is optional, more than one occurrence (or a
/// list type) is a collection, anything else is required.
pub fn cardinality(min_occurs: u64, max_occurs: MaxOccurs, list: bool) -> Cardinality {
    if list || max_occurs.is_repeated() {
        Cardinality::Collection
    } else if min_occurs == 0 {
        Cardinality::Optional
    } else {
        Cardinality::Required
    }
}

/// The date/time decision table.
///
/// | schema type | with_time_zone | native_date_support | target | qualifier |
/// |---|---|---|---|---|
/// | `date`, `dateTime` | true | either | `DateTime<FixedOffset>` | none |
/// | `date` | false | true | `NaiveDate` | none |
/// | `date` | false | false | `NaiveDateTime` | none |
/// | `dateTime` | false | either | `NaiveDateTime` | `dateTime` |
pub fn map_date_time(
    builtin: XsBuiltin,
    with_time_zone: bool,
    native_date_support: bool,
) -> (Primitive, Option<&'static str>) {
    match (builtin, with_time_zone, native_date_support) {
        (_, true, _) => (Primitive::DateTimeOffset, None),
        (XsBuiltin::Date, false, true) => (Primitive::NaiveDate, None),
        (XsBuiltin::Date, false, false) => (Primitive::NaiveDateTime, None),
        (_, false, _) => (Primitive::NaiveDateTime, Some("dateTime")),
    }
}

/// Maps an atomic built-in together with the facets restricting it.
pub fn map_builtin(
    builtin: XsBuiltin,
    facets: &[Facet],
    config: &GeneratorConfig,
) -> (Primitive, Option<&'static str>) {
    use XsBuiltin::*;
    let primitive = match builtin {
        Boolean => Primitive::Bool,
        Float => Primitive::F32,
        Double => Primitive::F64,
        Long => Primitive::I64,
        Int => Primitive::I32,
        Short => Primitive::I16,
        Byte => Primitive::I8,
        UnsignedLong => Primitive::U64,
        UnsignedInt => Primitive::U32,
        UnsignedShort => Primitive::U16,
        UnsignedByte => Primitive::U8,
        Integer | NonPositiveInteger | NegativeInteger | NonNegativeInteger | PositiveInteger => {
            integer_primitive(builtin.integer_bounds().unwrap_or((None, None)), facets)
        }
        Decimal => {
            if facets.find_facet(fraction_digits) == Some(0) {
                integer_primitive((None, None), facets)
            } else {
                Primitive::Decimal
            }
        }
        Date | DateTime => {
            return map_date_time(builtin, config.with_time_zone, config.native_date_support)
        }
        // A timezone is mandatory in the value space
        DateTimeStamp => Primitive::DateTimeOffset,
        Time => Primitive::NaiveTime,
        HexBinary | Base64Binary => Primitive::Bytes,
        AnyType => Primitive::AnyXml,
        _ => Primitive::String,
    };
    (primitive, None)
}

fn fraction_digits(facet: &Facet) -> Option<u64> {
    match facet {
        Facet::FractionDigits(digits) => Some(*digits),
        _ => None,
    }
}

const INTEGER_LADDER: [(Primitive, i128, i128); 8] = [
    (Primitive::U8, u8::MIN as i128, u8::MAX as i128),
    (Primitive::I8, i8::MIN as i128, i8::MAX as i128),
    (Primitive::U16, u16::MIN as i128, u16::MAX as i128),
    (Primitive::I16, i16::MIN as i128, i16::MAX as i128),
    (Primitive::U32, u32::MIN as i128, u32::MAX as i128),
    (Primitive::I32, i32::MIN as i128, i32::MAX as i128),
    (Primitive::U64, u64::MIN as i128, u64::MAX as i128),
    (Primitive::I64, i64::MIN as i128, i64::MAX as i128),
];

/// Picks the smallest integer type holding the value range given by the built-in's bounds
/// and the range facets; unbounded ranges need an arbitrary precision integer.
pub fn integer_primitive(bounds: (Option<i128>, Option<i128>), facets: &[Facet]) -> Primitive {
    let (mut min, mut max) = bounds;
    let mut raise = |value: i128| min = Some(min.map_or(value, |m| m.max(value)));
    for facet in facets {
        match facet {
            Facet::MinInclusive(v) => parse_integer(v).into_iter().for_each(&mut raise),
            Facet::MinExclusive(v) => parse_integer(v)
                .map(|v| v.saturating_add(1))
                .into_iter()
                .for_each(&mut raise),
            _ => {}
        }
    }
    let mut lower = |value: i128| max = Some(max.map_or(value, |m| m.min(value)));
    for facet in facets {
        match facet {
            Facet::MaxInclusive(v) => parse_integer(v).into_iter().for_each(&mut lower),
            Facet::MaxExclusive(v) => parse_integer(v)
                .map(|v| v.saturating_sub(1))
                .into_iter()
                .for_each(&mut lower),
            _ => {}
        }
    }
    if let Some(digits) = facets.find_facet(|f| match f {
        Facet::TotalDigits(digits) => Some(*digits),
        _ => None,
    }) {
        if let Some(limit) = u32::try_from(digits)
            .ok()
            .and_then(|digits| 10i128.checked_pow(digits))
        {
            let limit = limit - 1;
            min = Some(min.map_or(-limit, |m| m.max(-limit)));
            max = Some(max.map_or(limit, |m| m.min(limit)));
        }
    }

    let (Some(min), Some(max)) = (min, max) else {
        return Primitive::BigInt;
    };
    INTEGER_LADDER
        .iter()
        .find(|(_, lo, hi)| min >= *lo && max <= *hi)
        .map_or(Primitive::BigInt, |(primitive, _, _)| *primitive)
}

fn parse_integer(literal: &str) -> Option<i128> {
    let literal = literal.trim();
    let literal = literal.strip_prefix('+').unwrap_or(literal);
    literal.parse().ok()
}

/// Maps the declared type of a property and derives its cardinality.
pub(crate) fn map_property(
    graph: &TypeGraph,
    property: &Property,
    config: &GeneratorConfig,
) -> (MappedType, Cardinality) {
    if matches!(property.kind, PropertyKind::Any | PropertyKind::AnyAttribute) {
        return (
            MappedType::primitive(Primitive::AnyXml),
            cardinality(property.min_occurs, property.max_occurs, false),
        );
    }
    let mapped = map_type(graph, property.target, config);
    let cardinality = cardinality(property.min_occurs, property.max_occurs, mapped.list);
    (mapped, cardinality)
}

fn map_type(graph: &TypeGraph, target: TypeRef, config: &GeneratorConfig) -> MappedType {
    match &graph.get(target).kind {
        TypeKind::Simple(simple) => match &simple.variety {
            Variety::Atomic => {
                let (primitive, qualifier) = map_builtin(simple.builtin, &simple.facets, config);
                MappedType {
                    qualifier,
                    ..MappedType::primitive(primitive)
                }
            }
            Variety::List { item } => {
                let item = match &graph.get(*item).kind {
                    TypeKind::Simple(simple) if matches!(simple.variety, Variety::Atomic) => {
                        map_type(graph, *item, config)
                    }
                    TypeKind::Enumeration(_) => map_type(graph, *item, config),
                    _ => MappedType::primitive(Primitive::String),
                };
                MappedType { list: true, ..item }
            }
            Variety::Union { .. } => MappedType::primitive(Primitive::String),
        },
        TypeKind::Enumeration(_) | TypeKind::Complex(_) => MappedType {
            target: TargetType::Type(target),
            qualifier: None,
            list: false,
        },
        TypeKind::Group(_) | TypeKind::AttributeGroup(_) => {
            MappedType::primitive(Primitive::AnyXml)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cardinality_boundaries() {
        use MaxOccurs::*;
        assert_eq!(cardinality(1, Count(1), false), Cardinality::Required);
        assert_eq!(cardinality(0, Count(1), false), Cardinality::Optional);
        assert_eq!(cardinality(0, Count(2), false), Cardinality::Collection);
        assert_eq!(cardinality(1, Unbounded, false), Cardinality::Collection);
        assert_eq!(cardinality(2, Count(2), false), Cardinality::Collection);
        assert_eq!(cardinality(1, Count(1), true), Cardinality::Collection);
    }

    #[test]
    fn date_time_decision_table() {
        use Primitive::*;
        use XsBuiltin::{Date, DateTime};
        let cases = [
            (DateTime, true, true, DateTimeOffset, None),
            (DateTime, true, false, DateTimeOffset, None),
            (DateTime, false, true, NaiveDateTime, Some("dateTime")),
            (DateTime, false, false, NaiveDateTime, Some("dateTime")),
            (Date, true, true, DateTimeOffset, None),
            (Date, true, false, DateTimeOffset, None),
            (Date, false, true, NaiveDate, None),
            (Date, false, false, NaiveDateTime, None),
        ];
        for (builtin, tz, native, primitive, qualifier) in cases {
            assert_eq!(
                map_date_time(builtin, tz, native),
                (primitive, qualifier),
                "{builtin:?} tz={tz} native={native}"
            );
        }
    }

    #[test]
    fn integer_ladder_picks_the_smallest_type() {
        let bounded = |min: &str, max: &str| {
            vec![
                Facet::MinInclusive(min.to_string()),
                Facet::MaxInclusive(max.to_string()),
            ]
        };
        assert_eq!(integer_primitive((None, None), &bounded("0", "200")), Primitive::U8);
        assert_eq!(integer_primitive((None, None), &bounded("-1", "100")), Primitive::I8);
        assert_eq!(integer_primitive((None, None), &bounded("-1", "200")), Primitive::I16);
        assert_eq!(
            integer_primitive((None, None), &bounded("0", "4294967295")),
            Primitive::U32
        );
        assert_eq!(
            integer_primitive(
                (None, None),
                &[
                    Facet::MinExclusive("-1".into()),
                    Facet::MaxExclusive("256".into())
                ]
            ),
            Primitive::U8
        );
        assert_eq!(integer_primitive((None, None), &[]), Primitive::BigInt);
        assert_eq!(integer_primitive((Some(0), None), &[]), Primitive::BigInt);
        assert_eq!(
            integer_primitive((None, None), &bounded("0", "18446744073709551616")),
            Primitive::BigInt
        );
    }

    #[test]
    fn total_digits_bound_the_range() {
        assert_eq!(
            integer_primitive((Some(0), None), &[Facet::TotalDigits(2)]),
            Primitive::U8
        );
        assert_eq!(
            integer_primitive((None, None), &[Facet::TotalDigits(4)]),
            Primitive::I16
        );
        assert_eq!(
            integer_primitive((None, None), &[Facet::TotalDigits(40)]),
            Primitive::BigInt
        );
    }

    #[test]
    fn builtins_and_decimals() {
        let config = GeneratorConfig::default();
        assert_eq!(
            map_builtin(XsBuiltin::Int, &[Facet::MaxInclusive("3".into())], &config),
            (Primitive::I32, None)
        );
        assert_eq!(
            map_builtin(XsBuiltin::Decimal, &[], &config),
            (Primitive::Decimal, None)
        );
        assert_eq!(
            map_builtin(
                XsBuiltin::Decimal,
                &[Facet::FractionDigits(0), Facet::TotalDigits(9)],
                &config
            ),
            (Primitive::I32, None)
        );
        assert_eq!(
            map_builtin(XsBuiltin::PositiveInteger, &[Facet::MaxInclusive("10".into())], &config),
            (Primitive::U8, None)
        );
        assert_eq!(
            map_builtin(XsBuiltin::Base64Binary, &[], &config).0,
            Primitive::Bytes
        );
        assert_eq!(map_builtin(XsBuiltin::AnyUri, &[], &config).0, Primitive::String);
        assert_eq!(map_builtin(XsBuiltin::Time, &[], &config).0, Primitive::NaiveTime);
    }
}
