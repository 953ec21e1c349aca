use lazy_static::lazy_static;

use super::xstypes::{QName, XML_NAMESPACE};

// Namespaces used by XML Schema (pt. 1, §1.3.1)
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

lazy_static! {
    /// The `xs:anyType` qualified name
    pub static ref XS_ANY_TYPE_NAME: QName = QName::with_namespace(XS_NAMESPACE, "anyType");
    /// The `xs:anySimpleType` qualified name
    pub static ref XS_ANY_SIMPLE_TYPE_NAME: QName = QName::with_namespace(XS_NAMESPACE, "anySimpleType");
    /// The `xs:string` qualified name
    pub static ref XS_STRING_NAME: QName = QName::with_namespace(XS_NAMESPACE, "string");
}

/// Location under which the bundled schema for the XML namespace is registered.
pub const XML_NAMESPACE_LOCATION: &str = "builtin:xml.xsd";

/// Declarations of the XML namespace (`xml:lang`, `xml:space`, `xml:base`, `xml:id`), served
/// when a schema imports it without a location.
pub const XML_NAMESPACE_SCHEMA: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://www.w3.org/XML/1998/namespace">
  <xs:attribute name="lang">
    <xs:simpleType>
      <xs:union memberTypes="xs:language">
        <xs:simpleType>
          <xs:restriction base="xs:string">
            <xs:enumeration value=""/>
          </xs:restriction>
        </xs:simpleType>
      </xs:union>
    </xs:simpleType>
  </xs:attribute>
  <xs:attribute name="space">
    <xs:simpleType>
      <xs:restriction base="xs:NCName">
        <xs:enumeration value="default"/>
        <xs:enumeration value="preserve"/>
      </xs:restriction>
    </xs:simpleType>
  </xs:attribute>
  <xs:attribute name="base" type="xs:anyURI"/>
  <xs:attribute name="id" type="xs:ID"/>
</xs:schema>
"#;

pub fn is_xml_namespace(namespace: Option<&str>) -> bool {
    namespace == Some(XML_NAMESPACE)
}

/// The built-in datatypes of pt. 2, §3 plus the special types `anyType`, `anySimpleType` and
/// `anyAtomicType`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum XsBuiltin {
    AnyType,
    AnySimpleType,
    AnyAtomicType,
    String,
    NormalizedString,
    Token,
    Language,
    NmToken,
    NmTokens,
    Name,
    NcName,
    Id,
    IdRef,
    IdRefs,
    Entity,
    Entities,
    Boolean,
    Decimal,
    Integer,
    NonPositiveInteger,
    NegativeInteger,
    Long,
    Int,
    Short,
    Byte,
    NonNegativeInteger,
    PositiveInteger,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    Float,
    Double,
    Duration,
    DayTimeDuration,
    YearMonthDuration,
    DateTime,
    DateTimeStamp,
    Time,
    Date,
    GYearMonth,
    GYear,
    GMonthDay,
    GDay,
    GMonth,
    HexBinary,
    Base64Binary,
    AnyUri,
    QName,
    Notation,
}

impl XsBuiltin {
    pub fn from_qname(name: &QName) -> Option<Self> {
        if name.namespace() != Some(XS_NAMESPACE) {
            return None;
        }
        Self::from_local_name(&name.local_name)
    }

    pub fn from_local_name(name: &str) -> Option<Self> {
        use XsBuiltin::*;
        let builtin = match name {
            "anyType" => AnyType,
            "anySimpleType" => AnySimpleType,
            "anyAtomicType" => AnyAtomicType,
            "string" => String,
            "normalizedString" => NormalizedString,
            "token" => Token,
            "language" => Language,
            "NMTOKEN" => NmToken,
            "NMTOKENS" => NmTokens,
            "Name" => Name,
            "NCName" => NcName,
            "ID" => Id,
            "IDREF" => IdRef,
            "IDREFS" => IdRefs,
            "ENTITY" => Entity,
            "ENTITIES" => Entities,
            "boolean" => Boolean,
            "decimal" => Decimal,
            "integer" => Integer,
            "nonPositiveInteger" => NonPositiveInteger,
            "negativeInteger" => NegativeInteger,
            "long" => Long,
            "int" => Int,
            "short" => Short,
            "byte" => Byte,
            "nonNegativeInteger" => NonNegativeInteger,
            "positiveInteger" => PositiveInteger,
            "unsignedLong" => UnsignedLong,
            "unsignedInt" => UnsignedInt,
            "unsignedShort" => UnsignedShort,
            "unsignedByte" => UnsignedByte,
            "float" => Float,
            "double" => Double,
            "duration" => Duration,
            "dayTimeDuration" => DayTimeDuration,
            "yearMonthDuration" => YearMonthDuration,
            "dateTime" => DateTime,
            "dateTimeStamp" => DateTimeStamp,
            "time" => Time,
            "date" => Date,
            "gYearMonth" => GYearMonth,
            "gYear" => GYear,
            "gMonthDay" => GMonthDay,
            "gDay" => GDay,
            "gMonth" => GMonth,
            "hexBinary" => HexBinary,
            "base64Binary" => Base64Binary,
            "anyURI" => AnyUri,
            "QName" => QName,
            "NOTATION" => Notation,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn local_name(&self) -> &'static str {
        use XsBuiltin::*;
        match self {
            AnyType => "anyType",
            AnySimpleType => "anySimpleType",
            AnyAtomicType => "anyAtomicType",
            String => "string",
            NormalizedString => "normalizedString",
            Token => "token",
            Language => "language",
            NmToken => "NMTOKEN",
            NmTokens => "NMTOKENS",
            Name => "Name",
            NcName => "NCName",
            Id => "ID",
            IdRef => "IDREF",
            IdRefs => "IDREFS",
            Entity => "ENTITY",
            Entities => "ENTITIES",
            Boolean => "boolean",
            Decimal => "decimal",
            Integer => "integer",
            NonPositiveInteger => "nonPositiveInteger",
            NegativeInteger => "negativeInteger",
            Long => "long",
            Int => "int",
            Short => "short",
            Byte => "byte",
            NonNegativeInteger => "nonNegativeInteger",
            PositiveInteger => "positiveInteger",
            UnsignedLong => "unsignedLong",
            UnsignedInt => "unsignedInt",
            UnsignedShort => "unsignedShort",
            UnsignedByte => "unsignedByte",
            Float => "float",
            Double => "double",
            Duration => "duration",
            DayTimeDuration => "dayTimeDuration",
            YearMonthDuration => "yearMonthDuration",
            DateTime => "dateTime",
            DateTimeStamp => "dateTimeStamp",
            Time => "time",
            Date => "date",
            GYearMonth => "gYearMonth",
            GYear => "gYear",
            GMonthDay => "gMonthDay",
            GDay => "gDay",
            GMonth => "gMonth",
            HexBinary => "hexBinary",
            Base64Binary => "base64Binary",
            AnyUri => "anyURI",
            QName => "QName",
            Notation => "NOTATION",
        }
    }

    pub fn qname(&self) -> QName {
        QName::with_namespace(XS_NAMESPACE, self.local_name())
    }

    /// Built-in list types (pt. 2, §3.4) and the item type they are constructed from.
    pub fn list_item_type(&self) -> Option<Self> {
        match self {
            Self::NmTokens => Some(Self::NmToken),
            Self::IdRefs => Some(Self::IdRef),
            Self::Entities => Some(Self::Entity),
            _ => None,
        }
    }

    /// Whether the type is `xs:integer` or derived from it.
    pub fn is_integer(&self) -> bool {
        use XsBuiltin::*;
        matches!(
            self,
            Integer
                | NonPositiveInteger
                | NegativeInteger
                | Long
                | Int
                | Short
                | Byte
                | NonNegativeInteger
                | PositiveInteger
                | UnsignedLong
                | UnsignedInt
                | UnsignedShort
                | UnsignedByte
        )
    }

    /// The value space bounds of the integer types, `None` meaning unbounded on that side.
    pub fn integer_bounds(&self) -> Option<(Option<i128>, Option<i128>)> {
        use XsBuiltin::*;
        let bounds = match self {
            Integer => (None, None),
            NonPositiveInteger => (None, Some(0)),
            NegativeInteger => (None, Some(-1)),
            NonNegativeInteger => (Some(0), None),
            PositiveInteger => (Some(1), None),
            Long => (Some(i64::MIN as i128), Some(i64::MAX as i128)),
            Int => (Some(i32::MIN as i128), Some(i32::MAX as i128)),
            Short => (Some(i16::MIN as i128), Some(i16::MAX as i128)),
            Byte => (Some(i8::MIN as i128), Some(i8::MAX as i128)),
            UnsignedLong => (Some(0), Some(u64::MAX as i128)),
            UnsignedInt => (Some(0), Some(u32::MAX as i128)),
            UnsignedShort => (Some(0), Some(u16::MAX as i128)),
            UnsignedByte => (Some(0), Some(u8::MAX as i128)),
            _ => return None,
        };
        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_names_round_trip() {
        for name in ["dateTime", "NMTOKENS", "anyURI", "unsignedByte", "QName"] {
            let builtin = XsBuiltin::from_local_name(name).unwrap();
            assert_eq!(builtin.local_name(), name);
        }
        assert_eq!(XsBuiltin::from_local_name("datetime"), None);
    }

    #[test]
    fn builtins_require_the_xs_namespace() {
        let date = QName::with_namespace(XS_NAMESPACE, "date");
        assert_eq!(XsBuiltin::from_qname(&date), Some(XsBuiltin::Date));
        let foreign = QName::with_namespace("urn:other", "date");
        assert_eq!(XsBuiltin::from_qname(&foreign), None);
    }

    #[test]
    fn integer_family_bounds() {
        assert_eq!(
            XsBuiltin::NonNegativeInteger.integer_bounds(),
            Some((Some(0), None))
        );
        assert_eq!(
            XsBuiltin::UnsignedByte.integer_bounds(),
            Some((Some(0), Some(255)))
        );
        assert_eq!(XsBuiltin::Decimal.integer_bounds(), None);
        assert!(XsBuiltin::Short.is_integer());
        assert!(!XsBuiltin::Double.is_integer());
    }
}
