use pretty_assertions::assert_eq;
use xcg_generator::{
    emit::MemorySink,
    mapper::{Primitive, TargetType},
    Generator, GeneratorConfig,
};
use xcg_xsd::{MemoryResolver, SchemaSet};

const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
    targetNamespace="urn:times" xmlns="urn:times">
  <xs:complexType name="Times">
    <xs:sequence>
      <xs:element name="date" type="xs:date"/>
      <xs:element name="dateTime" type="xs:dateTime"/>
      <xs:element name="stamp" type="xs:dateTimeStamp" minOccurs="0"/>
      <xs:element name="time" type="xs:time"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

fn load(generator: &Generator) -> SchemaSet {
    let resolver = MemoryResolver::new().with_document("times.xsd", SCHEMA);
    generator.load(&["times.xsd"], &resolver).unwrap()
}

fn generate(config: GeneratorConfig) -> String {
    let generator = Generator::new(config);
    let set = load(&generator);
    let mut sink = MemorySink::new();
    let generated = generator.generate(&set, &mut sink).unwrap();
    assert!(generated.report.is_complete());
    sink.get("times.rs").unwrap().to_string()
}

fn mapped(config: GeneratorConfig, member: &str) -> (TargetType, Option<&'static str>) {
    let generator = Generator::new(config);
    let set = load(&generator);
    let (graph, _) = generator.build_graph(&set).unwrap();
    let times = graph
        .find(&xcg_xsd::QName::with_namespace("urn:times", "Times"))
        .unwrap();
    let property = graph
        .properties(times)
        .iter()
        .find(|p| p.name.local_name == member)
        .unwrap();
    (property.mapped.target, property.mapped.qualifier)
}

fn config(with_time_zone: bool, native_date_support: bool) -> GeneratorConfig {
    GeneratorConfig {
        with_time_zone,
        native_date_support,
        ..GeneratorConfig::default()
    }
}

#[test]
fn defaults_use_naive_types() {
    assert_eq!(
        mapped(config(false, true), "date"),
        (TargetType::Primitive(Primitive::NaiveDate), None)
    );
    assert_eq!(
        mapped(config(false, true), "dateTime"),
        (TargetType::Primitive(Primitive::NaiveDateTime), Some("dateTime"))
    );

    let source = generate(config(false, true));
    assert!(source.contains("pub date: chrono::NaiveDate,"));
    assert!(source.contains("/// Schema type: `dateTime`\n    #[serde(rename = \"dateTime\")]\n    pub date_time: chrono::NaiveDateTime,"));
    assert!(source.contains("pub time: chrono::NaiveTime,"));
}

#[test]
fn time_zone_switch_uses_offsets_for_both() {
    for member in ["date", "dateTime"] {
        assert_eq!(
            mapped(config(true, true), member),
            (TargetType::Primitive(Primitive::DateTimeOffset), None)
        );
        assert_eq!(
            mapped(config(true, false), member),
            (TargetType::Primitive(Primitive::DateTimeOffset), None)
        );
    }

    let source = generate(config(true, true));
    assert!(source.contains("pub date: chrono::DateTime<chrono::FixedOffset>,"));
    assert!(source.contains("pub date_time: chrono::DateTime<chrono::FixedOffset>,"));
    assert!(!source.contains("Schema type"));
}

#[test]
fn without_native_dates_a_date_is_a_timestamp() {
    assert_eq!(
        mapped(config(false, false), "date"),
        (TargetType::Primitive(Primitive::NaiveDateTime), None)
    );
    assert_eq!(
        mapped(config(false, false), "dateTime"),
        (TargetType::Primitive(Primitive::NaiveDateTime), Some("dateTime"))
    );
}

#[test]
fn date_time_stamp_always_carries_an_offset() {
    for (with_time_zone, native) in [(false, false), (false, true), (true, false), (true, true)] {
        assert_eq!(
            mapped(config(with_time_zone, native), "stamp"),
            (TargetType::Primitive(Primitive::DateTimeOffset), None)
        );
    }
    let source = generate(config(false, true));
    assert!(source.contains("pub stamp: Option<chrono::DateTime<chrono::FixedOffset>>,"));
}
