use std::{
    io,
    path::{Path, PathBuf},
    sync::{atomic::AtomicBool, Arc},
};

use pretty_assertions::assert_eq;
use xcg_generator::{
    emit::{self, DryRunSink, FileSink, MemorySink},
    graph::PropertyKind,
    ArtifactGrouping, CaseTransform, Diagnostic, Generator, GeneratorConfig, MemberAnnotations, MemberInfo,
    MemberVisitor, OutputSink,
};
use xcg_xsd::{MemoryResolver, SchemaSet};

const ORDERS: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
    targetNamespace="urn:orders" xmlns="urn:orders">
  <xs:element name="order" type="Order"/>
  <xs:complexType name="Order">
    <xs:annotation><xs:documentation>A customer order.</xs:documentation></xs:annotation>
    <xs:sequence>
      <xs:element name="id" type="xs:string"/>
      <xs:element name="status" type="Status"/>
      <xs:element name="note" type="xs:string" minOccurs="0"/>
      <xs:element name="line" type="Line" maxOccurs="unbounded"/>
      <xs:element name="parent" type="Order" minOccurs="0"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:int"/>
  </xs:complexType>
  <xs:complexType name="Line">
    <xs:sequence>
      <xs:element name="sku" type="xs:string"/>
      <xs:element name="quantity" type="xs:positiveInteger"/>
    </xs:sequence>
  </xs:complexType>
  <xs:simpleType name="Status">
    <xs:restriction base="xs:string">
      <xs:enumeration value="open"/>
      <xs:enumeration value="in-stock"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

fn load(generator: &Generator, documents: &[(&str, &str)]) -> SchemaSet {
    let resolver = documents
        .iter()
        .fold(MemoryResolver::new(), |resolver, (name, text)| {
            resolver.with_document(*name, *text)
        });
    generator.load(&[documents[0].0], &resolver).unwrap()
}

fn per_type() -> GeneratorConfig {
    GeneratorConfig {
        artifact_grouping: ArtifactGrouping::PerType,
        ..GeneratorConfig::default()
    }
}

fn generate_in_memory(generator: &Generator) -> (MemorySink, Vec<Diagnostic>) {
    let set = load(generator, &[("orders.xsd", ORDERS)]);
    let mut sink = MemorySink::new();
    let generated = generator.generate(&set, &mut sink).unwrap();
    assert!(generated.report.is_complete());
    (sink, generated.diagnostics)
}

#[test]
fn single_file_holds_the_whole_namespace() {
    let (sink, diagnostics) = generate_in_memory(&Generator::default());
    assert_eq!(
        sink.files().keys().cloned().collect::<Vec<_>>(),
        [PathBuf::from("orders.rs")]
    );

    let source = sink.get("orders.rs").unwrap();
    assert!(source.starts_with("//! Generated by xcg-generator"));
    assert!(source.contains("/// A customer order.\n"));
    assert!(source.contains("pub struct Order {"));
    assert!(source.contains("pub id: String,"));
    assert!(source.contains("pub id_attr: Option<i32>,"));
    assert!(source.contains("pub status: Status,"));
    assert!(source.contains("pub note: Option<String>,"));
    assert!(source.contains("pub line: Vec<Line>,"));
    assert!(source.contains("pub parent: Option<Box<Order>>,"));
    assert!(source.contains("pub quantity: num_bigint::BigInt,"));
    assert!(source.contains("pub enum Status {"));
    assert!(source.contains("\"in-stock\" => Ok(Self::InStock),"));
    assert!(source.contains("Self::Open => \"open\","));

    assert_eq!(
        diagnostics,
        [Diagnostic::NameCollision {
            scope: "type Order".to_string(),
            preferred: "id".to_string(),
            assigned: "id_attr".to_string(),
        }]
    );
}

#[test]
fn per_type_files_come_with_a_module_index() {
    let (sink, _) = generate_in_memory(&Generator::new(per_type()));
    assert_eq!(
        sink.files().keys().cloned().collect::<Vec<_>>(),
        [
            PathBuf::from("orders/Order.rs"),
            PathBuf::from("orders/Line.rs"),
            PathBuf::from("orders/Status.rs"),
            PathBuf::from("orders/mod.rs"),
        ]
    );

    let order = sink.get("orders/Order.rs").unwrap();
    assert!(order.contains("use super::*;"));
    assert!(order.contains("pub struct Order {"));
    assert!(!order.contains("pub struct Line"));

    let index = sink.get("orders/mod.rs").unwrap();
    assert!(index.contains("#[path = \"Order.rs\"]\nmod order;"));
    assert!(index.contains("pub use status::*;"));
}

#[test]
fn output_is_deterministic() {
    let generator = Generator::new(per_type());
    let (first, _) = generate_in_memory(&generator);
    let (second, _) = generate_in_memory(&generator);
    assert_eq!(
        first.into_files().into_iter().collect::<Vec<_>>(),
        second.into_files().into_iter().collect::<Vec<_>>()
    );
}

#[test]
fn planning_follows_the_grouping() {
    let generator = Generator::default();
    let set = load(&generator, &[("orders.xsd", ORDERS)]);
    let (resolved, _) = generator.resolve(&set).unwrap();

    let single = emit::plan(&resolved, ArtifactGrouping::SingleFile);
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].types.len(), 3);
    assert_eq!(single[0].namespace, "orders");

    let per_type = emit::plan(&resolved, ArtifactGrouping::PerType);
    assert_eq!(per_type.len(), 4);
    assert!(per_type.iter().all(|artifact| artifact.path.starts_with("orders")));
}

const AWKWARD_NAMES: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
    targetNamespace="urn:p">
  <xs:complexType name="_1st"/>
  <xs:complexType name="mod"/>
  <xs:complexType name="Mod"/>
</xs:schema>"#;

#[test]
fn per_type_modules_are_legal_for_names_starting_with_a_digit() {
    let generator = Generator::new(per_type());
    let set = load(&generator, &[("p.xsd", AWKWARD_NAMES)]);
    let mut sink = MemorySink::new();

    let generated = generator.generate(&set, &mut sink).unwrap();

    assert!(generated.report.is_complete());
    let index = sink.get("p/mod.rs").unwrap();
    assert!(index.contains("#[path = \"_1st.rs\"]\nmod _1st;"));
    assert!(sink.get("p/_1st.rs").unwrap().contains("pub struct _1st {"));
}

#[test]
fn a_type_named_mod_does_not_replace_the_module_index() {
    let generator = Generator::new(GeneratorConfig {
        case_transform: CaseTransform::Direct,
        ..per_type()
    });
    let set = load(&generator, &[("p.xsd", AWKWARD_NAMES)]);
    let mut sink = MemorySink::new();

    let generated = generator.generate(&set, &mut sink).unwrap();

    assert_eq!(
        generated.report.written,
        [
            PathBuf::from("p/_1st.rs"),
            PathBuf::from("p/mod2.rs"),
            PathBuf::from("p/Mod3.rs"),
            PathBuf::from("p/mod.rs"),
        ]
    );
    assert_eq!(sink.files().len(), 4);
    assert!(sink.get("p/mod2.rs").unwrap().contains("pub struct r#mod {"));
    let index = sink.get("p/mod.rs").unwrap();
    assert!(index.contains("#[path = \"mod2.rs\"]\nmod mod_;"));
    assert!(index.contains("#[path = \"Mod3.rs\"]\nmod mod_2;"));
}

/// Fails every write to one path and keeps the rest in memory.
struct FailingSink {
    failing: PathBuf,
    inner: MemorySink,
}

impl OutputSink for FailingSink {
    fn create_dir(&mut self, path: &Path) -> io::Result<()> {
        self.inner.create_dir(path)
    }

    fn write(&mut self, path: &Path, text: &str) -> io::Result<()> {
        if path == self.failing {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.inner.write(path, text)
    }
}

#[test]
fn a_failed_write_does_not_stop_the_others() {
    let generator = Generator::new(per_type());
    let set = load(&generator, &[("orders.xsd", ORDERS)]);
    let mut sink = FailingSink {
        failing: PathBuf::from("orders/Line.rs"),
        inner: MemorySink::new(),
    };

    let generated = generator.generate(&set, &mut sink).unwrap();

    let report = generated.report;
    assert!(!report.is_complete());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, Path::new("orders/Line.rs"));
    assert_eq!(report.failures[0].source.kind(), io::ErrorKind::PermissionDenied);
    assert_eq!(
        report.written,
        [
            PathBuf::from("orders/Order.rs"),
            PathBuf::from("orders/Status.rs"),
            PathBuf::from("orders/mod.rs"),
        ]
    );
    assert_eq!(sink.inner.files().len(), 3);
}

#[test]
fn file_sink_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("out").join("nested");
    let generator = Generator::new(per_type());
    let set = load(&generator, &[("orders.xsd", ORDERS)]);
    let mut sink = FileSink::new(&root);

    let generated = generator.generate(&set, &mut sink).unwrap();

    assert!(generated.report.is_complete());
    assert_eq!(sink.written().len(), 4);
    let order = std::fs::read_to_string(root.join("orders").join("Order.rs")).unwrap();
    assert!(order.contains("pub struct Order {"));
    assert!(root.join("orders").join("mod.rs").is_file());
}

#[test]
fn missing_destination_fails_every_write_when_not_created() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("missing");
    let generator = Generator::new(GeneratorConfig {
        create_destination_if_missing: false,
        ..GeneratorConfig::default()
    });
    let set = load(&generator, &[("orders.xsd", ORDERS)]);

    let generated = generator
        .generate(&set, &mut FileSink::new(&root))
        .unwrap();

    assert!(generated.report.written.is_empty());
    assert_eq!(generated.report.failures.len(), 1);
    assert!(!root.exists());
}

#[test]
fn dry_run_lists_paths_without_writing() {
    let generator = Generator::new(per_type());
    let set = load(&generator, &[("orders.xsd", ORDERS)]);
    let mut sink = DryRunSink::new();

    let generated = generator.generate(&set, &mut sink).unwrap();

    assert_eq!(sink.paths(), generated.report.written.as_slice());
    assert_eq!(sink.paths().len(), 4);
}

#[test]
fn cancelled_emission_writes_nothing() {
    let generator =
        Generator::new(per_type()).with_cancellation(Arc::new(AtomicBool::new(true)));
    let set = load(&generator, &[("orders.xsd", ORDERS)]);
    let mut sink = MemorySink::new();

    let generated = generator.generate(&set, &mut sink).unwrap();

    assert!(generated.report.cancelled);
    assert!(generated.report.written.is_empty());
    assert!(sink.files().is_empty());
}

const CATALOG: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
    targetNamespace="urn:catalog" xmlns:p="urn:products">
  <xs:import namespace="urn:products" schemaLocation="products.xsd"/>
  <xs:complexType name="Catalog">
    <xs:sequence>
      <xs:element name="product" type="p:Product" maxOccurs="unbounded"/>
      <xs:element name="featured" type="p:Product" minOccurs="0"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

const PRODUCTS: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
    targetNamespace="urn:products">
  <xs:complexType name="Product">
    <xs:attribute name="sku" type="xs:string" use="required"/>
  </xs:complexType>
</xs:schema>"#;

#[test]
fn types_of_other_namespaces_are_referenced_through_their_module() {
    let generator = Generator::default();
    let set = load(&generator, &[("catalog.xsd", CATALOG), ("products.xsd", PRODUCTS)]);
    let mut sink = MemorySink::new();
    generator.generate(&set, &mut sink).unwrap();

    let catalog = sink.get("catalog.rs").unwrap();
    assert!(catalog.contains("pub product: Vec<super::products::Product>,"));
    assert!(catalog.contains("pub featured: Option<super::products::Product>,"));
    let products = sink.get("products.rs").unwrap();
    assert!(products.contains("pub sku: String,"));
}

#[test]
fn per_type_files_reach_other_namespaces_from_one_level_deeper() {
    let generator = Generator::new(per_type());
    let set = load(&generator, &[("catalog.xsd", CATALOG), ("products.xsd", PRODUCTS)]);
    let mut sink = MemorySink::new();
    generator.generate(&set, &mut sink).unwrap();

    let catalog = sink.get("catalog/Catalog.rs").unwrap();
    assert!(catalog.contains("pub product: Vec<super::super::products::Product>,"));
}

struct Audit;

impl MemberVisitor for Audit {
    fn visit_member(&self, member: MemberInfo<'_>, annotations: &mut MemberAnnotations) {
        if member.kind == PropertyKind::Attribute {
            annotations.docs.push(format!("Audited on {}.", member.owner));
            annotations.attributes.push("#[serde(skip)]".to_string());
            annotations.attributes.push("#[not valid".to_string());
        }
    }
}

#[test]
fn member_visitor_annotations_are_emitted() {
    let generator = Generator::default().with_member_visitor(Audit);
    let (sink, _) = generate_in_memory(&generator);
    let source = sink.get("orders.rs").unwrap();

    assert!(source.contains("/// Audited on Order.\n"));
    assert!(source.contains("#[serde(skip)]\n    pub id_attr: Option<i32>,"));
    assert!(!source.contains("not valid"));
    assert_eq!(source.matches("Audited on").count(), 1);
}
