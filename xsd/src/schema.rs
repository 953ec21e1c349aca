use roxmltree::Node;

use super::{
    annotation,
    attribute_decl::AttributeDeclaration,
    attribute_group_def::AttributeGroupDefinition,
    builtins::XS_NAMESPACE,
    complex_type_def::ComplexTypeDefinition,
    element_decl::ElementDeclaration,
    error::XsdError,
    import::{Import, Include},
    mapping_context::MappingContext,
    model_group_def::ModelGroupDefinition,
    simple_type_def::SimpleTypeDefinition,
    xstypes::QName,
};

/// A top-level `<simpleType>` or `<complexType>`.
#[derive(Clone, Debug)]
pub enum TypeDefinition {
    Simple(SimpleTypeDefinition),
    Complex(ComplexTypeDefinition),
}

impl TypeDefinition {
    pub fn name(&self) -> Option<&QName> {
        match self {
            Self::Simple(simple) => simple.name.as_ref(),
            Self::Complex(complex) => complex.name.as_ref(),
        }
    }
}

/// Options applied when parsing schema text.
#[derive(Copy, Clone, Debug, Default)]
pub struct ParseOptions {
    /// Allow (and ignore) a document type declaration.
    pub allow_dtd: bool,
}

/// One parsed `<schema>` document.
///
/// Component order follows document order, which downstream stages rely on for deterministic
/// output.
#[derive(Clone, Debug)]
pub struct SchemaDocument {
    /// The canonical location the document was loaded from.
    pub location: String,
    /// The target namespace in effect, after a chameleon include adopted the includer's.
    pub target_namespace: Option<String>,
    pub chameleon: bool,
    pub imports: Vec<Import>,
    pub includes: Vec<Include>,
    pub types: Vec<TypeDefinition>,
    pub elements: Vec<ElementDeclaration>,
    pub groups: Vec<ModelGroupDefinition>,
    pub attribute_groups: Vec<AttributeGroupDefinition>,
    pub attributes: Vec<AttributeDeclaration>,
}

impl SchemaDocument {
    pub const TAG_NAME: &'static str = "schema";

    /// Parses and maps schema text. `adopted_namespace` is the includer's target namespace when
    /// the document is reached through `<include>`.
    pub fn parse(
        location: &str,
        text: &str,
        adopted_namespace: Option<&str>,
        options: ParseOptions,
    ) -> Result<Self, XsdError> {
        let document = roxmltree::Document::parse_with_options(
            text,
            roxmltree::ParsingOptions {
                allow_dtd: options.allow_dtd,
                ..roxmltree::ParsingOptions::default()
            },
        )
        .map_err(|source| XsdError::Xml {
            location: location.to_string(),
            source,
        })?;
        Self::map_from_xml(location, document.root_element(), adopted_namespace)
    }

    pub fn map_from_xml(
        location: &str,
        schema: Node,
        adopted_namespace: Option<&str>,
    ) -> Result<Self, XsdError> {
        let tag = schema.tag_name();
        if tag.name() != Self::TAG_NAME || tag.namespace() != Some(XS_NAMESPACE) {
            return Err(XsdError::NotASchema(tag.name().to_string()));
        }

        let context = MappingContext::for_schema(schema, adopted_namespace)?;
        if let (Some(declared), Some(adopted)) =
            (schema.attribute("targetNamespace"), adopted_namespace)
        {
            if declared != adopted {
                return Err(XsdError::InvalidValue {
                    attribute: "targetNamespace",
                    value: declared.to_string(),
                });
            }
        }

        let mut document = Self {
            location: location.to_string(),
            target_namespace: context.target_namespace.clone(),
            chameleon: context.chameleon,
            imports: Vec::new(),
            includes: Vec::new(),
            types: Vec::new(),
            elements: Vec::new(),
            groups: Vec::new(),
            attribute_groups: Vec::new(),
            attributes: Vec::new(),
        };

        for child in schema.children().filter(|c| c.is_element()) {
            match child.tag_name().name() {
                Import::TAG_NAME => document.imports.push(Import::map_from_xml(child, schema)?),
                "include" | "redefine" => document.includes.push(Include::map_from_xml(child)?),
                SimpleTypeDefinition::TAG_NAME => document.types.push(TypeDefinition::Simple(
                    SimpleTypeDefinition::map_from_xml(&context, child)?,
                )),
                ComplexTypeDefinition::TAG_NAME => document.types.push(TypeDefinition::Complex(
                    ComplexTypeDefinition::map_from_xml(&context, child)?,
                )),
                ElementDeclaration::TAG_NAME => document
                    .elements
                    .push(ElementDeclaration::map_from_xml_top_level(&context, child)?),
                ModelGroupDefinition::TAG_NAME => document
                    .groups
                    .push(ModelGroupDefinition::map_from_xml(&context, child)?),
                AttributeGroupDefinition::TAG_NAME => document
                    .attribute_groups
                    .push(AttributeGroupDefinition::map_from_xml(&context, child)?),
                AttributeDeclaration::TAG_NAME => document
                    .attributes
                    .push(AttributeDeclaration::map_from_xml_top_level(&context, child)?),
                annotation::TAG_NAME => {}
                other => tracing::debug!(location, "skipping top-level <{other}>"),
            }
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const ORDERS: &str = r#"<?xml version="1.0"?>
        <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:o="urn:orders"
                   targetNamespace="urn:orders">
            <xs:annotation><xs:documentation>Orders</xs:documentation></xs:annotation>
            <xs:import namespace="urn:common" schemaLocation="common.xsd"/>
            <xs:include schemaLocation="parts.xsd"/>
            <xs:complexType name="Order"><xs:sequence/></xs:complexType>
            <xs:simpleType name="Code"><xs:restriction base="xs:string"/></xs:simpleType>
            <xs:element name="order" type="o:Order"/>
            <xs:group name="g"><xs:sequence/></xs:group>
            <xs:attributeGroup name="ag"/>
            <xs:attribute name="version" type="xs:string"/>
            <xs:notation name="n" public="p"/>
        </xs:schema>"#;

    #[test]
    fn maps_top_level_components_in_document_order() {
        let doc = SchemaDocument::parse("orders.xsd", ORDERS, None, ParseOptions::default())
            .unwrap();
        assert_eq!(doc.target_namespace.as_deref(), Some("urn:orders"));
        assert_eq!(doc.imports[0].namespace.as_deref(), Some("urn:common"));
        assert_eq!(doc.includes[0].schema_location, "parts.xsd");
        let type_names = doc
            .types
            .iter()
            .map(|t| t.name().unwrap().local_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(type_names, ["Order", "Code"]);
        assert_eq!(
            doc.elements[0].name,
            QName::with_namespace("urn:orders", "order")
        );
        assert_eq!(doc.groups.len(), 1);
        assert_eq!(doc.attribute_groups.len(), 1);
        assert_eq!(doc.attributes.len(), 1);
    }

    #[test]
    fn rejects_non_schema_roots_and_malformed_text() {
        let err = SchemaDocument::parse("a.xml", "<root/>", None, ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, XsdError::NotASchema(_)));

        let err = SchemaDocument::parse("b.xsd", "<xs:schema", None, ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, XsdError::Xml { .. }));
    }

    #[test]
    fn include_with_foreign_namespace_is_rejected() {
        let text = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:x"/>"#;
        let err = SchemaDocument::parse("x.xsd", text, Some("urn:y"), ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, XsdError::InvalidValue { attribute: "targetNamespace", .. }));
    }
}
