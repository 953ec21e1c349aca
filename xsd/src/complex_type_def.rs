use roxmltree::Node;

use super::{
    annotation::documentation,
    attribute_use::AttributeUse,
    constraining_facet::Facet,
    error::XsdError,
    mapping_context::MappingContext,
    particle::{ModelGroup, Particle},
    values::{actual_value, required_value},
    xstypes::QName,
};

/// Complex Type Definition (§3.4), as written in a schema document.
#[derive(Clone, Debug)]
pub struct ComplexTypeDefinition {
    /// `None` for anonymous definitions.
    pub name: Option<QName>,
    pub abstract_: bool,
    pub mixed: bool,
    pub content: ComplexContent,
    pub attributes: Vec<AttributeUse>,
    pub any_attribute: bool,
    pub documentation: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DerivationMethod {
    Extension,
    Restriction,
}

#[derive(Clone, Debug)]
pub enum ComplexContent {
    /// `<simpleContent>`: character data of a simple type plus attributes.
    Simple {
        derivation: DerivationMethod,
        base: QName,
        facets: Vec<Facet>,
    },
    /// `<complexContent>` or the shorthand form without a content wrapper; `derivation` is
    /// `None` for the latter, which implicitly restricts `xs:anyType`.
    Complex {
        derivation: Option<(DerivationMethod, QName)>,
        particle: Option<Particle>,
    },
}

impl ComplexTypeDefinition {
    pub const TAG_NAME: &'static str = "complexType";

    pub(crate) fn map_from_xml(
        context: &MappingContext,
        complex_type: Node,
    ) -> Result<Self, XsdError> {
        // {name}
        //   The ·actual value· of the name [attribute] if present, otherwise ·absent·.
        let name = actual_value::<&str>(complex_type, "name")?.map(|n| context.top_level_name(n));
        // {abstract}
        //   The ·actual value· of the abstract [attribute], if present, otherwise false.
        let abstract_ = actual_value(complex_type, "abstract")?.unwrap_or(false);
        let mut mixed = actual_value(complex_type, "mixed")?.unwrap_or(false);

        let wrapper = complex_type
            .children()
            .find(|c| matches!(c.tag_name().name(), "simpleContent" | "complexContent"));

        let (content, attributes_parent) = match wrapper {
            Some(wrapper) => {
                let derivation_node = wrapper
                    .children()
                    .find(|c| matches!(c.tag_name().name(), "extension" | "restriction"))
                    .ok_or(XsdError::MissingAttribute {
                        element: "complexContent",
                        attribute: "extension|restriction",
                    })?;
                // {derivation method}
                //   If the <restriction> alternative is chosen, then restriction, otherwise (the
                //   <extension> alternative is chosen) extension.
                let derivation = match derivation_node.tag_name().name() {
                    "extension" => DerivationMethod::Extension,
                    _ => DerivationMethod::Restriction,
                };
                // {base type definition}
                //   The type definition ·resolved· to by the ·actual value· of the base [attribute]
                let base = context.qname(
                    required_value(derivation_node, "extension", "base")?,
                    derivation_node,
                )?;

                let content = if wrapper.tag_name().name() == "simpleContent" {
                    let facets = derivation_node
                        .children()
                        .filter(|c| c.is_element() && Facet::is_facet_tag(c.tag_name().name()))
                        .collect::<Vec<_>>();
                    ComplexContent::Simple {
                        derivation,
                        base,
                        facets: Facet::map_from_xml(&facets)?,
                    }
                } else {
                    // The mixed [attribute] of <complexContent> takes precedence over the one of
                    // <complexType>.
                    if let Some(wrapper_mixed) = actual_value(wrapper, "mixed")? {
                        mixed = wrapper_mixed;
                    }
                    ComplexContent::Complex {
                        derivation: Some((derivation, base)),
                        particle: Self::map_particle(context, derivation_node)?,
                    }
                };
                (content, derivation_node)
            }
            None => (
                ComplexContent::Complex {
                    derivation: None,
                    particle: Self::map_particle(context, complex_type)?,
                },
                complex_type,
            ),
        };

        let (attributes, any_attribute) = AttributeUse::map_children(context, attributes_parent)?;

        Ok(Self {
            name,
            abstract_,
            mixed,
            content,
            attributes,
            any_attribute,
            documentation: documentation(complex_type),
        })
    }

    /// The particle corresponding to the `<all>`, `<choice>`, `<group>` or `<sequence>` among
    /// the [children], if any.
    fn map_particle(context: &MappingContext, parent: Node) -> Result<Option<Particle>, XsdError> {
        match parent.children().find(|c| {
            let tag = c.tag_name().name();
            ModelGroup::is_model_group_tag(tag) || tag == "group"
        }) {
            Some(particle) => Particle::map_from_xml(context, particle),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::{Compositor, Term};

    fn map(xml: &str) -> ComplexTypeDefinition {
        let doc = roxmltree::Document::parse(xml).unwrap();
        let context = MappingContext::for_schema(doc.root_element(), None).unwrap();
        ComplexTypeDefinition::map_from_xml(&context, doc.root_element()).unwrap()
    }

    #[test]
    fn shorthand_content_with_attributes() {
        let def = map(
            r#"<complexType name="Order" mixed="true">
                <sequence><element name="id" type="string"/></sequence>
                <attribute name="code" type="string" use="required"/>
                <anyAttribute/>
            </complexType>"#,
        );
        assert!(def.mixed);
        assert!(def.any_attribute);
        assert_eq!(def.attributes.len(), 1);
        let ComplexContent::Complex {
            derivation: None,
            particle: Some(particle),
        } = def.content
        else {
            panic!("expected shorthand complex content");
        };
        assert!(matches!(
            particle.term,
            Term::ModelGroup(ModelGroup {
                compositor: Compositor::Sequence,
                ..
            })
        ));
    }

    #[test]
    fn complex_content_extension() {
        let def = map(
            r#"<complexType xmlns:t="urn:t" name="Special">
                <complexContent mixed="true">
                    <extension base="t:Order">
                        <choice><element name="a" type="string"/></choice>
                        <attributeGroup ref="t:common"/>
                    </extension>
                </complexContent>
            </complexType>"#,
        );
        assert!(def.mixed);
        let ComplexContent::Complex {
            derivation: Some((DerivationMethod::Extension, base)),
            particle: Some(_),
        } = def.content
        else {
            panic!("expected extension");
        };
        assert_eq!(base, QName::with_namespace("urn:t", "Order"));
        assert!(matches!(&def.attributes[0], AttributeUse::GroupRef(n) if n.local_name == "common"));
    }

    #[test]
    fn simple_content_restriction_keeps_facets() {
        let def = map(
            r#"<complexType xmlns:t="urn:t" name="Price">
                <simpleContent>
                    <restriction base="t:Amount"><maxInclusive value="10"/></restriction>
                </simpleContent>
            </complexType>"#,
        );
        let ComplexContent::Simple {
            derivation, facets, ..
        } = def.content
        else {
            panic!("expected simple content");
        };
        assert_eq!(derivation, DerivationMethod::Restriction);
        assert_eq!(facets, vec![Facet::MaxInclusive("10".into())]);
    }
}
