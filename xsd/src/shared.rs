use roxmltree::Node;

use super::{
    complex_type_def::ComplexTypeDefinition, error::XsdError, mapping_context::MappingContext,
    simple_type_def::SimpleTypeDefinition, values::actual_value, xstypes::QName,
};

/// How an element or attribute declaration designates its type.
#[derive(Clone, Debug)]
pub enum TypeUse {
    /// The `type` [attribute].
    Named(QName),
    /// An inline anonymous `<simpleType>` child.
    Simple(Box<SimpleTypeDefinition>),
    /// An inline anonymous `<complexType>` child.
    Complex(Box<ComplexTypeDefinition>),
    /// Neither; the declaration falls back to its substitution group head or `xs:anyType`.
    Absent,
}

impl TypeUse {
    /// The first of the following that applies (§3.3.2):
    ///   1 The type definition corresponding to the <simpleType> or <complexType> element
    ///     information item in the [children], if either is present.
    ///   2 The type definition ·resolved· to by the ·actual value· of the type [attribute].
    pub(crate) fn map_from_xml(context: &MappingContext, node: Node) -> Result<Self, XsdError> {
        for child in node.children().filter(|c| c.is_element()) {
            match child.tag_name().name() {
                SimpleTypeDefinition::TAG_NAME => {
                    return Ok(Self::Simple(Box::new(SimpleTypeDefinition::map_from_xml(
                        context, child,
                    )?)))
                }
                ComplexTypeDefinition::TAG_NAME => {
                    return Ok(Self::Complex(Box::new(ComplexTypeDefinition::map_from_xml(
                        context, child,
                    )?)))
                }
                _ => {}
            }
        }
        match actual_value::<&str>(node, "type")? {
            Some(type_) => Ok(Self::Named(context.qname(type_, node)?)),
            None => Ok(Self::Absent),
        }
    }
}

/// Property Record: Value Constraint, either from a `default` or a `fixed` [attribute].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueConstraint {
    Default(String),
    Fixed(String),
}

impl ValueConstraint {
    pub(crate) fn map_from_xml(node: Node) -> Result<Option<Self>, XsdError> {
        if let Some(default) = actual_value::<String>(node, "default")? {
            return Ok(Some(Self::Default(default)));
        }
        Ok(actual_value::<String>(node, "fixed")?.map(Self::Fixed))
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Default(v) | Self::Fixed(v) => v,
        }
    }
}
