use roxmltree::Node;

use super::{
    annotation::documentation,
    constraining_facet::Facet,
    error::XsdError,
    mapping_context::MappingContext,
    values::actual_value,
    xstypes::QName,
};

/// Simple Type Definition (§3.16), as written in a schema document.
#[derive(Clone, Debug)]
pub struct SimpleTypeDefinition {
    /// `None` for anonymous definitions.
    pub name: Option<QName>,
    pub variety: SimpleDerivation,
    pub documentation: Vec<String>,
}

#[derive(Clone, Debug)]
pub enum SimpleDerivation {
    Restriction { base: SimpleBase, facets: Vec<Facet> },
    List { item: SimpleBase },
    Union { members: Vec<SimpleBase> },
}

/// A simple type referenced from a derivation, either by name or inline.
#[derive(Clone, Debug)]
pub enum SimpleBase {
    Named(QName),
    Inline(Box<SimpleTypeDefinition>),
}

impl SimpleTypeDefinition {
    pub const TAG_NAME: &'static str = "simpleType";

    pub(crate) fn map_from_xml(
        context: &MappingContext,
        simple_type: Node,
    ) -> Result<Self, XsdError> {
        // {name}
        //   The ·actual value· of the name [attribute] if present on the <simpleType> element,
        //   otherwise ·absent·.
        let name = actual_value::<&str>(simple_type, "name")?.map(|n| context.top_level_name(n));

        let derivation = simple_type
            .children()
            .find(|c| matches!(c.tag_name().name(), "restriction" | "list" | "union"))
            .ok_or(XsdError::MissingAttribute {
                element: Self::TAG_NAME,
                attribute: "restriction|list|union",
            })?;

        let variety = match derivation.tag_name().name() {
            "restriction" => Self::map_restriction(context, derivation)?,
            "list" => Self::map_list(context, derivation)?,
            _ => Self::map_union(context, derivation)?,
        };

        Ok(Self {
            name,
            variety,
            documentation: documentation(simple_type),
        })
    }

    fn map_restriction(
        context: &MappingContext,
        restriction: Node,
    ) -> Result<SimpleDerivation, XsdError> {
        // {base type definition}
        //   the type definition ·resolved· to by the ·actual value· of the base [attribute] of
        //   <restriction>, if present, otherwise the type definition corresponding to the
        //   <simpleType> among the [children] of <restriction>.
        let base = Self::base_or_inline(context, restriction, "base", "restriction")?;
        let facets = restriction
            .children()
            .filter(|c| c.is_element() && Facet::is_facet_tag(c.tag_name().name()))
            .collect::<Vec<_>>();
        Ok(SimpleDerivation::Restriction {
            base,
            facets: Facet::map_from_xml(&facets)?,
        })
    }

    fn map_list(context: &MappingContext, list: Node) -> Result<SimpleDerivation, XsdError> {
        // {item type definition}
        //   the type definition ·resolved· to by the ·actual value· of the itemType [attribute]
        //   of <list>, if present, otherwise the type definition corresponding to the <simpleType>
        //   among the [children] of <list>.
        let item = Self::base_or_inline(context, list, "itemType", "list")?;
        Ok(SimpleDerivation::List { item })
    }

    fn map_union(context: &MappingContext, union: Node) -> Result<SimpleDerivation, XsdError> {
        // {member type definitions}
        //   the sequence of type definitions ·resolved· to by the items in the ·actual value· of
        //   the memberTypes [attribute], if any, followed by the type definitions corresponding to
        //   the <simpleType>s among the [children] of <union>, if any.
        let mut members = Vec::new();
        if let Some(member_types) = actual_value::<&str>(union, "memberTypes")? {
            for member in member_types.split_ascii_whitespace() {
                members.push(SimpleBase::Named(context.qname(member, union)?));
            }
        }
        for inline in union
            .children()
            .filter(|c| c.tag_name().name() == Self::TAG_NAME)
        {
            members.push(SimpleBase::Inline(Box::new(Self::map_from_xml(
                context, inline,
            )?)));
        }
        Ok(SimpleDerivation::Union { members })
    }

    fn base_or_inline(
        context: &MappingContext,
        node: Node,
        attribute: &'static str,
        element: &'static str,
    ) -> Result<SimpleBase, XsdError> {
        if let Some(base) = actual_value::<&str>(node, attribute)? {
            return Ok(SimpleBase::Named(context.qname(base, node)?));
        }
        match node
            .children()
            .find(|c| c.tag_name().name() == Self::TAG_NAME)
        {
            Some(inline) => Ok(SimpleBase::Inline(Box::new(Self::map_from_xml(
                context, inline,
            )?))),
            None => Err(XsdError::MissingAttribute { element, attribute }),
        }
    }
}
