use roxmltree::Node;

use super::{
    annotation::documentation,
    error::XsdError,
    mapping_context::MappingContext,
    shared::{TypeUse, ValueConstraint},
    values::{actual_value, required_value},
    xstypes::QName,
};

/// Element Declaration (§3.3), as written in a schema document.
#[derive(Clone, Debug)]
pub struct ElementDeclaration {
    /// The expanded name; local declarations are only namespace-qualified when their form is
    /// `qualified`.
    pub name: QName,
    pub type_: TypeUse,
    pub substitution_groups: Vec<QName>,
    pub abstract_: bool,
    pub nillable: bool,
    pub value_constraint: Option<ValueConstraint>,
    pub documentation: Vec<String>,
}

/// An `<element>` particle inside a content model: either a local declaration or a reference to
/// a top-level one.
#[derive(Clone, Debug)]
pub enum ElementUse {
    Local(ElementDeclaration),
    Ref(QName),
}

impl ElementDeclaration {
    pub const TAG_NAME: &'static str = "element";

    pub(crate) fn map_from_xml_top_level(
        context: &MappingContext,
        element: Node,
    ) -> Result<Self, XsdError> {
        let name = required_value::<&str>(element, Self::TAG_NAME, "name")?;
        let name = context.top_level_name(name);

        // {substitution group affiliations}
        //   A set of the element declarations ·resolved· to by the items in the ·actual value·
        //   of the substitutionGroup [attribute], if present, otherwise the empty set.
        let substitution_groups = actual_value::<&str>(element, "substitutionGroup")?
            .map(|groups| {
                groups
                    .split_ascii_whitespace()
                    .map(|g| context.qname(g, element))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Self::map_common(context, element, name, substitution_groups)
    }

    fn map_local(context: &MappingContext, element: Node) -> Result<Self, XsdError> {
        let name = required_value::<&str>(element, Self::TAG_NAME, "name")?;
        let name = context.local_element_name(element, name)?;
        Self::map_common(context, element, name, Vec::new())
    }

    fn map_common(
        context: &MappingContext,
        element: Node,
        name: QName,
        substitution_groups: Vec<QName>,
    ) -> Result<Self, XsdError> {
        Ok(Self {
            name,
            type_: TypeUse::map_from_xml(context, element)?,
            substitution_groups,
            abstract_: actual_value(element, "abstract")?.unwrap_or(false),
            nillable: actual_value(element, "nillable")?.unwrap_or(false),
            value_constraint: ValueConstraint::map_from_xml(element)?,
            documentation: documentation(element),
        })
    }
}

impl ElementUse {
    pub(crate) fn map_from_xml(context: &MappingContext, element: Node) -> Result<Self, XsdError> {
        // If the <element> element information item has <complexType> or <group> as an ancestor
        // and the ref [attribute] is present, it maps to a particle whose {term} is the top-level
        // declaration ·resolved· to by the ref [attribute].
        match actual_value::<&str>(element, "ref")? {
            Some(ref_) => Ok(Self::Ref(context.qname(ref_, element)?)),
            None => Ok(Self::Local(ElementDeclaration::map_local(context, element)?)),
        }
    }
}
