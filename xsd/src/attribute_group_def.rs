use roxmltree::Node;

use super::{
    annotation::documentation, attribute_use::AttributeUse, error::XsdError,
    mapping_context::MappingContext, values::required_value, xstypes::QName,
};

/// Attribute Group Definition (§3.6)
#[derive(Clone, Debug)]
pub struct AttributeGroupDefinition {
    pub name: QName,
    pub attributes: Vec<AttributeUse>,
    pub any_attribute: bool,
    pub documentation: Vec<String>,
}

impl AttributeGroupDefinition {
    pub const TAG_NAME: &'static str = "attributeGroup";

    pub(crate) fn map_from_xml(
        context: &MappingContext,
        attribute_group: Node,
    ) -> Result<Self, XsdError> {
        let name = required_value::<&str>(attribute_group, Self::TAG_NAME, "name")?;
        let (attributes, any_attribute) = AttributeUse::map_children(context, attribute_group)?;
        Ok(Self {
            name: context.top_level_name(name),
            attributes,
            any_attribute,
            documentation: documentation(attribute_group),
        })
    }
}
