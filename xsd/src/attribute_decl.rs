use roxmltree::Node;

use super::{
    annotation::documentation,
    error::XsdError,
    mapping_context::MappingContext,
    shared::{TypeUse, ValueConstraint},
    values::required_value,
    xstypes::QName,
};

/// Attribute Declaration (§3.2), as written in a schema document.
#[derive(Clone, Debug)]
pub struct AttributeDeclaration {
    pub name: QName,
    pub type_: TypeUse,
    pub value_constraint: Option<ValueConstraint>,
    pub documentation: Vec<String>,
}

impl AttributeDeclaration {
    pub const TAG_NAME: &'static str = "attribute";

    pub(crate) fn map_from_xml_top_level(
        context: &MappingContext,
        attribute: Node,
    ) -> Result<Self, XsdError> {
        let name = required_value::<&str>(attribute, Self::TAG_NAME, "name")?;
        let name = context.top_level_name(name);
        Self::map_common(context, attribute, name)
    }

    pub(crate) fn map_from_xml_local(
        context: &MappingContext,
        attribute: Node,
    ) -> Result<Self, XsdError> {
        let name = required_value::<&str>(attribute, Self::TAG_NAME, "name")?;
        let name = context.local_attribute_name(attribute, name)?;
        Self::map_common(context, attribute, name)
    }

    fn map_common(
        context: &MappingContext,
        attribute: Node,
        name: QName,
    ) -> Result<Self, XsdError> {
        let type_ = TypeUse::map_from_xml(context, attribute)?;
        if matches!(type_, TypeUse::Complex(_)) {
            return Err(XsdError::UnexpectedElement {
                parent: Self::TAG_NAME.into(),
                found: "complexType".into(),
            });
        }
        Ok(Self {
            name,
            type_,
            value_constraint: ValueConstraint::map_from_xml(attribute)?,
            documentation: documentation(attribute),
        })
    }
}
