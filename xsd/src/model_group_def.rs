use roxmltree::Node;

use super::{
    annotation::documentation,
    error::XsdError,
    mapping_context::MappingContext,
    particle::ModelGroup,
    values::required_value,
    xstypes::QName,
};

/// Model Group Definition (§3.7): a named `<group>` wrapping exactly one model group.
#[derive(Clone, Debug)]
pub struct ModelGroupDefinition {
    pub name: QName,
    pub model_group: ModelGroup,
    pub documentation: Vec<String>,
}

impl ModelGroupDefinition {
    pub const TAG_NAME: &'static str = "group";

    pub(crate) fn map_from_xml(context: &MappingContext, group: Node) -> Result<Self, XsdError> {
        let name = required_value::<&str>(group, Self::TAG_NAME, "name")?;

        // {model group}
        //   A model group which is the {term} of a particle corresponding to the <all>, <choice>
        //   or <sequence> among the [children] (there must be one).
        let model_group = group
            .children()
            .find(|c| ModelGroup::is_model_group_tag(c.tag_name().name()))
            .ok_or(XsdError::MissingAttribute {
                element: Self::TAG_NAME,
                attribute: "sequence|choice|all",
            })?;

        Ok(Self {
            name: context.top_level_name(name),
            model_group: ModelGroup::map_from_xml(context, model_group)?,
            documentation: documentation(group),
        })
    }
}
