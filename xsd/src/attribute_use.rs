use roxmltree::Node;

use super::{
    attribute_decl::AttributeDeclaration,
    error::XsdError,
    mapping_context::MappingContext,
    shared::ValueConstraint,
    values::{actual_value, invalid, required_value, ActualValue},
    xstypes::QName,
};

/// One attribute-related child of a complex type or attribute group: a local declaration, a
/// reference to a top-level attribute, or an attribute group reference.
#[derive(Clone, Debug)]
pub enum AttributeUse {
    Local {
        declaration: AttributeDeclaration,
        use_: Use,
    },
    Ref {
        name: QName,
        use_: Use,
        value_constraint: Option<ValueConstraint>,
    },
    GroupRef(QName),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Use {
    Optional,
    Required,
    Prohibited,
}

impl ActualValue<'_> for Use {
    fn convert(src: &str, attribute: &'static str) -> Result<Self, XsdError> {
        match src.trim() {
            "optional" => Ok(Self::Optional),
            "required" => Ok(Self::Required),
            "prohibited" => Ok(Self::Prohibited),
            _ => Err(invalid(attribute, src)),
        }
    }
}

impl AttributeUse {
    /// Maps the `<attribute>` and `<attributeGroup>` children of `parent`, in order. Returns
    /// the uses plus whether an `<anyAttribute>` was present.
    pub(crate) fn map_children(
        context: &MappingContext,
        parent: Node,
    ) -> Result<(Vec<Self>, bool), XsdError> {
        let mut uses = Vec::new();
        let mut any_attribute = false;
        for child in parent.children().filter(|c| c.is_element()) {
            match child.tag_name().name() {
                AttributeDeclaration::TAG_NAME => uses.push(Self::map_attribute(context, child)?),
                "attributeGroup" => {
                    let ref_ = required_value::<&str>(child, "attributeGroup", "ref")?;
                    uses.push(Self::GroupRef(context.qname(ref_, child)?));
                }
                "anyAttribute" => any_attribute = true,
                _ => {}
            }
        }
        Ok((uses, any_attribute))
    }

    fn map_attribute(context: &MappingContext, attribute: Node) -> Result<Self, XsdError> {
        // {required} true if use = required, otherwise false.
        let use_ = actual_value::<Use>(attribute, "use")?.unwrap_or(Use::Optional);
        match actual_value::<&str>(attribute, "ref")? {
            Some(ref_) => Ok(Self::Ref {
                name: context.qname(ref_, attribute)?,
                use_,
                value_constraint: ValueConstraint::map_from_xml(attribute)?,
            }),
            None => Ok(Self::Local {
                declaration: AttributeDeclaration::map_from_xml_local(context, attribute)?,
                use_,
            }),
        }
    }
}
