use roxmltree::Node;

use super::{
    annotation::documentation,
    element_decl::ElementUse,
    error::XsdError,
    mapping_context::MappingContext,
    values::{actual_value, required_value},
    xstypes::QName,
};

/// A particle of a content model: a term plus its occurrence range (§3.9).
#[derive(Clone, Debug)]
pub struct Particle {
    pub min_occurs: u64,
    pub max_occurs: MaxOccurs,
    pub term: Term,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MaxOccurs {
    Unbounded,
    Count(u64),
}

impl MaxOccurs {
    pub fn mul(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Count(0), _) | (_, Self::Count(0)) => Self::Count(0),
            (Self::Unbounded, _) | (_, Self::Unbounded) => Self::Unbounded,
            (Self::Count(a), Self::Count(b)) => Self::Count(a.saturating_mul(*b)),
        }
    }

    /// Whether more than one occurrence is allowed.
    pub fn is_repeated(&self) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Count(n) => *n > 1,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Term {
    Element(ElementUse),
    ModelGroup(ModelGroup),
    /// A `<group ref="...">` reference to a named model group definition.
    GroupRef(QName),
    /// An `<any>` wildcard.
    Any,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Compositor {
    All,
    Choice,
    Sequence,
}

/// Schema Component: Model Group (§3.8)
#[derive(Clone, Debug)]
pub struct ModelGroup {
    pub compositor: Compositor,
    pub particles: Vec<Particle>,
    pub documentation: Vec<String>,
}

impl ModelGroup {
    pub(crate) fn is_model_group_tag(tag: &str) -> bool {
        matches!(tag, "all" | "choice" | "sequence")
    }

    /// Maps `<all>`, `<choice>` or `<sequence>` (§3.8.2)
    pub(crate) fn map_from_xml(context: &MappingContext, group: Node) -> Result<Self, XsdError> {
        // {compositor}
        //   One of all, choice, sequence depending on the element information item.
        let compositor = match group.tag_name().name() {
            "all" => Compositor::All,
            "choice" => Compositor::Choice,
            "sequence" => Compositor::Sequence,
            other => {
                return Err(XsdError::UnexpectedElement {
                    parent: "complexType".into(),
                    found: other.into(),
                })
            }
        };

        // {particles}
        //   A sequence of particles corresponding to all the <all>, <choice>, <sequence>,
        //   <any>, <group> or <element> items among the [children], in order.
        let particles = group
            .children()
            .filter(|c| c.is_element())
            .filter(|c| c.tag_name().name() != "annotation")
            .map(|child| Particle::map_from_xml(context, child))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();

        Ok(Self {
            compositor,
            particles,
            documentation: documentation(group),
        })
    }
}

impl Particle {
    /// Maps one child of a model group. Returns `None` for children that do not contribute a
    /// particle (annotations, and particles with `maxOccurs="0"`).
    pub(crate) fn map_from_xml(
        context: &MappingContext,
        node: Node,
    ) -> Result<Option<Self>, XsdError> {
        let term = match node.tag_name().name() {
            tag if ModelGroup::is_model_group_tag(tag) => {
                Term::ModelGroup(ModelGroup::map_from_xml(context, node)?)
            }
            "element" => Term::Element(ElementUse::map_from_xml(context, node)?),
            "group" => Term::GroupRef(context.qname(required_value(node, "group", "ref")?, node)?),
            "any" => Term::Any,
            "annotation" => return Ok(None),
            other => {
                return Err(XsdError::UnexpectedElement {
                    parent: node
                        .parent_element()
                        .map(|p| p.tag_name().name().to_string())
                        .unwrap_or_default(),
                    found: other.into(),
                })
            }
        };

        // {min occurs}
        //   The ·actual value· of the minOccurs [attribute], if present, otherwise 1.
        let min_occurs = actual_value::<u64>(node, "minOccurs")?.unwrap_or(1);
        // {max occurs}
        //   unbounded, if the maxOccurs [attribute] equals unbounded, otherwise the ·actual value·
        //   of the maxOccurs [attribute], if present, otherwise 1.
        let max_occurs = actual_value::<MaxOccurs>(node, "maxOccurs")?.unwrap_or(MaxOccurs::Count(1));

        if max_occurs == MaxOccurs::Count(0) {
            return Ok(None);
        }

        Ok(Some(Self {
            min_occurs,
            max_occurs,
            term,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurrence_arithmetic() {
        use MaxOccurs::*;
        assert_eq!(Count(2).mul(&Count(3)), Count(6));
        assert_eq!(Count(2).mul(&Unbounded), Unbounded);
        assert_eq!(Count(0).mul(&Unbounded), Count(0));
        assert!(!Count(1).is_repeated());
        assert!(Count(2).is_repeated());
        assert!(Unbounded.is_repeated());
    }
}
