//! The type graph: an arena of [`TypeNode`]s addressed by [`TypeRef`] handles.
//!
//! The graph moves through three phases. The builder fills an [`UnresolvedGraph`] whose slots
//! may still be empty, [`UnresolvedGraph::finish`] maps every property and freezes it into a
//! [`TypeGraph`], and naming turns that into a [`ResolvedGraph`](crate::naming::ResolvedGraph),
//! the only phase emission accepts.

mod builder;
mod facets;

use std::{fmt, num::NonZeroU32};

use xcg_xsd::{DerivationMethod, EnumerationValue, Facet, MaxOccurs, QName, XsBuiltin};

use crate::{
    config::GeneratorConfig,
    error::{DeclarationKind, GenerateError},
    mapper::{self, Cardinality, MappedType},
};

pub(crate) use builder::build;
pub(crate) use facets::narrow_facets;

/// Handle of a node in the type graph arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(NonZeroU32);

impl TypeRef {
    fn from_index(index: usize) -> Self {
        let value = u32::try_from(index + 1)
            .ok()
            .and_then(NonZeroU32::new)
            .unwrap_or(NonZeroU32::MAX);
        Self(value)
    }

    pub fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct TypeNode {
    /// The schema name; anonymous nodes carry the name of the element or attribute that
    /// declares them.
    pub name: QName,
    pub anonymous: bool,
    /// Built-in datatypes are part of the graph so that every property has a target, but they
    /// are never emitted.
    pub builtin: bool,
    /// Target namespace after the namespace hook.
    pub namespace: String,
    pub documentation: Vec<String>,
    pub kind: TypeKind,
}

#[derive(Clone, Debug)]
pub enum TypeKind {
    Simple(SimpleType),
    Complex(ComplexType),
    Enumeration(EnumerationType),
    Group(GroupFragment),
    AttributeGroup(GroupFragment),
}

#[derive(Clone, Debug)]
pub struct SimpleType {
    /// The built-in type at the root of the derivation chain.
    pub builtin: XsBuiltin,
    pub variety: Variety,
    /// Accumulated facets, base facets first.
    pub facets: Vec<Facet>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Variety {
    Atomic,
    List { item: TypeRef },
    Union { members: Vec<TypeRef> },
}

#[derive(Clone, Debug)]
pub struct EnumerationType {
    pub builtin: XsBuiltin,
    pub values: Vec<EnumerationValue>,
    pub facets: Vec<Facet>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContentModel {
    Sequence,
    Choice,
    All,
    Empty,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Derivation {
    pub method: DerivationMethod,
    pub base: TypeRef,
}

#[derive(Clone, Debug)]
pub struct ComplexType {
    pub base: Option<Derivation>,
    pub content_model: ContentModel,
    pub abstract_: bool,
    pub mixed: bool,
    pub properties: Vec<Property>,
}

/// The flattened members of a named model group or attribute group.
#[derive(Clone, Debug)]
pub struct GroupFragment {
    pub properties: Vec<Property>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Element,
    Attribute,
    /// Character data: simple content or the text of mixed content.
    Text,
    /// An element wildcard (`<any>`).
    Any,
    /// An attribute wildcard (`<anyAttribute>`).
    AnyAttribute,
}

#[derive(Clone, Debug)]
pub struct Property {
    pub owner: TypeRef,
    pub name: QName,
    pub kind: PropertyKind,
    pub target: TypeRef,
    pub min_occurs: u64,
    pub max_occurs: MaxOccurs,
    pub cardinality: Cardinality,
    /// Facets of the declared type, filled in when the graph is finished.
    pub facets: Vec<Facet>,
    pub mapped: MappedType,
    pub default: Option<String>,
    pub fixed: Option<String>,
    pub nillable: bool,
    pub documentation: Vec<String>,
    pub inherited: bool,
}

/// The arena while the builder is running: slots are reserved before they are filled.
#[derive(Debug, Default)]
pub struct UnresolvedGraph {
    nodes: Vec<Option<TypeNode>>,
}

impl UnresolvedGraph {
    pub(crate) fn reserve(&mut self) -> TypeRef {
        self.nodes.push(None);
        TypeRef::from_index(self.nodes.len() - 1)
    }

    pub(crate) fn insert(&mut self, ref_: TypeRef, node: TypeNode) {
        self.nodes[ref_.index()] = Some(node);
    }

    pub(crate) fn push(&mut self, node: TypeNode) -> TypeRef {
        let ref_ = self.reserve();
        self.insert(ref_, node);
        ref_
    }

    pub(crate) fn get(&self, ref_: TypeRef) -> Option<&TypeNode> {
        self.nodes.get(ref_.index()).and_then(Option::as_ref)
    }

    pub(crate) fn is_filled(&self, ref_: TypeRef) -> bool {
        self.get(ref_).is_some()
    }

    /// Maps every property's declared type and freezes the arena.
    ///
    /// `names` provides the schema name of each reserved slot for the error raised if one was
    /// never filled.
    pub(crate) fn finish(
        self,
        config: &GeneratorConfig,
        names: impl Fn(TypeRef) -> QName,
    ) -> Result<TypeGraph, GenerateError> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.into_iter().enumerate() {
            match node {
                Some(node) => nodes.push(node),
                None => {
                    return Err(GenerateError::UnresolvedReference {
                        kind: DeclarationKind::Type,
                        name: names(TypeRef::from_index(index)),
                    })
                }
            }
        }
        let mut graph = TypeGraph { nodes };

        let mut mapped = Vec::new();
        for (index, node) in graph.nodes.iter().enumerate() {
            let properties = match &node.kind {
                TypeKind::Complex(complex) => &complex.properties,
                TypeKind::Group(group) | TypeKind::AttributeGroup(group) => &group.properties,
                _ => continue,
            };
            let properties = properties
                .iter()
                .map(|property| {
                    let facets = graph.facets_of(property.target).to_vec();
                    let mapped = mapper::map_property(&graph, property, config);
                    (facets, mapped)
                })
                .collect::<Vec<_>>();
            mapped.push((index, properties));
        }
        for (index, properties) in mapped {
            let node = &mut graph.nodes[index];
            let target = match &mut node.kind {
                TypeKind::Complex(complex) => &mut complex.properties,
                TypeKind::Group(group) | TypeKind::AttributeGroup(group) => &mut group.properties,
                _ => continue,
            };
            for (property, (facets, (mapped, cardinality))) in target.iter_mut().zip(properties) {
                // Inherited members of a restriction already carry their narrowed facets
                if property.facets.is_empty() {
                    property.facets = facets;
                }
                property.mapped = mapped;
                property.cardinality = cardinality;
            }
        }

        Ok(graph)
    }
}

/// The closed graph: every handle refers to a node.
#[derive(Clone, Debug)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
}

impl TypeGraph {
    pub fn get(&self, ref_: TypeRef) -> &TypeNode {
        &self.nodes[ref_.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in arena order, which is declaration discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeRef, &TypeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (TypeRef::from_index(index), node))
    }

    /// Looks up a named, non-built-in node.
    pub fn find(&self, name: &QName) -> Option<TypeRef> {
        self.iter()
            .find(|(_, node)| !node.anonymous && !node.builtin && node.name == *name)
            .map(|(ref_, _)| ref_)
    }

    /// The facets a property typed `ref_` is constrained by.
    pub fn facets_of(&self, ref_: TypeRef) -> &[Facet] {
        match &self.get(ref_).kind {
            TypeKind::Simple(simple) => &simple.facets,
            TypeKind::Enumeration(enumeration) => &enumeration.facets,
            _ => &[],
        }
    }

    /// Whether the node is emitted as a type of its own.
    pub fn is_emitted(&self, ref_: TypeRef) -> bool {
        let node = self.get(ref_);
        !node.builtin && matches!(node.kind, TypeKind::Complex(_) | TypeKind::Enumeration(_))
    }

    pub fn properties(&self, ref_: TypeRef) -> &[Property] {
        match &self.get(ref_).kind {
            TypeKind::Complex(complex) => &complex.properties,
            TypeKind::Group(group) | TypeKind::AttributeGroup(group) => &group.properties,
            _ => &[],
        }
    }
}
