use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use xcg_xsd::{
    AttributeDeclaration, AttributeGroupDefinition, AttributeUse, ComplexContent,
    ComplexTypeDefinition, Compositor, DerivationMethod, ElementDeclaration, ElementUse,
    FacetsExt, MaxOccurs, ModelGroupDefinition, Particle, QName, SchemaSet, SimpleBase,
    SimpleDerivation, SimpleTypeDefinition, Term, TypeDefinition, TypeUse, Use, ValueConstraint,
    XsBuiltin,
};

use super::{
    narrow_facets, ComplexType, ContentModel, Derivation, EnumerationType, GroupFragment,
    Property, PropertyKind, SimpleType, TypeGraph, TypeKind, TypeNode, TypeRef, UnresolvedGraph,
    Variety,
};
use crate::{
    config::{GeneratorConfig, NamespaceProvider, SubstitutionGroups},
    error::{DeclarationKind, Diagnostic, Diagnostics, GenerateError},
    mapper::Cardinality,
};

/// Namespace of the module built-in datatypes are nominally placed in. They are never emitted.
const BUILTIN_NAMESPACE: &str = "xs";

struct Declared<'s, T> {
    declaration: &'s T,
    document: usize,
}

/// Pass 1 output: every top-level declaration by kind and name.
#[derive(Default)]
struct Registry<'s> {
    types: IndexMap<QName, Declared<'s, TypeDefinition>>,
    elements: IndexMap<QName, Declared<'s, ElementDeclaration>>,
    groups: IndexMap<QName, Declared<'s, ModelGroupDefinition>>,
    attribute_groups: IndexMap<QName, Declared<'s, AttributeGroupDefinition>>,
    attributes: IndexMap<QName, Declared<'s, AttributeDeclaration>>,
    /// Substitution group heads and their direct members, in declaration order.
    substitutes: IndexMap<QName, Vec<QName>>,
}

fn register<'s, T>(
    table: &mut IndexMap<QName, Declared<'s, T>>,
    kind: DeclarationKind,
    name: &QName,
    declaration: &'s T,
    document: usize,
) -> Result<(), GenerateError> {
    if table.contains_key(name) {
        return Err(GenerateError::DuplicateDeclaration {
            kind,
            name: name.clone(),
        });
    }
    table.insert(
        name.clone(),
        Declared {
            declaration,
            document,
        },
    );
    Ok(())
}

#[derive(Copy, Clone)]
enum SlotDeclaration<'s> {
    Type(&'s TypeDefinition),
    Element(&'s ElementDeclaration),
    Attribute(&'s AttributeDeclaration),
    Group(&'s ModelGroupDefinition),
    AttributeGroup(&'s AttributeGroupDefinition),
}

/// A reserved arena slot and the declaration that fills it.
#[derive(Clone)]
struct Slot<'s> {
    name: QName,
    document: usize,
    declaration: SlotDeclaration<'s>,
}

impl Slot<'_> {
    fn kind(&self) -> DeclarationKind {
        match self.declaration {
            SlotDeclaration::Type(_) => DeclarationKind::Type,
            SlotDeclaration::Element(_) => DeclarationKind::Element,
            SlotDeclaration::Attribute(_) => DeclarationKind::Attribute,
            SlotDeclaration::Group(_) => DeclarationKind::Group,
            SlotDeclaration::AttributeGroup(_) => DeclarationKind::AttributeGroup,
        }
    }
}

struct Builder<'s> {
    config: &'s GeneratorConfig,
    registry: Registry<'s>,
    /// Target namespace of each schema document, as chosen by the namespace hook.
    namespaces: Vec<String>,
    graph: UnresolvedGraph,

    slots: IndexMap<TypeRef, Slot<'s>>,
    type_slots: HashMap<QName, TypeRef>,
    element_slots: HashMap<QName, TypeRef>,
    attribute_slots: HashMap<QName, TypeRef>,
    group_slots: HashMap<QName, TypeRef>,
    attribute_group_slots: HashMap<QName, TypeRef>,
    builtins: HashMap<XsBuiltin, TypeRef>,

    in_progress: HashSet<TypeRef>,
    expanding_groups: Vec<QName>,
    expanding_attribute_groups: Vec<QName>,
    resolving_heads: Vec<QName>,

    diagnostics: Diagnostics,
}

/// Builds the type graph of a schema set.
///
/// Pass 1 registers all top-level declarations and reserves arena slots for named types,
/// groups, attribute groups, and top-level elements and attributes with anonymous types. Pass 2
/// fills every slot in reservation order, resolving dependencies on demand.
pub(crate) fn build(
    set: &SchemaSet,
    config: &GeneratorConfig,
    namespaces: &dyn NamespaceProvider,
    diagnostics: &mut Diagnostics,
) -> Result<TypeGraph, GenerateError> {
    let mut builder = Builder {
        config,
        registry: Registry::default(),
        namespaces: set
            .documents
            .iter()
            .map(|document| namespaces.target_namespace(document.target_namespace.as_deref()))
            .collect(),
        graph: UnresolvedGraph::default(),
        slots: IndexMap::new(),
        type_slots: HashMap::new(),
        element_slots: HashMap::new(),
        attribute_slots: HashMap::new(),
        group_slots: HashMap::new(),
        attribute_group_slots: HashMap::new(),
        builtins: HashMap::new(),
        in_progress: HashSet::new(),
        expanding_groups: Vec::new(),
        expanding_attribute_groups: Vec::new(),
        resolving_heads: Vec::new(),
        diagnostics: Diagnostics::default(),
    };

    builder.register_all(set)?;

    let reserved = builder.slots.keys().copied().collect::<Vec<_>>();
    for slot in reserved {
        builder.ensure(slot)?;
    }

    let slot_names = builder
        .slots
        .iter()
        .map(|(ref_, slot)| (*ref_, slot.name.clone()))
        .collect::<HashMap<_, _>>();
    let graph = builder.graph.finish(config, |ref_| {
        slot_names
            .get(&ref_)
            .cloned()
            .unwrap_or_else(|| QName::with_optional_namespace(None::<String>, "anonymous"))
    })?;
    tracing::info!(nodes = graph.len(), "type graph built");

    diagnostics.extend(builder.diagnostics);
    Ok(graph)
}

impl<'s> Builder<'s> {
    fn register_all(&mut self, set: &'s SchemaSet) -> Result<(), GenerateError> {
        for (document_index, document) in set.documents.iter().enumerate() {
            for type_ in &document.types {
                let Some(name) = type_.name() else { continue };
                register(
                    &mut self.registry.types,
                    DeclarationKind::Type,
                    name,
                    type_,
                    document_index,
                )?;
                let slot = self.reserve(name, document_index, SlotDeclaration::Type(type_));
                self.type_slots.insert(name.clone(), slot);
            }
            for element in &document.elements {
                register(
                    &mut self.registry.elements,
                    DeclarationKind::Element,
                    &element.name,
                    element,
                    document_index,
                )?;
                for head in &element.substitution_groups {
                    self.registry
                        .substitutes
                        .entry(head.clone())
                        .or_default()
                        .push(element.name.clone());
                }
                if matches!(element.type_, TypeUse::Simple(_) | TypeUse::Complex(_)) {
                    let slot = self.reserve(
                        &element.name,
                        document_index,
                        SlotDeclaration::Element(element),
                    );
                    self.element_slots.insert(element.name.clone(), slot);
                }
            }
            for attribute in &document.attributes {
                register(
                    &mut self.registry.attributes,
                    DeclarationKind::Attribute,
                    &attribute.name,
                    attribute,
                    document_index,
                )?;
                if matches!(attribute.type_, TypeUse::Simple(_)) {
                    let slot = self.reserve(
                        &attribute.name,
                        document_index,
                        SlotDeclaration::Attribute(attribute),
                    );
                    self.attribute_slots.insert(attribute.name.clone(), slot);
                }
            }
            for group in &document.groups {
                register(
                    &mut self.registry.groups,
                    DeclarationKind::Group,
                    &group.name,
                    group,
                    document_index,
                )?;
                let slot = self.reserve(&group.name, document_index, SlotDeclaration::Group(group));
                self.group_slots.insert(group.name.clone(), slot);
            }
            for attribute_group in &document.attribute_groups {
                register(
                    &mut self.registry.attribute_groups,
                    DeclarationKind::AttributeGroup,
                    &attribute_group.name,
                    attribute_group,
                    document_index,
                )?;
                let slot = self.reserve(
                    &attribute_group.name,
                    document_index,
                    SlotDeclaration::AttributeGroup(attribute_group),
                );
                self.attribute_group_slots
                    .insert(attribute_group.name.clone(), slot);
            }
        }
        tracing::debug!(
            types = self.registry.types.len(),
            elements = self.registry.elements.len(),
            groups = self.registry.groups.len(),
            attribute_groups = self.registry.attribute_groups.len(),
            attributes = self.registry.attributes.len(),
            "registered top-level declarations"
        );
        Ok(())
    }

    fn reserve(&mut self, name: &QName, document: usize, declaration: SlotDeclaration<'s>) -> TypeRef {
        let ref_ = self.graph.reserve();
        self.slots.insert(
            ref_,
            Slot {
                name: name.clone(),
                document,
                declaration,
            },
        );
        ref_
    }

    /// Fills a reserved slot if it is not filled yet. Reaching a slot that is already being
    /// filled means a circular derivation.
    fn ensure(&mut self, ref_: TypeRef) -> Result<(), GenerateError> {
        if self.graph.is_filled(ref_) {
            return Ok(());
        }
        let Some(slot) = self.slots.get(&ref_).cloned() else {
            return Ok(());
        };
        if !self.in_progress.insert(ref_) {
            return Err(GenerateError::CircularReference {
                kind: slot.kind(),
                name: slot.name,
            });
        }

        let namespace = self.namespaces[slot.document].clone();
        let node = match slot.declaration {
            SlotDeclaration::Type(TypeDefinition::Simple(simple)) => {
                self.build_simple(simple, &slot.name, false, slot.document)?
            }
            SlotDeclaration::Type(TypeDefinition::Complex(complex)) => {
                self.build_complex(ref_, complex, &slot.name, false, slot.document)?
            }
            SlotDeclaration::Element(element) => {
                let mut node = match &element.type_ {
                    TypeUse::Simple(simple) => {
                        self.build_simple(simple, &slot.name, true, slot.document)?
                    }
                    TypeUse::Complex(complex) => {
                        self.build_complex(ref_, complex, &slot.name, true, slot.document)?
                    }
                    _ => unreachable!("only elements with anonymous types get a slot"),
                };
                if node.documentation.is_empty() {
                    node.documentation = element.documentation.clone();
                }
                node
            }
            SlotDeclaration::Attribute(attribute) => {
                let TypeUse::Simple(simple) = &attribute.type_ else {
                    unreachable!("only attributes with anonymous types get a slot")
                };
                let mut node = self.build_simple(simple, &slot.name, true, slot.document)?;
                if node.documentation.is_empty() {
                    node.documentation = attribute.documentation.clone();
                }
                node
            }
            SlotDeclaration::Group(group) => {
                self.expanding_groups.push(group.name.clone());
                let mut properties = Vec::new();
                let in_choice = group.model_group.compositor == Compositor::Choice;
                for particle in &group.model_group.particles {
                    self.flatten_particle(
                        ref_,
                        particle,
                        (1, MaxOccurs::Count(1)),
                        in_choice,
                        slot.document,
                        &mut properties,
                    )?;
                }
                self.expanding_groups.pop();
                TypeNode {
                    name: slot.name.clone(),
                    anonymous: false,
                    builtin: false,
                    namespace: namespace.clone(),
                    documentation: group.documentation.clone(),
                    kind: TypeKind::Group(GroupFragment { properties }),
                }
            }
            SlotDeclaration::AttributeGroup(attribute_group) => {
                let mut properties = Vec::new();
                let mut prohibited = Vec::new();
                self.attribute_group_properties(
                    ref_,
                    &attribute_group.name,
                    &mut properties,
                    &mut prohibited,
                )?;
                TypeNode {
                    name: slot.name.clone(),
                    anonymous: false,
                    builtin: false,
                    namespace: namespace.clone(),
                    documentation: attribute_group.documentation.clone(),
                    kind: TypeKind::AttributeGroup(GroupFragment { properties }),
                }
            }
        };

        tracing::debug!(name = %slot.name, kind = %slot.kind(), "resolved");
        self.in_progress.remove(&ref_);
        self.graph.insert(ref_, node);
        Ok(())
    }

    fn builtin(&mut self, builtin: XsBuiltin) -> TypeRef {
        if let Some(ref_) = self.builtins.get(&builtin) {
            return *ref_;
        }
        let variety = match builtin.list_item_type() {
            Some(item) => Variety::List {
                item: self.builtin(item),
            },
            None => Variety::Atomic,
        };
        let ref_ = self.graph.push(TypeNode {
            name: builtin.qname(),
            anonymous: false,
            builtin: true,
            namespace: BUILTIN_NAMESPACE.to_string(),
            documentation: Vec::new(),
            kind: TypeKind::Simple(SimpleType {
                builtin,
                variety,
                facets: Vec::new(),
            }),
        });
        self.builtins.insert(builtin, ref_);
        ref_
    }

    /// The handle of a named type. The node itself may not be filled yet.
    fn type_by_name(&mut self, name: &QName) -> Result<TypeRef, GenerateError> {
        if let Some(ref_) = self.type_slots.get(name) {
            return Ok(*ref_);
        }
        match XsBuiltin::from_qname(name) {
            Some(builtin) => Ok(self.builtin(builtin)),
            None => Err(GenerateError::UnresolvedReference {
                kind: DeclarationKind::Type,
                name: name.clone(),
            }),
        }
    }

    /// A named type that must be complete before the caller can continue (a base type).
    fn resolved_type_by_name(&mut self, name: &QName) -> Result<TypeRef, GenerateError> {
        let ref_ = self.type_by_name(name)?;
        self.ensure(ref_)?;
        Ok(ref_)
    }

    fn node(&self, ref_: TypeRef) -> &TypeNode {
        self.graph
            .get(ref_)
            .unwrap_or_else(|| unreachable!("{ref_:?} is used before it was filled"))
    }

    fn build_simple(
        &mut self,
        simple: &SimpleTypeDefinition,
        name: &QName,
        anonymous: bool,
        document: usize,
    ) -> Result<TypeNode, GenerateError> {
        let kind = match &simple.variety {
            SimpleDerivation::Restriction { base, facets } => {
                let base = self.simple_base(base, name, document)?;
                let (builtin, variety, base_facets) = match &self.node(base).kind {
                    TypeKind::Simple(simple) => {
                        (simple.builtin, simple.variety.clone(), simple.facets.clone())
                    }
                    TypeKind::Enumeration(enumeration) => {
                        (enumeration.builtin, Variety::Atomic, enumeration.facets.clone())
                    }
                    _ => {
                        tracing::debug!(%name, "simple type restricts a non-simple base");
                        (XsBuiltin::AnySimpleType, Variety::Atomic, Vec::new())
                    }
                };
                let (facets, conflicts) = narrow_facets(&base_facets, facets);
                for conflict in conflicts {
                    self.diagnostics.push(Diagnostic::FacetConflict {
                        type_name: name.clone(),
                        member: None,
                        facet: conflict.facet,
                        detail: conflict.detail,
                    });
                }
                match facets.enumeration() {
                    Some(values) if variety == Variety::Atomic => {
                        TypeKind::Enumeration(EnumerationType {
                            builtin,
                            values: values.to_vec(),
                            facets,
                        })
                    }
                    _ => TypeKind::Simple(SimpleType {
                        builtin,
                        variety,
                        facets,
                    }),
                }
            }
            SimpleDerivation::List { item } => {
                let item = self.simple_base(item, name, document)?;
                TypeKind::Simple(SimpleType {
                    builtin: XsBuiltin::AnySimpleType,
                    variety: Variety::List { item },
                    facets: Vec::new(),
                })
            }
            SimpleDerivation::Union { members } => {
                let members = members
                    .iter()
                    .map(|member| self.simple_base(member, name, document))
                    .collect::<Result<Vec<_>, _>>()?;
                TypeKind::Simple(SimpleType {
                    builtin: XsBuiltin::AnySimpleType,
                    variety: Variety::Union { members },
                    facets: Vec::new(),
                })
            }
        };

        Ok(TypeNode {
            name: name.clone(),
            anonymous,
            builtin: false,
            namespace: self.namespaces[document].clone(),
            documentation: simple.documentation.clone(),
            kind,
        })
    }

    fn simple_base(
        &mut self,
        base: &SimpleBase,
        context: &QName,
        document: usize,
    ) -> Result<TypeRef, GenerateError> {
        match base {
            SimpleBase::Named(name) => self.resolved_type_by_name(name),
            SimpleBase::Inline(simple) => {
                let ref_ = self.graph.reserve();
                let node = self.build_simple(simple, context, true, document)?;
                self.graph.insert(ref_, node);
                Ok(ref_)
            }
        }
    }

    fn build_complex(
        &mut self,
        self_ref: TypeRef,
        complex: &ComplexTypeDefinition,
        name: &QName,
        anonymous: bool,
        document: usize,
    ) -> Result<TypeNode, GenerateError> {
        let mut properties = Vec::new();
        let mut own_attributes = Vec::new();
        let mut prohibited = Vec::new();
        self.attribute_properties(
            self_ref,
            &complex.attributes,
            complex.any_attribute,
            document,
            &mut own_attributes,
            &mut prohibited,
        )?;

        let (base, content_model) = match &complex.content {
            ComplexContent::Simple {
                derivation,
                base: base_name,
                facets,
            } => {
                let base = self.resolved_type_by_name(base_name)?;
                let inherited = match &self.node(base).kind {
                    TypeKind::Complex(base_complex) => Some(inherit(&base_complex.properties, self_ref)),
                    _ => None,
                };
                match inherited {
                    Some(inherited) => {
                        properties.extend(inherited);
                        let value = properties.iter().position(|p| p.kind == PropertyKind::Text);
                        if let (Some(index), false) = (value, facets.is_empty()) {
                            let base_facets = self.property_facets(&properties[index])?;
                            let (narrowed, conflicts) = narrow_facets(&base_facets, facets);
                            let value_name = properties[index].name.clone();
                            self.report_conflicts(name, Some(&value_name), conflicts);
                            properties[index].facets = narrowed;
                        }
                    }
                    None => {
                        let mut value = value_property(self_ref, base);
                        if !facets.is_empty() {
                            let (narrowed, conflicts) =
                                narrow_facets(&self.facets_for(base)?, facets);
                            self.report_conflicts(name, Some(&value.name), conflicts);
                            value.facets = narrowed;
                        }
                        properties.push(value);
                    }
                }
                (
                    Some(Derivation {
                        method: *derivation,
                        base,
                    }),
                    ContentModel::Empty,
                )
            }
            ComplexContent::Complex {
                derivation,
                particle,
            } => {
                let derivation = match derivation {
                    Some((method, base_name)) => {
                        let base = self.resolved_type_by_name(base_name)?;
                        (!self.node(base).builtin).then_some(Derivation {
                            method: *method,
                            base,
                        })
                    }
                    None => None,
                };

                let mut own = Vec::new();
                if let Some(particle) = particle {
                    self.flatten_particle(
                        self_ref,
                        particle,
                        (1, MaxOccurs::Count(1)),
                        false,
                        document,
                        &mut own,
                    )?;
                }
                let mut content_model = particle
                    .as_ref()
                    .map(|particle| self.content_model(particle))
                    .unwrap_or(ContentModel::Empty);

                match derivation {
                    Some(Derivation { method, base }) => {
                        let inherited = match &self.node(base).kind {
                            TypeKind::Complex(base_complex) => {
                                if content_model == ContentModel::Empty {
                                    content_model = base_complex.content_model;
                                }
                                inherit(&base_complex.properties, self_ref)
                            }
                            _ => vec![value_property(self_ref, base)],
                        };
                        match method {
                            DerivationMethod::Extension => {
                                properties.extend(inherited);
                                properties.extend(own);
                            }
                            DerivationMethod::Restriction => {
                                properties.extend(self.restrict(name, inherited, own)?);
                            }
                        }
                    }
                    None => properties.extend(own),
                }
                (derivation, content_model)
            }
        };

        let restriction = matches!(
            base,
            Some(Derivation {
                method: DerivationMethod::Restriction,
                ..
            })
        );
        if restriction {
            properties.retain(|p| !(p.kind == PropertyKind::Attribute && prohibited.contains(&p.name)));
            let properties_so_far = std::mem::take(&mut properties);
            properties = self.restrict(name, properties_so_far, own_attributes)?;
        } else {
            properties.extend(own_attributes);
        }

        if complex.mixed && !properties.iter().any(|p| p.kind == PropertyKind::Text) {
            let string = self.builtin(XsBuiltin::String);
            properties.push(Property {
                name: QName::with_optional_namespace(None::<String>, "text"),
                kind: PropertyKind::Text,
                min_occurs: 0,
                max_occurs: MaxOccurs::Unbounded,
                ..blank_property(self_ref, string)
            });
        }

        Ok(TypeNode {
            name: name.clone(),
            anonymous,
            builtin: false,
            namespace: self.namespaces[document].clone(),
            documentation: complex.documentation.clone(),
            kind: TypeKind::Complex(ComplexType {
                base,
                content_model,
                abstract_: complex.abstract_,
                mixed: complex.mixed,
                properties,
            }),
        })
    }

    /// Applies the members of a restriction to the inherited members: identically named
    /// members narrow the inherited ones, everything else in `restricting` is dropped.
    fn restrict(
        &mut self,
        type_name: &QName,
        inherited: Vec<Property>,
        restricting: Vec<Property>,
    ) -> Result<Vec<Property>, GenerateError> {
        let mut properties = Vec::with_capacity(inherited.len());
        for mut property in inherited {
            let Some(narrower) = restricting
                .iter()
                .find(|r| r.kind == property.kind && r.name == property.name)
            else {
                properties.push(property);
                continue;
            };

            if narrower.target != property.target || !narrower.facets.is_empty() {
                let base_facets = self.property_facets(&property)?;
                let derived_facets = self.property_facets(narrower)?;
                let (facets, conflicts) = narrow_facets(&base_facets, &derived_facets);
                self.report_conflicts(type_name, Some(&property.name), conflicts);
                property.facets = facets;
            }
            property.min_occurs = narrower.min_occurs;
            property.max_occurs = narrower.max_occurs;
            if narrower.default.is_some() || narrower.fixed.is_some() {
                property.default = narrower.default.clone();
                property.fixed = narrower.fixed.clone();
            }
            if !narrower.documentation.is_empty() {
                property.documentation = narrower.documentation.clone();
            }
            properties.push(property);
        }

        for added in restricting
            .iter()
            .filter(|r| !properties.iter().any(|p| p.kind == r.kind && p.name == r.name))
        {
            tracing::debug!(
                type_name = %type_name,
                member = %added.name,
                "restriction declares a member its base does not have, ignoring it"
            );
        }
        Ok(properties)
    }

    fn report_conflicts(
        &mut self,
        type_name: &QName,
        member: Option<&QName>,
        conflicts: Vec<super::facets::FacetConflict>,
    ) {
        for conflict in conflicts {
            self.diagnostics.push(Diagnostic::FacetConflict {
                type_name: type_name.clone(),
                member: member.cloned(),
                facet: conflict.facet,
                detail: conflict.detail,
            });
        }
    }

    fn property_facets(&mut self, property: &Property) -> Result<Vec<xcg_xsd::Facet>, GenerateError> {
        if !property.facets.is_empty() {
            return Ok(property.facets.clone());
        }
        self.facets_for(property.target)
    }

    /// Facets of a simple type, filling its slot first if needed. Other nodes have none.
    fn facets_for(&mut self, target: TypeRef) -> Result<Vec<xcg_xsd::Facet>, GenerateError> {
        let is_simple_slot = matches!(
            self.slots.get(&target).map(|slot| slot.declaration),
            Some(SlotDeclaration::Type(TypeDefinition::Simple(_)) | SlotDeclaration::Attribute(_))
        );
        if is_simple_slot {
            self.ensure(target)?;
        }
        Ok(match self.graph.get(target).map(|node| &node.kind) {
            Some(TypeKind::Simple(simple)) => simple.facets.clone(),
            Some(TypeKind::Enumeration(enumeration)) => enumeration.facets.clone(),
            _ => Vec::new(),
        })
    }

    fn content_model(&self, particle: &Particle) -> ContentModel {
        let compositor = match &particle.term {
            Term::ModelGroup(group) => group.compositor,
            Term::GroupRef(name) => match self.registry.groups.get(name) {
                Some(group) => group.declaration.model_group.compositor,
                None => Compositor::Sequence,
            },
            Term::Element(_) | Term::Any => Compositor::Sequence,
        };
        match compositor {
            Compositor::Sequence => ContentModel::Sequence,
            Compositor::Choice => ContentModel::Choice,
            Compositor::All => ContentModel::All,
        }
    }

    /// Flattens a particle into member properties. Occurrence ranges multiply down the tree;
    /// members of a choice become optional.
    fn flatten_particle(
        &mut self,
        owner: TypeRef,
        particle: &Particle,
        (outer_min, outer_max): (u64, MaxOccurs),
        in_choice: bool,
        document: usize,
        out: &mut Vec<Property>,
    ) -> Result<(), GenerateError> {
        let min_occurs = if in_choice {
            0
        } else {
            outer_min.saturating_mul(particle.min_occurs)
        };
        let max_occurs = outer_max.mul(&particle.max_occurs);

        match &particle.term {
            Term::Element(ElementUse::Local(element)) => {
                let target = self.local_element_type(element, document)?;
                out.push(Property {
                    min_occurs,
                    max_occurs,
                    ..element_property(owner, element, target)
                });
            }
            Term::Element(ElementUse::Ref(name)) => {
                self.element_ref_properties(owner, name, min_occurs, max_occurs, out)?;
            }
            Term::ModelGroup(group) => {
                let in_choice = group.compositor == Compositor::Choice;
                for child in &group.particles {
                    self.flatten_particle(
                        owner,
                        child,
                        (min_occurs, max_occurs),
                        in_choice,
                        document,
                        out,
                    )?;
                }
            }
            Term::GroupRef(name) => {
                let Some(group) = self.registry.groups.get(name) else {
                    return Err(GenerateError::UnresolvedReference {
                        kind: DeclarationKind::Group,
                        name: name.clone(),
                    });
                };
                if self.expanding_groups.contains(name) {
                    return Err(GenerateError::CircularReference {
                        kind: DeclarationKind::Group,
                        name: name.clone(),
                    });
                }
                let (definition, group_document) = (group.declaration, group.document);
                let in_choice = definition.model_group.compositor == Compositor::Choice;
                self.expanding_groups.push(name.clone());
                for child in &definition.model_group.particles {
                    self.flatten_particle(
                        owner,
                        child,
                        (min_occurs, max_occurs),
                        in_choice,
                        group_document,
                        out,
                    )?;
                }
                self.expanding_groups.pop();
            }
            Term::Any => {
                let any = self.builtin(XsBuiltin::AnyType);
                out.push(Property {
                    name: QName::with_optional_namespace(None::<String>, "any"),
                    kind: PropertyKind::Any,
                    min_occurs,
                    max_occurs,
                    ..blank_property(owner, any)
                });
            }
        }
        Ok(())
    }

    fn local_element_type(
        &mut self,
        element: &ElementDeclaration,
        document: usize,
    ) -> Result<TypeRef, GenerateError> {
        match &element.type_ {
            TypeUse::Named(name) => self.type_by_name(name),
            TypeUse::Simple(simple) => {
                let ref_ = self.graph.reserve();
                let mut node = self.build_simple(simple, &element.name, true, document)?;
                if node.documentation.is_empty() {
                    node.documentation = element.documentation.clone();
                }
                self.graph.insert(ref_, node);
                Ok(ref_)
            }
            TypeUse::Complex(complex) => {
                let ref_ = self.graph.reserve();
                let mut node = self.build_complex(ref_, complex, &element.name, true, document)?;
                if node.documentation.is_empty() {
                    node.documentation = element.documentation.clone();
                }
                self.graph.insert(ref_, node);
                Ok(ref_)
            }
            TypeUse::Absent => Ok(self.builtin(XsBuiltin::AnyType)),
        }
    }

    /// The type of a top-level element; an element without a type takes the type of its
    /// substitution group head.
    fn top_level_element_type(&mut self, name: &QName) -> Result<TypeRef, GenerateError> {
        let Some(element) = self.registry.elements.get(name) else {
            return Err(GenerateError::UnresolvedReference {
                kind: DeclarationKind::Element,
                name: name.clone(),
            });
        };
        let element = element.declaration;
        match &element.type_ {
            TypeUse::Named(type_name) => self.type_by_name(type_name),
            TypeUse::Simple(_) | TypeUse::Complex(_) => {
                self.element_slots.get(name).copied().ok_or_else(|| {
                    GenerateError::UnresolvedReference {
                        kind: DeclarationKind::Element,
                        name: name.clone(),
                    }
                })
            }
            TypeUse::Absent => match element.substitution_groups.first() {
                Some(head) => {
                    if self.resolving_heads.contains(head) {
                        return Err(GenerateError::CircularReference {
                            kind: DeclarationKind::Element,
                            name: head.clone(),
                        });
                    }
                    self.resolving_heads.push(name.clone());
                    let type_ = self.top_level_element_type(head);
                    self.resolving_heads.pop();
                    type_
                }
                None => Ok(self.builtin(XsBuiltin::AnyType)),
            },
        }
    }

    fn element_ref_properties(
        &mut self,
        owner: TypeRef,
        name: &QName,
        min_occurs: u64,
        max_occurs: MaxOccurs,
        out: &mut Vec<Property>,
    ) -> Result<(), GenerateError> {
        let candidates = match self.config.substitution_groups {
            SubstitutionGroups::AbstractBase => vec![name.clone()],
            SubstitutionGroups::PerMember => {
                let mut members = self.substitution_group(name);
                members.retain(|member| {
                    self.registry
                        .elements
                        .get(member)
                        .is_some_and(|e| !e.declaration.abstract_)
                });
                if members.is_empty() {
                    vec![name.clone()]
                } else {
                    members
                }
            }
        };
        let alternatives = candidates.len() > 1;

        for candidate in candidates {
            let target = self.top_level_element_type(&candidate)?;
            let element = self.registry.elements[&candidate].declaration;
            out.push(Property {
                min_occurs: if alternatives { 0 } else { min_occurs },
                max_occurs,
                ..element_property(owner, element, target)
            });
        }
        Ok(())
    }

    /// The head followed by its transitive substitution group members, in declaration order.
    fn substitution_group(&self, head: &QName) -> Vec<QName> {
        let mut members = vec![head.clone()];
        let mut next = 0;
        while next < members.len() {
            if let Some(direct) = self.registry.substitutes.get(&members[next]) {
                for member in direct {
                    if !members.contains(member) {
                        members.push(member.clone());
                    }
                }
            }
            next += 1;
        }
        members
    }

    fn attribute_properties(
        &mut self,
        owner: TypeRef,
        uses: &[AttributeUse],
        any_attribute: bool,
        document: usize,
        out: &mut Vec<Property>,
        prohibited: &mut Vec<QName>,
    ) -> Result<(), GenerateError> {
        for use_ in uses {
            match use_ {
                AttributeUse::Local { declaration, use_ } => {
                    if *use_ == Use::Prohibited {
                        prohibited.push(declaration.name.clone());
                        continue;
                    }
                    let target = self.attribute_type(&declaration.type_, &declaration.name, document)?;
                    out.push(attribute_property(
                        owner,
                        declaration,
                        target,
                        *use_,
                        declaration.value_constraint.as_ref(),
                    ));
                }
                AttributeUse::Ref {
                    name,
                    use_,
                    value_constraint,
                } => {
                    if *use_ == Use::Prohibited {
                        prohibited.push(name.clone());
                        continue;
                    }
                    let Some(attribute) = self.registry.attributes.get(name) else {
                        return Err(GenerateError::UnresolvedReference {
                            kind: DeclarationKind::Attribute,
                            name: name.clone(),
                        });
                    };
                    let (declaration, declared_in) = (attribute.declaration, attribute.document);
                    let target = match self.attribute_slots.get(name) {
                        Some(slot) => *slot,
                        None => self.attribute_type(&declaration.type_, name, declared_in)?,
                    };
                    out.push(attribute_property(
                        owner,
                        declaration,
                        target,
                        *use_,
                        value_constraint
                            .as_ref()
                            .or(declaration.value_constraint.as_ref()),
                    ));
                }
                AttributeUse::GroupRef(name) => {
                    self.attribute_group_properties(owner, name, out, prohibited)?;
                }
            }
        }

        if any_attribute && !out.iter().any(|p| p.kind == PropertyKind::AnyAttribute) {
            let any = self.builtin(XsBuiltin::AnyType);
            out.push(Property {
                name: QName::with_optional_namespace(None::<String>, "anyAttribute"),
                kind: PropertyKind::AnyAttribute,
                min_occurs: 0,
                max_occurs: MaxOccurs::Unbounded,
                ..blank_property(owner, any)
            });
        }
        Ok(())
    }

    fn attribute_group_properties(
        &mut self,
        owner: TypeRef,
        name: &QName,
        out: &mut Vec<Property>,
        prohibited: &mut Vec<QName>,
    ) -> Result<(), GenerateError> {
        let Some(group) = self.registry.attribute_groups.get(name) else {
            return Err(GenerateError::UnresolvedReference {
                kind: DeclarationKind::AttributeGroup,
                name: name.clone(),
            });
        };
        if self.expanding_attribute_groups.contains(name) {
            return Err(GenerateError::CircularReference {
                kind: DeclarationKind::AttributeGroup,
                name: name.clone(),
            });
        }
        let (definition, document) = (group.declaration, group.document);
        self.expanding_attribute_groups.push(name.clone());
        self.attribute_properties(
            owner,
            &definition.attributes,
            definition.any_attribute,
            document,
            out,
            prohibited,
        )?;
        self.expanding_attribute_groups.pop();
        Ok(())
    }

    fn attribute_type(
        &mut self,
        type_: &TypeUse,
        context: &QName,
        document: usize,
    ) -> Result<TypeRef, GenerateError> {
        match type_ {
            TypeUse::Named(name) => self.type_by_name(name),
            TypeUse::Simple(simple) => {
                let ref_ = self.graph.reserve();
                let node = self.build_simple(simple, context, true, document)?;
                self.graph.insert(ref_, node);
                Ok(ref_)
            }
            TypeUse::Complex(_) | TypeUse::Absent => Ok(self.builtin(XsBuiltin::AnySimpleType)),
        }
    }
}

fn blank_property(owner: TypeRef, target: TypeRef) -> Property {
    Property {
        owner,
        name: QName::with_optional_namespace(None::<String>, ""),
        kind: PropertyKind::Element,
        target,
        min_occurs: 1,
        max_occurs: MaxOccurs::Count(1),
        cardinality: Cardinality::default(),
        facets: Vec::new(),
        mapped: Default::default(),
        default: None,
        fixed: None,
        nillable: false,
        documentation: Vec::new(),
        inherited: false,
    }
}

fn value_property(owner: TypeRef, target: TypeRef) -> Property {
    Property {
        name: QName::with_optional_namespace(None::<String>, "value"),
        kind: PropertyKind::Text,
        ..blank_property(owner, target)
    }
}

fn element_property(owner: TypeRef, element: &ElementDeclaration, target: TypeRef) -> Property {
    let (default, fixed) = split_value_constraint(element.value_constraint.as_ref());
    Property {
        name: element.name.clone(),
        kind: PropertyKind::Element,
        default,
        fixed,
        nillable: element.nillable,
        documentation: element.documentation.clone(),
        ..blank_property(owner, target)
    }
}

fn attribute_property(
    owner: TypeRef,
    attribute: &AttributeDeclaration,
    target: TypeRef,
    use_: Use,
    value_constraint: Option<&ValueConstraint>,
) -> Property {
    let (default, fixed) = split_value_constraint(value_constraint);
    Property {
        name: attribute.name.clone(),
        kind: PropertyKind::Attribute,
        min_occurs: u64::from(use_ == Use::Required),
        default,
        fixed,
        documentation: attribute.documentation.clone(),
        ..blank_property(owner, target)
    }
}

fn split_value_constraint(
    value_constraint: Option<&ValueConstraint>,
) -> (Option<String>, Option<String>) {
    match value_constraint {
        Some(ValueConstraint::Default(value)) => (Some(value.clone()), None),
        Some(ValueConstraint::Fixed(value)) => (None, Some(value.clone())),
        None => (None, None),
    }
}

fn inherit(properties: &[Property], owner: TypeRef) -> Vec<Property> {
    properties
        .iter()
        .map(|property| Property {
            owner,
            inherited: true,
            ..property.clone()
        })
        .collect()
}
