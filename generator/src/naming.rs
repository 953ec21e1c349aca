//! Identifier assignment.
//!
//! Every emitted type gets an identifier unique among the types of its namespace, every member
//! one unique within its owning type and every enumeration value one unique within its
//! enumeration. The result is a [`ResolvedGraph`], which is what emission works from.

use std::collections::{HashMap, HashSet};

use check_keyword::CheckKeyword;
use heck::{ToPascalCase, ToSnakeCase};
use indexmap::IndexMap;
use proc_macro2::Span;
use syn::Ident;

use crate::{
    config::{
        CaseTransform, GeneratorConfig, MemberAnnotations, MemberInfo, MemberVisitor,
        ReservedWordPolicy,
    },
    error::{Diagnostic, Diagnostics},
    graph::{PropertyKind, TypeGraph, TypeKind, TypeRef},
};

/// Names the emitted code relies on from the prelude; no generated type may shadow them.
const PRELUDE: [&str; 5] = ["Option", "Vec", "String", "Box", "Result"];

/// Keywords that cannot be written as raw identifiers.
const NON_RAW_KEYWORDS: [&str; 4] = ["crate", "self", "super", "Self"];

/// A type graph with an identifier for every emitted type, member, enumeration value and
/// namespace module.
#[derive(Debug)]
pub struct ResolvedGraph {
    graph: TypeGraph,
    emitted: Vec<TypeRef>,
    type_names: HashMap<TypeRef, String>,
    member_names: HashMap<(TypeRef, usize), String>,
    variant_names: HashMap<(TypeRef, usize), String>,
    module_names: IndexMap<String, String>,
    annotations: HashMap<(TypeRef, usize), MemberAnnotations>,
}

impl ResolvedGraph {
    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    /// Emitted types in arena order.
    pub fn emitted(&self) -> &[TypeRef] {
        &self.emitted
    }

    /// Identifier of an emitted type, possibly in raw form (`r#type`).
    pub fn type_name(&self, ref_: TypeRef) -> &str {
        &self.type_names[&ref_]
    }

    /// Identifier of the `index`th property of an emitted complex type.
    pub fn member_name(&self, owner: TypeRef, index: usize) -> &str {
        &self.member_names[&(owner, index)]
    }

    /// Identifier of the `index`th value of an emitted enumeration.
    pub fn variant_name(&self, owner: TypeRef, index: usize) -> &str {
        &self.variant_names[&(owner, index)]
    }

    /// Module identifier of a target namespace.
    pub fn module_name(&self, namespace: &str) -> &str {
        &self.module_names[namespace]
    }

    /// Target namespaces with emitted types, in order of first appearance.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.module_names.keys().map(String::as_str)
    }

    pub fn annotations(&self, owner: TypeRef, index: usize) -> Option<&MemberAnnotations> {
        self.annotations.get(&(owner, index))
    }
}

/// Builds a `syn` identifier from an assigned name, honoring the raw form.
pub(crate) fn ident(name: &str) -> Ident {
    match name.strip_prefix("r#") {
        Some(raw) => Ident::new_raw(raw, Span::call_site()),
        None => Ident::new(name, Span::call_site()),
    }
}

/// Identifiers unique within one scope.
struct Scope {
    label: String,
    taken: HashSet<String>,
}

impl Scope {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            taken: HashSet::new(),
        }
    }

    fn with_prelude(label: impl Into<String>) -> Self {
        let mut scope = Self::new(label);
        scope.taken.extend(PRELUDE.iter().map(|name| name.to_string()));
        scope
    }

    /// Claims `preferred`, or the first free alternative: the `_attr` suffix for attributes,
    /// then an incrementing counter.
    fn claim(
        &mut self,
        preferred: &str,
        attribute: bool,
        policy: ReservedWordPolicy,
        diagnostics: &mut Diagnostics,
    ) -> String {
        let first = escape_keyword(preferred, policy);
        if self.taken.insert(first.clone()) {
            return first;
        }

        let suffixed = attribute.then(|| escape_keyword(&format!("{preferred}_attr"), policy));
        let assigned = suffixed
            .into_iter()
            .chain((2..).map(|n| escape_keyword(&format!("{preferred}{n}"), policy)))
            .find(|candidate| !self.taken.contains(candidate))
            .unwrap_or_else(|| unreachable!("the counter is unbounded"));
        self.taken.insert(assigned.clone());

        diagnostics.push(Diagnostic::NameCollision {
            scope: self.label.clone(),
            preferred: first,
            assigned: assigned.clone(),
        });
        assigned
    }
}

fn escape_keyword(name: &str, policy: ReservedWordPolicy) -> String {
    if NON_RAW_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else if name.is_keyword() {
        match policy {
            ReservedWordPolicy::Raw => format!("r#{name}"),
            ReservedWordPolicy::Suffix => format!("{name}_"),
        }
    } else {
        name.to_string()
    }
}

/// Replaces characters that cannot appear in an identifier with `_` and prefixes a leading
/// digit. Names that end up empty or a bare `_` become `fallback`.
pub(crate) fn legalize(name: &str, fallback: &str) -> String {
    let mut legal = name.replace(|c: char| !(c.is_ascii_alphanumeric() || c == '_'), "_");
    if legal.starts_with(|c: char| c.is_ascii_digit()) {
        legal.insert(0, '_');
    }
    if legal.chars().all(|c| c == '_') {
        fallback.to_string()
    } else {
        legal
    }
}

fn type_ident(name: &str, case: CaseTransform) -> String {
    match case {
        CaseTransform::Conventional => legalize(&name.to_pascal_case(), "Type"),
        CaseTransform::Direct => legalize(name, "Type"),
    }
}

fn member_ident(name: &str, case: CaseTransform) -> String {
    match case {
        CaseTransform::Conventional => legalize(&name.to_snake_case(), "field"),
        CaseTransform::Direct => legalize(name, "field"),
    }
}

fn module_ident(namespace: &str) -> String {
    legalize(&namespace.to_snake_case(), "default")
}

fn variant_ident(value: &str, case: CaseTransform) -> String {
    if value.is_empty() {
        return "Empty".to_string();
    }
    let sanitized = value.replace(|c: char| !c.is_ascii_alphanumeric(), "_");
    let name = match case {
        CaseTransform::Conventional => sanitized.to_pascal_case(),
        CaseTransform::Direct => sanitized,
    };
    if name.is_empty() {
        "Empty".to_string()
    } else if value.starts_with(|c: char| c.is_ascii_alphabetic()) {
        name
    } else {
        format!("_{name}")
    }
}

/// Assigns identifiers to the emitted part of `graph` and runs the member hook.
pub(crate) fn resolve(
    graph: TypeGraph,
    config: &GeneratorConfig,
    visitor: Option<&dyn MemberVisitor>,
    diagnostics: &mut Diagnostics,
) -> ResolvedGraph {
    let policy = config.reserved_word_policy;
    let case = config.case_transform;

    let emitted = graph
        .iter()
        .filter(|(ref_, _)| graph.is_emitted(*ref_))
        .map(|(ref_, _)| ref_)
        .collect::<Vec<_>>();

    let mut module_scope = Scope::new("modules");
    let mut module_names = IndexMap::new();
    for ref_ in &emitted {
        let namespace = &graph.get(*ref_).namespace;
        if !module_names.contains_key(namespace) {
            let name = module_scope.claim(&module_ident(namespace), false, policy, diagnostics);
            module_names.insert(namespace.clone(), name);
        }
    }

    // Named types claim their names before anonymous ones, so that an anonymous type never
    // pushes a declared type off its schema name.
    let mut type_scopes = HashMap::<String, Scope>::new();
    let mut type_names = HashMap::new();
    let ordered = emitted
        .iter()
        .filter(|ref_| !graph.get(**ref_).anonymous)
        .chain(emitted.iter().filter(|ref_| graph.get(**ref_).anonymous));
    for ref_ in ordered {
        let node = graph.get(*ref_);
        let scope = type_scopes
            .entry(node.namespace.clone())
            .or_insert_with(|| Scope::with_prelude(format!("namespace {}", node.namespace)));
        let name = scope.claim(
            &type_ident(&node.name.local_name, case),
            false,
            policy,
            diagnostics,
        );
        type_names.insert(*ref_, name);
    }

    let mut member_names = HashMap::new();
    let mut variant_names = HashMap::new();
    let mut annotations = HashMap::new();
    for ref_ in &emitted {
        let node = graph.get(*ref_);
        let owner = &type_names[ref_];
        match &node.kind {
            TypeKind::Complex(complex) => {
                let mut scope = Scope::new(format!("type {owner}"));
                // Elements first, so that a colliding attribute is the one that gets suffixed
                let (attributes, others): (Vec<_>, Vec<_>) = complex
                    .properties
                    .iter()
                    .enumerate()
                    .partition(|(_, p)| p.kind == PropertyKind::Attribute);
                for (index, property) in others.into_iter().chain(attributes) {
                    let name = scope.claim(
                        &member_ident(&property.name.local_name, case),
                        property.kind == PropertyKind::Attribute,
                        policy,
                        diagnostics,
                    );
                    member_names.insert((*ref_, index), name);
                }

                if let Some(visitor) = visitor {
                    for (index, property) in complex.properties.iter().enumerate() {
                        let mut member_annotations = MemberAnnotations::default();
                        visitor.visit_member(
                            MemberInfo {
                                owner,
                                ident: &member_names[&(*ref_, index)],
                                schema_name: &property.name,
                                kind: property.kind,
                            },
                            &mut member_annotations,
                        );
                        if !member_annotations.is_empty() {
                            annotations.insert((*ref_, index), member_annotations);
                        }
                    }
                }
            }
            TypeKind::Enumeration(enumeration) => {
                let mut scope = Scope::new(format!("enumeration {owner}"));
                for (index, value) in enumeration.values.iter().enumerate() {
                    let name = scope.claim(
                        &variant_ident(&value.value, case),
                        false,
                        policy,
                        diagnostics,
                    );
                    variant_names.insert((*ref_, index), name);
                }
            }
            _ => {}
        }
    }

    tracing::debug!(
        types = type_names.len(),
        members = member_names.len(),
        variants = variant_names.len(),
        "names assigned"
    );

    ResolvedGraph {
        graph,
        emitted,
        type_names,
        member_names,
        variant_names,
        module_names,
        annotations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(scope: &mut Scope, name: &str, attribute: bool) -> (String, Vec<Diagnostic>) {
        let mut diagnostics = Diagnostics::default();
        let name = scope.claim(name, attribute, ReservedWordPolicy::Raw, &mut diagnostics);
        (name, diagnostics.into_vec())
    }

    #[test]
    fn keywords_are_escaped_per_policy() {
        assert_eq!(escape_keyword("type", ReservedWordPolicy::Raw), "r#type");
        assert_eq!(escape_keyword("type", ReservedWordPolicy::Suffix), "type_");
        assert_eq!(escape_keyword("self", ReservedWordPolicy::Raw), "self_");
        assert_eq!(escape_keyword("Self", ReservedWordPolicy::Raw), "Self_");
        assert_eq!(escape_keyword("order", ReservedWordPolicy::Raw), "order");
    }

    #[test]
    fn raw_names_become_raw_idents() {
        assert_eq!(ident("r#match").to_string(), "r#match");
        assert_eq!(ident("amount").to_string(), "amount");
    }

    #[test]
    fn illegal_characters_are_replaced() {
        assert_eq!(legalize("first-name", "field"), "first_name");
        assert_eq!(legalize("3dModel", "Type"), "_3dModel");
        assert_eq!(legalize("-", "field"), "field");
        assert_eq!(member_ident("Order.ID", CaseTransform::Conventional), "order_id");
        assert_eq!(type_ident("purchase-order", CaseTransform::Conventional), "PurchaseOrder");
        assert_eq!(type_ident("purchase-order", CaseTransform::Direct), "purchase_order");
    }

    #[test]
    fn enumeration_values_become_variants() {
        let case = CaseTransform::Conventional;
        assert_eq!(variant_ident("", case), "Empty");
        assert_eq!(variant_ident("in-stock", case), "InStock");
        assert_eq!(variant_ident("1.0", case), "_10");
        assert_eq!(variant_ident("-", case), "Empty");
        assert_eq!(variant_ident("USD", CaseTransform::Direct), "USD");
    }

    #[test]
    fn colliding_attribute_gets_kind_suffix() {
        let mut scope = Scope::new("type Order");
        assert_eq!(claim(&mut scope, "id", false).0, "id");
        let (name, diagnostics) = claim(&mut scope, "id", true);
        assert_eq!(name, "id_attr");
        assert_eq!(
            diagnostics,
            vec![Diagnostic::NameCollision {
                scope: "type Order".into(),
                preferred: "id".into(),
                assigned: "id_attr".into(),
            }]
        );
        assert_eq!(claim(&mut scope, "id", true).0, "id2");
    }

    #[test]
    fn counter_increments_until_free() {
        let mut scope = Scope::new("namespace orders");
        assert_eq!(claim(&mut scope, "Item", false).0, "Item");
        assert_eq!(claim(&mut scope, "Item", false).0, "Item2");
        assert_eq!(claim(&mut scope, "Item", false).0, "Item3");
    }

    #[test]
    fn prelude_names_are_taken() {
        let mut scope = Scope::with_prelude("namespace orders");
        let (name, diagnostics) = claim(&mut scope, "String", false);
        assert_eq!(name, "String2");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(claim(&mut scope, "Order", false).0, "Order");
    }
}
