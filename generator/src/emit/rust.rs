use std::collections::HashSet;

use proc_macro2::Span;
use quote::quote;
use syn::{
    parse::Parser, parse_quote, Arm, Attribute, Field, FieldMutability, Fields, Item, Token, Type,
    Variant,
};
use xcg_xsd::{DerivationMethod, Facet};

use crate::{
    graph::{ComplexType, EnumerationType, Property, PropertyKind, TypeKind, TypeRef},
    mapper::{Cardinality, Primitive, TargetType},
    naming::{ident, ResolvedGraph},
};

/// Where rendered code lives in the emitted module tree.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Location<'a> {
    pub namespace: &'a str,
    /// Number of `super::` segments from the rendering module to the parent of the namespace
    /// modules.
    pub depth: usize,
}

/// Wraps items into a file carrying the generator header.
pub(crate) fn render_file(items: Vec<Item>) -> String {
    let doc_comment = concat!(
        " Generated by ",
        env!("CARGO_PKG_NAME"),
        " ",
        env!("CARGO_PKG_VERSION")
    );
    let root = syn::File {
        shebang: None,
        attrs: vec![
            parse_quote!(#![doc = #doc_comment]),
            parse_quote!(#![allow(dead_code, unused_imports)]),
        ],
        items,
    };
    prettyplease::unparse(&root)
}

/// The items of one emitted type.
pub(crate) fn type_items(resolved: &ResolvedGraph, ref_: TypeRef, location: Location) -> Vec<Item> {
    match &resolved.graph().get(ref_).kind {
        TypeKind::Complex(complex) => vec![render_struct(resolved, ref_, complex, location)],
        TypeKind::Enumeration(enumeration) => render_enum(resolved, ref_, enumeration),
        _ => Vec::new(),
    }
}

fn primitive_type(primitive: Primitive) -> Type {
    syn::parse_str(primitive.rust_type())
        .unwrap_or_else(|error| unreachable!("{primitive:?} is not a type path: {error}"))
}

/// Path of an emitted type as seen from `location`.
fn type_path(resolved: &ResolvedGraph, target: TypeRef, location: Location) -> Type {
    let node = resolved.graph().get(target);
    let name = ident(resolved.type_name(target));
    if node.namespace == location.namespace {
        parse_quote!(#name)
    } else {
        let module = ident(resolved.module_name(&node.namespace));
        let supers = (0..location.depth).map(|_| quote!(super::));
        parse_quote!(#(#supers)* #module::#name)
    }
}

/// Whether `to` is reachable from `from` through members holding exactly one value. Such a
/// cycle needs indirection to have a finite size.
fn reaches_inline(resolved: &ResolvedGraph, from: TypeRef, to: TypeRef) -> bool {
    let graph = resolved.graph();
    let mut stack = vec![from];
    let mut seen = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == to {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        for property in graph.properties(current) {
            if property.cardinality == Cardinality::Collection {
                continue;
            }
            if let TargetType::Type(target) = property.mapped.target {
                if matches!(graph.get(target).kind, TypeKind::Complex(_)) {
                    stack.push(target);
                }
            }
        }
    }
    false
}

fn field_type(
    resolved: &ResolvedGraph,
    owner: TypeRef,
    property: &Property,
    location: Location,
) -> Type {
    if property.kind == PropertyKind::AnyAttribute {
        return parse_quote!(std::collections::BTreeMap<String, String>);
    }
    let (mut type_, boxed) = match property.mapped.target {
        TargetType::Primitive(primitive) => (primitive_type(primitive), false),
        TargetType::Type(target) => (
            type_path(resolved, target, location),
            property.cardinality != Cardinality::Collection
                && reaches_inline(resolved, target, owner),
        ),
    };
    if property.mapped.list {
        type_ = parse_quote!(Vec<#type_>);
    }
    match property.cardinality {
        Cardinality::Required if boxed => parse_quote!(Box<#type_>),
        Cardinality::Required => type_,
        Cardinality::Optional if boxed => parse_quote!(Option<Box<#type_>>),
        Cardinality::Optional => parse_quote!(Option<#type_>),
        // A single list value is already a collection
        Cardinality::Collection if property.mapped.list && !property.max_occurs.is_repeated() => {
            type_
        }
        Cardinality::Collection => parse_quote!(Vec<#type_>),
    }
}

/// Doc attributes for the non-empty `sections`, separated by blank lines.
fn doc_attrs(sections: &[Vec<String>]) -> Vec<Attribute> {
    let mut attrs = Vec::new();
    for section in sections.iter().filter(|section| !section.is_empty()) {
        if !attrs.is_empty() {
            attrs.push(parse_quote!(#[doc = ""]));
        }
        for line in section {
            let line = format!(" {line}");
            attrs.push(parse_quote!(#[doc = #line]));
        }
    }
    attrs
}

fn facet_line(facet: &Facet) -> Option<String> {
    let value = match facet {
        Facet::Pattern(pattern) => format!("`{pattern}`"),
        Facet::Length(n)
        | Facet::MinLength(n)
        | Facet::MaxLength(n)
        | Facet::TotalDigits(n)
        | Facet::FractionDigits(n) => n.to_string(),
        Facet::MinInclusive(v)
        | Facet::MinExclusive(v)
        | Facet::MaxInclusive(v)
        | Facet::MaxExclusive(v) => v.clone(),
        Facet::Enumeration(_) | Facet::WhiteSpace(_) => return None,
    };
    Some(format!("{}: {value}", facet.name()))
}

/// Schema details of a member that its Rust type does not carry.
fn constraint_lines(property: &Property) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(qualifier) = property.mapped.qualifier {
        lines.push(format!("Schema type: `{qualifier}`"));
    }
    if let Some(default) = &property.default {
        lines.push(format!("Default: `{default}`"));
    }
    if let Some(fixed) = &property.fixed {
        lines.push(format!("Fixed: `{fixed}`"));
    }
    if property.nillable {
        lines.push("Nillable".to_string());
    }
    lines.extend(property.facets.iter().filter_map(facet_line));
    lines
}

fn serde_attr(property: &Property) -> Attribute {
    let local_name = &property.name.local_name;
    let mut args = vec![match property.kind {
        PropertyKind::Element => quote!(rename = #local_name),
        PropertyKind::Attribute => {
            let rename = format!("@{local_name}");
            quote!(rename = #rename)
        }
        PropertyKind::Text => quote!(rename = "$text"),
        PropertyKind::Any => quote!(rename = "$value"),
        PropertyKind::AnyAttribute => quote!(flatten),
    }];
    if property.kind != PropertyKind::AnyAttribute {
        match property.cardinality {
            Cardinality::Required => {}
            Cardinality::Optional => {
                args.push(quote!(default));
                args.push(quote!(skip_serializing_if = "Option::is_none"));
            }
            Cardinality::Collection => {
                args.push(quote!(default));
                args.push(quote!(skip_serializing_if = "Vec::is_empty"));
            }
        }
    }
    parse_quote!(#[serde(#(#args),*)])
}

fn render_struct(
    resolved: &ResolvedGraph,
    ref_: TypeRef,
    complex: &ComplexType,
    location: Location,
) -> Item {
    let graph = resolved.graph();
    let node = graph.get(ref_);
    let name = ident(resolved.type_name(ref_));

    let mut notes = Vec::new();
    if let Some(derivation) = complex.base.filter(|d| graph.is_emitted(d.base)) {
        let base = type_path(resolved, derivation.base, location);
        let base = quote!(#base).to_string().replace(' ', "");
        let method = match derivation.method {
            DerivationMethod::Extension => "extension",
            DerivationMethod::Restriction => "restriction",
        };
        notes.push(format!("Derived from [`{base}`] by {method}."));
    }
    if complex.abstract_ {
        notes.push("Abstract: instance documents use a derived type instead.".to_string());
    }
    let attrs = doc_attrs(&[node.documentation.clone(), notes]);

    let fields = complex
        .properties
        .iter()
        .enumerate()
        .map(|(index, property)| {
            let annotations = resolved.annotations(ref_, index);
            let mut attrs = doc_attrs(&[
                property.documentation.clone(),
                constraint_lines(property),
                annotations.map(|a| a.docs.clone()).unwrap_or_default(),
            ]);
            attrs.push(serde_attr(property));
            for source in annotations.iter().flat_map(|a| &a.attributes) {
                match Attribute::parse_outer.parse_str(source) {
                    Ok(parsed) => attrs.extend(parsed),
                    Err(error) => tracing::warn!(
                        %error,
                        attribute = source.as_str(),
                        "ignoring member attribute that does not parse"
                    ),
                }
            }
            Field {
                attrs,
                vis: parse_quote!(pub),
                mutability: FieldMutability::None,
                ident: Some(ident(resolved.member_name(ref_, index))),
                colon_token: Some(<Token![:]>::default()),
                ty: field_type(resolved, ref_, property, location),
            }
        })
        .collect::<Vec<_>>();

    let rename = &node.name.local_name;
    parse_quote! {
        #(#attrs)*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(rename = #rename)]
        pub struct #name {
            #(#fields),*
        }
    }
}

fn render_enum(resolved: &ResolvedGraph, ref_: TypeRef, enumeration: &EnumerationType) -> Vec<Item> {
    let node = resolved.graph().get(ref_);
    let name = ident(resolved.type_name(ref_));
    let type_name = resolved.type_name(ref_).trim_start_matches("r#");

    let members = enumeration
        .values
        .iter()
        .enumerate()
        .map(|(index, value)| (value, ident(resolved.variant_name(ref_, index))))
        .collect::<Vec<_>>();

    let variants = members.iter().map(|(value, variant)| {
        let literal = &value.value;
        let mut attrs = if value.documentation.is_empty() {
            doc_attrs(&[vec![format!("Enumeration value for `` {literal} ``")]])
        } else {
            doc_attrs(&[value.documentation.clone()])
        };
        attrs.push(parse_quote!(#[serde(rename = #literal)]));
        Variant {
            attrs,
            ident: variant.clone(),
            fields: Fields::Unit,
            discriminant: None,
        }
    });
    let as_str_arms = members.iter().map(|(value, variant)| -> Arm {
        let literal = &value.value;
        parse_quote! {
            Self::#variant => #literal,
        }
    });
    let from_str_arms = members.iter().map(|(value, variant)| -> Arm {
        let literal = &value.value;
        parse_quote! {
            #literal => Ok(Self::#variant),
        }
    });

    let attrs = doc_attrs(&[node.documentation.clone()]);
    let type_def: Item = parse_quote! {
        #(#attrs)*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum #name {
            #(#variants),*
        }
    };
    let impl_block: Item = parse_quote! {
        impl #name {
            /// The value as written in instance documents.
            pub fn as_str(&self) -> &'static str {
                match self {
                    #(#as_str_arms)*
                }
            }
        }
    };
    let from_str: Item = parse_quote! {
        impl std::str::FromStr for #name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    #(#from_str_arms)*
                    _ => Err(format!("{value:?} is not a value of {}", #type_name)),
                }
            }
        }
    };
    let display: Item = parse_quote! {
        impl std::fmt::Display for #name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
    vec![type_def, impl_block, from_str, display]
}

/// `#[path = "<file>"] mod <module>; pub use <module>::*;` for every per-type file of a
/// namespace directory.
pub(crate) fn module_index_items(modules: &[(String, String)]) -> Vec<Item> {
    let mut items = Vec::new();
    for (file, module) in modules {
        let module = syn::Ident::new(module, Span::call_site());
        items.push(parse_quote! {
            #[path = #file]
            mod #module;
        });
        items.push(parse_quote! {
            pub use #module::*;
        });
    }
    items
}

#[cfg(test)]
mod tests {
    use quote::ToTokens;

    use super::*;

    #[test]
    fn every_primitive_is_a_type() {
        use Primitive::*;
        for primitive in [
            Bool, U8, I8, U16, I16, U32, I32, U64, I64, BigInt, Decimal, F32, F64, String,
            DateTimeOffset, NaiveDate, NaiveDateTime, NaiveTime, Bytes, AnyXml,
        ] {
            let rendered = primitive_type(primitive)
                .to_token_stream()
                .to_string()
                .replace(' ', "");
            assert_eq!(rendered, primitive.rust_type());
        }
        assert!(matches!(primitive_type(Bytes), Type::Path(_)));
    }

    #[test]
    fn doc_sections_are_separated() {
        let attrs = doc_attrs(&[
            vec!["An order.".to_string()],
            Vec::new(),
            vec!["pattern: `[A-Z]+`".to_string()],
        ]);
        let lines = attrs
            .iter()
            .map(|attr| match &attr.meta {
                syn::Meta::NameValue(syn::MetaNameValue {
                    value:
                        syn::Expr::Lit(syn::ExprLit {
                            lit: syn::Lit::Str(line),
                            ..
                        }),
                    ..
                }) => line.value(),
                other => panic!("unexpected attribute {}", other.to_token_stream()),
            })
            .collect::<Vec<_>>();
        assert_eq!(lines, [" An order.", "", " pattern: `[A-Z]+`"]);
    }

    #[test]
    fn facets_render_as_constraint_lines() {
        assert_eq!(
            facet_line(&Facet::MaxLength(10)).as_deref(),
            Some("maxLength: 10")
        );
        assert_eq!(
            facet_line(&Facet::MinInclusive("-5".into())).as_deref(),
            Some("minInclusive: -5")
        );
        assert_eq!(facet_line(&Facet::Enumeration(Vec::new())), None);
    }

    #[test]
    fn module_index_declares_and_reexports() {
        let file = render_file(module_index_items(&[(
            "PurchaseOrder.rs".to_string(),
            "purchase_order".to_string(),
        )]));
        assert!(file.contains("#[path = \"PurchaseOrder.rs\"]\nmod purchase_order;"));
        assert!(file.contains("pub use purchase_order::*;"));
    }
}
