use std::collections::HashMap;

use clap::ValueEnum;

use crate::graph::PropertyKind;
use xcg_xsd::QName;

/// How schema names are turned into Rust identifiers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CaseTransform {
    /// PascalCase types and variants, snake_case fields and modules.
    #[default]
    Conventional,
    /// The schema name as written, with characters illegal in identifiers replaced.
    Direct,
}

/// How identifiers that collide with Rust keywords are escaped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReservedWordPolicy {
    /// `r#type`
    #[default]
    Raw,
    /// `type_`
    Suffix,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ArtifactGrouping {
    /// One `<ns>.rs` per namespace.
    #[default]
    SingleFile,
    /// One `<ns>/<Type>.rs` per type, plus a `<ns>/mod.rs` tying them together.
    PerType,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SubstitutionGroups {
    /// One member per concrete element of the head's substitution group.
    #[default]
    PerMember,
    /// A single member typed after the head element.
    AbstractBase,
}

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Map `date` and `dateTime` to an offset-carrying timestamp.
    pub with_time_zone: bool,
    /// Map `date` to a date-only type instead of a timestamp.
    pub native_date_support: bool,
    pub case_transform: CaseTransform,
    pub reserved_word_policy: ReservedWordPolicy,
    pub artifact_grouping: ArtifactGrouping,
    pub create_destination_if_missing: bool,
    pub substitution_groups: SubstitutionGroups,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            with_time_zone: false,
            native_date_support: true,
            case_transform: CaseTransform::default(),
            reserved_word_policy: ReservedWordPolicy::default(),
            artifact_grouping: ArtifactGrouping::default(),
            create_destination_if_missing: true,
            substitution_groups: SubstitutionGroups::default(),
        }
    }
}

/// Chooses the target namespace (the emitted module) for the types of a schema document.
///
/// Consulted once per schema document, with the document's target namespace.
pub trait NamespaceProvider: Send + Sync {
    fn target_namespace(&self, schema_namespace: Option<&str>) -> String;
}

/// Derives a module name from the namespace URI: the scheme is dropped and the remaining
/// alphanumeric runs are lower-cased and joined with `_`. Documents without a namespace go to
/// `default`.
#[derive(Copy, Clone, Debug, Default)]
pub struct UriNamespaceProvider;

impl NamespaceProvider for UriNamespaceProvider {
    fn target_namespace(&self, schema_namespace: Option<&str>) -> String {
        let Some(uri) = schema_namespace else {
            return "default".to_string();
        };
        let without_scheme = match uri.split_once("://") {
            Some((_, rest)) => rest,
            None => uri.strip_prefix("urn:").unwrap_or(uri),
        };
        let name = without_scheme
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|segment| !segment.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("_");
        if name.is_empty() {
            "default".to_string()
        } else {
            name
        }
    }
}

/// Explicit namespace to module mappings, falling back to [`UriNamespaceProvider`].
#[derive(Clone, Debug, Default)]
pub struct MappedNamespaceProvider {
    overrides: HashMap<Option<String>, String>,
}

impl MappedNamespaceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `uri` (the empty string standing for "no namespace") to `name`.
    pub fn with(mut self, uri: impl Into<String>, name: impl Into<String>) -> Self {
        let uri = uri.into();
        let key = (!uri.is_empty()).then_some(uri);
        self.overrides.insert(key, name.into());
        self
    }
}

impl NamespaceProvider for MappedNamespaceProvider {
    fn target_namespace(&self, schema_namespace: Option<&str>) -> String {
        self.overrides
            .get(&schema_namespace.map(String::from))
            .cloned()
            .unwrap_or_else(|| UriNamespaceProvider.target_namespace(schema_namespace))
    }
}

/// What a [`MemberVisitor`] gets to see of a named member.
#[derive(Clone, Copy, Debug)]
pub struct MemberInfo<'a> {
    /// Identifier of the owning type.
    pub owner: &'a str,
    /// Identifier assigned to the member.
    pub ident: &'a str,
    pub schema_name: &'a QName,
    pub kind: PropertyKind,
}

/// Extra doc lines and attributes a [`MemberVisitor`] attaches to a member.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemberAnnotations {
    pub docs: Vec<String>,
    /// Outer attributes in source form, e.g. `#[serde(skip)]`.
    pub attributes: Vec<String>,
}

impl MemberAnnotations {
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty() && self.attributes.is_empty()
    }
}

/// Post-processing hook run once for every member after naming. It may annotate members but
/// cannot rename them.
pub trait MemberVisitor: Send + Sync {
    fn visit_member(&self, member: MemberInfo<'_>, annotations: &mut MemberAnnotations);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_namespaces_become_module_names() {
        let provider = UriNamespaceProvider;
        assert_eq!(
            provider.target_namespace(Some("http://example.com/Orders/v1")),
            "example_com_orders_v1"
        );
        assert_eq!(provider.target_namespace(Some("urn:acme:billing")), "acme_billing");
        assert_eq!(provider.target_namespace(None), "default");
        assert_eq!(provider.target_namespace(Some("::")), "default");
    }

    #[test]
    fn mapped_provider_prefers_overrides() {
        let provider = MappedNamespaceProvider::new()
            .with("urn:a", "alpha")
            .with("", "unqualified");
        assert_eq!(provider.target_namespace(Some("urn:a")), "alpha");
        assert_eq!(provider.target_namespace(None), "unqualified");
        assert_eq!(provider.target_namespace(Some("urn:b")), "b");
    }
}
