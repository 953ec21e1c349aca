use std::collections::{HashSet, VecDeque};

use super::{
    builtins::{is_xml_namespace, XML_NAMESPACE_LOCATION, XML_NAMESPACE_SCHEMA},
    error::XsdError,
    import::ImportResolver,
    schema::{ParseOptions, SchemaDocument},
};

/// The closed set of schema documents reachable from one or more entry documents.
///
/// Documents are kept in discovery order (breadth first from the entries), so two loads of the
/// same inputs yield the same sequence.
#[derive(Clone, Debug, Default)]
pub struct SchemaSet {
    pub documents: Vec<SchemaDocument>,
}

struct Pending {
    base: Option<String>,
    location: String,
    adopted_namespace: Option<String>,
}

impl SchemaSet {
    /// Loads `entries` and every document they transitively include or import with a
    /// `schemaLocation`. An import of the XML namespace is served from the bundled schema.
    pub fn load<R: ImportResolver + ?Sized>(
        entries: &[impl AsRef<str>],
        resolver: &R,
        options: ParseOptions,
    ) -> Result<Self, XsdError> {
        let mut queue = entries
            .iter()
            .map(|entry| Pending {
                base: None,
                location: entry.as_ref().to_string(),
                adopted_namespace: None,
            })
            .collect::<VecDeque<_>>();

        let mut requested = HashSet::<(String, Option<String>)>::new();
        // A chameleon document included into two namespaces is kept once per namespace
        let mut seen = HashSet::<(String, Option<String>)>::new();
        let mut set = SchemaSet::default();
        let mut xml_namespace_requested = false;

        while let Some(pending) = queue.pop_front() {
            let resolved = resolver
                .resolve(pending.base.as_deref(), &pending.location)
                .map_err(|source| XsdError::Import {
                    location: pending.location.clone(),
                    source,
                })?;
            if !requested.insert((resolved.location.clone(), pending.adopted_namespace.clone())) {
                continue;
            }

            let document = SchemaDocument::parse(
                &resolved.location,
                &resolved.text,
                pending.adopted_namespace.as_deref(),
                options,
            )?;
            let adopted = document
                .chameleon
                .then(|| document.target_namespace.clone())
                .flatten();
            if !seen.insert((document.location.clone(), adopted)) {
                continue;
            }
            tracing::debug!(
                location = %document.location,
                namespace = ?document.target_namespace,
                "loaded schema document"
            );

            for include in &document.includes {
                queue.push_back(Pending {
                    base: Some(document.location.clone()),
                    location: include.schema_location.clone(),
                    adopted_namespace: document.target_namespace.clone(),
                });
            }
            for import in &document.imports {
                if is_xml_namespace(import.namespace.as_deref()) {
                    xml_namespace_requested = true;
                    continue;
                }
                match &import.schema_location {
                    Some(location) => queue.push_back(Pending {
                        base: Some(document.location.clone()),
                        location: location.clone(),
                        adopted_namespace: None,
                    }),
                    None => tracing::debug!(
                        namespace = ?import.namespace,
                        "import without schemaLocation, expecting the namespace among the inputs"
                    ),
                }
            }

            set.documents.push(document);
        }

        if xml_namespace_requested && !set.contains_namespace(crate::xstypes::XML_NAMESPACE) {
            set.documents.push(SchemaDocument::parse(
                XML_NAMESPACE_LOCATION,
                XML_NAMESPACE_SCHEMA,
                None,
                ParseOptions::default(),
            )?);
        }

        tracing::info!(documents = set.documents.len(), "schema set loaded");
        Ok(set)
    }

    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.documents
            .iter()
            .any(|d| d.target_namespace.as_deref() == Some(namespace))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::import::MemoryResolver;

    const HEADER: &str = r#"xmlns:xs="http://www.w3.org/2001/XMLSchema""#;

    fn schema(attrs: &str, body: &str) -> String {
        format!("<xs:schema {HEADER} {attrs}>{body}</xs:schema>")
    }

    #[test]
    fn follows_includes_and_imports_once() {
        let resolver = MemoryResolver::new()
            .with_document(
                "main.xsd",
                schema(
                    r#"targetNamespace="urn:main""#,
                    r#"<xs:include schemaLocation="part.xsd"/>
                       <xs:import namespace="urn:common" schemaLocation="lib/common.xsd"/>"#,
                ),
            )
            .with_document(
                "part.xsd",
                schema(
                    "",
                    r#"<xs:include schemaLocation="main.xsd"/><xs:complexType name="Part"/>"#,
                ),
            )
            .with_document(
                "lib/common.xsd",
                schema(r#"targetNamespace="urn:common""#, ""),
            );

        let set = SchemaSet::load(&["main.xsd"], &resolver, ParseOptions::default()).unwrap();
        let locations = set
            .documents
            .iter()
            .map(|d| d.location.as_str())
            .collect::<Vec<_>>();
        assert_eq!(locations, ["main.xsd", "part.xsd", "lib/common.xsd"]);

        let part = &set.documents[1];
        assert!(part.chameleon);
        assert_eq!(part.target_namespace.as_deref(), Some("urn:main"));
        assert_eq!(
            part.types[0].name().unwrap().namespace(),
            Some("urn:main")
        );
    }

    #[test]
    fn serves_the_xml_namespace() {
        let resolver = MemoryResolver::new().with_document(
            "a.xsd",
            schema(
                r#"targetNamespace="urn:a""#,
                r#"<xs:import namespace="http://www.w3.org/XML/1998/namespace"/>"#,
            ),
        );
        let set = SchemaSet::load(&["a.xsd"], &resolver, ParseOptions::default()).unwrap();
        assert!(set.contains_namespace(crate::xstypes::XML_NAMESPACE));
        let xml = set.documents.last().unwrap();
        assert_eq!(xml.attributes.len(), 4);
    }

    #[test]
    fn missing_document_is_an_import_error() {
        let resolver = MemoryResolver::new().with_document(
            "a.xsd",
            schema("", r#"<xs:include schemaLocation="gone.xsd"/>"#),
        );
        let err = SchemaSet::load(&["a.xsd"], &resolver, ParseOptions::default()).unwrap_err();
        assert!(matches!(err, XsdError::Import { location, .. } if location == "gone.xsd"));
    }
}
