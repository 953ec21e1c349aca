use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
};

use roxmltree::Node;
use thiserror::Error;

use super::{error::XsdError, values::actual_value};

/// This structure represents the `import` element; it is not a schema component.
///
/// Note that an import is allowed to have neither a `schemaLocation` nor a `namespace` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub namespace: Option<String>,
    pub schema_location: Option<String>,
}

impl Import {
    pub const TAG_NAME: &'static str = "import";

    pub(crate) fn map_from_xml(import: Node, schema: Node) -> Result<Self, XsdError> {
        let namespace = actual_value::<String>(import, "namespace")?;
        let schema_location = actual_value::<String>(import, "schemaLocation")?;
        let target_namespace = actual_value::<&str>(schema, "targetNamespace")?;

        // § 4.2.6 Schema Representation Constraint: Import Constraints and Semantics
        // 1 The appropriate case among the following must be true:
        //   1.1 If the namespace [attribute] is present, then its ·actual value· does not match
        //     the ·actual value· of the enclosing <schema>'s targetNamespace [attribute].
        //   1.2 If the namespace [attribute] is not present, then the enclosing <schema> has a
        //     targetNamespace [attribute]
        match (namespace.as_deref(), target_namespace) {
            (Some(ns), Some(tns)) if ns == tns => {
                return Err(XsdError::InvalidValue {
                    attribute: "namespace",
                    value: ns.to_string(),
                })
            }
            (None, None) => {
                return Err(XsdError::MissingAttribute {
                    element: Self::TAG_NAME,
                    attribute: "namespace",
                })
            }
            _ => {}
        }

        Ok(Import {
            namespace,
            schema_location,
        })
    }
}

/// An `include` (or `redefine`) edge. Both pull the referenced document into the including
/// document's target namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Include {
    pub schema_location: String,
}

impl Include {
    pub(crate) fn map_from_xml(include: Node) -> Result<Self, XsdError> {
        let element = match include.tag_name().name() {
            "redefine" => {
                tracing::warn!("<redefine> is treated as a plain <include>");
                "redefine"
            }
            _ => "include",
        };
        let schema_location = actual_value::<String>(include, "schemaLocation")?
            .ok_or(XsdError::MissingAttribute {
                element,
                attribute: "schemaLocation",
            })?;
        Ok(Include { schema_location })
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("the resolver does not support the location {0:?}")]
    UnsupportedLocation(String),
    #[error("no schema document is registered under {0:?}")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("an unspecified error occurred while loading the schema")]
    UnspecifiedLoad(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A schema document's text together with the canonical location it was loaded from. The
/// canonical location is the deduplication key of a schema set and the base for resolving the
/// document's own relative references.
#[derive(Clone, Debug)]
pub struct ResolvedDocument {
    pub location: String,
    pub text: String,
}

pub trait ImportResolver {
    /// Loads the document at `location`, which may be relative to `base`, the canonical location
    /// of the referencing document (`None` for entry documents).
    fn resolve(&self, base: Option<&str>, location: &str)
        -> Result<ResolvedDocument, ImportError>;
}

impl<R: ImportResolver + ?Sized> ImportResolver for &R {
    fn resolve(
        &self,
        base: Option<&str>,
        location: &str,
    ) -> Result<ResolvedDocument, ImportError> {
        (**self).resolve(base, location)
    }
}

/// Loads schema documents from the local filesystem.
#[derive(Copy, Clone, Debug, Default)]
pub struct FsResolver;

impl ImportResolver for FsResolver {
    fn resolve(
        &self,
        base: Option<&str>,
        location: &str,
    ) -> Result<ResolvedDocument, ImportError> {
        let location = location.strip_prefix("file://").unwrap_or(location);
        if location.contains("://") {
            return Err(ImportError::UnsupportedLocation(location.to_string()));
        }
        let path = match base.and_then(|base| Path::new(base).parent()) {
            Some(dir) => dir.join(location),
            None => PathBuf::from(location),
        };
        let path = path.canonicalize().map_err(|source| ImportError::Io {
            path: path.clone(),
            source,
        })?;
        let text = std::fs::read_to_string(&path).map_err(|source| ImportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(ResolvedDocument {
            location: path.to_string_lossy().into_owned(),
            text,
        })
    }
}

/// Serves schema documents registered in memory under `/`-separated names.
#[derive(Clone, Debug, Default)]
pub struct MemoryResolver {
    documents: HashMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.documents
            .insert(normalize_relative(Path::new(&name.into())), text.into());
    }
}

impl ImportResolver for MemoryResolver {
    fn resolve(
        &self,
        base: Option<&str>,
        location: &str,
    ) -> Result<ResolvedDocument, ImportError> {
        let joined = match base.and_then(|base| Path::new(base).parent()) {
            Some(dir) => dir.join(location),
            None => PathBuf::from(location),
        };
        let key = normalize_relative(&joined);
        match self.documents.get(&key) {
            Some(text) => Ok(ResolvedDocument {
                location: key,
                text: text.clone(),
            }),
            None => Err(ImportError::NotFound(key)),
        }
    }
}

/// Lexically normalizes `a/./b/../c` to `a/c`.
fn normalize_relative(path: &Path) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(part) => parts.extend(part.to_str()),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_resolver_resolves_relative_to_base() {
        let resolver = MemoryResolver::new()
            .with_document("main/order.xsd", "<schema/>")
            .with_document("common/types.xsd", "<schema/>");

        let doc = resolver
            .resolve(Some("main/order.xsd"), "../common/./types.xsd")
            .unwrap();
        assert_eq!(doc.location, "common/types.xsd");
        assert!(matches!(
            resolver.resolve(None, "missing.xsd"),
            Err(ImportError::NotFound(_))
        ));
    }

    #[test]
    fn fs_resolver_reads_relative_files() {
        let dir = std::env::temp_dir().join(format!("xcg-xsd-fs-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("main.xsd"), "<schema/>").unwrap();
        std::fs::write(dir.join("sub/inc.xsd"), "<schema id=\"inc\"/>").unwrap();

        let main = FsResolver
            .resolve(None, dir.join("main.xsd").to_str().unwrap())
            .unwrap();
        let inc = FsResolver.resolve(Some(&main.location), "sub/inc.xsd").unwrap();
        assert!(inc.text.contains("inc"));
        assert!(matches!(
            FsResolver.resolve(None, "http://example.com/a.xsd"),
            Err(ImportError::UnsupportedLocation(_))
        ));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn import_of_own_namespace_is_rejected() {
        let doc = roxmltree::Document::parse(
            r#"<schema targetNamespace="urn:a"><import namespace="urn:a"/></schema>"#,
        )
        .unwrap();
        let schema = doc.root_element();
        let import = schema.first_element_child().unwrap();
        assert!(Import::map_from_xml(import, schema).is_err());
    }
}
