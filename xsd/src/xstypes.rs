use std::fmt;

use super::error::XsdError;

pub type NCName = String;
pub type AnyURI = String;

/// The namespace bound to the reserved `xml` prefix (Namespaces in XML 1.0, §3).
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// An expanded name: an optional namespace URI plus a local name.
///
/// This is the resolution key for every top-level declaration of a schema set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace_name: Option<AnyURI>,
    pub local_name: NCName,
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace_name) = self.namespace_name.as_ref() {
            write!(f, "{{{}}}{}", namespace_name, self.local_name)
        } else {
            write!(f, "{}", self.local_name)
        }
    }
}

impl QName {
    pub fn with_namespace(
        namespace_name: impl Into<String>,
        local_name: impl Into<String>,
    ) -> Self {
        Self::with_optional_namespace(Some(namespace_name), local_name)
    }

    pub fn with_optional_namespace(
        namespace_name: Option<impl Into<String>>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace_name: namespace_name.map(Into::into),
            local_name: local_name.into(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace_name.as_deref()
    }

    /// Resolves a prefixed name against the namespace declarations in scope at `context`.
    pub fn qualified(
        prefix: &str,
        local_name: impl Into<String>,
        context: roxmltree::Node,
    ) -> Result<Self, XsdError> {
        let resolved_prefix = if prefix == "xml" {
            XML_NAMESPACE
        } else {
            context
                .lookup_namespace_uri(Some(prefix))
                .ok_or_else(|| XsdError::NamePrefixNotResolved(prefix.into()))?
        };
        Ok(Self::with_namespace(resolved_prefix, local_name))
    }

    /// Resolves an unprefixed name. With a default namespace in scope the name takes that
    /// namespace (Namespaces in XML 1.0, §6.2), otherwise it falls back to `fallback`, which is
    /// the adopted namespace of a chameleon include and `None` everywhere else.
    pub fn unqualified(
        local_name: impl Into<String>,
        context: roxmltree::Node,
        fallback: Option<&str>,
    ) -> Self {
        let namespace_name = context.lookup_namespace_uri(None).or(fallback);
        QName::with_optional_namespace(namespace_name, local_name)
    }

    pub fn parse(
        source: &str,
        context: roxmltree::Node,
        fallback: Option<&str>,
    ) -> Result<Self, XsdError> {
        let source = source.trim();
        if let Some((prefix, local)) = source.split_once(':') {
            Self::qualified(prefix, local, context)
        } else {
            Ok(Self::unqualified(source, context, fallback))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_prefixes_in_scope() {
        let doc = roxmltree::Document::parse(
            r#"<schema xmlns="urn:default" xmlns:t="urn:t"><element/></schema>"#,
        )
        .unwrap();
        let element = doc.root_element().first_child().unwrap();

        let name = QName::parse("t:order", element, None).unwrap();
        assert_eq!(name, QName::with_namespace("urn:t", "order"));

        let name = QName::parse("order", element, Some("urn:chameleon")).unwrap();
        assert_eq!(name, QName::with_namespace("urn:default", "order"));

        let name = QName::parse("xml:lang", element, None).unwrap();
        assert_eq!(name.namespace(), Some(XML_NAMESPACE));
    }

    #[test]
    fn unprefixed_name_uses_fallback_without_default_namespace() {
        let doc = roxmltree::Document::parse(r#"<schema><element/></schema>"#).unwrap();
        let element = doc.root_element().first_child().unwrap();

        assert_eq!(
            QName::parse("order", element, None).unwrap(),
            QName::with_optional_namespace(None::<String>, "order")
        );
        assert_eq!(
            QName::parse("order", element, Some("urn:x")).unwrap(),
            QName::with_namespace("urn:x", "order")
        );
    }

    #[test]
    fn unknown_prefix_is_an_error() {
        let doc = roxmltree::Document::parse(r#"<schema/>"#).unwrap();
        let err = QName::parse("nope:order", doc.root_element(), None).unwrap_err();
        assert!(matches!(err, XsdError::NamePrefixNotResolved(p) if p == "nope"));
    }

    #[test]
    fn display_uses_clark_notation() {
        assert_eq!(QName::with_namespace("urn:a", "b").to_string(), "{urn:a}b");
    }
}
