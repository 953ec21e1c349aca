use roxmltree::Node;

use super::{
    error::XsdError,
    values::{actual_value, invalid, ActualValue},
    xstypes::QName,
};

/// `elementFormDefault` / `attributeFormDefault` / `form`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Form {
    Qualified,
    #[default]
    Unqualified,
}

impl ActualValue<'_> for Form {
    fn convert(src: &str, attribute: &'static str) -> Result<Self, XsdError> {
        match src.trim() {
            "qualified" => Ok(Self::Qualified),
            "unqualified" => Ok(Self::Unqualified),
            _ => Err(invalid(attribute, src)),
        }
    }
}

/// Per-document state needed while mapping the children of one `<schema>` element.
#[derive(Clone, Debug, Default)]
pub struct MappingContext {
    /// The effective target namespace. For a chameleon include this is the includer's namespace.
    pub target_namespace: Option<String>,
    /// Set when a document without a `targetNamespace` was included into a namespaced one; its
    /// unprefixed references then resolve into the adopted namespace.
    pub chameleon: bool,
    pub element_form_default: Form,
    pub attribute_form_default: Form,
}

impl MappingContext {
    pub(crate) fn for_schema(
        schema: Node,
        adopted_namespace: Option<&str>,
    ) -> Result<Self, XsdError> {
        let declared = actual_value::<String>(schema, "targetNamespace")?;
        let chameleon = declared.is_none() && adopted_namespace.is_some();
        Ok(Self {
            target_namespace: declared.or_else(|| adopted_namespace.map(String::from)),
            chameleon,
            element_form_default: actual_value(schema, "elementFormDefault")?.unwrap_or_default(),
            attribute_form_default: actual_value(schema, "attributeFormDefault")?
                .unwrap_or_default(),
        })
    }

    /// Resolves a QName-valued attribute (`type`, `ref`, `base`, ...) in scope at `node`.
    pub fn qname(&self, source: &str, node: Node) -> Result<QName, XsdError> {
        let fallback = if self.chameleon {
            self.target_namespace.as_deref()
        } else {
            None
        };
        QName::parse(source, node, fallback)
    }

    /// The expanded name of a top-level declaration or definition.
    pub fn top_level_name(&self, name: &str) -> QName {
        QName::with_optional_namespace(self.target_namespace.as_deref(), name.trim())
    }

    pub(crate) fn local_element_name(&self, node: Node, name: &str) -> Result<QName, XsdError> {
        let form = actual_value::<Form>(node, "form")?.unwrap_or(self.element_form_default);
        Ok(self.local_name(form, name))
    }

    pub(crate) fn local_attribute_name(&self, node: Node, name: &str) -> Result<QName, XsdError> {
        let form = actual_value::<Form>(node, "form")?.unwrap_or(self.attribute_form_default);
        Ok(self.local_name(form, name))
    }

    fn local_name(&self, form: Form, name: &str) -> QName {
        match form {
            Form::Qualified => self.top_level_name(name),
            Form::Unqualified => QName::with_optional_namespace(None::<String>, name.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chameleon_documents_adopt_the_includer_namespace() {
        let doc = roxmltree::Document::parse(r#"<schema><element type="Order"/></schema>"#)
            .unwrap();
        let schema = doc.root_element();
        let context = MappingContext::for_schema(schema, Some("urn:orders")).unwrap();
        assert!(context.chameleon);

        let element = schema.first_element_child().unwrap();
        assert_eq!(
            context.qname("Order", element).unwrap(),
            QName::with_namespace("urn:orders", "Order")
        );
    }

    #[test]
    fn local_names_follow_the_form_default() {
        let doc = roxmltree::Document::parse(
            r#"<schema targetNamespace="urn:t" elementFormDefault="qualified">
                <element name="a"/><element name="b" form="unqualified"/>
            </schema>"#,
        )
        .unwrap();
        let schema = doc.root_element();
        let context = MappingContext::for_schema(schema, None).unwrap();
        let mut elements = schema.children().filter(|c| c.is_element());

        let a = elements.next().unwrap();
        assert_eq!(
            context.local_element_name(a, "a").unwrap(),
            QName::with_namespace("urn:t", "a")
        );
        let b = elements.next().unwrap();
        assert_eq!(context.local_element_name(b, "b").unwrap().namespace(), None);
    }
}
