use roxmltree::Node;

use super::values::collapse_whitespace;

pub const TAG_NAME: &str = "annotation";

/// Collects the text of the `<documentation>` children of the `<annotation>` child of `node`,
/// one entry per non-empty `<documentation>` element, whitespace collapsed.
///
/// `<appinfo>` is machine-targeted and not carried over.
pub fn documentation(node: Node) -> Vec<String> {
    node.children()
        .filter(|c| c.tag_name().name() == TAG_NAME)
        .flat_map(|annotation| annotation.children())
        .filter(|c| c.tag_name().name() == "documentation")
        .map(|documentation| {
            let text = documentation
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect::<String>();
            collapse_whitespace(&text)
        })
        .filter(|text| !text.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_documentation_text() {
        let doc = roxmltree::Document::parse(
            r#"<element>
                <annotation>
                    <appinfo>ignored</appinfo>
                    <documentation>  The order
                        number. </documentation>
                    <documentation><b>Bold</b> text</documentation>
                    <documentation>   </documentation>
                </annotation>
            </element>"#,
        )
        .unwrap();
        assert_eq!(
            documentation(doc.root_element()),
            vec!["The order number.".to_string(), "Bold text".to_string()]
        );
    }
}
