use thiserror::Error;

use crate::import::ImportError;

#[derive(Debug, Error)]
pub enum XsdError {
    #[error("failed to parse {location}: {source}")]
    Xml {
        location: String,
        #[source]
        source: roxmltree::Error,
    },
    #[error("failed to resolve prefix {0:?} to a namespace URI")]
    NamePrefixNotResolved(String),
    #[error("expected a <schema> root element, found <{0}>")]
    NotASchema(String),
    #[error("<{element}> is missing the required `{attribute}` attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("invalid value {value:?} for `{attribute}`")]
    InvalidValue {
        attribute: &'static str,
        value: String,
    },
    #[error("unexpected <{found}> inside <{parent}>")]
    UnexpectedElement { parent: String, found: String },
    #[error("failed to load {location}: {source}")]
    Import {
        location: String,
        #[source]
        source: ImportError,
    },
}
