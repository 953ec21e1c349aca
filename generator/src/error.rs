use std::{fmt, path::PathBuf};

use thiserror::Error;
use xcg_xsd::{QName, XsdError};

/// The kinds of top-level declarations that are registered and resolved by name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Type,
    Element,
    Group,
    AttributeGroup,
    Attribute,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Type => "type",
            Self::Element => "element",
            Self::Group => "group",
            Self::AttributeGroup => "attribute group",
            Self::Attribute => "attribute",
        })
    }
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    InputParse(#[from] XsdError),
    #[error("unresolved {kind} reference {name}")]
    UnresolvedReference { kind: DeclarationKind, name: QName },
    #[error("{kind} {name} is declared more than once")]
    DuplicateDeclaration { kind: DeclarationKind, name: QName },
    #[error("circular {kind} reference through {name}")]
    CircularReference { kind: DeclarationKind, name: QName },
}

/// Recoverable findings, returned alongside a successful result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A restriction tried to widen a facet of its base; the base facet was kept.
    FacetConflict {
        type_name: QName,
        member: Option<QName>,
        facet: &'static str,
        detail: String,
    },
    /// A preferred identifier was taken; `assigned` is what was used instead.
    NameCollision {
        scope: String,
        preferred: String,
        assigned: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FacetConflict {
                type_name,
                member: Some(member),
                facet,
                detail,
            } => write!(
                f,
                "{facet} facet conflict on {type_name}/{member}: {detail}, keeping the base facet"
            ),
            Self::FacetConflict {
                type_name,
                member: None,
                facet,
                detail,
            } => write!(
                f,
                "{facet} facet conflict on {type_name}: {detail}, keeping the base facet"
            ),
            Self::NameCollision {
                scope,
                preferred,
                assigned,
            } => write!(f, "{preferred:?} is taken in {scope}, using {assigned:?}"),
        }
    }
}

/// A failed write of one artifact. Other artifacts are unaffected.
#[derive(Debug, Error)]
#[error("failed to write {path}: {source}")]
pub struct EmissionWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Collects diagnostics and logs each one as it is raised.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{diagnostic}");
        self.0.push(diagnostic);
    }

    pub(crate) fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}
