//! Reader for XSD schema sets.
//!
//! Schema documents are mapped into a plain tree of declarations close to their XML
//! representation (§3 of XML Schema Part 1). References between declarations stay symbolic
//! ([`QName`]s); resolving them is left to consumers.

pub mod annotation;
pub mod attribute_decl;
pub mod attribute_group_def;
pub mod attribute_use;
pub mod builtins;
pub mod complex_type_def;
pub mod constraining_facet;
pub mod element_decl;
pub mod error;
pub mod import;
pub mod mapping_context;
pub mod model_group_def;
pub mod particle;
pub mod schema;
pub mod schema_set;
pub mod shared;
pub mod simple_type_def;
pub mod xstypes;

mod values;

pub use attribute_decl::AttributeDeclaration;
pub use attribute_group_def::AttributeGroupDefinition;
pub use attribute_use::{AttributeUse, Use};
pub use builtins::XsBuiltin;
pub use complex_type_def::{ComplexContent, ComplexTypeDefinition, DerivationMethod};
pub use constraining_facet::{EnumerationValue, Facet, FacetsExt, WhiteSpaceValue};
pub use element_decl::{ElementDeclaration, ElementUse};
pub use error::XsdError;
pub use import::{
    FsResolver, Import, ImportError, ImportResolver, Include, MemoryResolver, ResolvedDocument,
};
pub use model_group_def::ModelGroupDefinition;
pub use particle::{Compositor, MaxOccurs, ModelGroup, Particle, Term};
pub use schema::{ParseOptions, SchemaDocument, TypeDefinition};
pub use schema_set::SchemaSet;
pub use shared::{TypeUse, ValueConstraint};
pub use simple_type_def::{SimpleBase, SimpleDerivation, SimpleTypeDefinition};
pub use xstypes::QName;
