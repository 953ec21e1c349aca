//! Generates Rust data types from XSD schema sets.
//!
//! A run goes through four stages:
//!
//! 1. the schema set is turned into a [`TypeGraph`](graph::TypeGraph) with every reference
//!    resolved ([`graph`]),
//! 2. every member gets a Rust type and a cardinality ([`mapper`]),
//! 3. types, members and enumeration values get unique identifiers ([`naming`]),
//! 4. the named graph is partitioned into files and written to a sink ([`emit`]).
//!
//! ```no_run
//! use xcg_generator::{emit::FileSink, Generator, GeneratorConfig};
//! use xcg_xsd::FsResolver;
//!
//! let generator = Generator::new(GeneratorConfig::default());
//! let set = generator.load(&["schemas/orders.xsd"], &FsResolver)?;
//! let generated = generator.generate(&set, &mut FileSink::new("src/generated"))?;
//! for diagnostic in &generated.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok::<_, xcg_generator::GenerateError>(())
//! ```

pub mod config;
pub mod emit;
pub mod error;
pub mod graph;
pub mod mapper;
pub mod naming;

use std::sync::{atomic::AtomicBool, Arc};

use xcg_xsd::{ImportResolver, ParseOptions, SchemaSet};

pub use config::{
    ArtifactGrouping, CaseTransform, GeneratorConfig, MappedNamespaceProvider, MemberAnnotations,
    MemberInfo, MemberVisitor, NamespaceProvider, ReservedWordPolicy, SubstitutionGroups,
    UriNamespaceProvider,
};
pub use emit::{EmissionReport, OutputSink};
pub use error::{DeclarationKind, Diagnostic, EmissionWriteError, GenerateError};
pub use graph::TypeGraph;
pub use naming::ResolvedGraph;

use error::Diagnostics;

/// The outcome of a successful run.
#[derive(Debug)]
pub struct Generated {
    pub report: EmissionReport,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Generator {
    config: GeneratorConfig,
    parse_options: ParseOptions,
    namespaces: Box<dyn NamespaceProvider>,
    member_visitor: Option<Box<dyn MemberVisitor>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            parse_options: ParseOptions::default(),
            namespaces: Box::new(UriNamespaceProvider),
            member_visitor: None,
            cancel: None,
        }
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    pub fn with_namespace_provider(mut self, provider: impl NamespaceProvider + 'static) -> Self {
        self.namespaces = Box::new(provider);
        self
    }

    pub fn with_member_visitor(mut self, visitor: impl MemberVisitor + 'static) -> Self {
        self.member_visitor = Some(Box::new(visitor));
        self
    }

    /// Emission stops before the next artifact once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Loads the entry documents and everything they include or import.
    pub fn load<R: ImportResolver + ?Sized>(
        &self,
        entries: &[impl AsRef<str>],
        resolver: &R,
    ) -> Result<SchemaSet, GenerateError> {
        Ok(SchemaSet::load(entries, resolver, self.parse_options)?)
    }

    pub fn build_graph(&self, set: &SchemaSet) -> Result<(TypeGraph, Vec<Diagnostic>), GenerateError> {
        let mut diagnostics = Diagnostics::default();
        let graph = graph::build(set, &self.config, self.namespaces.as_ref(), &mut diagnostics)?;
        Ok((graph, diagnostics.into_vec()))
    }

    /// Builds the graph and assigns identifiers.
    pub fn resolve(&self, set: &SchemaSet) -> Result<(ResolvedGraph, Vec<Diagnostic>), GenerateError> {
        let mut diagnostics = Diagnostics::default();
        let graph = graph::build(set, &self.config, self.namespaces.as_ref(), &mut diagnostics)?;
        let resolved = naming::resolve(
            graph,
            &self.config,
            self.member_visitor.as_deref(),
            &mut diagnostics,
        );
        Ok((resolved, diagnostics.into_vec()))
    }

    /// Runs the whole pipeline and writes the artifacts to `sink`. Write failures are part of
    /// the returned report, not an error.
    pub fn generate(
        &self,
        set: &SchemaSet,
        sink: &mut dyn OutputSink,
    ) -> Result<Generated, GenerateError> {
        let (resolved, diagnostics) = self.resolve(set)?;
        let artifacts = emit::plan(&resolved, self.config.artifact_grouping);
        let report = emit::emit(
            &resolved,
            &artifacts,
            sink,
            &self.config,
            self.cancel.as_deref(),
        );
        Ok(Generated {
            report,
            diagnostics,
        })
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}
