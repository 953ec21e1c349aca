//! Partitions a [`ResolvedGraph`] into artifacts and writes them to an [`OutputSink`].

mod rust;
mod sink;

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use check_keyword::CheckKeyword;
use heck::ToSnakeCase;
use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use syn::parse_quote;

use crate::{
    config::{ArtifactGrouping, GeneratorConfig},
    error::EmissionWriteError,
    graph::TypeRef,
    naming::{legalize, ResolvedGraph},
};

pub use sink::{DryRunSink, FileSink, MemorySink, OutputSink};

lazy_static! {
    static ref ILLEGAL_PATH_CHARACTERS: Regex = Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#)
        .unwrap_or_else(|error| unreachable!("static pattern: {error}"));
}

/// Replaces characters that are illegal in file and directory names with `_`.
///
/// Applying it again to its own output changes nothing.
pub fn sanitize_path_component(component: &str) -> String {
    ILLEGAL_PATH_CHARACTERS
        .replace_all(component, "_")
        .into_owned()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactContent {
    /// Every type of a namespace in one file.
    Namespace,
    /// A single type, in its namespace's directory.
    Type,
    /// The `mod.rs` of a namespace directory, declaring the per-type files as modules given
    /// as `(file name, module name)`.
    ModuleIndex(Vec<(String, String)>),
}

/// One file to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputArtifact {
    /// Target namespace the artifact belongs to.
    pub namespace: String,
    /// Path relative to the output root.
    pub path: PathBuf,
    pub types: Vec<TypeRef>,
    pub content: ArtifactContent,
}

/// Outcome of an emission. Failed writes do not stop the remaining artifacts.
#[derive(Debug, Default)]
pub struct EmissionReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<EmissionWriteError>,
    /// Emission stopped between two artifacts because cancellation was requested.
    pub cancelled: bool,
}

impl EmissionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// File stem of a per-type artifact, unique within its directory regardless of case. The
/// stem `mod` is reserved for the module index.
fn file_stem(type_name: &str, taken: &mut HashSet<String>) -> String {
    let base = sanitize_path_component(type_name.trim_start_matches("r#"));
    let mut stem = base.clone();
    let mut counter = 2;
    while !taken.insert(stem.to_lowercase()) {
        stem = format!("{base}{counter}");
        counter += 1;
    }
    stem
}

/// Module name under which a per-type file is declared in its namespace's `mod.rs`.
fn type_module(type_name: &str, taken: &mut HashSet<String>) -> String {
    let base = legalize(&type_name.trim_start_matches("r#").to_snake_case(), "module");
    let base = if base.is_keyword() {
        format!("{base}_")
    } else {
        base
    };
    let mut module = base.clone();
    let mut counter = 2;
    while !taken.insert(module.clone()) {
        module = format!("{base}{counter}");
        counter += 1;
    }
    module
}

/// Partitions the emitted types into artifacts, in namespace and arena order.
pub fn plan(resolved: &ResolvedGraph, grouping: ArtifactGrouping) -> Vec<OutputArtifact> {
    let graph = resolved.graph();
    let mut artifacts = Vec::new();
    for namespace in resolved.namespaces() {
        let types = resolved
            .emitted()
            .iter()
            .copied()
            .filter(|ref_| graph.get(*ref_).namespace == namespace)
            .collect::<Vec<_>>();
        let directory = sanitize_path_component(resolved.module_name(namespace).trim_start_matches("r#"));

        match grouping {
            ArtifactGrouping::SingleFile => artifacts.push(OutputArtifact {
                namespace: namespace.to_string(),
                path: PathBuf::from(format!("{directory}.rs")),
                types,
                content: ArtifactContent::Namespace,
            }),
            ArtifactGrouping::PerType => {
                let mut modules = Vec::new();
                let mut taken = HashSet::new();
                let mut stems = HashSet::from(["mod".to_string()]);
                for ref_ in &types {
                    let type_name = resolved.type_name(*ref_);
                    let file = format!("{}.rs", file_stem(type_name, &mut stems));
                    modules.push((file.clone(), type_module(type_name, &mut taken)));
                    artifacts.push(OutputArtifact {
                        namespace: namespace.to_string(),
                        path: Path::new(&directory).join(file),
                        types: vec![*ref_],
                        content: ArtifactContent::Type,
                    });
                }
                artifacts.push(OutputArtifact {
                    namespace: namespace.to_string(),
                    path: Path::new(&directory).join("mod.rs"),
                    types,
                    content: ArtifactContent::ModuleIndex(modules),
                });
            }
        }
    }
    artifacts
}

/// Renders the source text of one artifact.
pub fn render(resolved: &ResolvedGraph, artifact: &OutputArtifact) -> String {
    let items = match &artifact.content {
        ArtifactContent::Namespace => {
            let location = rust::Location {
                namespace: &artifact.namespace,
                depth: 1,
            };
            artifact
                .types
                .iter()
                .flat_map(|ref_| rust::type_items(resolved, *ref_, location))
                .collect()
        }
        ArtifactContent::Type => {
            let location = rust::Location {
                namespace: &artifact.namespace,
                depth: 2,
            };
            let mut items = vec![parse_quote!(
                use super::*;
            )];
            items.extend(
                artifact
                    .types
                    .iter()
                    .flat_map(|ref_| rust::type_items(resolved, *ref_, location)),
            );
            items
        }
        ArtifactContent::ModuleIndex(modules) => rust::module_index_items(modules),
    };
    rust::render_file(items)
}

/// Renders all artifacts in parallel, then writes them through `sink` one by one in plan
/// order. `cancel` is checked before every write.
pub fn emit(
    resolved: &ResolvedGraph,
    artifacts: &[OutputArtifact],
    sink: &mut dyn OutputSink,
    config: &GeneratorConfig,
    cancel: Option<&AtomicBool>,
) -> EmissionReport {
    let mut report = EmissionReport::default();

    let rendered = artifacts
        .par_iter()
        .map(|artifact| render(resolved, artifact))
        .collect::<Vec<_>>();

    if config.create_destination_if_missing {
        let mut directories = vec![PathBuf::new()];
        for artifact in artifacts {
            if let Some(parent) = artifact.path.parent() {
                if !directories.iter().any(|d| d == parent) {
                    directories.push(parent.to_path_buf());
                }
            }
        }
        for directory in directories {
            if let Err(source) = sink.create_dir(&directory) {
                tracing::warn!(path = %directory.display(), %source, "failed to create directory");
                report.failures.push(EmissionWriteError {
                    path: directory,
                    source,
                });
            }
        }
    }

    for (artifact, text) in artifacts.iter().zip(rendered) {
        if cancel.is_some_and(|cancel| cancel.load(Ordering::Relaxed)) {
            tracing::info!("emission cancelled");
            report.cancelled = true;
            break;
        }
        match sink.write(&artifact.path, &text) {
            Ok(()) => report.written.push(artifact.path.clone()),
            Err(source) => {
                tracing::warn!(path = %artifact.path.display(), %source, "failed to write artifact");
                report.failures.push(EmissionWriteError {
                    path: artifact.path.clone(),
                    source,
                });
            }
        }
    }

    tracing::info!(
        written = report.written.len(),
        failed = report.failures.len(),
        "emission finished"
    );
    report
}
