//! Component resolution pipeline.
//!
//! Resolution runs as ordered passes over immutable inputs:
//!
//! 1. **Extraction** ([`extract`]) turns raw declarations into component
//!    and module descriptors.
//! 2. **Resolution** ([`resolver`]) walks entry points and synthesizes
//!    ([`synthesize`]) one binding per reachable key, falling back to
//!    implicit constructor bindings ([`implicit`]).
//! 3. **Validation** ([`validation`]) checks scopes, nullability, and graph
//!    integrity over the finished tree.
//!
//! Passes never short-circuit; findings accumulate and every finding is
//! reported to the caller's [`DiagnosticSink`]. The result is fatal only
//! when at least one finding is an error, and even then the partial graph
//! rides along in the failure for tooling that wants it.

pub mod binding;
pub mod declarations;
pub mod extract;
pub mod graph;
pub mod implicit;
pub mod requests;
pub mod resolver;
pub mod synthesize;
pub mod validation;

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use weaver_model::decl::{ComponentDecl, DeclarationSet};
use weaver_model::diagnostics::DiagnosticSink;
use weaver_model::error::ResolveError;
use weaver_model::foundation::TypePath;
use weaver_model::options::CompilerOptions;

pub use binding::{Binding, BindingKind, MapContribution, SetContribution};
pub use declarations::BindingDeclaration;
pub use extract::{extract_component, ComponentDescriptor, EntryPointRequest, ModuleDescriptor};
pub use graph::{BindingGraph, Edge};
pub use implicit::{ImplicitBindingCache, ImplicitRegistry, ImplicitResolution};
pub use requests::build_request;
pub use synthesize::{Synthesis, Synthesizer};
pub use validation::validate_graph;

/// A component whose graph contains at least one error-severity finding.
///
/// Carries every finding (all severities) and the partial graph, so callers
/// that want a best-effort result despite errors still get one.
#[derive(Debug, Error)]
#[error("component {component} failed to resolve with {} error(s)",
    errors.iter().filter(|e| e.is_error()).count())]
pub struct ResolutionFailure {
    pub component: TypePath,
    pub errors: Vec<ResolveError>,
    pub partial: BindingGraph,
}

/// Counters exposed for callers that assert on resolver behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionStats {
    /// Number of binding syntheses performed; memoized re-requests of an
    /// already-resolved key do not count.
    pub synthesis_calls: usize,
}

/// Resolves one component into its binding graph.
///
/// Every finding, fatal or not, is reported to `sink`. The implicit-binding
/// `cache` may be shared across calls (and across threads) to avoid
/// re-deriving constructor bindings per component.
pub fn resolve(
    component: &ComponentDecl,
    decls: &DeclarationSet,
    options: &CompilerOptions,
    cache: &ImplicitBindingCache,
    sink: &dyn DiagnosticSink,
) -> Result<BindingGraph, ResolutionFailure> {
    resolve_with_stats(component, decls, options, cache, sink).0
}

/// Like [`resolve`], additionally returning resolution counters.
pub fn resolve_with_stats(
    component: &ComponentDecl,
    decls: &DeclarationSet,
    options: &CompilerOptions,
    cache: &ImplicitBindingCache,
    sink: &dyn DiagnosticSink,
) -> (Result<BindingGraph, ResolutionFailure>, ResolutionStats) {
    let (descriptor, mut findings) = extract::extract_component(component, decls, options);

    let synthesizer = Synthesizer::new(decls, options, cache);
    let (graph, resolution_findings) = resolver::resolve_descriptor(&descriptor, &synthesizer);
    findings.extend(resolution_findings);
    findings.extend(validation::validate_graph(&graph, &descriptor, options));

    for finding in &findings {
        sink.report(finding);
    }
    let stats = ResolutionStats {
        synthesis_calls: synthesizer.synthesis_calls(),
    };
    let error_count = findings.iter().filter(|f| f.is_error()).count();
    debug!(
        component = %component.ty,
        nodes = graph.total_nodes(),
        findings = findings.len(),
        errors = error_count,
        "resolved component"
    );

    if error_count > 0 {
        (
            Err(ResolutionFailure {
                component: component.ty.clone(),
                errors: findings,
                partial: graph,
            }),
            stats,
        )
    } else {
        (Ok(graph), stats)
    }
}

/// Resolves a batch of root components in parallel.
///
/// Results keep the input order. The shared cache makes implicit bindings
/// derived for one component reusable by the others.
pub fn resolve_batch(
    components: &[ComponentDecl],
    decls: &DeclarationSet,
    options: &CompilerOptions,
    cache: &ImplicitBindingCache,
    sink: &dyn DiagnosticSink,
) -> Vec<Result<BindingGraph, ResolutionFailure>> {
    components
        .par_iter()
        .map(|component| resolve(component, decls, options, cache, sink))
        .collect()
}
