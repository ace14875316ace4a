//! Core data types and result aggregation for the scanning pipeline.
//!
//! This module defines the fundamental data structures used throughout comicscript:
//! - Per-page recognition results (`PageScript`)
//! - The aggregated result mapping (`ScriptSet`) and its merge operation
//! - The scan outcome with optional collected failures (`ScanOutcome`)
//! - The failure handling policy (`FailurePolicy`)

use std::collections::BTreeMap;

/// The ordered sequence of text lines recognized on one page.
/// Insertion order is recognition order (top-to-bottom reading order)
/// and is preserved end-to-end.
pub type PageScript = Vec<String>;

/// Mapping from a logical source identifier to the script recognized there.
///
/// Keys are either real filesystem paths or `archivePath/pageName`
/// composites for pages that came out of an archive. A `BTreeMap` keeps
/// iteration deterministic when the set is flushed to a sink; key order
/// carries no meaning beyond that.
pub type ScriptSet = BTreeMap<String, PageScript>;

/// How the scanner reacts to a failing page or archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailurePolicy {
    /// Abort the whole scan on the first failure anywhere in the tree.
    /// Workspaces are still cleaned up on the way out.
    #[default]
    FailFast,
    /// Record each failure in [`ScanOutcome::failures`] and keep scanning.
    CollectAndContinue,
}

/// A single recorded failure under [`FailurePolicy::CollectAndContinue`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageFailure {
    /// Logical source identifier of the page or archive that failed.
    pub source: String,
    /// Human-readable failure reason, as rendered by the underlying error.
    pub reason: String,
}

/// The result of one top-level scan call: recognized scripts plus any
/// failures collected along the way.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanOutcome {
    /// Recognized scripts keyed by logical source identifier.
    pub scripts: ScriptSet,
    /// Failures recorded under `CollectAndContinue`; always empty under
    /// `FailFast`, which surfaces the first failure as an `Err` instead.
    pub failures: Vec<PageFailure>,
}

impl ScanOutcome {
    /// Merges a nested outcome into this one without rewriting keys.
    pub fn absorb(&mut self, other: ScanOutcome) {
        merge_scripts(&mut self.scripts, other.scripts, |key| key.to_string());
        self.failures.extend(other.failures);
    }

    /// Merges a nested outcome, rewriting every key (script and failure
    /// source alike) through `rewrite` first.
    pub fn absorb_rewritten<F>(&mut self, other: ScanOutcome, rewrite: F)
    where
        F: Fn(&str) -> String,
    {
        merge_scripts(&mut self.scripts, other.scripts, &rewrite);
        self.failures.extend(other.failures.into_iter().map(|f| PageFailure {
            source: rewrite(&f.source),
            reason: f.reason,
        }));
    }
}

/// Merges `from` into `into`, passing every key through `rewrite`.
///
/// Later writes silently overwrite earlier ones for the same rewritten key.
pub fn merge_scripts<F>(into: &mut ScriptSet, from: ScriptSet, rewrite: F)
where
    F: Fn(&str) -> String,
{
    for (key, script) in from {
        into.insert(rewrite(&key), script);
    }
}
