//! Idempotent, structure-preserving tree enrichment.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, info, warn};

use threatgraph_core::error::DocumentError;
use threatgraph_core::types::{MatchQuery, TechniqueMatch};
use threatgraph_core::{Result, ThreatGraphError};
use threatgraph_index::TechniqueMatcher;

use crate::document::{DiagramDocument, NODE_RE};

/// A label that already carries a technique prefix, e.g. `[T1190] ...`.
///
/// Doubles as the idempotence guard: prefixed nodes are never re-queried
/// and never re-prefixed.
static PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[T\d{4}(?:\.\d{3})?\]\s").expect("valid prefix regex"));

/// Outcome of a directory-wide enrichment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnrichStats {
    /// Documents enriched and written.
    pub enriched: usize,
    /// Documents skipped because they failed to parse or read.
    pub skipped: usize,
}

/// Enriches attack-tree documents with matched technique identifiers.
///
/// Each node label is used as a match query (`top_k = 1`); when the best
/// match clears the similarity floor the label is rewritten to
/// `[<technique-id>] <original label>`, keeping the original text verbatim
/// and contiguous. Nodes below the floor are left completely untouched;
/// no match is a normal outcome, never an error.
pub struct TreeEnricher<'a> {
    matcher: &'a TechniqueMatcher,
    min_similarity: f32,
}

impl<'a> TreeEnricher<'a> {
    /// Create an enricher over a ready matcher.
    pub fn new(matcher: &'a TechniqueMatcher, min_similarity: f32) -> Self {
        Self {
            matcher,
            min_similarity,
        }
    }

    /// Enrich one document's text.
    ///
    /// Returns the input byte-identical when nothing matches. Per-label
    /// matcher failures are logged and leave that label unmodified; they
    /// never abort the document.
    pub async fn enrich_content(&self, content: &str) -> Result<String> {
        let doc = DiagramDocument::parse(content)?;

        // Deduplicated unprefixed labels, first-appearance order.
        let mut labels: Vec<String> = Vec::new();
        for node in &doc.nodes {
            if PREFIX_RE.is_match(&node.label) {
                debug!(node = %node.id, "label already enriched; skipping");
                continue;
            }
            if !labels.iter().any(|l| l == &node.label) {
                labels.push(node.label.clone());
            }
        }
        if labels.is_empty() {
            return Ok(content.to_string());
        }

        let queries: Vec<MatchQuery> = labels
            .iter()
            .map(|label| {
                let query = MatchQuery::new(label.clone());
                match &doc.context {
                    Some(ctx) => query.with_context(ctx.clone()),
                    None => query,
                }
            })
            .collect();

        let results = self.matcher.match_batch(&queries, 1, self.min_similarity).await;

        let mut assignments: HashMap<String, TechniqueMatch> = HashMap::new();
        let mut ordered: Vec<String> = Vec::new();
        for (label, result) in labels.iter().zip(results) {
            match result {
                Ok(mut matches) if !matches.is_empty() => {
                    ordered.push(label.clone());
                    assignments.insert(label.clone(), matches.remove(0));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(label = %label, error = %e, "label match failed; leaving node unmodified");
                }
            }
        }
        if assignments.is_empty() {
            return Ok(content.to_string());
        }

        // Targeted label surgery: only node declarations whose label got an
        // assignment change; every other byte passes through untouched.
        let rewritten = NODE_RE.replace_all(content, |caps: &Captures| {
            let (id, label) = (&caps[1], &caps[2]);
            match assignments.get(label) {
                Some(m) => format!("{id}[\"[{}] {label}\"]", m.technique_id),
                None => caps[0].to_string(),
            }
        });

        let mut enriched = rewritten.into_owned();
        enriched.push_str(&mapping_table(&ordered, &assignments));

        info!(
            nodes = doc.nodes.len(),
            mapped = assignments.len(),
            "document enriched"
        );
        Ok(enriched)
    }

    /// Enrich a single file.
    pub async fn enrich_file(&self, input: &Path, output: &Path) -> Result<()> {
        let content = std::fs::read_to_string(input).map_err(|source| DocumentError::Io {
            path: input.display().to_string(),
            source,
        })?;
        let enriched = self.enrich_content(&content).await?;
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|source| DocumentError::Io {
                path: output.display().to_string(),
                source,
            })?;
        }
        std::fs::write(output, enriched).map_err(|source| DocumentError::Io {
            path: output.display().to_string(),
            source,
        })?;
        info!(input = %input.display(), output = %output.display(), "enriched file written");
        Ok(())
    }

    /// Enrich every `.md` document in a directory.
    ///
    /// A document that fails to read or parse is logged and skipped; the
    /// run continues with the remainder. Output files are written to
    /// `output_dir` as `enriched_<name>`.
    pub async fn enrich_dir(&self, input_dir: &Path, output_dir: &Path) -> Result<EnrichStats> {
        let mut paths: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|source| DocumentError::Io {
                path: input_dir.display().to_string(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
            .collect();
        paths.sort();

        let mut stats = EnrichStats {
            enriched: 0,
            skipped: 0,
        };
        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let output = output_dir.join(format!("enriched_{name}"));
            match self.enrich_file(&path, &output).await {
                Ok(()) => stats.enriched += 1,
                Err(ThreatGraphError::Document(e)) => {
                    warn!(path = %path.display(), error = %e, "skipping document");
                    stats.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        info!(
            enriched = stats.enriched,
            skipped = stats.skipped,
            "directory enrichment complete"
        );
        Ok(stats)
    }
}

/// Markdown summary table for freshly mapped labels.
fn mapping_table(ordered: &[String], assignments: &HashMap<String, TechniqueMatch>) -> String {
    let mut table = String::from(
        "\n## Technique Mappings\n\n\
         | Attack Step | Technique | Name | Confidence | Score |\n\
         |-------------|-----------|------|------------|-------|\n",
    );
    for label in ordered {
        if let Some(m) = assignments.get(label) {
            table.push_str(&format!(
                "| {} | {} | {} | {} | {:.3} |\n",
                label, m.technique_id, m.name, m.confidence, m.score
            ));
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_guard_recognizes_technique_prefixes() {
        assert!(PREFIX_RE.is_match("[T1190] Exploit public-facing API"));
        assert!(PREFIX_RE.is_match("[T1566.002] Send a spearphishing link"));
        assert!(!PREFIX_RE.is_match("Exploit public-facing API"));
        assert!(!PREFIX_RE.is_match("[T119] too short"));
        assert!(!PREFIX_RE.is_match("[X1190] wrong family"));
    }
}
