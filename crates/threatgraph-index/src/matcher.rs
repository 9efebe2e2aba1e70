//! Query-to-technique matching over a loaded index.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use threatgraph_core::config::MatchConfig;
use threatgraph_core::error::{EmbeddingError, IndexError};
use threatgraph_core::similarity::{dot_product, l2_norm, normalize};
use threatgraph_core::types::{ConfidenceTier, MatchQuery, TechniqueMatch};
use threatgraph_core::Result;

use threatgraph_embeddings::TextEmbedder;

use crate::types::TechniqueIndex;

/// Matches free-text queries against an embedding index.
///
/// The index is immutable after construction, so any number of matchers
/// (and concurrent calls on one matcher) may share it via `Arc` without
/// locking. Construction validates that the embedder is the one that
/// built the index; searching vectors from a different provider is
/// undefined and rejected up front.
pub struct TechniqueMatcher {
    index: Arc<TechniqueIndex>,
    embedder: Arc<dyn TextEmbedder>,
    config: MatchConfig,
}

impl TechniqueMatcher {
    /// Create a matcher over a loaded index.
    ///
    /// # Errors
    ///
    /// - [`IndexError::ProviderMismatch`] if the embedder's identity does
    ///   not match the index's recorded provider
    /// - [`EmbeddingError::DimensionMismatch`] if dimensionalities differ
    pub fn new(
        index: Arc<TechniqueIndex>,
        embedder: Arc<dyn TextEmbedder>,
        config: MatchConfig,
    ) -> Result<Self> {
        config.validate()?;
        if embedder.id() != index.embedding_model {
            return Err(IndexError::ProviderMismatch {
                expected: embedder.id().to_string(),
                actual: index.embedding_model.clone(),
            }
            .into());
        }
        if embedder.dimension() != index.embedding_dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: index.embedding_dim,
                actual: embedder.dimension(),
            }
            .into());
        }
        index.validate_dimensions()?;
        Ok(Self {
            index,
            embedder,
            config,
        })
    }

    /// The index this matcher searches.
    pub fn index(&self) -> &TechniqueIndex {
        &self.index
    }

    /// Match a batch of queries, preserving input order.
    ///
    /// Queries are processed independently: a provider failure or timeout
    /// on one query yields an `Err` in that slot and leaves every other
    /// slot intact. Partial success is expected and acceptable.
    pub async fn match_batch(
        &self,
        queries: &[MatchQuery],
        top_k: usize,
        min_similarity: f32,
    ) -> Vec<Result<Vec<TechniqueMatch>>> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            let result = self.match_query(query, top_k, min_similarity).await;
            if let Err(e) = &result {
                warn!(query = %query.text, error = %e, "query failed; continuing batch");
            }
            results.push(result);
        }
        results
    }

    /// Match a single query against every indexed technique.
    ///
    /// Exhaustive O(N·D) scan: the catalog is small, and an ANN structure
    /// would have to be re-validated against the similarity floor before
    /// it could replace this. A query where nothing clears the floor
    /// returns an empty list, not an error.
    pub async fn match_query(
        &self,
        query: &MatchQuery,
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<TechniqueMatch>> {
        let query_vector = self.embed_query(&query.text).await?;

        let mut candidates: Vec<(usize, f32, f32)> = Vec::new();
        for (pos, entry) in self.index.entries.iter().enumerate() {
            let raw = dot_product(&query_vector, &entry.vector)?.clamp(-1.0, 1.0);
            let adjusted = self.adjusted_score(raw, query.context.as_deref(), &entry.tactics);
            if adjusted < min_similarity {
                continue;
            }
            candidates.push((pos, raw, adjusted));
        }

        // Adjusted score descending; equal scores break deterministically
        // by ascending technique identifier.
        candidates.sort_by(|a, b| {
            b.2.total_cmp(&a.2).then_with(|| {
                self.index.entries[a.0]
                    .technique_id
                    .cmp(&self.index.entries[b.0].technique_id)
            })
        });
        candidates.truncate(top_k);

        debug!(
            query = %query.text,
            survivors = candidates.len(),
            "query scored"
        );

        Ok(candidates
            .into_iter()
            .enumerate()
            .map(|(rank, (pos, raw, adjusted))| {
                let entry = &self.index.entries[pos];
                TechniqueMatch {
                    technique_id: entry.technique_id.clone(),
                    name: entry.name.clone(),
                    similarity: raw,
                    score: adjusted,
                    confidence: ConfidenceTier::from_score(adjusted),
                    rank,
                }
            })
            .collect())
    }

    /// Apply domain weighting: a bounded multiplicative boost when the
    /// query's context tag matches one of the candidate's tactic tags.
    ///
    /// The boost breaks near-ties between otherwise-similar candidates;
    /// the cap keeps it from inverting any gap larger than `boost - 1`.
    /// Only positive similarities are boosted, and the adjusted score is
    /// clamped so it can never exceed 1.0.
    fn adjusted_score(&self, raw: f32, context: Option<&str>, tactics: &[String]) -> f32 {
        match context {
            Some(tag) if raw > 0.0 && tactics.iter().any(|t| t.eq_ignore_ascii_case(tag)) => {
                (raw * self.config.domain_boost).min(1.0)
            }
            _ => raw,
        }
    }

    /// Embed and normalize a query with the index's provider.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput.into());
        }

        let mut vector = if self.config.embed_timeout_ms > 0 {
            let budget = Duration::from_millis(self.config.embed_timeout_ms);
            tokio::time::timeout(budget, self.embedder.embed(text))
                .await
                .map_err(|_| EmbeddingError::Timeout(self.config.embed_timeout_ms))??
        } else {
            self.embedder.embed(text).await?
        };

        if vector.len() != self.index.embedding_dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.index.embedding_dim,
                actual: vector.len(),
            }
            .into());
        }
        if l2_norm(&vector) < f32::EPSILON {
            return Err(EmbeddingError::ProviderFailure {
                provider: self.embedder.id().to_string(),
                reason: "zero-magnitude query embedding".to_string(),
            }
            .into());
        }
        normalize(&mut vector);
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndexEntry;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use threatgraph_core::error::ThreatGraphError;
    use threatgraph_embeddings::EmbeddingResult;

    /// Deterministic embedder returning canned vectors per exact text.
    struct StubEmbedder {
        id: String,
        dimension: usize,
        vectors: HashMap<String, Vec<f32>>,
    }

    impl StubEmbedder {
        fn new(dimension: usize, vectors: &[(&str, Vec<f32>)]) -> Self {
            Self {
                id: format!("stub:{dimension}"),
                dimension,
                vectors: vectors
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl TextEmbedder for StubEmbedder {
        fn id(&self) -> &str {
            &self.id
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
            if text == "fail" {
                return Err(EmbeddingError::ProviderFailure {
                    provider: self.id.clone(),
                    reason: "stubbed failure".to_string(),
                });
            }
            if text == "slow" {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok(self
                .vectors
                .get(text)
                .cloned()
                .unwrap_or_else(|| {
                    let mut v = vec![0.0; self.dimension];
                    v[self.dimension - 1] = 1.0;
                    v
                }))
        }
    }

    fn entry(id: &str, name: &str, tactics: &[&str], vector: Vec<f32>) -> IndexEntry {
        IndexEntry {
            technique_id: id.to_string(),
            name: name.to_string(),
            description: format!("{name} description"),
            tactics: tactics.iter().map(|t| t.to_string()).collect(),
            vector,
        }
    }

    fn index(entries: Vec<IndexEntry>) -> Arc<TechniqueIndex> {
        Arc::new(TechniqueIndex {
            embedding_model: "stub:4".to_string(),
            embedding_dim: 4,
            created_at: Utc::now(),
            source_version: "test".to_string(),
            entries,
        })
    }

    /// Three techniques along the first axis: sims 1.0, 0.6, 0.4 against
    /// the "probe" query, plus an orthogonal one.
    fn graded_index() -> Arc<TechniqueIndex> {
        index(vec![
            entry("T1190", "Exploit Public-Facing Application", &["initial-access"], vec![1.0, 0.0, 0.0, 0.0]),
            entry("T1059", "Command and Scripting Interpreter", &["execution"], vec![0.6, 0.8, 0.0, 0.0]),
            entry("T1566", "Phishing", &["initial-access"], vec![0.4, 0.916_515_1, 0.0, 0.0]),
            entry("T1486", "Data Encrypted for Impact", &["impact"], vec![0.0, 0.0, 1.0, 0.0]),
        ])
    }

    fn probe_stub() -> Arc<StubEmbedder> {
        Arc::new(StubEmbedder::new(
            4,
            &[("probe", vec![1.0, 0.0, 0.0, 0.0])],
        ))
    }

    fn matcher_with(index: Arc<TechniqueIndex>, embedder: Arc<StubEmbedder>) -> TechniqueMatcher {
        let config = MatchConfig {
            embed_timeout_ms: 0,
            ..MatchConfig::default()
        };
        TechniqueMatcher::new(index, embedder, config).unwrap()
    }

    #[tokio::test]
    async fn ranks_by_similarity_with_tiers() {
        let matcher = matcher_with(graded_index(), probe_stub());
        let query = MatchQuery::new("probe");
        let matches = matcher.match_query(&query, 10, 0.35).await.unwrap();

        let ids: Vec<&str> = matches.iter().map(|m| m.technique_id.as_str()).collect();
        assert_eq!(ids, vec!["T1190", "T1059", "T1566"]);
        assert_eq!(matches[0].confidence, ConfidenceTier::High);
        assert_eq!(matches[1].confidence, ConfidenceTier::Medium);
        assert_eq!(matches[2].confidence, ConfidenceTier::Low);
        assert_eq!(
            matches.iter().map(|m| m.rank).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        // Unweighted query: adjusted equals raw.
        for m in &matches {
            assert_eq!(m.score, m.similarity);
        }
    }

    #[tokio::test]
    async fn floor_filters_and_is_monotonic() {
        let matcher = matcher_with(graded_index(), probe_stub());
        let query = MatchQuery::new("probe");

        let loose = matcher.match_query(&query, 10, 0.3).await.unwrap();
        let tight = matcher.match_query(&query, 10, 0.5).await.unwrap();
        assert!(tight.len() <= loose.len());
        for m in &tight {
            assert!(
                loose.iter().any(|l| l.technique_id == m.technique_id),
                "{} missing from looser result",
                m.technique_id
            );
        }
        // 0.4-similarity candidate survives 0.3 but not 0.5.
        assert!(loose.iter().any(|m| m.technique_id == "T1566"));
        assert!(!tight.iter().any(|m| m.technique_id == "T1566"));
    }

    #[tokio::test]
    async fn nothing_above_floor_is_empty_not_error() {
        let embedder = Arc::new(StubEmbedder::new(
            4,
            &[("unrelated", vec![0.0, 0.0, 0.0, 1.0])],
        ));
        let matcher = matcher_with(graded_index(), embedder);
        let matches = matcher
            .match_query(&MatchQuery::new("unrelated"), 3, 0.35)
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn top_k_truncates_after_sort() {
        let matcher = matcher_with(graded_index(), probe_stub());
        let matches = matcher
            .match_query(&MatchQuery::new("probe"), 1, 0.35)
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].technique_id, "T1190");
    }

    #[tokio::test]
    async fn equal_scores_break_by_ascending_id() {
        let idx = index(vec![
            entry("T2000", "Later", &[], vec![1.0, 0.0, 0.0, 0.0]),
            entry("T1000", "Earlier", &[], vec![1.0, 0.0, 0.0, 0.0]),
        ]);
        let matcher = matcher_with(idx, probe_stub());
        let matches = matcher
            .match_query(&MatchQuery::new("probe"), 10, 0.35)
            .await
            .unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m.technique_id.as_str()).collect();
        assert_eq!(ids, vec!["T1000", "T2000"]);
    }

    #[tokio::test]
    async fn context_tag_boosts_matching_tactics_only() {
        // Two candidates 0.05 apart; the trailing one carries the queried
        // tactic, so a 1.15 boost flips the order: 0.60 * 1.15 = 0.69 > 0.62.
        let idx = index(vec![
            entry("T0001", "Untagged", &["execution"], vec![0.62, 0.784_601_8, 0.0, 0.0]),
            entry("T0002", "Tagged", &["initial-access"], vec![0.6, 0.8, 0.0, 0.0]),
        ]);
        let matcher = matcher_with(idx, probe_stub());

        let unweighted = matcher
            .match_query(&MatchQuery::new("probe"), 10, 0.1)
            .await
            .unwrap();
        assert_eq!(unweighted[0].technique_id, "T0001");

        let weighted = matcher
            .match_query(
                &MatchQuery::new("probe").with_context("Initial-Access"),
                10,
                0.1,
            )
            .await
            .unwrap();
        assert_eq!(weighted[0].technique_id, "T0002");
        assert!((weighted[0].score - 0.69).abs() < 1e-5);
        // Raw similarity is reported unmodified alongside the boost.
        assert!((weighted[0].similarity - 0.6).abs() < 1e-5);
        // The untagged candidate is untouched.
        let untagged = weighted.iter().find(|m| m.technique_id == "T0001").unwrap();
        assert_eq!(untagged.score, untagged.similarity);
    }

    #[tokio::test]
    async fn boosted_score_clamped_to_one() {
        let idx = index(vec![entry(
            "T0003",
            "Near Perfect",
            &["initial-access"],
            vec![1.0, 0.0, 0.0, 0.0],
        )]);
        let matcher = matcher_with(idx, probe_stub());
        let matches = matcher
            .match_query(
                &MatchQuery::new("probe").with_context("initial-access"),
                1,
                0.35,
            )
            .await
            .unwrap();
        assert!(matches[0].score <= 1.0);
        assert!((matches[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn boost_can_lift_a_candidate_over_the_floor() {
        // Raw 0.33 fails a 0.35 floor; boosted to 0.3795 it survives.
        let idx = index(vec![entry(
            "T0004",
            "Border",
            &["initial-access"],
            vec![0.33, 0.943_981_0, 0.0, 0.0],
        )]);
        let matcher = matcher_with(idx, probe_stub());

        let plain = matcher
            .match_query(&MatchQuery::new("probe"), 1, 0.35)
            .await
            .unwrap();
        assert!(plain.is_empty());

        let boosted = matcher
            .match_query(
                &MatchQuery::new("probe").with_context("initial-access"),
                1,
                0.35,
            )
            .await
            .unwrap();
        assert_eq!(boosted.len(), 1);
        assert_eq!(boosted[0].confidence, ConfidenceTier::Low);
    }

    #[tokio::test]
    async fn batch_isolates_per_query_failures() {
        let matcher = matcher_with(graded_index(), probe_stub());
        let queries = vec![
            MatchQuery::new("probe"),
            MatchQuery::new("fail"),
            MatchQuery::new("probe"),
        ];
        let results = matcher.match_batch(&queries, 3, 0.35).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ThreatGraphError::Embedding(
                EmbeddingError::ProviderFailure { .. }
            ))
        ));
        assert!(results[2].is_ok());
        assert_eq!(results[0].as_ref().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let config = MatchConfig {
            embed_timeout_ms: 20,
            ..MatchConfig::default()
        };
        let matcher =
            TechniqueMatcher::new(graded_index(), probe_stub(), config).unwrap();
        let result = matcher.match_query(&MatchQuery::new("slow"), 3, 0.35).await;
        assert!(matches!(
            result,
            Err(ThreatGraphError::Embedding(EmbeddingError::Timeout(20)))
        ));
    }

    #[tokio::test]
    async fn empty_query_text_rejected() {
        let matcher = matcher_with(graded_index(), probe_stub());
        let result = matcher.match_query(&MatchQuery::new("  "), 3, 0.35).await;
        assert!(matches!(
            result,
            Err(ThreatGraphError::Embedding(EmbeddingError::EmptyInput))
        ));
    }

    #[tokio::test]
    async fn mismatched_provider_rejected_at_construction() {
        let mut idx = (*graded_index()).clone();
        idx.embedding_model = "some-other-model:4".to_string();
        let result = TechniqueMatcher::new(
            Arc::new(idx),
            probe_stub(),
            MatchConfig::default(),
        );
        assert!(matches!(
            result,
            Err(ThreatGraphError::Index(IndexError::ProviderMismatch { .. }))
        ));
    }
}
