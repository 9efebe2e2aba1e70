//! Attack-tree diagram document model and parser.
//!
//! The diagram syntax is Mermaid `graph TD`: node declarations
//! `ID["label"]`, edges `A --> B` (optionally with inline labels), and a
//! trailing style block of `classDef` / `class` lines. Documents arrive
//! either as bare Mermaid or wrapped in a markdown ```` ```mermaid ````
//! fence; the parser accepts both and keeps the original text verbatim so
//! rewrites can be byte-precise.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use threatgraph_core::error::DocumentError;

/// `ID["label"]` node declaration, also matched inline in edge lines.
pub(crate) static NODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)\["([^"]+)"\]"#).expect("valid node regex"));

/// Edge line: `A --> B`, with optional inline labels on either side.
static EDGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(\w+)(?:\["[^"]*"\])?\s*-->\s*(\w+)(?:\["[^"]*"\])?\s*$"#)
        .expect("valid edge regex")
});

/// `class B,C attack` style assignment.
static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*class\s+([\w,\s]+?)\s+(\w+)\s*$").expect("valid class regex"));

/// Markdown fence around the diagram body.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```mermaid\n(.*?)\n```").expect("valid fence regex"));

/// `%% context: cloud` directive inside the diagram body.
static CONTEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%%\s*context:\s*([A-Za-z0-9_-]+)").expect("valid context regex")
});

/// `**Cloud Provider**: aws` metadata line in the surrounding markdown.
static PROVIDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*Cloud Provider\*\*:\s*([A-Za-z0-9_-]+)").expect("valid provider regex")
});

/// One diagram node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramNode {
    /// Node identifier, unique within the document.
    pub id: String,
    /// Human-readable label text.
    pub label: String,
    /// Style class assigned in the trailing `class` block, if any.
    pub class: Option<String>,
}

/// One directed edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramEdge {
    /// Parent node id.
    pub from: String,
    /// Child node id.
    pub to: String,
}

/// A parsed attack-tree document.
///
/// Owns its parse exclusively for the duration of one enrichment call.
/// The original text is retained so enrichment can rewrite labels in
/// place and leave everything else byte-identical.
#[derive(Debug, Clone)]
pub struct DiagramDocument {
    source: String,
    /// Nodes in first-appearance order.
    pub nodes: Vec<DiagramNode>,
    /// Edges in document order.
    pub edges: Vec<DiagramEdge>,
    /// Domain context tag declared in the document, if any.
    pub context: Option<String>,
}

impl DiagramDocument {
    /// Parse a document from its source text.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::NoDiagram`] if neither a mermaid fence nor a
    ///   `graph` header is present
    /// - [`DocumentError::Syntax`] if the diagram body declares no nodes
    pub fn parse(source: &str) -> Result<Self, DocumentError> {
        let body = diagram_body(source)?;

        let mut order: Vec<String> = Vec::new();
        let mut labels: HashMap<String, String> = HashMap::new();
        let mut classes: HashMap<String, String> = HashMap::new();
        let mut edges: Vec<DiagramEdge> = Vec::new();

        for line in body.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty()
                || trimmed.starts_with("graph ")
                || trimmed.starts_with("classDef")
                || trimmed.starts_with("%%")
            {
                continue;
            }
            if let Some(caps) = CLASS_RE.captures(trimmed) {
                let class_name = caps[2].to_string();
                for id in caps[1].split(',') {
                    classes.insert(id.trim().to_string(), class_name.clone());
                }
                continue;
            }
            if let Some(caps) = EDGE_RE.captures(trimmed) {
                edges.push(DiagramEdge {
                    from: caps[1].to_string(),
                    to: caps[2].to_string(),
                });
            }
            for caps in NODE_RE.captures_iter(trimmed) {
                let id = caps[1].to_string();
                if !labels.contains_key(&id) {
                    order.push(id.clone());
                    labels.insert(id, caps[2].to_string());
                }
            }
        }

        if order.is_empty() {
            return Err(DocumentError::Syntax(
                "no node declarations found in diagram".to_string(),
            ));
        }

        let nodes = order
            .into_iter()
            .map(|id| {
                let label = labels.remove(&id).unwrap_or_default();
                let class = classes.get(&id).cloned();
                DiagramNode { id, label, class }
            })
            .collect();

        let context = CONTEXT_RE
            .captures(body)
            .or_else(|| PROVIDER_RE.captures(source))
            .map(|caps| caps[1].to_lowercase());

        Ok(Self {
            source: source.to_string(),
            nodes,
            edges,
            context,
        })
    }

    /// Original document text, verbatim.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Locate the diagram body: the fenced block when present, otherwise the
/// whole text when it carries a `graph` header.
fn diagram_body(source: &str) -> Result<&str, DocumentError> {
    if let Some(caps) = FENCE_RE.captures(source) {
        let body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if !body.lines().any(|l| l.trim().starts_with("graph ")) {
            return Err(DocumentError::Syntax(
                "fenced diagram has no graph header".to_string(),
            ));
        }
        return Ok(body);
    }
    if source.lines().any(|l| l.trim().starts_with("graph ")) {
        return Ok(source);
    }
    Err(DocumentError::NoDiagram)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = r#"graph TD
    A["Compromise web application"]
    B["Exploit public-facing API"]
    C["Steal session tokens"]
    A --> B
    B --> C

    classDef attack fill:#ffcccc
    classDef goal fill:#ffcc99
    class A goal
    class B,C attack"#;

    #[test]
    fn parses_raw_mermaid() {
        let doc = DiagramDocument::parse(RAW).unwrap();
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.edges.len(), 2);
        assert_eq!(doc.nodes[0].id, "A");
        assert_eq!(doc.nodes[0].label, "Compromise web application");
        assert_eq!(doc.nodes[0].class.as_deref(), Some("goal"));
        assert_eq!(doc.nodes[1].class.as_deref(), Some("attack"));
        assert_eq!(doc.edges[0], DiagramEdge {
            from: "A".to_string(),
            to: "B".to_string()
        });
        assert_eq!(doc.context, None);
    }

    #[test]
    fn parses_fenced_document() {
        let doc_text = format!("# Attack Tree: Web\n\n```mermaid\n{RAW}\n```\n\nTrailing prose.\n");
        let doc = DiagramDocument::parse(&doc_text).unwrap();
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.source(), doc_text);
    }

    #[test]
    fn inline_edge_labels_register_nodes() {
        let text = "graph TD\n    A[\"Root goal\"] --> B[\"Lateral move\"]\n";
        let doc = DiagramDocument::parse(text).unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.node("B").unwrap().label, "Lateral move");
        assert_eq!(doc.edges.len(), 1);
    }

    #[test]
    fn context_directive_in_body() {
        let text = "graph TD\n    %% context: cloud\n    A[\"Enumerate buckets\"]\n";
        let doc = DiagramDocument::parse(text).unwrap();
        assert_eq!(doc.context.as_deref(), Some("cloud"));
    }

    #[test]
    fn provider_metadata_in_surrounding_markdown() {
        let text = format!("**Cloud Provider**: AWS\n\n```mermaid\n{RAW}\n```\n");
        let doc = DiagramDocument::parse(&text).unwrap();
        assert_eq!(doc.context.as_deref(), Some("aws"));
    }

    #[test]
    fn prose_without_diagram_rejected() {
        let err = DiagramDocument::parse("just some notes\n").unwrap_err();
        assert!(matches!(err, DocumentError::NoDiagram));
    }

    #[test]
    fn diagram_without_nodes_rejected() {
        let err = DiagramDocument::parse("graph TD\n\n").unwrap_err();
        assert!(matches!(err, DocumentError::Syntax(_)));
    }

    #[test]
    fn duplicate_declarations_keep_first_label() {
        let text = "graph TD\n    A[\"First\"]\n    A[\"Second\"]\n";
        let doc = DiagramDocument::parse(text).unwrap();
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].label, "First");
    }
}
