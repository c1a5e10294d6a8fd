use super::SchemaDocument;

/// A retrieved document together with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: SchemaDocument,
    pub score: f32,
}

/// The schema documents retrieved for one question, in descending
/// similarity order. May be empty when the index holds nothing relevant.
#[derive(Debug, Clone, Default)]
pub struct RetrievedContext {
    entries: Vec<ScoredDocument>,
}

impl RetrievedContext {
    pub fn new(entries: Vec<ScoredDocument>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ScoredDocument] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rendered text of all retrieved documents, joined in retrieval
    /// order. Empty string when nothing was retrieved.
    pub fn concatenated_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.document.rendered_text())
            .collect::<Vec<_>>()
            .join("\n---\n")
    }

    /// Scores are non-increasing from the index; violations here would
    /// mean a broken adapter.
    pub fn is_ordered(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[0].score >= pair[1].score)
    }
}
