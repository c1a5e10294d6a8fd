use pgvector::Vector;
use serde::{Deserialize, Serialize};

use super::SchemaDocument;

/// A schema document paired with the embedding of its rendered text.
/// All records produced by one ingestion run share one dimensionality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    document: SchemaDocument,
    vector: Vector,
}

impl EmbeddingRecord {
    pub fn new(document: SchemaDocument, vector: Vector) -> Self {
        Self { document, vector }
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn document_id(&self) -> String {
        self.document.qualified_name()
    }

    pub fn vector(&self) -> &Vector {
        &self.vector
    }

    pub fn dimension(&self) -> usize {
        self.vector.as_slice().len()
    }

    pub fn cosine_similarity(&self, query: &Vector) -> Result<f32, String> {
        cosine_similarity(self.vector.as_slice(), query.as_slice())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, String> {
    if a.len() != b.len() {
        return Err(format!(
            "Vector dimensions do not match: {} vs {}",
            a.len(),
            b.len()
        ));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err("Cannot calculate similarity with zero vector".to_string());
    }

    Ok(dot_product / (norm_a * norm_b))
}
