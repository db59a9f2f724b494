// Qdrant-backed vector store: one collection per corpus, cosine distance
use anyhow::{Context, Result};
use qdrant_client::{
    client::QdrantClient,
    qdrant::{
        vectors_config::Config, with_payload_selector::SelectorOptions, CreateCollection,
        Distance, PointStruct, SearchPoints, VectorParams, VectorsConfig, WithPayloadSelector,
        PointsSelector, PointsIdsList, Value as QdrantValue,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;

use crate::embedding::engine::EMBEDDING_DIM;
use crate::types::Corpus;

/// Qdrant point id derived deterministically from the chunk id, so
/// re-indexing the same chunk upserts instead of duplicating
pub fn point_id_for(chunk_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
}

/// Vector database handle
pub struct VectorDb {
    client: QdrantClient,
    url: String,
}

/// Search hit returned from a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Human-readable chunk id (e.g. `report.pdf-p3`), not the point UUID
    pub id: String,
    pub score: f32,
    pub text: String,
    pub metadata: HashMap<String, JsonValue>,
}

impl VectorDb {
    /// Connect and make sure the corpus collections exist
    pub async fn connect(url: &str) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .context("Failed to create Qdrant client")?;

        let db = Self {
            client,
            url: url.to_string(),
        };
        db.init_collections().await?;

        Ok(db)
    }

    async fn init_collections(&self) -> Result<()> {
        for corpus in Corpus::ALL {
            let exists = self.collection_exists(corpus).await?;
            if !exists {
                self.create_collection(corpus).await?;
            }
        }
        Ok(())
    }

    async fn collection_exists(&self, corpus: Corpus) -> Result<bool> {
        let collections = self.client.list_collections().await?;
        Ok(collections
            .collections
            .iter()
            .any(|c| c.name == corpus.as_str()))
    }

    async fn create_collection(&self, corpus: Corpus) -> Result<()> {
        self.client
            .create_collection(&CreateCollection {
                collection_name: corpus.as_str().to_string(),
                vectors_config: Some(VectorsConfig {
                    config: Some(Config::Params(VectorParams {
                        size: EMBEDDING_DIM as u64,
                        distance: Distance::Cosine.into(),
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await
            .context(format!("Failed to create collection: {}", corpus))?;
        Ok(())
    }

    /// Drop and recreate a corpus collection (clean-slate rebuild)
    pub async fn reset_collection(&self, corpus: Corpus) -> Result<()> {
        if self.collection_exists(corpus).await? {
            self.client
                .delete_collection(corpus.as_str())
                .await
                .context(format!("Failed to drop collection: {}", corpus))?;
        }
        self.create_collection(corpus).await
    }

    /// Upsert a batch of (chunk_id, text, embedding, metadata) into a corpus
    pub async fn add_batch(
        &self,
        corpus: Corpus,
        items: Vec<(String, String, Vec<f32>, HashMap<String, JsonValue>)>,
    ) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = items
            .into_iter()
            .map(|(chunk_id, text, embedding, metadata)| {
                let mut payload_map = HashMap::new();
                for (key, value) in metadata {
                    payload_map.insert(key, json_to_qdrant_value(value));
                }
                payload_map.insert("chunk_id".to_string(), QdrantValue::from(chunk_id.clone()));
                payload_map.insert("document".to_string(), QdrantValue::from(text));
                PointStruct::new(point_id_for(&chunk_id), embedding, payload_map)
            })
            .collect();

        self.client
            .upsert_points_blocking(corpus.as_str(), None, points, None)
            .await
            .context("Failed to batch upsert points")?;

        Ok(())
    }

    /// Query one corpus for the nearest chunks
    pub async fn query(
        &self,
        corpus: Corpus,
        query_embedding: &[f32],
        n_results: usize,
        threshold: f64,
    ) -> Result<Vec<SearchHit>> {
        let search_result = self
            .client
            .search_points(&SearchPoints {
                collection_name: corpus.as_str().to_string(),
                vector: query_embedding.to_vec(),
                limit: n_results as u64,
                with_payload: Some(WithPayloadSelector {
                    selector_options: Some(SelectorOptions::Enable(true)),
                }),
                score_threshold: Some(threshold as f32),
                ..Default::default()
            })
            .await
            .context("Failed to search points")?;

        let hits = search_result
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload;
                let text = payload
                    .get("document")
                    .and_then(qdrant_value_to_string)
                    .unwrap_or_default();
                let id = payload
                    .get("chunk_id")
                    .and_then(qdrant_value_to_string)
                    .unwrap_or_default();

                let mut metadata = HashMap::new();
                for (key, value) in payload {
                    if key != "document" && key != "chunk_id" {
                        if let Some(json_val) = qdrant_to_json_value(&value) {
                            metadata.insert(key, json_val);
                        }
                    }
                }

                SearchHit {
                    id,
                    score: point.score,
                    text,
                    metadata,
                }
            })
            .collect();

        Ok(hits)
    }

    /// Delete a chunk by its human-readable id
    pub async fn delete(&self, corpus: Corpus, chunk_id: &str) -> Result<()> {
        self.client
            .delete_points(
                corpus.as_str(),
                None,
                &PointsSelector {
                    points_selector_one_of: Some(
                        qdrant_client::qdrant::points_selector::PointsSelectorOneOf::Points(
                            PointsIdsList {
                                ids: vec![qdrant_client::qdrant::PointId::from(point_id_for(
                                    chunk_id,
                                ))],
                            },
                        ),
                    ),
                },
                None,
            )
            .await
            .context("Failed to delete point")?;

        Ok(())
    }

    /// Point count for a corpus collection
    pub async fn collection_stats(&self, corpus: Corpus) -> Result<u64> {
        let info = self
            .client
            .collection_info(corpus.as_str())
            .await
            .context("Failed to get collection info")?;

        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }

    /// Server URL this handle is connected to
    pub fn url(&self) -> &str {
        &self.url
    }
}

// Helper functions for payload type conversions
fn json_to_qdrant_value(json: JsonValue) -> QdrantValue {
    match json {
        JsonValue::String(s) => QdrantValue::from(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                QdrantValue::from(i)
            } else if let Some(f) = n.as_f64() {
                QdrantValue::from(f)
            } else {
                QdrantValue::from(0)
            }
        }
        JsonValue::Bool(b) => QdrantValue::from(b),
        _ => QdrantValue::from(""),
    }
}

fn qdrant_to_json_value(value: &QdrantValue) -> Option<JsonValue> {
    value.kind.as_ref().and_then(|kind| {
        use qdrant_client::qdrant::value::Kind;
        match kind {
            Kind::StringValue(s) => Some(JsonValue::String(s.clone())),
            Kind::IntegerValue(i) => Some(JsonValue::Number((*i).into())),
            Kind::DoubleValue(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
            Kind::BoolValue(b) => Some(JsonValue::Bool(*b)),
            _ => None,
        }
    })
}

fn qdrant_value_to_string(value: &QdrantValue) -> Option<String> {
    value.kind.as_ref().and_then(|kind| {
        use qdrant_client::qdrant::value::Kind;
        match kind {
            Kind::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_deterministic() {
        let a = point_id_for("report.pdf-p3");
        let b = point_id_for("report.pdf-p3");
        let c = point_id_for("report.pdf-p4");
        assert_eq!(a, b);
        assert_ne!(a, c);
        // valid UUID
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[tokio::test]
    #[ignore]  // Integration test - requires Qdrant
    async fn test_add_and_query() {
        let db = VectorDb::connect("http://127.0.0.1:6334").await.unwrap();
        db.reset_collection(Corpus::Docs).await.unwrap();

        let embedding = vec![0.1; EMBEDDING_DIM];
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), JsonValue::String("test.pdf".to_string()));

        db.add_batch(
            Corpus::Docs,
            vec![("test.pdf-p1".to_string(), "Test page".to_string(), embedding.clone(), metadata)],
        )
        .await
        .unwrap();

        let hits = db.query(Corpus::Docs, &embedding, 5, 0.5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "test.pdf-p1");
        assert_eq!(hits[0].text, "Test page");
    }

    #[tokio::test]
    #[ignore]  // Integration test - requires Qdrant
    async fn test_reset_collection_clears_points() {
        let db = VectorDb::connect("http://127.0.0.1:6334").await.unwrap();
        db.reset_collection(Corpus::Refs).await.unwrap();

        let embedding = vec![0.2; EMBEDDING_DIM];
        db.add_batch(
            Corpus::Refs,
            vec![("r.txt-c1".to_string(), "Ref".to_string(), embedding, HashMap::new())],
        )
        .await
        .unwrap();

        assert_eq!(db.collection_stats(Corpus::Refs).await.unwrap(), 1);
        db.reset_collection(Corpus::Refs).await.unwrap();
        assert_eq!(db.collection_stats(Corpus::Refs).await.unwrap(), 0);
    }
}
