//! Qdrant-backed vector repository
//!
//! Stores every competency as one point in a single collection with two
//! named vector slots (dense + sparse) and the competency JSON as payload.
//! Point identifiers are UUID strings, minted by the indexing layer.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
    DeletePointsBuilder, Distance, FieldType, Filter, GetPointsBuilder, NamedVectors, PointId,
    PointStruct, PointsIdsList, SearchPointsBuilder, SetPayloadPointsBuilder, SparseIndices,
    SparseVectorParamsBuilder, SparseVectorsConfigBuilder, UpsertPointsBuilder, Vector,
    VectorParamsBuilder, VectorsConfigBuilder,
};
use qdrant_client::{Payload, Qdrant, QdrantError};
use tracing::{debug, info};

use skillscope_core::{Competency, DenseVector, Error, Identifier, Result, SparseVector};
use skillscope_config::{DistanceMetric, QdrantSettings};

use super::{ScoredId, VectorRepository, DENSE_VECTOR, SPARSE_VECTOR};

/// Payload fields carrying a keyword index for filtering.
const INDEXED_FIELDS: [&str; 4] = ["lang", "type", "provider", "code"];

fn storage_err(e: QdrantError) -> Error {
    Error::Storage(e.to_string())
}

fn search_err(e: QdrantError) -> Error {
    Error::Search(e.to_string())
}

/// Map a stored gRPC payload value back onto plain JSON.
fn value_to_json(value: qdrant_client::qdrant::Value) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind;

    match value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::from(i),
        Some(Kind::DoubleValue(d)) => {
            serde_json::Number::from_f64(d).map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(value_to_json).collect())
        }
        Some(Kind::StructValue(object)) => serde_json::Value::Object(
            object
                .fields
                .into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
    }
}

/// Vector repository backed by a Qdrant collection.
pub struct QdrantRepository {
    client: Qdrant,
    collection: String,
    dimension: u64,
    distance: Distance,
}

impl QdrantRepository {
    /// Connect to the Qdrant server and verify it responds.
    pub async fn connect(settings: &QdrantSettings) -> Result<Self> {
        info!("Connecting to Qdrant at {}", settings.url);

        let mut builder = Qdrant::from_url(&settings.url)
            .timeout(std::time::Duration::from_secs(settings.timeout_secs));

        if let Some(ref api_key) = settings.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| Error::Storage(format!("failed to build Qdrant client: {e}")))?;

        client.list_collections().await.map_err(storage_err)?;
        info!("Connected to Qdrant");

        let distance = match settings.distance {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Dot => Distance::Dot,
            DistanceMetric::Euclid => Distance::Euclid,
        };

        Ok(Self {
            client,
            collection: settings.collection.clone(),
            dimension: settings.vector_dimension,
            distance,
        })
    }

    /// Collection this repository reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Dense dimension the collection was created with.
    pub fn dimension(&self) -> u64 {
        self.dimension
    }

    fn parse_point_id(id: Option<&PointId>) -> Option<Identifier> {
        match id.and_then(|p| p.point_id_options.as_ref()) {
            Some(PointIdOptions::Uuid(s)) => uuid::Uuid::parse_str(s).ok(),
            _ => None,
        }
    }

    fn payload_to_competency(
        payload: HashMap<String, qdrant_client::qdrant::Value>,
    ) -> Result<Competency> {
        let map: serde_json::Map<String, serde_json::Value> = payload
            .into_iter()
            .map(|(k, v)| (k, value_to_json(v)))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| Error::Storage(format!("malformed payload in store: {e}")))
    }

    fn competency_to_payload(competency: &Competency) -> Result<Payload> {
        let json = serde_json::to_value(competency)
            .map_err(|e| Error::Storage(format!("failed to serialize payload: {e}")))?;
        Payload::try_from(json)
            .map_err(|e| Error::Storage(format!("payload is not a JSON object: {e}")))
    }
}

#[async_trait]
impl VectorRepository for QdrantRepository {
    async fn init(&self) -> Result<()> {
        if self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(storage_err)?
        {
            debug!("Collection '{}' already exists", self.collection);
            return Ok(());
        }

        info!(
            "Creating collection '{}' (dim={}, distance={:?})",
            self.collection, self.dimension, self.distance
        );

        let mut vectors = VectorsConfigBuilder::default();
        vectors.add_named_vector_params(
            DENSE_VECTOR,
            VectorParamsBuilder::new(self.dimension, self.distance),
        );

        let mut sparse_vectors = SparseVectorsConfigBuilder::default();
        sparse_vectors.add_named_vector_params(SPARSE_VECTOR, SparseVectorParamsBuilder::default());

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(vectors)
                    .sparse_vectors_config(sparse_vectors),
            )
            .await
            .map_err(storage_err)?;

        for field in INDEXED_FIELDS {
            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &self.collection,
                    field,
                    FieldType::Keyword,
                ))
                .await
                .map_err(storage_err)?;
        }

        info!("Collection '{}' created", self.collection);
        Ok(())
    }

    async fn upsert(
        &self,
        identifier: Identifier,
        dense: DenseVector,
        sparse: SparseVector,
        competency: &Competency,
    ) -> Result<()> {
        let payload = Self::competency_to_payload(competency)?;

        let vectors = NamedVectors::default()
            .add_vector(DENSE_VECTOR, Vector::new_dense(dense.0))
            .add_vector(
                SPARSE_VECTOR,
                Vector::new_sparse(sparse.indices, sparse.values),
            );

        let point = PointStruct::new(identifier.to_string(), vectors, payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await
            .map_err(storage_err)?;

        debug!(%identifier, "point upserted");
        Ok(())
    }

    async fn set_payload(&self, identifier: Identifier, competency: &Competency) -> Result<()> {
        let payload = Self::competency_to_payload(competency)?;

        self.client
            .overwrite_payload(
                SetPayloadPointsBuilder::new(&self.collection, payload)
                    .points_selector(PointsIdsList {
                        ids: vec![PointId::from(identifier.to_string())],
                    })
                    .wait(true),
            )
            .await
            .map_err(storage_err)?;

        debug!(%identifier, "payload replaced");
        Ok(())
    }

    async fn get(&self, identifier: Identifier) -> Result<Option<Competency>> {
        let mut found = self.get_batch(&[identifier]).await?;
        Ok(found.remove(&identifier))
    }

    async fn get_batch(
        &self,
        identifiers: &[Identifier],
    ) -> Result<HashMap<Identifier, Competency>> {
        if identifiers.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<PointId> = identifiers
            .iter()
            .map(|id| PointId::from(id.to_string()))
            .collect();

        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(&self.collection, ids)
                    .with_payload(true)
                    .with_vectors(false),
            )
            .await
            .map_err(storage_err)?;

        let mut found = HashMap::with_capacity(response.result.len());
        for point in response.result {
            let Some(identifier) = Self::parse_point_id(point.id.as_ref()) else {
                continue;
            };
            let competency = Self::payload_to_competency(point.payload)?;
            found.insert(identifier, competency);
        }
        Ok(found)
    }

    async fn delete(&self, identifier: Identifier) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(PointsIdsList {
                        ids: vec![PointId::from(identifier.to_string())],
                    })
                    .wait(true),
            )
            .await
            .map_err(storage_err)?;

        debug!(%identifier, "point deleted");
        Ok(())
    }

    async fn query_dense(
        &self,
        vector: DenseVector,
        limit: u64,
        filter: Option<Filter>,
    ) -> Result<Vec<ScoredId>> {
        let mut request = SearchPointsBuilder::new(&self.collection, vector.0, limit)
            .vector_name(DENSE_VECTOR)
            .with_payload(false);

        if let Some(f) = filter {
            request = request.filter(f);
        }

        let response = self.client.search_points(request).await.map_err(search_err)?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|p| {
                Self::parse_point_id(p.id.as_ref()).map(|identifier| ScoredId {
                    identifier,
                    score: p.score,
                })
            })
            .collect())
    }

    async fn query_sparse(
        &self,
        vector: SparseVector,
        limit: u64,
        filter: Option<Filter>,
    ) -> Result<Vec<ScoredId>> {
        let mut request = SearchPointsBuilder::new(&self.collection, vector.values, limit)
            .vector_name(SPARSE_VECTOR)
            .sparse_indices(SparseIndices {
                data: vector.indices,
            })
            .with_payload(false);

        if let Some(f) = filter {
            request = request.filter(f);
        }

        let response = self.client.search_points(request).await.map_err(search_err)?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|p| {
                Self::parse_point_id(p.id.as_ref()).map(|identifier| ScoredId {
                    identifier,
                    score: p.score,
                })
            })
            .collect())
    }
}
