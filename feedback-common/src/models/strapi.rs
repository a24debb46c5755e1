// File: feedback-common/src/models/strapi.rs
//
// Envelope types of the Strapi-style REST backend.
//   list   => { "data": [ { "id": 1, "attributes": { .. } } ], "meta": { "pagination": { .. } } }
//   single => { "data": { "id": 1, "attributes": { .. } }, "meta": {} }
//   write  => { "data": { ..fields.. } }

use serde::{Deserialize, Serialize};

use crate::traits::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity<T> {
    pub id: i64,
    pub attributes: T,
}

impl<T: Validate> Validate for Entity<T> {
    fn validate(&self) -> Result<(), String> {
        if self.id <= 0 {
            return Err(format!("invalid entity id {}", self.id));
        }
        self.attributes
            .validate()
            .map_err(|e| format!("entity {}: {e}", self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl<T: Validate> Validate for ApiResponse<T> {
    fn validate(&self) -> Result<(), String> {
        self.data.validate()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u64,
}

/// Body of every POST/PUT.
#[derive(Debug, Clone, Serialize)]
pub struct Payload<T> {
    pub data: T,
}

impl<T> Payload<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// A relation field. Strapi returns either a bare id or a populated
/// `{ "data": { "id": .. } }` object (with `data: null` for an empty relation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Relation {
    Id(i64),
    Nested { data: Option<RelationData> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationData {
    pub id: i64,
}

impl Relation {
    pub fn id(&self) -> Option<i64> {
        match self {
            Relation::Id(id) => Some(*id),
            Relation::Nested { data } => data.as_ref().map(|d| d.id),
        }
    }
}

impl From<i64> for Relation {
    fn from(id: i64) -> Self {
        Relation::Id(id)
    }
}
