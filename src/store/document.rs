use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::path::{CollectionPath, DocumentPath};
use super::value::Value;

pub type Fields = BTreeMap<String, Value>;

/// A committed document as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub fields: Fields,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl Document {
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// A single field write: either a concrete value or a timestamp the store
/// fills in at commit time.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    Set(Value),
    ServerTimestamp,
}

/// Field writes for create and update calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteFields(BTreeMap<String, FieldWrite>);

impl WriteFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), FieldWrite::Set(value.into()));
        self
    }

    pub fn server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.0.insert(field.into(), FieldWrite::ServerTimestamp);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldWrite> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn resolve(self, commit_time: DateTime<Utc>) -> Fields {
        self.0
            .into_iter()
            .map(|(field, write)| {
                let value = match write {
                    FieldWrite::Set(value) => value,
                    FieldWrite::ServerTimestamp => Value::Timestamp(commit_time),
                };
                (field, value)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A query over one collection.
///
/// With an `order_by` clause, documents lacking the field are excluded and
/// ties are broken by document id in the same direction. Without one,
/// documents come back in id order.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: CollectionPath,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    pub fn collection(collection: CollectionPath) -> Self {
        Self {
            collection,
            order_by: None,
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub(crate) fn run<'a>(&self, documents: impl Iterator<Item = &'a Document>) -> Vec<Document> {
        let Some((field, direction)) = &self.order_by else {
            let mut all: Vec<Document> = documents.cloned().collect();
            all.sort_by(|a, b| a.id().cmp(b.id()));
            return all;
        };

        let mut matching: Vec<Document> = documents
            .filter(|doc| doc.fields.contains_key(field))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            let ordering = match (a.get(field), b.get(field)) {
                (Some(x), Some(y)) => x.query_cmp(y),
                _ => Ordering::Equal,
            }
            .then_with(|| a.id().cmp(b.id()));
            match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
        matching
    }
}

/// Query results at one point in the store's history.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub documents: Vec<Document>,
    /// Store commit counter at the time the snapshot was taken.
    pub version: u64,
    /// Commit time of the latest write the snapshot reflects.
    pub read_time: DateTime<Utc>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}
