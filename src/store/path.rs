use std::fmt;

use super::error::StoreError;

/// Slash-separated path to a collection, e.g. `users/u1/orders`.
///
/// Collection paths always have an odd number of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

/// Path to a single document inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

fn validate_segment(segment: &str, path: &str) -> Result<(), StoreError> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains('/') {
        return Err(StoreError::InvalidPath(format!("bad segment {segment:?} in {path:?}")));
    }
    Ok(())
}

impl CollectionPath {
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let segments: Vec<&str> = path.split('/').collect();
        for segment in &segments {
            validate_segment(segment, path)?;
        }
        if segments.len() % 2 == 0 {
            return Err(StoreError::InvalidPath(format!(
                "{path:?} names a document, not a collection"
            )));
        }
        Ok(Self(path.to_string()))
    }

    pub fn doc(&self, id: &str) -> Result<DocumentPath, StoreError> {
        validate_segment(id, &self.0)?;
        Ok(DocumentPath {
            collection: self.clone(),
            id: id.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DocumentPath {
    /// Joins an already-valid collection and id.
    pub(crate) fn from_parts(collection: CollectionPath, id: String) -> Self {
        Self { collection, id }
    }

    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let (collection, id) = path
            .rsplit_once('/')
            .ok_or_else(|| StoreError::InvalidPath(format!("{path:?} names a collection")))?;
        CollectionPath::parse(collection)?.doc(id)
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Nested collection owned by this document.
    pub fn sub_collection(&self, name: &str) -> Result<CollectionPath, StoreError> {
        validate_segment(name, &self.to_string())?;
        Ok(CollectionPath(format!("{self}/{name}")))
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
