//! Where each entity lives. Everything sits under the owning user.

use crate::store::{CollectionPath, DocumentPath, StoreError};

pub fn orders_collection(uid: &str) -> Result<CollectionPath, StoreError> {
    CollectionPath::parse("users")?.doc(uid)?.sub_collection("orders")
}

pub fn order_document(uid: &str, order_id: &str) -> Result<DocumentPath, StoreError> {
    orders_collection(uid)?.doc(order_id)
}

pub fn people_collection(uid: &str, order_id: &str) -> Result<CollectionPath, StoreError> {
    order_document(uid, order_id)?.sub_collection("people")
}

pub fn person_document(uid: &str, order_id: &str, person_id: &str) -> Result<DocumentPath, StoreError> {
    people_collection(uid, order_id)?.doc(person_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_scoped_under_user() {
        assert_eq!(orders_collection("u1").unwrap().as_str(), "users/u1/orders");
        assert_eq!(
            person_document("u1", "o9", "p3").unwrap().to_string(),
            "users/u1/orders/o9/people/p3"
        );
        assert!(orders_collection("a/b").is_err());
        assert!(people_collection("u1", "").is_err());
    }
}
