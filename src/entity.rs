//! Entity records served by the API. Each kind maps to one table with a generated `id`.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;

/// Primary key column shared by every entity table.
pub const ID_COLUMN: &str = "id";

/// A persisted record kind exposed as one REST collection.
pub trait Entity: Serialize + DeserializeOwned + Debug + Clone + Send + Sync + 'static {
    /// Name used in alerts and error bodies (e.g. `a`).
    const ENTITY_NAME: &'static str;
    /// Path segment of the collection under `/api` (e.g. `as`).
    const COLLECTION: &'static str;
    /// Backing table.
    const TABLE: &'static str;
    /// Columns of the backing table; the first one is the primary key.
    const COLUMNS: &'static [&'static str] = &[ID_COLUMN];

    fn id(&self) -> Option<i64>;

    fn has_column(name: &str) -> bool {
        Self::COLUMNS.contains(&name)
    }
}

macro_rules! entity {
    ($(#[$meta:meta])* $name:ident, name = $entity_name:literal, collection = $collection:literal, table = $table:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(default)]
            pub id: Option<i64>,
        }

        impl $name {
            pub fn with_id(id: i64) -> Self {
                Self { id: Some(id) }
            }
        }

        impl Entity for $name {
            const ENTITY_NAME: &'static str = $entity_name;
            const COLLECTION: &'static str = $collection;
            const TABLE: &'static str = $table;

            fn id(&self) -> Option<i64> {
                self.id
            }
        }
    };
}

entity!(
    /// Resource A, served at `/api/as`.
    A, name = "a", collection = "as", table = "a"
);
entity!(
    /// Resource B, served at `/api/bs`.
    B, name = "b", collection = "bs", table = "b"
);
entity!(
    /// Resource C, served at `/api/cs`.
    C, name = "c", collection = "cs", table = "c"
);
entity!(
    /// Resource D, served at `/api/ds`.
    D, name = "d", collection = "ds", table = "d"
);

/// Tables created at startup, one per entity kind.
pub const ENTITY_TABLES: &[&str] = &[A::TABLE, B::TABLE, C::TABLE, D::TABLE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_optional_on_input() {
        let a: A = serde_json::from_str("{}").unwrap();
        assert_eq!(a.id(), None);
        let b: B = serde_json::from_str(r#"{"id":null}"#).unwrap();
        assert_eq!(b.id(), None);
        let c: C = serde_json::from_str(r#"{"id":7}"#).unwrap();
        assert_eq!(c.id(), Some(7));
    }

    #[test]
    fn collections_are_distinct() {
        let collections = [A::COLLECTION, B::COLLECTION, C::COLLECTION, D::COLLECTION];
        for (i, c) in collections.iter().enumerate() {
            assert!(!collections[i + 1..].contains(c));
        }
        assert!(D::has_column("id"));
        assert!(!D::has_column("name"));
    }
}
