//! In-process repository: one id-ordered map per table behind a mutex. Used by tests and `STORAGE=memory`.

use super::{entity_to_object, object_to_entity, Repository};
use crate::entity::Entity;
use crate::error::AppError;
use crate::sort::{Direction, Sort};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Map<String, Value>>,
}

#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<HashMap<&'static str, Table>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, HashMap<&'static str, Table>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored rows of `E`.
    pub fn count<E: Entity>(&self) -> usize {
        self.tables().get(E::TABLE).map(|t| t.rows.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_all<E: Entity>(&self, sort: &[Sort]) -> Result<Vec<E>, AppError> {
        Sort::check_columns::<E>(sort)?;
        let mut rows: Vec<(i64, Map<String, Value>)> = match self.tables().get(E::TABLE) {
            Some(t) => t.rows.iter().map(|(id, row)| (*id, row.clone())).collect(),
            None => Vec::new(),
        };
        if !sort.is_empty() {
            rows.sort_by(|(_, a), (_, b)| compare_rows(a, b, sort));
        }
        rows.into_iter().map(|(id, row)| object_to_entity(row, id)).collect()
    }

    async fn find_by_id<E: Entity>(&self, id: i64) -> Result<Option<E>, AppError> {
        let row = self.tables().get(E::TABLE).and_then(|t| t.rows.get(&id).cloned());
        row.map(|r| object_to_entity(r, id)).transpose()
    }

    async fn exists_by_id<E: Entity>(&self, id: i64) -> Result<bool, AppError> {
        Ok(self
            .tables()
            .get(E::TABLE)
            .map(|t| t.rows.contains_key(&id))
            .unwrap_or(false))
    }

    async fn save<E: Entity>(&self, entity: E) -> Result<E, AppError> {
        let mut row = entity_to_object(&entity)?;
        row.retain(|k, _| E::has_column(k));
        let id = {
            let mut tables = self.tables();
            let table = tables.entry(E::TABLE).or_default();
            let id = match entity.id() {
                Some(id) => {
                    table.last_id = table.last_id.max(id);
                    id
                }
                None => {
                    table.last_id += 1;
                    table.last_id
                }
            };
            row.insert(crate::entity::ID_COLUMN.to_string(), Value::from(id));
            table.rows.insert(id, row.clone());
            id
        };
        object_to_entity(row, id)
    }

    async fn delete_by_id<E: Entity>(&self, id: i64) -> Result<(), AppError> {
        if let Some(t) = self.tables().get_mut(E::TABLE) {
            t.rows.remove(&id);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

fn compare_rows(a: &Map<String, Value>, b: &Map<String, Value>, sort: &[Sort]) -> Ordering {
    sort.iter().fold(Ordering::Equal, |acc, s| {
        acc.then_with(|| {
            let o = compare_values(a.get(&s.property), b.get(&s.property));
            match s.direction {
                Direction::Asc => o,
                Direction::Desc => o.reverse(),
            }
        })
    })
}

/// Nulls first, then natural order within numbers, strings and booleans.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal),
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{A, B};

    #[tokio::test]
    async fn assigns_increasing_ids_per_table() {
        let repo = MemoryRepository::new();
        let a1 = repo.save(A::default()).await.unwrap();
        let a2 = repo.save(A::default()).await.unwrap();
        let b1 = repo.save(B::default()).await.unwrap();
        assert_eq!(a1.id, Some(1));
        assert_eq!(a2.id, Some(2));
        assert_eq!(b1.id, Some(1));
        assert_eq!(repo.count::<A>(), 2);
    }

    #[tokio::test]
    async fn save_with_id_overwrites() {
        let repo = MemoryRepository::new();
        let a = repo.save(A::default()).await.unwrap();
        let again = repo.save(a.clone()).await.unwrap();
        assert_eq!(again, a);
        assert_eq!(repo.count::<A>(), 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = MemoryRepository::new();
        let a = repo.save(A::default()).await.unwrap();
        let id = a.id.unwrap();
        repo.delete_by_id::<A>(id).await.unwrap();
        repo.delete_by_id::<A>(id).await.unwrap();
        repo.delete_by_id::<B>(99).await.unwrap();
        assert_eq!(repo.find_by_id::<A>(id).await.unwrap(), None);
        assert!(!repo.exists_by_id::<A>(id).await.unwrap());
    }

    #[tokio::test]
    async fn find_all_honours_sort() {
        let repo = MemoryRepository::new();
        for _ in 0..3 {
            repo.save(A::default()).await.unwrap();
        }
        let desc: Vec<A> = repo.find_all(&Sort::parse("id,desc").unwrap()).await.unwrap();
        let ids: Vec<Option<i64>> = desc.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![Some(3), Some(2), Some(1)]);

        let err = repo.find_all::<A>(&Sort::parse("name").unwrap()).await;
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }
}
