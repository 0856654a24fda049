//! Resource contract for one entity kind, independent of HTTP.

use crate::entity::Entity;
use crate::error::AppError;
use crate::sort::Sort;
use crate::store::Repository;

pub struct CrudService;

impl CrudService {
    /// Persist a new entity. Fails with `idexists` when the client supplied an id.
    pub async fn create<E: Entity, R: Repository>(repo: &R, entity: E) -> Result<E, AppError> {
        if entity.id().is_some() {
            return Err(AppError::id_exists(E::ENTITY_NAME));
        }
        repo.save(entity).await
    }

    /// Overwrite an existing entity. Fails with `idnull` without an id and with not-found for unknown ids.
    pub async fn update<E: Entity, R: Repository>(repo: &R, entity: E) -> Result<E, AppError> {
        let id = entity.id().ok_or_else(|| AppError::id_null(E::ENTITY_NAME))?;
        if !repo.exists_by_id::<E>(id).await? {
            return Err(AppError::NotFound(format!("{} {}", E::ENTITY_NAME, id)));
        }
        repo.save(entity).await
    }

    /// All entities; sort directives go to storage unchecked.
    pub async fn list<E: Entity, R: Repository>(repo: &R, sort: &[Sort]) -> Result<Vec<E>, AppError> {
        repo.find_all::<E>(sort).await
    }

    pub async fn read<E: Entity, R: Repository>(repo: &R, id: i64) -> Result<E, AppError> {
        repo.find_by_id::<E>(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", E::ENTITY_NAME, id)))
    }

    /// Idempotent: deleting an absent id succeeds.
    pub async fn delete<E: Entity, R: Repository>(repo: &R, id: i64) -> Result<(), AppError> {
        repo.delete_by_id::<E>(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{A, C, D};
    use crate::store::MemoryRepository;

    #[tokio::test]
    async fn create_assigns_id_and_rejects_existing() {
        let repo = MemoryRepository::new();
        let created = CrudService::create(&repo, A::default()).await.unwrap();
        assert!(created.id.is_some());

        let err = CrudService::create(&repo, created).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::BadRequestAlert {
                error_key: "idexists",
                entity_name: "a",
                ..
            }
        ));
        assert_eq!(repo.count::<A>(), 1);
    }

    #[tokio::test]
    async fn update_requires_id_and_leaves_storage_untouched() {
        let repo = MemoryRepository::new();
        CrudService::create(&repo, C::default()).await.unwrap();
        let err = CrudService::update(&repo, C::default()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequestAlert { error_key: "idnull", .. }));
        assert_eq!(repo.count::<C>(), 1);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let repo = MemoryRepository::new();
        let err = CrudService::update(&repo, C::with_id(41)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(repo.count::<C>(), 0);
    }

    #[tokio::test]
    async fn update_existing_keeps_id() {
        let repo = MemoryRepository::new();
        let created = CrudService::create(&repo, D::default()).await.unwrap();
        let updated = CrudService::update(&repo, created.clone()).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(repo.count::<D>(), 1);
    }

    #[tokio::test]
    async fn delete_then_read_is_not_found() {
        let repo = MemoryRepository::new();
        let created = CrudService::create(&repo, A::default()).await.unwrap();
        let id = created.id.unwrap();
        CrudService::delete::<A, _>(&repo, id).await.unwrap();
        assert!(matches!(CrudService::read::<A, _>(&repo, id).await, Err(AppError::NotFound(_))));
        // never existed
        CrudService::delete::<A, _>(&repo, 1000).await.unwrap();
        assert!(matches!(CrudService::read::<A, _>(&repo, 1000).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_grows_by_one_after_create() {
        let repo = MemoryRepository::new();
        CrudService::create(&repo, A::default()).await.unwrap();
        let before = CrudService::list::<A, _>(&repo, &[]).await.unwrap().len();
        let created = CrudService::create(&repo, A::default()).await.unwrap();
        let after: Vec<A> = CrudService::list(&repo, &[]).await.unwrap();
        assert_eq!(after.len(), before + 1);
        assert!(after.iter().any(|a| a.id == created.id));
    }
}
