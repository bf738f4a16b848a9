use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use circle_shared::api::{Page, PageParams};
use uuid::Uuid;

use crate::error::AppError;
use crate::repo::{Entity, Repository};

/// Generic CRUD business layer: id assignment, audit stamping and existence
/// checks on top of a [`Repository`]. One instance per entity type.
#[derive(Clone)]
pub struct CrudService<T, R> {
    repo: R,
    _entity: PhantomData<fn() -> T>,
}

impl<T, R> CrudService<T, R>
where
    T: Entity,
    R: Repository<T>,
{
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            _entity: PhantomData,
        }
    }

    /// Access to entity-specific finders on the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Persist a new entity. A nil id gets a fresh v4 UUID; both timestamps are
    /// stamped with the same instant.
    pub async fn create(&self, mut entity: T) -> Result<T, AppError> {
        let now = Utc::now();
        let audit = entity.audit_mut();
        if audit.id.is_nil() {
            audit.id = Uuid::new_v4();
        }
        audit.created_at = now;
        audit.updated_at = now;

        self.repo.insert(&entity).await?;
        Ok(entity)
    }

    /// Replace the entity stored under `id`. The stored `created_at` and
    /// `created_by` win over whatever the caller submitted.
    pub async fn update(&self, id: Uuid, mut entity: T) -> Result<T, AppError> {
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: T::NAME,
                id: id.to_string(),
            })?;

        let audit = entity.audit_mut();
        audit.id = id;
        audit.created_at = existing.audit().created_at;
        audit.created_by = existing.audit().created_by.clone();
        audit.updated_at = Utc::now();

        self.repo.update(&entity).await?;
        Ok(entity)
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.exists_by_id(id).await? {
            return Err(AppError::NotFound {
                entity: T::NAME,
                id: id.to_string(),
            });
        }
        self.repo.delete_by_id(id).await?;
        Ok(())
    }

    /// Fetch by id, failing with `NotFound` when absent.
    pub async fn get(&self, id: Uuid) -> Result<T, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: T::NAME,
                id: id.to_string(),
            })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, AppError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    pub async fn find_all(&self) -> Result<Vec<T>, AppError> {
        Ok(self.repo.find_all().await?)
    }

    pub async fn find_page(&self, params: PageParams) -> Result<Page<T>, AppError> {
        let (items, total) = self
            .repo
            .find_page(params.limit() as i64, params.offset() as i64)
            .await?;
        Ok(Page {
            items,
            total,
            page: params.page(),
            limit: params.limit(),
        })
    }

    pub async fn find_by_created_by(&self, created_by: &str) -> Result<Vec<T>, AppError> {
        Ok(self.repo.find_by_created_by(created_by).await?)
    }

    pub async fn find_page_by_created_by(
        &self,
        created_by: &str,
        params: PageParams,
    ) -> Result<Page<T>, AppError> {
        let (items, total) = self
            .repo
            .find_page_by_created_by(created_by, params.limit() as i64, params.offset() as i64)
            .await?;
        Ok(Page {
            items,
            total,
            page: params.page(),
            limit: params.limit(),
        })
    }

    pub async fn find_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<T>, AppError> {
        Ok(self.repo.find_created_between(start, end).await?)
    }

    pub async fn find_created_after(&self, since: DateTime<Utc>) -> Result<Vec<T>, AppError> {
        Ok(self.repo.find_created_after(since).await?)
    }

    pub async fn find_updated_after(&self, since: DateTime<Utc>) -> Result<Vec<T>, AppError> {
        Ok(self.repo.find_updated_after(since).await?)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        Ok(self.repo.count().await?)
    }

    pub async fn count_by_created_by(&self, created_by: &str) -> Result<i64, AppError> {
        Ok(self.repo.count_by_created_by(created_by).await?)
    }

    pub async fn exists_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.repo.exists_by_id(id).await?)
    }

    pub async fn find_by_id_and_created_by(
        &self,
        id: Uuid,
        created_by: &str,
    ) -> Result<Option<T>, AppError> {
        Ok(self.repo.find_by_id_and_created_by(id, created_by).await?)
    }

    pub async fn exists_by_id_and_created_by(
        &self,
        id: Uuid,
        created_by: &str,
    ) -> Result<bool, AppError> {
        Ok(self
            .repo
            .exists_by_id_and_created_by(id, created_by)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use circle_shared::{Account, Audit};

    use super::*;

    /// In-memory repository keeping insertion order, standing in for Postgres.
    struct MemRepository<T> {
        rows: Arc<Mutex<Vec<T>>>,
    }

    impl<T> MemRepository<T> {
        fn new() -> Self {
            Self {
                rows: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl<T> Clone for MemRepository<T> {
        fn clone(&self) -> Self {
            Self {
                rows: self.rows.clone(),
            }
        }
    }

    #[async_trait]
    impl<T: Entity> Repository<T> for MemRepository<T> {
        async fn insert(&self, entity: &T) -> Result<(), sqlx::Error> {
            self.rows.lock().unwrap().push(entity.clone());
            Ok(())
        }

        async fn update(&self, entity: &T) -> Result<(), sqlx::Error> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.iter_mut().find(|r| r.audit().id == entity.audit().id) {
                *row = entity.clone();
            }
            Ok(())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, sqlx::Error> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|r| r.audit().id == id).cloned())
        }

        async fn find_all(&self) -> Result<Vec<T>, sqlx::Error> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn find_page(&self, limit: i64, offset: i64) -> Result<(Vec<T>, i64), sqlx::Error> {
            let rows = self.rows.lock().unwrap();
            let items = rows
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect();
            Ok((items, rows.len() as i64))
        }

        async fn find_by_created_by(&self, created_by: &str) -> Result<Vec<T>, sqlx::Error> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|r| r.audit().created_by == created_by)
                .cloned()
                .collect())
        }

        async fn find_page_by_created_by(
            &self,
            created_by: &str,
            limit: i64,
            offset: i64,
        ) -> Result<(Vec<T>, i64), sqlx::Error> {
            let matching = self.find_by_created_by(created_by).await?;
            let total = matching.len() as i64;
            let items = matching
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect();
            Ok((items, total))
        }

        async fn find_created_between(
            &self,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<T>, sqlx::Error> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|r| r.audit().created_at >= start && r.audit().created_at <= end)
                .cloned()
                .collect())
        }

        async fn find_created_after(&self, since: DateTime<Utc>) -> Result<Vec<T>, sqlx::Error> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|r| r.audit().created_at >= since)
                .cloned()
                .collect())
        }

        async fn find_updated_after(&self, since: DateTime<Utc>) -> Result<Vec<T>, sqlx::Error> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|r| r.audit().updated_at >= since)
                .cloned()
                .collect())
        }

        async fn count(&self) -> Result<i64, sqlx::Error> {
            Ok(self.rows.lock().unwrap().len() as i64)
        }

        async fn count_by_created_by(&self, created_by: &str) -> Result<i64, sqlx::Error> {
            Ok(self.find_by_created_by(created_by).await?.len() as i64)
        }

        async fn exists_by_id(&self, id: Uuid) -> Result<bool, sqlx::Error> {
            Ok(self.find_by_id(id).await?.is_some())
        }

        async fn find_by_id_and_created_by(
            &self,
            id: Uuid,
            created_by: &str,
        ) -> Result<Option<T>, sqlx::Error> {
            Ok(self
                .find_by_id(id)
                .await?
                .filter(|r| r.audit().created_by == created_by))
        }

        async fn exists_by_id_and_created_by(
            &self,
            id: Uuid,
            created_by: &str,
        ) -> Result<bool, sqlx::Error> {
            Ok(self
                .find_by_id_and_created_by(id, created_by)
                .await?
                .is_some())
        }

        async fn delete_by_id(&self, id: Uuid) -> Result<u64, sqlx::Error> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.audit().id != id);
            Ok((before - rows.len()) as u64)
        }
    }

    fn service() -> CrudService<Account, MemRepository<Account>> {
        CrudService::new(MemRepository::new())
    }

    fn account(id: Option<Uuid>, email: &str, created_by: &str) -> Account {
        Account {
            audit: Audit::pending(id, created_by),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn create_assigns_a_fresh_id_when_missing() {
        let svc = service();
        let a = svc.create(account(None, "a@example.com", "alice")).await.unwrap();
        let b = svc.create(account(None, "b@example.com", "alice")).await.unwrap();

        assert!(!a.audit.id.is_nil());
        assert!(!b.audit.id.is_nil());
        assert_ne!(a.audit.id, b.audit.id);
        assert_eq!(a.audit.created_at, a.audit.updated_at);
    }

    #[tokio::test]
    async fn create_keeps_a_client_supplied_id() {
        let svc = service();
        let id = Uuid::new_v4();
        let created = svc
            .create(account(Some(id), "a@example.com", "alice"))
            .await
            .unwrap();
        assert_eq!(created.audit.id, id);
    }

    #[tokio::test]
    async fn update_of_a_missing_id_is_not_found() {
        let svc = service();
        let id = Uuid::new_v4();
        let err = svc
            .update(id, account(None, "a@example.com", "alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "Account", .. }));
    }

    #[tokio::test]
    async fn update_preserves_creation_audit_fields() {
        let svc = service();
        let created = svc
            .create(account(None, "a@example.com", "alice"))
            .await
            .unwrap();

        // The update body claims a different creator; the stored values win.
        let updated = svc
            .update(
                created.audit.id,
                account(None, "new@example.com", "mallory"),
            )
            .await
            .unwrap();

        assert_eq!(updated.audit.id, created.audit.id);
        assert_eq!(updated.audit.created_at, created.audit.created_at);
        assert_eq!(updated.audit.created_by, "alice");
        assert_eq!(updated.email, "new@example.com");
        assert!(updated.audit.updated_at >= created.audit.updated_at);

        let stored = svc.get(created.audit.id).await.unwrap();
        assert_eq!(stored.audit.created_by, "alice");
        assert_eq!(stored.email, "new@example.com");
    }

    #[tokio::test]
    async fn delete_of_a_missing_id_is_not_found() {
        let svc = service();
        let err = svc.delete_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let svc = service();
        let created = svc
            .create(account(None, "a@example.com", "alice"))
            .await
            .unwrap();

        svc.delete_by_id(created.audit.id).await.unwrap();
        assert!(!svc.exists_by_id(created.audit.id).await.unwrap());
        assert!(matches!(
            svc.get(created.audit.id).await.unwrap_err(),
            AppError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn get_of_a_missing_id_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.get(Uuid::new_v4()).await.unwrap_err(),
            AppError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn pagination_respects_limit_and_insertion_order() {
        let svc = service();
        let mut ids = Vec::new();
        for i in 0..5 {
            let created = svc
                .create(account(None, &format!("user{i}@example.com"), "alice"))
                .await
                .unwrap();
            ids.push(created.audit.id);
        }

        let first = svc
            .find_page(PageParams {
                page: Some(1),
                limit: Some(2),
            })
            .await
            .unwrap();
        let second = svc
            .find_page(PageParams {
                page: Some(2),
                limit: Some(2),
            })
            .await
            .unwrap();
        let third = svc
            .find_page(PageParams {
                page: Some(3),
                limit: Some(2),
            })
            .await
            .unwrap();

        assert_eq!(first.total, 5);
        assert_eq!(first.items.len(), 2);
        assert_eq!(second.items.len(), 2);
        assert_eq!(third.items.len(), 1);

        let paged: Vec<Uuid> = first
            .items
            .iter()
            .chain(&second.items)
            .chain(&third.items)
            .map(|a| a.audit.id)
            .collect();
        assert_eq!(paged, ids);

        let all = svc.find_all().await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(svc.find_by_id(ids[0]).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn creator_scoped_lookups_filter_by_owner() {
        let svc = service();
        let mine = svc
            .create(account(None, "a@example.com", "alice"))
            .await
            .unwrap();
        svc.create(account(None, "b@example.com", "bob"))
            .await
            .unwrap();

        assert_eq!(svc.count_by_created_by("alice").await.unwrap(), 1);
        assert_eq!(svc.count().await.unwrap(), 2);
        assert!(svc
            .exists_by_id_and_created_by(mine.audit.id, "alice")
            .await
            .unwrap());
        assert!(!svc
            .exists_by_id_and_created_by(mine.audit.id, "bob")
            .await
            .unwrap());
        assert!(svc
            .find_by_id_and_created_by(mine.audit.id, "bob")
            .await
            .unwrap()
            .is_none());

        let owned = svc.find_by_created_by("alice").await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].audit.id, mine.audit.id);
    }

    #[tokio::test]
    async fn time_scoped_lookups_see_fresh_records() {
        let svc = service();
        let before = Utc::now();
        let created = svc
            .create(account(None, "a@example.com", "alice"))
            .await
            .unwrap();

        let in_range = svc
            .find_created_between(before, Utc::now())
            .await
            .unwrap();
        assert_eq!(in_range.len(), 1);
        assert_eq!(in_range[0].audit.id, created.audit.id);

        assert_eq!(svc.find_created_after(before).await.unwrap().len(), 1);
        assert_eq!(svc.find_updated_after(before).await.unwrap().len(), 1);
        assert!(svc
            .find_updated_after(Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap()
            .is_empty());
    }
}
