use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use circle_shared::Audit;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

mod entities;

pub type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// A persisted record the generic repository can handle: table metadata, audit
/// field access, and value binding for the non-audit columns.
pub trait Entity:
    Clone + Send + Sync + Unpin + for<'r> sqlx::FromRow<'r, PgRow> + 'static
{
    /// Singular name used in error messages.
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Non-audit columns, in binding order.
    const COLUMNS: &'static [&'static str];

    fn audit(&self) -> &Audit;
    fn audit_mut(&mut self) -> &mut Audit;
    /// Bind the values of `COLUMNS`, in the same order.
    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q>;
}

/// Data access shared by every entity type. Lookups over the audit columns are
/// generic; entity-specific finders live on the concrete repository.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn insert(&self, entity: &T) -> Result<(), sqlx::Error>;
    async fn update(&self, entity: &T) -> Result<(), sqlx::Error>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, sqlx::Error>;
    async fn find_all(&self) -> Result<Vec<T>, sqlx::Error>;
    /// Page of rows in insertion order plus the total count.
    async fn find_page(&self, limit: i64, offset: i64) -> Result<(Vec<T>, i64), sqlx::Error>;
    async fn find_by_created_by(&self, created_by: &str) -> Result<Vec<T>, sqlx::Error>;
    async fn find_page_by_created_by(
        &self,
        created_by: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<T>, i64), sqlx::Error>;
    async fn find_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<T>, sqlx::Error>;
    async fn find_created_after(&self, since: DateTime<Utc>) -> Result<Vec<T>, sqlx::Error>;
    async fn find_updated_after(&self, since: DateTime<Utc>) -> Result<Vec<T>, sqlx::Error>;
    async fn count(&self) -> Result<i64, sqlx::Error>;
    async fn count_by_created_by(&self, created_by: &str) -> Result<i64, sqlx::Error>;
    async fn exists_by_id(&self, id: Uuid) -> Result<bool, sqlx::Error>;
    async fn find_by_id_and_created_by(
        &self,
        id: Uuid,
        created_by: &str,
    ) -> Result<Option<T>, sqlx::Error>;
    async fn exists_by_id_and_created_by(
        &self,
        id: Uuid,
        created_by: &str,
    ) -> Result<bool, sqlx::Error>;
    /// Returns the number of rows removed.
    async fn delete_by_id(&self, id: Uuid) -> Result<u64, sqlx::Error>;
}

/// Postgres repository, generic over the entity type. SQL is assembled from the
/// entity's table/column metadata; bound values always go through placeholders.
pub struct PgRepository<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> PgRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }
}

impl<T> Clone for PgRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> PgRepository<T> {
    fn column_list() -> String {
        let mut columns = vec!["id", "created_at", "updated_at", "created_by"];
        columns.extend_from_slice(T::COLUMNS);
        columns.join(", ")
    }

    fn select_sql(filter: Option<&str>) -> String {
        let mut sql = format!("SELECT {} FROM {}", Self::column_list(), T::TABLE);
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        sql.push_str(" ORDER BY created_at, id");
        sql
    }

    fn insert_sql() -> String {
        let placeholders = (1..=4 + T::COLUMNS.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE,
            Self::column_list(),
            placeholders
        )
    }

    fn update_sql() -> String {
        let mut assignments = vec!["updated_at = $1".to_string()];
        for (i, column) in T::COLUMNS.iter().enumerate() {
            assignments.push(format!("{} = ${}", column, i + 2));
        }
        format!(
            "UPDATE {} SET {} WHERE id = ${}",
            T::TABLE,
            assignments.join(", "),
            T::COLUMNS.len() + 2
        )
    }

    async fn fetch_filtered(
        &self,
        filter: &str,
        bind: impl for<'q> FnOnce(PgQuery<'q>) -> PgQuery<'q> + Send,
    ) -> Result<Vec<T>, sqlx::Error> {
        let sql = Self::select_sql(Some(filter));
        let query = sqlx::query(&sql);
        let rows = bind(query).fetch_all(&self.pool).await?;
        rows.iter().map(sqlx::FromRow::from_row).collect()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for PgRepository<T> {
    async fn insert(&self, entity: &T) -> Result<(), sqlx::Error> {
        let sql = Self::insert_sql();
        let audit = entity.audit();
        let query = sqlx::query(&sql)
            .bind(audit.id)
            .bind(audit.created_at)
            .bind(audit.updated_at)
            .bind(audit.created_by.clone());
        entity.bind_columns(query).execute(&self.pool).await?;
        Ok(())
    }

    async fn update(&self, entity: &T) -> Result<(), sqlx::Error> {
        let sql = Self::update_sql();
        let audit = entity.audit();
        let query = sqlx::query(&sql).bind(audit.updated_at);
        entity
            .bind_columns(query)
            .bind(audit.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, sqlx::Error> {
        let sql = Self::select_sql(Some("id = $1"));
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_all(&self) -> Result<Vec<T>, sqlx::Error> {
        let sql = Self::select_sql(None);
        sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await
    }

    async fn find_page(&self, limit: i64, offset: i64) -> Result<(Vec<T>, i64), sqlx::Error> {
        let count_sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let (total,): (i64,) = sqlx::query_as(&count_sql).fetch_one(&self.pool).await?;

        let sql = format!("{} LIMIT $1 OFFSET $2", Self::select_sql(None));
        let items = sqlx::query_as::<_, T>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((items, total))
    }

    async fn find_by_created_by(&self, created_by: &str) -> Result<Vec<T>, sqlx::Error> {
        self.fetch_filtered("created_by = $1", |q| q.bind(created_by.to_owned()))
            .await
    }

    async fn find_page_by_created_by(
        &self,
        created_by: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<T>, i64), sqlx::Error> {
        let count_sql = format!("SELECT COUNT(*) FROM {} WHERE created_by = $1", T::TABLE);
        let (total,): (i64,) = sqlx::query_as(&count_sql)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "{} LIMIT $2 OFFSET $3",
            Self::select_sql(Some("created_by = $1"))
        );
        let items = sqlx::query_as::<_, T>(&sql)
            .bind(created_by)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((items, total))
    }

    async fn find_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<T>, sqlx::Error> {
        self.fetch_filtered("created_at BETWEEN $1 AND $2", |q| q.bind(start).bind(end))
            .await
    }

    async fn find_created_after(&self, since: DateTime<Utc>) -> Result<Vec<T>, sqlx::Error> {
        self.fetch_filtered("created_at >= $1", |q| q.bind(since))
            .await
    }

    async fn find_updated_after(&self, since: DateTime<Utc>) -> Result<Vec<T>, sqlx::Error> {
        self.fetch_filtered("updated_at >= $1", |q| q.bind(since))
            .await
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn count_by_created_by(&self, created_by: &str) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE created_by = $1", T::TABLE);
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", T::TABLE);
        let (exists,): (bool,) = sqlx::query_as(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(exists)
    }

    async fn find_by_id_and_created_by(
        &self,
        id: Uuid,
        created_by: &str,
    ) -> Result<Option<T>, sqlx::Error> {
        let sql = Self::select_sql(Some("id = $1 AND created_by = $2"));
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(created_by)
            .fetch_optional(&self.pool)
            .await
    }

    async fn exists_by_id_and_created_by(
        &self,
        id: Uuid,
        created_by: &str,
    ) -> Result<bool, sqlx::Error> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1 AND created_by = $2)",
            T::TABLE
        );
        let (exists,): (bool,) = sqlx::query_as(&sql)
            .bind(id)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
