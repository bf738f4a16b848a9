use circle_shared::{Account, Audit, Friendship, UserProfile};
use uuid::Uuid;

use super::{Entity, PgQuery, PgRepository};

impl Entity for Account {
    const NAME: &'static str = "Account";
    const TABLE: &'static str = "accounts";
    const COLUMNS: &'static [&'static str] = &["email", "password_hash", "is_active"];

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.email.clone())
            .bind(self.password_hash.clone())
            .bind(self.is_active)
    }
}

impl Entity for UserProfile {
    const NAME: &'static str = "User profile";
    const TABLE: &'static str = "user_profiles";
    const COLUMNS: &'static [&'static str] = &["account_id", "full_name", "avatar_url"];

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.account_id)
            .bind(self.full_name.clone())
            .bind(self.avatar_url.clone())
    }
}

impl Entity for Friendship {
    const NAME: &'static str = "Friendship";
    const TABLE: &'static str = "friendships";
    const COLUMNS: &'static [&'static str] = &["user_id", "friend_id", "status"];

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.user_id)
            .bind(self.friend_id)
            .bind(self.status)
    }
}

impl PgRepository<Account> {
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, sqlx::Error> {
        let sql = Self::select_sql(Some("email = $1"));
        sqlx::query_as::<_, Account>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }
}

impl PgRepository<UserProfile> {
    pub async fn find_by_account_id(
        &self,
        account_id: Uuid,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        let sql = Self::select_sql(Some("account_id = $1"));
        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn exists_by_account_id(&self, account_id: Uuid) -> Result<bool, sqlx::Error> {
        let sql = "SELECT EXISTS(SELECT 1 FROM user_profiles WHERE account_id = $1)";
        let (exists,): (bool,) = sqlx::query_as(sql)
            .bind(account_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn find_by_full_name_containing(
        &self,
        name: &str,
    ) -> Result<Vec<UserProfile>, sqlx::Error> {
        let sql = Self::select_sql(Some("full_name ILIKE $1"));
        let pattern = format!("%{name}%");
        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_with_avatar(&self) -> Result<Vec<UserProfile>, sqlx::Error> {
        let sql = Self::select_sql(Some("avatar_url IS NOT NULL"));
        sqlx::query_as::<_, UserProfile>(&sql)
            .fetch_all(&self.pool)
            .await
    }
}

impl PgRepository<Friendship> {
    /// Friendship edges originating from the given account.
    pub async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Friendship>, sqlx::Error> {
        let sql = Self::select_sql(Some("user_id = $1"));
        sqlx::query_as::<_, Friendship>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }
}
