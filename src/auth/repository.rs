// Credential store: persisted user records

use axum::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::models::{NewUser, User};
use crate::db::StoreError;

const USER_COLUMNS: &str = "id, display_name, email, password_hash, location, occupation, \
     picture_path, viewed_profile, impressions, friends, created_at";

/// Storage operations on users
///
/// Implementations must enforce email uniqueness (case-insensitive) and make
/// `toggle_friendship` atomic across both users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user, failing with `StoreError::DuplicateEmail` if the email is taken
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Users whose id is in `ids`; unknown ids are skipped
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;

    /// All users, newest first
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// Add or remove the friendship between two users on both sides
    ///
    /// Returns the updated `user_id` record, or `None` if either user is missing.
    async fn toggle_friendship(
        &self,
        user_id: Uuid,
        friend_id: Uuid,
    ) -> Result<Option<User>, StoreError>;
}

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (id, display_name, email, password_hash, location, occupation, \
             picture_path, viewed_profile, impressions) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&user.display_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.location)
            .bind(&user.occupation)
            .bind(&user.picture_path)
            .bind(user.viewed_profile)
            .bind(user.impressions)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let query = format!(
            "SELECT {} FROM users WHERE id = ANY($1) ORDER BY display_name",
            USER_COLUMNS
        );

        let users = sqlx::query_as::<_, User>(&query)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let query = format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS);

        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let exists: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.unwrap_or(false))
    }

    async fn toggle_friendship(
        &self,
        user_id: Uuid,
        friend_id: Uuid,
    ) -> Result<Option<User>, StoreError> {
        // Rolled back on drop if any step fails
        let mut tx = self.pool.begin().await?;

        // Lock both rows in id order so concurrent toggles cannot deadlock
        let locked: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(vec![user_id, friend_id])
        .fetch_all(&mut *tx)
        .await?;

        if locked.len() < 2 {
            return Ok(None);
        }

        let query = format!(
            "UPDATE users SET friends = CASE \
                 WHEN $2 = ANY(friends) THEN array_remove(friends, $2) \
                 ELSE array_append(friends, $2) END \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let updated = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .bind(friend_id)
            .fetch_one(&mut *tx)
            .await?;

        let now_friends = updated.friends.contains(&friend_id);

        // Mirror the outcome on the other side instead of toggling blindly
        sqlx::query(
            "UPDATE users SET friends = CASE \
                 WHEN $3 AND NOT ($2 = ANY(friends)) THEN array_append(friends, $2) \
                 WHEN NOT $3 THEN array_remove(friends, $2) \
                 ELSE friends END \
             WHERE id = $1",
        )
        .bind(friend_id)
        .bind(user_id)
        .bind(now_friends)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(updated))
    }
}

/// Process-local user store used by the test suite
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(StoreError::DuplicateEmail);
        }

        let user = User {
            id: Uuid::new_v4(),
            display_name: new_user.display_name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            location: new_user.location,
            occupation: new_user.occupation,
            picture_path: new_user.picture_path,
            viewed_profile: new_user.viewed_profile,
            impressions: new_user.impressions,
            friends: Vec::new(),
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut found: Vec<User> = ids.iter().filter_map(|id| users.get(id).cloned()).collect();
        found.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(found)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn toggle_friendship(
        &self,
        user_id: Uuid,
        friend_id: Uuid,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user_id) || !users.contains_key(&friend_id) {
            return Ok(None);
        }

        let now_friends = match users.get_mut(&user_id) {
            Some(user) => toggle_membership(&mut user.friends, friend_id),
            None => return Ok(None),
        };

        if let Some(friend) = users.get_mut(&friend_id) {
            friend.friends.retain(|id| *id != user_id);
            if now_friends {
                friend.friends.push(user_id);
            }
        }

        Ok(users.get(&user_id).cloned())
    }
}

/// Flip membership of `id` in `set`; returns whether it is present afterwards
pub fn toggle_membership(set: &mut Vec<Uuid>, id: Uuid) -> bool {
    if let Some(pos) = set.iter().position(|x| *x == id) {
        set.remove(pos);
        false
    } else {
        set.push(id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            display_name: name.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            location: None,
            occupation: None,
            picture_path: None,
            viewed_profile: 0,
            impressions: 0,
        }
    }

    #[test]
    fn test_toggle_membership() {
        let id = Uuid::new_v4();
        let mut set = vec![];

        assert!(toggle_membership(&mut set, id));
        assert_eq!(set, vec![id]);
        assert!(!toggle_membership(&mut set, id));
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_rejects_duplicate_email_case_insensitively() {
        let store = InMemoryUserStore::new();
        store.create(new_user("Ann", "ann@example.com")).await.unwrap();

        let result = store.create(new_user("Ann 2", "ANN@example.com")).await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_in_memory_find_by_email_and_id() {
        let store = InMemoryUserStore::new();
        let created = store.create(new_user("Bob", "bob@example.com")).await.unwrap();

        let by_email = store.find_by_email("Bob@Example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "bob@example.com");

        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.email_exists("bob@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_in_memory_friendship_is_symmetric() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("A", "a@example.com")).await.unwrap();
        let b = store.create(new_user("B", "b@example.com")).await.unwrap();

        let updated = store.toggle_friendship(a.id, b.id).await.unwrap().unwrap();
        assert_eq!(updated.friends, vec![b.id]);
        let b_now = store.find_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(b_now.friends, vec![a.id]);

        let updated = store.toggle_friendship(a.id, b.id).await.unwrap().unwrap();
        assert!(updated.friends.is_empty());
        let b_now = store.find_by_id(b.id).await.unwrap().unwrap();
        assert!(b_now.friends.is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_friendship_with_missing_user() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("A", "a@example.com")).await.unwrap();

        let result = store.toggle_friendship(a.id, Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
        let a_now = store.find_by_id(a.id).await.unwrap().unwrap();
        assert!(a_now.friends.is_empty());
    }

    // ------------------------------------------------------------------
    // Postgres store
    // ------------------------------------------------------------------

    use crate::db::test_support::create_test_pool;
    use std::sync::Arc;

    fn unique_email(prefix: &str) -> String {
        format!("{}-{}@example.com", prefix, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_pg_duplicate_email_is_case_insensitive() {
        let Some(pool) = create_test_pool().await else { return };
        let store = PgUserStore::new(pool);
        let email = unique_email("dup");

        store.create(new_user("Ann", &email)).await.unwrap();
        let result = store
            .create(new_user("Ann 2", &email.to_uppercase()))
            .await;

        assert!(matches!(result, Err(StoreError::DuplicateEmail)));
        assert!(store.email_exists(&email).await.unwrap());
    }

    #[tokio::test]
    async fn test_pg_friendship_toggle_is_symmetric() {
        let Some(pool) = create_test_pool().await else { return };
        let store = PgUserStore::new(pool);
        let ann = store.create(new_user("Ann", &unique_email("ann"))).await.unwrap();
        let bob = store.create(new_user("Bob", &unique_email("bob"))).await.unwrap();

        let updated = store.toggle_friendship(ann.id, bob.id).await.unwrap().unwrap();
        assert_eq!(updated.friends, vec![bob.id]);
        let bob_now = store.find_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(bob_now.friends, vec![ann.id]);

        let updated = store.toggle_friendship(ann.id, bob.id).await.unwrap().unwrap();
        assert!(updated.friends.is_empty());
        let bob_now = store.find_by_id(bob.id).await.unwrap().unwrap();
        assert!(bob_now.friends.is_empty());
    }

    #[tokio::test]
    async fn test_pg_friendship_with_missing_user_changes_nothing() {
        let Some(pool) = create_test_pool().await else { return };
        let store = PgUserStore::new(pool);
        let ann = store.create(new_user("Ann", &unique_email("ann"))).await.unwrap();

        let result = store.toggle_friendship(ann.id, Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
        let ann_now = store.find_by_id(ann.id).await.unwrap().unwrap();
        assert!(ann_now.friends.is_empty());
    }

    #[tokio::test]
    async fn test_pg_concurrent_friend_toggles_stay_consistent() {
        let Some(pool) = create_test_pool().await else { return };
        let store = Arc::new(PgUserStore::new(pool));
        let ann = store.create(new_user("Ann", &unique_email("ann"))).await.unwrap();

        let mut friends = Vec::new();
        for i in 0..5 {
            let user = store
                .create(new_user(&format!("Friend {}", i), &unique_email("friend")))
                .await
                .unwrap();
            friends.push(user.id);
        }

        // each friend toggles from their own side at the same time
        let handles: Vec<_> = friends
            .iter()
            .map(|&friend| {
                let store = store.clone();
                tokio::spawn(async move { store.toggle_friendship(friend, ann.id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap().unwrap();
        }

        let mut ann_friends = store.find_by_id(ann.id).await.unwrap().unwrap().friends;
        ann_friends.sort();
        friends.sort();
        assert_eq!(ann_friends, friends);
    }
}
