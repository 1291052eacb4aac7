use crate::error::RepositoryError;
use crate::models::{Course, CourseFields, CourseRecord, NewUser, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, so handlers can
/// be exercised against Postgres or the in-memory store alike.
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    // Exact, case-sensitive match on the email address.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    // Fails with `DuplicateEmail` when the address is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    // --- Course Retrieval ---
    // Every course joined with its owner's public columns.
    async fn list_courses(&self) -> Result<Vec<CourseRecord>, RepositoryError>;
    async fn get_course(&self, id: i32) -> Result<Option<CourseRecord>, RepositoryError>;
    // Bare row, used for the ownership check before a mutation.
    async fn find_course(&self, id: i32) -> Result<Option<Course>, RepositoryError>;

    // --- Owner Actions ---
    async fn create_course(&self, fields: CourseFields, owner_id: i32) -> Result<Course, RepositoryError>;
    // Owner-Only: returns None if the row is gone or owned by someone else.
    async fn update_course(
        &self,
        id: i32,
        owner_id: i32,
        fields: CourseFields,
    ) -> Result<Option<Course>, RepositoryError>;
    // Owner-Only: returns true only if a row was removed.
    async fn delete_course(&self, id: i32, owner_id: i32) -> Result<bool, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const COURSE_COLUMNS: &str =
    "id, title, description, estimated_time, materials_needed, user_id, created_at, updated_at";

const COURSE_WITH_OWNER: &str = r#"
    SELECT
        c.id, c.title, c.description, c.estimated_time, c.materials_needed, c.user_id,
        u.first_name AS owner_first_name,
        u.last_name AS owner_last_name,
        u.email_address AS owner_email_address
    FROM courses c
    JOIN users u ON u.id = c.user_id
"#;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, first_name, last_name, email_address, password, created_at, updated_at
               FROM users
               WHERE email_address = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// create_user
    ///
    /// Inserts a registration. The unique index on `email_address` is the source of
    /// truth for uniqueness; its violation is mapped to `DuplicateEmail`.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (first_name, last_name, email_address, password)
               VALUES ($1, $2, $3, $4)
               RETURNING id, first_name, last_name, email_address, password, created_at, updated_at"#,
        )
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.email_address)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_user_insert)
    }

    async fn list_courses(&self) -> Result<Vec<CourseRecord>, RepositoryError> {
        let query = format!("{} ORDER BY c.id", COURSE_WITH_OWNER);
        let courses = sqlx::query_as::<_, CourseRecord>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(courses)
    }

    async fn get_course(&self, id: i32) -> Result<Option<CourseRecord>, RepositoryError> {
        let query = format!("{} WHERE c.id = $1", COURSE_WITH_OWNER);
        let course = sqlx::query_as::<_, CourseRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    async fn find_course(&self, id: i32) -> Result<Option<Course>, RepositoryError> {
        let query = format!("SELECT {} FROM courses WHERE id = $1", COURSE_COLUMNS);
        let course = sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    async fn create_course(&self, fields: CourseFields, owner_id: i32) -> Result<Course, RepositoryError> {
        let query = format!(
            r#"INSERT INTO courses (title, description, estimated_time, materials_needed, user_id)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {}"#,
            COURSE_COLUMNS
        );
        let course = sqlx::query_as::<_, Course>(&query)
            .bind(fields.title)
            .bind(fields.description)
            .bind(fields.estimated_time.flatten())
            .bind(fields.materials_needed.flatten())
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(course)
    }

    /// update_course
    ///
    /// The `user_id = $2` guard repeats the handler's ownership check inside the
    /// statement itself, so a row can only change while its owner matches.
    /// Each optional column is paired with a "supplied" flag: unsupplied columns
    /// keep their value, supplied ones take the bound value even when it is NULL.
    async fn update_course(
        &self,
        id: i32,
        owner_id: i32,
        fields: CourseFields,
    ) -> Result<Option<Course>, RepositoryError> {
        let query = format!(
            r#"UPDATE courses
               SET title = $3,
                   description = $4,
                   estimated_time = CASE WHEN $5 THEN $6 ELSE estimated_time END,
                   materials_needed = CASE WHEN $7 THEN $8 ELSE materials_needed END,
                   updated_at = NOW()
               WHERE id = $1 AND user_id = $2
               RETURNING {}"#,
            COURSE_COLUMNS
        );
        let course = sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(fields.title)
            .bind(fields.description)
            .bind(fields.estimated_time.is_some())
            .bind(fields.estimated_time.flatten())
            .bind(fields.materials_needed.is_some())
            .bind(fields.materials_needed.flatten())
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    async fn delete_course(&self, id: i32, owner_id: i32) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// --- In-Memory Implementation ---

#[derive(Default)]
struct MemoryStore {
    users: Vec<User>,
    courses: Vec<Course>,
    next_user_id: i32,
    next_course_id: i32,
}

impl MemoryStore {
    fn record(&self, course: &Course) -> Option<CourseRecord> {
        let owner = self.users.iter().find(|u| u.id == course.user_id)?;
        Some(CourseRecord {
            id: course.id,
            title: course.title.clone(),
            description: course.description.clone(),
            estimated_time: course.estimated_time.clone(),
            materials_needed: course.materials_needed.clone(),
            user_id: course.user_id,
            owner_first_name: owner.first_name.clone(),
            owner_last_name: owner.last_name.clone(),
            owner_email_address: owner.email_address.clone(),
        })
    }
}

/// MemoryRepository
///
/// A process-local implementation of `Repository` with the same semantics as
/// `PostgresRepository` (serial ids, unique emails, owner-guarded mutations).
/// Used by the test suites to drive handlers and routers without a database.
#[derive(Default)]
pub struct MemoryRepository {
    store: Mutex<MemoryStore>,
    /// When true, every operation fails as if the database were unreachable.
    pub should_fail: bool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of a stored course, for assertions.
    pub fn course(&self, id: i32) -> Option<Course> {
        self.lock().courses.iter().find(|c| c.id == id).cloned()
    }

    pub fn course_count(&self) -> usize {
        self.lock().courses.len()
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.should_fail {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.check()?;
        Ok(self.lock().users.iter().find(|u| u.email_address == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.check()?;
        let mut store = self.lock();
        if store.users.iter().any(|u| u.email_address == user.email_address) {
            return Err(RepositoryError::DuplicateEmail);
        }
        store.next_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: store.next_user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email_address: user.email_address,
            password: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        store.users.push(created.clone());
        Ok(created)
    }

    async fn list_courses(&self) -> Result<Vec<CourseRecord>, RepositoryError> {
        self.check()?;
        let store = self.lock();
        Ok(store.courses.iter().filter_map(|c| store.record(c)).collect())
    }

    async fn get_course(&self, id: i32) -> Result<Option<CourseRecord>, RepositoryError> {
        self.check()?;
        let store = self.lock();
        Ok(store
            .courses
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| store.record(c)))
    }

    async fn find_course(&self, id: i32) -> Result<Option<Course>, RepositoryError> {
        self.check()?;
        Ok(self.course(id))
    }

    async fn create_course(&self, fields: CourseFields, owner_id: i32) -> Result<Course, RepositoryError> {
        self.check()?;
        let mut store = self.lock();
        if !store.users.iter().any(|u| u.id == owner_id) {
            // Mirrors the foreign key on courses.user_id.
            return Err(RepositoryError::Database(sqlx::Error::RowNotFound));
        }
        store.next_course_id += 1;
        let now = Utc::now();
        let course = Course {
            id: store.next_course_id,
            title: fields.title,
            description: fields.description,
            estimated_time: fields.estimated_time.flatten(),
            materials_needed: fields.materials_needed.flatten(),
            user_id: owner_id,
            created_at: now,
            updated_at: now,
        };
        store.courses.push(course.clone());
        Ok(course)
    }

    async fn update_course(
        &self,
        id: i32,
        owner_id: i32,
        fields: CourseFields,
    ) -> Result<Option<Course>, RepositoryError> {
        self.check()?;
        let mut store = self.lock();
        let Some(course) = store
            .courses
            .iter_mut()
            .find(|c| c.id == id && c.user_id == owner_id)
        else {
            return Ok(None);
        };
        course.title = fields.title;
        course.description = fields.description;
        if let Some(estimated_time) = fields.estimated_time {
            course.estimated_time = estimated_time;
        }
        if let Some(materials_needed) = fields.materials_needed {
            course.materials_needed = materials_needed;
        }
        course.updated_at = Utc::now();
        Ok(Some(course.clone()))
    }

    async fn delete_course(&self, id: i32, owner_id: i32) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut store = self.lock();
        let before = store.courses.len();
        store.courses.retain(|c| !(c.id == id && c.user_id == owner_id));
        Ok(store.courses.len() < before)
    }
}
