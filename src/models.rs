use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::error::ApiError;

// --- Persisted Rows (Mapped to Database) ---

/// User
///
/// A row of the `users` table. Deliberately not `Serialize`: the password hash
/// must never reach a response body, so every outgoing shape is a separate view.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    // bcrypt hash, never the plaintext.
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Course
///
/// A bare row of the `courses` table. Used where only ownership matters.
#[derive(Debug, Clone, FromRow)]
pub struct Course {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
    // FK to users.id, fixed at creation.
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// CourseRecord
///
/// A course joined with its owner's public columns. The owner columns are
/// aliased with an `owner_` prefix in the SQL to avoid clashing with the course's own `id`.
#[derive(Debug, Clone, FromRow)]
pub struct CourseRecord {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
    pub user_id: i32,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub owner_email_address: String,
}

/// NewUser
///
/// A validated registration with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub password_hash: String,
}

/// CourseFields
///
/// Validated course content handed to the repository on create and update.
/// It carries no owner: the owner always comes from the authenticated identity.
///
/// The optional columns are tri-state. `None` leaves the stored value alone on
/// update, `Some(None)` writes NULL and `Some(Some(v))` writes `v`. On create
/// both `None` and `Some(None)` store NULL.
#[derive(Debug, Clone, Default)]
pub struct CourseFields {
    pub title: String,
    pub description: String,
    pub estimated_time: Option<Option<String>>,
    pub materials_needed: Option<Option<String>>,
}

// --- Request Payloads (Input Schemas) ---

/// FieldValidation
///
/// Runs the `validator` rules of a payload and flattens every failing rule into
/// one human-readable message list, ordered by the payload's field declaration order.
pub trait FieldValidation: Validate {
    /// Field names in declaration order.
    const FIELDS: &'static [&'static str];

    fn validate_fields(&self) -> Result<(), ApiError> {
        self.validate()
            .map_err(|errors| ApiError::Validation(validation_messages(&errors, Self::FIELDS)))
    }
}

/// Collects the messages of `errors`, visiting fields in the order given.
pub fn validation_messages(errors: &ValidationErrors, fields: &[&str]) -> Vec<String> {
    let by_field = errors.field_errors();
    fields
        .iter()
        .filter_map(|field| by_field.get(*field).map(|errs| (*field, errs)))
        .flat_map(|(field, errs)| {
            errs.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect()
}

/// Whitespace-only strings count as empty.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

fn email_format(value: &str) -> Result<(), ValidationError> {
    if !value.validate_email() {
        return Err(ValidationError::new("email"));
    }
    Ok(())
}

/// Keeps an explicit `null` apart from an absent key: absent stays `None` via
/// `#[serde(default)]`, `null` becomes `Some(None)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// RegisterUserRequest
///
/// Input payload for POST /users. Every field is optional at the JSON level so
/// that a missing field surfaces as a validation message instead of a parse error.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterUserRequest {
    #[validate(
        required(message = "Please provide your first name."),
        custom(function = "not_blank", message = "Please provide your first name."),
        length(max = 255, message = "First name must be at most 255 characters.")
    )]
    pub first_name: Option<String>,

    #[validate(
        required(message = "Please provide your last name."),
        custom(function = "not_blank", message = "Please provide your last name."),
        length(max = 255, message = "Last name must be at most 255 characters.")
    )]
    pub last_name: Option<String>,

    #[validate(
        required(message = "Please provide an Email."),
        custom(function = "not_blank", message = "Please provide an Email."),
        custom(function = "email_format", message = "Please provide a valid Email."),
        length(max = 255, message = "Email must be at most 255 characters.")
    )]
    pub email_address: Option<String>,

    #[validate(
        required(message = "Please provide a Password"),
        custom(function = "not_blank", message = "Please provide a Password")
    )]
    pub password: Option<String>,
}

impl FieldValidation for RegisterUserRequest {
    const FIELDS: &'static [&'static str] = &["first_name", "last_name", "email_address", "password"];
}

/// CreateCourseRequest
///
/// Input payload for POST /courses. Any `userId` in the body is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateCourseRequest {
    #[validate(
        required(message = "Please provide an Title."),
        custom(function = "not_blank", message = "Please provide an Title.")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Please provide a Description."),
        custom(function = "not_blank", message = "Please provide a Description.")
    )]
    pub description: Option<String>,

    #[validate(length(max = 255, message = "Estimated time must be at most 255 characters."))]
    pub estimated_time: Option<String>,

    #[validate(length(max = 255, message = "Materials needed must be at most 255 characters."))]
    pub materials_needed: Option<String>,
}

impl FieldValidation for CreateCourseRequest {
    const FIELDS: &'static [&'static str] = &["title", "description", "estimated_time", "materials_needed"];
}

impl From<CreateCourseRequest> for CourseFields {
    fn from(req: CreateCourseRequest) -> Self {
        Self {
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            estimated_time: Some(req.estimated_time),
            materials_needed: Some(req.materials_needed),
        }
    }
}

/// UpdateCourseRequest
///
/// Input payload for PUT /courses/{id}. Title and description must be resent on
/// every update. An optional field is left alone when its key is absent and
/// cleared when it is sent as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateCourseRequest {
    #[validate(
        required(message = "Please provide an Title."),
        custom(function = "not_blank", message = "Please provide an Title.")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Please provide a Description."),
        custom(function = "not_blank", message = "Please provide a Description.")
    )]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 255, message = "Estimated time must be at most 255 characters."))]
    pub estimated_time: Option<Option<String>>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 255, message = "Materials needed must be at most 255 characters."))]
    pub materials_needed: Option<Option<String>>,
}

impl FieldValidation for UpdateCourseRequest {
    const FIELDS: &'static [&'static str] = &["title", "description", "estimated_time", "materials_needed"];
}

impl UpdateCourseRequest {
    /// Presence check run before storage is touched. Reports every failing field at once.
    pub fn missing_fields(&self) -> Vec<String> {
        let absent = |value: &Option<String>| value.as_deref().is_none_or(str::is_empty);

        let mut messages = Vec::new();
        if absent(&self.title) {
            messages.push("Title is not valid.".to_string());
        }
        if absent(&self.description) {
            messages.push("Description is not valid.".to_string());
        }
        messages
    }
}

impl From<UpdateCourseRequest> for CourseFields {
    fn from(req: UpdateCourseRequest) -> Self {
        Self {
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            estimated_time: req.estimated_time,
            materials_needed: req.materials_needed,
        }
    }
}

// --- Response Views (Output Schemas) ---

/// UserProfile
///
/// The public face of a course owner. Never includes the password hash or timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

/// CurrentUserResponse
///
/// Output of GET /users: the authenticated user's own non-sensitive fields.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CurrentUserResponse {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

/// CourseResponse
///
/// A course as rendered to clients, with its owner embedded under `user`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CourseResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
    pub user_id: i32,
    pub user: UserProfile,
}

impl From<CourseRecord> for CourseResponse {
    fn from(rec: CourseRecord) -> Self {
        Self {
            id: rec.id,
            title: rec.title,
            description: rec.description,
            estimated_time: rec.estimated_time,
            materials_needed: rec.materials_needed,
            user_id: rec.user_id,
            user: UserProfile {
                id: rec.user_id,
                first_name: rec.owner_first_name,
                last_name: rec.owner_last_name,
                email_address: rec.owner_email_address,
            },
        }
    }
}

/// CourseListResponse
///
/// Envelope for GET /courses.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CourseListResponse {
    pub courses: Vec<CourseResponse>,
}

/// CourseDetailResponse
///
/// Envelope for GET /courses/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CourseDetailResponse {
    pub course: CourseResponse,
}
