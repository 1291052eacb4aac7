use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    extract::JsonBody,
    models::{
        Course, CourseDetailResponse, CourseListResponse, CourseResponse, CreateCourseRequest,
        CurrentUserResponse, FieldValidation, NewUser, RegisterUserRequest, UpdateCourseRequest,
    },
    password,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::{Value, json};

const COURSE: &str = "Course";

/// Course ids are numeric; anything else cannot name an existing course.
fn parse_course_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound(COURSE))
}

/// ensure_owner
///
/// The ownership check: only the user recorded as the course's owner may mutate it.
fn ensure_owner(course: &Course, user: &AuthUser) -> Result<(), ApiError> {
    if course.user_id == user.id {
        Ok(())
    } else {
        tracing::warn!(
            course_id = course.id,
            owner_id = course.user_id,
            user_id = user.id,
            "rejected mutation by non-owner"
        );
        Err(ApiError::Forbidden)
    }
}

// --- Handlers ---

/// welcome
///
/// [Public Route] Friendly greeting for the API root.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Greeting"))
)]
pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the REST API project!" }))
}

/// list_courses
///
/// [Public Route] Every course with its owner's public profile. No pagination.
#[utoipa::path(
    get,
    path = "/courses",
    responses((status = 200, description = "All courses", body = CourseListResponse))
)]
pub async fn list_courses(State(state): State<AppState>) -> Result<Json<CourseListResponse>, ApiError> {
    let courses = state
        .repo
        .list_courses()
        .await?
        .into_iter()
        .map(CourseResponse::from)
        .collect();
    Ok(Json(CourseListResponse { courses }))
}

/// get_course
///
/// [Public Route] A single course with its owner's public profile.
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Found", body = CourseDetailResponse),
        (status = 404, description = "Course Not Found.")
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CourseDetailResponse>, ApiError> {
    let id = parse_course_id(&id)?;
    match state.repo.get_course(id).await? {
        Some(record) => Ok(Json(CourseDetailResponse {
            course: record.into(),
        })),
        None => Err(ApiError::NotFound(COURSE)),
    }
}

/// create_course
///
/// [Authenticated Route] Creates a course owned by the caller.
/// The owner is always the authenticated user; any `userId` in the body is ignored.
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Created", headers(("Location" = String, description = "URI of the new course"))),
        (status = 400, description = "Validation errors"),
        (status = 401, description = "Access Denied")
    )
)]
pub async fn create_course(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate_fields()?;

    let course = state.repo.create_course(payload.into(), user_id).await?;
    tracing::info!(course_id = course.id, user_id, "course created");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/courses/{}", course.id))],
    ))
}

/// update_course
///
/// [Authenticated Route] Replaces a course's content.
///
/// Order of checks: title/description presence (all failures reported together),
/// existence (404), ownership (403), model rules (400). The repository repeats the
/// owner guard inside the UPDATE, so a course deleted in between yields 404.
#[utoipa::path(
    put,
    path = "/courses/{id}",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 204, description = "Updated"),
        (status = 400, description = "Validation errors"),
        (status = 401, description = "Access Denied"),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Course Not Found.")
    )
)]
pub async fn update_course(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateCourseRequest>,
) -> Result<StatusCode, ApiError> {
    let missing = payload.missing_fields();
    if !missing.is_empty() {
        return Err(ApiError::InvalidFields(missing));
    }

    let id = parse_course_id(&id)?;
    let course = state
        .repo
        .find_course(id)
        .await?
        .ok_or(ApiError::NotFound(COURSE))?;
    ensure_owner(&course, &user)?;

    payload.validate_fields()?;

    match state.repo.update_course(id, user.id, payload.into()).await? {
        Some(_) => {
            tracing::info!(course_id = id, user_id = user.id, "course updated");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound(COURSE)),
    }
}

/// delete_course
///
/// [Authenticated Route] Removes a course. Only its owner may do so.
#[utoipa::path(
    delete,
    path = "/courses/{id}",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Access Denied"),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Course Not Found.")
    )
)]
pub async fn delete_course(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_course_id(&id)?;
    let course = state
        .repo
        .find_course(id)
        .await?
        .ok_or(ApiError::NotFound(COURSE))?;
    ensure_owner(&course, &user)?;

    if state.repo.delete_course(id, user.id).await? {
        tracing::info!(course_id = id, user_id = user.id, "course deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(COURSE))
    }
}

/// get_current_user
///
/// [Authenticated Route] The caller's own profile, without id or password.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Profile", body = CurrentUserResponse),
        (status = 401, description = "Access Denied")
    )
)]
pub async fn get_current_user(
    AuthUser {
        first_name,
        last_name,
        email_address,
        ..
    }: AuthUser,
) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        first_name,
        last_name,
        email_address,
    })
}

/// register_user
///
/// [Public Route] Creates an account. The password is hashed before it reaches
/// the repository; the plaintext is dropped at the end of this function.
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", headers(("Location" = String))),
        (status = 400, description = "Validation errors")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate_fields()?;

    let RegisterUserRequest {
        first_name,
        last_name,
        email_address,
        password: plaintext,
    } = payload;

    let password_hash =
        password::hash_password(plaintext.unwrap_or_default(), state.config.bcrypt_cost).await?;

    let user = state
        .repo
        .create_user(NewUser {
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
            email_address: email_address.unwrap_or_default(),
            password_hash,
        })
        .await?;
    tracing::info!(user_id = user.id, "user registered");

    Ok((StatusCode::CREATED, [(header::LOCATION, "/")]))
}

/// route_not_found
///
/// Fallback for any path no router claims.
pub async fn route_not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Route Not Found" })),
    )
}
