use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthAdmin;
use crate::modules::admin::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::pagination::{Pagination, PaginationParams};

use super::model::{
    DateRangeMeta, DateRangeParams, DateRangeResponse, GetStudentParams, NewStudent, SearchParams,
    Student, StudentForm, StudentListResponse, StudentMutationResponse, StudentPatch,
    StudentSummary, parse_date,
};
use super::service::StudentService;

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::InvalidId)
}

/// Register a new student (public)
///
/// Multipart body: the student fields plus a `picture` file field.
#[utoipa::path(
    post,
    path = "/api/students",
    responses(
        (status = 201, description = "Student registered successfully", body = StudentMutationResponse),
        (status = 400, description = "Validation failure or duplicate email", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state, multipart))]
pub async fn create_student(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<StudentMutationResponse>), AppError> {
    let form = StudentForm::from_multipart(multipart).await?;
    let new = NewStudent::from_form(form)?;

    let student = StudentService::create(&state.db, new).await?;

    Ok((
        StatusCode::CREATED,
        Json(StudentMutationResponse {
            message: "Student registered successfully".to_string(),
            student: StudentSummary::from(&student),
        }),
    ))
}

/// List students, newest first
#[utoipa::path(
    get,
    path = "/api/students",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated students", body = StudentListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, _admin))]
pub async fn get_students(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Query(params): Query<PaginationParams>,
) -> Result<Json<StudentListResponse>, AppError> {
    let page = params.page();
    let limit = params.limit();

    let (students, total) = StudentService::list(&state.db, limit, params.offset()).await?;

    Ok(Json(StudentListResponse {
        students: students.into_iter().map(Student::from).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// Search students by text and/or study start window
#[utoipa::path(
    get,
    path = "/api/students/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching students", body = [Student]),
        (status = 400, description = "No search criteria supplied", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, _admin))]
pub async fn search_students(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Student>>, AppError> {
    let q = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    let start_date = params
        .start_date
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_date(s).ok_or_else(|| AppError::validation("Invalid date format")))
        .transpose()?;
    let end_date = params
        .end_date
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_date(s).ok_or_else(|| AppError::validation("Invalid date format")))
        .transpose()?;

    if q.is_none() && start_date.is_none() && end_date.is_none() {
        return Err(AppError::validation("Search parameters are required"));
    }

    let students =
        StudentService::search(&state.db, q, start_date, end_date, params.include_picture).await?;

    Ok(Json(students.into_iter().map(Student::from).collect()))
}

/// Students whose study interval overlaps a date range
#[utoipa::path(
    get,
    path = "/api/students/date-range",
    params(DateRangeParams),
    responses(
        (status = 200, description = "Students overlapping the range", body = DateRangeResponse),
        (status = 400, description = "Missing or invalid bounds", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, _admin))]
pub async fn get_students_by_date_range(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<DateRangeResponse>, AppError> {
    let (Some(start_raw), Some(end_raw)) = (params.start_date.as_deref(), params.end_date.as_deref())
    else {
        return Err(AppError::validation(
            "Both start date and end date are required",
        ));
    };

    let start =
        parse_date(start_raw).ok_or_else(|| AppError::validation("Invalid date format"))?;
    let end = parse_date(end_raw).ok_or_else(|| AppError::validation("Invalid date format"))?;

    if start >= end {
        return Err(AppError::validation("End date must be after start date"));
    }

    let students =
        StudentService::by_date_range(&state.db, start, end, params.include_picture).await?;

    let count = students.len();
    Ok(Json(DateRangeResponse {
        students: students.into_iter().map(Student::from).collect(),
        date_range: DateRangeMeta {
            start_date: start,
            end_date: end,
            count,
        },
    }))
}

/// Get a single student
#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(
        ("id" = String, Path, description = "Student ID"),
        GetStudentParams
    ),
    responses(
        (status = 200, description = "Student record", body = Student),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, _admin))]
pub async fn get_student(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<String>,
    Query(params): Query<GetStudentParams>,
) -> Result<Json<Student>, AppError> {
    let id = parse_id(&id)?;
    let student = StudentService::get_by_id(&state.db, id, params.include_picture).await?;
    Ok(Json(Student::from(student)))
}

/// Serve a student's photo as raw image bytes
#[utoipa::path(
    get,
    path = "/api/students/{id}/image",
    params(("id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Raw image bytes", content_type = "image/*"),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_student_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let (bytes, mime_type) = StudentService::get_image(&state.db, id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, mime_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=86400".to_string(),
            ),
        ],
        bytes,
    ))
}

/// Partially update a student
///
/// Multipart body; only the supplied fields change. The photo is replaced
/// only when a new `picture` file is uploaded.
#[utoipa::path(
    put,
    path = "/api/students/{id}",
    params(("id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student updated successfully", body = StudentMutationResponse),
        (status = 400, description = "Validation failure or duplicate email", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, _admin, multipart))]
pub async fn update_student(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<StudentMutationResponse>, AppError> {
    let id = parse_id(&id)?;

    let form = StudentForm::from_multipart(multipart).await?;
    let patch = StudentPatch::from_form(form)?;

    let student = StudentService::update(&state.db, id, patch).await?;

    Ok(Json(StudentMutationResponse {
        message: "Student updated successfully".to_string(),
        student: StudentSummary::from(&student),
    }))
}

/// Delete a student
#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(("id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student deleted successfully"),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, _admin))]
pub async fn delete_student(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = parse_id(&id)?;
    StudentService::delete(&state.db, id).await?;
    Ok(Json(
        serde_json::json!({ "message": "Student deleted successfully" }),
    ))
}
