use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_student, delete_student, get_student, get_student_image, get_students,
    get_students_by_date_range, search_students, update_student,
};

// Uploaded photos top out at 5 MB; the limit leaves headroom for the
// other multipart fields.
const MAX_UPLOAD_BYTES: usize = 6 * 1024 * 1024;

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_student).get(get_students))
        .route("/search", get(search_students))
        .route("/date-range", get(get_students_by_date_range))
        .route(
            "/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/{id}/image", get(get_student_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
