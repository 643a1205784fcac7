use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::admin::controller::ErrorResponse;
use crate::modules::admin::model::{
    Admin, AdminCreatedResponse, ChangePasswordRequest, CreateAdminRequest, LoginRequest,
    LoginResponse, MessageResponse, ProfileResponse,
};
use crate::modules::students::model::{
    DateRangeMeta, DateRangeResponse, Student, StudentListResponse, StudentMutationResponse,
    StudentSummary,
};
use crate::utils::duration::StudyDuration;
use crate::utils::pagination::Pagination;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::admin::controller::login,
        crate::modules::admin::controller::create_admin,
        crate::modules::admin::controller::get_profile,
        crate::modules::admin::controller::change_password,
        crate::modules::students::controller::create_student,
        crate::modules::students::controller::get_students,
        crate::modules::students::controller::search_students,
        crate::modules::students::controller::get_students_by_date_range,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::get_student_image,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::delete_student,
    ),
    components(schemas(
        Admin,
        AdminCreatedResponse,
        ChangePasswordRequest,
        CreateAdminRequest,
        LoginRequest,
        LoginResponse,
        MessageResponse,
        ProfileResponse,
        ErrorResponse,
        Student,
        StudentSummary,
        StudentMutationResponse,
        StudentListResponse,
        DateRangeMeta,
        DateRangeResponse,
        StudyDuration,
        Pagination,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Admin", description = "Admin authentication and account management"),
        (name = "Students", description = "Student registration and lifecycle")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
