use axum::extract::Multipart;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::utils::duration::{StudyDuration, study_duration};
use crate::utils::errors::AppError;
use crate::utils::image;
use crate::utils::pagination::Pagination;

const MAX_NAME_LEN: usize = 100;
const MAX_FEEDBACK_LEN: usize = 1000;
const MAX_ADDRESS_LEN: usize = 500;

/// Database row. `picture` is `None` when the read path projected the
/// payload out to bound response size.
#[derive(Debug, sqlx::FromRow)]
pub struct StudentRow {
    pub id: Uuid,
    pub name: String,
    pub fathers_name: String,
    pub email: String,
    pub mobile: String,
    pub age: i32,
    pub study_start_date: NaiveDate,
    pub study_end_date: NaiveDate,
    pub picture: Option<String>,
    pub picture_mime_type: String,
    pub feedback: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Student as exposed to clients. `studyDuration` is derived from the study
/// interval on every read; `picture` is a `data:` URL, present only when the
/// caller opted in.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub fathers_name: String,
    pub email: String,
    pub mobile: String,
    pub age: i32,
    pub study_start_date: NaiveDate,
    pub study_end_date: NaiveDate,
    pub study_duration: StudyDuration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub feedback: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Self {
            study_duration: study_duration(row.study_start_date, row.study_end_date),
            picture: row
                .picture
                .map(|encoded| image::to_data_url(&row.picture_mime_type, &encoded)),
            id: row.id,
            name: row.name,
            fathers_name: row.fathers_name,
            email: row.email,
            mobile: row.mobile,
            age: row.age,
            study_start_date: row.study_start_date,
            study_end_date: row.study_end_date,
            feedback: row.feedback,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub study_duration: StudyDuration,
    pub created_at: DateTime<Utc>,
}

impl From<&StudentRow> for StudentSummary {
    fn from(row: &StudentRow) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            email: row.email.clone(),
            study_duration: study_duration(row.study_start_date, row.study_end_date),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentMutationResponse {
    pub message: String,
    pub student: StudentSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentListResponse {
    pub students: Vec<Student>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeMeta {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeResponse {
    pub students: Vec<Student>,
    pub date_range: DateRangeMeta,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct GetStudentParams {
    #[serde(default)]
    pub include_picture: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub include_picture: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub include_picture: bool,
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Raw multipart submission. Every field is present-or-absent; validation
/// happens in [`NewStudent::from_form`] / [`StudentPatch::from_form`].
#[derive(Debug, Default)]
pub struct StudentForm {
    pub name: Option<String>,
    pub fathers_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub age: Option<String>,
    pub study_start_date: Option<String>,
    pub study_end_date: Option<String>,
    pub feedback: Option<String>,
    pub address: Option<String>,
    pub picture: Option<UploadedImage>,
}

impl StudentForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation(format!("Malformed multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "picture" {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Failed to read picture: {}", e)))?
                    .to_vec();
                if !bytes.is_empty() {
                    form.picture = Some(UploadedImage { bytes, mime_type });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::validation(format!("Failed to read field: {}", e)))?;

            match name.as_str() {
                "name" => form.name = Some(value),
                "fathersName" => form.fathers_name = Some(value),
                "email" => form.email = Some(value),
                "mobile" => form.mobile = Some(value),
                "age" => form.age = Some(value),
                "studyStartDate" => form.study_start_date = Some(value),
                "studyEndDate" => form.study_end_date = Some(value),
                "feedback" => form.feedback = Some(value),
                "address" => form.address = Some(value),
                // Unknown fields are ignored rather than rejected.
                _ => {}
            }
        }

        Ok(form)
    }
}

/// A fully validated registration, ready to persist.
#[derive(Debug)]
pub struct NewStudent {
    pub name: String,
    pub fathers_name: String,
    pub email: String,
    pub mobile: String,
    pub age: i32,
    pub study_start_date: NaiveDate,
    pub study_end_date: NaiveDate,
    pub feedback: String,
    pub address: String,
    pub picture: UploadedImage,
}

impl NewStudent {
    pub fn from_form(form: StudentForm) -> Result<Self, AppError> {
        let mut missing: Vec<&'static str> = Vec::new();

        let name = required(&form.name, "name", &mut missing);
        let fathers_name = required(&form.fathers_name, "fathersName", &mut missing);
        let email = required(&form.email, "email", &mut missing);
        let mobile = required(&form.mobile, "mobile", &mut missing);
        let age = required(&form.age, "age", &mut missing);
        let start = required(&form.study_start_date, "studyStartDate", &mut missing);
        let end = required(&form.study_end_date, "studyEndDate", &mut missing);
        let feedback = required(&form.feedback, "feedback", &mut missing);
        let address = required(&form.address, "address", &mut missing);

        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }

        // All unwraps below are guarded by the emptiness check above.
        let name = name.unwrap();
        let fathers_name = fathers_name.unwrap();
        let email = email.unwrap();
        let mobile = mobile.unwrap();
        let age = age.unwrap();
        let start = start.unwrap();
        let end = end.unwrap();
        let feedback = feedback.unwrap();
        let address = address.unwrap();

        let picture = form
            .picture
            .ok_or_else(|| AppError::validation("Picture is required"))?;
        validate_picture(&picture)?;

        let age = parse_age(&age)?;
        let study_start_date =
            parse_date(&start).ok_or_else(|| AppError::validation("Invalid study start date"))?;
        let study_end_date =
            parse_date(&end).ok_or_else(|| AppError::validation("Invalid study end date"))?;
        validate_date_order(study_start_date, study_end_date)?;

        let email = validate_email(&email)?;
        let mobile = validate_mobile(&mobile)?;
        validate_lengths(Some(&name), Some(&fathers_name), Some(&feedback), Some(&address))?;

        Ok(Self {
            name,
            fathers_name,
            email,
            mobile,
            age,
            study_start_date,
            study_end_date,
            feedback,
            address,
            picture,
        })
    }
}

/// Partial update. A field is changed only when it was present in the
/// request, so a legitimately empty value is distinguishable from "not
/// provided".
#[derive(Debug, Default)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub fathers_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub age: Option<i32>,
    pub study_start_date: Option<NaiveDate>,
    pub study_end_date: Option<NaiveDate>,
    pub feedback: Option<String>,
    pub address: Option<String>,
    pub picture: Option<UploadedImage>,
}

impl StudentPatch {
    pub fn from_form(form: StudentForm) -> Result<Self, AppError> {
        let age = form.age.as_deref().map(parse_age).transpose()?;

        let study_start_date = form
            .study_start_date
            .as_deref()
            .map(|s| parse_date(s).ok_or_else(|| AppError::validation("Invalid study start date")))
            .transpose()?;
        let study_end_date = form
            .study_end_date
            .as_deref()
            .map(|s| parse_date(s).ok_or_else(|| AppError::validation("Invalid study end date")))
            .transpose()?;

        let email = form
            .email
            .as_deref()
            .map(validate_email)
            .transpose()?;
        let mobile = form
            .mobile
            .as_deref()
            .map(validate_mobile)
            .transpose()?;

        let name = form.name.map(|s| s.trim().to_string());
        let fathers_name = form.fathers_name.map(|s| s.trim().to_string());
        let feedback = form.feedback.map(|s| s.trim().to_string());
        let address = form.address.map(|s| s.trim().to_string());

        validate_lengths(
            name.as_deref(),
            fathers_name.as_deref(),
            feedback.as_deref(),
            address.as_deref(),
        )?;

        if let Some(picture) = &form.picture {
            validate_picture(picture)?;
        }

        let patch = Self {
            name,
            fathers_name,
            email,
            mobile,
            age,
            study_start_date,
            study_end_date,
            feedback,
            address,
            picture: form.picture,
        };

        if patch.is_empty() {
            return Err(AppError::validation("No fields provided to update"));
        }

        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.fathers_name.is_none()
            && self.email.is_none()
            && self.mobile.is_none()
            && self.age.is_none()
            && self.study_start_date.is_none()
            && self.study_end_date.is_none()
            && self.feedback.is_none()
            && self.address.is_none()
            && self.picture.is_none()
    }
}

/// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp from which the date part
/// is taken.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

pub fn validate_date_order(start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::validation(
            "Study end date must be after start date",
        ));
    }
    Ok(())
}

fn required(
    value: &Option<String>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            missing.push(field);
            None
        }
    }
}

fn parse_age(s: &str) -> Result<i32, AppError> {
    s.trim()
        .parse::<i32>()
        .ok()
        .filter(|age| (1..=100).contains(age))
        .ok_or_else(|| AppError::validation("Age must be between 1 and 100"))
}

fn validate_email(s: &str) -> Result<String, AppError> {
    let email = s.trim().to_lowercase();
    if !email.validate_email() {
        return Err(AppError::validation("Please enter a valid email address"));
    }
    Ok(email)
}

fn validate_mobile(s: &str) -> Result<String, AppError> {
    let mobile: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if mobile.len() != 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("Mobile number should be 10 digits"));
    }
    Ok(mobile)
}

fn validate_picture(picture: &UploadedImage) -> Result<(), AppError> {
    if !picture.mime_type.starts_with("image/") {
        return Err(AppError::validation("Only image uploads are allowed"));
    }
    Ok(())
}

fn validate_lengths(
    name: Option<&str>,
    fathers_name: Option<&str>,
    feedback: Option<&str>,
    address: Option<&str>,
) -> Result<(), AppError> {
    let mut details = Vec::new();

    if name.is_some_and(|s| s.chars().count() > MAX_NAME_LEN) {
        details.push("Name cannot exceed 100 characters".to_string());
    }
    if fathers_name.is_some_and(|s| s.chars().count() > MAX_NAME_LEN) {
        details.push("Father's name cannot exceed 100 characters".to_string());
    }
    if feedback.is_some_and(|s| s.chars().count() > MAX_FEEDBACK_LEN) {
        details.push("Feedback cannot exceed 1000 characters".to_string());
    }
    if address.is_some_and(|s| s.chars().count() > MAX_ADDRESS_LEN) {
        details.push("Address cannot exceed 500 characters".to_string());
    }

    if !details.is_empty() {
        return Err(AppError::ValidationDetails(details));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picture() -> UploadedImage {
        UploadedImage {
            bytes: vec![0xff, 0xd8, 0xff],
            mime_type: "image/jpeg".to_string(),
        }
    }

    fn full_form() -> StudentForm {
        StudentForm {
            name: Some("Asha Rao".to_string()),
            fathers_name: Some("Vikram Rao".to_string()),
            email: Some("Asha.Rao@Example.com ".to_string()),
            mobile: Some("98765 43210".to_string()),
            age: Some("21".to_string()),
            study_start_date: Some("2024-01-01".to_string()),
            study_end_date: Some("2024-01-31".to_string()),
            feedback: Some("Great course".to_string()),
            address: Some("12 Lake View Road".to_string()),
            picture: Some(picture()),
        }
    }

    #[test]
    fn valid_form_passes() {
        let student = NewStudent::from_form(full_form()).unwrap();
        assert_eq!(student.email, "asha.rao@example.com");
        assert_eq!(student.mobile, "9876543210");
        assert_eq!(student.age, 21);
    }

    #[test]
    fn missing_fields_are_listed_exactly() {
        let mut form = full_form();
        form.mobile = None;
        form.feedback = Some("   ".to_string()); // whitespace-only counts as missing

        let err = NewStudent::from_form(form).unwrap_err();
        match err {
            AppError::MissingFields(fields) => {
                assert_eq!(fields, vec!["mobile", "feedback"]);
            }
            other => panic!("expected MissingFields, got {:?}", other),
        }
    }

    #[test]
    fn picture_is_required() {
        let mut form = full_form();
        form.picture = None;

        let err = NewStudent::from_form(form).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Picture is required"));
    }

    #[test]
    fn non_image_upload_rejected() {
        let mut form = full_form();
        form.picture = Some(UploadedImage {
            bytes: vec![1, 2, 3],
            mime_type: "application/pdf".to_string(),
        });
        assert!(NewStudent::from_form(form).is_err());
    }

    #[test]
    fn age_bounds() {
        for bad in ["0", "101", "-5", "abc", "12.5"] {
            let mut form = full_form();
            form.age = Some(bad.to_string());
            let err = NewStudent::from_form(form).unwrap_err();
            assert!(
                matches!(&err, AppError::Validation(msg) if msg == "Age must be between 1 and 100"),
                "age {:?} should be rejected",
                bad
            );
        }

        for good in ["1", "100", " 50 "] {
            let mut form = full_form();
            form.age = Some(good.to_string());
            assert!(NewStudent::from_form(form).is_ok(), "age {:?}", good);
        }
    }

    #[test]
    fn end_date_must_be_after_start() {
        let mut form = full_form();
        form.study_end_date = Some("2024-01-01".to_string()); // equal to start
        let err = NewStudent::from_form(form).unwrap_err();
        assert!(
            matches!(&err, AppError::Validation(msg) if msg == "Study end date must be after start date")
        );

        let mut form = full_form();
        form.study_end_date = Some("2023-12-31".to_string());
        assert!(NewStudent::from_form(form).is_err());
    }

    #[test]
    fn unparseable_dates_rejected() {
        let mut form = full_form();
        form.study_start_date = Some("January 1st".to_string());
        assert!(NewStudent::from_form(form).is_err());
    }

    #[test]
    fn rfc3339_dates_accepted() {
        let mut form = full_form();
        form.study_start_date = Some("2024-01-01T00:00:00Z".to_string());
        let student = NewStudent::from_form(form).unwrap();
        assert_eq!(
            student.study_start_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn mobile_must_be_ten_digits() {
        for bad in ["12345", "12345678901", "98765abcde", "+919876543210"] {
            let mut form = full_form();
            form.mobile = Some(bad.to_string());
            assert!(NewStudent::from_form(form).is_err(), "mobile {:?}", bad);
        }

        // Whitespace is stripped before the digit check.
        let mut form = full_form();
        form.mobile = Some(" 98 76 54 32 10 ".to_string());
        assert_eq!(NewStudent::from_form(form).unwrap().mobile, "9876543210");
    }

    #[test]
    fn invalid_email_rejected() {
        let mut form = full_form();
        form.email = Some("not-an-email".to_string());
        assert!(NewStudent::from_form(form).is_err());
    }

    #[test]
    fn over_length_fields_reported_as_details() {
        let mut form = full_form();
        form.name = Some("x".repeat(101));
        form.address = Some("y".repeat(501));

        let err = NewStudent::from_form(form).unwrap_err();
        match err {
            AppError::ValidationDetails(details) => {
                assert_eq!(details.len(), 2);
                assert!(details[0].contains("Name"));
                assert!(details[1].contains("Address"));
            }
            other => panic!("expected ValidationDetails, got {:?}", other),
        }
    }

    #[test]
    fn patch_only_carries_supplied_fields() {
        let form = StudentForm {
            mobile: Some("0123456789".to_string()),
            ..Default::default()
        };
        let patch = StudentPatch::from_form(form).unwrap();

        assert_eq!(patch.mobile.as_deref(), Some("0123456789"));
        assert!(patch.name.is_none());
        assert!(patch.age.is_none());
        assert!(!patch.is_empty());
    }

    #[test]
    fn patch_revalidates_changed_fields() {
        let form = StudentForm {
            age: Some("250".to_string()),
            ..Default::default()
        };
        assert!(StudentPatch::from_form(form).is_err());

        let form = StudentForm {
            study_end_date: Some("not a date".to_string()),
            ..Default::default()
        };
        assert!(StudentPatch::from_form(form).is_err());
    }

    #[test]
    fn empty_patch_rejected() {
        let err = StudentPatch::from_form(StudentForm::default()).unwrap_err();
        assert!(
            matches!(&err, AppError::Validation(msg) if msg == "No fields provided to update")
        );
    }

    #[test]
    fn parse_date_formats() {
        assert_eq!(
            parse_date("2024-06-15"),
            NaiveDate::from_ymd_opt(2024, 6, 15)
        );
        assert_eq!(
            parse_date("2024-06-15T10:30:00+05:30"),
            NaiveDate::from_ymd_opt(2024, 6, 15)
        );
        assert_eq!(parse_date("15/06/2024"), None);
        assert_eq!(parse_date(""), None);
    }
}
