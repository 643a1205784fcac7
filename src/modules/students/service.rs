use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::utils::errors::AppError;
use crate::utils::image;

use super::model::{NewStudent, StudentPatch, StudentRow, validate_date_order};

// The inline picture payload is only selected when the caller explicitly
// asks for it; every other read path projects it out.
const COLUMNS: &str = "id, name, fathers_name, email, mobile, age, study_start_date, \
     study_end_date, NULL::text AS picture, picture_mime_type, feedback, address, \
     created_at, updated_at";

const COLUMNS_WITH_PICTURE: &str = "id, name, fathers_name, email, mobile, age, \
     study_start_date, study_end_date, picture, picture_mime_type, feedback, address, \
     created_at, updated_at";

fn columns(include_picture: bool) -> &'static str {
    if include_picture { COLUMNS_WITH_PICTURE } else { COLUMNS }
}

// ILIKE treats `%`, `_` and `\` as pattern syntax; escape them so a query
// like "100%" only matches records literally containing "100%".
fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn duplicate_email_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::already_exists("Student with this email already exists");
        }
    }
    AppError::from(e)
}

pub struct StudentService;

impl StudentService {
    /// Persists a validated registration. The friendly pre-check and the
    /// unique index translation report the same conflict, so the
    /// read-then-write race cannot create a duplicate.
    #[instrument(skip(db, new))]
    pub async fn create(db: &PgPool, new: NewStudent) -> Result<StudentRow, AppError> {
        let existing =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM students WHERE email = $1")
                .bind(&new.email)
                .fetch_optional(db)
                .await?;

        if existing.is_some() {
            return Err(AppError::already_exists(
                "Student with this email already exists",
            ));
        }

        let encoded_picture = image::encode(&new.picture.bytes);

        let student = sqlx::query_as::<_, StudentRow>(&format!(
            "INSERT INTO students (name, fathers_name, email, mobile, age, study_start_date, \
             study_end_date, picture, picture_mime_type, feedback, address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {}",
            COLUMNS
        ))
        .bind(&new.name)
        .bind(&new.fathers_name)
        .bind(&new.email)
        .bind(&new.mobile)
        .bind(new.age)
        .bind(new.study_start_date)
        .bind(new.study_end_date)
        .bind(&encoded_picture)
        .bind(&new.picture.mime_type)
        .bind(&new.feedback)
        .bind(&new.address)
        .fetch_one(db)
        .await
        .map_err(duplicate_email_error)?;

        Ok(student)
    }

    /// Newest-first page of students, picture payload excluded.
    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<StudentRow>, i64), AppError> {
        let students = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {} FROM students ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
            .fetch_one(db)
            .await?;

        Ok((students, total))
    }

    #[instrument(skip(db))]
    pub async fn get_by_id(
        db: &PgPool,
        id: Uuid,
        include_picture: bool,
    ) -> Result<StudentRow, AppError> {
        sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {} FROM students WHERE id = $1",
            columns(include_picture)
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))
    }

    /// Decodes the stored picture back to raw bytes for direct transfer.
    #[instrument(skip(db))]
    pub async fn get_image(db: &PgPool, id: Uuid) -> Result<(Vec<u8>, String), AppError> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT picture, picture_mime_type FROM students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))?;

        let (encoded, mime_type) = row;
        Ok((image::decode(&encoded)?, mime_type))
    }

    /// Case-insensitive substring search over name/email/mobile/fathersName,
    /// independently combinable with a study-start-date window.
    #[instrument(skip(db))]
    pub async fn search(
        db: &PgPool,
        q: Option<&str>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        include_picture: bool,
    ) -> Result<Vec<StudentRow>, AppError> {
        let students = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {} FROM students \
             WHERE ($1::text IS NULL \
                    OR name ILIKE '%' || $1 || '%' \
                    OR email ILIKE '%' || $1 || '%' \
                    OR mobile ILIKE '%' || $1 || '%' \
                    OR fathers_name ILIKE '%' || $1 || '%') \
               AND ($2::date IS NULL OR study_start_date >= $2) \
               AND ($3::date IS NULL OR study_start_date <= $3) \
             ORDER BY created_at DESC",
            columns(include_picture)
        ))
        .bind(q.map(escape_like))
        .bind(start_date)
        .bind(end_date)
        .fetch_all(db)
        .await?;

        Ok(students)
    }

    /// Students whose study interval overlaps [start, end]: their start falls
    /// in range, their end falls in range, or they span the whole range.
    #[instrument(skip(db))]
    pub async fn by_date_range(
        db: &PgPool,
        start: NaiveDate,
        end: NaiveDate,
        include_picture: bool,
    ) -> Result<Vec<StudentRow>, AppError> {
        let students = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {} FROM students \
             WHERE (study_start_date BETWEEN $1 AND $2) \
                OR (study_end_date BETWEEN $1 AND $2) \
                OR (study_start_date <= $1 AND study_end_date >= $2) \
             ORDER BY study_start_date ASC",
            columns(include_picture)
        ))
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?;

        Ok(students)
    }

    /// Applies a partial update. Date ordering is re-validated across
    /// whichever of the old/new start and end dates apply.
    #[instrument(skip(db, patch))]
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        patch: StudentPatch,
    ) -> Result<StudentRow, AppError> {
        let existing = Self::get_by_id(db, id, false).await?;

        if let Some(email) = &patch.email {
            if *email != existing.email {
                let taken = sqlx::query_scalar::<_, Uuid>(
                    "SELECT id FROM students WHERE email = $1 AND id <> $2",
                )
                .bind(email)
                .bind(id)
                .fetch_optional(db)
                .await?;

                if taken.is_some() {
                    return Err(AppError::already_exists(
                        "Student with this email already exists",
                    ));
                }
            }
        }

        let study_start_date = patch.study_start_date.unwrap_or(existing.study_start_date);
        let study_end_date = patch.study_end_date.unwrap_or(existing.study_end_date);
        validate_date_order(study_start_date, study_end_date)?;

        let name = patch.name.unwrap_or(existing.name);
        let fathers_name = patch.fathers_name.unwrap_or(existing.fathers_name);
        let email = patch.email.unwrap_or(existing.email);
        let mobile = patch.mobile.unwrap_or(existing.mobile);
        let age = patch.age.unwrap_or(existing.age);
        let feedback = patch.feedback.unwrap_or(existing.feedback);
        let address = patch.address.unwrap_or(existing.address);

        let updated = if let Some(picture) = patch.picture {
            let encoded = image::encode(&picture.bytes);
            sqlx::query_as::<_, StudentRow>(&format!(
                "UPDATE students SET name = $1, fathers_name = $2, email = $3, mobile = $4, \
                 age = $5, study_start_date = $6, study_end_date = $7, feedback = $8, \
                 address = $9, picture = $10, picture_mime_type = $11, updated_at = NOW() \
                 WHERE id = $12 RETURNING {}",
                COLUMNS
            ))
            .bind(&name)
            .bind(&fathers_name)
            .bind(&email)
            .bind(&mobile)
            .bind(age)
            .bind(study_start_date)
            .bind(study_end_date)
            .bind(&feedback)
            .bind(&address)
            .bind(&encoded)
            .bind(&picture.mime_type)
            .bind(id)
            .fetch_one(db)
            .await
        } else {
            sqlx::query_as::<_, StudentRow>(&format!(
                "UPDATE students SET name = $1, fathers_name = $2, email = $3, mobile = $4, \
                 age = $5, study_start_date = $6, study_end_date = $7, feedback = $8, \
                 address = $9, updated_at = NOW() \
                 WHERE id = $10 RETURNING {}",
                COLUMNS
            ))
            .bind(&name)
            .bind(&fathers_name)
            .bind(&email)
            .bind(&mobile)
            .bind(age)
            .bind(study_start_date)
            .bind(study_end_date)
            .bind(&feedback)
            .bind(&address)
            .bind(id)
            .fetch_one(db)
            .await
        }
        .map_err(duplicate_email_error)?;

        Ok(updated)
    }

    /// Removes the record. The picture is stored inline, so no separate
    /// cleanup step exists to fail halfway.
    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Student not found"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("%_\\"), "\\%\\_\\\\");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(escape_like("asha rao"), "asha rao");
        assert_eq!(escape_like(""), "");
        assert_eq!(escape_like("a.b+c@example.com"), "a.b+c@example.com");
    }
}
