use rollbook::utils::password::hash_password;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_test_admin(pool: &PgPool, email: &str, password: &str) -> Uuid {
    let hashed = hash_password(password).unwrap();

    sqlx::query_scalar::<_, Uuid>("INSERT INTO admins (email, password) VALUES ($1, $2) RETURNING id")
        .bind(email)
        .bind(&hashed)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub fn generate_unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4())
}
