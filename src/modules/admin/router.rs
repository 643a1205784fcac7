use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{change_password, create_admin, get_profile, login};

pub fn init_admin_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/create", post(create_admin))
        .route("/profile", get(get_profile))
        .route("/change-password", put(change_password))
}
