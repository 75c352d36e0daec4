use axum::response::Html;
use axum::{routing::get, Router};

use crate::state::AppState;

/// The monitoring page, embedded at compile time so the binary is
/// self-contained.
const HOME_PAGE: &str = include_str!("../../assets/home.html");

async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home))
}
