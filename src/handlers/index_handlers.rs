use crate::state::AppState;
use axum::{extract::State, response::Html};

/// `GET /` — the upload form.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.landing.html().to_owned())
}
