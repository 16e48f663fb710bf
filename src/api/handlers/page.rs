use axum::{extract::State, response::Html, Form};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::render;
use crate::services::QueryPipeline;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QueryPipeline>,
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
    /// Checkbox: present when ticked, absent otherwise
    #[serde(default)]
    pub voice: Option<String>,
}

impl AskForm {
    pub fn voice_enabled(&self) -> bool {
        self.voice.is_some()
    }
}

/// Empty page
pub async fn index() -> Html<String> {
    Html(render::page("", false, ""))
}

/// Answer a submitted question
pub async fn ask(State(state): State<AppState>, Form(form): Form<AskForm>) -> Html<String> {
    let question = form.question.trim();
    let voice_enabled = form.voice_enabled();

    if question.is_empty() {
        return Html(render::page("", voice_enabled, &render::warning("Please enter a question.")));
    }

    let run = state.pipeline.answer(question, voice_enabled).await;
    tracing::info!(
        run_id = %run.id,
        stage = %run.stage,
        degraded = run.is_degraded(),
        "Question answered"
    );

    Html(render::page(question, voice_enabled, &render::run(&run)))
}
