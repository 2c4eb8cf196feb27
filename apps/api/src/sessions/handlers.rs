//! Axum route handlers for the crossword API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::puzzle::{Bounds, Candidate, Placement, Puzzle};
use crate::sessions::SessionId;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Both fields are optional; the configured defaults fill the gaps.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    pub count: Option<i64>,
    pub seed: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub session_id: SessionId,
    pub words: Vec<Placement>,
    pub first_letter_candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandRequest {
    pub session_id: SessionId,
    pub bounds: Bounds,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandResponse {
    pub new_words: Vec<Placement>,
    pub total_words: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub words: Vec<Placement>,
    pub first_letter_candidates: Vec<Candidate>,
    pub total_words: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/generate?count=&seed=
pub async fn handle_generate_query(
    State(state): State<AppState>,
    AppQuery(request): AppQuery<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate(state, request).await.map(Json)
}

/// POST /api/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    AppJson(request): AppJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate(state, request).await.map(Json)
}

/// Seeds a new puzzle, fills it up to `count` words and registers it as a session.
///
/// The puzzle is built before the session exists, so a failed generate never
/// leaves a half-filled session behind.
async fn generate(state: AppState, request: GenerateRequest) -> Result<GenerateResponse, AppError> {
    let config = &state.config;
    let count = request.count.unwrap_or(config.default_word_count as i64);
    if count <= 0 {
        return Err(AppError::InvalidInput(format!(
            "count must be a positive integer, got {count}"
        )));
    }
    if count as u64 > config.max_word_count as u64 {
        return Err(AppError::InvalidInput(format!(
            "count must not exceed {}, got {count}",
            config.max_word_count
        )));
    }
    let target = count as usize;
    let seed = request
        .seed
        .unwrap_or_else(|| config.default_seed.clone());
    if seed.trim().chars().count() > config.max_seed_length {
        return Err(AppError::InvalidInput(format!(
            "seed must be at most {} letters",
            config.max_seed_length
        )));
    }

    let mut puzzle = Puzzle::seeded(&seed, config.word_lengths())?;
    let lexicon = state.lexicon.clone();

    let puzzle = tokio::task::spawn_blocking(move || {
        puzzle.fill_to_count(lexicon.as_ref(), target)?;
        Ok::<_, AppError>(puzzle)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Generate task failed: {e}")))??;

    let words = puzzle.words().to_vec();
    let first_letter_candidates = puzzle.open_candidates();
    let session_id = state.sessions.create(puzzle);

    info!(
        session_id = %session_id,
        seed = %words[0].word,
        requested = target,
        placed = words.len(),
        "Generated crossword"
    );

    Ok(GenerateResponse {
        session_id,
        words,
        first_letter_candidates,
    })
}

/// POST /api/expand
///
/// Grows the session's puzzle over `bounds` and returns only the words added
/// by this call.
pub async fn handle_expand(
    State(state): State<AppState>,
    AppJson(request): AppJson<ExpandRequest>,
) -> Result<Json<ExpandResponse>, AppError> {
    let bounds = request.bounds;
    bounds.validate(state.config.max_expand_span)?;

    let lexicon = state.lexicon.clone();
    let response = state
        .sessions
        .with_session(&request.session_id, move |puzzle| {
            let new_words = puzzle.expand(lexicon.as_ref(), bounds)?.to_vec();
            Ok(ExpandResponse {
                new_words,
                total_words: puzzle.word_count(),
            })
        })
        .await?;

    info!(
        session_id = %request.session_id,
        added = response.new_words.len(),
        total = response.total_words,
        "Expanded crossword"
    );

    Ok(Json(response))
}

/// GET /api/sessions/:id
///
/// Read-only view of a session. Still waits for any in-flight expansion.
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let id = session_id.clone();
    let snapshot = state
        .sessions
        .with_session(&session_id, move |puzzle| {
            Ok(SessionSnapshot {
                session_id: id,
                words: puzzle.words().to_vec(),
                first_letter_candidates: puzzle.open_candidates(),
                total_words: puzzle.word_count(),
            })
        })
        .await?;

    Ok(Json(snapshot))
}
