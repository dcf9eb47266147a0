use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::Connection;

use crate::{
    db::{queries::questions, NewQuestion, Question},
    server::{
        app::AppState,
        extractors::{from_body, AppJson, AppPath, AppQuery, DbConn},
        pagination::{paginate, PageQuery},
    },
    telemetry::{QUESTIONS_CREATED, QUESTIONS_DELETED},
};

use super::{ApiError, ApiResponse};

#[derive(Deserialize)]
struct SearchBody {
    #[serde(default, alias = "searchTerm")]
    search_term: Option<String>,
}

#[derive(Serialize)]
struct QuestionsResponse {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
}

#[derive(Serialize)]
struct DeletedResponse {
    success: bool,
    deleted: i64,
}

#[derive(Serialize)]
struct CreatedResponse {
    success: bool,
    created: i64,
    created_id: i64,
    created_question: String,
    questions: Vec<Question>,
    total_questions: usize,
}

#[derive(Serialize)]
struct SearchResponse {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    current_category: Option<String>,
}

async fn get_questions(
    DbConn(mut conn): DbConn,
    AppQuery(PageQuery { page }): AppQuery<PageQuery>,
) -> ApiResponse<Json<QuestionsResponse>> {
    let selection = questions::get_all_questions(&mut *conn).await?;
    let current = paginate(page, &selection);
    if current.is_empty() {
        return Err(ApiError::NotFound(format!("page {page}")));
    }

    Ok(Json(QuestionsResponse {
        success: true,
        questions: current.to_vec(),
        total_questions: selection.len(),
    }))
}

async fn delete_question(
    DbConn(mut conn): DbConn,
    AppPath(question_id): AppPath<i64>,
) -> ApiResponse<Json<DeletedResponse>> {
    let mut tx = conn.begin().await.map_err(ApiError::from_write)?;
    if questions::get_question_by_id(&mut *tx, question_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!("question {question_id}")));
    }
    questions::delete_question(&mut *tx, question_id)
        .await
        .map_err(ApiError::from_write)?;
    tx.commit().await.map_err(ApiError::from_write)?;

    QUESTIONS_DELETED.inc();
    tracing::info!(question_id, "Deleted question");
    Ok(Json(DeletedResponse {
        success: true,
        deleted: question_id,
    }))
}

async fn create_question(
    DbConn(mut conn): DbConn,
    AppQuery(PageQuery { page }): AppQuery<PageQuery>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> ApiResponse<Json<CreatedResponse>> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("empty question body".to_owned()));
    }
    let new_question: NewQuestion = from_body(body)?;

    let mut tx = conn.begin().await.map_err(ApiError::from_write)?;
    let id = questions::create_question(&mut *tx, &new_question)
        .await
        .map_err(ApiError::from_write)?;
    tx.commit().await.map_err(ApiError::from_write)?;

    QUESTIONS_CREATED.inc();
    tracing::info!(id, category = new_question.category, "Created question");

    let selection = questions::get_all_questions(&mut *conn).await?;
    Ok(Json(CreatedResponse {
        success: true,
        created: id,
        created_id: id,
        created_question: new_question.question,
        questions: paginate(page, &selection).to_vec(),
        total_questions: selection.len(),
    }))
}

async fn search_questions(
    DbConn(mut conn): DbConn,
    AppQuery(PageQuery { page }): AppQuery<PageQuery>,
    AppJson(body): AppJson<SearchBody>,
) -> ApiResponse<Json<SearchResponse>> {
    let Some(search_term) = body.search_term else {
        return Err(ApiError::BadRequest("search_term missing".to_owned()));
    };
    let selection = questions::search_questions(&mut *conn, &search_term).await?;
    let current = paginate(page, &selection);
    if current.is_empty() {
        return Err(ApiError::NotFound(format!(
            "no questions matching {search_term:?} on page {page}"
        )));
    }

    Ok(Json(SearchResponse {
        success: true,
        questions: current.to_vec(),
        total_questions: selection.len(),
        current_category: None,
    }))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(get_questions).post(create_question))
        .route("/questions/search", post(search_questions))
        .route("/questions/{question_id}", delete(delete_question))
        .with_state(state)
}
