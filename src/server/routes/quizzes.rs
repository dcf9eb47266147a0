use axum::{routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use serde_json::{Map, Value};

use crate::{
    db::{queries::questions, Question},
    server::{
        app::AppState,
        extractors::{from_body, require_keys, AppJson, DbConn},
    },
    telemetry::QUIZ_QUESTIONS_SERVED,
};

use super::{ApiError, ApiResponse};

/// Category id that stands for "every category".
const ALL_CATEGORIES: i64 = 0;

#[derive(Deserialize)]
struct QuizCategory {
    // clients send the id either as a number or as a numeric string
    #[serde(deserialize_with = "deserialize_number_from_string")]
    id: i64,
}

#[derive(Deserialize)]
struct QuizRequest {
    quiz_category: QuizCategory,
    previous_questions: Vec<i64>,
}

#[derive(Serialize)]
struct QuizResponse {
    success: bool,
    question: Question,
}

async fn next_quiz_question(
    DbConn(mut conn): DbConn,
    AppJson(body): AppJson<Map<String, Value>>,
) -> ApiResponse<Json<QuizResponse>> {
    require_keys(&body, &["quiz_category", "previous_questions"])?;
    let request: QuizRequest = from_body(body)?;

    let category = match request.quiz_category.id {
        ALL_CATEGORIES => None,
        id => Some(id),
    };
    let candidates =
        questions::get_quiz_candidates(&mut *conn, category, &request.previous_questions).await?;
    let Some(question) = fastrand::choice(candidates) else {
        return Err(ApiError::Unprocessable(
            "no questions left to play".to_owned(),
        ));
    };

    let label = category.map_or_else(|| "all".to_owned(), |id| id.to_string());
    QUIZ_QUESTIONS_SERVED.with_label_values(&[label.as_str()]).inc();
    tracing::debug!(question_id = question.id, category = %label, "Serving quiz question");
    Ok(Json(QuizResponse {
        success: true,
        question,
    }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(next_quiz_question))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::db::testing;
    use crate::server::testing::{post_json, send, test_app};

    #[tokio::test]
    async fn quiz_question_belongs_to_requested_category() {
        let (app, pool) = test_app().await;
        testing::seed(&pool, 30).await;

        for _ in 0..10 {
            let (status, body) = send(
                &app,
                post_json(
                    "/quizzes",
                    json!({
                        "previous_questions": [],
                        "quiz_category": {"id": "5", "type": "Entertainment"}
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], true);
            assert_eq!(body["question"]["category"], 5);
        }
    }

    #[tokio::test]
    async fn quiz_never_repeats_previous_questions() {
        let (app, pool) = test_app().await;
        let ids = testing::seed(&pool, 6).await;
        let previous = &ids[..5];

        for _ in 0..10 {
            let (status, body) = send(
                &app,
                post_json(
                    "/quizzes",
                    json!({"previous_questions": previous, "quiz_category": {"id": 0}}),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["question"]["id"], ids[5]);
        }
    }

    #[tokio::test]
    async fn quiz_accepts_long_previous_question_lists() {
        let (app, pool) = test_app().await;
        let ids = testing::seed(&pool, 3).await;
        let mut previous: Vec<i64> = (100_000..140_000).collect();
        previous.extend_from_slice(&ids[..2]);

        let (status, body) = send(
            &app,
            post_json(
                "/quizzes",
                json!({"previous_questions": previous, "quiz_category": {"id": 0}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["question"]["id"], ids[2]);
    }

    #[tokio::test]
    async fn exhausted_quiz_is_unprocessable() {
        let (app, pool) = test_app().await;
        let ids = testing::seed(&pool, 12).await;
        // category 1 holds the first and seventh question
        let previous = [ids[0], ids[6]];

        let (status, body) = send(
            &app,
            post_json(
                "/quizzes",
                json!({"previous_questions": previous, "quiz_category": {"id": 1}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "unprocessible");
    }

    #[tokio::test]
    async fn quiz_without_required_keys_is_bad_request() {
        let (app, pool) = test_app().await;
        testing::seed(&pool, 6).await;

        for body in [
            json!({}),
            json!({"previous_questions": []}),
            json!({"quiz_category": {"id": 0}}),
        ] {
            let (status, body) = send(&app, post_json("/quizzes", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "bad request");
        }
    }

    #[tokio::test]
    async fn quiz_category_without_id_is_unprocessable() {
        let (app, pool) = test_app().await;
        testing::seed(&pool, 6).await;

        let (status, _) = send(
            &app,
            post_json(
                "/quizzes",
                json!({"previous_questions": [], "quiz_category": {"type": "Art"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
