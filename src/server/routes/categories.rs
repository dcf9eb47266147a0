use std::collections::BTreeMap;

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::{
    db::{
        queries::{categories, questions},
        Question,
    },
    server::{
        app::AppState,
        extractors::{AppPath, AppQuery, DbConn},
        pagination::{paginate, PageQuery},
    },
};

use super::{ApiError, ApiResponse};

#[derive(Serialize)]
struct CategoriesResponse {
    success: bool,
    categories: BTreeMap<i64, String>,
}

#[derive(Serialize)]
struct CategoryQuestionsResponse {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    current_category: String,
}

async fn get_categories(DbConn(mut conn): DbConn) -> ApiResponse<Json<CategoriesResponse>> {
    let categories = categories::get_all_categories(&mut *conn).await?;
    if categories.is_empty() {
        return Err(ApiError::NotFound("no categories".to_owned()));
    }
    Ok(Json(CategoriesResponse {
        success: true,
        categories: categories.into_iter().map(|c| (c.id, c.kind)).collect(),
    }))
}

async fn get_category_questions(
    DbConn(mut conn): DbConn,
    AppPath(category_id): AppPath<i64>,
    AppQuery(PageQuery { page }): AppQuery<PageQuery>,
) -> ApiResponse<Json<CategoryQuestionsResponse>> {
    let Some(category) = categories::get_category(&mut *conn, category_id).await? else {
        return Err(ApiError::BadRequest(format!(
            "category {category_id} does not exist"
        )));
    };
    let selection = questions::get_questions_for_category(&mut *conn, category.id).await?;
    let current = paginate(page, &selection);
    // a category without questions is a valid, empty listing
    if current.is_empty() && !selection.is_empty() {
        return Err(ApiError::NotFound(format!("page {page}")));
    }

    Ok(Json(CategoryQuestionsResponse {
        success: true,
        questions: current.to_vec(),
        total_questions: selection.len(),
        current_category: category.kind,
    }))
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route(
            "/categories/{category_id}/questions",
            get(get_category_questions),
        )
        .with_state(state)
}
