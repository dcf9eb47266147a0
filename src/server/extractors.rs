use axum::extract::{FromRef, FromRequest, FromRequestParts, Path, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool};

use super::error::ApiError;

/// JSON body whose rejections render as [`ApiError::BadRequest`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// A pooled connection owned by a single request. It goes back to the pool
/// when the handler returns, whichever way it returns.
pub struct DbConn(pub PoolConnection<Sqlite>);

impl<S> FromRequestParts<S> for DbConn
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = SqlitePool::from_ref(state);
        let conn = pool.acquire().await?;
        Ok(DbConn(conn))
    }
}

/// Fails with [`ApiError::BadRequest`] unless every key is present in the body.
pub fn require_keys(body: &Map<String, Value>, keys: &[&str]) -> Result<(), ApiError> {
    match keys.iter().find(|key| !body.contains_key(**key)) {
        Some(missing) => Err(ApiError::BadRequest(format!(
            "required key `{missing}` missing from body"
        ))),
        None => Ok(()),
    }
}

/// Converts an already parsed JSON object into a typed payload. Missing,
/// null or mistyped fields are unprocessable rather than malformed.
pub fn from_body<T: DeserializeOwned>(body: Map<String, Value>) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(body)).map_err(|e| ApiError::Unprocessable(e.to_string()))
}
