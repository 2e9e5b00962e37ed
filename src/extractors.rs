//! Body/query extractors whose rejections use the API's JSON error shape.

use axum::{
  async_trait,
  extract::{FromRequest, FromRequestParts, Path, Query, Request},
  http::request::Parts,
  Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::TutorError;

/// `Json<T>` that rejects with `TutorError::Validation` (400).
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = TutorError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    match Json::<T>::from_request(req, state).await {
      Ok(Json(value)) => Ok(ApiJson(value)),
      Err(rejection) => {
        warn!(target: "coding_tutor", error = %rejection, "Rejected JSON body");
        Err(TutorError::validation(rejection.body_text()))
      }
    }
  }
}

/// `Query<T>` that rejects with `TutorError::Validation` (400).
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = TutorError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    match Query::<T>::from_request_parts(parts, state).await {
      Ok(Query(value)) => Ok(ApiQuery(value)),
      Err(rejection) => Err(TutorError::validation(rejection.body_text())),
    }
  }
}

/// `Path<T>` that rejects with `TutorError::Validation` (400).
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
  T: DeserializeOwned + Send,
  S: Send + Sync,
{
  type Rejection = TutorError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    match Path::<T>::from_request_parts(parts, state).await {
      Ok(Path(value)) => Ok(ApiPath(value)),
      Err(rejection) => Err(TutorError::validation(rejection.body_text())),
    }
  }
}
