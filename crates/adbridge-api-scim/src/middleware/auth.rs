//! Bearer token authentication middleware.
//!
//! The bridge authenticates its identity provider with a single
//! service-level API key carried as `Authorization: Bearer <key>`.
//! Requests without a matching key receive a 401 SCIM error envelope.

use axum::{
    body::Body,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower::{Layer, Service};

use crate::error::ScimError;

/// Layer applying bearer-key authentication to the SCIM routes.
#[derive(Clone)]
pub struct ApiKeyLayer {
    key: Arc<str>,
}

impl ApiKeyLayer {
    /// Create a new auth layer checking against the given key.
    #[must_use]
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self { key: key.into() }
    }
}

impl<S> Layer<S> for ApiKeyLayer {
    type Service = ApiKeyService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKeyService {
            inner,
            key: self.key.clone(),
        }
    }
}

/// Authentication service wrapper.
#[derive(Clone)]
pub struct ApiKeyService<S> {
    inner: S,
    key: Arc<str>,
}

impl<S> Service<Request<Body>> for ApiKeyService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let inner = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner);
        let key = self.key.clone();

        Box::pin(async move {
            let bearer = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "));

            match bearer {
                Some(token) if constant_time_eq(token.as_bytes(), key.as_bytes()) => {
                    inner.call(req).await
                }
                _ => {
                    tracing::warn!("SCIM auth failed: missing or invalid bearer token");
                    Ok(ScimError::Unauthorized.into_response())
                }
            }
        })
    }
}

/// Compare two byte slices without short-circuiting on the first
/// mismatch, so the comparison time does not leak the matching prefix.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
