//! Tower middleware wrapping an endpoint in an [`AdmissionGuard`].
//!
//! Attach with `Router::route_layer` so the guard only sees requests that
//! matched the guarded route:
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use slowdown::{AdmissionGuard, SlowDownLayer};
//!
//! let guard = AdmissionGuard::per_seconds(5, 10).unwrap();
//! let app: Router = Router::new()
//!     .route("/hello", get(|| async { "hi" }))
//!     .route_layer(SlowDownLayer::new(guard));
//! ```

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::clock::{Clock, MonotonicClock};
use crate::guard::{Admission, AdmissionGuard};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Layer applying one shared guard to every request of the wrapped service.
#[derive(Debug, Clone)]
pub struct SlowDownLayer<C = MonotonicClock> {
    guard: AdmissionGuard<C>,
}

impl<C: Clock> SlowDownLayer<C> {
    pub fn new(guard: AdmissionGuard<C>) -> Self {
        Self { guard }
    }

    pub fn guard(&self) -> &AdmissionGuard<C> {
        &self.guard
    }
}

impl<S, C: Clock> Layer<S> for SlowDownLayer<C> {
    type Service = SlowDownService<S, C>;

    fn layer(&self, inner: S) -> Self::Service {
        SlowDownService {
            inner,
            guard: self.guard.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlowDownService<S, C = MonotonicClock> {
    inner: S,
    guard: AdmissionGuard<C>,
}

impl<S, C> Service<Request> for SlowDownService<S, C>
where
    S: Service<Request> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
    C: Clock,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let admission = match self.guard.try_acquire() {
            Ok(admission) => admission,
            Err(rejection) => return Box::pin(async move { Ok(rejection.into_response()) }),
        };

        // Keep the service that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner.call(req).await?.into_response();
            annotate(&mut response, admission);
            Ok(response)
        })
    }
}

fn annotate(response: &mut Response, admission: Admission) {
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(admission.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(admission.remaining));
}
