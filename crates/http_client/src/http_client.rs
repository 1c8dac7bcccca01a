mod async_body;

#[cfg(feature = "test-support")]
use std::sync::Arc;

use anyhow::{Context as _, Result};
use futures::{AsyncReadExt as _, future::BoxFuture};

pub use async_body::AsyncBody;
pub use http::{self, Method, Request, Response, StatusCode, Uri, header};

/// An asynchronous HTTP transport.
///
/// Implementations must not assume which executor polls the returned future.
pub trait HttpClient: 'static + Send + Sync {
    fn type_name(&self) -> &'static str;

    fn send(&self, request: Request<AsyncBody>) -> BoxFuture<'static, Result<Response<AsyncBody>>>;
}

impl std::fmt::Debug for dyn HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("type", &self.type_name())
            .finish()
    }
}

/// Reads the remainder of a response body as UTF-8.
pub async fn read_body_to_string(response: &mut Response<AsyncBody>) -> Result<String> {
    let mut body = String::new();
    response
        .body_mut()
        .read_to_string(&mut body)
        .await
        .context("read response body")?;
    Ok(body)
}

#[cfg(feature = "test-support")]
type FakeHttpHandler = Arc<
    dyn Fn(Request<AsyncBody>) -> BoxFuture<'static, Result<Response<AsyncBody>>>
        + Send
        + Sync
        + 'static,
>;

/// An [`HttpClient`] that answers every request with a user-supplied handler.
#[cfg(feature = "test-support")]
pub struct FakeHttpClient {
    handler: FakeHttpHandler,
}

#[cfg(feature = "test-support")]
impl FakeHttpClient {
    pub fn create<Fut, F>(handler: F) -> Arc<dyn HttpClient>
    where
        Fut: futures::Future<Output = Result<Response<AsyncBody>>> + Send + 'static,
        F: Fn(Request<AsyncBody>) -> Fut + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Arc::new(move |request| Box::pin(handler(request))),
        })
    }

    pub fn with_404_response() -> Arc<dyn HttpClient> {
        Self::create(|_| async move {
            anyhow::Ok(Response::builder()
                .status(404)
                .body(AsyncBody::from("not found"))?)
        })
    }

    pub fn with_200_response(body: &'static str) -> Arc<dyn HttpClient> {
        Self::create(move |_| async move {
            anyhow::Ok(Response::builder()
                .status(200)
                .body(AsyncBody::from(body))?)
        })
    }
}

#[cfg(feature = "test-support")]
impl HttpClient for FakeHttpClient {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn send(&self, request: Request<AsyncBody>) -> BoxFuture<'static, Result<Response<AsyncBody>>> {
        log::debug!("fake http {} {}", request.method(), request.uri());
        (self.handler)(request)
    }
}
