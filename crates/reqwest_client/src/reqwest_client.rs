use std::sync::Arc;

use anyhow::{Context as _, Result};
use futures::{FutureExt as _, future::BoxFuture};
use http_client::{AsyncBody, HttpClient, Request, Response};

const USER_AGENT: &str = concat!("zen-writer/", env!("CARGO_PKG_VERSION"));

/// An [`HttpClient`] backed by `reqwest`.
///
/// reqwest requires a tokio reactor, so requests are driven on a small
/// private runtime and awaited through their join handles. This keeps the
/// rest of the application free to run on any executor.
pub struct ReqwestClient {
    client: reqwest::Client,
    runtime: Arc<tokio::runtime::Runtime>,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("build reqwest client")?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("zen-http")
            .enable_all()
            .build()
            .context("start http runtime")?;
        Ok(Self {
            client,
            runtime: Arc::new(runtime),
        })
    }
}

impl HttpClient for ReqwestClient {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn send(&self, request: Request<AsyncBody>) -> BoxFuture<'static, Result<Response<AsyncBody>>> {
        let (parts, body) = request.into_parts();
        let body = body.into_bytes();
        let mut builder = self
            .client
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers);
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let handle = self.runtime.handle().clone();
        async move {
            let task = handle.spawn(async move {
                let response = builder.send().await?;
                let status = response.status();
                let headers = response.headers().clone();
                let bytes = response.bytes().await?;
                anyhow::Ok((status, headers, bytes))
            });
            let (status, headers, bytes) = task.await.context("http task was cancelled")??;
            log::debug!("http response {status} ({} bytes)", bytes.len());

            let mut response = Response::builder().status(status);
            if let Some(response_headers) = response.headers_mut() {
                *response_headers = headers;
            }
            Ok(response.body(AsyncBody::from_bytes(bytes))?)
        }
        .boxed()
    }
}
