// Pingora ProxyHttp implementation
// Every request is answered from request_filter; nothing is proxied upstream

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use pingora_core::upstreams::peer::HttpPeer;
use pingora_core::Result;
use pingora_http::{RequestHeader, ResponseHeader};
use pingora_proxy::{ProxyHttp, Session};
use std::sync::Arc;
use std::time::Instant;

use super::context::RequestContext;
use super::cors::{CorsDecision, CorsPolicy};
use super::endpoints::{self, EndpointResponse};
use crate::config::Config;
use crate::metrics::Metrics;
use crate::router::{Route, RouteMatch, Router};
use crate::upload::{ApiResponse, OperationKind, UploadError, UploadForm, UploadHandler};

/// ImageService implements the Pingora ProxyHttp trait
/// Handles routing, CORS, body buffering and the upload endpoints
pub struct ImageService {
    router: Router,
    cors: CorsPolicy,
    handler: UploadHandler,
    metrics: Arc<Metrics>,
    max_body_size: usize,
    /// Service start time (for uptime calculation in /health endpoint)
    start_time: Instant,
}

impl ImageService {
    pub fn new(config: &Config) -> Self {
        Self::with_metrics(config, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(config: &Config, metrics: Arc<Metrics>) -> Self {
        Self {
            router: Router::new(),
            cors: CorsPolicy::from_config(&config.server.cors),
            handler: UploadHandler::new(config, metrics.clone()),
            metrics,
            max_body_size: config.server.max_body_size,
            start_time: Instant::now(),
        }
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    async fn dispatch(&self, session: &mut Session, ctx: &RequestContext) -> EndpointResponse {
        match self.router.route(ctx.method(), ctx.path()) {
            RouteMatch::NotFound => endpoints::not_found(ctx.path()),
            RouteMatch::MethodNotAllowed(allow) => endpoints::method_not_allowed(allow),
            RouteMatch::Found(Route::Health) => endpoints::handle_health(self.start_time),
            RouteMatch::Found(Route::Metrics) => endpoints::handle_metrics(&self.metrics),
            RouteMatch::Found(Route::Upload(kind)) => self.upload(session, ctx, kind).await,
        }
    }

    async fn upload(
        &self,
        session: &mut Session,
        ctx: &RequestContext,
        kind: OperationKind,
    ) -> EndpointResponse {
        let content_type = header_value(session.req_header(), "content-type").unwrap_or_default();

        let form = match self.read_body(session).await {
            Ok(body) => UploadForm::parse(&content_type, body).await,
            Err(err) => Err(err),
        };

        match form {
            Ok(form) => self.handler.respond(kind, form).await.into(),
            Err(err) => {
                self.metrics.increment_upload_error(err.kind());
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    operation = kind.as_str(),
                    error = %err,
                    "Rejecting unreadable upload body"
                );
                ApiResponse::from_error(&err).into()
            }
        }
    }

    /// Buffer the request body, refusing anything above `max_body_size`
    async fn read_body(&self, session: &mut Session) -> std::result::Result<Bytes, UploadError> {
        let limit = self.max_body_size;

        let declared = header_value(session.req_header(), "content-length")
            .and_then(|v| v.trim().parse::<usize>().ok());
        if declared.is_some_and(|len| len > limit) {
            return Err(UploadError::PayloadTooLarge { limit });
        }

        let mut body = BytesMut::with_capacity(declared.unwrap_or(0));
        loop {
            match session.read_request_body().await {
                Ok(Some(chunk)) => {
                    if body.len() + chunk.len() > limit {
                        return Err(UploadError::PayloadTooLarge { limit });
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    return Err(UploadError::MalformedMultipart(format!(
                        "failed to read request body: {}",
                        e
                    )))
                }
            }
        }

        self.metrics.add_bytes_received(body.len() as u64);
        Ok(body.freeze())
    }
}

fn header_value(header: &RequestHeader, name: &str) -> Option<String> {
    header
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn write_response(session: &mut Session, response: EndpointResponse) -> Result<()> {
    let mut header = ResponseHeader::build(response.status, None)?;
    if !response.body.is_empty() {
        header.insert_header("Content-Type", response.content_type)?;
    }
    if response.status != 204 {
        header.insert_header("Content-Length", response.body.len().to_string())?;
    }
    for (name, value) in response.headers {
        header.insert_header(name, value)?;
    }

    let empty = response.body.is_empty();
    session
        .write_response_header(Box::new(header), empty)
        .await?;
    if !empty {
        session
            .write_response_body(Some(response.body), true)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl ProxyHttp for ImageService {
    type CTX = RequestContext;

    fn new_ctx(&self) -> Self::CTX {
        RequestContext::new()
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        // request_filter always answers, so reaching here is a bug
        tracing::error!(
            request_id = %ctx.request_id(),
            path = %ctx.path(),
            "Request escaped request_filter"
        );
        Err(pingora_core::Error::explain(
            pingora_core::ErrorType::InternalError,
            "no upstream: all requests are served locally",
        ))
    }

    /// Route the request and write the response
    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let req = session.req_header();
        ctx.set_request(req.method.as_str(), req.uri.path());
        let origin = header_value(req, "origin");
        let request_method = header_value(req, "access-control-request-method");
        let request_headers = header_value(req, "access-control-request-headers");

        self.metrics.increment_request_count();

        let response = match self.cors.evaluate(
            ctx.method(),
            origin.as_deref(),
            request_method.as_deref(),
            request_headers.as_deref(),
        ) {
            CorsDecision::Preflight(headers) => EndpointResponse::no_content().with_headers(headers),
            CorsDecision::Forbidden => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    origin = origin.as_deref().unwrap_or_default(),
                    "Rejecting request from disallowed origin"
                );
                endpoints::origin_forbidden()
            }
            CorsDecision::Actual(headers) => {
                ctx.set_cors_headers(headers);
                self.dispatch(session, ctx).await
            }
            CorsDecision::NotCors => self.dispatch(session, ctx).await,
        };

        let response = response.with_headers(ctx.take_cors_headers());
        write_response(session, response).await?;

        Ok(true) // Short-circuit (response already sent)
    }

    /// Access log and request metrics
    async fn logging(
        &self,
        session: &mut Session,
        e: Option<&pingora_core::Error>,
        ctx: &mut Self::CTX,
    ) {
        let status_code = session
            .response_written()
            .map(|resp| resp.status.as_u16())
            .unwrap_or(500);
        let duration_ms = ctx.elapsed_ms();

        self.metrics.increment_status_count(status_code);
        self.metrics.record_duration(duration_ms);

        if let Some(error) = e {
            tracing::warn!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                error = %error,
                "Request ended with error"
            );
        }

        tracing::info!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            status_code = status_code,
            duration_ms = duration_ms,
            "Request completed"
        );
    }
}
