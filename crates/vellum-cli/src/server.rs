//! HTTP adapter
//!
//! axum のリクエストを vellum-core の `Request` に変換して `Gallery::fetch` に渡す。
//! Gallery が横取りしなかったリクエスト（base path 外）は 404 で返す。

use anyhow::Result;
use axum::Router;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request as HttpRequest, State};
use axum::http::{HeaderMap, Uri, header};
use axum::response::{IntoResponse, Response as HttpResponse};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

use vellum_core::app::router::not_found;
use vellum_core::{
    Body, FilePart, FormData, FormField, FormValue, Gallery, GalleryError, Request, Response,
};

pub fn router(gallery: Arc<Gallery>) -> Router {
    Router::new()
        .fallback(intercept)
        // The upload size hint is advisory; no limit is enforced here.
        .layer(DefaultBodyLimit::disable())
        .with_state(gallery)
}

pub async fn serve(listen: SocketAddr, gallery: Arc<Gallery>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(addr = %listener.local_addr()?, base_path = %gallery.config().base_path, "listening");

    axum::serve(listener, router(gallery))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

async fn intercept(State(gallery): State<Arc<Gallery>>, request: HttpRequest) -> HttpResponse {
    let request = match into_core_request(request).await {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };

    match gallery.fetch(request).await {
        Some(response) => into_http_response(response),
        None => {
            debug!("request outside the gallery");
            into_http_response(not_found())
        }
    }
}

/// 変換前に弾いたリクエストも core と同じ `{"error": ...}` で返す
fn bad_request(message: impl std::fmt::Display) -> HttpResponse {
    debug!(error = %message, "rejected request before dispatch");
    into_http_response(GalleryError::Validation(message.to_string()).to_response())
}

/// axum の URI は path + query だけなので Host から絶対 URL を組み立てる
fn absolute_uri(headers: &HeaderMap, uri: &Uri) -> Result<Uri, HttpResponse> {
    if uri.scheme().is_some() {
        return Ok(uri.clone());
    }
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let path = uri.path_and_query().map_or("/", |pq| pq.as_str());

    format!("http://{host}{path}")
        .parse()
        .map_err(|_| bad_request("invalid request target"))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

async fn into_core_request(request: HttpRequest) -> Result<Request, HttpResponse> {
    let method = request.method().clone();
    let headers = request.headers().clone();
    let uri = absolute_uri(&headers, request.uri())?;

    let body = if is_multipart(&headers) {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        Body::Form(read_form(multipart).await?)
    } else {
        Body::Empty
    };

    Ok(Request::from_parts(method, uri, headers, body))
}

async fn read_form(mut multipart: Multipart) -> Result<FormData, HttpResponse> {
    let mut form = FormData::new();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        let value = match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let part = FilePart::new(filename, field.bytes().await.map_err(malformed)?);
                FormValue::File(match content_type {
                    Some(ct) => part.with_content_type(ct),
                    None => part,
                })
            }
            None => FormValue::Text(field.text().await.map_err(malformed)?),
        };
        form.push(FormField { name, value });
    }
    Ok(form)
}

fn malformed(err: MultipartError) -> HttpResponse {
    bad_request(format!("malformed multipart body: {}", err.body_text()))
}

fn into_http_response(response: Response) -> HttpResponse {
    let (status, headers, body) = response.into_parts();
    (status, headers, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body as AxumBody, to_bytes};
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;
    use vellum_core::GalleryBuilder;
    use vellum_core::ports::FixedClock;

    const BOUNDARY: &str = "vellum-test-boundary";

    async fn app() -> Router {
        let gallery = GalleryBuilder::default()
            .clock(FixedClock::from_millis(1_700_000_000_000))
            .build()
            .await
            .unwrap();
        gallery.activate().await;
        router(Arc::new(gallery))
    }

    fn multipart_upload(filename: &str, bytes: &[u8]) -> HttpRequest {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        HttpRequest::builder()
            .method(Method::POST)
            .uri("/sw/upload")
            .header(header::HOST, "localhost:8080")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(AxumBody::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> HttpRequest {
        HttpRequest::builder()
            .uri(uri)
            .header(header::HOST, "localhost:8080")
            .body(AxumBody::empty())
            .unwrap()
    }

    async fn json(response: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn multipart_upload_then_get() {
        let app = app().await;

        let res = app
            .clone()
            .oneshot(multipart_upload("anim.gif", b"GIF89a"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            json(res).await,
            serde_json::json!({ "path": "/sw/image/1700000000000-anim.gif" })
        );

        let res = app
            .oneshot(get("/sw/image/1700000000000-anim.gif"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/gif");
        assert_eq!(res.headers()[header::CACHE_CONTROL], "public, max-age=31536000");
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"GIF89a");
    }

    #[tokio::test]
    async fn post_without_multipart_is_400() {
        let app = app().await;
        let req = HttpRequest::builder()
            .method(Method::POST)
            .uri("/sw/upload")
            .body(AxumBody::empty())
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn truncated_multipart_is_json_400() {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.gif\"\r\n\r\nGIF8"
        );
        let req = HttpRequest::builder()
            .method(Method::POST)
            .uri("/sw/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(AxumBody::from(body))
            .unwrap();

        let res = app().await.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
        let body = json(res).await;
        assert!(body["error"].as_str().unwrap().starts_with("malformed multipart body"));
    }

    #[tokio::test]
    async fn multipart_without_boundary_is_json_400() {
        let req = HttpRequest::builder()
            .method(Method::POST)
            .uri("/sw/upload")
            .header(header::CONTENT_TYPE, "multipart/form-data")
            .body(AxumBody::empty())
            .unwrap();

        let res = app().await.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(json(res).await["error"].is_string());
    }

    #[tokio::test]
    async fn outside_base_path_is_404() {
        let res = app().await.oneshot(get("/index.html")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(res).await, serde_json::json!({ "error": "Not Found" }));
    }

    #[tokio::test]
    async fn list_starts_empty() {
        let res = app().await.oneshot(get("/sw/images")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json(res).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn bad_host_is_json_400() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "bad host".parse().unwrap());
        let uri: Uri = "/sw/images".parse().unwrap();

        let res = absolute_uri(&headers, &uri).unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(res).await["error"], "invalid request target");
    }

    #[test]
    fn absolute_uri_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "example.test".parse().unwrap());
        let uri: Uri = "/sw/images?x=1".parse().unwrap();
        let abs = absolute_uri(&headers, &uri).unwrap();
        assert_eq!(abs.to_string(), "http://example.test/sw/images?x=1");
    }
}
