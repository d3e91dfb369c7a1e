//! HTTP-like request / response types.
//!
//! The core never touches a socket. An outer runtime (the CLI listener, a test,
//! an embedding host) builds a [`Request`], hands it to the gallery and writes
//! the returned [`Response`] back however it likes.

use bytes::Bytes;
use http::header::{self, HeaderName};
use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use serde::Serialize;

/// Fetch metadata header carrying the request mode (`navigate`, `cors`, ...).
pub const SEC_FETCH_MODE: HeaderName = HeaderName::from_static("sec-fetch-mode");

/// Fetch metadata header carrying the request destination (`image`, `document`, ...).
pub const SEC_FETCH_DEST: HeaderName = HeaderName::from_static("sec-fetch-dest");

/// An incoming request.
///
/// `uri` is normally absolute (`http://localhost:8080/sw/images`); the full
/// string form is what the response cache is keyed by.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
}

impl Request {
    /// Parses `url` and builds a request without headers or body.
    pub fn new(method: Method, url: &str) -> Result<Self, http::uri::InvalidUri> {
        Ok(Self::from_parts(method, url.parse()?, HeaderMap::new(), Body::Empty))
    }

    pub fn from_parts(method: Method, uri: Uri, headers: HeaderMap, body: Body) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    pub fn get(url: &str) -> Result<Self, http::uri::InvalidUri> {
        Self::new(Method::GET, url)
    }

    pub fn delete(url: &str) -> Result<Self, http::uri::InvalidUri> {
        Self::new(Method::DELETE, url)
    }

    pub fn post_form(url: &str, form: FormData) -> Result<Self, http::uri::InvalidUri> {
        Ok(Self::new(Method::POST, url)?.with_body(Body::Form(form)))
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Full request URL as a string (cache key).
    pub fn url(&self) -> String {
        self.uri.to_string()
    }

    /// Full request URL without the query string.
    pub fn url_without_query(&self) -> String {
        match self.origin() {
            Some(origin) => format!("{origin}{}", self.uri.path()),
            None => self.uri.path().to_string(),
        }
    }

    /// Path component without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// `scheme://authority` of an absolute request URL.
    pub fn origin(&self) -> Option<String> {
        let scheme = self.uri.scheme_str()?;
        let authority = self.uri.authority()?;
        Some(format!("{scheme}://{authority}"))
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    pub fn mode(&self) -> &str {
        self.header_str(&SEC_FETCH_MODE)
    }

    pub fn destination(&self) -> &str {
        self.header_str(&SEC_FETCH_DEST)
    }

    pub fn referrer(&self) -> &str {
        self.header_str(&header::REFERER)
    }

    fn header_str(&self, name: &HeaderName) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}

/// Request body as seen by the handlers.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    /// Already-decoded `multipart/form-data` (or urlencoded) fields.
    Form(FormData),
}

/// Ordered list of form fields. Field names may repeat.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<FormField>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(FormField {
            name: name.into(),
            value: FormValue::Text(value.into()),
        });
        self
    }

    pub fn file(mut self, name: impl Into<String>, part: FilePart) -> Self {
        self.push(FormField {
            name: name.into(),
            value: FormValue::File(part),
        });
        self
    }

    pub fn push(&mut self, field: FormField) {
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Every value submitted under `name`, in submission order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FormValue> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.name == name)
            .map(|f| &f.value)
    }

    pub fn into_fields(self) -> Vec<FormField> {
        self.fields
    }
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File(FilePart),
}

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FilePart {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A fully constructed response.
///
/// `Bytes` makes clones cheap; the response cache hands out clones of the
/// stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response. Serialization failure degrades to a plain 500.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        let (status, body) = match serde_json::to_vec(value) {
            Ok(body) => (status, Bytes::from(body)),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Bytes::from_static(br#"{"error":"Internal Server Error"}"#),
                )
            }
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self::new(status, headers, body)
    }

    /// Binary response with the given content type.
    pub fn bytes(status: StatusCode, content_type: &'static str, body: Bytes) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self::new(status, headers, body)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_exposes_path_origin_and_fetch_metadata() {
        let req = Request::get("http://localhost:8080/sw/images?x=1")
            .unwrap()
            .with_header(SEC_FETCH_MODE, HeaderValue::from_static("cors"))
            .with_header(SEC_FETCH_DEST, HeaderValue::from_static("empty"))
            .with_header(
                header::REFERER,
                HeaderValue::from_static("http://localhost:8080/"),
            );

        assert_eq!(req.path(), "/sw/images");
        assert_eq!(req.url(), "http://localhost:8080/sw/images?x=1");
        assert_eq!(req.url_without_query(), "http://localhost:8080/sw/images");
        assert_eq!(req.origin().as_deref(), Some("http://localhost:8080"));
        assert_eq!(req.mode(), "cors");
        assert_eq!(req.destination(), "empty");
        assert_eq!(req.referrer(), "http://localhost:8080/");
    }

    #[test]
    fn missing_fetch_metadata_is_empty() {
        let req = Request::get("/sw/images").unwrap();
        assert_eq!(req.mode(), "");
        assert_eq!(req.destination(), "");
        assert_eq!(req.referrer(), "");
        assert_eq!(req.origin(), None);
    }

    #[test]
    fn form_data_keeps_repeated_fields_in_order() {
        let form = FormData::new()
            .file("file", FilePart::new("a.png", vec![1u8]))
            .text("note", "hi")
            .file("file", FilePart::new("b.png", vec![2u8]));

        let names: Vec<_> = form
            .get_all("file")
            .filter_map(|v| match v {
                FormValue::File(part) => Some(part.filename.as_str()),
                FormValue::Text(_) => None,
            })
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
        assert_eq!(form.fields().len(), 3);
    }

    #[test]
    fn json_response_sets_content_type() {
        let res = Response::json(StatusCode::OK, &serde_json::json!({ "path": "/sw/image/x" }));
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.content_type(), Some("application/json"));
        let v: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(v["path"], "/sw/image/x");
    }
}
