//! Router - (method, path) → handler の対応表
//!
//! # 学習ポイント
//! - 順序付きの静的なテーブル（登録順 = 優先順）
//! - 動的セグメントは 1 パターンにつき最大 1 つ（`/image/:id`）
//! - trait object（`Arc<dyn RouteHandler>`）で異なるハンドラを同じ Vec に並べる
//!
//! # マッチング規則
//! - クエリ文字列は無視する
//! - 末尾スラッシュは区別する（`/images` と `/images/` は別物）
//! - リテラルは完全一致（大文字小文字も区別）
//! - 動的セグメントは空文字列にマッチしない。値はパーセントデコードして渡す
//!
//! 同じ method で同じパスにマッチしうるパターンを 2 つ登録した場合は、
//! 先に登録したほうが勝つ（互いに素なパターンを前提にしている）。

use async_trait::async_trait;
use http::{Method, StatusCode};
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span};
use ulid::Ulid;

use crate::error::GalleryError;
use crate::fetch::{Request, Response};

/// 1 ルート分の処理
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, request: Request, params: PathParams) -> Result<Response, GalleryError>;
}

/// Router の登録エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("route pattern must start with '/': {0:?}")]
    MissingLeadingSlash(String),

    #[error("route pattern has more than one dynamic segment: {0:?}")]
    TooManyParams(String),

    #[error("route pattern has an unnamed dynamic segment: {0:?}")]
    EmptyParamName(String),

    #[error("route {0} {1} is already registered")]
    Duplicate(Method, String),
}

/// マッチしたパスから取り出した動的セグメント
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    param: Option<(String, String)>,
}

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.param
            .as_ref()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// パース済みのパスパターン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let Some(rest) = pattern.strip_prefix('/') else {
            return Err(RouteError::MissingLeadingSlash(pattern.to_string()));
        };

        let mut segments = Vec::new();
        let mut params = 0;
        for seg in rest.split('/') {
            match seg.strip_prefix(':') {
                Some("") => return Err(RouteError::EmptyParamName(pattern.to_string())),
                Some(name) => {
                    params += 1;
                    if params > 1 {
                        return Err(RouteError::TooManyParams(pattern.to_string()));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(seg.to_string())),
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `path` にマッチすれば束縛した動的セグメントを返す
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut params = PathParams::default();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    let value = urlencoding::decode(part).ok()?;
                    params.param = Some((name.clone(), value.into_owned()));
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Arc<dyn RouteHandler>,
}

/// Router は base path 配下のルートを順番に評価する
pub struct Router {
    base_path: String,
    routes: Vec<Route>,
}

impl Router {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            routes: Vec::new(),
        }
    }

    /// ルートを登録（`pattern` は base path からの相対）
    pub fn route(
        mut self,
        method: Method,
        pattern: &str,
        handler: Arc<dyn RouteHandler>,
    ) -> Result<Self, RouteError> {
        if !pattern.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash(pattern.to_string()));
        }
        let pattern = PathPattern::parse(&format!("{}{}", self.base_path, pattern))?;
        if self
            .routes
            .iter()
            .any(|r| r.method == method && r.pattern == pattern)
        {
            return Err(RouteError::Duplicate(method, pattern.raw));
        }
        self.routes.push(Route {
            method,
            pattern,
            handler,
        });
        Ok(self)
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// 登録済みルート（登録順）
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.routes
            .iter()
            .map(|r| (r.method.clone(), r.pattern.raw.clone()))
            .collect()
    }

    fn find(&self, method: &Method, path: &str) -> Option<(&Route, PathParams)> {
        self.routes
            .iter()
            .filter(|r| &r.method == method)
            .find_map(|r| r.pattern.matches(path).map(|params| (r, params)))
    }

    /// ログ出力 → ルート検索 → ハンドラ実行
    ///
    /// ハンドラのエラーはここで構造化されたエラーレスポンスに変換する。
    pub async fn dispatch(&self, request: Request) -> Response {
        let span = info_span!("request", request_id = %Ulid::new());
        async move {
            info!(
                method = %request.method(),
                url = %request.uri(),
                mode = request.mode(),
                destination = request.destination(),
                referrer = request.referrer(),
                "incoming request"
            );

            let response = match self.find(request.method(), request.path()) {
                Some((route, params)) => {
                    let route_name = route.pattern.as_str().to_string();
                    match route.handler.handle(request, params).await {
                        Ok(response) => response,
                        Err(e) => {
                            match &e {
                                GalleryError::Storage(_) => {
                                    error!(route = %route_name, error = %e, "handler failed");
                                }
                                _ => {
                                    debug!(route = %route_name, error = %e, "request rejected");
                                }
                            }
                            e.to_response()
                        }
                    }
                }
                None => not_found(),
            };

            debug!(status = response.status().as_u16(), "response ready");
            response
        }
        .instrument(span)
        .await
    }
}

/// ルートが見つからなかったときのレスポンス
pub fn not_found() -> Response {
    Response::json(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": "Not Found" }),
    )
}
