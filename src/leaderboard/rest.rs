//! PostgREST-style remote leaderboard (WASM only)
//!
//! Talks to `<endpoint>/rest/v1/<table>` with the page's anon key. Each call
//! runs as a local future and reports through its completion callback.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use super::{
    FetchCallback, InsertCallback, LeaderboardBackend, LeaderboardConfig, LeaderboardEntry,
    LeaderboardError, NewEntry,
};

#[derive(Debug, Clone)]
pub struct RestLeaderboard {
    config: LeaderboardConfig,
}

impl RestLeaderboard {
    pub fn new(config: LeaderboardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LeaderboardConfig {
        &self.config
    }

    fn headers(&self, with_body: bool) -> Result<Headers, LeaderboardError> {
        let headers = Headers::new().map_err(js_error)?;
        headers.set("apikey", &self.config.api_key).map_err(js_error)?;
        headers
            .set("Authorization", &format!("Bearer {}", self.config.api_key))
            .map_err(js_error)?;
        if with_body {
            headers.set("Content-Type", "application/json").map_err(js_error)?;
            headers.set("Prefer", "return=minimal").map_err(js_error)?;
        }
        Ok(headers)
    }

    fn request(
        &self,
        method: &str,
        url: &str,
        body: Option<String>,
    ) -> Result<Request, LeaderboardError> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        opts.set_headers(&self.headers(body.is_some())?);
        if let Some(body) = body {
            opts.set_body(&JsValue::from_str(&body));
        }
        Request::new_with_str_and_init(url, &opts).map_err(js_error)
    }
}

/// Send a request and return the response body on a 2xx status
async fn send(request: Request) -> Result<String, LeaderboardError> {
    let window =
        web_sys::window().ok_or_else(|| LeaderboardError::Transport("no window".into()))?;
    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?;
    let response: Response = response.dyn_into().map_err(js_error)?;

    if !response.ok() {
        return Err(LeaderboardError::Status(response.status()));
    }

    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    Ok(text.as_string().unwrap_or_default())
}

fn js_error(value: JsValue) -> LeaderboardError {
    LeaderboardError::Transport(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}

/// Decode a list response body
fn decode_rows(body: &str) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
    serde_json::from_str(body).map_err(|e| LeaderboardError::Decode(e.to_string()))
}

impl LeaderboardBackend for RestLeaderboard {
    fn list_top(&self, limit: usize, done: FetchCallback) {
        let request = match self.request("GET", &self.config.list_url(limit), None) {
            Ok(request) => request,
            Err(err) => return done(Err(err)),
        };
        spawn_local(async move {
            let result = send(request).await.and_then(|body| decode_rows(&body));
            done(result);
        });
    }

    fn insert(&self, entry: NewEntry, done: InsertCallback) {
        let body = match serde_json::to_string(&entry) {
            Ok(body) => body,
            Err(e) => return done(Err(LeaderboardError::Decode(e.to_string()))),
        };
        let request = match self.request("POST", &self.config.insert_url(), Some(body)) {
            Ok(request) => request,
            Err(err) => return done(Err(err)),
        };
        spawn_local(async move {
            done(send(request).await.map(|_| ()));
        });
    }
}
