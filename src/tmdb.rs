//! TMDB catalog client.
//!
//! Three read-only calls: discovery by genre, trailer lookup and similar
//! titles. No retries and no caching here; the paginator decides what to
//! fetch and when.

use chrono::{Datelike, NaiveDate};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::constants::constants;
use crate::query::MoodQuery;

// --- Types ---

/// A movie as returned by the catalog. Read-only to the rest of the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
  pub id: u64,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub poster_path: Option<String>,
  #[serde(default)]
  pub vote_average: f64,
  #[serde(default)]
  pub release_date: Option<String>,
  #[serde(default)]
  pub overview: Option<String>,
}

impl Title {
  /// Year part of `release_date` (`YYYY-MM-DD`), if it parses.
  pub fn release_year(&self) -> Option<i32> {
    let date = self.release_date.as_deref()?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok().map(|d| d.year())
  }

  pub fn poster_url(&self) -> Option<String> {
    self.poster_path.as_ref().map(|p| format!("{}{}", constants().image_base_url, p))
  }
}

/// One page of discovery results and the query that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
  pub page: u32,
  pub query: MoodQuery,
  pub titles: Vec<Title>,
}

/// Trailer and similar titles for the detail view. Either half may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleDetail {
  pub title_id: u64,
  pub trailer_key: Option<String>,
  pub similar: Vec<Title>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
  #[error("HTTP client error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Catalog API returned status {status}: {body}")]
  Status { status: StatusCode, body: String },

  #[error("Failed to parse catalog response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("Invalid catalog URL: {0}")]
  Url(String),
}

// --- Wire format ---

#[derive(Debug, Deserialize)]
struct Results<T> {
  results: Option<Vec<T>>,
}

impl<T> Results<T> {
  fn into_vec(self) -> Vec<T> {
    self.results.unwrap_or_default()
  }
}

#[derive(Debug, Clone, Deserialize)]
struct Video {
  key: String,
  site: String,
}

/// First YouTube video key, if any.
fn pick_trailer(videos: &[Video]) -> Option<String> {
  videos.iter().find(|v| v.site == "YouTube").map(|v| v.key.clone())
}

// --- Client ---

#[derive(Clone)]
pub struct CatalogClient {
  http: Client,
  api_key: String,
  base_url: String,
}

impl CatalogClient {
  pub fn new(api_key: String, base_url: String) -> Self {
    Self { http: Client::new(), api_key, base_url: base_url.trim_end_matches('/').to_string() }
  }

  fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, CatalogError> {
    let mut all: Vec<(&str, &str)> = vec![("api_key", self.api_key.as_str())];
    all.extend_from_slice(params);
    Url::parse_with_params(&format!("{}{}", self.base_url, path), &all).map_err(|e| CatalogError::Url(e.to_string()))
  }

  pub fn discover_url(&self, query: &MoodQuery, page: u32) -> Result<Url, CatalogError> {
    let genres = query.genres_param();
    let page = page.to_string();
    self.endpoint("/discover/movie", &[("with_genres", &genres), ("sort_by", query.sort.as_param()), ("page", &page)])
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
    // The query string carries the API key; log the path only.
    let path = url.path().to_string();
    let response = self.http.get(url).send().await?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(CatalogError::Status { status, body });
    }

    let text = response.text().await?;
    debug!(path = %path, bytes = text.len(), "catalog response");
    serde_json::from_str(&text).map_err(|e| {
      warn!(path = %path, err = %e, "catalog response did not decode");
      CatalogError::Decode(e)
    })
  }

  pub async fn discover(&self, query: &MoodQuery, page: u32) -> Result<ResultPage, CatalogError> {
    let url = self.discover_url(query, page)?;
    let titles = self.get_json::<Results<Title>>(url).await?.into_vec();
    info!(query = %query, page, results = titles.len(), "discover completed");
    Ok(ResultPage { page, query: query.clone(), titles })
  }

  /// YouTube trailer key for a title. No trailer is `Ok(None)`, not an error.
  pub async fn videos(&self, title_id: u64) -> Result<Option<String>, CatalogError> {
    let url = self.endpoint(&format!("/movie/{}/videos", title_id), &[])?;
    let videos = self.get_json::<Results<Video>>(url).await?.into_vec();
    Ok(pick_trailer(&videos))
  }

  /// Similar titles, truncated to `similar_limit` regardless of upstream count.
  pub async fn similar(&self, title_id: u64) -> Result<Vec<Title>, CatalogError> {
    let url = self.endpoint(&format!("/movie/{}/similar", title_id), &[])?;
    let mut titles = self.get_json::<Results<Title>>(url).await?.into_vec();
    titles.truncate(constants().similar_limit);
    Ok(titles)
  }

  /// Trailer and similar titles fetched concurrently. Best-effort: a failed
  /// half is logged and left empty.
  pub async fn detail(&self, title_id: u64) -> TitleDetail {
    let (trailer, similar) = futures::join!(self.videos(title_id), self.similar(title_id));
    let trailer_key = trailer.unwrap_or_else(|e| {
      warn!(title_id, err = %e, "trailer lookup failed");
      None
    });
    let similar = similar.unwrap_or_else(|e| {
      warn!(title_id, err = %e, "similar lookup failed");
      Vec::new()
    });
    TitleDetail { title_id, trailer_key, similar }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mood::{MoodLabel, classify};
  use crate::query::to_query;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;

  /// Serve exactly one canned HTTP response per body, in order. Resolves to
  /// the request lines that were received.
  async fn serve(responses: Vec<(u16, String)>) -> (String, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
      let mut seen = Vec::new();
      for (status, body) in responses {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
          let n = sock.read(&mut chunk).await.unwrap();
          if n == 0 {
            break;
          }
          buf.extend_from_slice(&chunk[..n]);
        }
        let request = String::from_utf8_lossy(&buf);
        seen.push(request.lines().next().unwrap_or_default().to_string());
        let reply = format!(
          "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
          status,
          body.len(),
          body
        );
        sock.write_all(reply.as_bytes()).await.unwrap();
        sock.shutdown().await.ok();
      }
      seen
    });
    (base, handle)
  }

  fn client(base: &str) -> CatalogClient {
    CatalogClient::new("k".to_string(), base.to_string())
  }

  #[test]
  fn happy_text_discovers_comedy() {
    let mood = classify("I feel great and happy today");
    assert_eq!(mood, MoodLabel::Happy);
    let url = client("https://api.themoviedb.org/3").discover_url(&to_query(mood), 3).unwrap();
    assert_eq!(url.path(), "/3/discover/movie");
    let pairs: Vec<(String, String)> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
    assert!(pairs.contains(&("with_genres".to_string(), "35".to_string())));
    assert!(pairs.contains(&("sort_by".to_string(), "popularity.desc".to_string())));
    assert!(pairs.contains(&("page".to_string(), "3".to_string())));
    assert!(pairs.contains(&("api_key".to_string(), "k".to_string())));
  }

  #[test]
  fn discover_url_keeps_or_genres() {
    let url = client("https://example.test/3/").discover_url(&to_query(MoodLabel::Relaxed), 1).unwrap();
    let genres = url.query_pairs().find(|(k, _)| k == "with_genres").map(|(_, v)| v.into_owned());
    assert_eq!(genres.as_deref(), Some("10749|18"));
  }

  #[test]
  fn title_deserializes_catalog_shape() {
    let json = r#"{
      "id": 550,
      "title": "Fight Club",
      "poster_path": "/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg",
      "vote_average": 8.433,
      "release_date": "1999-10-15",
      "overview": "A ticking-time-bomb insomniac...",
      "genre_ids": [18]
    }"#;
    let title: Title = serde_json::from_str(json).unwrap();
    assert_eq!(title.id, 550);
    assert_eq!(title.release_year(), Some(1999));
    assert_eq!(title.poster_url().as_deref(), Some("https://image.tmdb.org/t/p/w500/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg"));
  }

  #[test]
  fn title_tolerates_missing_fields() {
    let title: Title = serde_json::from_str(r#"{"id": 7, "release_date": ""}"#).unwrap();
    assert_eq!(title.title, "");
    assert_eq!(title.vote_average, 0.0);
    assert_eq!(title.release_year(), None);
    assert_eq!(title.poster_url(), None);
  }

  #[test]
  fn pick_trailer_prefers_youtube() {
    let videos: Results<Video> = serde_json::from_str(
      r#"{"results": [
        {"key": "v1", "site": "Vimeo"},
        {"key": "yt1", "site": "YouTube"},
        {"key": "yt2", "site": "YouTube"}
      ]}"#,
    )
    .unwrap();
    assert_eq!(pick_trailer(&videos.into_vec()).as_deref(), Some("yt1"));
  }

  #[test]
  fn missing_results_is_empty() {
    let empty: Results<Title> = serde_json::from_str(r#"{"page": 9}"#).unwrap();
    assert!(empty.into_vec().is_empty());
    let null: Results<Title> = serde_json::from_str(r#"{"results": null}"#).unwrap();
    assert!(null.into_vec().is_empty());
  }

  #[tokio::test]
  async fn discover_returns_page() {
    let body = r#"{"page": 2, "results": [{"id": 1, "title": "A"}, {"id": 2, "title": "B"}]}"#.to_string();
    let (base, server) = serve(vec![(200, body)]).await;
    let page = client(&base).discover(&to_query(MoodLabel::Sad), 2).await.unwrap();
    assert_eq!(page.page, 2);
    assert_eq!(page.titles.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("GET /discover/movie?"));
    assert!(requests[0].contains("with_genres=18"));
  }

  #[tokio::test]
  async fn discover_propagates_http_status() {
    let (base, _server) = serve(vec![(401, r#"{"status_message": "Invalid API key"}"#.to_string())]).await;
    let err = client(&base).discover(&to_query(MoodLabel::Happy), 1).await.unwrap_err();
    match err {
      CatalogError::Status { status, body } => {
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Invalid API key"));
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[tokio::test]
  async fn similar_truncates_to_limit() {
    let items: Vec<String> = (1..=20).map(|i| format!(r#"{{"id": {i}}}"#)).collect();
    let body = format!(r#"{{"results": [{}]}}"#, items.join(","));
    let (base, _server) = serve(vec![(200, body)]).await;
    let similar = client(&base).similar(550).await.unwrap();
    assert_eq!(similar.len(), 6);
    assert_eq!(similar[0].id, 1);
  }

  #[tokio::test]
  async fn videos_without_trailer_is_none() {
    let (base, _server) = serve(vec![(200, r#"{"results": []}"#.to_string())]).await;
    assert_eq!(client(&base).videos(550).await.unwrap(), None);
  }
}
