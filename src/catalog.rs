//! Search access to the hitmotop catalog: building search URLs, fetching
//! result pages and extracting track records from the returned markup.
//!
//! Extraction is pure (markup in, records out); the fetch wrappers at the
//! bottom are the only functions that touch the network.

use anyhow::{Context, Result};
use image::DynamicImage;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::constants::constants;

/// One parsed search result from the catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
  pub title: String,
  pub artist: String,
  /// Direct-download URL, handed verbatim to the player.
  pub download_url: String,
  /// Cover image URL extracted from the item's inline style, if present.
  pub cover_url: Option<String>,
}

/// Outcome of a catalog search. Keeps "the fetch failed" distinct from
/// "the catalog returned zero matches" so callers and tests can tell them
/// apart; the UI renders both as the no-results indicator.
#[derive(Debug)]
pub enum SearchOutcome {
  Found(Vec<Track>),
  Empty,
  FetchFailed(anyhow::Error),
}

// Fixed structure of the catalog's listing page. Selectors are parsed once;
// the patterns are literals, so a parse failure is a programming error.
static ITEM_SEL: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("li.tracks__item").expect("track item selector must be valid"));
static TITLE_SEL: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("div.track__title").expect("title selector must be valid"));
static ARTIST_SEL: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("div.track__desc").expect("artist selector must be valid"));
static DOWNLOAD_SEL: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("a.track__download-btn").expect("download selector must be valid"));
static COVER_SEL: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("div.track__img").expect("cover selector must be valid"));

// --- Query Builder ---

/// Build the search URL for a free-text query: whitespace runs collapse into
/// `+` separators on the fixed search endpoint.
///
/// An empty query yields the degenerate address with an empty parameter —
/// callers are responsible for not searching on blank input.
pub fn search_url(raw_query: &str) -> String {
  let c = constants();
  let tokens: Vec<&str> = raw_query.split_whitespace().collect();
  format!("{}{}?{}={}", c.catalog_base_url, c.search_path, c.search_query_param, tokens.join("+"))
}

// --- Result Extractor ---

/// Extract all track records from a catalog listing page, in document order.
///
/// A container missing any required field is logged and skipped; a single
/// malformed result never aborts the batch.
pub fn extract_tracks(markup: &str) -> Vec<Track> {
  let document = Html::parse_document(markup);
  let mut tracks = Vec::new();
  for item in document.select(&ITEM_SEL) {
    match extract_track(&item) {
      Some(track) => tracks.push(track),
      None => warn!("skipping malformed track item"),
    }
  }
  tracks
}

fn extract_track(item: &ElementRef) -> Option<Track> {
  let title = element_text(item, &TITLE_SEL)?;
  let artist = element_text(item, &ARTIST_SEL)?;
  let download_url = item.select(&DOWNLOAD_SEL).next()?.value().attr("href")?.to_string();
  // Cover is optional: a missing node, style attribute or url() reference is
  // an absent cover, not a malformed item.
  let cover_url =
    item.select(&COVER_SEL).next().and_then(|el| el.value().attr("style")).and_then(cover_url_from_style);
  Some(Track { title, artist, download_url, cover_url })
}

fn element_text(item: &ElementRef, selector: &Selector) -> Option<String> {
  item.select(selector).next().map(|el| el.text().collect::<String>().trim().to_string())
}

/// Pull the inner URL out of a CSS `url(...)` reference in a style attribute,
/// stripping surrounding quotes of either kind and whitespace.
pub fn cover_url_from_style(style: &str) -> Option<String> {
  let start = style.find("url(")? + 4;
  let end = style[start..].find(')')? + start;
  let url = style[start..end].trim().trim_matches(|c| c == '"' || c == '\'').trim();
  if url.is_empty() { None } else { Some(url.to_string()) }
}

// --- Fetching ---

/// Run a catalog search: one GET, one parse, no retry.
pub async fn search(client: &Client, query: &str) -> SearchOutcome {
  let url = search_url(query);
  debug!(url = %url, "fetching search results");
  let markup = match fetch_markup(client, &url).await {
    Ok(markup) => markup,
    Err(e) => return SearchOutcome::FetchFailed(e),
  };
  let tracks = extract_tracks(&markup);
  if tracks.is_empty() { SearchOutcome::Empty } else { SearchOutcome::Found(tracks) }
}

async fn fetch_markup(client: &Client, url: &str) -> Result<String> {
  client
    .get(url)
    .send()
    .await
    .with_context(|| format!("Failed to fetch {}", url))?
    .error_for_status()
    .context("Search request failed")?
    .text()
    .await
    .context("Failed to read search response body")
}

/// Fetch and decode a cover image. Best-effort; the caller logs and swallows
/// failures.
pub async fn fetch_cover(client: &Client, url: &str) -> Result<DynamicImage> {
  let bytes = client
    .get(url)
    .send()
    .await
    .with_context(|| format!("Failed to fetch cover {}", url))?
    .error_for_status()
    .context("Cover request failed")?
    .bytes()
    .await
    .with_context(|| format!("Failed to read image bytes from {}", url))?;
  image::load_from_memory(&bytes).with_context(|| format!("Failed to decode cover image (URL: {})", url))
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- search_url ---

  #[test]
  fn search_url_collapses_whitespace() {
    let url = search_url("  foo   bar ");
    assert!(url.ends_with("/search?q=foo+bar"), "got {}", url);
  }

  #[test]
  fn search_url_single_token() {
    assert!(search_url("foo").ends_with("/search?q=foo"));
  }

  #[test]
  fn search_url_empty_is_degenerate() {
    assert!(search_url("   ").ends_with("/search?q="));
  }

  // --- cover_url_from_style ---

  #[test]
  fn cover_url_single_quotes() {
    let style = "background-image: url('https://example.com/a.jpg');";
    assert_eq!(cover_url_from_style(style).as_deref(), Some("https://example.com/a.jpg"));
  }

  #[test]
  fn cover_url_double_quotes() {
    let style = r#"background-image: url("https://example.com/a.jpg");"#;
    assert_eq!(cover_url_from_style(style).as_deref(), Some("https://example.com/a.jpg"));
  }

  #[test]
  fn cover_url_unquoted() {
    let style = "background-image: url(https://example.com/a.jpg)";
    assert_eq!(cover_url_from_style(style).as_deref(), Some("https://example.com/a.jpg"));
  }

  #[test]
  fn cover_url_inner_whitespace_trimmed() {
    let style = "background-image: url( 'https://example.com/a.jpg' )";
    assert_eq!(cover_url_from_style(style).as_deref(), Some("https://example.com/a.jpg"));
  }

  #[test]
  fn cover_url_absent() {
    assert_eq!(cover_url_from_style("height: 40px;"), None);
    assert_eq!(cover_url_from_style("background-image: url()"), None);
  }

  // --- extract_tracks ---

  fn item(title: &str, artist: &str, href: &str, style: Option<&str>) -> String {
    let img = match style {
      Some(s) => format!(r#"<div class="track__img" style="{}"></div>"#, s),
      None => r#"<div class="track__img"></div>"#.to_string(),
    };
    format!(
      r#"<li class="tracks__item">
           {img}
           <div class="track__title">{title}</div>
           <div class="track__desc">{artist}</div>
           <a class="track__download-btn" href="{href}">Download</a>
         </li>"#
    )
  }

  fn page(items: &[String]) -> String {
    format!(r#"<html><body><ul class="tracks">{}</ul></body></html>"#, items.join("\n"))
  }

  #[test]
  fn extract_tracks_in_document_order() {
    let markup = page(&[
      item("First", "Artist A", "/get/1", Some("background-image: url('https://img/1.jpg');")),
      item("Second", "Artist B", "/get/2", None),
    ]);
    let tracks = extract_tracks(&markup);
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].title, "First");
    assert_eq!(tracks[0].artist, "Artist A");
    assert_eq!(tracks[0].download_url, "/get/1");
    assert_eq!(tracks[0].cover_url.as_deref(), Some("https://img/1.jpg"));
    assert_eq!(tracks[1].title, "Second");
    assert_eq!(tracks[1].cover_url, None);
  }

  #[test]
  fn extract_tracks_skips_malformed_items() {
    // Middle item has no download link; the batch must still yield the rest.
    let broken = r#"<li class="tracks__item"><div class="track__title">Broken</div></li>"#.to_string();
    let markup = page(&[
      item("First", "A", "/get/1", None),
      broken,
      item("Third", "C", "/get/3", None),
    ]);
    let tracks = extract_tracks(&markup);
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].title, "First");
    assert_eq!(tracks[1].title, "Third");
  }

  #[test]
  fn extract_tracks_text_is_trimmed() {
    let markup = page(&[item("  Padded  ", "\n  Artist  \n", "/get/1", None)]);
    let tracks = extract_tracks(&markup);
    assert_eq!(tracks[0].title, "Padded");
    assert_eq!(tracks[0].artist, "Artist");
  }

  #[test]
  fn extract_tracks_empty_page() {
    assert!(extract_tracks("<html><body></body></html>").is_empty());
    assert!(extract_tracks("").is_empty());
  }
}
