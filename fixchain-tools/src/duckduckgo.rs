use std::time::Duration;

use reqwest::Client;
use tracing::Instrument;
use url::Url;

use fixchain_core::sanitize::strip_markup;
use fixchain_core::{SearchHit, ToolError, WebSearch};

use crate::SearchError;

pub const DUCKDUCKGO_BASE_URL: &str = "https://html.duckduckgo.com";
const NAME: &str = "duckduckgo";
const RESULT_LINK: &str = "class=\"result__a\"";
const RESULT_SNIPPET: &str = "class=\"result__snippet\"";

/// Keyless search through DuckDuckGo's HTML endpoint.
#[derive(Clone)]
pub struct DuckDuckGoSearch {
    http: Client,
    base_url: String,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self, SearchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("fixchain/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| SearchError::Config(format!("http client: {err}")))?;
        Ok(Self {
            http,
            base_url: DUCKDUCKGO_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn request(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!("{}/html/", self.base_url.trim_end_matches('/'));
        let response = self.http.get(url).query(&[("q", query)]).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Api {
                provider: NAME,
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("request failed").to_string(),
            });
        }

        let html = response.text().await?;
        Ok(parse_html_results(&html, max_results))
    }
}

/// Extracts up to `limit` results from a DuckDuckGo HTML results page.
pub fn parse_html_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    for chunk in html.split(RESULT_LINK).skip(1) {
        if hits.len() >= limit {
            break;
        }
        let Some((href, rest)) = attribute_value(chunk, "href") else {
            continue;
        };
        let Some(title) = element_text(rest, "a") else {
            continue;
        };
        let url = decode_result_url(&href);
        let title = plain_text(&title);
        if url.is_empty() || title.is_empty() || is_internal_link(&url) {
            continue;
        }

        let snippet = chunk
            .find(RESULT_SNIPPET)
            .and_then(|start| {
                let tag = open_tag_name(&chunk[..start])?;
                element_text(&chunk[start..], tag)
            })
            .map(|text| plain_text(&text))
            .unwrap_or_default();

        hits.push(SearchHit {
            title,
            snippet,
            url,
        });
    }
    hits
}

fn plain_text(html: &str) -> String {
    strip_markup(html).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Value of the first `name="..."` in `chunk` and the text following it.
fn attribute_value<'a>(chunk: &'a str, name: &str) -> Option<(String, &'a str)> {
    let marker = format!("{name}=\"");
    let start = chunk.find(&marker)? + marker.len();
    let rest = &chunk[start..];
    let end = rest.find('"')?;
    Some((rest[..end].replace("&amp;", "&"), &rest[end + 1..]))
}

/// Inner HTML of the `tag` element whose opening tag is currently open in
/// `rest`, up to its matching close tag.
fn element_text(rest: &str, tag: &str) -> Option<String> {
    let body = &rest[rest.find('>')? + 1..];
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut depth = 0usize;
    let mut cursor = 0;
    loop {
        let next_close = cursor + body[cursor..].find(&close)?;
        match body[cursor..next_close].find(&open) {
            Some(offset) => {
                cursor += offset + open.len();
                if body[cursor..].starts_with(|c: char| c == '>' || c == '/' || c.is_whitespace()) {
                    depth += 1;
                }
            }
            None if depth == 0 => return Some(body[..next_close].to_string()),
            None => {
                depth -= 1;
                cursor = next_close + close.len();
            }
        }
    }
}

/// Name of the tag opened by the last `<` in `before`.
fn open_tag_name(before: &str) -> Option<&str> {
    let name = &before[before.rfind('<')? + 1..];
    let end = name
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(name.len());
    (end > 0).then(|| &name[..end])
}

/// Result links go through a `/l/?uddg=<target>` redirect; unwrap it.
fn decode_result_url(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    match Url::parse(&absolute) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, target)| target.into_owned())
            .unwrap_or(absolute),
        Err(_) => String::new(),
    }
}

/// Sponsored results point back at duckduckgo.com.
fn is_internal_link(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.ends_with("duckduckgo.com")))
        .unwrap_or(false)
}

#[async_trait::async_trait]
impl WebSearch for DuckDuckGoSearch {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ToolError> {
        let span = tracing::info_span!("duckduckgo_search", query = %query, max_results);
        async move {
            let hits = self
                .request(query, max_results)
                .await
                .map_err(|err| err.into_tool_error(NAME, query))?;
            tracing::info!(count = hits.len(), "duckduckgo returned hits");
            Ok(hits)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::decode_result_url;

    #[test]
    fn redirect_links_are_unwrapped() {
        assert_eq!(
            decode_result_url("//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.reddit.com%2Fr%2FPS5%2F&rut=abc"),
            "https://www.reddit.com/r/PS5/"
        );
        assert_eq!(
            decode_result_url("https://example.com/page"),
            "https://example.com/page"
        );
        assert_eq!(decode_result_url("/relative"), "");
    }
}
