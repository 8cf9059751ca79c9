//! Pure functions that cut raw provider payloads down to the typed shapes the
//! pipeline works with. Anything without a field in the output types (authors,
//! revisions, comments, scores, flags) is dropped on the way through.

use std::collections::{BTreeSet, HashSet};

use serde_json::Value;
use url::Url;

use crate::{Device, GuideStep, GuideSummary, RawGuide, SanitizedGuideContent, SearchHit};

pub fn sanitize_guide(raw: &RawGuide) -> SanitizedGuideContent {
    let guide = raw.as_value();

    let mut raw_steps: Vec<(Option<i64>, usize, &Value)> = guide
        .get("steps")
        .and_then(Value::as_array)
        .map(|steps| {
            steps
                .iter()
                .enumerate()
                .map(|(index, step)| (order_key(step), index, step))
                .collect()
        })
        .unwrap_or_default();
    raw_steps.sort_by_key(|(order, index, _)| (order.is_none(), order.unwrap_or_default(), *index));

    let steps = raw_steps
        .into_iter()
        .map(|(_, _, step)| (step_text(step), step_images(step), step))
        .filter(|(text, images, _)| !text.is_empty() || !images.is_empty())
        .enumerate()
        .map(|(index, (text, image_urls, step))| GuideStep {
            order: index as u32 + 1,
            text,
            image_urls,
            tools: text_set(step.get("tools")),
            parts: text_set(step.get("parts")),
        })
        .collect();

    SanitizedGuideContent {
        title: text_field(guide, "title"),
        subject: text_field(guide, "subject"),
        introduction: first_text_field(guide, &["introduction_raw", "introduction"]),
        difficulty: text_field(guide, "difficulty"),
        time_required: text_field(guide, "time_required"),
        tools: text_set(guide.get("tools")),
        parts: text_set(guide.get("parts")),
        steps,
    }
}

pub fn sanitize_devices(devices: Vec<Device>, limit: usize) -> Vec<Device> {
    let mut seen = HashSet::new();
    devices
        .into_iter()
        .filter_map(|device| {
            let id = collapse_whitespace(&device.id);
            if id.is_empty() || !seen.insert(id.to_lowercase()) {
                return None;
            }
            let name = collapse_whitespace(&device.name);
            let name = if name.is_empty() { id.clone() } else { name };
            Some(Device { id, name })
        })
        .take(limit)
        .collect()
}

pub fn sanitize_guide_listing(guides: Vec<GuideSummary>) -> Vec<GuideSummary> {
    let mut seen = HashSet::new();
    guides
        .into_iter()
        .filter_map(|guide| {
            let title = collapse_whitespace(&guide.title);
            if title.is_empty() || !seen.insert(guide.id) {
                return None;
            }
            Some(GuideSummary {
                id: guide.id,
                title,
                summary: collapse_whitespace(&strip_markup(&guide.summary)),
            })
        })
        .collect()
}

pub fn sanitize_search_hits(hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter_map(|hit| {
            let url = hit.url.trim().to_string();
            if !is_absolute_http_url(&url) || !seen.insert(url.clone()) {
                return None;
            }
            let title = collapse_whitespace(&strip_markup(&hit.title));
            let title = if title.is_empty() {
                Url::parse(&url)
                    .ok()
                    .and_then(|parsed| parsed.host_str().map(str::to_string))
                    .unwrap_or_else(|| url.clone())
            } else {
                title
            };
            Some(SearchHit {
                title,
                snippet: collapse_whitespace(&strip_markup(&hit.snippet)),
                url,
            })
        })
        .take(limit)
        .collect()
}

pub fn is_absolute_http_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

/// Removes HTML tags and decodes entities. A `<` that cannot open a tag
/// (followed by a space or a digit, say) is kept as text.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '<' if !in_tag && chars.peek().is_some_and(|next| opens_tag(*next)) => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    html_escape::decode_html_entities(&out).replace('\u{a0}', " ")
}

fn opens_tag(next: char) -> bool {
    next.is_ascii_alphabetic() || next == '/' || next == '!'
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn order_key(step: &Value) -> Option<i64> {
    match step.get("orderby")? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn step_text(step: &Value) -> String {
    let mut pieces = Vec::new();
    for key in ["title", "text"] {
        if let Some(text) = step.get(key).and_then(Value::as_str) {
            let text = text.trim();
            if !text.is_empty() {
                pieces.push(text.to_string());
            }
        }
    }
    if let Some(lines) = step.get("lines").and_then(Value::as_array) {
        for line in lines {
            let text = line
                .get("text_raw")
                .or_else(|| line.get("text"))
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default();
            if !text.is_empty() {
                pieces.push(text.to_string());
            }
        }
    }
    pieces.join("\n")
}

fn step_images(step: &Value) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let mut push = |candidate: Option<&str>| {
        if let Some(candidate) = candidate.map(str::trim) {
            if is_absolute_http_url(candidate) && !urls.iter().any(|url| url == candidate) {
                urls.push(candidate.to_string());
            }
        }
    };

    if let Some(media) = step
        .get("media")
        .and_then(|media| media.get("data"))
        .and_then(Value::as_array)
    {
        for image in media {
            push(
                image
                    .get("standard")
                    .or_else(|| image.get("original"))
                    .and_then(Value::as_str),
            );
        }
    }
    if let Some(lines) = step.get("lines").and_then(Value::as_array) {
        for line in lines {
            push(
                line.get("image")
                    .and_then(|image| image.get("standard"))
                    .and_then(Value::as_str),
            );
        }
    }
    urls
}

fn text_set(value: Option<&Value>) -> BTreeSet<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text.as_str()),
                    Value::Object(_) => item
                        .get("text")
                        .or_else(|| item.get("name"))
                        .and_then(Value::as_str),
                    _ => None,
                })
                .map(collapse_whitespace)
                .filter(|text| !text.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn text_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

fn first_text_field(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| text_field(value, key))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_markup_removes_tags_and_entities() {
        assert_eq!(
            collapse_whitespace(&strip_markup("<b>Fan</b> &amp; heatsink&nbsp;cleaning")),
            "Fan & heatsink cleaning"
        );
    }

    #[test]
    fn bare_angle_brackets_stay_in_text() {
        assert_eq!(
            strip_markup("Keep temps < 80C or the fan throttles"),
            "Keep temps < 80C or the fan throttles"
        );
        assert_eq!(strip_markup("a<3 b"), "a<3 b");
        assert_eq!(
            collapse_whitespace(&strip_markup("<!-- ad --><p>x &lt;b&gt;</p>")),
            "x <b>"
        );
    }

    #[test]
    fn only_absolute_http_urls_pass() {
        assert!(is_absolute_http_url("https://guide-images.cdn.ifixit.com/a.jpg"));
        assert!(!is_absolute_http_url("/igi/a.jpg"));
        assert!(!is_absolute_http_url("javascript:alert(1)"));
        assert!(!is_absolute_http_url("ftp://example.com/a.jpg"));
    }
}
