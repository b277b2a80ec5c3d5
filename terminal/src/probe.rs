//! Live context: fetch a URL and describe what happened.
//!
//! The blocking client only exposes time-to-first-byte and total time, so
//! the DNS, TCP and TLS splits stay at zero and the boot log falls back to
//! its defaults for them.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use lostpage_engine::context::{ElementCount, MetaTag};
use lostpage_engine::{ConnectionFacts, Context, DomSnapshot, TimingFacts};
use regex_lite::Regex;
use reqwest::header::HeaderMap;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const TOP_ELEMENTS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex_lite::Error),
}

pub fn probe(url: &str) -> Result<Context, ProbeError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("lostpage/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let started = Instant::now();
    let response = client.get(url).send()?;
    let ttfb = started.elapsed();

    let http_version = format!("{:?}", response.version());
    let server_ip = response
        .remote_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_default();
    let (cf_ray, colo) = cloudflare_ray(response.headers());
    let status = response.status();

    let body = response.bytes()?;
    let total = started.elapsed();
    let html = String::from_utf8_lossy(&body);
    let dom = scan_dom(&html)?;

    let ms = |d: Duration| d.as_secs_f64() * 1_000.0;
    let size = body.len() as u64;
    tracing::info!(
        url,
        %status,
        ttfb_ms = ms(ttfb),
        total_ms = ms(total),
        bytes = size,
        nodes = dom.total_nodes,
        "probe finished"
    );

    Ok(Context {
        timing: TimingFacts {
            ttfb: ms(ttfb),
            download: ms(total.saturating_sub(ttfb)),
            total: ms(total),
            transfer_size: size,
            encoded_body_size: size,
            decoded_body_size: html.len() as u64,
            protocol: protocol_name(&http_version),
            ..TimingFacts::default()
        },
        dom,
        connection: ConnectionFacts {
            server_ip,
            http_version,
            cf_ray,
            colo,
            ..ConnectionFacts::default()
        },
    })
}

/// `HTTP/2.0` -> `h2`, matching the browser's `nextHopProtocol` names.
fn protocol_name(http_version: &str) -> String {
    match http_version {
        "HTTP/0.9" => "http/0.9",
        "HTTP/1.0" => "http/1.0",
        "HTTP/1.1" => "http/1.1",
        "HTTP/2.0" => "h2",
        "HTTP/3.0" => "h3",
        other => other,
    }
    .to_string()
}

/// Split `cf-ray: 8a1b2c3d4e5f6789-AMS` into the ray id and the colo.
fn cloudflare_ray(headers: &HeaderMap) -> (String, String) {
    let Some(ray) = headers.get("cf-ray").and_then(|v| v.to_str().ok()) else {
        return (String::new(), String::new());
    };
    match ray.rsplit_once('-') {
        Some((_, colo)) => (ray.to_string(), colo.to_string()),
        None => (ray.to_string(), String::new()),
    }
}

fn section<'a>(html: &'a str, tag: &str) -> &'a str {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    match (lower.find(&open), lower.find(&close)) {
        (Some(start), Some(end)) if start < end => html.get(start..end).unwrap_or(""),
        _ => "",
    }
}

/// Rough DOM census from raw HTML.
pub fn scan_dom(html: &str) -> Result<DomSnapshot, regex_lite::Error> {
    let open_tag = Regex::new(r"<([a-zA-Z][a-zA-Z0-9-]*)")?;
    let doctype = Regex::new(r"(?i)<!doctype\s+([^>]+)>")?;
    let lang = Regex::new(r#"(?i)<html[^>]*\blang\s*=\s*["']([^"']*)["']"#)?;
    let title = Regex::new(r"(?is)<title[^>]*>(.*?)</title>")?;
    let script = Regex::new(r#"(?i)<script[^>]*\bsrc\s*=\s*["']([^"']+)["']"#)?;
    let link = Regex::new(r"(?i)<link\b[^>]*>")?;
    let href = Regex::new(r#"(?i)\bhref\s*=\s*["']([^"']+)["']"#)?;
    let meta = Regex::new(
        r#"(?i)<meta[^>]*\bname\s*=\s*["']([^"']+)["'][^>]*\bcontent\s*=\s*["']([^"']*)["']"#,
    )?;
    let anchor = Regex::new(r#"(?i)<a\b[^>]*\bhref\s*=\s*["']([^"']+)["']"#)?;

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for caps in open_tag.captures_iter(html) {
        *counts.entry(caps[1].to_ascii_lowercase()).or_default() += 1;
    }
    let mut elements: Vec<ElementCount> = counts
        .iter()
        .map(|(tag, count)| ElementCount {
            tag: tag.clone(),
            count: *count,
        })
        .collect();
    elements.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    elements.truncate(TOP_ELEMENTS);

    let count_in = |fragment: &str| open_tag.find_iter(fragment).count() as u64;
    let capture = |re: &Regex| {
        re.captures(html)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default()
    };

    Ok(DomSnapshot {
        total_nodes: counts.values().sum(),
        head_elements: count_in(section(html, "head")).saturating_sub(1),
        body_elements: count_in(section(html, "body")).saturating_sub(1),
        doctype: capture(&doctype),
        html_lang: capture(&lang),
        title: capture(&title),
        elements,
        scripts: script
            .captures_iter(html)
            .map(|c| c[1].to_string())
            .collect(),
        stylesheets: link
            .find_iter(html)
            .map(|m| m.as_str())
            .filter(|tag| tag.to_ascii_lowercase().contains("stylesheet"))
            .filter_map(|tag| href.captures(tag).map(|c| c[1].to_string()))
            .collect(),
        meta: meta
            .captures_iter(html)
            .map(|c| MetaTag {
                name: c[1].to_string(),
                content: c[2].to_string(),
            })
            .collect(),
        links: anchor
            .captures_iter(html)
            .map(|c| c[1].to_string())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderValue;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title> Not Found </title>
  <meta name="description" content="missing">
  <link rel="stylesheet" href="/site.css">
  <link rel="icon" href="/favicon.ico">
  <script src="/app.js"></script>
</head>
<body>
  <div><p>Gone</p><p>Really</p></div>
  <a href="/">home</a>
</body>
</html>"#;

    #[test]
    fn scans_a_small_page() {
        let dom = scan_dom(PAGE).expect("patterns compile");
        assert_eq!(dom.doctype, "html");
        assert_eq!(dom.html_lang, "en");
        assert_eq!(dom.title, "Not Found");
        assert_eq!(dom.scripts, vec!["/app.js"]);
        assert_eq!(dom.stylesheets, vec!["/site.css"]);
        assert_eq!(dom.links, vec!["/"]);
        assert_eq!(dom.meta.len(), 1);
        assert_eq!(dom.meta[0].name, "description");
        assert_eq!(dom.total_nodes, 12);
        assert_eq!(dom.head_elements, 5);
        assert_eq!(dom.body_elements, 4);
        assert_eq!(dom.elements[0].tag, "link");
        assert_eq!(dom.elements[0].count, 2);
    }

    #[test]
    fn empty_body_scans_to_defaults() {
        let dom = scan_dom("").expect("patterns compile");
        assert_eq!(dom, DomSnapshot::default());
    }

    #[test]
    fn splits_cloudflare_ray() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-ray", HeaderValue::from_static("8a1b2c3d4e5f6789-AMS"));
        assert_eq!(
            cloudflare_ray(&headers),
            ("8a1b2c3d4e5f6789-AMS".to_string(), "AMS".to_string())
        );
        assert_eq!(cloudflare_ray(&HeaderMap::new()), (String::new(), String::new()));
    }

    #[test]
    fn protocol_names_follow_browser_style() {
        assert_eq!(protocol_name("HTTP/2.0"), "h2");
        assert_eq!(protocol_name("HTTP/1.1"), "http/1.1");
    }
}
