//! Real-world facts interpolated into the boot log.
//!
//! Three independent read-only records feed a [`Context`]: network timing, a
//! snapshot of the rendered document, and transport facts gathered on the
//! server side. The engine never produces these itself; front-ends implement
//! the source traits (or load a JSON file) and hand the result over once.

use serde::{Deserialize, Serialize};

/// Network and resource timing, all durations in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimingFacts {
    pub dns: f64,
    pub tcp: f64,
    pub tls: f64,
    pub ttfb: f64,
    pub download: f64,
    pub total: f64,
    pub transfer_size: u64,
    pub encoded_body_size: u64,
    pub decoded_body_size: u64,
    /// Negotiated protocol, e.g. `h2` or `http/1.1`
    pub protocol: String,
    pub resources: Vec<ResourceTiming>,
}

/// One sub-resource fetched while loading the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceTiming {
    pub name: String,
    pub initiator_type: String,
    pub duration: f64,
    pub transfer_size: u64,
}

/// Structural snapshot of the rendered document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomSnapshot {
    pub total_nodes: u64,
    pub head_elements: u64,
    pub body_elements: u64,
    pub doctype: String,
    pub html_lang: String,
    pub title: String,
    pub elements: Vec<ElementCount>,
    pub scripts: Vec<String>,
    pub stylesheets: Vec<String>,
    pub meta: Vec<MetaTag>,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementCount {
    pub tag: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaTag {
    pub name: String,
    pub content: String,
}

/// Transport and certificate facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionFacts {
    pub server_ip: String,
    pub tls_version: String,
    pub tls_cipher: String,
    pub http_version: String,
    pub cf_ray: String,
    pub colo: String,
    pub certificate_pack: Option<CertificatePack>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificatePack {
    pub issuer: String,
    pub expires_on: String,
    pub hosts: Vec<String>,
}

/// Source of [`TimingFacts`].
pub trait TimingSource {
    fn timing(&self) -> TimingFacts;
}

/// Source of a [`DomSnapshot`].
pub trait DomSource {
    fn dom(&self) -> DomSnapshot;
}

/// Source of [`ConnectionFacts`].
pub trait ConnectionSource {
    fn connection(&self) -> ConnectionFacts;
}

/// Everything computed message text may read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    pub timing: TimingFacts,
    pub dom: DomSnapshot,
    pub connection: ConnectionFacts,
}

impl Context {
    /// Query each source once.
    pub fn gather(
        timing: &dyn TimingSource,
        dom: &dyn DomSource,
        connection: &dyn ConnectionSource,
    ) -> Self {
        Self {
            timing: timing.timing(),
            dom: dom.dom(),
            connection: connection.connection(),
        }
    }

    /// Parse a JSON document shaped like `{ "timing": .., "dom": .., "connection": .. }`.
    /// Missing sections and fields fall back to their defaults.
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Plausible facts for a small static site, used when nothing was measured.
    pub fn sample() -> Self {
        Self {
            timing: TimingFacts {
                dns: 12.4,
                tcp: 18.9,
                tls: 24.1,
                ttfb: 86.0,
                download: 9.7,
                total: 412.0,
                transfer_size: 18_432,
                encoded_body_size: 17_920,
                decoded_body_size: 61_440,
                protocol: "h2".to_string(),
                resources: vec![
                    ResourceTiming {
                        name: "/assets/site.css".to_string(),
                        initiator_type: "link".to_string(),
                        duration: 31.2,
                        transfer_size: 6_210,
                    },
                    ResourceTiming {
                        name: "/assets/app.js".to_string(),
                        initiator_type: "script".to_string(),
                        duration: 54.8,
                        transfer_size: 22_874,
                    },
                ],
            },
            dom: DomSnapshot {
                total_nodes: 214,
                head_elements: 18,
                body_elements: 196,
                doctype: "html".to_string(),
                html_lang: "en".to_string(),
                title: "404 - Page not found".to_string(),
                elements: vec![
                    ElementCount {
                        tag: "div".to_string(),
                        count: 61,
                    },
                    ElementCount {
                        tag: "span".to_string(),
                        count: 44,
                    },
                    ElementCount {
                        tag: "a".to_string(),
                        count: 17,
                    },
                ],
                scripts: vec!["/assets/app.js".to_string()],
                stylesheets: vec!["/assets/site.css".to_string()],
                meta: vec![MetaTag {
                    name: "viewport".to_string(),
                    content: "width=device-width, initial-scale=1".to_string(),
                }],
                links: vec!["/".to_string(), "/blog".to_string(), "/about".to_string()],
            },
            connection: ConnectionFacts {
                server_ip: "104.21.48.7".to_string(),
                tls_version: "TLSv1.3".to_string(),
                tls_cipher: "AEAD-AES128-GCM-SHA256".to_string(),
                http_version: "HTTP/2".to_string(),
                cf_ray: "8f2a61c0dc4e2b7a-AMS".to_string(),
                colo: "AMS".to_string(),
                certificate_pack: Some(CertificatePack {
                    issuer: "Google Trust Services".to_string(),
                    expires_on: "2026-12-30".to_string(),
                    hosts: vec!["example.dev".to_string(), "*.example.dev".to_string()],
                }),
            },
        }
    }
}

/// A context that answers every source query with fixed facts.
#[derive(Debug, Clone, Default)]
pub struct StaticContext(pub Context);

impl TimingSource for StaticContext {
    fn timing(&self) -> TimingFacts {
        self.0.timing.clone()
    }
}

impl DomSource for StaticContext {
    fn dom(&self) -> DomSnapshot {
        self.0.dom.clone()
    }
}

impl ConnectionSource for StaticContext {
    fn connection(&self) -> ConnectionFacts {
        self.0.connection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn gather_reads_each_source() {
        let sample = Context::sample();
        let source = StaticContext(sample.clone());
        assert_eq!(Context::gather(&source, &source, &source), sample);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let ctx = Context::from_json(r#"{"timing": {"total": 900.5, "transferSize": 12}}"#)
            .expect("valid json");
        assert_eq!(ctx.timing.total, 900.5);
        assert_eq!(ctx.timing.transfer_size, 12);
        assert_eq!(ctx.dom, DomSnapshot::default());
        assert_eq!(ctx.connection.certificate_pack, None);
    }

    #[test]
    fn sample_round_trips_through_json() {
        let sample = Context::sample();
        let raw = serde_json::to_string(&sample).expect("serialize");
        assert!(raw.contains("\"serverIp\""));
        assert_eq!(Context::from_json(&raw).expect("parse"), sample);
    }

    #[test]
    fn malformed_json_is_a_context_error() {
        let err = Context::from_json("{\"timing\": [").unwrap_err();
        assert!(matches!(err, crate::EngineError::Context(_)));
        assert!(err.to_string().starts_with("Failed to parse context facts"));
    }
}
