//! The static boot-log tree: a fake browser bringing up a page that does not
//! exist.
//!
//! The shape (ids, nesting, base delays) never changes; only the text of
//! computed lines depends on the [`Context`].

use crate::context::Context;
use crate::message::{Message, MessageKind};

/// Build the boot-log tree.
pub fn create_messages() -> Vec<Message> {
    use MessageKind::{Error, Group, Info, Success, Warning};

    vec![
        Message::new("init", Info, 0, "Initializing browser runtime...").with_children(vec![
            Message::new("init.engine", Success, 120, "Layout engine ready"),
            Message::new("init.js", Success, 220, "JavaScript VM warmed up"),
        ]),
        Message::computed("dns", Group, 400, dns_headline).with_children(vec![
            Message::computed("dns.lookup", Info, 500, dns_lookup),
            Message::new("dns.cache", Warning, 650, "Resolver cache miss"),
        ]),
        Message::computed("tcp", Info, 850, tcp_handshake),
        Message::computed("tls", Group, 1_100, tls_headline).with_children(vec![
            Message::computed("tls.cipher", Info, 1_250, tls_cipher),
            Message::computed("tls.cert", Info, 1_400, tls_certificate).with_children(vec![
                Message::computed("tls.cert.hosts", Info, 1_500, tls_hosts),
            ]),
            Message::computed("tls.time", Success, 1_650, tls_time),
        ]),
        Message::computed("request", Group, 1_850, request_line).with_children(vec![
            Message::computed("request.ray", Info, 1_950, request_ray),
            Message::computed("request.ttfb", Info, 2_200, request_ttfb),
            Message::new("request.status", Error, 2_500, "HTTP 404 Not Found"),
        ]),
        Message::computed("download", Info, 2_700, download_summary),
        Message::computed("resources", Group, 2_950, resources_headline).with_children(vec![
            Message::computed("resources.slowest", Info, 3_050, resources_slowest),
            Message::computed("resources.bytes", Info, 3_150, resources_bytes),
        ]),
        Message::computed("parse", Group, 3_300, parse_headline).with_children(vec![
            Message::computed("parse.nodes", Info, 3_400, parse_nodes).with_children(vec![
                Message::computed("parse.nodes.top", Info, 3_500, parse_top_element),
            ]),
            Message::computed("parse.title", Info, 3_650, parse_title),
            Message::computed("parse.blocking", Warning, 3_800, parse_blocking),
            Message::computed("parse.meta", Info, 3_900, parse_meta),
        ]),
        Message::new("render", Group, 4_100, "Rendering page").with_children(vec![
            Message::new("render.layout", Info, 4_250, "Layout pass 1/1"),
            Message::new("render.paint", Warning, 4_400, "Paint: requested content is missing"),
            Message::computed("render.links", Info, 4_500, render_links),
        ]),
        Message::new("fault", Error, 4_700, "Unrecoverable: page not found"),
        Message::new("halt", Error, 4_900, "Handing control to the debugger..."),
    ]
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "unknown"
    } else {
        value
    }
}

fn format_ms(ms: f64) -> String {
    if ms.is_finite() && ms > 0.0 {
        format!("{ms:.1} ms")
    } else {
        "0.0 ms".to_string()
    }
}

/// Human-readable byte count, e.g. `17.5 KiB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn dns_headline(ctx: &Context) -> String {
    format!("Resolving host ({})", format_ms(ctx.timing.dns))
}

fn dns_lookup(ctx: &Context) -> String {
    format!("A record -> {}", or_unknown(&ctx.connection.server_ip))
}

fn tcp_handshake(ctx: &Context) -> String {
    format!("TCP handshake completed in {}", format_ms(ctx.timing.tcp))
}

fn tls_headline(ctx: &Context) -> String {
    format!("TLS handshake ({})", or_unknown(&ctx.connection.tls_version))
}

fn tls_cipher(ctx: &Context) -> String {
    format!("Cipher suite: {}", or_unknown(&ctx.connection.tls_cipher))
}

fn tls_certificate(ctx: &Context) -> String {
    match &ctx.connection.certificate_pack {
        Some(pack) => format!(
            "Certificate issued by {}, valid until {}",
            or_unknown(&pack.issuer),
            or_unknown(&pack.expires_on)
        ),
        None => "Certificate pack unavailable".to_string(),
    }
}

fn tls_hosts(ctx: &Context) -> String {
    let hosts = ctx
        .connection
        .certificate_pack
        .as_ref()
        .map(|pack| pack.hosts.as_slice())
        .unwrap_or_default();
    match hosts.first() {
        Some(first) if hosts.len() > 1 => {
            format!("Covers {first} and {} more", hosts.len() - 1)
        }
        Some(first) => format!("Covers {first}"),
        None => "Covers no hosts".to_string(),
    }
}

fn tls_time(ctx: &Context) -> String {
    format!("Secure channel up after {}", format_ms(ctx.timing.tls))
}

fn request_line(ctx: &Context) -> String {
    format!(
        "GET /this-page-does-not-exist {}",
        or_unknown(&ctx.connection.http_version)
    )
}

fn request_ray(ctx: &Context) -> String {
    format!(
        "cf-ray {} via {}",
        or_unknown(&ctx.connection.cf_ray),
        or_unknown(&ctx.connection.colo)
    )
}

fn request_ttfb(ctx: &Context) -> String {
    format!("First byte after {}", format_ms(ctx.timing.ttfb))
}

fn download_summary(ctx: &Context) -> String {
    let t = &ctx.timing;
    format!(
        "Downloaded {} ({} encoded, {} decoded) over {}",
        format_bytes(t.transfer_size),
        format_bytes(t.encoded_body_size),
        format_bytes(t.decoded_body_size),
        or_unknown(&t.protocol)
    )
}

fn resources_headline(ctx: &Context) -> String {
    match ctx.timing.resources.len() {
        1 => "Fetching 1 subresource".to_string(),
        n => format!("Fetching {n} subresources"),
    }
}

fn resources_slowest(ctx: &Context) -> String {
    ctx.timing
        .resources
        .iter()
        .max_by(|a, b| a.duration.total_cmp(&b.duration))
        .map(|slowest| {
            format!(
                "Slowest: {} ({})",
                or_unknown(&slowest.name),
                format_ms(slowest.duration)
            )
        })
        .unwrap_or_else(|| "Slowest: nothing to fetch".to_string())
}

fn resources_bytes(ctx: &Context) -> String {
    let total: u64 = ctx
        .timing
        .resources
        .iter()
        .map(|r| r.transfer_size)
        .fold(0, u64::saturating_add);
    format!("Subresources transferred {}", format_bytes(total))
}

fn parse_headline(ctx: &Context) -> String {
    format!(
        "Parsing <!DOCTYPE {}> lang={}",
        or_unknown(&ctx.dom.doctype),
        or_unknown(&ctx.dom.html_lang)
    )
}

fn parse_nodes(ctx: &Context) -> String {
    format!(
        "{} nodes ({} in head, {} in body)",
        ctx.dom.total_nodes, ctx.dom.head_elements, ctx.dom.body_elements
    )
}

fn parse_top_element(ctx: &Context) -> String {
    ctx.dom
        .elements
        .iter()
        .max_by_key(|e| e.count)
        .map(|e| format!("Most common element <{}> x{}", or_unknown(&e.tag), e.count))
        .unwrap_or_else(|| "No elements counted".to_string())
}

fn parse_title(ctx: &Context) -> String {
    format!("<title>{}</title>", or_unknown(&ctx.dom.title))
}

fn parse_blocking(ctx: &Context) -> String {
    format!(
        "{} scripts and {} stylesheets block first paint",
        ctx.dom.scripts.len(),
        ctx.dom.stylesheets.len()
    )
}

fn parse_meta(ctx: &Context) -> String {
    match ctx.dom.meta.first() {
        Some(meta) => format!(
            "{} meta tags, first: {}={}",
            ctx.dom.meta.len(),
            or_unknown(&meta.name),
            or_unknown(&meta.content)
        ),
        None => "No meta tags".to_string(),
    }
}

fn render_links(ctx: &Context) -> String {
    format!("{} links still lead somewhere", ctx.dom.links.len())
}
