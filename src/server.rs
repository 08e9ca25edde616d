//! Minimal web front end: a form page, inline preview, and download.
//!
//! Routing is a pure function ([`route`]) so it can be exercised without a
//! socket; [`NoticeServer`] wires it to a `tiny_http` listener drained by a
//! fixed pool of worker threads.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use chrono::{Datelike, Local};
use image::ImageEncoder;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::notice;
use crate::{Error, NoticeRenderer, NoticeRequest, Result};

const INDEX_HTML: &str = include_str!("index.html");

// Form bodies are a few hundred bytes; larger ones are refused with 413.
const MAX_BODY_BYTES: u64 = 64 * 1024;
const MAX_DRAIN_BYTES: u64 = 16 * 1024 * 1024;

/// A response before it is handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    /// File name for `Content-Disposition: attachment`
    pub attachment: Option<String>,
    pub body: Vec<u8>,
}

impl Reply {
    fn text(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            attachment: None,
            body: message.as_bytes().to_vec(),
        }
    }

    fn html(page: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            attachment: None,
            body: page.into_bytes(),
        }
    }

    fn png(body: Vec<u8>, attachment: Option<String>) -> Self {
        Self {
            status: 200,
            content_type: "image/png",
            attachment,
            body,
        }
    }
}

fn apply_field(request: &mut NoticeRequest, key: &str, value: String) {
    match key {
        "resident_name" => request.resident_name = value,
        "unit_number" => request.unit_number = value,
        "amount_due" => request.amount_due = value,
        "due_date" => request.due_date = value,
        _ => {}
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn disposition_name(headers: &str) -> Option<String> {
    headers
        .lines()
        .find(|l| l.to_ascii_lowercase().starts_with("content-disposition:"))?
        .split(';')
        .skip(1)
        .find_map(|p| p.trim().strip_prefix("name="))
        .map(|v| v.trim_matches('"').to_string())
}

/// Text fields of a `multipart/form-data` body. File parts are kept as text
/// like any other part; the notice form has none.
fn multipart_fields(content_type: &str, body: &[u8]) -> Result<Vec<(String, String)>> {
    let boundary = content_type
        .split(';')
        .skip(1)
        .filter_map(|p| p.trim().split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| Error::RequestError("multipart body without a boundary".into()))?;
    let delimiter = format!("--{}", boundary).into_bytes();

    let start = find(body, &delimiter)
        .ok_or_else(|| Error::RequestError("multipart boundary not found in body".into()))?;
    let mut rest = &body[start + delimiter.len()..];
    let mut fields = Vec::new();
    while !rest.starts_with(b"--") {
        let end = find(rest, &delimiter)
            .ok_or_else(|| Error::RequestError("unterminated multipart body".into()))?;
        let part = &rest[..end];
        let part = part.strip_prefix(b"\r\n").unwrap_or(part);
        let part = part.strip_suffix(b"\r\n").unwrap_or(part);
        if let Some(split) = find(part, b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&part[..split]);
            if let Some(name) = disposition_name(&headers) {
                let value = String::from_utf8_lossy(&part[split + 4..]).into_owned();
                fields.push((name, value));
            }
        }
        rest = &rest[end + delimiter.len()..];
    }
    Ok(fields)
}

/// Read a [`NoticeRequest`] from a form-encoded, multipart, or JSON body.
///
/// Fields start from `base`; absent fields keep its values and unknown fields
/// are ignored. A blank resident name counts as absent. A missing content
/// type is read as form-encoded; any other unrecognised type is rejected.
pub fn parse_notice_request(
    content_type: Option<&str>,
    body: &[u8],
    base: NoticeRequest,
) -> Result<NoticeRequest> {
    let raw = content_type.unwrap_or("application/x-www-form-urlencoded");
    let mime = raw
        .split(';')
        .next()
        .map(|c| c.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let mut request = base;
    match mime.as_str() {
        "application/x-www-form-urlencoded" | "" => {
            for (key, value) in url::form_urlencoded::parse(body) {
                apply_field(&mut request, &key, value.into_owned());
            }
        }
        "multipart/form-data" => {
            for (key, value) in multipart_fields(raw, body)? {
                apply_field(&mut request, &key, value);
            }
        }
        "application/json" => {
            let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(body)
                .map_err(|e| Error::RequestError(format!("malformed JSON body: {}", e)))?;
            for (key, value) in fields {
                let value = match value {
                    serde_json::Value::Null => continue,
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                apply_field(&mut request, &key, value);
            }
        }
        other => return Err(Error::UnsupportedMedia(other.to_string())),
    }

    if request.resident_name.trim().is_empty() {
        request.resident_name = notice::DEFAULT_RESIDENT.to_string();
    }
    Ok(request)
}

// RFC 5987 attr-char: everything else is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// `Content-Disposition` value for a download. The quoted `filename` is an
/// ASCII rendition for old clients; `filename*` carries the exact UTF-8 name.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        utf8_percent_encode(file_name, ATTR_CHAR)
    )
}

fn index_page(renderer: &NoticeRenderer) -> String {
    INDEX_HTML
        .replace("{{organization}}", &renderer.config().organization.name)
        .replace("{{year}}", &Local::now().year().to_string())
}

fn logo_reply(renderer: &NoticeRenderer) -> Reply {
    let Some(logo) = renderer.logo_source().load_logo() else {
        return Reply::text(404, "Not Found");
    };
    let mut buf = Vec::new();
    let encoded = image::codecs::png::PngEncoder::new(&mut buf).write_image(
        logo.as_raw(),
        logo.width(),
        logo.height(),
        image::ColorType::Rgba8,
    );
    match encoded {
        Ok(()) => Reply::png(buf, None),
        Err(e) => {
            log::error!("Failed to encode logo: {}", e);
            Reply::text(500, "Internal Server Error")
        }
    }
}

fn notice_reply(renderer: &NoticeRenderer, request: &NoticeRequest, download: bool) -> Reply {
    let notice = renderer.render(request);
    match notice.encode_png() {
        Ok(png) => {
            log::info!(
                "Rendered notice for {:?} ({} bytes, {})",
                request.resident_name,
                png.len(),
                &notice.fingerprint()[..12]
            );
            let attachment = download.then(|| notice::download_file_name(&request.resident_name));
            Reply::png(png, attachment)
        }
        Err(e) => {
            log::error!("Failed to encode notice: {}", e);
            Reply::text(500, "Internal Server Error")
        }
    }
}

/// Dispatch one request.
pub fn route(
    renderer: &NoticeRenderer,
    method: &Method,
    url: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> Reply {
    let path = url.split('?').next().unwrap_or("/");
    match (path, method) {
        ("/", Method::Get) => Reply::html(index_page(renderer)),
        ("/logo.png", Method::Get) => logo_reply(renderer),
        ("/preview" | "/generate", Method::Post) => {
            let base = NoticeRequest::for_organization(&renderer.config().organization);
            match parse_notice_request(content_type, body, base) {
                Ok(request) => notice_reply(renderer, &request, path == "/generate"),
                Err(e @ Error::UnsupportedMedia(_)) => Reply::text(415, &e.to_string()),
                Err(e) => Reply::text(400, &e.to_string()),
            }
        }
        ("/" | "/logo.png" | "/preview" | "/generate", _) => Reply::text(405, "Method Not Allowed"),
        _ => Reply::text(404, "Not Found"),
    }
}

fn respond(request: Request, reply: Reply) {
    let mut response = Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
    if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response.add_header(h);
    }
    if let Some(name) = &reply.attachment {
        let value = content_disposition(name);
        match Header::from_bytes(&b"Content-Disposition"[..], value.as_bytes()) {
            Ok(h) => response.add_header(h),
            Err(()) => log::warn!("Could not build Content-Disposition for {:?}", name),
        }
    }
    if let Err(e) = request.respond(response) {
        log::warn!("Failed to send response: {}", e);
    }
}

fn handle(renderer: &NoticeRenderer, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let content_type = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_string());

    let mut body = Vec::new();
    if let Err(e) = request
        .as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut body)
    {
        log::warn!("Failed to read body of {} {}: {}", method, url, e);
        respond(request, Reply::text(400, "Bad Request"));
        return;
    }
    if body.len() as u64 > MAX_BODY_BYTES {
        log::warn!("Refusing {} {}: body over {} bytes", method, url, MAX_BODY_BYTES);
        // Drain what the client is still sending so it reads the 413.
        let _ = std::io::copy(&mut request.as_reader().take(MAX_DRAIN_BYTES), &mut std::io::sink());
        respond(request, Reply::text(413, "Payload Too Large"));
        return;
    }

    let reply = route(renderer, &method, &url, content_type.as_deref(), &body);
    log::debug!("{} {} -> {}", method, url, reply.status);
    respond(request, reply);
}

/// HTTP listener sharing one renderer across worker threads.
pub struct NoticeServer {
    server: Arc<Server>,
    renderer: Arc<NoticeRenderer>,
}

impl NoticeServer {
    pub fn bind(addr: &str, renderer: Arc<NoticeRenderer>) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| Error::ServerError(format!("Failed to bind {}: {}", addr, e)))?;
        Ok(Self {
            server: Arc::new(server),
            renderer,
        })
    }

    /// Bound address; useful after binding to port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Start `workers` threads pulling requests from the listener.
    pub fn spawn(&self, workers: usize) -> Result<Vec<thread::JoinHandle<()>>> {
        if workers == 0 {
            return Err(Error::ConfigError("worker count must be at least 1".into()));
        }
        (0..workers)
            .map(|i| {
                let server = self.server.clone();
                let renderer = self.renderer.clone();
                thread::Builder::new()
                    .name(format!("notice-worker-{}", i))
                    .spawn(move || {
                        for request in server.incoming_requests() {
                            handle(&renderer, request);
                        }
                    })
                    .map_err(Error::from)
            })
            .collect()
    }

    /// Serve until the worker threads exit.
    pub fn run(self, workers: usize) -> Result<()> {
        if let Some(addr) = self.local_addr() {
            log::info!("Serving notices on http://{} with {} workers", addr, workers);
        }
        for handle in self.spawn(workers)? {
            let _ = handle.join();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NoticeConfig, NoticeRenderer, StaticLogo};
    use image::{Rgba, RgbaImage};

    fn offline() -> NoticeRenderer {
        NoticeRenderer::new(NoticeConfig {
            seed: Some(1),
            ..NoticeConfig::offline()
        })
    }

    #[test]
    fn form_body_is_decoded() {
        let req = parse_notice_request(
            Some("application/x-www-form-urlencoded"),
            b"resident_name=Jane+Doe&unit_number=B-204&amount_due=11%2C500&due_date=end+of+the+month",
            NoticeRequest::default(),
        )
        .unwrap();
        assert_eq!(req.resident_name, "Jane Doe");
        assert_eq!(req.unit_number, "B-204");
        assert_eq!(req.amount_due, "11,500");
        assert_eq!(req.due_date, "end of the month");
    }

    #[test]
    fn blank_name_and_missing_fields_take_defaults() {
        let req =
            parse_notice_request(None, b"resident_name=++&unit_number=7", NoticeRequest::default())
                .unwrap();
        assert_eq!(req.resident_name, "Resident");
        assert_eq!(req.due_date, "1st");
        assert_eq!(req.unit_number, "7");
    }

    #[test]
    fn json_body_is_decoded() {
        let req = parse_notice_request(
            Some("application/json; charset=utf-8"),
            br#"{"resident_name":"Jane Doe","amount_due":"900"}"#,
            NoticeRequest::default(),
        )
        .unwrap();
        assert_eq!(req.resident_name, "Jane Doe");
        assert_eq!(req.amount_due, "900");
    }

    #[test]
    fn multipart_body_is_decoded() {
        let body = b"--XYZ\r\n\
Content-Disposition: form-data; name=\"resident_name\"\r\n\r\n\
Jane Doe\r\n\
--XYZ\r\n\
Content-Disposition: form-data; name=\"unit_number\"\r\n\r\n\
B-204\r\n\
--XYZ--\r\n";
        let req = parse_notice_request(
            Some("multipart/form-data; boundary=XYZ"),
            body,
            NoticeRequest::default(),
        )
        .unwrap();
        assert_eq!(req.resident_name, "Jane Doe");
        assert_eq!(req.unit_number, "B-204");
        assert_eq!(req.due_date, "1st");
    }

    #[test]
    fn multipart_without_boundary_is_rejected() {
        let err = parse_notice_request(Some("multipart/form-data"), b"", NoticeRequest::default());
        assert!(matches!(err, Err(Error::RequestError(_))));
    }

    #[test]
    fn missing_fields_keep_the_base_request() {
        let base = NoticeRequest::default().with_due_date("10th");
        let req = parse_notice_request(
            Some("application/json"),
            br#"{"resident_name":"Jane Doe","amount_due":900,"unit_number":null}"#,
            base,
        )
        .unwrap();
        assert_eq!(req.due_date, "10th");
        assert_eq!(req.amount_due, "900");
        assert!(req.unit_number.is_empty());
    }

    #[test]
    fn unknown_media_type_is_415() {
        let renderer = offline();
        let reply = route(&renderer, &Method::Post, "/generate", Some("text/plain"), b"resident_name=Jane");
        assert_eq!(reply.status, 415);
    }

    #[test]
    fn disposition_has_ascii_and_utf8_names() {
        assert_eq!(
            content_disposition("rent_reminder_Jane_Doe.png"),
            "attachment; filename=\"rent_reminder_Jane_Doe.png\"; filename*=UTF-8''rent_reminder_Jane_Doe.png"
        );
        let value = content_disposition(&notice::download_file_name("Jos\u{e9} N\u{fa}\u{f1}ez"));
        assert!(value.is_ascii());
        assert!(value.contains("filename=\"rent_reminder_Jos__N__ez.png\""));
        assert!(value.contains("filename*=UTF-8''rent_reminder_Jos%C3%A9_N%C3%BA%C3%B1ez.png"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let renderer = offline();
        let reply = route(&renderer, &Method::Post, "/preview", Some("application/json"), b"{");
        assert_eq!(reply.status, 400);
    }

    #[test]
    fn index_serves_form() {
        let renderer = offline();
        let reply = route(&renderer, &Method::Get, "/", None, b"");
        assert_eq!(reply.status, 200);
        let page = String::from_utf8(reply.body).unwrap();
        assert!(page.contains("name=\"resident_name\""));
        assert!(page.contains("Brandon Apartments"));
        assert!(!page.contains("{{year}}"));
    }

    #[test]
    fn unknown_paths_and_methods() {
        let renderer = offline();
        assert_eq!(route(&renderer, &Method::Get, "/nope", None, b"").status, 404);
        assert_eq!(route(&renderer, &Method::Get, "/preview", None, b"").status, 405);
        assert_eq!(route(&renderer, &Method::Delete, "/", None, b"").status, 405);
    }

    #[test]
    fn download_is_an_attachment() {
        let renderer = offline();
        let reply = route(
            &renderer,
            &Method::Post,
            "/generate",
            Some("application/x-www-form-urlencoded"),
            b"resident_name=Jane+Doe",
        );
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "image/png");
        assert_eq!(reply.attachment.as_deref(), Some("rent_reminder_Jane_Doe.png"));
        assert_eq!(&reply.body[0..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn logo_route_follows_source() {
        let renderer = offline();
        assert_eq!(route(&renderer, &Method::Get, "/logo.png", None, b"").status, 404);

        let logo = RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255]));
        let renderer = offline().with_logo_source(Arc::new(StaticLogo::new(logo)));
        let reply = route(&renderer, &Method::Get, "/logo.png", None, b"");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "image/png");
    }

    #[test]
    fn zero_workers_is_a_config_error() {
        let server = NoticeServer::bind("127.0.0.1:0", Arc::new(offline())).unwrap();
        assert!(matches!(server.spawn(0), Err(Error::ConfigError(_))));
    }
}
