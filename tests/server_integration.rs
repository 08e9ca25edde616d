//! Drive the HTTP front end over a real socket
#![cfg(all(feature = "server", feature = "remote-logo"))]

use std::sync::Arc;

use rentnotice::server::NoticeServer;
use rentnotice::{NoticeConfig, NoticeRenderer};

fn start() -> String {
    let renderer = NoticeRenderer::new(NoticeConfig {
        seed: Some(11),
        ..NoticeConfig::offline()
    });
    let server = NoticeServer::bind("127.0.0.1:0", Arc::new(renderer)).expect("bind");
    let addr = server.local_addr().expect("ip listener");
    // Workers are detached; they stop when the test process exits.
    server.spawn(2).expect("spawn workers");
    format!("http://{}", addr)
}

#[test]
fn preview_returns_inline_png() {
    let base = start();
    let client = reqwest::blocking::Client::new();
    let resp = client
        .post(format!("{}/preview", base))
        .form(&[("resident_name", "Jane Doe"), ("unit_number", "B-204")])
        .send()
        .expect("preview request");
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers()["content-type"], "image/png");
    assert!(resp.headers().get("content-disposition").is_none());
    let body = resp.bytes().unwrap();
    assert_eq!(&body[0..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn generate_returns_attachment() {
    let base = start();
    let client = reqwest::blocking::Client::new();
    let resp = client
        .post(format!("{}/generate", base))
        .header("Content-Type", "application/json")
        .body(r#"{"resident_name":"Jane Doe","amount_due":"11,500"}"#)
        .send()
        .expect("generate request");
    assert_eq!(resp.status().as_u16(), 200);
    let disposition = resp.headers()["content-disposition"].to_str().unwrap().to_string();
    assert_eq!(
        disposition,
        "attachment; filename=\"rent_reminder_Jane_Doe.png\"; filename*=UTF-8''rent_reminder_Jane_Doe.png"
    );
}

#[test]
fn accented_name_is_still_an_attachment() {
    let base = start();
    let client = reqwest::blocking::Client::new();
    let resp = client
        .post(format!("{}/generate", base))
        .form(&[("resident_name", "Jos\u{e9} N\u{fa}\u{f1}ez")])
        .send()
        .expect("generate request");
    assert_eq!(resp.status().as_u16(), 200);
    let disposition = resp
        .headers()
        .get("content-disposition")
        .expect("attachment header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"rent_reminder_Jos__N__ez.png\""));
    assert!(disposition.ends_with("filename*=UTF-8''rent_reminder_Jos%C3%A9_N%C3%BA%C3%B1ez.png"));
}

#[test]
fn multipart_form_fields_are_used() {
    let base = start();
    let client = reqwest::blocking::Client::new();
    let body = "--XYZ\r\n\
Content-Disposition: form-data; name=\"resident_name\"\r\n\r\n\
Jane Doe\r\n\
--XYZ--\r\n";
    let resp = client
        .post(format!("{}/generate", base))
        .header("Content-Type", "multipart/form-data; boundary=XYZ")
        .body(body)
        .send()
        .expect("generate request");
    assert_eq!(resp.status().as_u16(), 200);
    let disposition = resp.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("filename=\"rent_reminder_Jane_Doe.png\""));
}

#[test]
fn oversized_and_unknown_bodies_are_refused() {
    let base = start();
    let client = reqwest::blocking::Client::new();

    let big = format!("resident_name={}", "a".repeat(70 * 1024));
    let resp = client
        .post(format!("{}/preview", base))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(big)
        .send()
        .unwrap();
    assert_eq!(resp.status().as_u16(), 413);

    let resp = client
        .post(format!("{}/preview", base))
        .header("Content-Type", "text/plain")
        .body("resident_name=Jane")
        .send()
        .unwrap();
    assert_eq!(resp.status().as_u16(), 415);
}

#[test]
fn form_page_and_errors() {
    let base = start();
    let client = reqwest::blocking::Client::new();

    let page = client.get(format!("{}/", base)).send().unwrap();
    assert_eq!(page.status().as_u16(), 200);
    assert!(page.text().unwrap().contains("resident_name"));

    let missing = client.get(format!("{}/missing", base)).send().unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let wrong = client.get(format!("{}/generate", base)).send().unwrap();
    assert_eq!(wrong.status().as_u16(), 405);

    let bad = client
        .post(format!("{}/preview", base))
        .header("Content-Type", "application/json")
        .body("not json")
        .send()
        .unwrap();
    assert_eq!(bad.status().as_u16(), 400);
}
