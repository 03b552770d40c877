#![cfg(feature = "relay")]

mod common;

use std::path::PathBuf;
use std::rc::Rc;

use common::solid_png;
use domsnap::relay::http::HttpFetcher;
use domsnap::relay::server::{RelayConfig, RelayServer};
use domsnap::{Error, ImageFetcher, ImageLoader, RelayClient, TaskQueue};
use tiny_http::{Header, Response, Server};

/// Origin serving one PNG at `/pic.png` and 404 for everything else.
fn start_origin() -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let base = format!("http://{}", server.server_addr());
    let png = solid_png(3, 2, [0, 255, 0, 255]);
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let resp = if request.url() == "/pic.png" {
                Response::from_data(png.clone())
                    .with_header("Content-Type: image/png".parse::<Header>().unwrap())
                    .with_header("X-Origin: yes".parse::<Header>().unwrap())
            } else {
                Response::from_data(b"nope".to_vec()).with_status_code(404)
            };
            let _ = request.respond(resp);
        }
    });
    base
}

fn static_root() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("domsnap-relay-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<p>static</p>").unwrap();
    dir
}

fn start_relay() -> String {
    let config = RelayConfig {
        root: static_root(),
        timeout_ms: 5000,
        ..RelayConfig::default()
    };
    let relay = RelayServer::bind("127.0.0.1:0", config).unwrap();
    let base = relay.base_url();
    relay.spawn();
    base
}

fn get(url: &str) -> reqwest::blocking::Response {
    reqwest::blocking::get(url).unwrap()
}

#[test]
fn client_loads_images_through_the_relay() {
    common::init_logging();
    let origin = start_origin();
    let relay = start_relay();

    let queue = TaskQueue::new();
    let fetcher = Rc::new(HttpFetcher::new(domsnap::DEFAULT_USER_AGENT, 5000).unwrap());
    let client = RelayClient::new(relay, fetcher, queue.clone());

    let done = client.load(&format!("{}/pic.png", origin));
    assert!(!done.is_completed());
    queue.run_until(|| done.is_completed()).unwrap();
    let image = done.outcome().unwrap().unwrap();
    assert_eq!((image.width(), image.height()), (3, 2));

    let missing_url = format!("{}/missing.png", origin);
    let missing = client.load(&missing_url);
    queue.run_all();
    match missing.outcome() {
        Some(Err(Error::ImageLoad { url, reason })) => {
            assert_eq!(url, missing_url);
            assert!(reason.contains("404"), "{reason}");
        }
        other => panic!("expected an image load failure, got {:?}", other.map(|r| r.is_ok())),
    }
}

#[test]
fn proxy_passes_upstream_responses_through() {
    let origin = start_origin();
    let relay = start_relay();
    let encode = |u: &str| url::form_urlencoded::byte_serialize(u.as_bytes()).collect::<String>();

    let resp = get(&format!("{}/imageproxy?url={}", relay, encode(&format!("{}/pic.png", origin))));
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers()["content-type"], "image/png");
    assert_eq!(resp.headers()["x-origin"], "yes");
    assert_eq!(resp.bytes().unwrap().to_vec(), solid_png(3, 2, [0, 255, 0, 255]));

    let resp = get(&format!("{}/imageproxy?url={}", relay, encode(&format!("{}/other", origin))));
    assert_eq!(resp.status().as_u16(), 404);
    assert_eq!(resp.text().unwrap(), "nope");
}

#[test]
fn proxy_errors_answer_400_with_an_empty_body() {
    let relay = start_relay();
    for target in ["http%3A%2F%2F127.0.0.1%3A1%2Fx.png", "not-a-url", ""] {
        let resp = get(&format!("{}/imageproxy?url={}", relay, target));
        assert_eq!(resp.status().as_u16(), 400, "target {target:?}");
        assert!(resp.bytes().unwrap().is_empty());
    }
    assert_eq!(get(&format!("{}/imageproxy", relay)).status().as_u16(), 400);
}

#[test]
fn static_files_and_guarded_paths() {
    let relay = start_relay();

    let resp = get(&format!("{}/index.html", relay));
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.text().unwrap(), "<p>static</p>");

    let resp = get(&format!("{}/absent.html", relay));
    assert_eq!(resp.status().as_u16(), 404);
    assert_eq!(resp.text().unwrap(), "404 Not found");

    assert_eq!(get(&format!("{}/src/lib.rs", relay)).status().as_u16(), 403);
    assert_eq!(get(&format!("{}/Cargo.toml", relay)).status().as_u16(), 403);
}

#[test]
fn http_fetcher_reports_status_failures() {
    let origin = start_origin();
    let fetcher = HttpFetcher::new("test-agent", 5000).unwrap();
    let bytes = fetcher.fetch(&format!("{}/pic.png", origin)).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
    assert!(matches!(
        fetcher.fetch(&format!("{}/gone", origin)),
        Err(Error::ImageLoad { .. })
    ));
}
