// Integration tests of the HTTP front-end, with a fake resolver in place of yt-dlp.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use reqwest::{header, StatusCode};
use tokio::net::TcpListener;

use tubefetch::{
    config::Settings,
    resolver::MediaResolver,
    result::{Error, Result},
    service::Downloader,
    types::{Bitrate, Container, StreamDescriptor, Streams, VideoInfo},
    web::{router, AppState},
};

const VALID_URL: &str = "https://www.youtube.com/watch?v=VALID_ID_01";
const OTHER_URL: &str = "https://youtu.be/OTHER_ID_02";
const UNAVAILABLE_URL: &str = "https://www.youtube.com/watch?v=GONE_ID_003";

/// Audio payload written by the fake resolver
const AUDIO_BYTES: &[u8] = b"ID3 fake audio payload";

/// Resolver answering from memory. The title is derived from the video ID so
/// that responses to different URLs can be told apart.
struct FakeResolver;

impl MediaResolver for FakeResolver {
    fn video_info(&self, url: &str) -> Result<VideoInfo> {
        let id = tubefetch::youtube_url::video_id(url).ok_or(Error::InvalidUrl)?;
        if id == "GONE_ID_003" {
            return Err(Error::UnavailableStream);
        }

        // Slow enough for concurrent requests to overlap
        std::thread::sleep(Duration::from_millis(50));

        Ok(VideoInfo {
            id: id.to_owned(),
            title: format!("Video {id}"),
            author: "Some Channel".to_owned(),
            length: 212,
            thumbnail_url: Some(format!("https://i.ytimg.com/vi/{id}/hq.jpg")),
            description: "A description".to_owned(),
            view_count: Some(42),
            publish_date: Some("2024-01-31".to_owned()),
            streams: Streams {
                audio: vec![StreamDescriptor::audio(
                    "140",
                    Container::M4a,
                    Bitrate::from_kbps(129.5).unwrap(),
                    Some(AUDIO_BYTES.len() as u64),
                )],
                video: vec![
                    StreamDescriptor::video("137", Container::Mp4, 1080, Some(30), false, None),
                    StreamDescriptor::video("18", Container::Mp4, 360, Some(30), true, None),
                ],
            },
        })
    }

    fn download(&self, _url: &str, stream: &StreamDescriptor, out_dir: &Path) -> Result<PathBuf> {
        let path = out_dir.join(format!("{}{}", stream.id, stream.container.with_dot()));
        let content: &[u8] = match stream.id.as_str() {
            "140" => AUDIO_BYTES,
            _ => b"fake video payload",
        };
        std::fs::write(&path, content).unwrap();
        Ok(path)
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
    temp_dir: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(Settings::default()).await
    }

    async fn start_with(settings: Settings) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            temp_dir: Some(temp_dir.path().to_path_buf()),
            ..settings
        };
        let state = AppState::new(Downloader::new(Arc::new(FakeResolver), Arc::new(settings)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.ok();
        });

        Self {
            base: format!("http://127.0.0.1:{port}"),
            client: reqwest::Client::new(),
            temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn video_info(&self, url: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/video-info"))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .unwrap()
    }

    /// Number of request directories still present
    fn leftover_dirs(&self) -> usize {
        std::fs::read_dir(self.temp_dir.path()).unwrap().count()
    }
}

#[tokio::test]
async fn index_shows_the_url_form() {
    let server = TestServer::start().await;

    let resp = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let html = resp.text().await.unwrap();
    assert!(html.contains(r#"action="/formats""#));
    assert!(html.contains(r#"name="url""#));
}

#[tokio::test]
async fn formats_page_lists_video_and_audio_options() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/formats"))
        .form(&[("url", VALID_URL)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let html = resp.text().await.unwrap();
    assert!(html.contains("Video VALID_ID_01"));
    assert!(html.contains(r#"<option value="137">"#));
    assert!(html.contains(r#"<option value="140">"#));
    assert!(html.contains("1080p"));
    assert!(html.contains("130kbps"));
    assert!(html.contains("3:32"));
}

#[tokio::test]
async fn malformed_urls_get_an_error_page() {
    let server = TestServer::start().await;

    for url in ["", "definitely not a url", "https://example.com/watch?v=VALID_ID_01"] {
        let resp = server
            .client
            .post(server.url("/formats"))
            .form(&[("url", url)])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{url}");
        assert!(resp.text().await.unwrap().contains("Invalid YouTube URL format"));
    }

    // The server is still alive
    let resp = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_lists_descriptors() {
    let server = TestServer::start().await;

    let resp = server.video_info(VALID_URL).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["title"], "Video VALID_ID_01");

    let video = json["data"]["streams"]["video"].as_array().unwrap();
    let audio = json["data"]["streams"]["audio"].as_array().unwrap();
    assert!(video.iter().any(|s| s["has_audio"] == true));
    assert!(!audio.is_empty());
    assert_eq!(audio[0]["type"], "audio");
    assert_eq!(audio[0]["mime_type"], "audio/mp4");
    assert_eq!(audio[0]["quality"], "High");
}

#[tokio::test]
async fn api_reports_errors_as_json() {
    let server = TestServer::start().await;

    let resp = server.video_info("").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Invalid YouTube URL format");

    let resp = server.video_info(UNAVAILABLE_URL).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "This video is unavailable");
}

#[tokio::test]
async fn audio_download_is_an_attachment_of_the_declared_type() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/download"))
        .form(&[("url", VALID_URL), ("stream_id", "140")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "audio/mp4");

    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"Video_VALID_ID_01_"));
    assert!(disposition.ends_with(".m4a\""));

    let body = resp.bytes().await.unwrap();
    assert_eq!(&body[..], AUDIO_BYTES);

    // The request directory goes away with the response body
    for _ in 0..50 {
        if server.leftover_dirs() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(server.leftover_dirs(), 0);
}

#[tokio::test]
async fn api_download_serves_video_streams() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/api/download"))
        .json(&serde_json::json!({ "url": VALID_URL, "itag": "137" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "video/mp4");

    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains("_1080p_"));
    assert!(!resp.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_or_missing_streams_are_rejected() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/api/download"))
        .json(&serde_json::json!({ "url": VALID_URL, "stream_id": "999" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "Selected format is not available");

    let resp = server
        .client
        .post(server.url("/download"))
        .form(&[("url", VALID_URL)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.text().await.unwrap().contains("No format selected"));

    assert_eq!(server.leftover_dirs(), 0);
}

#[tokio::test]
async fn concurrent_requests_do_not_interfere() {
    let server = TestServer::start().await;

    let (first, second) = tokio::join!(server.video_info(VALID_URL), server.video_info(OTHER_URL));
    let first: serde_json::Value = first.json().await.unwrap();
    let second: serde_json::Value = second.json().await.unwrap();

    assert_eq!(first["data"]["title"], "Video VALID_ID_01");
    assert_eq!(second["data"]["title"], "Video OTHER_ID_02");
}

#[tokio::test]
async fn unknown_routes_get_the_error_page() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/nothing/here"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.text().await.unwrap().contains("Page not found"));
}

#[tokio::test]
async fn api_rejects_undecodable_bodies_with_json() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/api/video-info"))
        .header(header::CONTENT_TYPE, "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Invalid request");

    // A form where JSON is expected
    let resp = server
        .client
        .post(server.url("/api/download"))
        .form(&[("url", VALID_URL), ("stream_id", "140")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Invalid request");
}

#[tokio::test]
async fn pages_reject_undecodable_bodies_with_the_error_page() {
    let server = TestServer::start().await;

    // No form content type
    let resp = server
        .client
        .post(server.url("/formats"))
        .body(format!("url={VALID_URL}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(resp.text().await.unwrap().contains("Invalid request"));
}

#[tokio::test]
async fn oversized_bodies_are_too_large() {
    let server = TestServer::start_with(Settings {
        max_body_bytes: 1024,
        ..Settings::default()
    })
    .await;
    let long_url = format!("{VALID_URL}&pad={}", "x".repeat(4096));

    let resp = server.video_info(&long_url).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "File too large");

    // Fresh client, the previous connection may have been closed by the server
    let resp = reqwest::Client::new()
        .post(server.url("/formats"))
        .form(&[("url", long_url.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(resp.text().await.unwrap().contains("File too large"));
}
