//! Integration tests for the conversion collaborators
//!
//! The document converter runs real `sh` scripts, the transcriber talks to a
//! local axum stub and packed PDFs are parsed back with `lopdf`.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use filegate::{
    persist_upload, ConversionError, DocumentConverter, ExternalConverter, ImagePacker,
    PdfImagePacker, RemoteTranscriber, Transcriber, TranscriptionConfig, NO_CHANNELS_MESSAGE,
};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// Document converter
// ---------------------------------------------------------------------------

#[cfg(unix)]
mod converter {
    use super::*;
    use tempfile::TempPath;

    fn script(dir: &TempDir, body: &str) -> ExternalConverter {
        let path = dir.path().join("convert.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        ExternalConverter::new(
            "sh",
            vec![path.to_string_lossy().into_owned(), "{input}".to_string()],
        )
    }

    async fn upload(dir: &Path) -> TempPath {
        persist_upload(dir, "report.docx", b"PK\x03\x04").await.unwrap()
    }

    #[tokio::test]
    async fn converts_and_removes_output() {
        let scripts = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        let converter = script(&scripts, r#"printf '%%PDF-1.4 converted' > "${1%.*}.pdf""#);

        let input = upload(uploads.path()).await;
        let pdf = converter
            .convert(&input, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(pdf, b"%PDF-1.4 converted");

        // Only the input is left, and it goes with its guard
        assert_eq!(entries(uploads.path()).len(), 1);
        drop(input);
        assert!(entries(uploads.path()).is_empty());
    }

    #[tokio::test]
    async fn nonzero_exit_reports_code_and_stderr() {
        let scripts = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        let converter = script(
            &scripts,
            r#"printf 'partial' > "${1%.*}.pdf"; echo "cannot open document" >&2; exit 3"#,
        );

        let input = upload(uploads.path()).await;
        let err = converter
            .convert(&input, Duration::from_secs(10))
            .await
            .unwrap_err();

        match &err {
            ConversionError::ProcessFailed { code, stderr } => {
                assert_eq!(*code, Some(3));
                assert_eq!(stderr, "cannot open document");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "converter exited with status 3: cannot open document"
        );

        drop(input);
        assert!(entries(uploads.path()).is_empty());
    }

    #[tokio::test]
    async fn success_without_output_is_an_error() {
        let scripts = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        let converter = script(&scripts, "exit 0");

        let input = upload(uploads.path()).await;
        let err = converter
            .convert(&input, Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::MissingOutput(_)), "{err:?}");
    }

    #[tokio::test]
    async fn slow_converter_times_out_and_cleans_up() {
        let scripts = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        let converter = script(
            &scripts,
            r#"printf 'partial' > "${1%.*}.pdf"; sleep 5"#,
        );

        let input = upload(uploads.path()).await;
        let started = std::time::Instant::now();
        let err = converter
            .convert(&input, Duration::from_millis(300))
            .await
            .unwrap_err();

        assert!(matches!(err, ConversionError::Timeout(_)), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(4));

        drop(input);
        assert!(entries(uploads.path()).is_empty());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let uploads = TempDir::new().unwrap();
        let converter = ExternalConverter::new("filegate-no-such-converter", vec![]);

        let input = upload(uploads.path()).await;
        let err = converter
            .convert(&input, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Spawn { .. }), "{err:?}");
    }
}

// ---------------------------------------------------------------------------
// Transcriber
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Captured {
    query: HashMap<String, String>,
    authorization: Option<String>,
    content_type: Option<String>,
    body_len: usize,
}

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    body: &'static str,
    captured: Arc<Mutex<Vec<Captured>>>,
}

async fn listen(
    State(stub): State<Stub>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    stub.captured.lock().unwrap().push(Captured {
        query,
        authorization: header("authorization"),
        content_type: header("content-type"),
        body_len: body.len(),
    });
    (stub.status, stub.body.to_string())
}

/// Serve a canned answer on an ephemeral port; returns the endpoint URL.
async fn spawn_stub(status: StatusCode, body: &'static str) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().route("/v1/listen", post(listen)).with_state(Stub {
        status,
        body,
        captured: captured.clone(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1/listen"), captured)
}

fn transcriber(endpoint: String) -> RemoteTranscriber {
    RemoteTranscriber::new(TranscriptionConfig {
        endpoint,
        api_key: Some("test-key".to_string()),
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn transcribes_and_sends_expected_request() {
    let (endpoint, captured) = spawn_stub(
        StatusCode::OK,
        r#"{"results":{"channels":[{"alternatives":[{"transcript":"good morning"}]}]}}"#,
    )
    .await;
    let uploads = TempDir::new().unwrap();
    let audio = persist_upload(uploads.path(), "memo.mp3", &[7u8; 2048])
        .await
        .unwrap();

    let text = transcriber(endpoint).transcribe(&audio).await.unwrap();
    assert_eq!(text, "good morning");

    let captured = captured.lock().unwrap();
    let request = &captured[0];
    assert_eq!(request.query["model"], "nova");
    assert_eq!(request.query["punctuate"], "true");
    assert_eq!(request.authorization.as_deref(), Some("Token test-key"));
    assert_eq!(request.content_type.as_deref(), Some("audio/mpeg"));
    assert_eq!(request.body_len, 2048);
}

#[tokio::test]
async fn response_without_results_is_a_placeholder() {
    let (endpoint, _) = spawn_stub(StatusCode::OK, r#"{"metadata":{}}"#).await;
    let uploads = TempDir::new().unwrap();
    let audio = persist_upload(uploads.path(), "memo.mp3", b"ID3")
        .await
        .unwrap();

    let text = transcriber(endpoint).transcribe(&audio).await.unwrap();
    assert_eq!(text, NO_CHANNELS_MESSAGE);

    drop(audio);
    assert!(entries(uploads.path()).is_empty());
}

#[tokio::test]
async fn error_status_is_a_placeholder() {
    let (endpoint, _) = spawn_stub(StatusCode::INTERNAL_SERVER_ERROR, "oops").await;
    let uploads = TempDir::new().unwrap();
    let audio = persist_upload(uploads.path(), "memo.mp3", b"ID3")
        .await
        .unwrap();

    let text = transcriber(endpoint).transcribe(&audio).await.unwrap();
    assert_eq!(text, "API request failed with status code: 500");
}

#[tokio::test]
async fn non_json_body_is_an_error() {
    let (endpoint, _) = spawn_stub(StatusCode::OK, "<html>not json</html>").await;
    let uploads = TempDir::new().unwrap();
    let audio = persist_upload(uploads.path(), "memo.mp3", b"ID3")
        .await
        .unwrap();

    let err = transcriber(endpoint)
        .transcribe(&audio)
        .await
        .unwrap_err();
    assert!(matches!(err, ConversionError::InvalidResponse(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_endpoint_is_an_error() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let uploads = TempDir::new().unwrap();
    let audio = persist_upload(uploads.path(), "memo.mp3", b"ID3")
        .await
        .unwrap();

    let result = transcriber(format!("http://{addr}/v1/listen"))
        .transcribe(&audio)
        .await;
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Image packer
// ---------------------------------------------------------------------------

fn encode(width: u32, height: u32, format: image::ImageFormat) -> Bytes {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([90, 160, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    Bytes::from(out.into_inner())
}

fn media_boxes(pdf: &[u8]) -> Vec<(f32, f32)> {
    let doc = lopdf::Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_object(*id).unwrap().as_dict().unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            (
                media_box[2].as_float().unwrap(),
                media_box[3].as_float().unwrap(),
            )
        })
        .collect()
}

#[test]
fn packs_pages_in_input_order() {
    let a = encode(40, 20, image::ImageFormat::Png);
    let b = encode(80, 60, image::ImageFormat::Jpeg);

    let pdf = PdfImagePacker.pack(&[a.clone(), b.clone()]).unwrap();
    assert_eq!(media_boxes(&pdf), vec![(30.0, 15.0), (60.0, 45.0)]);

    let reversed = PdfImagePacker.pack(&[b, a]).unwrap();
    assert_eq!(media_boxes(&reversed), vec![(60.0, 45.0), (30.0, 15.0)]);
}

#[test]
fn one_bad_image_fails_the_batch() {
    let good = encode(10, 10, image::ImageFormat::Png);
    let err = PdfImagePacker
        .pack(&[good, Bytes::from_static(b"not an image")])
        .unwrap_err();
    assert!(matches!(err, ConversionError::Image { index: 1, .. }), "{err:?}");
}
