// End-to-end tests for the upload endpoints
// Each test starts its own server process on a free port

use image::{DynamicImage, GenericImageView, ImageOutputFormat, Rgb, RgbImage};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::io::Cursor;

use super::test_harness::ServerTestHarness;

fn sample(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    }));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn file_part(data: Vec<u8>, file_name: &str, mime: &str) -> Part {
    Part::bytes(data)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .unwrap()
}

fn post(harness: &ServerTestHarness, path: &str, form: Form) -> (StatusCode, Value) {
    let response = Client::new()
        .post(harness.url(path))
        .multipart(form)
        .send()
        .expect("request failed");
    let status = response.status();
    (status, response.json().expect("body is not JSON"))
}

#[test]
fn test_resize_jpeg_end_to_end() {
    let harness = ServerTestHarness::start().expect("server should start");

    let form = Form::new().text("width", "100").part(
        "file",
        file_part(sample(200, 100, ImageOutputFormat::Jpeg(90)), "landscape.jpg", "image/jpeg"),
    );
    let (status, body) = post(&harness, "/resize_image", form);

    assert_eq!(status, StatusCode::OK);
    let file_path = body["filePath"].as_str().unwrap();
    assert!(file_path.ends_with("resize-100landscape.jpg"));
    assert_eq!(body["contentType"], "image/jpeg");
    assert_eq!(image::open(file_path).unwrap().dimensions(), (100, 50));
}

#[test]
fn test_crop_png_end_to_end() {
    let harness = ServerTestHarness::start().expect("server should start");

    let form = Form::new()
        .text("width", "50")
        .text("height", "200")
        .part(
            "file",
            file_part(sample(300, 300, ImageOutputFormat::Png), "square.png", "image/png"),
        );
    let (status, body) = post(&harness, "/crop_image", form);

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contentType"], "image/png");
    let file_path = body["filePath"].as_str().unwrap();
    assert_eq!(image::open(file_path).unwrap().dimensions(), (50, 200));
}

#[test]
fn test_contrast_end_to_end() {
    let harness = ServerTestHarness::start().expect("server should start");

    let form = Form::new().text("percentage", "40").part(
        "file",
        file_part(sample(80, 60, ImageOutputFormat::Jpeg(90)), "portrait.jpg", "image/jpeg"),
    );
    let (status, body) = post(&harness, "/adjust_contrast", form);

    assert_eq!(status, StatusCode::OK);
    assert!(body["filePath"]
        .as_str()
        .unwrap()
        .ends_with("contrast-40portrait.jpg"));
}

#[test]
fn test_bmp_is_unsupported_and_not_stored() {
    let harness = ServerTestHarness::start().expect("server should start");

    for path in ["/resize_image", "/crop_image", "/adjust_contrast"] {
        let form = Form::new()
            .text("width", "10")
            .text("height", "10")
            .text("percentage", "10")
            .part("file", file_part(b"BM\x00\x00\x00\x00".to_vec(), "x.bmp", "image/bmp"));
        let (status, body) = post(&harness, path, form);

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE, "{}", path);
        assert_eq!(body, serde_json::json!({ "message": "Unsupported image type" }));
    }
    assert!(harness.stored_files().is_empty());
}

#[test]
fn test_identical_requests_are_idempotent() {
    let harness = ServerTestHarness::start().expect("server should start");
    let source = sample(120, 90, ImageOutputFormat::Png);

    let mut outputs = Vec::new();
    for _ in 0..2 {
        let form = Form::new()
            .text("width", "40")
            .part("file", file_part(source.clone(), "same.png", "image/png"));
        let (status, body) = post(&harness, "/resize_image", form);
        assert_eq!(status, StatusCode::OK);

        let path = body["filePath"].as_str().unwrap().to_string();
        let bytes = std::fs::read(&path).unwrap();
        outputs.push((path, bytes));
    }

    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(harness.stored_files().len(), 1);
}

#[test]
fn test_invalid_requests() {
    let harness = ServerTestHarness::start().expect("server should start");

    // Missing file part
    let (status, _) = post(&harness, "/resize_image", Form::new().text("width", "10"));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Malformed width
    let form = Form::new().text("width", "wide").part(
        "file",
        file_part(sample(20, 20, ImageOutputFormat::Png), "a.png", "image/png"),
    );
    let (status, body) = post(&harness, "/resize_image", form);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("width"));

    // Undecodable payload declared as JPEG
    let form = Form::new()
        .text("width", "10")
        .part("file", file_part(b"not a jpeg".to_vec(), "b.jpg", "image/jpeg"));
    let (status, _) = post(&harness, "/resize_image", form);
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[test]
fn test_body_over_limit_is_rejected() {
    let harness = ServerTestHarness::start().expect("server should start");

    let form = Form::new()
        .text("width", "10")
        .part("file", file_part(vec![0u8; 3 * 1024 * 1024], "huge.png", "image/png"));
    let response = Client::new()
        .post(harness.url("/resize_image"))
        .multipart(form)
        .send();

    // The server may close the connection before the upload finishes
    if let Ok(response) = response {
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
    assert!(harness.stored_files().is_empty());
}

#[test]
fn test_fixed_contrast_setting() {
    let harness =
        ServerTestHarness::start_with("  fixed_contrast: -20").expect("server should start");

    let form = Form::new().text("percentage", "40").part(
        "file",
        file_part(sample(32, 32, ImageOutputFormat::Png), "f.png", "image/png"),
    );
    let (status, body) = post(&harness, "/adjust_contrast", form);

    assert_eq!(status, StatusCode::OK);
    assert!(body["filePath"].as_str().unwrap().ends_with("contrast-40f.png"));
}
