// Upload handler unit tests
// Drives UploadHandler through parsed multipart bodies, as the server does

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageOutputFormat, Rgb, RgbImage};
use imagepress::config::Config;
use imagepress::metrics::Metrics;
use imagepress::upload::*;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

const BOUNDARY: &str = "imagepress-unit-boundary";

fn image_bytes(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 90])
    }));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// Build a multipart body with text fields and one file part
fn multipart(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> (String, Bytes) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (
        format!("multipart/form-data; boundary={}", BOUNDARY),
        Bytes::from(body),
    )
}

fn handler_in(dir: &TempDir) -> UploadHandler {
    let mut config = Config::default();
    config.storage.image_dir = dir.path().to_path_buf();
    UploadHandler::new(&config, Arc::new(Metrics::new()))
}

#[tokio::test]
async fn test_resize_through_multipart() {
    // Test: 200x100 JPEG resized to width 100 comes back 100x50
    let dir = TempDir::new().unwrap();
    let handler = handler_in(&dir);
    let jpeg = image_bytes(200, 100, ImageOutputFormat::Jpeg(90));

    let (content_type, body) = multipart(&[("width", "100")], Some(("pic.jpg", "image/jpeg", &jpeg[..])));
    let form = UploadForm::parse(&content_type, body).await.unwrap();
    let response = handler.respond(OperationKind::Resize, form).await;

    assert_eq!(response.status, 200);
    let file_path = response.body["filePath"].as_str().unwrap();
    assert!(file_path.ends_with("resize-100pic.jpg"));
    assert_eq!(response.body["contentType"], "image/jpeg");
    assert_eq!(image::open(file_path).unwrap().dimensions(), (100, 50));
}

#[tokio::test]
async fn test_crop_through_multipart() {
    // Test: 300x300 PNG cropped to 50x200 is exactly 50x200
    let dir = TempDir::new().unwrap();
    let handler = handler_in(&dir);
    let png = image_bytes(300, 300, ImageOutputFormat::Png);

    let (content_type, body) = multipart(
        &[("width", "50"), ("height", "200")],
        Some(("sq.png", "image/png", &png[..])),
    );
    let form = UploadForm::parse(&content_type, body).await.unwrap();
    let response = handler.respond(OperationKind::Crop, form).await;

    assert_eq!(response.status, 200);
    let file_path = response.body["filePath"].as_str().unwrap();
    assert!(file_path.ends_with("crop-50sq.png"));
    assert_eq!(image::open(file_path).unwrap().dimensions(), (50, 200));
}

#[tokio::test]
async fn test_contrast_through_multipart() {
    let dir = TempDir::new().unwrap();
    let handler = handler_in(&dir);
    let jpeg = image_bytes(64, 48, ImageOutputFormat::Jpeg(90));

    let (content_type, body) =
        multipart(&[("percentage", "40")], Some(("c.jpg", "image/jpeg", &jpeg[..])));
    let form = UploadForm::parse(&content_type, body).await.unwrap();
    let response = handler.respond(OperationKind::Contrast, form).await;

    assert_eq!(response.status, 200);
    let file_path = response.body["filePath"].as_str().unwrap();
    assert!(file_path.ends_with("contrast-40c.jpg"));
    assert_eq!(image::open(file_path).unwrap().dimensions(), (64, 48));
}

#[tokio::test]
async fn test_bmp_rejected_on_every_endpoint() {
    let dir = TempDir::new().unwrap();
    let handler = handler_in(&dir);

    for kind in [OperationKind::Resize, OperationKind::Crop, OperationKind::Contrast] {
        let (content_type, body) = multipart(
            &[("width", "10"), ("height", "10"), ("percentage", "10")],
            Some(("x.bmp", "image/bmp", &b"BM\x00\x00"[..])),
        );
        let form = UploadForm::parse(&content_type, body).await.unwrap();
        let response = handler.respond(kind, form).await;

        assert_eq!(response.status, 415);
        assert_eq!(response.body, json!({ "message": "Unsupported image type" }));
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_no_file_part() {
    let dir = TempDir::new().unwrap();
    let handler = handler_in(&dir);

    let (content_type, body) = multipart(&[("width", "10")], None);
    let form = UploadForm::parse(&content_type, body).await.unwrap();
    let response = handler.respond(OperationKind::Resize, form).await;

    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_not_multipart() {
    let err = UploadForm::parse("application/json", Bytes::from_static(b"{}"))
        .await
        .unwrap_err();
    assert_eq!(err.to_http_status(), 400);
}
