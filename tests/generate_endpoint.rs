mod common;

use common::{Part, get, logo_png, post_generate, spawn_server};
use qrmark::{QrEncoder, QrmarkConfig};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_data_is_bad_request() {
    let addr = spawn_server(QrmarkConfig::default()).await;

    let response = post_generate(addr, &[Part::text("position", "center")]).await;
    assert_eq!(response.status, 400, "unexpected status: {}", response.head);

    let payload = response.json();
    assert_eq!(payload["kind"], "missing_data");
    assert_eq!(payload["error"], "No data provided");
    assert!(response.header("x-request-id").is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn plain_request_returns_raw_qr_png() {
    let addr = spawn_server(QrmarkConfig::default()).await;

    let response = post_generate(addr, &[Part::text("data", "HELLO")]).await;
    assert_eq!(response.status, 200, "unexpected status: {}", response.head);
    assert_eq!(response.header("content-type").as_deref(), Some("image/png"));
    assert!(response.header("x-process-time").is_some());
    assert!(response.header("x-qr-scannable").is_none());

    let image = image::load_from_memory(&response.body).expect("decode png");
    assert_eq!((image.width(), image.height()), (290, 290));
    assert_eq!(image.to_luma8(), QrEncoder::new().encode("HELLO").unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_watermark_part_is_ignored() {
    let addr = spawn_server(QrmarkConfig::default()).await;

    let response = post_generate(
        addr,
        &[
            Part::text("data", "HELLO"),
            Part::file("watermark", "", Vec::new()),
            Part::text("transparency", "not-a-number"),
        ],
    )
    .await;
    assert_eq!(response.status, 200, "unexpected status: {}", response.head);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watermarked_request_keeps_qr_dimensions() {
    let addr = spawn_server(QrmarkConfig::default()).await;

    let response = post_generate(
        addr,
        &[
            Part::text("data", "HELLO"),
            Part::file("watermark", "logo.png", logo_png(200, 100)),
            Part::text("position", "bottom-right"),
            Part::text("transparency", "128"),
            Part::text("scale", "0.25"),
        ],
    )
    .await;
    assert_eq!(response.status, 200, "unexpected status: {}", response.head);

    let image = image::load_from_memory(&response.body).expect("decode png");
    assert!(matches!(image, image::DynamicImage::ImageRgb8(_)));
    assert_eq!((image.width(), image.height()), (290, 290));

    // Quiet-zone pixel inside the bottom-right overlay (208..280, 244..280) is tinted
    let tinted = image.to_rgb8().get_pixel(275, 275).0;
    assert_ne!(tinted, [255, 255, 255]);
    // Quiet-zone pixel outside it is not
    assert_eq!(image.to_rgb8().get_pixel(5, 5).0, [255, 255, 255]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn out_of_range_transparency_is_rejected() {
    let addr = spawn_server(QrmarkConfig::default()).await;

    let response = post_generate(
        addr,
        &[
            Part::text("data", "HELLO"),
            Part::file("watermark", "logo.png", logo_png(20, 20)),
            Part::text("transparency", "300"),
        ],
    )
    .await;
    assert_eq!(response.status, 400, "unexpected status: {}", response.head);
    assert_eq!(response.json()["kind"], "invalid_parameter");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn zero_scale_is_rejected() {
    let addr = spawn_server(QrmarkConfig::default()).await;

    let response = post_generate(
        addr,
        &[
            Part::text("data", "HELLO"),
            Part::file("watermark", "logo.png", logo_png(20, 20)),
            Part::text("scale", "0"),
        ],
    )
    .await;
    assert_eq!(response.status, 400, "unexpected status: {}", response.head);
    assert_eq!(response.json()["kind"], "invalid_parameter");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn corrupt_watermark_is_unprocessable() {
    let addr = spawn_server(QrmarkConfig::default()).await;

    let response = post_generate(
        addr,
        &[
            Part::text("data", "HELLO"),
            Part::file("watermark", "logo.png", b"not an image at all".to_vec()),
        ],
    )
    .await;
    assert_eq!(response.status, 422, "unexpected status: {}", response.head);
    assert_eq!(response.json()["kind"], "image_load");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tall_sliver_watermark_is_rejected() {
    let addr = spawn_server(QrmarkConfig::default()).await;

    let sliver = logo_png(1, 100_000);
    assert!(sliver.len() < QrmarkConfig::default().server.max_upload_bytes);

    let response = post_generate(
        addr,
        &[
            Part::text("data", "HELLO"),
            Part::file("watermark", "sliver.png", sliver),
            Part::text("scale", "1.0"),
        ],
    )
    .await;
    assert_eq!(response.status, 400, "unexpected status: {}", response.head);
    assert_eq!(response.json()["kind"], "invalid_parameter");

    // The service is still up
    let response = post_generate(addr, &[Part::text("data", "HELLO")]).await;
    assert_eq!(response.status, 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn verification_header_is_reported() {
    let mut config = QrmarkConfig::default();
    config.qr.verify_output = true;
    let addr = spawn_server(config).await;

    let response = post_generate(
        addr,
        &[
            Part::text("data", "HELLO"),
            Part::file("watermark", "logo.png", logo_png(40, 40)),
            Part::text("transparency", "60"),
            Part::text("scale", "0.15"),
        ],
    )
    .await;
    assert_eq!(response.status, 200, "unexpected status: {}", response.head);
    assert_eq!(response.header("x-qr-scannable").as_deref(), Some("true"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn metrics_route_absent_when_disabled() {
    let addr = spawn_server(QrmarkConfig::default()).await;

    let response = get(addr, "/metrics").await;
    assert_eq!(response.status, 404);
}
