//! Integration tests for `LabelClient` using wiremock HTTP mocks.

use bigear_vision::{LabelClient, LabelOutcome, ServiceErrorKind, VisionError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMAGE: &[u8] = b"\x89PNG fake image";
// base64 of IMAGE
const IMAGE_B64: &str = "iVBORyBmYWtlIGltYWdl";

fn test_client(server: &MockServer, api_key: Option<&str>) -> LabelClient {
    LabelClient::new(&format!("{}/labels", server.uri()), api_key, 30, "bigear-test")
        .expect("client construction should not fail")
        .with_retry_policy(2, 0)
}

async fn mount_image(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/media/photo.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(IMAGE))
        .mount(server)
        .await;
}

#[tokio::test]
async fn enrich_downloads_encodes_and_filters_labels() {
    let server = MockServer::start().await;
    mount_image(&server).await;

    Mock::given(method("POST"))
        .and(path("/labels"))
        .and(header("authorization", "Bearer vision-key"))
        .and(body_json(serde_json::json!({
            "Image": { "Bytes": IMAGE_B64 },
            "MinConfidence": 60.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Labels": [
                { "Name": "Laptop", "Confidence": 98.1 },
                { "Name": "Electronics", "Confidence": 91.0 },
                { "Name": "Desk", "Confidence": 40.2 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, Some("vision-key"));
    let outcome = client
        .enrich(&format!("{}/media/photo.jpg", server.uri()), 60.0)
        .await
        .expect("enrichment should succeed");

    assert_eq!(outcome, LabelOutcome::Labels("Laptop Electronics".to_owned()));
}

#[tokio::test]
async fn empty_label_list_is_no_labels() {
    let server = MockServer::start().await;
    mount_image(&server).await;

    Mock::given(method("POST"))
        .and(path("/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "Labels": [] })))
        .mount(&server)
        .await;

    let client = test_client(&server, None);
    let outcome = client
        .enrich(&format!("{}/media/photo.jpg", server.uri()), 60.0)
        .await
        .expect("enrichment should succeed");
    assert_eq!(outcome, LabelOutcome::NoLabels);
}

#[tokio::test]
async fn missing_image_fails_without_calling_label_service() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server, None);
    let err = client
        .enrich(&format!("{}/media/gone.jpg", server.uri()), 60.0)
        .await
        .unwrap_err();
    assert!(matches!(err, VisionError::ImageStatus { status: 404 }));
}

#[tokio::test]
async fn typed_service_errors_are_parsed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/labels"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "__type": "com.amazonaws.rekognition#InvalidImageFormatException",
            "Message": "Request has invalid image format"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, None);
    let err = client.detect_labels(IMAGE, 60.0).await.unwrap_err();

    match err {
        VisionError::Service { kind, message } => {
            assert_eq!(kind, ServiceErrorKind::InvalidImageFormat);
            assert_eq!(message, "Request has invalid image format");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn throttling_is_retried_until_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/labels"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "code": "ThrottlingException" })),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server, None);
    let err = client.detect_labels(IMAGE, 60.0).await.unwrap_err();
    assert!(matches!(
        err,
        VisionError::Service {
            kind: ServiceErrorKind::Throttling,
            ..
        }
    ));
}

#[tokio::test]
async fn bare_server_error_maps_to_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server, None);
    let err = client.detect_labels(IMAGE, 60.0).await.unwrap_err();
    assert!(matches!(err, VisionError::UnexpectedStatus { status: 502 }));
}

#[tokio::test]
async fn oversized_image_is_rejected_without_calling_label_service() {
    let server = MockServer::start().await;
    mount_image(&server).await;

    Mock::given(method("POST"))
        .and(path("/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "Labels": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server, None).with_max_image_bytes(8);
    let err = client
        .enrich(&format!("{}/media/photo.jpg", server.uri()), 60.0)
        .await
        .unwrap_err();

    assert!(
        matches!(err, VisionError::ImageOversize { size, limit: 8 } if size > 8),
        "expected ImageOversize, got: {err:?}"
    );
}

#[tokio::test]
async fn image_exactly_at_limit_is_downloaded() {
    let server = MockServer::start().await;
    mount_image(&server).await;

    let client = test_client(&server, None).with_max_image_bytes(IMAGE.len());
    let bytes = client
        .download_image(&format!("{}/media/photo.jpg", server.uri()))
        .await
        .expect("image within the limit should download");
    assert_eq!(bytes, IMAGE);
}

#[tokio::test]
async fn label_image_applies_confidence_threshold_to_given_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/labels"))
        .and(body_json(serde_json::json!({
            "Image": { "Bytes": IMAGE_B64 },
            "MinConfidence": 75.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Labels": [
                { "Name": "Cat", "Confidence": 88.0 },
                { "Name": "Sofa", "Confidence": 70.0 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, None);
    let outcome = client.label_image(IMAGE, 75.0).await.unwrap();
    assert_eq!(outcome, LabelOutcome::Labels("Cat".to_owned()));
}
