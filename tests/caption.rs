use alt_text_generator::{CaptionError, Captioner};
use image::{DynamicImage, Rgb, RgbImage};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([120, 40, 200])))
}

#[tokio::test]
async fn returns_first_caption_from_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"generated_text": "a cat sitting on a windowsill"},
            {"generated_text": "a second candidate"}
        ])))
        .mount(&server)
        .await;

    let captioner = Captioner::with_endpoint(server.uri());
    let caption = captioner
        .generate_caption(&test_image(), "test-token")
        .await
        .unwrap();

    assert_eq!(caption, "a cat sitting on a windowsill");
}

#[tokio::test]
async fn caption_is_returned_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"generated_text": "  A cat.  "}
        ])))
        .mount(&server)
        .await;

    let captioner = Captioner::with_endpoint(server.uri());
    let caption = captioner
        .generate_caption(&test_image(), "tok")
        .await
        .unwrap();

    // No trimming or escaping of the model output.
    assert_eq!(caption, "  A cat.  ");
}

#[tokio::test]
async fn server_error_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let captioner = Captioner::with_endpoint(server.uri());
    let err = captioner
        .generate_caption(&test_image(), "tok")
        .await
        .unwrap_err();

    assert!(matches!(err, CaptionError::Transport(_)));
}

#[tokio::test]
async fn connection_failure_is_transport() {
    // Nothing listens on the discard port.
    let captioner = Captioner::with_endpoint("http://127.0.0.1:9");
    let err = captioner
        .generate_caption(&test_image(), "tok")
        .await
        .unwrap_err();

    assert!(matches!(err, CaptionError::Transport(_)));
}

#[tokio::test]
async fn empty_array_is_response_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let captioner = Captioner::with_endpoint(server.uri());
    let err = captioner
        .generate_caption(&test_image(), "tok")
        .await
        .unwrap_err();

    assert!(matches!(err, CaptionError::ResponseFormat(_)));
}

#[tokio::test]
async fn missing_field_is_response_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"label": "cat", "score": 0.98}
        ])))
        .mount(&server)
        .await;

    let captioner = Captioner::with_endpoint(server.uri());
    let err = captioner
        .generate_caption(&test_image(), "tok")
        .await
        .unwrap_err();

    assert!(matches!(err, CaptionError::ResponseFormat(_)));
}

#[tokio::test]
async fn non_json_body_is_response_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway timeout</html>"))
        .mount(&server)
        .await;

    let captioner = Captioner::with_endpoint(server.uri());
    let err = captioner
        .generate_caption(&test_image(), "tok")
        .await
        .unwrap_err();

    assert!(matches!(err, CaptionError::ResponseFormat(_)));
}

#[tokio::test]
async fn empty_caption_is_response_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"generated_text": ""}
        ])))
        .mount(&server)
        .await;

    let captioner = Captioner::with_endpoint(server.uri());
    let err = captioner
        .generate_caption(&test_image(), "tok")
        .await
        .unwrap_err();

    assert!(matches!(err, CaptionError::ResponseFormat(_)));
}

#[tokio::test]
async fn repeated_calls_are_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"generated_text": "a red square"}
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let captioner = Captioner::with_endpoint(server.uri());
    let first = captioner
        .generate_caption(&test_image(), "tok")
        .await
        .unwrap();
    let second = captioner
        .generate_caption(&test_image(), "tok")
        .await
        .unwrap();

    assert_eq!(first, second);
}
