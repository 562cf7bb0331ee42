use overlay_engine::{
    DeepLSettings, DeepLTranslator, TranslateFailureKind, TranslateRequest, Translator,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(text: &str, source: &str, target: &str) -> TranslateRequest {
    TranslateRequest {
        text: text.to_string(),
        source_lang: source.to_string(),
        target_lang: target.to_string(),
    }
}

fn translator_for(server: &MockServer) -> DeepLTranslator {
    DeepLTranslator::new(DeepLSettings {
        endpoint: format!("{}/v2/translate", server.uri()),
        auth_key: "test-key".to_string(),
        ..DeepLSettings::default()
    })
}

#[tokio::test]
async fn posts_form_and_decodes_translation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/translate"))
        .and(body_string_contains("auth_key=test-key"))
        .and(body_string_contains("target_lang=FR"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"translations":[{"detected_source_language":"EN","text":"Bonjour"}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let translator = translator_for(&server);
    let translation = translator
        .translate(&request("Hello", "auto", "fr"))
        .await
        .expect("translate ok");
    assert_eq!(translation.translated_text, "Bonjour");
    assert!(!translation.cached);

    // "auto" must not be forwarded as a source language.
    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(!body.contains("source_lang"));
}

#[tokio::test]
async fn explicit_source_language_is_normalized_and_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("source_lang=PT-BR"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"translations":[{"text":"Oi"}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let translator = translator_for(&server);
    let translation = translator
        .translate(&request("Hi", "pt_br", "en"))
        .await
        .expect("translate ok");
    assert_eq!(translation.translated_text, "Oi");
}

#[tokio::test]
async fn missing_auth_key_fails_before_any_http() {
    let translator = DeepLTranslator::new(DeepLSettings {
        endpoint: "http://127.0.0.1:9/v2/translate".to_string(),
        auth_key: "   ".to_string(),
        ..DeepLSettings::default()
    });
    let err = translator
        .translate(&request("Hello", "auto", "en"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, TranslateFailureKind::MissingCredentials);
    assert!(!err.kind.is_retryable());
}

#[tokio::test]
async fn non_success_status_maps_to_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(456))
        .mount(&server)
        .await;

    let translator = translator_for(&server);
    let err = translator
        .translate(&request("Hello", "auto", "en"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, TranslateFailureKind::HttpStatus(456));
    assert!(err.kind.is_retryable());
}

#[tokio::test]
async fn unexpected_payload_shape_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"translations":[]}"#, "application/json"))
        .mount(&server)
        .await;

    let translator = translator_for(&server);
    let err = translator
        .translate(&request("Hello", "auto", "en"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, TranslateFailureKind::MalformedResponse);
}

#[tokio::test]
async fn invalid_endpoint_is_rejected() {
    let translator = DeepLTranslator::new(DeepLSettings {
        endpoint: "not a url".to_string(),
        auth_key: "key".to_string(),
        ..DeepLSettings::default()
    });
    let err = translator
        .translate(&request("Hello", "auto", "en"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, TranslateFailureKind::InvalidEndpoint);
}
