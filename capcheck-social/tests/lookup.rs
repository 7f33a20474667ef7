use capcheck_social::twitter::{ResolveError, TweetResolver, TwitterApi};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver_for(server: &MockServer) -> TweetResolver {
    let api = TwitterApi::new("test-bearer".to_string(), &server.uri()).unwrap();
    TweetResolver::new(api)
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_resolves_a_photo_tweet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/1921316529062265045"))
        .and(query_param("expansions", "attachments.media_keys"))
        .and(query_param("media.fields", "url,preview_image_url,type"))
        .and(header("authorization", "Bearer test-bearer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "1921316529062265045",
                "text": "look at this hat",
                "edit_history_tweet_ids": ["1921316529062265045"],
                "attachments": { "media_keys": ["3_abc"] }
            },
            "includes": {
                "media": [{
                    "media_key": "3_abc",
                    "type": "photo",
                    "url": "https://pbs.twimg.com/media/abc.jpg"
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolved = resolver_for(&server)
        .resolve("1921316529062265045", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        resolved.image_url.as_deref(),
        Some("https://pbs.twimg.com/media/abc.jpg")
    );
    assert_eq!(resolved.text.as_deref(), Some("look at this hat"));
}

#[tokio::test(flavor = "multi_thread")]
async fn partial_error_bodies_fail_resolution() {
    let server = MockServer::start().await;
    // Deleted tweets answer 200 with an errors array and no data.
    Mock::given(method("GET"))
        .and(path("/2/tweets/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{
                "value": "9",
                "detail": "Could not find tweet with id: [9].",
                "title": "Not Found Error",
                "resource_type": "tweet"
            }]
        })))
        .mount(&server)
        .await;

    let err = resolver_for(&server)
        .resolve("9", &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        ResolveError::Api(msg) => assert_eq!(msg, "Could not find tweet with id: [9]."),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn http_level_failures_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/9"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "title": "Unauthorized",
            "detail": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let err = resolver_for(&server)
        .resolve("9", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Http(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_aborts_the_lookup() {
    let server = MockServer::start().await;
    let token = CancellationToken::new();
    token.cancel();

    let err = resolver_for(&server)
        .resolve("1921316529062265045", &token)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ResolveError::Http(capcheck_http::HttpError::Cancelled)
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}
