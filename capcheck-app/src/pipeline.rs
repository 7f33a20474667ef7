//! Wires configuration into the resolver and verifier and runs one check.
use anyhow::{Result, bail};
use capcheck_config::CapcheckConfig;
use capcheck_llm::client_from_config;
use capcheck_llm::verifier::{VerificationResult, VisualVerifier};
use capcheck_social::twitter::{TweetResolver, TwitterApi};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct CheckOutcome {
    pub verdict: VerificationResult,
    pub image_url: String,
}

/// Cancel `cancel` once `timeout` elapses. The caller aborts the returned task
/// when the check finishes first.
pub fn spawn_deadline(cancel: CancellationToken, timeout: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::warn!(timeout_secs = timeout.as_secs(), "deadline hit, cancelling run");
        cancel.cancel();
    })
}

/// Resolve the tweet's image, then ask the model about it. Sequential by
/// construction: the verifier input is the resolver output.
pub async fn run_check(
    cfg: &CapcheckConfig,
    tweet_id: &str,
    cancel: &CancellationToken,
) -> Result<CheckOutcome> {
    let api = TwitterApi::new(cfg.twitter.bearer_token.clone(), &cfg.twitter.endpoint)?;
    let resolver = TweetResolver::new(api);

    let references = cfg.check.references()?;
    let client = client_from_config(&cfg.llm)?;
    let verifier = VisualVerifier::new(client, references, cfg.check.instruction.clone());

    let resolved = resolver.resolve(tweet_id, cancel).await?;
    let Some(image_url) = resolved.image_url else {
        bail!("tweet {tweet_id} has no image attachment to verify");
    };

    let verdict = verifier.verify(&image_url, cancel).await?;
    Ok(CheckOutcome { verdict, image_url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use capcheck_config::CapcheckConfigLoader;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TWEET_ID: &str = "1921316529062265045";

    fn test_config(
        twitter: &MockServer,
        openai: &MockServer,
        bearer: &str,
        timeout_secs: u64,
    ) -> CapcheckConfig {
        CapcheckConfigLoader::new()
            .with_yaml_str(&format!(
                r#"
twitter:
  bearer_token: "{bearer}"
  endpoint: "{}"

llm:
  provider: openai
  model: "gpt-4o"
  auth_token: "sk-test"
  endpoint: "{}"

check:
  tweet_id: "{TWEET_ID}"
  reference_images:
    - "https://refs.example/a.jpg"
    - "https://refs.example/b.jpg"
    - "https://refs.example/c.jpg"
  timeout_secs: {timeout_secs}
"#,
                twitter.uri(),
                openai.uri(),
            ))
            .load()
            .expect("test config should load")
    }

    fn tweet_with_photo() -> serde_json::Value {
        json!({
            "data": {
                "id": TWEET_ID,
                "text": "new cap day",
                "attachments": { "media_keys": ["3_abc"] }
            },
            "includes": {
                "media": [{
                    "media_key": "3_abc",
                    "type": "photo",
                    "url": "https://pbs.twimg.com/media/abc.jpg"
                }]
            }
        })
    }

    fn verdict_body(result: bool, reasoning: &str) -> serde_json::Value {
        json!({
            "id": "resp_1",
            "object": "response",
            "created_at": 1_746_000_000,
            "status": "completed",
            "model": "gpt-4o",
            "output": [{
                "id": "msg_1",
                "type": "message",
                "status": "completed",
                "content": [{
                    "type": "output_text",
                    "text": json!({ "result": result, "reasoning": reasoning }).to_string(),
                }]
            }]
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_secret_stops_the_run_before_any_request() {
        let twitter = MockServer::start().await;
        let openai = MockServer::start().await;
        let cfg = test_config(&twitter, &openai, "", 60);

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("TWITTER_BEARER_TOKEN"));

        // Validation failed, so the check never starts and nothing is dialed.
        assert!(twitter.received_requests().await.unwrap().is_empty());
        assert!(openai.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn end_to_end_check_verifies_the_resolved_photo() {
        let twitter = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/2/tweets/{TWEET_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(tweet_with_photo()))
            .expect(1)
            .mount(&twitter)
            .await;

        let openai = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(verdict_body(true, "same logo on the front panel")),
            )
            .expect(1)
            .mount(&openai)
            .await;

        let cfg = test_config(&twitter, &openai, "bearer-test", 60);
        cfg.validate().unwrap();

        let outcome = run_check(&cfg, TWEET_ID, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.image_url, "https://pbs.twimg.com/media/abc.jpg");
        assert!(outcome.verdict.result);
        assert_eq!(outcome.verdict.reasoning, "same logo on the front panel");

        // The candidate sent to the model is the URL the resolver picked.
        let sent = openai.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&sent[0].body).unwrap();
        let parts = body["input"][0]["content"].as_array().unwrap();
        assert_eq!(
            parts.last().unwrap()["image_url"],
            "https://pbs.twimg.com/media/abc.jpg"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn tweet_without_an_image_is_fatal_and_skips_the_model() {
        let twitter = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/2/tweets/{TWEET_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": TWEET_ID, "text": "words only" }
            })))
            .mount(&twitter)
            .await;

        let openai = MockServer::start().await;
        let cfg = test_config(&twitter, &openai, "bearer-test", 60);

        let err = run_check(&cfg, TWEET_ID, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no image attachment"));
        assert!(openai.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deadline_cancels_a_stalled_run() {
        let twitter = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/2/tweets/{TWEET_ID}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(tweet_with_photo())
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&twitter)
            .await;

        let openai = MockServer::start().await;
        let cfg = test_config(&twitter, &openai, "bearer-test", 60);

        let cancel = CancellationToken::new();
        let deadline = spawn_deadline(cancel.clone(), Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = run_check(&cfg, TWEET_ID, &cancel).await.unwrap_err();
        deadline.abort();

        assert!(err.to_string().contains("cancelled"));
        assert!(
            started.elapsed() < Duration::from_secs(10),
            "cancellation should abort the stalled lookup promptly"
        );
        assert!(openai.received_requests().await.unwrap().is_empty());
    }
}
