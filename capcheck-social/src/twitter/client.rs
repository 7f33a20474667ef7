//! Minimal wrapper around the Twitter/X single-tweet lookup endpoint.
//!
//! Handles auth and request parameter shaping before delegating to the shared
//! HTTP client. Lookup is the only call capcheck makes: one tweet, one request,
//! no retries.
use crate::twitter::types::TweetLookupResponse;
use capcheck_http::{Auth, HttpClient, HttpError, RequestOpts};
use std::borrow::Cow;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    bearer: String,
}

impl TwitterApi {
    /// `endpoint` is the API origin, normally `https://api.twitter.com`. Tests
    /// point it at a local mock server instead of the live API.
    pub fn new(bearer_token: String, endpoint: &str) -> Result<Self, HttpError> {
        let http = HttpClient::new(endpoint)?;
        Ok(Self {
            http,
            bearer: bearer_token,
        })
    }

    /// Fetch one tweet with its attached media expanded.
    ///
    /// Requests exactly the media fields the resolver consumes (`url`,
    /// `preview_image_url`, `type`). Partial API errors ride along in the
    /// response body rather than failing the call; the resolver inspects them.
    pub async fn lookup_tweet(
        &self,
        tweet_id: &str,
        cancel: &CancellationToken,
    ) -> Result<TweetLookupResponse, HttpError> {
        let params: Vec<(&str, Cow<'_, str>)> = vec![
            ("expansions", "attachments.media_keys".into()),
            ("media.fields", "url,preview_image_url,type".into()),
        ];

        let resp: TweetLookupResponse = self
            .http
            .get_json(
                &format!("2/tweets/{tweet_id}"),
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.bearer)),
                    query: Some(params),
                    cancel: Some(cancel.clone()),
                    ..Default::default()
                },
            )
            .await?;

        tracing::debug!("Twitter lookup response: {:?}", resp);
        Ok(resp)
    }
}
