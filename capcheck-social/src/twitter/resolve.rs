//! Turns a tweet lookup response into the one image URL worth verifying.
use crate::twitter::client::TwitterApi;
use crate::twitter::types::{Includes, Media, Tweet, TweetLookupResponse};
use capcheck_http::HttpError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Output of tweet resolution. `image_url`, when present, is always one of the
/// attachment URLs the API returned, never synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub image_url: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The lookup answered with an `errors` array (deleted tweet, protected
    /// author, malformed id).
    #[error("tweet lookup failed: {0}")]
    Api(String),
    /// HTTP succeeded but the response carried no tweet payload at all.
    #[error("tweet {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Http(#[from] HttpError),
}

pub struct TweetResolver {
    api: TwitterApi,
}

impl TweetResolver {
    pub fn new(api: TwitterApi) -> Self {
        Self { api }
    }

    /// Look up `tweet_id` and select its best attached image.
    ///
    /// A tweet without a usable image is not an error at this layer: the result
    /// carries `image_url: None` and the caller decides whether that is fatal.
    pub async fn resolve(
        &self,
        tweet_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ResolvedImage, ResolveError> {
        tracing::info!(tweet_id, "resolving tweet media");
        let resp = self.api.lookup_tweet(tweet_id, cancel).await?;
        resolve_from_response(tweet_id, resp)
    }
}

/// Pure resolution step, split from the network call so the selection rules are
/// testable on hand-built responses.
pub fn resolve_from_response(
    tweet_id: &str,
    resp: TweetLookupResponse,
) -> Result<ResolvedImage, ResolveError> {
    if let Some(first) = resp.errors.as_deref().and_then(|errs| errs.first()) {
        let message = first
            .detail
            .clone()
            .or_else(|| first.title.clone())
            .unwrap_or_else(|| "unspecified lookup error".to_string());
        return Err(ResolveError::Api(message));
    }

    let Some(tweet) = resp.data else {
        return Err(ResolveError::NotFound(tweet_id.to_string()));
    };

    let media = attached_media(&tweet, resp.includes.as_ref());
    let image_url = select_image_url(&media);
    if image_url.is_none() {
        tracing::warn!(tweet_id, "tweet has no usable image attachment");
    }

    Ok(ResolvedImage {
        image_url,
        text: Some(tweet.text),
    })
}

/// Media objects referenced by the tweet's `attachments.media_keys`, in
/// attachment order. Keys without a matching `includes.media` entry are
/// skipped, as are media entries the tweet does not reference.
fn attached_media<'a>(tweet: &Tweet, includes: Option<&'a Includes>) -> Vec<&'a Media> {
    let (Some(att), Some(inc)) = (&tweet.attachments, includes) else {
        return Vec::new();
    };
    let keys = att.media_keys.as_deref().unwrap_or(&[]);
    let all = inc.media.as_deref().unwrap_or(&[]);
    keys.iter()
        .filter_map(|k| all.iter().find(|m| m.media_key.as_deref() == Some(k.as_str())))
        .collect()
}

/// Image selection precedence, first match wins within each rule:
/// photo `url`, then photo `preview_image_url`, then video `preview_image_url`.
/// Other media kinds (animated gifs) never qualify.
pub fn select_image_url(media: &[&Media]) -> Option<String> {
    let non_empty =
        |url: &Option<String>| url.as_deref().filter(|u| !u.is_empty()).map(str::to_string);

    media
        .iter()
        .filter(|m| m.kind.as_deref() == Some("photo"))
        .find_map(|m| non_empty(&m.url))
        .or_else(|| {
            media
                .iter()
                .filter(|m| m.kind.as_deref() == Some("photo"))
                .find_map(|m| non_empty(&m.preview_image_url))
        })
        .or_else(|| {
            media
                .iter()
                .filter(|m| m.kind.as_deref() == Some("video"))
                .find_map(|m| non_empty(&m.preview_image_url))
        })
}
