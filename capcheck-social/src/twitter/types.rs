use serde::{Deserialize, Serialize};

/// Response envelope for `GET /2/tweets/:id`.
///
/// Lookup failures for a well-formed request (deleted tweet, protected author)
/// arrive as HTTP 200 with an `errors` array and no `data`, so every field here
/// is optional and the caller checks `errors` before trusting `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetLookupResponse {
    pub data: Option<Tweet>,
    pub includes: Option<Includes>,
    #[serde(default)]
    pub errors: Option<Vec<ApiError>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,

    #[serde(default)]
    pub edit_history_tweet_ids: Option<Vec<String>>,

    // Attachments for media mapping
    #[serde(default)]
    pub attachments: Option<Attachments>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Attachments {
    #[serde(default)]
    pub media_keys: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Includes {
    #[serde(default)]
    pub media: Option<Vec<Media>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub media_key: Option<String>,
    #[serde(default)]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub preview_image_url: Option<String>,
}

/// One entry of a v2 `errors` array.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiError {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
}
