//! Typed configuration for the capcheck workspace.
//!
//! Precedence, lowest to highest: embedded defaults, an optional
//! `capcheck.yaml`, then `CAPCHECK_`-prefixed environment variables (`__` as
//! the key separator, e.g. `CAPCHECK_CHECK__TWEET_ID`). After the sources are
//! merged, `${VAR}` placeholders inside string values are expanded from the
//! process environment, which is how the two secrets normally arrive.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Defaults merged underneath every other source. The secrets stay `${VAR}`
/// references so a plain environment is enough to run without any file.
const DEFAULT_CONFIG_YAML: &str = r#"
version: "1"

twitter:
  bearer_token: "${TWITTER_BEARER_TOKEN}"

llm:
  provider: openai
  model: "gpt-4o"
  auth_token: "${OPENAI_API_KEY}"

check:
  tweet_id: "1921316529062265045"
  reference_images:
    - "https://pbs.twimg.com/media/GqTfN1bWcAAh0dM?format=jpg&name=large"
    - "https://pbs.twimg.com/media/GqTfOx9WkAA2fRl?format=jpg&name=large"
    - "https://pbs.twimg.com/media/GqTfPslXEAEwGQb?format=jpg&name=large"
"#;

#[derive(Debug, Deserialize)]
pub struct CapcheckConfig {
    pub version: Option<String>,
    pub twitter: TwitterConfig,
    pub llm: LlmConfig,
    pub check: CheckConfig,
}

#[derive(Debug, Deserialize)]
pub struct TwitterConfig {
    pub bearer_token: String,
    #[serde(default = "default_twitter_endpoint")]
    pub endpoint: String,
}

/// The tag is `provider`; only OpenAI is wired up today, but the tag keeps the
/// file format stable if another vision-capable backend ever lands.
#[derive(Debug, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    Openai {
        model: String,
        auth_token: String,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
        #[serde(default)]
        max_output_tokens: Option<u32>,
    },
}

/// What to check: which tweet, against which reference shots, asking what.
#[derive(Debug, Deserialize)]
pub struct CheckConfig {
    pub tweet_id: String,
    pub reference_images: Vec<String>,
    #[serde(default = "default_instruction")]
    pub instruction: String,
    /// End-to-end budget for the whole run (both remote calls).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CheckConfig {
    /// The fixed reference set, exactly three URLs.
    pub fn references(&self) -> Result<[String; 3], ValidationError> {
        self.reference_images
            .clone()
            .try_into()
            .map_err(|v: Vec<String>| ValidationError::ReferenceCount(v.len()))
    }
}

fn default_twitter_endpoint() -> String {
    "https://api.twitter.com".into()
}
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1/".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_instruction() -> String {
    "Decide whether the final image shows the same black baseball hat, with the same \
     embroidered logo, that appears in the three reference images. Judge the hat itself, \
     not the person wearing it or the background."
        .into()
}

/// Problems [`CapcheckConfig::validate`] reports before anything touches the
/// network.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is not configured: environment variable {var} is unset")]
    MissingSecret { field: &'static str, var: String },
    #[error("check.tweet_id is empty")]
    EmptyTweetId,
    #[error("check.reference_images must list exactly 3 URLs, got {0}")]
    ReferenceCount(usize),
    #[error("check.reference_images[{0}] is empty")]
    EmptyReference(usize),
}

impl CapcheckConfig {
    /// Refuse to run with an unusable configuration. Each secret failure names
    /// the environment variable the caller has to export.
    pub fn validate(&self) -> Result<(), ValidationError> {
        secret_present(
            &self.twitter.bearer_token,
            "twitter.bearer_token",
            "TWITTER_BEARER_TOKEN",
        )?;
        let LlmConfig::Openai { auth_token, .. } = &self.llm;
        secret_present(auth_token, "llm.auth_token", "OPENAI_API_KEY")?;

        if self.check.tweet_id.trim().is_empty() {
            return Err(ValidationError::EmptyTweetId);
        }
        self.check.references()?;
        for (i, reference) in self.check.reference_images.iter().enumerate() {
            if reference.trim().is_empty() {
                return Err(ValidationError::EmptyReference(i));
            }
        }
        Ok(())
    }
}

/// A secret is "missing" when it is empty or still carries an unexpanded
/// `${VAR}` remnant, which is what the defaults degrade to when the variable
/// was never exported.
fn secret_present(
    value: &str,
    field: &'static str,
    conventional_var: &str,
) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingSecret {
            field,
            var: conventional_var.to_string(),
        });
    }
    if let Some(var) = unresolved_var(trimmed) {
        return Err(ValidationError::MissingSecret {
            field,
            var: var.to_string(),
        });
    }
    Ok(())
}

fn unresolved_var(value: &str) -> Option<&str> {
    let start = value.find("${")? + 2;
    let end = value[start..].find('}')? + start;
    Some(&value[start..end])
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (defaults + optional YAML file +
/// env overrides).
pub struct CapcheckConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for CapcheckConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CapcheckConfigLoader {
    /// Start from the embedded defaults.
    ///
    /// ```
    /// use capcheck_config::CapcheckConfigLoader;
    ///
    /// let config = CapcheckConfigLoader::new().load().expect("defaults parse");
    /// assert_eq!(config.check.tweet_id, "1921316529062265045");
    /// assert_eq!(config.check.reference_images.len(), 3);
    /// assert_eq!(config.check.timeout_secs, 60);
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG_YAML, config::FileFormat::Yaml));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the `config` crate infers
    /// the format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so headless deployments can rely
    /// purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet (tests and CLI overrides).
    ///
    /// ```
    /// use capcheck_config::{CapcheckConfigLoader, LlmConfig};
    ///
    /// let cfg = CapcheckConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// llm:
    ///   provider: openai
    ///   model: "gpt-4o-mini"
    ///   auth_token: "sk-inline"
    /// check:
    ///   tweet_id: "42"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.check.tweet_id, "42");
    /// let LlmConfig::Openai { model, endpoint, .. } = &cfg.llm;
    /// assert_eq!(model, "gpt-4o-mini");
    /// assert_eq!(endpoint, "https://api.openai.com/v1/");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge everything, expand `${VAR}` placeholders, and deserialize into the
    /// strongly typed config. The environment source is appended here so env
    /// overrides always win regardless of how the loader was assembled.
    pub fn load(self) -> Result<CapcheckConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(Environment::with_prefix("CAPCHECK")
                .prefix_separator("_")
                .separator("__"))
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: CapcheckConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${STATE}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles_and_leaves_value_reasonable() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            // Depth cap terminates the cycle; the remnant stays visible.
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn unresolved_var_names_the_remnant() {
        assert_eq!(unresolved_var("${TWITTER_BEARER_TOKEN}"), Some("TWITTER_BEARER_TOKEN"));
        assert_eq!(unresolved_var("AAAA-real-token"), None);
    }

    fn config_with(bearer: &str, api_key: &str) -> CapcheckConfig {
        CapcheckConfigLoader::new()
            .with_yaml_str(&format!(
                r#"
twitter:
  bearer_token: "{bearer}"
llm:
  provider: openai
  model: "gpt-4o"
  auth_token: "{api_key}"
"#
            ))
            .load()
            .expect("load test config")
    }

    #[test]
    fn validate_accepts_literal_secrets() {
        let cfg = config_with("AAAA-bearer", "sk-test");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_names_the_missing_bearer_token() {
        temp_env::with_var_unset("TWITTER_BEARER_TOKEN", || {
            let cfg = config_with("${TWITTER_BEARER_TOKEN}", "sk-test");
            let err = cfg.validate().unwrap_err();
            assert!(err.to_string().contains("TWITTER_BEARER_TOKEN"), "{err}");
        });
    }

    #[test]
    fn validate_names_the_missing_api_key() {
        temp_env::with_var_unset("OPENAI_API_KEY", || {
            let cfg = config_with("AAAA-bearer", "${OPENAI_API_KEY}");
            let err = cfg.validate().unwrap_err();
            assert!(err.to_string().contains("OPENAI_API_KEY"), "{err}");
        });
    }

    #[test]
    fn validate_requires_exactly_three_references() {
        let cfg = CapcheckConfigLoader::new()
            .with_yaml_str(
                r#"
twitter:
  bearer_token: "AAAA-bearer"
llm:
  provider: openai
  model: "gpt-4o"
  auth_token: "sk-test"
check:
  tweet_id: "1"
  reference_images:
    - "https://example.com/a.jpg"
    - "https://example.com/b.jpg"
"#,
            )
            .load()
            .unwrap();
        match cfg.validate() {
            Err(ValidationError::ReferenceCount(2)) => {}
            other => panic!("expected ReferenceCount(2), got {other:?}"),
        }
    }

    #[test]
    fn references_helper_returns_a_fixed_array() {
        let cfg = config_with("AAAA-bearer", "sk-test");
        let refs = cfg.check.references().unwrap();
        assert_eq!(refs.len(), 3);
        assert!(refs.iter().all(|r| r.starts_with("https://")));
    }
}
