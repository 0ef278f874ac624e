//! Turns unreliable model text into a JSON value.
//!
//! [`JsonValidator::validate`] first tries the text as-is. When that fails it
//! asks the model to reformat the text into the report schema, parsing each
//! reply directly and then again with markdown code fences stripped. Every
//! reformat call that does not yield JSON (or that errors) consumes one
//! attempt; attempts are separated by a fixed delay.
//!
//! The delay goes through the [`Delay`] trait so tests can count pauses
//! instead of sleeping.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ReviewLensError, Result};
use crate::llm::LanguageModel;
use crate::prompt::REFORMAT_PROMPT;

/// Default number of reformat attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Default pause between reformat attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Bounded attempts with a fixed delay between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, delay: DEFAULT_RETRY_DELAY }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

/// Waits between attempts.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// [`Delay`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Parse-or-reformat loop around a [`LanguageModel`].
#[derive(Clone)]
pub struct JsonValidator {
    model: Arc<dyn LanguageModel>,
    delay: Arc<dyn Delay>,
    policy: RetryPolicy,
}

impl JsonValidator {
    /// Validator with the default policy and a real tokio delay.
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model, delay: Arc::new(TokioDelay), policy: RetryPolicy::default() }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns `content` as JSON, asking the model to repair it when needed.
    ///
    /// The result is syntactically valid JSON; its shape is not checked here.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewLensError::JsonValidation`] once every attempt has failed,
    /// carrying the last parse or model error.
    pub async fn validate(&self, content: &str) -> Result<Value> {
        let mut last_error = match serde_json::from_str::<Value>(content) {
            Ok(value) => return Ok(value),
            Err(e) => e.to_string(),
        };
        debug!(error = %last_error, "model output is not JSON, requesting reformat");

        let request = format!("{}\n\nContent to format:\n{}", REFORMAT_PROMPT, content);

        for attempt in 1..=self.policy.max_attempts {
            match self.reformat(&request).await {
                Ok(value) => {
                    info!(attempt, "validated JSON after reformat");
                    return Ok(value);
                }
                Err(e) => last_error = e,
            }

            if attempt < self.policy.max_attempts {
                warn!(attempt, error = %last_error, delay = ?self.policy.delay, "reformat attempt failed, retrying");
                self.delay.wait(self.policy.delay).await;
            }
        }

        Err(ReviewLensError::JsonValidation { attempts: self.policy.max_attempts, last_error })
    }

    /// One reformat round trip; the error is the reason the attempt failed.
    async fn reformat(&self, request: &str) -> std::result::Result<Value, String> {
        let reply = self.model.complete(request).await.map_err(|e| e.to_string())?;
        let reply = reply.trim();

        match serde_json::from_str(reply) {
            Ok(value) => Ok(value),
            Err(_) => serde_json::from_str(&strip_fences(reply)).map_err(|e| e.to_string()),
        }
    }
}

/// Removes markdown code fence markers (```` ```json ```` and ```` ``` ````).
pub fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VALID: &str = r#"{"report": {"extraction": [{"fields": {"Ratings": "47", "Rated": "4.86", "Price": "$10", "ReviewSummary": "Good", "url": "https://a.example", "title": "A"}}]}}"#;

    /// Replays scripted replies, then keeps answering with prose.
    struct ScriptedModel {
        replies: Mutex<VecDeque<std::result::Result<String, ModelError>>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<std::result::Result<String, ModelError>>) -> Arc<Self> {
            Arc::new(Self { replies: Mutex::new(replies.into()), calls: AtomicUsize::new(0), prompts: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> std::result::Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies.lock().unwrap().pop_front().unwrap_or_else(|| Ok("Sorry, I cannot do that.".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingDelay {
        waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn wait(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    fn validator(model: Arc<ScriptedModel>, delay: Arc<RecordingDelay>) -> JsonValidator {
        JsonValidator::new(model).with_delay(delay)
    }

    #[tokio::test]
    async fn test_valid_json_skips_model() {
        let model = ScriptedModel::new(vec![]);
        let delay = Arc::new(RecordingDelay::default());

        let value = validator(model.clone(), delay.clone()).validate(VALID).await.unwrap();

        assert_eq!(value["report"]["extraction"][0]["fields"]["Rated"], "4.86");
        assert_eq!(model.calls(), 0);
        assert!(delay.waits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reformat_request_carries_schema_and_content() {
        let model = ScriptedModel::new(vec![Ok(VALID.to_string())]);
        let delay = Arc::new(RecordingDelay::default());

        validator(model.clone(), delay).validate("Ratings: 47, Rated 4.86").await.unwrap();

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0], format!("{}\n\nContent to format:\nRatings: 47, Rated 4.86", REFORMAT_PROMPT));
    }

    #[tokio::test]
    async fn test_fenced_reply_is_accepted() {
        let fenced = format!("```json\n{}\n```", VALID);
        let model = ScriptedModel::new(vec![Ok(fenced)]);
        let delay = Arc::new(RecordingDelay::default());

        let value = validator(model.clone(), delay.clone()).validate("not json").await.unwrap();

        assert_eq!(value["report"]["extraction"][0]["fields"]["Ratings"], "47");
        assert_eq!(model.calls(), 1);
        assert!(delay.waits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fenced_input_succeeds_within_budget() {
        let fenced = format!("```json\n{}\n```", VALID);
        let model = ScriptedModel::new(vec![Ok("still prose".to_string()), Ok(fenced.clone())]);
        let delay = Arc::new(RecordingDelay::default());

        let value = validator(model.clone(), delay.clone()).validate(&fenced).await.unwrap();

        assert!(value.is_object());
        assert_eq!(model.calls(), 2);
        assert_eq!(delay.waits.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let model = ScriptedModel::new(vec![]);
        let delay = Arc::new(RecordingDelay::default());

        let result = validator(model.clone(), delay.clone()).validate("never json").await;

        match result {
            Err(ReviewLensError::JsonValidation { attempts, last_error }) => {
                assert_eq!(attempts, 8);
                assert!(!last_error.is_empty());
            }
            other => panic!("expected JsonValidation, got {:?}", other),
        }
        assert_eq!(model.calls(), 8);

        let waits = delay.waits.lock().unwrap();
        assert_eq!(waits.len(), 7);
        assert_eq!(waits.iter().sum::<Duration>(), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_model_error_consumes_an_attempt() {
        let model = ScriptedModel::new(vec![
            Err(ModelError::Status { status: 429, message: "quota".to_string() }),
            Ok(VALID.to_string()),
        ]);
        let delay = Arc::new(RecordingDelay::default());

        validator(model.clone(), delay.clone()).validate("nope").await.unwrap();

        assert_eq!(model.calls(), 2);
        assert_eq!(delay.waits.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_last_error_reports_model_failure() {
        let model = ScriptedModel::new(vec![
            Ok("prose".to_string()),
            Err(ModelError::Status { status: 500, message: "backend down".to_string() }),
        ]);
        let delay = Arc::new(RecordingDelay::default());

        let result = validator(model, delay)
            .with_policy(RetryPolicy::new(2, Duration::from_millis(5)))
            .validate("nope")
            .await;

        match result {
            Err(ReviewLensError::JsonValidation { attempts, last_error }) => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("backend down"));
            }
            other => panic!("expected JsonValidation, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_real_delay_spends_at_least_attempts_minus_one_delays() {
        let model = ScriptedModel::new(vec![]);
        let validator = JsonValidator::new(model.clone()).with_policy(RetryPolicy::new(4, Duration::from_secs(1)));

        let started = tokio::time::Instant::now();
        let result = validator.validate("never json").await;

        assert!(matches!(result, Err(ReviewLensError::JsonValidation { attempts: 4, .. })));
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(model.calls(), 4);
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_fences("```\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_fences("  {}  "), "{}");
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 8);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }
}
