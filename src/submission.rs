//! The shared validate → spam check → persist pipeline behind the comment
//! and review forms.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    comment::CommentForm,
    pages::PageCache,
    review::ReviewForm,
    store::{ContentStore, StoreError},
};

pub const CONFIGURATION_ERROR: &str =
    "Configuration Error: the content store write token is missing. Set store.write_token or SITE_STORE__WRITE_TOKEN.";
pub const INVALID_INPUT: &str = "Please check your input.";
pub const SPAM_DETECTED: &str = "Spam detected.";

/// Upper length bound in characters, with its own message.
pub(crate) fn at_most(
    value: &str,
    max: usize,
    message: &'static str,
) -> Result<(), ValidationError> {
    if value.chars().count() <= max {
        return Ok(());
    }
    Err(ValidationError::new("length").with_message(message.into()))
}

/// What happens to a submission whose honeypot field was filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamPolicy {
    /// Tell the submitter it failed.
    Reject,
    /// Answer as if it was stored, store nothing.
    SilentAccept,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl SubmissionOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
        }
    }

    fn invalid(errors: &ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Self {
            success: false,
            message: INVALID_INPUT.to_string(),
            errors: Some(fields),
        }
    }

    /// `field: message` lines, for templates.
    pub fn error_lines(&self) -> Vec<String> {
        self.errors
            .iter()
            .flatten()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
            .collect()
    }
}

/// A user-submitted form that ends up as a pending document in the store.
#[async_trait]
pub trait Submission: Validate + Send + Sized {
    const KIND: &'static str;
    const SPAM_POLICY: SpamPolicy;
    /// Shown once the submission is stored (or silently dropped).
    const ACCEPTED: &'static str;

    /// The decoy field legitimate visitors never see.
    fn honeypot(&self) -> Option<&str>;

    async fn persist(self, store: &dyn ContentStore) -> Result<String, StoreError>;

    fn write_failed(error: &StoreError) -> String;

    /// Cached pages a stored submission can make stale. Only the page the
    /// form was sent from is dropped when it is known and falls under it.
    fn stale_prefix() -> Option<&'static str> {
        None
    }
}

#[async_trait]
impl Submission for CommentForm {
    const KIND: &'static str = "comment";
    const SPAM_POLICY: SpamPolicy = SpamPolicy::Reject;
    const ACCEPTED: &'static str = "Comment submitted! It will appear after moderation.";

    fn honeypot(&self) -> Option<&str> {
        self.gotcha.as_deref()
    }

    async fn persist(self, store: &dyn ContentStore) -> Result<String, StoreError> {
        store.create_comment(self.into_new_comment()).await
    }

    fn write_failed(error: &StoreError) -> String {
        format!("Failed to submit: {error}")
    }

    fn stale_prefix() -> Option<&'static str> {
        Some("/blog/")
    }
}

#[async_trait]
impl Submission for ReviewForm {
    const KIND: &'static str = "review";
    // Spammers should not learn that the form saw through them.
    const SPAM_POLICY: SpamPolicy = SpamPolicy::SilentAccept;
    const ACCEPTED: &'static str =
        "Thank you for your kind words! Your review will appear after moderation.";

    fn honeypot(&self) -> Option<&str> {
        self.gotcha.as_deref()
    }

    async fn persist(self, store: &dyn ContentStore) -> Result<String, StoreError> {
        store.create_review(self.into_new_review()).await
    }

    fn write_failed(_: &StoreError) -> String {
        "Failed to submit review. Please try again.".to_string()
    }
}

/// Runs one submission through the pipeline. Steps short-circuit in order:
/// write credential, field validation, honeypot, write, page invalidation.
///
/// `origin` is the page path the form was posted from, if any.
pub async fn submit<S: Submission>(
    store: &dyn ContentStore,
    pages: &PageCache,
    form: S,
    origin: Option<&str>,
) -> SubmissionOutcome {
    if !store.has_write_credential() {
        tracing::error!(kind = S::KIND, "content store write token missing, submission refused");
        return SubmissionOutcome::failure(CONFIGURATION_ERROR);
    }

    if let Err(errors) = form.validate() {
        tracing::debug!(kind = S::KIND, %errors, "submission failed validation");
        return SubmissionOutcome::invalid(&errors);
    }

    if form.honeypot().is_some_and(|v| !v.is_empty()) {
        tracing::warn!(kind = S::KIND, policy = ?S::SPAM_POLICY, "honeypot filled in");
        return match S::SPAM_POLICY {
            SpamPolicy::Reject => SubmissionOutcome::failure(SPAM_DETECTED),
            SpamPolicy::SilentAccept => SubmissionOutcome::success(S::ACCEPTED),
        };
    }

    match form.persist(store).await {
        Ok(id) => {
            tracing::info!(kind = S::KIND, %id, "submission stored, pending moderation");
            if let Some(prefix) = S::stale_prefix() {
                match origin.filter(|path| path.starts_with(prefix)) {
                    Some(path) => {
                        let dropped = pages.invalidate(path).await;
                        tracing::debug!(path, dropped, "marked page stale");
                    }
                    None => {
                        let dropped = pages.invalidate_prefix(prefix).await;
                        tracing::debug!(prefix, dropped, "marked pages stale");
                    }
                }
            }
            SubmissionOutcome::success(S::ACCEPTED)
        }
        Err(error) => {
            tracing::error!(kind = S::KIND, %error, "failed to store submission");
            SubmissionOutcome::failure(S::write_failed(&error))
        }
    }
}
