use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{mail::is_valid_address, submission::at_most};

/// A "kind words" testimonial. The email is kept for the studio only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing)]
    pub email: String,
    pub role: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub content: String,
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct ReviewForm {
    #[serde(default)]
    #[validate(
        length(min = 2, message = "Name must be at least 2 characters"),
        custom(function = "name_limit")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "deliverable"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "Role cannot exceed 100 characters"))]
    pub role: Option<String>,
    #[serde(default)]
    #[validate(
        length(min = 10, message = "Review must be at least 10 characters"),
        custom(function = "content_limit")
    )]
    pub content: String,
    #[serde(default)]
    pub gotcha: Option<String>,
}

fn name_limit(name: &str) -> Result<(), ValidationError> {
    at_most(name, 100, "Name cannot exceed 100 characters")
}

fn content_limit(content: &str) -> Result<(), ValidationError> {
    at_most(content, 1000, "Review cannot exceed 1000 characters")
}

fn deliverable(email: &str) -> Result<(), ValidationError> {
    if is_valid_address(email) {
        return Ok(());
    }
    Err(ValidationError::new("email").with_message("Please enter a valid email address".into()))
}

impl ReviewForm {
    pub fn into_new_review(self) -> NewReview {
        NewReview {
            name: self.name,
            email: self.email,
            role: self.role.filter(|r| !r.is_empty()),
            content: self.content,
        }
    }
}
