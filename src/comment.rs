use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::submission::at_most;

/// A blog comment as stored. `approved` is only ever flipped by a moderator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub parent_id: Option<String>,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub approved: bool,
}

impl Comment {
    pub fn published(&self) -> String {
        self.created_at.format("%d.%m.%Y %H:%M").to_string()
    }
}

/// A comment about to be written. Always pending moderation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub post_id: String,
    pub parent_id: Option<String>,
    pub author: String,
    pub body: String,
}

/// Raw comment form fields. Accepts both the form names and camelCase keys.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default, alias = "postId")]
    #[validate(length(min = 1, message = "Post is required"))]
    pub post_id: String,
    #[serde(default)]
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(
        length(min = 2, message = "Comment must be at least 2 characters"),
        custom(function = "comment_limit")
    )]
    pub comment: String,
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<String>,
    /// Honeypot, hidden from humans.
    #[serde(default)]
    pub gotcha: Option<String>,
}

fn comment_limit(comment: &str) -> Result<(), ValidationError> {
    at_most(comment, 1000, "Comment cannot exceed 1000 characters")
}

impl CommentForm {
    pub fn into_new_comment(self) -> NewComment {
        NewComment {
            post_id: self.post_id,
            parent_id: self.parent_id.filter(|p| !p.is_empty()),
            author: self.name,
            body: self.comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(comment: &str) -> CommentForm {
        CommentForm {
            post_id: "post-1".to_string(),
            name: "Ada".to_string(),
            comment: comment.to_string(),
            ..Default::default()
        }
    }

    fn has_field_error(form: &CommentForm, field: &str) -> bool {
        match form.validate() {
            Ok(()) => false,
            Err(errors) => errors.field_errors().contains_key(field),
        }
    }

    #[test]
    fn comment_length_bounds() {
        assert!(has_field_error(&form("a"), "comment"));
        assert!(form("ab").validate().is_ok());
        assert!(form(&"x".repeat(1000)).validate().is_ok());
        assert!(has_field_error(&form(&"x".repeat(1001)), "comment"));
    }

    #[test]
    fn each_bound_has_its_own_message() {
        let messages = |form: CommentForm| -> Vec<String> {
            form.validate().unwrap_err().field_errors()["comment"]
                .iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .collect()
        };
        assert_eq!(messages(form("a")), ["Comment must be at least 2 characters"]);
        assert_eq!(
            messages(form(&"x".repeat(1001))),
            ["Comment cannot exceed 1000 characters"]
        );
    }

    #[test]
    fn comment_length_counts_characters() {
        assert!(form(&"é".repeat(1000)).validate().is_ok());
    }

    #[test]
    fn name_and_post_are_required() {
        let mut short_name = form("lovely light");
        short_name.name = "A".to_string();
        assert!(has_field_error(&short_name, "name"));

        let mut no_post = form("lovely light");
        no_post.post_id.clear();
        assert!(has_field_error(&no_post, "post_id"));
    }

    #[test]
    fn empty_parent_is_top_level() {
        let mut reply = form("agreed");
        reply.parent_id = Some(String::new());
        assert_eq!(reply.into_new_comment().parent_id, None);

        let mut reply = form("agreed");
        reply.parent_id = Some("c-1".to_string());
        assert_eq!(reply.into_new_comment().parent_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn form_accepts_camel_case_keys() {
        let parsed: CommentForm = serde_json::from_str(
            r#"{"postId":"p","name":"Ada","comment":"hi there","parentId":"c-9"}"#,
        )
        .unwrap();
        assert_eq!(parsed.post_id, "p");
        assert_eq!(parsed.parent_id.as_deref(), Some("c-9"));
        assert!(parsed.gotcha.is_none());
    }
}
