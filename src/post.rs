use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn published(&self) -> String {
        match self.published_at {
            Some(date) => date.format("%B %-d, %Y").to_string(),
            None => "Draft".to_string(),
        }
    }
}
