use chrono::{DateTime, Utc};
use colored::Colorize;
use plume_client::{ClientError, StoredPost};
use serde::Serialize;

/// A post as shown to people and scripts.
#[derive(Debug, Serialize)]
pub struct PostView {
    pub key: String,
    pub author: String,
    pub created_at: i64,
    /// RFC 3339, absent if the stamp is out of chrono's range.
    pub created: Option<String>,
    pub topic: String,
    pub content: String,
}

impl From<&StoredPost> for PostView {
    fn from(post: &StoredPost) -> Self {
        let secs = post.record.created_at.as_secs();
        Self {
            key: post.key.to_hex(),
            author: post.record.author.to_hex(),
            created_at: secs,
            created: DateTime::from_timestamp(secs, 0).map(|t| t.to_rfc3339()),
            topic: post.record.topic.clone(),
            content: post.record.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedView {
    pub posts: Vec<PostView>,
    pub stale: bool,
    pub skipped: usize,
    pub error: Option<String>,
}

/// "just now", "5m ago", "3h ago", "2d ago", then a plain date.
pub fn relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    if elapsed.num_seconds() < 60 {
        "just now".into()
    } else if elapsed.num_minutes() < 60 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        then.format("%Y-%m-%d").to_string()
    }
}

pub fn post_line(post: &StoredPost, now: DateTime<Utc>) -> String {
    let when = DateTime::from_timestamp(post.record.created_at.as_secs(), 0)
        .map(|t| relative(t, now))
        .unwrap_or_else(|| post.record.created_at.to_string());
    format!(
        "{} {}  {}  {}\n    {}",
        "#".dimmed(),
        post.record.topic.cyan().bold(),
        post.record.author.short().dimmed(),
        when.dimmed(),
        post.record.content
    )
}

pub fn post_detail(post: &StoredPost) -> String {
    let view = PostView::from(post);
    format!(
        "Post {}\n  Author:  {}\n  Created: {}\n  Topic:   {}\n\n  {}",
        view.key.yellow().bold(),
        view.author,
        view.created.unwrap_or_else(|| view.created_at.to_string()),
        view.topic.cyan(),
        view.content
    )
}

/// What to tell a person about a failed request.
pub fn describe(err: &ClientError) -> String {
    match err.rejection() {
        Some(code) => code.message().to_string(),
        None => err.to_string(),
    }
}
