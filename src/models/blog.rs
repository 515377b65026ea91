use serde::{Deserialize, Serialize};

use crate::utils::format_date;

use super::content::{deserialize_blocks, ContentBlock};

/// Average adult reading speed, used for the "N min read" badge
const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    #[serde(default)]
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blocks")]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(rename = "publishedAt", default)]
    pub published_at: Option<String>,
    #[serde(rename = "coverImage", default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Blog {
    pub fn formatted_published_at(&self) -> String {
        match &self.published_at {
            Some(date) => format_date(date),
            None => "Unpublished".to_string(),
        }
    }

    /// Estimated reading time in whole minutes, never below one.
    pub fn reading_time_minutes(&self) -> usize {
        let words: usize = self
            .content
            .iter()
            .map(|b| b.plain_text().split_whitespace().count())
            .sum();
        (words / WORDS_PER_MINUTE).max(1)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blog_fixture() {
        let json = r#"{
            "id": 7,
            "slug": "five-stretches-for-desk-workers",
            "title": "Five Stretches for Desk Workers",
            "excerpt": "Loosen up without leaving your chair.",
            "content": ["Sitting all day shortens the hip flexors."],
            "author": "Priya N.",
            "publishedAt": "2026-02-01T09:00:00+05:30",
            "tags": ["mobility", "office"]
        }"#;
        let blog: Blog = serde_json::from_str(json).expect("Failed to parse blog fixture");
        assert_eq!(blog.slug, "five-stretches-for-desk-workers");
        assert_eq!(blog.tags.len(), 2);
        assert_eq!(blog.formatted_published_at(), "Feb 01, 2026");
    }

    #[test]
    fn test_minimal_blog_defaults() {
        let blog: Blog = serde_json::from_str(r#"{"slug": "hello", "title": "Hello"}"#).unwrap();
        assert!(blog.content.is_empty());
        assert_eq!(blog.formatted_published_at(), "Unpublished");
    }

    #[test]
    fn test_reading_time_floor() {
        let blog: Blog =
            serde_json::from_str(r#"{"slug": "s", "title": "t", "content": "two words"}"#).unwrap();
        assert_eq!(blog.reading_time_minutes(), 1);
    }

    #[test]
    fn test_reading_time_scales_with_content() {
        let body = vec!["word "; 650].concat();
        let blog = Blog {
            id: 0,
            slug: "long".into(),
            title: "Long".into(),
            excerpt: None,
            content: vec![ContentBlock::PlainText(body)],
            author: None,
            published_at: None,
            cover_image: None,
            tags: vec![],
        };
        assert_eq!(blog.reading_time_minutes(), 3);
    }
}
