use crate::error::ExtractionError;
use crate::types::{PostRecord, Row, DELETED_AUTHOR, REDDIT_WEB_BASE};
use chrono::{DateTime, Utc};

const UNKNOWN_POST_ID: &str = "<unknown>";

/// Flattens one listing record into a [`Row`].
///
/// The `subreddit` column takes the record's own subreddit name, falling
/// back to `subreddit` (the name the listing was requested under). A missing
/// author (or Reddit's own `[deleted]` marker) becomes [`DELETED_AUTHOR`].
/// Link posts get an empty `selftext`.
pub fn extract(subreddit: &str, post: &PostRecord) -> Result<Row, ExtractionError> {
    let post_id = post.id.as_deref().unwrap_or(UNKNOWN_POST_ID);
    let missing = |field: &'static str| ExtractionError::MissingField {
        post_id: post_id.to_string(),
        field,
    };

    let id = post.id.clone().ok_or_else(|| missing("id"))?;
    let title = post.title.clone().ok_or_else(|| missing("title"))?;
    let score = post.score.ok_or_else(|| missing("score"))?;
    let num_comments = post.num_comments.ok_or_else(|| missing("num_comments"))?;
    let created = post.created_utc.ok_or_else(|| missing("created_utc"))?;
    let permalink = post.permalink.as_deref().ok_or_else(|| missing("permalink"))?;

    let created_utc = timestamp_from_epoch(created).ok_or_else(|| {
        ExtractionError::InvalidTimestamp {
            post_id: id.clone(),
            value: created,
        }
    })?;

    let permalink = absolute_permalink(permalink);
    let is_self_post = post.is_self.unwrap_or(false);

    Ok(Row {
        title,
        score,
        author: author_name(post.author.as_deref()),
        num_comments,
        created_utc,
        url: post.url.clone().unwrap_or_else(|| permalink.clone()),
        permalink,
        selftext: if is_self_post {
            post.selftext.clone().unwrap_or_default()
        } else {
            String::new()
        },
        subreddit: match post.subreddit.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => subreddit.to_string(),
        },
        is_self_post,
        id,
    })
}

fn author_name(author: Option<&str>) -> String {
    match author {
        Some(name) if !name.is_empty() && name != DELETED_AUTHOR => name.to_string(),
        _ => DELETED_AUTHOR.to_string(),
    }
}

fn absolute_permalink(permalink: &str) -> String {
    if permalink.starts_with("http://") || permalink.starts_with("https://") {
        permalink.to_string()
    } else {
        format!("{}{}", REDDIT_WEB_BASE, permalink)
    }
}

fn timestamp_from_epoch(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp(seconds.trunc() as i64, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, COLUMNS};

    fn sample_post() -> PostRecord {
        PostRecord {
            id: Some("1abcde".to_string()),
            title: Some("Announcing Rust 1.80".to_string()),
            score: Some(1234),
            author: Some("alice".to_string()),
            num_comments: Some(56),
            created_utc: Some(1_700_000_000.0),
            url: Some("https://blog.rust-lang.org/".to_string()),
            permalink: Some("/r/rust/comments/1abcde/announcing_rust_180/".to_string()),
            selftext: Some("ignored for link posts".to_string()),
            is_self: Some(false),
            subreddit: None,
        }
    }

    #[test]
    fn test_extract_link_post() {
        let row = extract("rust", &sample_post()).unwrap();
        assert_eq!(row.id, "1abcde");
        assert_eq!(row.title, "Announcing Rust 1.80");
        assert_eq!(row.score, 1234);
        assert_eq!(row.author, "alice");
        assert_eq!(row.num_comments, 56);
        assert_eq!(row.created_utc.timestamp(), 1_700_000_000);
        assert_eq!(row.url, "https://blog.rust-lang.org/");
        assert_eq!(
            row.permalink,
            "https://www.reddit.com/r/rust/comments/1abcde/announcing_rust_180/"
        );
        assert_eq!(row.selftext, "");
        assert_eq!(row.subreddit, "rust");
        assert!(!row.is_self_post);
    }

    #[test]
    fn test_extract_self_post_keeps_selftext() {
        let post = PostRecord {
            is_self: Some(true),
            selftext: Some("body text".to_string()),
            ..sample_post()
        };
        let row = extract("rust", &post).unwrap();
        assert!(row.is_self_post);
        assert_eq!(row.selftext, "body text");
    }

    #[test]
    fn test_deleted_author_placeholder() {
        let absent = PostRecord {
            author: None,
            ..sample_post()
        };
        assert_eq!(extract("rust", &absent).unwrap().author, DELETED_AUTHOR);

        let marked = PostRecord {
            author: Some("[deleted]".to_string()),
            ..sample_post()
        };
        assert_eq!(extract("rust", &marked).unwrap().author, DELETED_AUTHOR);
    }

    #[test]
    fn test_present_author_verbatim() {
        let post = PostRecord {
            author: Some("Some_User-42".to_string()),
            ..sample_post()
        };
        assert_eq!(extract("rust", &post).unwrap().author, "Some_User-42");
    }

    #[test]
    fn test_missing_required_field() {
        let post = PostRecord {
            score: None,
            ..sample_post()
        };
        assert_eq!(
            extract("rust", &post),
            Err(ExtractionError::MissingField {
                post_id: "1abcde".to_string(),
                field: "score",
            })
        );

        let post = PostRecord {
            id: None,
            ..sample_post()
        };
        assert_eq!(
            extract("rust", &post),
            Err(ExtractionError::MissingField {
                post_id: UNKNOWN_POST_ID.to_string(),
                field: "id",
            })
        );
    }

    #[test]
    fn test_invalid_timestamp() {
        let post = PostRecord {
            created_utc: Some(f64::NAN),
            ..sample_post()
        };
        assert!(matches!(
            extract("rust", &post),
            Err(ExtractionError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_subreddit_taken_from_record() {
        let json = r#"{
            "id": "1abcde", "title": "t", "score": 1, "num_comments": 0,
            "created_utc": 1700000000.0, "permalink": "/r/python/comments/1abcde/t/",
            "subreddit": "python"
        }"#;
        let record: PostRecord = serde_json::from_str(json).unwrap();

        // Requested with different casing; the record's name wins
        let row = extract("Python", &record).unwrap();
        assert_eq!(row.subreddit, "python");
    }

    #[test]
    fn test_subreddit_falls_back_to_requested_name() {
        let row = extract("Python", &sample_post()).unwrap();
        assert_eq!(row.subreddit, "Python");

        let blank = PostRecord {
            subreddit: Some(String::new()),
            ..sample_post()
        };
        assert_eq!(extract("Python", &blank).unwrap().subreddit, "Python");
    }

    #[test]
    fn test_url_falls_back_to_permalink() {
        let post = PostRecord {
            url: None,
            ..sample_post()
        };
        let row = extract("rust", &post).unwrap();
        assert_eq!(row.url, row.permalink);
    }

    #[test]
    fn test_cell_types_stable_across_authors() {
        let with_author = extract("python", &sample_post()).unwrap().cells();
        let without_author = extract(
            "python",
            &PostRecord {
                author: None,
                ..sample_post()
            },
        )
        .unwrap()
        .cells();

        assert_eq!(with_author.len(), COLUMNS.len());
        for (left, right) in with_author.iter().zip(without_author.iter()) {
            assert_eq!(std::mem::discriminant(left), std::mem::discriminant(right));
        }
        assert_eq!(without_author[3], Cell::Text(DELETED_AUTHOR.to_string()));
    }
}
