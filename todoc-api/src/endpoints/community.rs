use super::{API_PREFIX, CommentId, KidId, PostId, UserId, timestamp};
use crate::error::ValidationError;
use crate::macros::setters;
use crate::request::{EmptyResponse, Method, Request, RequestData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::str::FromStr;

const TITLE_MAX_CHARS: usize = 200;
const PAGE_LIMIT_MAX: u32 = 50;

// Common

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    General,
    Marketplace,
    Recipe,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::General => f.write_str("general"),
            Self::Marketplace => f.write_str("marketplace"),
            Self::Recipe => f.write_str("recipe"),
        }
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "marketplace" => Ok(Self::Marketplace),
            "recipe" => Ok(Self::Recipe),
            other => Err(ValidationError::Invalid(format!(
                "unknown category '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    #[serde(default)]
    pub kid_id: Option<KidId>,
    pub category: Category,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub kid_name: Option<String>,
    #[serde(default)]
    pub kid_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostList {
    pub posts: Vec<Post>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl PostList {
    pub fn has_more(&self) -> bool {
        u64::from(self.page) * u64::from(self.limit) < self.total
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
    pub likes_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub content: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub author: Author,
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    ValidationError::require("title", title)?;
    ValidationError::max_chars("title", title, TITLE_MAX_CHARS)
}

// Requests

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListPosts {
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

impl ListPosts {
    pub fn new() -> Self {
        Self::default()
    }

    setters!(
        opt category: Category,
        opt page: u32,
        opt limit: u32,
    );
}

impl Request for ListPosts {
    type Data = Self;
    type Response = PostList;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/community/posts", API_PREFIX).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.page == Some(0) {
            return Err(ValidationError::Invalid("page starts at 1".into()));
        }
        if let Some(limit) = self.limit {
            ValidationError::within("limit", f64::from(limit), 1.0, f64::from(PAGE_LIMIT_MAX))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePost {
    #[serde(skip_serializing_if = "Option::is_none")]
    kid_id: Option<KidId>,
    category: Category,
    title: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

impl CreatePost {
    pub fn new(category: Category, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kid_id: None,
            category,
            title: title.into(),
            content: content.into(),
            image_url: None,
        }
    }

    setters!(
        opt kid_id: KidId,
        opt image_url: String,
    );
}

impl Request for CreatePost {
    type Data = Self;
    type Response = Post;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/community/posts", API_PREFIX).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Json(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        ValidationError::require("content", &self.content)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetPost {
    #[serde(skip)]
    post_id: PostId,
}

impl GetPost {
    pub fn new(post_id: PostId) -> Self {
        Self { post_id }
    }
}

impl Request for GetPost {
    type Data = ();
    type Response = Post;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/community/posts/{}", API_PREFIX, self.post_id).into()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PostChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatePost {
    #[serde(skip)]
    post_id: PostId,
    #[serde(flatten)]
    changes: PostChanges,
}

impl UpdatePost {
    pub fn new(post_id: PostId) -> Self {
        Self {
            post_id,
            changes: PostChanges::default(),
        }
    }

    setters!(
        opt changes.category: Category,
        opt changes.title: String,
        opt changes.content: String,
        opt changes.image_url: String,
    );
}

impl Request for UpdatePost {
    type Data = Self;
    type Response = Post;
    const METHOD: Method = Method::PUT;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/community/posts/{}", API_PREFIX, self.post_id).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Json(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.changes.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.changes.content {
            ValidationError::require("content", content)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletePost {
    #[serde(skip)]
    post_id: PostId,
}

impl DeletePost {
    pub fn new(post_id: PostId) -> Self {
        Self { post_id }
    }
}

impl Request for DeletePost {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/community/posts/{}", API_PREFIX, self.post_id).into()
    }
}

/// Like the post, or remove the like if already present
#[derive(Debug, Clone, Serialize)]
pub struct ToggleLike {
    #[serde(skip)]
    post_id: PostId,
}

impl ToggleLike {
    pub fn new(post_id: PostId) -> Self {
        Self { post_id }
    }
}

impl Request for ToggleLike {
    type Data = ();
    type Response = LikeStatus;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/community/posts/{}/like", API_PREFIX, self.post_id).into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListComments {
    #[serde(skip)]
    post_id: PostId,
}

impl ListComments {
    pub fn new(post_id: PostId) -> Self {
        Self { post_id }
    }
}

impl Request for ListComments {
    type Data = ();
    type Response = Vec<Comment>;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/community/posts/{}/comments", API_PREFIX, self.post_id).into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateComment {
    #[serde(skip)]
    post_id: PostId,
    content: String,
}

impl CreateComment {
    pub fn new(post_id: PostId, content: impl Into<String>) -> Self {
        Self {
            post_id,
            content: content.into(),
        }
    }
}

impl Request for CreateComment {
    type Data = Self;
    type Response = Comment;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/community/posts/{}/comments", API_PREFIX, self.post_id).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Json(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::require("content", &self.content)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteComment {
    #[serde(skip)]
    comment_id: CommentId,
}

impl DeleteComment {
    pub fn new(comment_id: CommentId) -> Self {
        Self { comment_id }
    }
}

impl Request for DeleteComment {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/community/comments/{}", API_PREFIX, self.comment_id).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::query_pairs;
    use serde_json::json;

    #[test]
    fn test_list_posts_query() {
        let request = ListPosts::new().category(Category::Recipe).page(2u32);
        let pairs = query_pairs(&request).unwrap();

        assert_eq!(
            pairs,
            vec![
                ("category".to_string(), "recipe".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_list_posts_bounds() {
        assert!(ListPosts::new().page(0u32).validate().is_err());
        assert!(ListPosts::new().limit(51u32).validate().is_err());
        assert!(ListPosts::new().page(1u32).limit(50u32).validate().is_ok());
    }

    #[test]
    fn test_create_post_title_bounds() {
        assert!(CreatePost::new(Category::General, "", "body").validate().is_err());
        assert!(
            CreatePost::new(Category::General, "t".repeat(201), "body")
                .validate()
                .is_err()
        );
        assert!(
            CreatePost::new(Category::General, "t".repeat(200), "body")
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_post_decodes_minimal_shape() {
        let post: Post = serde_json::from_value(json!({
            "id": 1,
            "user_id": 2,
            "kid_id": null,
            "category": "marketplace",
            "title": "Stroller",
            "content": "Barely used",
            "image_url": null,
            "created_at": "2024-05-01T09:00:00",
            "updated_at": null
        }))
        .unwrap();

        assert_eq!(post.category, Category::Marketplace);
        assert_eq!(post.likes_count, 0);
        assert!(!post.is_liked);
        assert_eq!(post.author, None);
    }

    #[test]
    fn test_post_list_has_more() {
        let list = PostList {
            posts: Vec::new(),
            total: 45,
            page: 2,
            limit: 20,
        };
        assert!(list.has_more());
        assert!(!PostList { page: 3, ..list }.has_more());
    }

    #[test]
    fn test_comment_endpoints() {
        assert_eq!(
            CreateComment::new(4, "nice").endpoint(),
            "/api/v1/community/posts/4/comments"
        );
        assert_eq!(DeleteComment::new(9).endpoint(), "/api/v1/community/comments/9");
    }
}
