use std::collections::HashMap;
use std::sync::Arc;
use todoc_api::endpoints::community::{Category, Comment, LikeStatus, Post, PostChanges};
use todoc_api::endpoints::{CommentId, KidId, PostId};
use todoc_api::{Gateway, Request};

use super::call;
use crate::cache::ListCache;
use crate::error::AppError;

/// Position in the paged post listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl PageInfo {
    pub fn has_more(&self) -> bool {
        u64::from(self.page) * u64::from(self.limit) < self.total
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub category: Category,
    pub title: String,
    pub content: String,
    pub kid_id: Option<KidId>,
    pub image_url: Option<String>,
}

pub struct CommunityService {
    gateway: Arc<Gateway>,
    posts: ListCache<Post>,
    comments: HashMap<PostId, ListCache<Comment>>,
    page: Option<PageInfo>,
}

impl CommunityService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            posts: ListCache::new(),
            comments: HashMap::new(),
            page: None,
        }
    }

    pub fn posts(&self) -> &ListCache<Post> {
        &self.posts
    }

    pub fn comments(&self, post_id: PostId) -> Option<&ListCache<Comment>> {
        self.comments.get(&post_id)
    }

    pub fn page(&self) -> Option<PageInfo> {
        self.page
    }

    /// Load one page; page 1 replaces the cache, later pages extend it
    pub async fn load(
        &mut self,
        category: Option<Category>,
        page: u32,
        limit: Option<u32>,
    ) -> Result<&[Post], AppError> {
        tracing::info!("Loading posts (category={:?}, page={})", category, page);

        let mut request = Request::community().posts().page(page);
        if let Some(category) = category {
            request = request.category(category);
        }
        if let Some(limit) = limit {
            request = request.limit(limit);
        }

        let list = call(&self.gateway, request).await?;
        self.page = Some(PageInfo {
            page: list.page,
            limit: list.limit,
            total: list.total,
        });

        if page <= 1 {
            self.posts.replace_all(list.posts);
        } else {
            for post in list.posts {
                self.posts.apply_created(post);
            }
        }
        Ok(self.posts.items())
    }

    pub async fn create(&mut self, new_post: NewPost) -> Result<Post, AppError> {
        let mut request =
            Request::community().create_post(new_post.category, new_post.title, new_post.content);
        if let Some(kid_id) = new_post.kid_id {
            request = request.kid_id(kid_id);
        }
        if let Some(image_url) = new_post.image_url {
            request = request.image_url(image_url);
        }

        let post = call(&self.gateway, request).await?;
        tracing::info!("Created post {}", post.id);
        self.posts.apply_created(post.clone());
        Ok(post)
    }

    pub async fn get(&mut self, post_id: PostId) -> Result<Post, AppError> {
        let post = call(&self.gateway, Request::community().post(post_id)).await?;
        self.posts.apply_created(post.clone());
        Ok(post)
    }

    pub async fn update(&mut self, post_id: PostId, changes: PostChanges) -> Result<Post, AppError> {
        let mut request = Request::community().update_post(post_id);
        if let Some(category) = changes.category {
            request = request.category(category);
        }
        if let Some(title) = changes.title {
            request = request.title(title);
        }
        if let Some(content) = changes.content {
            request = request.content(content);
        }
        if let Some(image_url) = changes.image_url {
            request = request.image_url(image_url);
        }

        let post = call(&self.gateway, request).await?;
        self.posts.apply_updated(post.clone());
        Ok(post)
    }

    pub async fn delete(&mut self, post_id: PostId) -> Result<(), AppError> {
        call(&self.gateway, Request::community().delete_post(post_id)).await?;
        self.posts.apply_deleted(post_id);
        self.comments.remove(&post_id);
        Ok(())
    }

    pub async fn toggle_like(&mut self, post_id: PostId) -> Result<LikeStatus, AppError> {
        let status = call(&self.gateway, Request::community().toggle_like(post_id)).await?;
        self.posts.modify(post_id, |post| {
            post.is_liked = status.liked;
            post.likes_count = status.likes_count;
        });
        Ok(status)
    }

    pub async fn load_comments(&mut self, post_id: PostId) -> Result<&[Comment], AppError> {
        let comments = call(&self.gateway, Request::community().comments(post_id)).await?;
        let cache = self.comments.entry(post_id).or_default();
        cache.replace_all(comments);
        Ok(cache.items())
    }

    pub async fn add_comment(&mut self, post_id: PostId, content: &str) -> Result<Comment, AppError> {
        let request = Request::community().create_comment(post_id, content.trim());
        let comment = call(&self.gateway, request).await?;

        self.comments
            .entry(post_id)
            .or_default()
            .apply_created(comment.clone());
        self.posts
            .modify(post_id, |post| post.comment_count += 1);
        Ok(comment)
    }

    pub async fn delete_comment(&mut self, comment_id: CommentId) -> Result<(), AppError> {
        call(&self.gateway, Request::community().delete_comment(comment_id)).await?;

        let owner = self.comments.iter_mut().find_map(|(post_id, cache)| {
            cache.apply_deleted(comment_id).map(|_| *post_id)
        });
        if let Some(post_id) = owner {
            self.posts.modify(post_id, |post| {
                post.comment_count = post.comment_count.saturating_sub(1)
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use todoc_api::testing::TestGateway;

    fn post_json(id: i64, created_at: &str) -> serde_json::Value {
        json!({
            "id": id, "user_id": 1, "kid_id": null, "category": "general",
            "title": format!("post {}", id), "content": "body", "image_url": null,
            "created_at": created_at, "updated_at": null,
            "likes_count": 0, "comment_count": 0, "is_liked": false
        })
    }

    fn page_json(posts: Vec<serde_json::Value>, page: u32, total: u64) -> serde_json::Value {
        json!({"posts": posts, "total": total, "page": page, "limit": 2})
    }

    #[tokio::test]
    async fn test_later_pages_extend_the_cache() {
        let t = TestGateway::new();
        t.transport
            .respond_json(
                200,
                page_json(
                    vec![
                        post_json(4, "2024-05-04T00:00:00"),
                        post_json(3, "2024-05-03T00:00:00"),
                    ],
                    1,
                    3,
                ),
            )
            .respond_json(200, page_json(vec![post_json(1, "2024-05-01T00:00:00")], 2, 3));
        let mut service = CommunityService::new(Arc::new(t.gateway));

        service.load(None, 1, Some(2)).await.unwrap();
        assert!(service.page().unwrap().has_more());

        service.load(None, 2, Some(2)).await.unwrap();
        assert!(!service.page().unwrap().has_more());

        let ids: Vec<i64> = service.posts().items().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 3, 1]);
    }

    #[tokio::test]
    async fn test_toggle_like_updates_cached_post() {
        let t = TestGateway::new();
        t.transport
            .respond_json(200, page_json(vec![post_json(4, "2024-05-04T00:00:00")], 1, 1))
            .respond_json(200, json!({"liked": true, "likes_count": 1}));
        let mut service = CommunityService::new(Arc::new(t.gateway));

        service.load(None, 1, None).await.unwrap();
        let status = service.toggle_like(4).await.unwrap();

        assert!(status.liked);
        let post = service.posts().get(4).unwrap();
        assert!(post.is_liked);
        assert_eq!(post.likes_count, 1);
    }

    #[tokio::test]
    async fn test_comment_lifecycle_tracks_count() {
        let t = TestGateway::new();
        t.transport
            .respond_json(200, page_json(vec![post_json(4, "2024-05-04T00:00:00")], 1, 1))
            .respond_json(
                201,
                json!({"id": 10, "post_id": 4, "content": "congrats",
                       "created_at": "2024-05-04T01:00:00",
                       "author": {"id": 2, "username": "dad"}}),
            )
            .respond(204, "");
        let mut service = CommunityService::new(Arc::new(t.gateway));

        service.load(None, 1, None).await.unwrap();
        service.add_comment(4, "congrats").await.unwrap();
        assert_eq!(service.posts().get(4).unwrap().comment_count, 1);
        assert_eq!(service.comments(4).unwrap().len(), 1);

        service.delete_comment(10).await.unwrap();
        assert_eq!(service.posts().get(4).unwrap().comment_count, 0);
        assert!(service.comments(4).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_title_is_rejected_locally() {
        let t = TestGateway::new();
        let transport = t.transport.clone();
        let mut service = CommunityService::new(Arc::new(t.gateway));

        let err = service
            .create(NewPost {
                category: Category::Recipe,
                title: "t".repeat(201),
                content: "body".into(),
                kid_id: None,
                image_url: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(transport.request_count(), 0);
    }
}
