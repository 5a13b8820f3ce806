use std::cmp::Reverse;

use async_trait::async_trait;
use uuid::Uuid;

use quill_core::domain::{Category, Comment, Post, PostQuery, PostSort, User};
use quill_core::error::RepoError;
use quill_core::ports::{
    CategoryRepository, CommentRepository, PostPage, PostRepository, UserRepository,
};

use super::base::{InMemoryRepository, Record};

pub type InMemoryUserRepository = InMemoryRepository<User>;
pub type InMemoryPostRepository = InMemoryRepository<Post>;
pub type InMemoryCategoryRepository = InMemoryRepository<Category>;
pub type InMemoryCommentRepository = InMemoryRepository<Comment>;

impl Record for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("email", self.email.clone())]
    }
}

impl Record for Post {
    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("slug", self.slug.clone())]
    }

    fn keep_on_update(&mut self, stored: &Self) {
        self.views = stored.views;
        self.likes = stored.likes;
    }
}

impl Record for Category {
    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone()), ("slug", self.slug.clone())]
    }
}

impl Record for Comment {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let rows = self.rows.read().await;
        Ok(rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let rows = self.rows.read().await;
        Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(&self, query: &PostQuery) -> Result<PostPage, RepoError> {
        let rows = self.rows.read().await;
        let mut posts: Vec<Post> = rows.values().filter(|p| query.matches(p)).cloned().collect();

        match query.sort {
            PostSort::Newest => posts.sort_by_key(|p| Reverse(p.created_at)),
            PostSort::Oldest => posts.sort_by_key(|p| p.created_at),
            PostSort::Popular | PostSort::Views => posts.sort_by_key(|p| Reverse(p.views)),
        }

        let total = posts.len() as u64;
        let posts = posts
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();

        Ok(PostPage { posts, total })
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(&id).map(|post| {
            post.views += 1;
            post.clone()
        }))
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let rows = self.rows.read().await;
        let mut categories: Vec<Category> = rows.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Category>, RepoError> {
        let rows = self.rows.read().await;
        Ok(rows.values().find(|c| c.name == name).cloned())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let rows = self.rows.read().await;
        let mut comments: Vec<Comment> = rows
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| Reverse(c.created_at));
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use quill_core::domain::{NewCategory, NewComment, NewPost, PostStatus};
    use quill_core::ports::BaseRepository;

    use super::*;

    fn post(title: &str, status: PostStatus) -> Post {
        Post::new(
            Uuid::new_v4(),
            NewPost {
                title: title.to_string(),
                content: "body".to_string(),
                category: "Technology".to_string(),
                status,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let repo = InMemoryUserRepository::new();
        let ada = User::new("Ada", "ada@example.com", "h".into()).unwrap();
        let copy = User::new("Other Ada", "ada@example.com", "h".into()).unwrap();

        repo.create(ada.clone()).await.unwrap();
        let err = repo.create(copy).await.unwrap_err();

        assert!(matches!(err, RepoError::Constraint(_)));
        assert_eq!(repo.count().await, 1);
        assert_eq!(
            repo.find_by_email("ada@example.com").await.unwrap().unwrap().id,
            ada.id
        );
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_rows() {
        let repo = InMemoryPostRepository::new();
        let p = post("Ghost", PostStatus::Draft);

        assert!(matches!(repo.update(p.clone()).await, Err(RepoError::NotFound)));
        assert!(matches!(repo.delete(p.id).await, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_filters_sorts_and_pages() {
        let repo = InMemoryPostRepository::new();
        let mut older = post("Older", PostStatus::Published);
        older.created_at = Utc::now() - Duration::days(2);
        older.views = 50;
        let newer = post("Newer", PostStatus::Published);
        let draft = post("Draft", PostStatus::Draft);

        for p in [older.clone(), newer.clone(), draft] {
            repo.create(p).await.unwrap();
        }

        let page = repo.list(&PostQuery::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.posts[0].id, newer.id);

        let page = repo
            .list(&PostQuery {
                sort: PostSort::Oldest,
                limit: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].id, older.id);

        let page = repo
            .list(&PostQuery {
                sort: PostSort::Popular,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.posts[0].id, older.id);
    }

    #[tokio::test]
    async fn test_increment_views() {
        let repo = InMemoryPostRepository::new();
        let p = repo.create(post("Counted", PostStatus::Published)).await.unwrap();

        repo.increment_views(p.id).await.unwrap();
        let after = repo.increment_views(p.id).await.unwrap().unwrap();

        assert_eq!(after.views, 2);
        assert!(repo.increment_views(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_views_counted_meanwhile() {
        let repo = InMemoryPostRepository::new();
        let p = repo.create(post("Counted", PostStatus::Published)).await.unwrap();

        let mut stale = repo.find_by_id(p.id).await.unwrap().unwrap();
        repo.increment_views(p.id).await.unwrap();
        stale.title = "Renamed".to_string();

        let saved = repo.update(stale).await.unwrap();
        assert_eq!(saved.views, 1);
        assert_eq!(saved.title, "Renamed");
    }

    #[tokio::test]
    async fn test_categories_sorted_by_name() {
        let repo = InMemoryCategoryRepository::new();
        for name in ["Travel", "Food", "Business"] {
            repo.create(
                Category::new(NewCategory {
                    name: name.into(),
                    ..Default::default()
                })
                .unwrap(),
            )
            .await
            .unwrap();
        }

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Business", "Food", "Travel"]);
        assert!(repo.find_by_name("Food").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_comments_newest_first() {
        let repo = InMemoryCommentRepository::new();
        let post_id = Uuid::new_v4();
        let mut first = Comment::new(
            Uuid::new_v4(),
            NewComment {
                content: "first".into(),
                post_id,
                parent_id: None,
            },
        )
        .unwrap();
        first.created_at = Utc::now() - Duration::minutes(5);
        let second = Comment::new(
            Uuid::new_v4(),
            NewComment {
                content: "second".into(),
                post_id,
                parent_id: Some(first.id),
            },
        )
        .unwrap();

        repo.create(first).await.unwrap();
        repo.create(second).await.unwrap();

        let listed = repo.list_by_post(post_id).await.unwrap();
        assert_eq!(listed[0].content, "second");
        assert_eq!(listed[1].content, "first");
        assert!(repo.list_by_post(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
