//! Comment storage.
//!
//! Every write that touches more than one row (create, delete, like toggle)
//! runs in a single transaction together with the counter it maintains.

use std::collections::{HashMap, HashSet};

use sqlx::{QueryBuilder, Sqlite};

use super::comment::{Comment, CommentAuthor, CommentPost, CommentSort, LikeToggle, NewComment};
use super::visibility::CommentScope;
use crate::datetime::now_timestamp;
use crate::db::DbPool;
use crate::{FolioError, Result};

const COMMENT_SELECT: &str = "SELECT c.id, c.content, c.post_id, c.parent_comment_id, c.like_count,
        c.is_approved, c.is_spam, c.ip_address, c.user_agent, c.created_at, c.updated_at,
        u.id AS author_id, u.username AS author_username, u.full_name AS author_full_name,
        u.avatar AS author_avatar,
        p.title AS post_title, p.slug AS post_slug
    FROM comments c
    JOIN users u ON u.id = c.author_id
    JOIN posts p ON p.id = c.post_id";

/// Repository for comments and likes.
pub struct CommentRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> CommentRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a comment and bump the post's comment counter.
    ///
    /// Returns the new comment's id.
    pub async fn create(&self, comment: &NewComment) -> Result<i64> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO comments (content, author_id, post_id, parent_comment_id, is_approved,
                                   ip_address, user_agent, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&comment.content)
        .bind(comment.author_id)
        .bind(comment.post_id)
        .bind(comment.parent_comment_id)
        .bind(comment.is_approved)
        .bind(&comment.ip_address)
        .bind(&comment.user_agent)
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;

        sqlx::query("UPDATE posts SET comment_count = comment_count + 1 WHERE id = ?")
            .bind(comment.post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;

        tx.commit().await?;
        Ok(id)
    }

    /// Get a comment with its likes. Replies are not attached; see
    /// [`Self::get_with_replies`].
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(&format!("{COMMENT_SELECT} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut likes = self.likes_for(&[row.id]).await?;
        let mut comment = row.into_comment(false);
        comment.likes = likes.remove(&comment.id).unwrap_or_default();
        Ok(Some(comment))
    }

    /// Get a comment with its likes and the full tree of replies visible
    /// under `scope`.
    pub async fn get_with_replies(&self, id: i64, scope: CommentScope) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(&format!("{COMMENT_SELECT} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.assemble(vec![row], false, scope).await?.pop())
    }

    /// Replace a comment's content. Moderation flags are left alone.
    pub async fn update_content(&self, id: i64, content: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(now_timestamp())
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a comment and its direct replies.
    ///
    /// The post's counter goes down by one regardless of how many replies
    /// were removed. Replies of replies are left in place. Returns the number
    /// of rows removed.
    pub async fn delete(&self, comment: &Comment) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let replies = sqlx::query("DELETE FROM comments WHERE parent_comment_id = ?")
            .bind(comment.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;

        let own = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;

        sqlx::query("UPDATE posts SET comment_count = MAX(comment_count - 1, 0) WHERE id = ?")
            .bind(comment.post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;

        tx.commit().await?;
        Ok(replies.rows_affected() + own.rows_affected())
    }

    /// Add or remove `user_id` from a comment's likes and recompute the
    /// like counter from the set.
    pub async fn toggle_like(&self, comment_id: i64, user_id: i64) -> Result<LikeToggle> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM comment_likes WHERE comment_id = ? AND user_id = ?")
            .bind(comment_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?
            .rows_affected()
            > 0;

        if !removed {
            sqlx::query(
                "INSERT INTO comment_likes (comment_id, user_id, created_at) VALUES (?, ?, ?)",
            )
            .bind(comment_id)
            .bind(user_id)
            .bind(now_timestamp())
            .execute(&mut *tx)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        }

        let like_count: i64 = sqlx::query_scalar(
            "UPDATE comments
             SET like_count = (SELECT COUNT(*) FROM comment_likes WHERE comment_id = ?1)
             WHERE id = ?1 RETURNING like_count",
        )
        .bind(comment_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;

        tx.commit().await?;
        Ok(LikeToggle {
            like_count,
            is_liked: !removed,
        })
    }

    /// Set moderation flags. Returns false if the comment does not exist.
    pub async fn moderate(&self, id: i64, is_approved: bool, is_spam: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE comments SET is_approved = ?, is_spam = ?, updated_at = ? WHERE id = ?",
        )
        .bind(is_approved)
        .bind(is_spam)
        .bind(now_timestamp())
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Top-level comments of a post with their visible replies attached at
    /// every depth.
    pub async fn list_threads(
        &self,
        post_id: i64,
        scope: CommentScope,
        sort: CommentSort,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Comment>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(COMMENT_SELECT);
        query.push(" WHERE c.post_id = ");
        query.push_bind(post_id);
        query.push(" AND c.parent_comment_id IS NULL");
        scope.push_top_level(&mut query, "c");
        query.push(sort.order_clause());
        query.push(" LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query
            .build_query_as::<CommentRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        self.assemble(rows, false, scope).await
    }

    /// Number of visible top-level comments on a post.
    pub async fn count_threads(&self, post_id: i64, scope: CommentScope) -> Result<i64> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM comments c WHERE c.post_id = ");
        query.push_bind(post_id);
        query.push(" AND c.parent_comment_id IS NULL");
        scope.push_top_level(&mut query, "c");

        query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))
    }

    /// One author's comments across all posts, newest first.
    pub async fn list_by_author(
        &self,
        author_id: i64,
        scope: CommentScope,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.author_id = ?
             ORDER BY c.created_at DESC, c.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;
        self.assemble(rows, true, scope).await
    }

    pub async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))
    }

    /// Comments awaiting moderation (not approved, not spam), newest first.
    pub async fn list_pending(
        &self,
        scope: CommentScope,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.is_approved = 0 AND c.is_spam = 0
             ORDER BY c.created_at DESC, c.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FolioError::Database(e.to_string()))?;
        self.assemble(rows, true, scope).await
    }

    pub async fn count_pending(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE is_approved = 0 AND is_spam = 0")
            .fetch_one(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))
    }

    async fn replies_for(&self, parent_ids: &[i64], scope: CommentScope) -> Result<Vec<CommentRow>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(COMMENT_SELECT);
        query.push(" WHERE c.parent_comment_id IN (");
        let mut ids = query.separated(", ");
        for id in parent_ids {
            ids.push_bind(*id);
        }
        query.push(")");
        scope.push_replies(&mut query, "c");
        query.push(" ORDER BY c.created_at ASC, c.id ASC");

        query
            .build_query_as::<CommentRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))
    }

    async fn likes_for(&self, comment_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>> {
        let mut likes: HashMap<i64, Vec<i64>> = HashMap::new();
        if comment_ids.is_empty() {
            return Ok(likes);
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT comment_id, user_id FROM comment_likes WHERE comment_id IN (");
        let mut ids = query.separated(", ");
        for id in comment_ids {
            ids.push_bind(*id);
        }
        query.push(") ORDER BY created_at, user_id");

        let rows = query
            .build_query_as::<(i64, i64)>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| FolioError::Database(e.to_string()))?;
        for (comment_id, user_id) in rows {
            likes.entry(comment_id).or_default().push(user_id);
        }
        Ok(likes)
    }

    /// Turn fetched rows into comments with likes and nested replies.
    ///
    /// Replies are loaded one depth at a time until a level comes back
    /// empty. A row can appear both at the top and inside another row's
    /// replies (the pending queue holds replies too); it is expanded once.
    async fn assemble(
        &self,
        rows: Vec<CommentRow>,
        with_post: bool,
        scope: CommentScope,
    ) -> Result<Vec<Comment>> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let mut expanded: HashSet<i64> = HashSet::new();
        let mut placed: HashSet<i64> = HashSet::new();
        let mut by_parent: HashMap<i64, Vec<Comment>> = HashMap::new();
        let mut frontier: Vec<i64> = rows.iter().map(|r| r.id).collect();

        while !frontier.is_empty() {
            expanded.extend(frontier.iter().copied());
            let level = self.replies_for(&frontier, scope).await?;
            frontier = Vec::new();
            for row in level {
                if !placed.insert(row.id) {
                    continue;
                }
                if !expanded.contains(&row.id) {
                    frontier.push(row.id);
                }
                let parent = row.parent_comment_id.unwrap_or_default();
                by_parent
                    .entry(parent)
                    .or_default()
                    .push(row.into_comment(false));
            }
        }

        let mut ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        ids.extend(placed.iter().copied());
        let likes = self.likes_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut comment = row.into_comment(with_post);
                attach(&mut comment, &by_parent, &likes);
                comment
            })
            .collect())
    }
}

fn attach(
    comment: &mut Comment,
    by_parent: &HashMap<i64, Vec<Comment>>,
    likes: &HashMap<i64, Vec<i64>>,
) {
    comment.likes = likes.get(&comment.id).cloned().unwrap_or_default();
    comment.replies = by_parent.get(&comment.id).cloned().unwrap_or_default();
    for reply in &mut comment.replies {
        attach(reply, by_parent, likes);
    }
}

/// Internal struct for mapping joined comment rows.
#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    content: String,
    post_id: i64,
    parent_comment_id: Option<i64>,
    like_count: i64,
    is_approved: bool,
    is_spam: bool,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: String,
    updated_at: String,
    author_id: i64,
    author_username: String,
    author_full_name: String,
    author_avatar: String,
    post_title: String,
    post_slug: String,
}

impl CommentRow {
    fn into_comment(self, with_post: bool) -> Comment {
        let post = with_post.then(|| CommentPost {
            id: self.post_id,
            title: self.post_title,
            slug: self.post_slug,
        });
        Comment {
            id: self.id,
            content: self.content,
            author: CommentAuthor {
                id: self.author_id,
                username: self.author_username,
                full_name: self.author_full_name,
                avatar: self.author_avatar,
            },
            post_id: self.post_id,
            post,
            parent_comment_id: self.parent_comment_id,
            replies: vec![],
            likes: vec![],
            like_count: self.like_count,
            is_approved: self.is_approved,
            is_spam: self.is_spam,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::category::{CategoryRepository, NewCategory};
    use crate::blog::post::{NewPost, PostStatus};
    use crate::blog::post_repository::PostRepository;
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    struct Fixture {
        db: Database,
        alice: i64,
        bob: i64,
        post: i64,
    }

    async fn setup() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        let alice = users
            .create(&NewUser::new("alice", "a@x.com", "hash", "Alice"))
            .await
            .unwrap()
            .id;
        let bob = users
            .create(&NewUser::new("bob", "b@x.com", "hash", "Bob"))
            .await
            .unwrap()
            .id;
        let category = CategoryRepository::new(db.pool())
            .create(&NewCategory {
                name: "Tech".to_string(),
                slug: "tech".to_string(),
                description: "Tech".to_string(),
            })
            .await
            .unwrap()
            .id;
        let post = PostRepository::new(db.pool())
            .create(&NewPost {
                title: "Hello".to_string(),
                slug: "hello".to_string(),
                content: "Hello world content".to_string(),
                excerpt: String::new(),
                featured_image: String::new(),
                author_id: alice,
                category_id: category,
                tags: vec![],
                status: PostStatus::Published,
                is_featured: false,
                published_at: Some(now_timestamp()),
                seo_title: String::new(),
                seo_description: String::new(),
            })
            .await
            .unwrap()
            .id;
        Fixture {
            db,
            alice,
            bob,
            post,
        }
    }

    fn comment(f: &Fixture, author: i64, parent: Option<i64>, approved: bool) -> NewComment {
        NewComment {
            content: "Nice post".to_string(),
            author_id: author,
            post_id: f.post,
            parent_comment_id: parent,
            is_approved: approved,
            ip_address: Some("127.0.0.1".to_string()),
            user_agent: None,
        }
    }

    async fn comment_count(f: &Fixture) -> i64 {
        PostRepository::new(f.db.pool())
            .get_by_id(f.post)
            .await
            .unwrap()
            .unwrap()
            .comment_count
    }

    #[tokio::test]
    async fn test_create_increments_counter() {
        let f = setup().await;
        let repo = CommentRepository::new(f.db.pool());

        let id = repo.create(&comment(&f, f.alice, None, false)).await.unwrap();
        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.author.username, "alice");
        assert!(!stored.is_approved);
        assert!(stored.post.is_none());
        assert_eq!(comment_count(&f).await, 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_one_level_and_decrements_once() {
        let f = setup().await;
        let repo = CommentRepository::new(f.db.pool());

        let c1 = repo.create(&comment(&f, f.alice, None, false)).await.unwrap();
        let c2 = repo.create(&comment(&f, f.bob, Some(c1), true)).await.unwrap();
        let c3 = repo.create(&comment(&f, f.bob, Some(c2), true)).await.unwrap();
        assert_eq!(comment_count(&f).await, 3);

        let target = repo.get_by_id(c1).await.unwrap().unwrap();
        assert_eq!(repo.delete(&target).await.unwrap(), 2);

        assert!(repo.get_by_id(c1).await.unwrap().is_none());
        assert!(repo.get_by_id(c2).await.unwrap().is_none());
        // grand-reply keeps its dangling parent
        assert_eq!(
            repo.get_by_id(c3).await.unwrap().unwrap().parent_comment_id,
            Some(c2)
        );
        assert_eq!(comment_count(&f).await, 2);
    }

    #[tokio::test]
    async fn test_toggle_like() {
        let f = setup().await;
        let repo = CommentRepository::new(f.db.pool());
        let id = repo.create(&comment(&f, f.alice, None, true)).await.unwrap();

        let liked = repo.toggle_like(id, f.bob).await.unwrap();
        assert_eq!(liked, LikeToggle { like_count: 1, is_liked: true });
        let liked = repo.toggle_like(id, f.alice).await.unwrap();
        assert_eq!(liked.like_count, 2);

        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.likes.len() as i64, stored.like_count);

        let unliked = repo.toggle_like(id, f.bob).await.unwrap();
        assert_eq!(unliked, LikeToggle { like_count: 1, is_liked: false });
        assert_eq!(repo.get_by_id(id).await.unwrap().unwrap().likes, vec![f.alice]);
    }

    #[tokio::test]
    async fn test_list_threads_scopes() {
        let f = setup().await;
        let repo = CommentRepository::new(f.db.pool());

        let top = repo.create(&comment(&f, f.alice, None, false)).await.unwrap();
        let spam = repo.create(&comment(&f, f.bob, None, false)).await.unwrap();
        repo.moderate(spam, false, true).await.unwrap();
        let approved_reply = repo.create(&comment(&f, f.bob, Some(top), true)).await.unwrap();
        let pending_reply = repo.create(&comment(&f, f.bob, Some(top), false)).await.unwrap();

        let anonymous = CommentScope::Public { viewer: None };
        let threads = repo
            .list_threads(f.post, anonymous, CommentSort::Newest, 0, 10)
            .await
            .unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].id, top);
        let reply_ids: Vec<_> = threads[0].replies.iter().map(|r| r.id).collect();
        assert_eq!(reply_ids, vec![approved_reply]);
        assert_eq!(repo.count_threads(f.post, anonymous).await.unwrap(), 1);

        // bob sees their own spam and pending reply
        let bob = CommentScope::Public { viewer: Some(f.bob) };
        let threads = repo
            .list_threads(f.post, bob, CommentSort::Oldest, 0, 10)
            .await
            .unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].id, top);
        let reply_ids: Vec<_> = threads[0].replies.iter().map(|r| r.id).collect();
        assert_eq!(reply_ids, vec![approved_reply, pending_reply]);

        let threads = repo
            .list_threads(f.post, CommentScope::Everything, CommentSort::Newest, 0, 10)
            .await
            .unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(repo.count_threads(f.post, CommentScope::Everything).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_most_liked_sort() {
        let f = setup().await;
        let repo = CommentRepository::new(f.db.pool());
        let first = repo.create(&comment(&f, f.alice, None, true)).await.unwrap();
        let second = repo.create(&comment(&f, f.alice, None, true)).await.unwrap();
        repo.toggle_like(first, f.bob).await.unwrap();

        let threads = repo
            .list_threads(f.post, CommentScope::Everything, CommentSort::MostLiked, 0, 10)
            .await
            .unwrap();
        let ids: Vec<_> = threads.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_pending_and_author_listings() {
        let f = setup().await;
        let repo = CommentRepository::new(f.db.pool());
        let pending = repo.create(&comment(&f, f.bob, None, false)).await.unwrap();
        repo.create(&comment(&f, f.alice, None, true)).await.unwrap();

        let listed = repo.list_pending(CommentScope::Everything, 0, 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, pending);
        assert_eq!(listed[0].post.as_ref().unwrap().slug, "hello");
        assert_eq!(repo.count_pending().await.unwrap(), 1);

        repo.moderate(pending, true, false).await.unwrap();
        assert_eq!(repo.count_pending().await.unwrap(), 0);

        assert_eq!(
            repo.list_by_author(f.bob, CommentScope::Everything, 0, 10)
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(repo.count_by_author(f.alice).await.unwrap(), 1);
        assert!(!repo.moderate(9999, true, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_nested_replies_are_listed() {
        let f = setup().await;
        let repo = CommentRepository::new(f.db.pool());

        let c1 = repo.create(&comment(&f, f.alice, None, true)).await.unwrap();
        let c2 = repo.create(&comment(&f, f.bob, Some(c1), true)).await.unwrap();
        let c3 = repo.create(&comment(&f, f.alice, Some(c2), true)).await.unwrap();
        let hidden = repo.create(&comment(&f, f.bob, Some(c2), false)).await.unwrap();
        repo.toggle_like(c3, f.bob).await.unwrap();

        let threads = repo
            .list_threads(f.post, CommentScope::Everything, CommentSort::Newest, 0, 10)
            .await
            .unwrap();
        assert_eq!(threads.len(), 1);
        let c2_node = &threads[0].replies[0];
        assert_eq!(c2_node.id, c2);
        let nested: Vec<_> = c2_node.replies.iter().map(|r| r.id).collect();
        assert_eq!(nested, vec![c3, hidden]);
        assert_eq!(c2_node.replies[0].likes, vec![f.bob]);

        let anonymous = CommentScope::Public { viewer: None };
        let threads = repo
            .list_threads(f.post, anonymous, CommentSort::Newest, 0, 10)
            .await
            .unwrap();
        let nested: Vec<_> = threads[0].replies[0].replies.iter().map(|r| r.id).collect();
        assert_eq!(nested, vec![c3]);
    }

    #[tokio::test]
    async fn test_replies_attached_outside_threads() {
        let f = setup().await;
        let repo = CommentRepository::new(f.db.pool());

        let c1 = repo.create(&comment(&f, f.bob, None, false)).await.unwrap();
        let c2 = repo.create(&comment(&f, f.bob, Some(c1), false)).await.unwrap();

        let stored = repo
            .get_with_replies(c1, CommentScope::Everything)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.replies.len(), 1);
        assert_eq!(stored.replies[0].id, c2);

        // Both are pending: c2 is listed on its own and under c1
        let pending = repo.list_pending(CommentScope::Everything, 0, 10).await.unwrap();
        assert_eq!(pending.len(), 2);
        let parent = pending.iter().find(|c| c.id == c1).unwrap();
        assert_eq!(parent.replies[0].id, c2);

        let by_author = repo
            .list_by_author(f.bob, CommentScope::Everything, 0, 10)
            .await
            .unwrap();
        let parent = by_author.iter().find(|c| c.id == c1).unwrap();
        assert_eq!(parent.replies.len(), 1);
        assert!(parent.post.is_some());
        assert!(parent.replies[0].post.is_none());
    }
}
