//! What a caller is allowed to see.
//!
//! Posts: everyone sees published posts; admins see every status; authors
//! always see their own posts.
//!
//! Comments: admins see everything. Everyone else sees non-spam top-level
//! comments and approved non-spam replies, plus whatever they wrote
//! themselves.

use sqlx::{QueryBuilder, Sqlite};

use super::post::PostStatus;
use crate::auth::Caller;

/// Effective status filter for the public post listing.
///
/// Only admins may pick a status (or see all of them by picking none).
pub fn listing_status(caller: &Caller, requested: Option<PostStatus>) -> Option<PostStatus> {
    if caller.is_admin() {
        requested
    } else {
        Some(PostStatus::Published)
    }
}

/// Effective status filter for one author's posts.
///
/// The author and admins get `requested`, or `fallback` when nothing was
/// requested. Everyone else gets published posts only.
pub fn author_listing_status(
    caller: &Caller,
    author_id: i64,
    requested: Option<PostStatus>,
    fallback: Option<PostStatus>,
) -> Option<PostStatus> {
    if caller.can_manage(author_id) {
        requested.or(fallback)
    } else {
        Some(PostStatus::Published)
    }
}

/// Whether a single post, and with it its comment thread, may be shown to
/// the caller.
pub fn can_view_post(caller: &Caller, status: PostStatus, author_id: i64) -> bool {
    status == PostStatus::Published || caller.can_manage(author_id)
}

/// Comment visibility predicate for one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentScope {
    /// No restriction.
    Everything,
    /// Public view, widened by the viewer's own comments.
    Public { viewer: Option<i64> },
}

impl CommentScope {
    pub fn for_caller(caller: &Caller) -> Self {
        if caller.is_admin() {
            CommentScope::Everything
        } else {
            CommentScope::Public {
                viewer: caller.id(),
            }
        }
    }

    /// Append the predicate for top-level comments aliased `alias`.
    pub(crate) fn push_top_level(&self, query: &mut QueryBuilder<'_, Sqlite>, alias: &str) {
        if let CommentScope::Public { viewer } = *self {
            query.push(format!(" AND ({alias}.is_spam = 0"));
            push_own(query, alias, viewer);
            query.push(")");
        }
    }

    /// Append the predicate for replies aliased `alias`.
    pub(crate) fn push_replies(&self, query: &mut QueryBuilder<'_, Sqlite>, alias: &str) {
        if let CommentScope::Public { viewer } = *self {
            query.push(format!(
                " AND (({alias}.is_approved = 1 AND {alias}.is_spam = 0)"
            ));
            push_own(query, alias, viewer);
            query.push(")");
        }
    }
}

fn push_own(query: &mut QueryBuilder<'_, Sqlite>, alias: &str, viewer: Option<i64>) {
    if let Some(viewer) = viewer {
        query.push(format!(" OR {alias}.author_id = "));
        query.push_bind(viewer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Role, User};

    fn caller(id: i64, role: Role) -> Caller {
        Caller::from_user(User {
            id,
            username: format!("u{id}"),
            email: format!("u{id}@x.com"),
            password: String::new(),
            full_name: String::new(),
            bio: String::new(),
            avatar: String::new(),
            role,
            is_active: true,
            last_login: None,
            created_at: String::new(),
            updated_at: String::new(),
        })
    }

    #[test]
    fn test_listing_status() {
        let admin = caller(1, Role::Admin);
        let user = caller(2, Role::User);

        assert_eq!(listing_status(&admin, None), None);
        assert_eq!(
            listing_status(&admin, Some(PostStatus::Draft)),
            Some(PostStatus::Draft)
        );
        assert_eq!(
            listing_status(&user, Some(PostStatus::Draft)),
            Some(PostStatus::Published)
        );
        assert_eq!(
            listing_status(&Caller::Anonymous, None),
            Some(PostStatus::Published)
        );
    }

    #[test]
    fn test_author_listing_status() {
        let owner = caller(2, Role::User);
        let other = caller(3, Role::User);

        assert_eq!(author_listing_status(&owner, 2, None, None), None);
        assert_eq!(
            author_listing_status(&owner, 2, None, Some(PostStatus::Published)),
            Some(PostStatus::Published)
        );
        assert_eq!(
            author_listing_status(&owner, 2, Some(PostStatus::Draft), None),
            Some(PostStatus::Draft)
        );
        assert_eq!(
            author_listing_status(&other, 2, Some(PostStatus::Draft), None),
            Some(PostStatus::Published)
        );
    }

    #[test]
    fn test_can_view_post() {
        let owner = caller(2, Role::User);
        let admin = caller(1, Role::Admin);

        assert!(can_view_post(&Caller::Anonymous, PostStatus::Published, 2));
        assert!(!can_view_post(&Caller::Anonymous, PostStatus::Draft, 2));
        assert!(can_view_post(&owner, PostStatus::Draft, 2));
        assert!(can_view_post(&admin, PostStatus::Archived, 2));
        assert!(!can_view_post(&caller(5, Role::User), PostStatus::Draft, 2));
    }

    #[test]
    fn test_comment_scope_predicates() {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT 1 FROM comments c WHERE 1 = 1");
        CommentScope::for_caller(&Caller::Anonymous).push_top_level(&mut query, "c");
        assert_eq!(
            query.sql(),
            "SELECT 1 FROM comments c WHERE 1 = 1 AND (c.is_spam = 0)"
        );

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("WHERE 1 = 1");
        CommentScope::for_caller(&caller(7, Role::User)).push_replies(&mut query, "r");
        assert_eq!(
            query.sql(),
            "WHERE 1 = 1 AND ((r.is_approved = 1 AND r.is_spam = 0) OR r.author_id = ?)"
        );

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("WHERE 1 = 1");
        CommentScope::for_caller(&caller(1, Role::Admin)).push_replies(&mut query, "r");
        assert_eq!(query.sql(), "WHERE 1 = 1");
    }
}
