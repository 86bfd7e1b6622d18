//! PostgreSQL-backed discovery store
//!
//! Thin read layer over the social graph tables. Every query here is a
//! plain SELECT; ordering clauses exist so equal inputs produce equal
//! outputs, which the pipeline's tie-break rules rely on.

use super::{DiscoveryStore, FollowGrowth, HashtagUse, ProfileRow};
use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Production store over PostgreSQL
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl DiscoveryStore for PostgresStore {
    async fn following_of(&self, user: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT following_id FROM follows WHERE follower_id = $1
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn blocked_either_way(&self, user: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT blocked_id FROM blocks WHERE blocker_id = $1
            UNION
            SELECT blocker_id FROM blocks WHERE blocked_id = $1
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn muted_by(&self, user: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT muted_id FROM mutes WHERE muter_id = $1
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn second_degree_follows(
        &self,
        sources: &[Uuid],
        exclude: &[Uuid],
        limit: i64,
    ) -> Result<Vec<Uuid>> {
        // Ranked by how many of the viewer's follows follow the candidate,
        // so the first-N cut is deterministic and favors stronger signals.
        let rows = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT f.following_id
            FROM follows f
            WHERE f.follower_id = ANY($1)
              AND f.following_id <> ALL($2)
            GROUP BY f.following_id
            ORDER BY COUNT(*) DESC, f.following_id
            LIMIT $3
            "#,
        )
        .bind(sources)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn recent_hashtags_of(&self, user: Uuid, post_limit: i64) -> Result<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT h.name
            FROM (
                SELECT id FROM posts
                WHERE user_id = $1
                ORDER BY last_modified DESC
                LIMIT $2
            ) p
            JOIN post_hashtags ph ON ph.post_id = p.id
            JOIN hashtags h ON h.id = ph.hashtag_id
            ORDER BY h.name
            "#,
        )
        .bind(user)
        .bind(post_limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn authors_using_hashtags(
        &self,
        names: &[String],
        exclude: &[Uuid],
    ) -> Result<Vec<HashtagUse>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT DISTINCT p.user_id, h.name
            FROM posts p
            JOIN post_hashtags ph ON ph.post_id = p.id
            JOIN hashtags h ON h.id = ph.hashtag_id
            WHERE h.name = ANY($1)
              AND p.user_id <> ALL($2)
            ORDER BY p.user_id, h.name
            "#,
        )
        .bind(names)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(author, hashtag)| HashtagUse { author, hashtag })
            .collect())
    }

    async fn recent_follow_counts(&self, since: DateTime<Utc>) -> Result<Vec<FollowGrowth>> {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT following_id, COUNT(*) AS recent_follows
            FROM follows
            WHERE inserted_at >= $1
            GROUP BY following_id
            ORDER BY recent_follows DESC, following_id
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, recent_follows)| FollowGrowth {
                user_id,
                recent_follows,
            })
            .collect())
    }

    async fn follower_count(&self, user: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM follows WHERE following_id = $1
            "#,
        )
        .bind(user)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn following_count(&self, user: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM follows WHERE follower_id = $1
            "#,
        )
        .bind(user)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn recent_post_authors(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<Uuid>> {
        let rows = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id FROM posts
            WHERE last_modified >= $1
            ORDER BY last_modified DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn profile(&self, user: Uuid) -> Result<Option<ProfileRow>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, username, display_name, avatar, bio
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn is_following(&self, follower: Uuid, followee: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM follows
                WHERE follower_id = $1 AND following_id = $2
            )
            "#,
        )
        .bind(follower)
        .bind(followee)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn is_muted(&self, muter: Uuid, muted: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM mutes
                WHERE muter_id = $1 AND muted_id = $2
            )
            "#,
        )
        .bind(muter)
        .bind(muted)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn has_active_story(&self, user: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM stories
                WHERE user_id = $1 AND expires_at > NOW()
            )
            "#,
        )
        .bind(user)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn common_followers(
        &self,
        viewer: Uuid,
        candidate: Uuid,
        limit: i64,
    ) -> Result<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.username
            FROM follows vf
            JOIN follows cf
              ON cf.follower_id = vf.following_id
             AND cf.following_id = $2
            JOIN users u ON u.id = vf.following_id
            WHERE vf.follower_id = $1
            ORDER BY u.username
            LIMIT $3
            "#,
        )
        .bind(viewer)
        .bind(candidate)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
