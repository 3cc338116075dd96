//! Schema bootstrap
//!
//! Creates every table from its entity definition, then the secondary
//! indexes the repository queries rely on. Safe to run on every start.

use crate::db::models::*;
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema};
use tracing::info;

/// Create all tables and indexes that do not exist yet
pub async fn create_schema(conn: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(conn.get_database_backend());

    // Parents before children so foreign keys resolve
    create_table(conn, &schema, UserEntity).await?;
    create_table(conn, &schema, CategoryEntity).await?;
    create_table(conn, &schema, CopyEntity).await?;
    create_table(conn, &schema, LikeEntity).await?;
    create_table(conn, &schema, ChallengeEntity).await?;
    create_table(conn, &schema, SubmissionEntity).await?;

    let backend = conn.get_database_backend();
    for index in indexes() {
        conn.execute(backend.build(&index)).await?;
    }

    info!("Database schema ready");
    Ok(())
}

async fn create_table<E: EntityTrait>(
    conn: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<()> {
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    conn.execute(conn.get_database_backend().build(&stmt)).await?;
    Ok(())
}

fn indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("users_by_email")
            .table(UserEntity)
            .col(UserColumn::Email)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("categories_by_user")
            .table(CategoryEntity)
            .col(CategoryColumn::UserId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("copies_by_user")
            .table(CopyEntity)
            .col(CopyColumn::UserId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("copies_by_category")
            .table(CopyEntity)
            .col(CopyColumn::Category)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("copies_by_public")
            .table(CopyEntity)
            .col(CopyColumn::IsPublic)
            .if_not_exists()
            .to_owned(),
        // At most one like per (user, copy)
        Index::create()
            .name("likes_by_user_and_copy")
            .table(LikeEntity)
            .col(LikeColumn::UserId)
            .col(LikeColumn::CopyId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ev_challenges_by_active")
            .table(ChallengeEntity)
            .col(ChallengeColumn::Active)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ev_submissions_by_user_and_challenge")
            .table(SubmissionEntity)
            .col(SubmissionColumn::UserId)
            .col(SubmissionColumn::ChallengeId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ev_submissions_by_challenge")
            .table(SubmissionEntity)
            .col(SubmissionColumn::ChallengeId)
            .if_not_exists()
            .to_owned(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::memory_pool;

    #[tokio::test]
    async fn test_bootstrap_is_repeatable() {
        let pool = memory_pool().await;
        // Second run must be a no-op rather than a "table exists" error
        create_schema(pool.write()).await.unwrap();
        pool.ping().await.unwrap();
    }
}
