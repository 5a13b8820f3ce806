use quill_core::domain::{Category, DEFAULT_CATEGORIES};
use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_categories::Categories;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert.into_table(Categories::Table).columns([
            Categories::Id,
            Categories::Name,
            Categories::Slug,
            Categories::Description,
            Categories::Color,
            Categories::IsActive,
            Categories::PostCount,
            Categories::CreatedAt,
            Categories::UpdatedAt,
        ]);

        for category in Category::defaults() {
            insert
                .values([
                    category.id.into(),
                    category.name.into(),
                    category.slug.into(),
                    category.description.into(),
                    category.color.into(),
                    category.is_active.into(),
                    category.post_count.into(),
                    category.created_at.into(),
                    category.updated_at.into(),
                ])
                .map_err(|e| DbErr::Custom(e.to_string()))?;
        }

        insert.on_conflict(OnConflict::column(Categories::Name).do_nothing().to_owned());

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let names: Vec<&str> = DEFAULT_CATEGORIES.iter().map(|(name, _, _)| *name).collect();

        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Categories::Table)
                    .and_where(Expr::col(Categories::Name).is_in(names))
                    .to_owned(),
            )
            .await
    }
}
