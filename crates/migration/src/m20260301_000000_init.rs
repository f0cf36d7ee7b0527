//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Semanal:
//!
//! - `users`: authentication and budget settings
//! - `categories`: user-defined spending categories with percentage shares
//! - `monthly_histories`: per-month snapshot of budget, mode and aggregates
//! - `weeks`: Monday-start calendar weeks of a month
//! - `week_categories`: per-week category allocations
//! - `expenses`: individual expense records

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    MonthlyBudget,
    BudgetMode,
    Role,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    UserId,
    Name,
    Allocation,
}

#[derive(Iden)]
enum MonthlyHistories {
    Table,
    Id,
    UserId,
    Year,
    Month,
    TotalBudget,
    TotalSpent,
    TotalRollover,
    BudgetMode,
}

#[derive(Iden)]
enum Weeks {
    Table,
    Id,
    MonthlyHistoryId,
    UserId,
    WeekNumber,
    StartDate,
    EndDate,
    WeeklyBudget,
    SpentAmount,
    RolloverAmount,
    IsClosed,
}

#[derive(Iden)]
enum WeekCategories {
    Table,
    Id,
    WeekId,
    CategoryId,
    AllocatedAmount,
    SpentAmount,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    UserId,
    WeekId,
    CategoryId,
    Amount,
    Description,
    Date,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(
                        ColumnDef::new(Users::MonthlyBudget)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::BudgetMode)
                            .string()
                            .not_null()
                            .default("simple"),
                    )
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("user"),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::UserId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Allocation).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-user_id")
                            .from(Categories::Table, Categories::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-user_id-name-unique")
                    .table(Categories::Table)
                    .col(Categories::UserId)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Monthly Histories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MonthlyHistories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MonthlyHistories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MonthlyHistories::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MonthlyHistories::Year).integer().not_null())
                    .col(
                        ColumnDef::new(MonthlyHistories::Month)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyHistories::TotalBudget)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyHistories::TotalSpent)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyHistories::TotalRollover)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyHistories::BudgetMode)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-monthly_histories-user_id")
                            .from(MonthlyHistories::Table, MonthlyHistories::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-monthly_histories-user-month-unique")
                    .table(MonthlyHistories::Table)
                    .col(MonthlyHistories::UserId)
                    .col(MonthlyHistories::Year)
                    .col(MonthlyHistories::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Weeks
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Weeks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Weeks::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Weeks::MonthlyHistoryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Weeks::UserId).string().not_null())
                    .col(ColumnDef::new(Weeks::WeekNumber).integer().not_null())
                    .col(ColumnDef::new(Weeks::StartDate).date().not_null())
                    .col(ColumnDef::new(Weeks::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(Weeks::WeeklyBudget)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Weeks::SpentAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Weeks::RolloverAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Weeks::IsClosed).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-weeks-monthly_history_id")
                            .from(Weeks::Table, Weeks::MonthlyHistoryId)
                            .to(MonthlyHistories::Table, MonthlyHistories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-weeks-user_id")
                            .from(Weeks::Table, Weeks::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-weeks-history-number-unique")
                    .table(Weeks::Table)
                    .col(Weeks::MonthlyHistoryId)
                    .col(Weeks::WeekNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-weeks-user_id")
                    .table(Weeks::Table)
                    .col(Weeks::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Week Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(WeekCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeekCategories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WeekCategories::WeekId).uuid().not_null())
                    .col(
                        ColumnDef::new(WeekCategories::CategoryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeekCategories::AllocatedAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeekCategories::SpentAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-week_categories-week_id")
                            .from(WeekCategories::Table, WeekCategories::WeekId)
                            .to(Weeks::Table, Weeks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-week_categories-category_id")
                            .from(WeekCategories::Table, WeekCategories::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-week_categories-week-category-unique")
                    .table(WeekCategories::Table)
                    .col(WeekCategories::WeekId)
                    .col(WeekCategories::CategoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::UserId).string().not_null())
                    .col(ColumnDef::new(Expenses::WeekId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::CategoryId).uuid())
                    .col(ColumnDef::new(Expenses::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::Description).string().not_null())
                    .col(ColumnDef::new(Expenses::Date).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-user_id")
                            .from(Expenses::Table, Expenses::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-week_id")
                            .from(Expenses::Table, Expenses::WeekId)
                            .to(Weeks::Table, Weeks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-week_id")
                    .table(Expenses::Table)
                    .col(Expenses::WeekId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-user_id-date")
                    .table(Expenses::Table)
                    .col(Expenses::UserId)
                    .col(Expenses::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WeekCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Weeks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MonthlyHistories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
