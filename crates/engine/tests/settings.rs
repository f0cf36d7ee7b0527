use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    AllocationUpdate, BudgetMode, Engine, EngineError, NewExpense, UserUpdate,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[tokio::test]
async fn first_access_seeds_defaults() {
    let (engine, _db) = engine_with_db().await;
    let today = day(2021, 2, 1);

    let user = engine.get_or_create_user("alice", today).await.unwrap();
    assert_eq!(user.monthly_budget, engine::DEFAULT_MONTHLY_BUDGET);
    assert_eq!(user.budget_mode, BudgetMode::Simple);

    // Repeated access is a plain read.
    let again = engine.get_or_create_user("alice", today).await.unwrap();
    assert_eq!(user, again);

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert_eq!(month.weeks.len(), 4);
    assert_eq!(month.total_budget, engine::DEFAULT_MONTHLY_BUDGET);
}

#[tokio::test]
async fn budget_below_minimum_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let today = day(2021, 2, 1);
    engine.get_or_create_user("alice", today).await.unwrap();

    let err = engine
        .update_user(
            "alice",
            UserUpdate {
                monthly_budget: Some(engine::MIN_MONTHLY_BUDGET - 1),
                budget_mode: None,
            },
            today,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn switching_to_categorized_seeds_and_allocates() {
    let (engine, _db) = engine_with_db().await;
    let today = day(2021, 2, 1);
    engine.get_or_create_user("alice", today).await.unwrap();
    engine
        .update_user(
            "alice",
            UserUpdate {
                monthly_budget: Some(140_000),
                budget_mode: Some(BudgetMode::Categorized),
            },
            today,
        )
        .await
        .unwrap();

    let categories = engine.list_categories("alice").await.unwrap();
    assert_eq!(categories.len(), 5);
    let total: f64 = categories.iter().map(|c| c.allocation).sum();
    assert!((total - 100.0).abs() < 0.01);

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    for week in &month.weeks {
        assert_eq!(week.categories.len(), 5);
        let allocated: i64 = week.categories.iter().map(|c| c.allocated_amount).sum();
        assert_eq!(allocated, week.weekly_budget);
    }
}

#[tokio::test]
async fn switching_back_to_simple_drops_breakdowns_but_keeps_categories() {
    let (engine, _db) = engine_with_db().await;
    let today = day(2021, 2, 1);
    engine.get_or_create_user("alice", today).await.unwrap();
    engine
        .update_user(
            "alice",
            UserUpdate {
                monthly_budget: None,
                budget_mode: Some(BudgetMode::Categorized),
            },
            today,
        )
        .await
        .unwrap();
    engine
        .update_user(
            "alice",
            UserUpdate {
                monthly_budget: None,
                budget_mode: Some(BudgetMode::Simple),
            },
            today,
        )
        .await
        .unwrap();

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert!(month.weeks.iter().all(|w| w.categories.is_empty()));
    // The category definitions survive for the next switch.
    assert_eq!(engine.list_categories("alice").await.unwrap().len(), 5);
}

#[tokio::test]
async fn category_expenses_feed_week_breakdowns() {
    let (engine, _db) = engine_with_db().await;
    let today = day(2021, 2, 3);
    engine.get_or_create_user("alice", today).await.unwrap();
    engine
        .update_user(
            "alice",
            UserUpdate {
                monthly_budget: Some(140_000),
                budget_mode: Some(BudgetMode::Categorized),
            },
            today,
        )
        .await
        .unwrap();

    let categories = engine.list_categories("alice").await.unwrap();
    let food = categories
        .iter()
        .find(|c| c.name == "Alimentación")
        .unwrap();

    engine
        .create_expense(
            "alice",
            NewExpense {
                amount: 8_000,
                description: "mercado".to_string(),
                date: day(2021, 2, 3),
                category_id: Some(food.id),
            },
            today,
        )
        .await
        .unwrap();

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    let breakdown = month.weeks[0]
        .categories
        .iter()
        .find(|c| c.category_id == food.id)
        .unwrap();
    assert_eq!(breakdown.spent_amount, 8_000);
    assert_eq!(month.weeks[0].spent_amount, 8_000);
}

#[tokio::test]
async fn bulk_allocation_rewrite_must_sum_to_hundred() {
    let (engine, _db) = engine_with_db().await;
    let today = day(2021, 2, 1);
    engine.get_or_create_user("alice", today).await.unwrap();
    engine
        .update_user(
            "alice",
            UserUpdate {
                monthly_budget: None,
                budget_mode: Some(BudgetMode::Categorized),
            },
            today,
        )
        .await
        .unwrap();

    let categories = engine.list_categories("alice").await.unwrap();
    let first = &categories[0];

    let err = engine
        .update_category_allocations(
            "alice",
            &[AllocationUpdate {
                category_id: first.id,
                allocation: first.allocation + 10.0,
            }],
            today,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // A rewrite that shifts weight between two categories keeps the sum.
    let second = &categories[1];
    let updated = engine
        .update_category_allocations(
            "alice",
            &[
                AllocationUpdate {
                    category_id: first.id,
                    allocation: first.allocation + 5.0,
                },
                AllocationUpdate {
                    category_id: second.id,
                    allocation: second.allocation - 5.0,
                },
            ],
            today,
        )
        .await
        .unwrap();
    let total: f64 = updated.iter().map(|c| c.allocation).sum();
    assert!((total - 100.0).abs() < 0.01);
}

#[tokio::test]
async fn duplicate_category_name_conflicts() {
    let (engine, _db) = engine_with_db().await;
    let today = day(2021, 2, 1);
    engine.get_or_create_user("alice", today).await.unwrap();

    engine
        .create_category("alice", "Viajes", 0.0)
        .await
        .unwrap();
    let err = engine
        .create_category("alice", "Viajes", 10.0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn deleting_a_category_detaches_its_expenses() {
    let (engine, _db) = engine_with_db().await;
    let today = day(2021, 2, 3);
    engine.get_or_create_user("alice", today).await.unwrap();
    engine
        .update_user(
            "alice",
            UserUpdate {
                monthly_budget: None,
                budget_mode: Some(BudgetMode::Categorized),
            },
            today,
        )
        .await
        .unwrap();

    let categories = engine.list_categories("alice").await.unwrap();
    let target = categories[0].clone();
    engine
        .create_expense(
            "alice",
            NewExpense {
                amount: 3_000,
                description: "algo".to_string(),
                date: day(2021, 2, 3),
                category_id: Some(target.id),
            },
            today,
        )
        .await
        .unwrap();

    engine
        .delete_category("alice", target.id, today)
        .await
        .unwrap();

    let summary = engine
        .get_monthly_history("alice", 2021, 2, today)
        .await
        .unwrap();
    // Spend survives under the uncategorized bucket.
    assert_eq!(summary.total_spent, 3_000);
    assert!(summary
        .top_categories
        .iter()
        .any(|c| c.category_id.is_none() && c.spent_amount == 3_000));
}

#[tokio::test]
async fn monthly_summary_aggregates_live_spend() {
    let (engine, _db) = engine_with_db().await;
    let today = day(2021, 2, 10);
    engine.get_or_create_user("alice", today).await.unwrap();
    engine
        .update_user(
            "alice",
            UserUpdate {
                monthly_budget: Some(140_000),
                budget_mode: None,
            },
            today,
        )
        .await
        .unwrap();

    engine
        .create_expense(
            "alice",
            NewExpense {
                amount: 20_000,
                description: "mercado".to_string(),
                date: day(2021, 2, 2),
                category_id: None,
            },
            today,
        )
        .await
        .unwrap();
    engine
        .create_expense(
            "alice",
            NewExpense {
                amount: 5_000,
                description: "bus".to_string(),
                date: day(2021, 2, 9),
                category_id: None,
            },
            today,
        )
        .await
        .unwrap();

    let summary = engine
        .get_monthly_history("alice", 2021, 2, today)
        .await
        .unwrap();
    assert_eq!(summary.total_budget, 140_000);
    // Open weeks count toward the live total even before closing.
    assert_eq!(summary.total_spent, 25_000);
    assert_eq!(summary.weeks.len(), 4);
    assert!((summary.average_daily_spend - 2_500.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn reset_budget_wipes_history_and_reseeds() {
    let (engine, _db) = engine_with_db().await;
    let today = day(2021, 2, 3);
    engine.get_or_create_user("alice", today).await.unwrap();
    engine
        .create_expense(
            "alice",
            NewExpense {
                amount: 9_000,
                description: "mercado".to_string(),
                date: day(2021, 2, 3),
                category_id: None,
            },
            today,
        )
        .await
        .unwrap();

    engine.reset_budget("alice", today).await.unwrap();

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert!(month.weeks.iter().all(|w| w.spent_amount == 0));
    assert!(month.weeks.iter().all(|w| !w.is_closed));
}
