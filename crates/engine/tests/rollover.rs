use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, EngineError, NewExpense, UserUpdate};
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

/// February 2021 splits into exactly four Monday-start weeks; with a budget
/// of 140,000 every base share is 35,000.
async fn alice_feb_2021(engine: &Engine) {
    let today = day(2021, 2, 1);
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
}

fn expense(amount: i64, date: NaiveDate) -> NewExpense {
    NewExpense {
        amount,
        description: "groceries".to_string(),
        date,
        category_id: None,
    }
}

#[tokio::test]
async fn underspent_week_rolls_over_to_the_next() {
    let (engine, _db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 3);

    engine
        .create_expense("alice", expense(30_000, day(2021, 2, 3)), today)
        .await
        .unwrap();

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert_eq!(month.weeks.len(), 4);
    assert_eq!(month.weeks[0].weekly_budget, 35_000);
    assert_eq!(month.weeks[0].spent_amount, 30_000);

    let closed = engine
        .close_week("alice", month.weeks[0].id)
        .await
        .unwrap();
    assert!(closed.is_closed);
    assert_eq!(closed.rollover_amount, 5_000);

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert_eq!(month.weeks[1].weekly_budget, 40_000);
    assert_eq!(month.weeks[2].weekly_budget, 35_000);
    assert_eq!(month.total_spent, 30_000);
    assert_eq!(month.total_rollover, 5_000);
}

#[tokio::test]
async fn overspent_week_shrinks_the_next() {
    let (engine, _db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 3);

    engine
        .create_expense("alice", expense(40_000, day(2021, 2, 3)), today)
        .await
        .unwrap();
    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    let closed = engine
        .close_week("alice", month.weeks[0].id)
        .await
        .unwrap();
    assert_eq!(closed.rollover_amount, -5_000);

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert_eq!(month.weeks[1].weekly_budget, 30_000);
    assert_eq!(month.total_rollover, -5_000);
}

#[tokio::test]
async fn retroactive_expense_into_closed_week_reflows_the_chain() {
    let (engine, _db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 10);

    engine
        .create_expense("alice", expense(30_000, day(2021, 2, 3)), today)
        .await
        .unwrap();
    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    // Week 1 expired on Feb 7 and was auto-closed by the read above.
    assert!(month.weeks[0].is_closed);
    assert_eq!(month.weeks[1].weekly_budget, 40_000);

    engine
        .create_expense("alice", expense(10_000, day(2021, 2, 2)), today)
        .await
        .unwrap();

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert_eq!(month.weeks[0].spent_amount, 40_000);
    assert_eq!(month.weeks[0].rollover_amount, -5_000);
    assert_eq!(month.weeks[1].weekly_budget, 30_000);
    assert_eq!(month.total_spent, 40_000);
}

#[tokio::test]
async fn reopen_reverts_rollover_and_totals() {
    let (engine, _db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 3);

    engine
        .create_expense("alice", expense(30_000, day(2021, 2, 3)), today)
        .await
        .unwrap();
    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    let week_id = month.weeks[0].id;
    engine.close_week("alice", week_id).await.unwrap();

    let reopened = engine.reopen_week("alice", week_id).await.unwrap();
    assert!(!reopened.is_closed);
    assert_eq!(reopened.rollover_amount, 0);
    // Spending stays on the week; only the frozen rollover is undone.
    assert_eq!(reopened.spent_amount, 30_000);

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert_eq!(month.weeks[1].weekly_budget, 35_000);
    assert_eq!(month.total_rollover, 0);
    assert_eq!(month.total_spent, 0);
}

#[tokio::test]
async fn closing_twice_and_reopening_open_week_conflict() {
    let (engine, _db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 3);

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    let week_id = month.weeks[0].id;

    let err = engine.reopen_week("alice", week_id).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    engine.close_week("alice", week_id).await.unwrap();
    let err = engine.close_week("alice", week_id).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn cascade_is_idempotent_across_repeated_reads() {
    let (engine, _db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 17);

    engine
        .create_expense("alice", expense(12_345, day(2021, 2, 4)), today)
        .await
        .unwrap();
    engine
        .create_expense("alice", expense(6_789, day(2021, 2, 9)), today)
        .await
        .unwrap();

    let first = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    let second = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    let third = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(second, third);
}

#[tokio::test]
async fn chained_closes_accumulate_carry_in_order() {
    let (engine, _db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    // Weeks 1 and 2 expired, week 3 is current.
    let today = day(2021, 2, 17);

    engine
        .create_expense("alice", expense(20_000, day(2021, 2, 2)), today)
        .await
        .unwrap();
    engine
        .create_expense("alice", expense(50_000, day(2021, 2, 9)), today)
        .await
        .unwrap();

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    // Week 1: 35,000 - 20,000 = +15,000 into week 2.
    assert_eq!(month.weeks[0].rollover_amount, 15_000);
    // Week 2: 35,000 + 15,000 - 50,000 = 0.
    assert_eq!(month.weeks[1].weekly_budget, 50_000);
    assert_eq!(month.weeks[1].rollover_amount, 0);
    // Week 3 is the first open week and receives the chain leftover.
    assert_eq!(month.weeks[2].weekly_budget, 35_000);
    assert_eq!(month.weeks[3].weekly_budget, 35_000);
}

#[tokio::test]
async fn fully_closed_month_carries_into_the_next() {
    let (engine, _db) = engine_with_db().await;
    alice_feb_2021(&engine).await;

    engine
        .create_expense(
            "alice",
            expense(30_000, day(2021, 2, 3)),
            day(2021, 2, 3),
        )
        .await
        .unwrap();

    // Reading in March auto-closes all of February.
    let today = day(2021, 3, 1);
    let feb = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert!(feb.weeks.iter().all(|w| w.is_closed));
    assert_eq!(feb.total_rollover, 5_000 + 40_000 + 75_000 + 110_000);

    // March 2021 starts on a Monday and has five weeks of 28,000 each;
    // the first one receives February's final leftover.
    let mar = engine.get_weeks("alice", 2021, 3, today).await.unwrap();
    assert_eq!(mar.weeks.len(), 5);
    assert_eq!(mar.weeks[0].weekly_budget, 28_000 + 110_000);
    assert_eq!(mar.weeks[1].weekly_budget, 28_000);
}

#[tokio::test]
async fn corrupted_spent_amount_is_healed_on_read() {
    let (engine, db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 3);

    engine
        .create_expense("alice", expense(30_000, day(2021, 2, 3)), today)
        .await
        .unwrap();

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE weeks SET spent_amount = ? WHERE user_id = ? AND week_number = 1",
        vec![999_999.into(), "alice".into()],
    ))
    .await
    .unwrap();

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert_eq!(month.weeks[0].spent_amount, 30_000);
}

#[tokio::test]
async fn deleted_week_row_is_recreated_on_read() {
    let (engine, db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 3);

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "DELETE FROM weeks WHERE user_id = ? AND week_number = 3",
        vec!["alice".into()],
    ))
    .await
    .unwrap();

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert_eq!(month.weeks.len(), 4);
    assert_eq!(month.weeks[2].week_number, 3);
    assert_eq!(month.weeks[2].weekly_budget, 35_000);
    assert_eq!(month.weeks[2].spent_amount, 0);
}

#[tokio::test]
async fn drifted_week_dates_are_restored_on_read() {
    let (engine, db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 3);

    engine
        .create_expense("alice", expense(5_000, day(2021, 2, 3)), today)
        .await
        .unwrap();

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE weeks SET start_date = ?, end_date = ? WHERE user_id = ? AND week_number = 1",
        vec!["2021-02-02".into(), "2021-02-06".into(), "alice".into()],
    ))
    .await
    .unwrap();

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert_eq!(month.weeks[0].start_date, day(2021, 2, 1));
    assert_eq!(month.weeks[0].end_date, day(2021, 2, 7));
    assert_eq!(month.weeks[0].spent_amount, 5_000);
}

#[tokio::test]
async fn expense_update_relocates_between_weeks() {
    let (engine, _db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 10);

    let created = engine
        .create_expense("alice", expense(10_000, day(2021, 2, 3)), today)
        .await
        .unwrap();

    engine
        .update_expense(
            "alice",
            created.id,
            engine::ExpenseUpdate {
                amount: 10_000,
                description: "groceries".to_string(),
                date: day(2021, 2, 9),
                category_id: None,
            },
            today,
        )
        .await
        .unwrap();

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert_eq!(month.weeks[0].spent_amount, 0);
    assert_eq!(month.weeks[1].spent_amount, 10_000);
}

#[tokio::test]
async fn expense_date_move_across_months_resyncs_both() {
    let (engine, _db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 3);

    let created = engine
        .create_expense("alice", expense(30_000, day(2021, 2, 3)), today)
        .await
        .unwrap();

    engine
        .update_expense(
            "alice",
            created.id,
            engine::ExpenseUpdate {
                amount: 30_000,
                description: "groceries".to_string(),
                date: day(2021, 3, 3),
                category_id: None,
            },
            today,
        )
        .await
        .unwrap();

    let feb = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert!(feb.weeks.iter().all(|w| w.spent_amount == 0));

    let mar = engine.get_weeks("alice", 2021, 3, today).await.unwrap();
    assert_eq!(mar.weeks.len(), 5);
    assert_eq!(mar.weeks[0].spent_amount, 30_000);
    // February is still open, so no carry reaches March.
    assert_eq!(mar.weeks[0].weekly_budget, 28_000);
}

#[tokio::test]
async fn expense_delete_resyncs_the_owning_week() {
    let (engine, _db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 3);

    let created = engine
        .create_expense("alice", expense(10_000, day(2021, 2, 3)), today)
        .await
        .unwrap();
    engine
        .delete_expense("alice", created.id, today)
        .await
        .unwrap();

    let month = engine.get_weeks("alice", 2021, 2, today).await.unwrap();
    assert_eq!(month.weeks[0].spent_amount, 0);

    let err = engine
        .delete_expense("alice", created.id, today)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn invalid_expenses_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    alice_feb_2021(&engine).await;
    let today = day(2021, 2, 3);

    let err = engine
        .create_expense("alice", expense(0, day(2021, 2, 3)), today)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .create_expense(
            "alice",
            NewExpense {
                amount: 1_000,
                description: "   ".to_string(),
                date: day(2021, 2, 3),
                category_id: None,
            },
            today,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}
