use chrono::NaiveDate;
use expense_core::db::open_db_in_memory;
use expense_core::{Expense, ExpenseRepository, ExpenseService, RepoError, SqliteExpenseRepository};
use std::collections::HashSet;

fn new_repo() -> SqliteExpenseRepository {
    SqliteExpenseRepository::new(open_db_in_memory().expect("in-memory ledger should open"))
}

fn new_service() -> ExpenseService<SqliteExpenseRepository> {
    ExpenseService::new(new_repo())
}

fn expense(description: &str, amount: f64, category: Option<&str>) -> Expense {
    let mut expense = Expense::new(description, amount);
    expense.category = category.map(str::to_string);
    expense
}

#[test]
fn create_and_get_roundtrip() {
    let service = new_service();
    let input = Expense::new("Coffee", 4.5)
        .with_category("Food")
        .with_date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());

    let saved = service.save(&input).unwrap();
    let id = saved.id.expect("saved expense must carry an id");

    let loaded = service.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded, Expense { id: Some(id), ..input });
}

#[test]
fn insert_assigns_distinct_ids() {
    let repo = new_repo();
    let first = repo.insert_or_replace(&Expense::new("a", 1.0)).unwrap();
    let second = repo.insert_or_replace(&Expense::new("b", 2.0)).unwrap();

    assert_ne!(first.id, second.id);
}

#[test]
fn ids_are_not_reused_after_delete() {
    let repo = new_repo();
    let first = repo.insert_or_replace(&Expense::new("a", 1.0)).unwrap();
    repo.delete_by_id(first.id.unwrap()).unwrap();

    let second = repo.insert_or_replace(&Expense::new("b", 2.0)).unwrap();
    assert!(second.id.unwrap() > first.id.unwrap());
}

#[test]
fn save_with_id_replaces_whole_record() {
    let service = new_service();
    let saved = service
        .save(
            &Expense::new("Lunch", 12.0)
                .with_category("Food")
                .with_date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
        )
        .unwrap();

    let replacement = Expense {
        id: saved.id,
        ..Expense::new("Team lunch", 30.0)
    };
    service.save(&replacement).unwrap();

    let loaded = service.get_by_id(saved.id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded.description, "Team lunch");
    assert_eq!(loaded.amount, 30.0);
    assert_eq!(loaded.category, None);
    assert_eq!(loaded.date, None);
    assert_eq!(service.get_all().unwrap().len(), 1);
}

#[test]
fn same_update_twice_yields_same_state() {
    let service = new_service();
    let saved = service.save(&Expense::new("Taxi", 18.0)).unwrap();
    let update = Expense {
        id: saved.id,
        ..Expense::new("Taxi to airport", 42.0).with_category("Travel")
    };

    service.save(&update).unwrap();
    let after_once = service.get_all().unwrap();
    service.save(&update).unwrap();
    let after_twice = service.get_all().unwrap();

    assert_eq!(after_once, after_twice);
}

#[test]
fn save_with_unknown_id_creates_row() {
    let repo = new_repo();
    let record = Expense {
        id: Some(41),
        ..Expense::new("Imported", 5.0)
    };

    let saved = repo.insert_or_replace(&record).unwrap();
    assert_eq!(saved.id, Some(41));
    assert!(repo.exists_by_id(41).unwrap());
}

#[test]
fn get_missing_returns_none() {
    let service = new_service();
    assert!(service.get_by_id(12345).unwrap().is_none());
    assert!(!service.exists(12345).unwrap());
}

#[test]
fn get_all_on_empty_ledger_is_empty() {
    let service = new_service();
    assert!(service.get_all().unwrap().is_empty());
}

#[test]
fn delete_then_fetch_is_absent() {
    let service = new_service();
    let id = service.save(&Expense::new("Movie", 11.0)).unwrap().id.unwrap();
    assert!(service.exists(id).unwrap());

    service.delete(id).unwrap();

    assert!(service.get_by_id(id).unwrap().is_none());
    assert!(!service.exists(id).unwrap());
}

#[test]
fn delete_missing_returns_not_found() {
    let service = new_service();
    let err = service.delete(777).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(777)));
}

#[test]
fn category_filter_returns_exact_matches_only() {
    let service = new_service();
    let records = [
        expense("Coffee", 4.5, Some("Food")),
        expense("Groceries", 60.0, Some("Food")),
        expense("Snack", 2.0, Some("food")),
        expense("Bus", 2.75, Some("Transport")),
        expense("Misc", 1.0, None),
    ];
    for record in &records {
        service.save(record).unwrap();
    }

    let all = service.get_all().unwrap();
    let expected = all
        .iter()
        .filter(|expense| expense.category.as_deref() == Some("Food"))
        .map(|expense| expense.id.unwrap())
        .collect::<HashSet<_>>();

    let food = service.get_by_category("Food").unwrap();
    let actual = food
        .iter()
        .map(|expense| expense.id.unwrap())
        .collect::<HashSet<_>>();

    assert_eq!(actual, expected);
    assert_eq!(actual.len(), 2);
    assert!(service.get_by_category("Rent").unwrap().is_empty());
}

#[test]
fn undecodable_date_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().expect("in-memory ledger should open");
    conn.execute(
        "INSERT INTO expenses (description, amount, date) VALUES ('Broken', 1.0, 'yesterday');",
        [],
    )
    .expect("raw insert should bypass date decoding");
    let repo = SqliteExpenseRepository::new(conn);

    let err = repo.find_all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("yesterday")));
}
