//! Expense repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert-or-replace, lookup, filter and delete over `expenses`.
//! - Own the field-to-column mapping used by both read and write paths.
//!
//! # Invariants
//! - Read paths reject undecodable rows instead of masking them.
//! - `delete_by_id` on a missing id returns `NotFound`.

use crate::db::DbError;
use crate::model::expense::{Expense, ExpenseId};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rusqlite::{named_params, params, Connection, Row, ToSql};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

/// One row of the schema mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Field name on `Expense`.
    pub field: &'static str,
    /// Column name in the `expenses` table.
    pub column: &'static str,
    pub nullable: bool,
    /// Declared SQLite column type.
    pub sql_type: &'static str,
}

pub const EXPENSES_TABLE: &str = "expenses";

const ID: ColumnMapping = ColumnMapping {
    field: "id",
    column: "id",
    nullable: false,
    sql_type: "INTEGER",
};
const DESCRIPTION: ColumnMapping = ColumnMapping {
    field: "description",
    column: "description",
    nullable: false,
    sql_type: "TEXT",
};
const AMOUNT: ColumnMapping = ColumnMapping {
    field: "amount",
    column: "amount",
    nullable: false,
    sql_type: "REAL",
};
const CATEGORY: ColumnMapping = ColumnMapping {
    field: "category",
    column: "category",
    nullable: true,
    sql_type: "TEXT",
};
const DATE: ColumnMapping = ColumnMapping {
    field: "date",
    column: "date",
    nullable: true,
    sql_type: "TEXT",
};

/// Field → column → nullability → type, in column order.
pub const EXPENSE_COLUMNS: [ColumnMapping; 5] = [ID, DESCRIPTION, AMOUNT, CATEGORY, DATE];

static SELECT_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "SELECT {} FROM {EXPENSES_TABLE}",
        column_list(&EXPENSE_COLUMNS)
    )
});

static FIND_BY_ID_SQL: Lazy<String> =
    Lazy::new(|| format!("{} WHERE {} = ?1;", SELECT_SQL.as_str(), ID.column));

static FIND_ALL_SQL: Lazy<String> =
    Lazy::new(|| format!("{} ORDER BY {} ASC;", SELECT_SQL.as_str(), ID.column));

/// Named query: exact, case-sensitive match on `category`.
static FIND_BY_CATEGORY_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "{} WHERE {} = :category ORDER BY {} ASC;",
        SELECT_SQL.as_str(),
        CATEGORY.column,
        ID.column
    )
});

static INSERT_SQL: Lazy<String> = Lazy::new(|| {
    let data_columns = &EXPENSE_COLUMNS[1..];
    format!(
        "INSERT INTO {EXPENSES_TABLE} ({}) VALUES ({});",
        column_list(data_columns),
        placeholders(data_columns.len())
    )
});

/// Upsert keyed on the identity column; `?1` is the id.
static UPSERT_SQL: Lazy<String> = Lazy::new(|| {
    let assignments = EXPENSE_COLUMNS[1..]
        .iter()
        .map(|mapping| format!("{0} = excluded.{0}", mapping.column))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {EXPENSES_TABLE} ({}) VALUES ({})
         ON CONFLICT({}) DO UPDATE SET {assignments};",
        column_list(&EXPENSE_COLUMNS),
        placeholders(EXPENSE_COLUMNS.len()),
        ID.column
    )
});

static EXISTS_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "SELECT EXISTS(SELECT 1 FROM {EXPENSES_TABLE} WHERE {} = ?1);",
        ID.column
    )
});

static DELETE_SQL: Lazy<String> =
    Lazy::new(|| format!("DELETE FROM {EXPENSES_TABLE} WHERE {} = ?1;", ID.column));

fn column_list(columns: &[ColumnMapping]) -> String {
    columns
        .iter()
        .map(|mapping| mapping.column)
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for expense persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(ExpenseId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "expense not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted expense data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::FromSqlConversionFailure(index, _, err) => {
                let column = EXPENSE_COLUMNS
                    .get(index)
                    .map_or("?", |mapping| mapping.column);
                Self::InvalidData(format!("{EXPENSES_TABLE}.{column}: {err}"))
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// Storage gateway contract for expense records.
pub trait ExpenseRepository {
    /// Inserts when `expense.id` is unset, otherwise overwrites (or creates)
    /// the row with that id. Returns the persisted record.
    fn insert_or_replace(&self, expense: &Expense) -> RepoResult<Expense>;
    fn find_by_id(&self, id: ExpenseId) -> RepoResult<Option<Expense>>;
    fn find_all(&self) -> RepoResult<Vec<Expense>>;
    fn find_by_category(&self, category: &str) -> RepoResult<Vec<Expense>>;
    fn exists_by_id(&self, id: ExpenseId) -> RepoResult<bool>;
    fn delete_by_id(&self, id: ExpenseId) -> RepoResult<()>;
}

/// SQLite-backed expense repository.
///
/// Owns its connection; statements are serialized through the mutex.
pub struct SqliteExpenseRepository {
    conn: Mutex<Connection>,
}

impl SqliteExpenseRepository {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another worker panicked mid-call; the
        // connection itself is still usable.
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn query_many(
        &self,
        sql: &str,
        params: &[(&str, &dyn ToSql)],
    ) -> RepoResult<Vec<Expense>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(sql)?;
        let mut rows = stmt.query(params)?;
        let mut expenses = Vec::new();

        while let Some(row) = rows.next()? {
            expenses.push(parse_expense_row(row)?);
        }

        Ok(expenses)
    }
}

impl ExpenseRepository for SqliteExpenseRepository {
    fn insert_or_replace(&self, expense: &Expense) -> RepoResult<Expense> {
        let conn = self.conn();

        let id = match expense.id {
            None => {
                conn.execute(
                    INSERT_SQL.as_str(),
                    params![
                        expense.description.as_str(),
                        expense.amount,
                        expense.category.as_deref(),
                        expense.date,
                    ],
                )?;
                conn.last_insert_rowid()
            }
            Some(id) => {
                conn.execute(
                    UPSERT_SQL.as_str(),
                    params![
                        id,
                        expense.description.as_str(),
                        expense.amount,
                        expense.category.as_deref(),
                        expense.date,
                    ],
                )?;
                id
            }
        };

        Ok(Expense {
            id: Some(id),
            ..expense.clone()
        })
    }

    fn find_by_id(&self, id: ExpenseId) -> RepoResult<Option<Expense>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(FIND_BY_ID_SQL.as_str())?;
        let mut rows = stmt.query([id])?;

        if let Some(row) = rows.next()? {
            return Ok(Some(parse_expense_row(row)?));
        }

        Ok(None)
    }

    fn find_all(&self) -> RepoResult<Vec<Expense>> {
        self.query_many(FIND_ALL_SQL.as_str(), &[])
    }

    fn find_by_category(&self, category: &str) -> RepoResult<Vec<Expense>> {
        self.query_many(
            FIND_BY_CATEGORY_SQL.as_str(),
            named_params! { ":category": category },
        )
    }

    fn exists_by_id(&self, id: ExpenseId) -> RepoResult<bool> {
        let exists = self
            .conn()
            .query_row(EXISTS_SQL.as_str(), [id], |row| row.get::<_, bool>(0))?;
        Ok(exists)
    }

    fn delete_by_id(&self, id: ExpenseId) -> RepoResult<()> {
        let changed = self.conn().execute(DELETE_SQL.as_str(), [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_expense_row(row: &Row<'_>) -> RepoResult<Expense> {
    let date = match row.get::<_, Option<String>>(DATE.column)? {
        Some(text) => Some(parse_date(&text)?),
        None => None,
    };

    Ok(Expense {
        id: Some(row.get(ID.column)?),
        description: row.get(DESCRIPTION.column)?,
        amount: row.get(AMOUNT.column)?,
        category: row.get(CATEGORY.column)?,
        date,
    })
}

fn parse_date(text: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{text}` in {EXPENSES_TABLE}.{}",
            DATE.column
        ))
    })
}
