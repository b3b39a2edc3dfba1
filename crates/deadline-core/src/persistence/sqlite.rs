use super::{DocketStore, PersistenceError, PersistenceResult};
use crate::dates::{format_iso_date, parse_iso_date};
use crate::holiday::{Holiday, HolidayScope};
use crate::records::{Case, Deadline, Reminder};
use crate::{Docket, DocketConfig};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

const SCHEMA_VERSION: i64 = 1;

/// SQLite-backed docket store. Dates are kept in `YYYY-MM-DD` text columns
/// next to the JSON payload so they stay queryable.
pub struct SqliteDocketStore {
    connection: Mutex<Connection>,
    config: DocketConfig,
}

impl SqliteDocketStore {
    pub fn new<P: AsRef<std::path::Path>>(
        path: P,
        config: DocketConfig,
    ) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
            config,
        })
    }

    pub fn in_memory(config: DocketConfig) -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
            config,
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS docket_meta (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                schema_version INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS holidays (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                holiday_date TEXT NOT NULL,
                name TEXT NOT NULL,
                scope TEXT NOT NULL,
                owner TEXT
            );
            CREATE TABLE IF NOT EXISTS cases (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                case_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS deadlines (
                id INTEGER PRIMARY KEY,
                case_id INTEGER NOT NULL REFERENCES cases(id),
                user_id TEXT NOT NULL,
                start_date TEXT NOT NULL,
                due_date TEXT NOT NULL,
                deadline_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS reminders (
                id INTEGER PRIMARY KEY,
                deadline_id INTEGER NOT NULL REFERENCES deadlines(id),
                user_id TEXT NOT NULL,
                reminder_date TEXT NOT NULL,
                reminder_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)
    }

    fn clear(tx: &Transaction) -> PersistenceResult<()> {
        tx.execute("DELETE FROM reminders", [])?;
        tx.execute("DELETE FROM deadlines", [])?;
        tx.execute("DELETE FROM cases", [])?;
        tx.execute("DELETE FROM holidays", [])?;
        tx.execute("DELETE FROM docket_meta", [])?;
        Ok(())
    }

    fn save_holidays(tx: &Transaction, holidays: &[Holiday]) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO holidays (holiday_date, name, scope, owner) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for holiday in holidays {
            stmt.execute(params![
                format_iso_date(holiday.date),
                holiday.name,
                holiday.scope.as_str(),
                holiday.owner,
            ])?;
        }
        Ok(())
    }

    fn save_records(tx: &Transaction, docket: &Docket) -> PersistenceResult<()> {
        let mut stmt =
            tx.prepare("INSERT INTO cases (id, user_id, case_json) VALUES (?1, ?2, ?3)")?;
        for case in docket.cases() {
            let json = serde_json::to_string(case)?;
            stmt.execute(params![case.id, case.user_id, json])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO deadlines (id, case_id, user_id, start_date, due_date, deadline_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for deadline in docket.deadlines() {
            let json = serde_json::to_string(deadline)?;
            stmt.execute(params![
                deadline.id,
                deadline.case_id,
                deadline.user_id,
                format_iso_date(deadline.start_date),
                format_iso_date(deadline.due_date),
                json,
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO reminders (id, deadline_id, user_id, reminder_date, reminder_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for reminder in docket.reminders() {
            let json = serde_json::to_string(reminder)?;
            stmt.execute(params![
                reminder.id,
                reminder.deadline_id,
                reminder.user_id,
                format_iso_date(reminder.reminder_date),
                json,
            ])?;
        }
        Ok(())
    }

    fn load_holidays(conn: &Connection) -> PersistenceResult<Vec<Holiday>> {
        let mut stmt =
            conn.prepare("SELECT holiday_date, name, scope, owner FROM holidays ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut holidays = Vec::new();
        for row in rows {
            let (date, name, scope, owner) = row?;
            let date = parse_iso_date(&date)
                .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
            let scope = HolidayScope::from_str(&scope).map_err(|_| {
                PersistenceError::InvalidData(format!("unknown holiday scope '{scope}'"))
            })?;
            holidays.push(Holiday {
                date,
                name,
                scope,
                owner,
            });
        }
        Ok(holidays)
    }

    fn load_json_rows<T: serde::de::DeserializeOwned>(
        conn: &Connection,
        sql: &str,
    ) -> PersistenceResult<Vec<T>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut records = Vec::new();
        for json in rows {
            records.push(serde_json::from_str(&json?)?);
        }
        Ok(records)
    }
}

impl DocketStore for SqliteDocketStore {
    fn save_docket(&self, docket: &Docket) -> PersistenceResult<()> {
        docket.validate()?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::clear(&tx)?;
        tx.execute(
            "INSERT INTO docket_meta (id, schema_version) VALUES (1, ?1)",
            params![SCHEMA_VERSION],
        )?;
        Self::save_holidays(&tx, docket.holidays())?;
        Self::save_records(&tx, docket)?;
        tx.commit()?;
        Ok(())
    }

    fn load_docket(&self) -> PersistenceResult<Option<Docket>> {
        let conn = self.lock()?;

        let version: Option<i64> = conn
            .query_row(
                "SELECT schema_version FROM docket_meta WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let Some(version) = version else {
            return Ok(None);
        };
        if version != SCHEMA_VERSION {
            return Err(PersistenceError::InvalidData(format!(
                "unsupported schema version {version}"
            )));
        }

        let holidays = Self::load_holidays(&conn)?;
        let cases: Vec<Case> =
            Self::load_json_rows(&conn, "SELECT case_json FROM cases ORDER BY id ASC")?;
        let deadlines: Vec<Deadline> =
            Self::load_json_rows(&conn, "SELECT deadline_json FROM deadlines ORDER BY id ASC")?;
        let reminders: Vec<Reminder> =
            Self::load_json_rows(&conn, "SELECT reminder_json FROM reminders ORDER BY id ASC")?;

        let docket =
            Docket::from_records(self.config.clone(), holidays, cases, deadlines, reminders)?;
        Ok(Some(docket))
    }
}
