// users table: [id: INTEGER PRIMARY KEY][username: TEXT UNIQUE][password: TEXT]

use std::io::Write;

use clap::ValueEnum;
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::DemoError;

pub const SEED_USERS: [(&str, &str); 2] = [("admin", "admin123"), ("user", "user123")];

/// Which query builder the login uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LoginMode {
    /// Credentials formatted straight into the SQL text.
    Vulnerable,
    /// Credentials passed as bound parameters.
    #[default]
    Secure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Customer {
    pub id: u32,
    pub name: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
}

/// Records shown to a logged-in user.
pub const CUSTOMERS: [Customer; 3] = [
    Customer {
        id: 1,
        name: "John Doe",
        email: "john@example.com",
        phone: "123-456-7890",
    },
    Customer {
        id: 2,
        name: "Jane Smith",
        email: "jane@example.com",
        phone: "987-654-3210",
    },
    Customer {
        id: 3,
        name: "Alice Johnson",
        email: "alice@example.com",
        phone: "555-555-5555",
    },
];

pub struct UserDb {
    conn: Connection,
}

impl UserDb {
    /// Opens an in-memory database seeded with [`SEED_USERS`].
    pub fn open_seeded() -> Result<Self, DemoError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT UNIQUE,
                password TEXT
            )",
        )?;
        for (username, password) in SEED_USERS {
            conn.execute(
                "INSERT OR IGNORE INTO users (username, password) VALUES (?1, ?2)",
                params![username, password],
            )?;
        }
        Ok(Self { conn })
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
        })
    }

    /// Builds the query with `format!`. A quote in either field changes the
    /// statement, so `' OR '1'='1` matches every row.
    pub fn vulnerable_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, DemoError> {
        let query = format!(
            "SELECT * FROM users WHERE username='{}' AND password='{}'",
            username, password
        );
        let user = self
            .conn
            .query_row(&query, [], Self::row_to_user)
            .optional()?;
        Ok(user)
    }

    pub fn secure_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, DemoError> {
        let user = self
            .conn
            .query_row(
                "SELECT * FROM users WHERE username=?1 AND password=?2",
                params![username, password],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn login(
        &self,
        mode: LoginMode,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, DemoError> {
        debug!("login attempt for {:?} ({:?})", username, mode);
        match mode {
            LoginMode::Vulnerable => self.vulnerable_login(username, password),
            LoginMode::Secure => self.secure_login(username, password),
        }
    }
}

pub fn run_login<W: Write>(
    mode: LoginMode,
    username: &str,
    password: &str,
    writer: &mut W,
) -> Result<(), DemoError> {
    let db = UserDb::open_seeded()?;

    match db.login(mode, username, password)? {
        Some(user) => {
            writeln!(writer, "Logged in as {}", user.username)?;
            writeln!(writer, "Customers:")?;
            for customer in CUSTOMERS {
                writeln!(
                    writer,
                    "  {} | {} | {} | {}",
                    customer.id, customer.name, customer.email, customer.phone
                )?;
            }
        }
        None => {
            let label = match mode {
                LoginMode::Vulnerable => "Vulnerable",
                LoginMode::Secure => "Secure",
            };
            writeln!(writer, "{} Login Failed! Invalid credentials.", label)?;
        }
    }
    Ok(())
}
