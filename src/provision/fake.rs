//! Recording database server for tests.

use std::cell::RefCell;
use std::rc::Rc;

use super::models::ConnectionConfig;
use super::server::{DatabaseServer, DbError, Session};

#[derive(Debug, Default)]
pub struct Journal {
    pub connects: usize,
    pub statements: Vec<String>,
    pub closes: usize,
}

/// Records everything the provisioner does; rejects names listed in `existing`
pub struct FakeServer {
    pub journal: Rc<RefCell<Journal>>,
    pub existing: Vec<String>,
    pub refuse_connect: bool,
}

impl FakeServer {
    pub fn new() -> Self {
        FakeServer {
            journal: Rc::new(RefCell::new(Journal::default())),
            existing: Vec::new(),
            refuse_connect: false,
        }
    }

    pub fn with_existing(name: &str) -> Self {
        let mut server = Self::new();
        server.existing.push(name.to_string());
        server
    }
}

pub struct FakeSession {
    pub journal: Rc<RefCell<Journal>>,
    pub existing: Vec<String>,
    pub panic_on_execute: bool,
}

impl DatabaseServer for FakeServer {
    fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn Session>, DbError> {
        if self.refuse_connect {
            return Err(DbError::Other("Can't connect to MySQL server".into()));
        }
        self.journal.borrow_mut().connects += 1;
        Ok(Box::new(FakeSession {
            journal: Rc::clone(&self.journal),
            existing: self.existing.clone(),
            panic_on_execute: false,
        }))
    }
}

impl Session for FakeSession {
    fn execute(&mut self, sql: &str) -> Result<u64, DbError> {
        if self.panic_on_execute {
            panic!("driver crashed");
        }
        self.journal.borrow_mut().statements.push(sql.to_string());
        let name = sql.trim_start_matches("CREATE DATABASE ").trim();
        if name.is_empty() {
            return Err(DbError::Other(
                "1064 (42000): You have an error in your SQL syntax".into(),
            ));
        }
        if self.existing.iter().any(|e| e == name) {
            return Err(DbError::Other(format!(
                "1007 (HY000): Can't create database '{name}'; database exists"
            )));
        }
        Ok(1)
    }

    fn close(self: Box<Self>) -> Result<(), DbError> {
        self.journal.borrow_mut().closes += 1;
        Ok(())
    }
}

pub fn config(name: Option<&str>) -> ConnectionConfig {
    ConnectionConfig::new(
        Some("db.internal".into()),
        Some("admin".into()),
        Some("secret".into()),
        name.map(str::to_string),
    )
}
