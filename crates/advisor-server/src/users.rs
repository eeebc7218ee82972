//! In-memory user registry

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stock_advisor::{AdvisorError, Result, UserDirectory};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub salary: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub salary: Option<Decimal>,
}

/// In-memory user store (for development)
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
    by_email: RwLock<HashMap<String, Uuid>>,
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> AdvisorError {
    AdvisorError::upstream("user store", "lock poisoned")
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            by_email: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, new_user: NewUser) -> Result<User> {
        let email = new_user.email.trim().to_lowercase();
        let name = new_user.name.trim().to_string();

        if !email.contains('@') {
            return Err(AdvisorError::InvalidInput(format!("invalid email '{}'", email)));
        }
        if name.is_empty() {
            return Err(AdvisorError::InvalidInput("name must not be empty".into()));
        }
        if new_user.salary.is_some_and(|s| s <= Decimal::ZERO) {
            return Err(AdvisorError::InvalidInput("salary must be a positive amount".into()));
        }

        let mut users = self.users.write().map_err(poisoned)?;
        let mut by_email = self.by_email.write().map_err(poisoned)?;

        if by_email.contains_key(&email) {
            return Err(AdvisorError::InvalidInput(format!("{} is already registered", email)));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.clone(),
            name,
            salary: new_user.salary,
            created_at: Utc::now(),
        };
        by_email.insert(email, user.id);
        users.insert(user.id, user.clone());

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    pub fn get(&self, id: &str) -> Result<Option<User>> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(&id).cloned())
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }
}

impl UserDirectory for MemoryUserStore {
    fn salary_for(&self, user_id: &str) -> Result<Option<Decimal>> {
        self.get(user_id)?
            .map(|user| user.salary)
            .ok_or_else(|| AdvisorError::NotFound(format!("user {}", user_id)))
    }
}
