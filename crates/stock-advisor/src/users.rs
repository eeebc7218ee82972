//! User Directory
//!
//! Lookup seam for registered users' salaries, so risk requests can name a
//! user instead of passing a salary.

use rust_decimal::Decimal;

use crate::error::{AdvisorError, Result};

pub trait UserDirectory: Send + Sync {
    /// `Ok(None)` if the user exists but has no salary on record;
    /// `NotFound` if the user does not exist
    fn salary_for(&self, user_id: &str) -> Result<Option<Decimal>>;
}

/// Pick the salary for a risk request.
///
/// An explicit salary wins over the directory; one of the two is required.
pub fn resolve_salary(
    directory: &dyn UserDirectory,
    salary: Option<Decimal>,
    user_id: Option<&str>,
) -> Result<Decimal> {
    let salary = match (salary, user_id) {
        (Some(salary), _) => salary,
        (None, Some(user_id)) => directory.salary_for(user_id)?.ok_or_else(|| {
            AdvisorError::InvalidInput(format!("user {} has no salary on record", user_id))
        })?,
        (None, None) => {
            return Err(AdvisorError::InvalidInput(
                "salary or user_id query parameter is required".into(),
            ));
        }
    };

    if salary <= Decimal::ZERO {
        return Err(AdvisorError::InvalidInput("salary must be a positive amount".into()));
    }
    Ok(salary)
}
