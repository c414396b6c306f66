//! Employee-record accessors.
//!
//! Read-only projections over [`EmployeeRecord`] that turn raw mapped
//! fields into user-facing answers. Every accessor has an answer for
//! missing data ("Not specified", "information not available") — absence
//! is an answer here, not an error.

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::context::EmployeeRecord;

/// ERP date format used across employee fields.
pub const ERP_DATE_FORMAT: &str = "%d-%b-%Y";

const NOT_SPECIFIED: &str = "Not specified";

/// Borrowing view over an employee record.
pub struct EmployeeInfo<'a> {
    emp: &'a EmployeeRecord,
}

/// Profile card returned by [`EmployeeInfo::summary`].
#[derive(Debug, Serialize)]
pub struct EmployeeSummary {
    pub name: String,
    pub job_title: String,
    pub department: String,
    pub joining_date: String,
    pub years_of_service: Option<i64>,
    pub contract_type: String,
    pub leave_policy: String,
    pub shift: String,
    pub manager: String,
}

fn or_not_specified(value: &str) -> String {
    if value.trim().is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        value.to_string()
    }
}

impl<'a> EmployeeInfo<'a> {
    pub fn new(emp: &'a EmployeeRecord) -> Self {
        Self { emp }
    }

    pub fn full_name(&self) -> String {
        let name = self.emp.name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        let combined = format!("{} {}", self.emp.first_name, self.emp.last_name);
        or_not_specified(combined.trim())
    }

    /// Manager can arrive under several mapped names depending on the
    /// upstream extract; the first non-empty one wins.
    pub fn manager(&self) -> String {
        [
            &self.emp.manager_name,
            &self.emp.reporting_to,
            &self.emp.manager,
        ]
        .into_iter()
        .find(|v| !v.trim().is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string())
    }

    pub fn job_title(&self) -> String {
        or_not_specified(&self.emp.job_title)
    }

    pub fn department(&self) -> String {
        or_not_specified(&self.emp.department)
    }

    pub fn joining_date(&self) -> String {
        or_not_specified(&self.emp.doj)
    }

    /// Shift may be mapped as `shift` or `shift_name`.
    pub fn shift(&self) -> String {
        if !self.emp.shift.trim().is_empty() {
            return self.emp.shift.clone();
        }
        or_not_specified(&self.emp.shift_name)
    }

    pub fn rp_number(&self) -> String {
        or_not_specified(&self.emp.rp_number)
    }

    pub fn leave_policy(&self) -> String {
        or_not_specified(&self.emp.leave_policy)
    }

    pub fn years_of_service(&self) -> Option<i64> {
        self.years_of_service_on(Local::now().date_naive())
    }

    pub fn years_of_service_on(&self, today: NaiveDate) -> Option<i64> {
        let joined = NaiveDate::parse_from_str(self.emp.doj.trim(), ERP_DATE_FORMAT).ok()?;
        Some((today - joined).num_days() / 365)
    }

    pub fn probation_status(&self) -> String {
        self.probation_status_on(Local::now().date_naive())
    }

    /// Probation is a date-window check over `probation_end`. An absent
    /// or unparseable date is reported, not guessed.
    pub fn probation_status_on(&self, today: NaiveDate) -> String {
        let raw = self.emp.probation_end.trim();
        if raw.is_empty() {
            return "Probation information not available.".to_string();
        }
        match NaiveDate::parse_from_str(raw, ERP_DATE_FORMAT) {
            Ok(end) if today < end => format!("You are on probation until {raw}."),
            Ok(_) => format!("You are not on probation. Probation ended on {raw}."),
            Err(_) => "Probation date format invalid.".to_string(),
        }
    }

    pub fn accommodation(&self) -> String {
        if self.emp.accommodation_eligible {
            "You are eligible for company accommodation.".to_string()
        } else {
            "You are not eligible for company accommodation.".to_string()
        }
    }

    pub fn summary(&self) -> EmployeeSummary {
        EmployeeSummary {
            name: self.full_name(),
            job_title: self.job_title(),
            department: self.department(),
            joining_date: self.joining_date(),
            years_of_service: self.years_of_service(),
            contract_type: or_not_specified(&self.emp.contract_type),
            leave_policy: self.leave_policy(),
            shift: self.shift(),
            manager: self.manager(),
        }
    }
}
