//! Typed employee context: the mapped, per-employee record consumed by
//! the structured accessors.
//!
//! The context file is produced upstream (ERP extraction + mapping) and
//! read here as-is. Missing fields default to empty so accessors can
//! answer "not specified" instead of failing.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A structured accessor failed: the context is missing or malformed.
#[derive(Debug, thiserror::Error)]
pub enum AccessorError {
    #[error("malformed employee context: {0}")]
    Malformed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeRecord {
    #[serde(default)]
    pub emp_id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub sponsor: String,
    /// Joining date, ERP format `%d-%b-%Y` (e.g. "15-Mar-2021").
    #[serde(default)]
    pub doj: String,
    #[serde(default)]
    pub contract_type: String,
    #[serde(default)]
    pub family_status: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub leave_policy: String,
    #[serde(default)]
    pub shift: String,
    #[serde(default)]
    pub shift_name: String,
    #[serde(default)]
    pub rp_number: String,
    #[serde(default)]
    pub manager_name: String,
    #[serde(default)]
    pub reporting_to: String,
    #[serde(default)]
    pub manager: String,
    /// Probation end date, ERP format `%d-%b-%Y`; empty when unknown.
    #[serde(default)]
    pub probation_end: String,
    #[serde(default)]
    pub accommodation_eligible: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveType {
    pub code: String,
    pub desc: String,
    #[serde(default)]
    pub attach_required: bool,
    #[serde(default)]
    pub self_service: bool,
    #[serde(default)]
    pub anniv_date: String,
    #[serde(default)]
    pub eligibility_on_workdays: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveBalance {
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub eligible: f64,
    #[serde(default)]
    pub air_ticket: bool,
    #[serde(default)]
    pub air_ticket_percent: f64,
    #[serde(default)]
    pub anniv_date: String,
    #[serde(default)]
    pub allow_half_day: bool,
    #[serde(default)]
    pub max_days: i64,
}

/// The full per-employee record: identity fields, the leave-type catalog
/// applicable to this employee, and balances keyed by leave code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeContext {
    pub employee: EmployeeRecord,
    #[serde(default)]
    pub leave_types: Vec<LeaveType>,
    #[serde(default)]
    pub leave_balances: BTreeMap<String, LeaveBalance>,
}

impl EmployeeContext {
    pub fn from_json(raw: &str) -> Result<Self, AccessorError> {
        serde_json::from_str(raw).map_err(|e| AccessorError::Malformed(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, AccessorError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}
