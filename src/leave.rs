//! Leave-policy and leave-balance accessors.
//!
//! Read-only projections over the employee's leave catalog and balances.
//! A leave type can be referenced by code ("AL") or by description
//! ("annual leave"); resolution is case-insensitive and tolerant of the
//! type name appearing inside a longer sentence. An unknown type or a
//! zero balance is a "not applicable" answer, not an error.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::{AccessorError, EmployeeContext, LeaveBalance, LeaveType};
use crate::employee::ERP_DATE_FORMAT;

/// Borrowing view over the employee's leave catalog and balances.
pub struct LeaveInfo<'a> {
    ctx: &'a EmployeeContext,
}

static CODE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{2,5}\b").expect("static regex"));

impl<'a> LeaveInfo<'a> {
    /// Build the view, rejecting a context whose leave catalog carries
    /// duplicate codes — balances are keyed by code, so duplicates make
    /// every lookup ambiguous.
    pub fn new(ctx: &'a EmployeeContext) -> Result<Self, AccessorError> {
        for (i, lt) in ctx.leave_types.iter().enumerate() {
            if ctx.leave_types[..i].iter().any(|other| other.code == lt.code) {
                return Err(AccessorError::Malformed(format!(
                    "duplicate leave type code '{}'",
                    lt.code
                )));
            }
        }
        Ok(Self { ctx })
    }

    pub fn type_count(&self) -> usize {
        self.ctx.leave_types.len()
    }

    /// Leave type descriptions in catalog order.
    pub fn type_names(&self) -> Vec<String> {
        self.ctx.leave_types.iter().map(|lt| lt.desc.clone()).collect()
    }

    /// The only leave type this employee has, if there is exactly one.
    pub fn sole_type(&self) -> Option<&'a LeaveType> {
        match self.ctx.leave_types.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Resolve a leave type from a code or a description fragment.
    pub fn resolve(&self, query: &str) -> Option<&'a LeaveType> {
        let code = query.trim().to_uppercase();
        if let Some(lt) = self.ctx.leave_types.iter().find(|lt| lt.code == code) {
            return Some(lt);
        }
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return None;
        }
        self.ctx
            .leave_types
            .iter()
            .find(|lt| lt.desc.to_lowercase().contains(&q))
    }

    /// Find every leave type mentioned inside free text. Descriptions
    /// match case-insensitively as substrings; codes only as standalone
    /// uppercase words, so "annual" never reads as the code "AL".
    pub fn detect_in_text(&self, text: &str) -> Vec<&'a LeaveType> {
        let lowered = text.to_lowercase();
        let code_words: Vec<&str> = CODE_WORD.find_iter(text).map(|m| m.as_str()).collect();

        self.ctx
            .leave_types
            .iter()
            .filter(|lt| {
                lowered.contains(&lt.desc.to_lowercase())
                    || code_words.iter().any(|w| *w == lt.code)
            })
            .collect()
    }

    fn balance(&self, code: &str) -> Option<&'a LeaveBalance> {
        self.ctx.leave_balances.get(code)
    }

    pub fn balance_of(&self, lt: &LeaveType) -> String {
        match self.balance(&lt.code) {
            Some(info) => format!("{}: {} days", lt.desc, info.balance),
            None => format!("No balance record for {}.", lt.desc),
        }
    }

    /// One line per leave type with a positive balance.
    pub fn balances_summary(&self) -> String {
        let lines: Vec<String> = self
            .ctx
            .leave_types
            .iter()
            .filter_map(|lt| {
                let info = self.balance(&lt.code)?;
                (info.balance > 0.0).then(|| format!("{}: {} days", lt.desc, info.balance))
            })
            .collect();

        if lines.is_empty() {
            "You have no leave balance in any type.".to_string()
        } else {
            format!("Your leave balances:\n{}", lines.join("\n"))
        }
    }

    /// Can-apply check, with an alternative suggested when the balance
    /// is exhausted.
    pub fn can_apply(&self, lt: &LeaveType) -> String {
        match self.balance(&lt.code) {
            Some(info) if info.balance > 0.0 => {
                format!(
                    "You can apply for {}. Your balance: {} days.",
                    lt.desc, info.balance
                )
            }
            _ => {
                let refusal = format!("You do not have sufficient balance for {}.", lt.desc);
                match self.alternative_to(&lt.code) {
                    Some(alt) => format!("{refusal} Consider applying for {alt} instead."),
                    None => refusal,
                }
            }
        }
    }

    fn alternative_to(&self, code: &str) -> Option<String> {
        self.ctx
            .leave_types
            .iter()
            .filter(|lt| lt.code != code)
            .find(|lt| {
                self.balance(&lt.code)
                    .map(|info| info.balance > 0.0)
                    .unwrap_or(false)
            })
            .map(|lt| lt.desc.clone())
    }

    pub fn air_ticket_of(&self, lt: &LeaveType) -> String {
        match self.balance(&lt.code) {
            Some(info) if info.air_ticket => format!(
                "Air ticket is granted with {} ({}%).",
                lt.desc, info.air_ticket_percent
            ),
            Some(_) => format!("Air ticket is NOT granted with {}.", lt.desc),
            None => format!("No balance record for {}.", lt.desc),
        }
    }

    /// All air-ticket-granting leave types, in catalog order.
    pub fn all_air_ticket_leaves(&self) -> String {
        let lines: Vec<String> = self
            .ctx
            .leave_types
            .iter()
            .filter_map(|lt| {
                let info = self.balance(&lt.code)?;
                info.air_ticket.then(|| {
                    format!("{} ({}): {}%", lt.desc, lt.code, info.air_ticket_percent)
                })
            })
            .collect();

        if lines.is_empty() {
            "No leaves grant air ticket.".to_string()
        } else {
            format!("Leaves eligible for air ticket:\n{}", lines.join("\n"))
        }
    }

    /// Leave types that may be applied on workdays, in catalog order.
    pub fn workday_types(&self) -> String {
        let lines: Vec<String> = self
            .ctx
            .leave_types
            .iter()
            .filter(|lt| lt.eligibility_on_workdays)
            .map(|lt| format!("{} ({})", lt.desc, lt.code))
            .collect();

        if lines.is_empty() {
            "No leave types can be applied on workdays.".to_string()
        } else {
            format!("Leaves you can apply on workdays:\n{}", lines.join("\n"))
        }
    }

    pub fn attachment_of(&self, lt: &LeaveType) -> String {
        if lt.attach_required {
            format!("{} requires an attachment.", lt.desc)
        } else {
            format!("{} does NOT require an attachment.", lt.desc)
        }
    }

    pub fn self_service_of(&self, lt: &LeaveType) -> String {
        if lt.self_service {
            format!("{} can be applied by self-service.", lt.desc)
        } else {
            format!("{} requires manager processing.", lt.desc)
        }
    }

    pub fn next_eligible(&self, lt: &LeaveType) -> String {
        self.next_eligible_on(lt, Local::now().date_naive())
    }

    /// When the employee can next apply: now if there is balance, after
    /// the anniversary date if one lies ahead, otherwise not eligible.
    pub fn next_eligible_on(&self, lt: &LeaveType, today: NaiveDate) -> String {
        let info = match self.balance(&lt.code) {
            Some(info) => info,
            None => return format!("No balance record for {}.", lt.desc),
        };

        if info.balance > 0.0 {
            return format!("You can apply for {} immediately.", lt.desc);
        }

        let anniv = info.anniv_date.trim();
        if let Ok(date) = NaiveDate::parse_from_str(anniv, ERP_DATE_FORMAT) {
            if date > today {
                return format!("You can apply for {} after {}.", lt.desc, anniv);
            }
        }

        format!("You are not eligible for {} at the moment.", lt.desc)
    }
}
