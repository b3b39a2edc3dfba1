//! Record types persisted by the docket store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::scheduling::DeadlineSpec;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Active,
    Archived,
    Closed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Active => "active",
            CaseStatus::Archived => "archived",
            CaseStatus::Closed => "closed",
        }
    }
}

impl FromStr for CaseStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(CaseStatus::Active),
            "archived" => Ok(CaseStatus::Archived),
            "closed" => Ok(CaseStatus::Closed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: i32,
    pub user_id: String,
    pub case_number: String,
    pub case_name: String,
    #[serde(default)]
    pub court: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: CaseStatus,
}

impl Case {
    pub fn new(
        id: i32,
        user_id: impl Into<String>,
        case_number: impl Into<String>,
        case_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            case_number: case_number.into(),
            case_name: case_name.into(),
            court: String::new(),
            client_name: String::new(),
            description: None,
            status: CaseStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CaseStatus::Active
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineType {
    Filing,
    Hearing,
    Response,
    Appeal,
    #[default]
    Other,
}

impl DeadlineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadlineType::Filing => "filing",
            DeadlineType::Hearing => "hearing",
            DeadlineType::Response => "response",
            DeadlineType::Appeal => "appeal",
            DeadlineType::Other => "other",
        }
    }

    pub fn variants() -> &'static [(&'static str, &'static str)] {
        &[
            ("filing", "Filing of briefs or pleadings"),
            ("hearing", "Court hearing"),
            ("response", "Response to a motion or complaint"),
            ("appeal", "Appeal window"),
            ("other", "Anything else"),
        ]
    }
}

impl fmt::Display for DeadlineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeadlineType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "filing" => Ok(DeadlineType::Filing),
            "hearing" => Ok(DeadlineType::Hearing),
            "response" => Ok(DeadlineType::Response),
            "appeal" => Ok(DeadlineType::Appeal),
            "other" => Ok(DeadlineType::Other),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    pub id: i32,
    pub case_id: i32,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub deadline_type: DeadlineType,
    pub start_date: NaiveDate,
    pub business_days: i64,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<NaiveDate>,
}

impl Deadline {
    pub fn is_active(&self) -> bool {
        !self.is_completed
    }

    /// The calculation this deadline's due date came from, against `holidays`.
    pub fn spec(&self, holidays: HashSet<NaiveDate>) -> DeadlineSpec {
        DeadlineSpec {
            start_date: self.start_date,
            required_business_days: self.business_days,
            holidays,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i32,
    pub deadline_id: i32,
    pub user_id: String,
    pub days_before: i64,
    pub reminder_date: NaiveDate,
    #[serde(default)]
    pub is_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_on: Option<NaiveDate>,
}
