use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayScope {
    /// Applies to every user.
    National,
    /// Applies only to the owning user.
    Personal,
}

impl HolidayScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolidayScope::National => "national",
            HolidayScope::Personal => "personal",
        }
    }
}

impl fmt::Display for HolidayScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HolidayScope {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "national" => Ok(HolidayScope::National),
            "personal" | "user" => Ok(HolidayScope::Personal),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
    pub scope: HolidayScope,
    /// Owning user for personal holidays; ignored for national ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl Holiday {
    pub fn national(date: NaiveDate, name: impl Into<String>) -> Self {
        Self {
            date,
            name: name.into(),
            scope: HolidayScope::National,
            owner: None,
        }
    }

    pub fn personal(date: NaiveDate, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            date,
            name: name.into(),
            scope: HolidayScope::Personal,
            owner: Some(owner.into()),
        }
    }

    pub fn is_effective_for(&self, user_id: &str) -> bool {
        match self.scope {
            HolidayScope::National => true,
            HolidayScope::Personal => self.owner.as_deref() == Some(user_id),
        }
    }
}

/// Union of national holidays and the holidays owned by `user_id`.
pub fn effective_holidays<'a, I>(holidays: I, user_id: &str) -> HashSet<NaiveDate>
where
    I: IntoIterator<Item = &'a Holiday>,
{
    holidays
        .into_iter()
        .filter(|holiday| holiday.is_effective_for(user_id))
        .map(|holiday| holiday.date)
        .collect()
}

/// Anything that can yield the effective holiday dates for a user.
pub trait HolidaySource {
    fn effective_holidays(&self, user_id: &str) -> HashSet<NaiveDate>;
}

impl HolidaySource for [Holiday] {
    fn effective_holidays(&self, user_id: &str) -> HashSet<NaiveDate> {
        effective_holidays(self, user_id)
    }
}
