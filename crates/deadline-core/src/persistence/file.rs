use super::{PersistenceError, PersistenceResult};
use crate::{
    Docket, DocketConfig,
    dates::{format_iso_date, parse_iso_date},
    holiday::{Holiday, HolidayScope},
    records::{Case, Deadline, Reminder},
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

#[derive(Serialize, Deserialize)]
struct DocketSnapshot {
    #[serde(default)]
    holidays: Vec<Holiday>,
    #[serde(default)]
    cases: Vec<Case>,
    #[serde(default)]
    deadlines: Vec<Deadline>,
    #[serde(default)]
    reminders: Vec<Reminder>,
}

impl DocketSnapshot {
    fn from_docket(docket: &Docket) -> PersistenceResult<Self> {
        docket.validate()?;
        Ok(Self {
            holidays: docket.holidays().to_vec(),
            cases: docket.cases().cloned().collect(),
            deadlines: docket.deadlines().cloned().collect(),
            reminders: docket.reminders().cloned().collect(),
        })
    }

    fn into_docket(self, config: DocketConfig) -> PersistenceResult<Docket> {
        Ok(Docket::from_records(
            config,
            self.holidays,
            self.cases,
            self.deadlines,
            self.reminders,
        )?)
    }
}

pub fn save_docket_to_json<P: AsRef<Path>>(docket: &Docket, path: P) -> PersistenceResult<()> {
    let snapshot = DocketSnapshot::from_docket(docket)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

/// Loads a snapshot written by [`save_docket_to_json`]; runtime settings come from `config`.
pub fn load_docket_from_json<P: AsRef<Path>>(
    path: P,
    config: DocketConfig,
) -> PersistenceResult<Docket> {
    let file = File::open(path)?;
    let snapshot: DocketSnapshot = serde_json::from_reader(file)?;
    snapshot.into_docket(config)
}

#[derive(Default, Serialize, Deserialize)]
struct HolidayCsvRecord {
    date: String,
    name: String,
    scope: String,
    #[serde(default)]
    owner: String,
}

impl From<&Holiday> for HolidayCsvRecord {
    fn from(holiday: &Holiday) -> Self {
        Self {
            date: format_iso_date(holiday.date),
            name: holiday.name.clone(),
            scope: holiday.scope.as_str().to_string(),
            owner: holiday.owner.clone().unwrap_or_default(),
        }
    }
}

impl TryFrom<HolidayCsvRecord> for Holiday {
    type Error = PersistenceError;

    fn try_from(record: HolidayCsvRecord) -> Result<Self, Self::Error> {
        let date = parse_iso_date(record.date.trim())
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
        let scope = HolidayScope::from_str(record.scope.trim()).map_err(|_| {
            PersistenceError::InvalidData(format!(
                "unknown holiday scope '{}' for {}",
                record.scope, record.date
            ))
        })?;
        let owner = Some(record.owner.trim())
            .filter(|owner| !owner.is_empty())
            .map(ToOwned::to_owned);
        Ok(Holiday {
            date,
            name: record.name.trim().to_string(),
            scope,
            owner,
        })
    }
}

/// Writes `date,name,scope,owner` rows, one per holiday.
pub fn save_holidays_to_csv<P: AsRef<Path>>(
    holidays: &[Holiday],
    path: P,
) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for holiday in holidays {
        writer.serialize(HolidayCsvRecord::from(holiday))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_holidays_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Holiday>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut holidays = Vec::new();
    for record in reader.deserialize::<HolidayCsvRecord>() {
        holidays.push(Holiday::try_from(record?)?);
    }
    Ok(holidays)
}
