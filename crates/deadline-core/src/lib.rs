pub mod calculations;
pub mod calendar;
pub mod config;
pub mod dates;
pub mod docket;
pub mod error;
pub mod holiday;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod notifier;
pub mod persistence;
pub(crate) mod record_validation;
pub mod records;
pub mod scheduling;
pub mod sync;
pub mod urgency;

pub use calculations::business_days::{
    DEFAULT_MAX_SCAN_DAYS, add_business_days, count_business_days, subtract_business_days,
};
pub use calendar::{HolidayCalendar, HolidayCalendarConfig, is_business_day};
pub use config::{ConfigError, DocketConfig, NotificationSettings};
pub use dates::{format_iso_date, parse_iso_date};
pub use docket::{
    Docket, DocketError, DocketStats, NewDeadline, RefreshSummary, ScheduledDeadline,
    UpcomingDeadline,
};
pub use error::{DeadlineError, DeadlineResult};
pub use holiday::{Holiday, HolidayScope, HolidaySource, effective_holidays};
pub use notifier::{
    DispatchSummary, Notifier, NotifyError, Recipient, ReminderNotice, TracingNotifier,
    dispatch_due_reminders,
};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteDocketStore;
pub use persistence::{
    DocketStore, PersistenceError, load_docket_from_json, load_holidays_from_csv,
    save_docket_to_json, save_holidays_to_csv,
};
pub use records::{Case, CaseStatus, Deadline, DeadlineType, Reminder};
pub use scheduling::{
    ComputedDeadline, DeadlineSpec, ReminderDate, generate_reminders, plan_reminders,
    schedule_deadline,
};
pub use sync::{CalendarSync, CalendarSyncRequest, SyncError, sync_deadline};
pub use urgency::{UrgencyTier, classify, days_until, days_until_at};
