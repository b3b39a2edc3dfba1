use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::dates::parse_iso_date;
use crate::docket::{
    DocketError, DocketStats, RefreshSummary, ScheduledDeadline, UpcomingDeadline,
};
use crate::scheduling::{DeadlineSpec, ReminderDate, plan_reminders, schedule_deadline_with_limit};
use crate::urgency::describe_days_until;
use crate::{
    Case, Deadline, DeadlineError, DeadlineType, Docket, Holiday, HolidayScope, NewDeadline,
    Reminder, UrgencyTier,
};

pub const USER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    docket: Arc<RwLock<Docket>>,
}

impl AppState {
    pub fn new(docket: Docket) -> Self {
        Self {
            docket: Arc::new(RwLock::new(docket)),
        }
    }

    fn docket(&self) -> Arc<RwLock<Docket>> {
        self.docket.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Forbidden(String),
    Conflict(String),
    Invalid(String),
    Unprocessable(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<DeadlineError> for ApiError {
    fn from(value: DeadlineError) -> Self {
        match value {
            DeadlineError::InvalidInput(_) => ApiError::Invalid(value.to_string()),
            DeadlineError::DegenerateCalendar { .. } => ApiError::Unprocessable(value.to_string()),
        }
    }
}

impl From<DocketError> for ApiError {
    fn from(value: DocketError) -> Self {
        match value {
            DocketError::Deadline(err) => ApiError::from(err),
            DocketError::NotFound { .. } => ApiError::NotFound(value.to_string()),
            DocketError::Forbidden { .. } => ApiError::Forbidden(value.to_string()),
            DocketError::Conflict { .. }
            | DocketError::CaseNotActive(_)
            | DocketError::AlreadyCompleted(_) => ApiError::Conflict(value.to_string()),
            DocketError::Invalid(_) => ApiError::Invalid(value.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, "forbidden", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Unprocessable(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "degenerate_calendar", message)
            }
        };
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            warn!(%status, %message, "request failed");
        }
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct TodayQuery {
    today: Option<String>,
}

impl TodayQuery {
    /// Falls back to the server's local date; the core itself never reads a clock.
    fn resolve(&self) -> Result<NaiveDate, ApiError> {
        match self.today.as_deref() {
            Some(raw) => Ok(parse_iso_date(raw)?),
            None => Ok(Local::now().date_naive()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CalculatePayload {
    start_date: String,
    business_days: i64,
    #[serde(default)]
    holidays: Vec<String>,
    #[serde(default)]
    today: Option<String>,
    #[serde(default)]
    reminder_offsets: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct CalculateResponse {
    due_date: NaiveDate,
    days_until_due: i64,
    urgency: UrgencyTier,
    reminders: Vec<ReminderDate>,
}

#[derive(Debug, Deserialize)]
struct ReminderPreviewPayload {
    due_date: String,
    offsets: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct HolidayPayload {
    date: String,
    name: String,
    scope: HolidayScope,
}

#[derive(Debug, Deserialize)]
struct CreateDeadlinePayload {
    case_id: i32,
    title: String,
    #[serde(default)]
    deadline_type: DeadlineType,
    start_date: String,
    business_days: i64,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    reminder_offsets: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
struct DeadlineDetail {
    deadline: Deadline,
    reminders: Vec<Reminder>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/calculate", post(calculate))
        .route("/reminders/preview", post(preview_reminders))
        .route("/reminders/due", get(due_reminders))
        .route("/urgency/:days", get(urgency))
        .route("/holidays", get(list_holidays).post(create_holiday))
        .route("/cases", get(list_cases).post(create_case))
        .route("/deadlines", get(list_deadlines).post(create_deadline))
        .route("/deadlines/:id", get(get_deadline).delete(delete_deadline))
        .route("/deadlines/:id/complete", post(complete_deadline))
        .route("/stats", get(stats))
        .route("/refresh", post(refresh))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, docket: Docket) -> std::io::Result<()> {
    let state = AppState::new(docket);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "deadline HTTP API listening");
    axum::serve(listener, app).await
}

fn user_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| ApiError::invalid(format!("missing {USER_HEADER} header")))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn calculate(
    State(state): State<AppState>,
    Json(payload): Json<CalculatePayload>,
) -> Result<Json<CalculateResponse>, ApiError> {
    let start_date = parse_iso_date(&payload.start_date)?;
    let holidays = payload
        .holidays
        .iter()
        .map(|raw| parse_iso_date(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let today = TodayQuery {
        today: payload.today.clone(),
    }
    .resolve()?;

    let max_scan_days = state.docket().read().config().max_scan_days;
    let spec = DeadlineSpec::new(start_date, payload.business_days, holidays);
    let computed = schedule_deadline_with_limit(&spec, today, max_scan_days)?;
    let reminders = plan_reminders(computed.due_date, &payload.reminder_offsets)?;
    Ok(Json(CalculateResponse {
        due_date: computed.due_date,
        days_until_due: computed.days_until_due,
        urgency: computed.urgency(),
        reminders,
    }))
}

async fn preview_reminders(
    Json(payload): Json<ReminderPreviewPayload>,
) -> Result<Json<Vec<ReminderDate>>, ApiError> {
    let due_date = parse_iso_date(&payload.due_date)?;
    Ok(Json(plan_reminders(due_date, &payload.offsets)?))
}

async fn urgency(Path(days): Path<i64>) -> impl IntoResponse {
    let tier = UrgencyTier::classify(days);
    Json(json!({
        "days_until": days,
        "urgency": tier,
        "label": describe_days_until(days),
    }))
}

async fn list_holidays(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Holiday>>, ApiError> {
    let user = user_id(&headers)?;
    let docket = state.docket();
    let holidays: Vec<Holiday> = {
        let guard = docket.read();
        guard.holidays_for(&user).into_iter().cloned().collect()
    };
    Ok(Json(holidays))
}

async fn create_holiday(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<HolidayPayload>,
) -> Result<(StatusCode, Json<Holiday>), ApiError> {
    let user = user_id(&headers)?;
    let date = parse_iso_date(&payload.date)?;
    let holiday = match payload.scope {
        HolidayScope::National => Holiday::national(date, payload.name),
        HolidayScope::Personal => Holiday::personal(date, payload.name, user),
    };
    let docket = state.docket();
    let refreshed = {
        let mut guard = docket.write();
        guard.apply_holiday(holiday.clone())?
    };
    let status = match refreshed {
        Some(summary) => {
            info!(
                date = %holiday.date,
                rescheduled = summary.rescheduled.len(),
                "holiday applied"
            );
            StatusCode::CREATED
        }
        None => StatusCode::OK,
    };
    Ok((status, Json(holiday)))
}

async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshSummary>, ApiError> {
    let docket = state.docket();
    let summary = docket.write().refresh()?;
    Ok(Json(summary))
}

async fn list_cases(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Case>>, ApiError> {
    let user = user_id(&headers)?;
    let docket = state.docket();
    let cases: Vec<Case> = {
        let guard = docket.read();
        guard.cases_for(&user).into_iter().cloned().collect()
    };
    Ok(Json(cases))
}

async fn create_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(case): Json<Case>,
) -> Result<(StatusCode, Json<Case>), ApiError> {
    let user = user_id(&headers)?;
    if case.user_id != user {
        return Err(ApiError::invalid(
            "case user_id in payload does not match the requesting user",
        ));
    }
    let docket = state.docket();
    {
        let mut guard = docket.write();
        guard.add_case(case.clone())?;
    }
    Ok((StatusCode::CREATED, Json(case)))
}

async fn list_deadlines(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TodayQuery>,
) -> Result<Json<Vec<UpcomingDeadline>>, ApiError> {
    let user = user_id(&headers)?;
    let today = query.resolve()?;
    let docket = state.docket();
    let upcoming = {
        let guard = docket.read();
        guard.upcoming(&user, today)
    };
    Ok(Json(upcoming))
}

async fn create_deadline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TodayQuery>,
    Json(payload): Json<CreateDeadlinePayload>,
) -> Result<(StatusCode, Json<ScheduledDeadline>), ApiError> {
    let user = user_id(&headers)?;
    let today = query.resolve()?;
    let start_date = parse_iso_date(&payload.start_date)?;
    let new = NewDeadline {
        case_id: payload.case_id,
        user_id: user,
        title: payload.title,
        deadline_type: payload.deadline_type,
        start_date,
        business_days: payload.business_days,
        notes: payload.notes,
        reminder_offsets: payload.reminder_offsets,
    };
    let docket = state.docket();
    let scheduled = {
        let mut guard = docket.write();
        guard.create_deadline(new, today)?
    };
    Ok((StatusCode::CREATED, Json(scheduled)))
}

async fn get_deadline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(deadline_id): Path<i32>,
) -> Result<Json<DeadlineDetail>, ApiError> {
    let user = user_id(&headers)?;
    let docket = state.docket();
    let detail = {
        let guard = docket.read();
        let deadline = guard.deadline(deadline_id, &user)?.clone();
        let reminders = guard
            .reminders_for(deadline_id)
            .into_iter()
            .cloned()
            .collect();
        DeadlineDetail {
            deadline,
            reminders,
        }
    };
    Ok(Json(detail))
}

async fn delete_deadline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(deadline_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let user = user_id(&headers)?;
    let docket = state.docket();
    {
        let mut guard = docket.write();
        guard.delete_deadline(deadline_id, &user)?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn complete_deadline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(deadline_id): Path<i32>,
    Query(query): Query<TodayQuery>,
) -> Result<Json<Deadline>, ApiError> {
    let user = user_id(&headers)?;
    let today = query.resolve()?;
    let docket = state.docket();
    let completed = {
        let mut guard = docket.write();
        guard.complete_deadline(deadline_id, &user, today)?.clone()
    };
    Ok(Json(completed))
}

async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TodayQuery>,
) -> Result<Json<DocketStats>, ApiError> {
    let user = user_id(&headers)?;
    let today = query.resolve()?;
    let docket = state.docket();
    let stats = {
        let guard = docket.read();
        guard.stats(&user, today)
    };
    Ok(Json(stats))
}

async fn due_reminders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TodayQuery>,
) -> Result<Json<Vec<Reminder>>, ApiError> {
    let user = user_id(&headers)?;
    let today = query.resolve()?;
    let docket = state.docket();
    let reminders: Vec<Reminder> = {
        let guard = docket.read();
        guard
            .due_reminders(today)
            .into_iter()
            .filter(|reminder| reminder.user_id == user)
            .cloned()
            .collect()
    };
    Ok(Json(reminders))
}
