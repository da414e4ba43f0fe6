use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::auth::Role;

// ==============================================================================
// CALENDAR PRIMITIVES
// ==============================================================================

/// Time of day of a bookable slot, always rendered as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(SlotTime)
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        if value.len() != 5 {
            return Err(format!("Invalid time '{}', expected HH:MM", value));
        }
        NaiveTime::parse_from_str(value, "%H:%M")
            .map(SlotTime)
            .map_err(|_| format!("Invalid time '{}', expected HH:MM", value))
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for SlotTime {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SlotTime::parse(value)
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        SlotTime::parse(&value).map_err(serde::de::Error::custom)
    }
}

/// Parses a `YYYY-MM-DD` string as a plain calendar date. No timezone is involved.
pub fn parse_calendar_date(value: &str) -> Result<NaiveDate, String> {
    if value.len() != 10 {
        return Err(format!("Invalid date '{}', expected YYYY-MM-DD", value));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

/// 0 = Sunday ... 6 = Saturday.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

// ==============================================================================
// USERS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub full_name: String,
    pub phone: Option<String>,
    pub zip_code: Option<String>,
    pub address: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub private_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(username: &str, full_name: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            role,
            full_name: full_name.to_string(),
            phone: None,
            zip_code: None,
            address: None,
            number: None,
            complement: None,
            neighborhood: None,
            city: None,
            state: None,
            private_notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> ClientSummary {
        ClientSummary {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Identity summary attached to appointments. Never carries private notes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub phone: Option<String>,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Scheduled,
    Declined,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Declined => "declined",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and scheduled appointments occupy their slot.
    pub fn occupies_slot(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Scheduled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Declined | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(AppointmentStatus::Pending),
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "declined" => Ok(AppointmentStatus::Declined),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("Unknown appointment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Newest first by (date, time).
    pub fn newest_first(a: &Appointment, b: &Appointment) -> std::cmp::Ordering {
        (b.date, b.time).cmp(&(a.date, a.time))
    }
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client_id: Uuid,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentWithClient {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub client: Option<ClientSummary>,
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityRule {
    pub day_of_week: u8, // 0 = Sunday, 1 = Monday, etc.
    pub times: Vec<SlotTime>,
    pub is_active: bool,
}
