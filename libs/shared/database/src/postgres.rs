use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::auth::Role;
use shared_models::scheduling::{
    Appointment, AppointmentStatus, AppointmentWithClient, AvailabilityRule, ClientSummary,
    NewAppointment, SlotTime, UserProfile,
};

use crate::error::{StoreError, StoreResult};
use crate::store::{join_note, SchedulingStore};

const USER_COLUMNS: &str = "id, username, role, full_name, phone, zip_code, address, number, \
     complement, neighborhood, city, state, private_notes, created_at";

const APPOINTMENT_COLUMNS: &str = "a.id, a.client_id, a.date, a.time, a.notes, a.status, a.created_at";

const CLIENT_COLUMNS: &str =
    "u.id AS client_user_id, u.username AS client_username, u.full_name AS client_full_name, u.phone AS client_phone";

#[derive(Debug, Clone)]
pub struct PgSchedulingStore {
    pool: PgPool,
}

impl PgSchedulingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name).map_err(StoreError::Query)
}

fn user_from_row(row: &PgRow) -> StoreResult<UserProfile> {
    let role: String = column(row, "role")?;
    Ok(UserProfile {
        id: column(row, "id")?,
        username: column(row, "username")?,
        role: role
            .parse::<Role>()
            .map_err(|e| StoreError::Corrupt(format!("user role: {}", e)))?,
        full_name: column(row, "full_name")?,
        phone: column(row, "phone")?,
        zip_code: column(row, "zip_code")?,
        address: column(row, "address")?,
        number: column(row, "number")?,
        complement: column(row, "complement")?,
        neighborhood: column(row, "neighborhood")?,
        city: column(row, "city")?,
        state: column(row, "state")?,
        private_notes: column(row, "private_notes")?,
        created_at: column(row, "created_at")?,
    })
}

fn appointment_from_row(row: &PgRow) -> StoreResult<Appointment> {
    let time: String = column(row, "time")?;
    let status: String = column(row, "status")?;
    Ok(Appointment {
        id: column(row, "id")?,
        client_id: column(row, "client_id")?,
        date: column(row, "date")?,
        time: SlotTime::parse(&time).map_err(StoreError::Corrupt)?,
        notes: column(row, "notes")?,
        status: status.parse::<AppointmentStatus>().map_err(StoreError::Corrupt)?,
        created_at: column(row, "created_at")?,
    })
}

fn appointment_with_client_from_row(row: &PgRow) -> StoreResult<AppointmentWithClient> {
    let appointment = appointment_from_row(row)?;
    let client_id: Option<Uuid> = column(row, "client_user_id")?;
    let client = match client_id {
        Some(id) => Some(ClientSummary {
            id,
            username: column(row, "client_username")?,
            full_name: column(row, "client_full_name")?,
            phone: column(row, "client_phone")?,
        }),
        None => None,
    };
    Ok(AppointmentWithClient { appointment, client })
}

fn rule_from_row(row: &PgRow) -> StoreResult<AvailabilityRule> {
    let day: i16 = column(row, "day_of_week")?;
    let times: Vec<String> = column(row, "times")?;
    let times = times
        .iter()
        .map(|t| SlotTime::parse(t))
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::Corrupt)?;
    Ok(AvailabilityRule {
        day_of_week: u8::try_from(day)
            .map_err(|_| StoreError::Corrupt(format!("day_of_week {}", day)))?,
        times,
        is_active: column(row, "is_active")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl SchedulingStore for PgSchedulingStore {
    async fn insert_user(&self, user: UserProfile) -> StoreResult<UserProfile> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(user.role.as_str())
            .bind(&user.full_name)
            .bind(&user.phone)
            .bind(&user.zip_code)
            .bind(&user.address)
            .bind(&user.number)
            .bind(&user.complement)
            .bind(&user.neighborhood)
            .bind(&user.city)
            .bind(&user.state)
            .bind(&user.private_notes)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        user_from_row(&row)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn users_by_role(&self, role: Role) -> StoreResult<Vec<UserProfile>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY full_name");
        let rows = sqlx::query(&sql)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        rows.iter().map(user_from_row).collect()
    }

    async fn append_private_note(&self, id: Uuid, note: &str) -> StoreResult<UserProfile> {
        let mut tx = self.pool.begin().await.map_err(StoreError::Connection)?;

        let existing: Option<Option<String>> =
            sqlx::query_scalar("SELECT private_notes FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::Query)?;

        let Some(existing) = existing else {
            return Err(StoreError::NotFound("User".to_string()));
        };

        let sql = format!("UPDATE users SET private_notes = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(join_note(existing.as_deref(), note))
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::Query)?;

        tx.commit().await.map_err(StoreError::Query)?;
        user_from_row(&row)
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> StoreResult<Appointment> {
        let row = sqlx::query(
            "INSERT INTO appointments AS a (id, client_id, date, time, notes, status) \
             VALUES ($1, $2, $3, $4, $5, 'pending') \
             RETURNING a.id, a.client_id, a.date, a.time, a.notes, a.status, a.created_at",
        )
        .bind(Uuid::new_v4())
        .bind(appointment.client_id)
        .bind(appointment.date)
        .bind(appointment.time.to_string())
        .bind(&appointment.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        let created = appointment_from_row(&row)?;
        debug!("Stored appointment {}", created.id);
        Ok(created)
    }

    async fn get_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        row.as_ref().map(appointment_from_row).transpose()
    }

    async fn get_appointment_with_client(&self, id: Uuid) -> StoreResult<Option<AppointmentWithClient>> {
        let sql = format!(
            "SELECT {APPOINTMENT_COLUMNS}, {CLIENT_COLUMNS} \
             FROM appointments a LEFT JOIN users u ON u.id = a.client_id \
             WHERE a.id = $1"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        row.as_ref().map(appointment_with_client_from_row).transpose()
    }

    async fn appointments_by_client(&self, client_id: Uuid) -> StoreResult<Vec<Appointment>> {
        let sql = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments a \
             WHERE a.client_id = $1 ORDER BY a.date DESC, a.time DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        rows.iter().map(appointment_from_row).collect()
    }

    async fn appointments_with_clients(&self) -> StoreResult<Vec<AppointmentWithClient>> {
        let sql = format!(
            "SELECT {APPOINTMENT_COLUMNS}, {CLIENT_COLUMNS} \
             FROM appointments a LEFT JOIN users u ON u.id = a.client_id \
             ORDER BY a.date DESC, a.time DESC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        rows.iter().map(appointment_with_client_from_row).collect()
    }

    async fn appointments_on_date(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        let sql = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.date = $1 ORDER BY a.time"
        );
        let rows = sqlx::query(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        rows.iter().map(appointment_from_row).collect()
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> StoreResult<Appointment> {
        let result = sqlx::query(
            "UPDATE appointments AS a SET status = $3 \
             WHERE a.id = $1 AND a.status = $2 \
             RETURNING a.id, a.client_id, a.date, a.time, a.notes, a.status, a.created_at",
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(new_status.as_str())
        .fetch_optional(&self.pool)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => {
                warn!("Confirmation of appointment {} collided with a scheduled slot", id);
                return Err(StoreError::SlotTaken(id));
            }
            Err(err) => return Err(StoreError::Query(err)),
        };

        match row {
            Some(row) => appointment_from_row(&row),
            None => {
                let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM appointments WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(StoreError::Query)?;
                match exists {
                    Some(_) => Err(StoreError::StatusChanged { id, expected }),
                    None => Err(StoreError::NotFound("Appointment".to_string())),
                }
            }
        }
    }

    async fn availability(&self) -> StoreResult<Vec<AvailabilityRule>> {
        let rows = sqlx::query("SELECT day_of_week, times, is_active FROM availabilities ORDER BY day_of_week")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        rows.iter().map(rule_from_row).collect()
    }

    async fn replace_availability(&self, rules: Vec<AvailabilityRule>) -> StoreResult<Vec<AvailabilityRule>> {
        let mut tx = self.pool.begin().await.map_err(StoreError::Connection)?;

        // Serialises concurrent replacements; plain reads are not blocked.
        sqlx::query("LOCK TABLE availabilities IN EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(StoreError::Query)?;

        sqlx::query("DELETE FROM availabilities")
            .execute(&mut *tx)
            .await
            .map_err(StoreError::Query)?;

        for rule in &rules {
            let times: Vec<String> = rule.times.iter().map(SlotTime::to_string).collect();
            sqlx::query("INSERT INTO availabilities (day_of_week, times, is_active) VALUES ($1, $2, $3)")
                .bind(i16::from(rule.day_of_week))
                .bind(times)
                .bind(rule.is_active)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::Query)?;
        }

        tx.commit().await.map_err(StoreError::Query)?;
        debug!("Replaced availability template with {} rules", rules.len());

        self.availability().await
    }

    async fn health_check(&self) -> StoreResult<bool> {
        crate::database::health_check(&self.pool).await
    }
}
