use chrono::{Duration, NaiveDate};
use tracing::info;

use shared_database::{SchedulingStore, StoreResult};
use shared_models::auth::Role;
use shared_models::scheduling::{AvailabilityRule, NewAppointment, SlotTime, UserProfile};

/// Weekly template used for demos: (day of week, hours on the hour).
const DEMO_TEMPLATE: [(u8, &[u32]); 5] = [
    (1, &[9, 10, 11, 14, 15]),
    (2, &[9, 10, 14]),
    (3, &[9, 10, 11, 14, 15]),
    (4, &[9, 10, 14]),
    (5, &[9, 10, 11]),
];

/// Inserts a practitioner, one patient, a Monday to Friday template and two
/// pending appointments. Does nothing when a practitioner already exists.
pub async fn seed_demo_data(store: &dyn SchedulingStore, today: NaiveDate) -> StoreResult<bool> {
    if !store.users_by_role(Role::Practitioner).await?.is_empty() {
        info!("Practitioner already present, skipping demo seed");
        return Ok(false);
    }

    info!("Seeding demo data...");

    store
        .insert_user(UserProfile::new("admin@psi.com", "Dra. Psicóloga", Role::Practitioner))
        .await?;

    let mut patient = UserProfile::new("cliente@email.com", "João da Silva", Role::Patient);
    patient.phone = Some("(11) 99999-9999".to_string());
    let patient = store.insert_user(patient).await?;

    let rules = DEMO_TEMPLATE
        .iter()
        .map(|(day, hours)| AvailabilityRule {
            day_of_week: *day,
            times: hours.iter().filter_map(|h| SlotTime::new(*h, 0)).collect(),
            is_active: true,
        })
        .collect();
    store.replace_availability(rules).await?;

    for (date, hour, note) in [
        (today, 10, "Primeira consulta"),
        (today + Duration::days(7), 14, "Retorno"),
    ] {
        if let Some(time) = SlotTime::new(hour, 0) {
            store
                .insert_appointment(NewAppointment {
                    client_id: patient.id,
                    date,
                    time,
                    notes: Some(note.to_string()),
                })
                .await?;
        }
    }

    Ok(true)
}
