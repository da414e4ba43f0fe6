//! Runs against a real PostgreSQL instance when `TEST_DATABASE_URL` is set.
//! Each test uses a date far in the future so runs do not collide.

use assert_matches::assert_matches;
use chrono::NaiveDate;
use uuid::Uuid;

use shared_database::database::{init_pool, run_migrations, DatabaseConfig};
use shared_database::{PgSchedulingStore, SchedulingStore, StoreError};
use shared_models::auth::Role;
use shared_models::scheduling::{
    AppointmentStatus, AvailabilityRule, NewAppointment, SlotTime, UserProfile,
};

async fn store() -> Option<PgSchedulingStore> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            println!("Skipping: TEST_DATABASE_URL not set");
            return None;
        }
    };
    let pool = init_pool(&DatabaseConfig { database_url: url, max_connections: 4 })
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    Some(PgSchedulingStore::new(pool))
}

fn unique_date() -> NaiveDate {
    let offset = (Uuid::new_v4().as_u128() % 300_000) as i64;
    NaiveDate::from_ymd_opt(2900, 1, 1).unwrap() + chrono::Duration::days(offset)
}

#[tokio::test]
async fn test_partial_unique_index_rejects_second_confirmation() {
    let Some(store) = store().await else { return };
    let date = unique_date();
    let slot = SlotTime::parse("09:00").unwrap();

    let first = store
        .insert_appointment(NewAppointment { client_id: Uuid::new_v4(), date, time: slot, notes: None })
        .await
        .unwrap();
    let second = store
        .insert_appointment(NewAppointment { client_id: Uuid::new_v4(), date, time: slot, notes: None })
        .await
        .unwrap();

    store
        .update_appointment_status(first.id, AppointmentStatus::Pending, AppointmentStatus::Scheduled)
        .await
        .unwrap();
    let result = store
        .update_appointment_status(second.id, AppointmentStatus::Pending, AppointmentStatus::Scheduled)
        .await;
    assert_matches!(result, Err(StoreError::SlotTaken(_)));

    let stale = store
        .update_appointment_status(first.id, AppointmentStatus::Pending, AppointmentStatus::Declined)
        .await;
    assert_matches!(stale, Err(StoreError::StatusChanged { .. }));

    let on_date = store.appointments_on_date(date).await.unwrap();
    assert_eq!(on_date.len(), 2);
}

#[tokio::test]
async fn test_notes_and_client_join() {
    let Some(store) = store().await else { return };
    let username = format!("{}@example.com", Uuid::new_v4());
    let patient = store
        .insert_user(UserProfile::new(&username, "Ana Souza", Role::Patient))
        .await
        .unwrap();

    store.append_private_note(patient.id, "first").await.unwrap();
    let updated = store.append_private_note(patient.id, "second").await.unwrap();
    assert_eq!(updated.private_notes.as_deref(), Some("first\nsecond"));

    let created = store
        .insert_appointment(NewAppointment {
            client_id: patient.id,
            date: unique_date(),
            time: SlotTime::parse("14:00").unwrap(),
            notes: Some("check-up".to_string()),
        })
        .await
        .unwrap();
    let joined = store.get_appointment_with_client(created.id).await.unwrap().unwrap();
    assert_eq!(joined.client.unwrap().full_name, "Ana Souza");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_confirmations_leave_one_scheduled() {
    let Some(store) = store().await else { return };
    let date = unique_date();
    let slot = SlotTime::parse("10:00").unwrap();

    let mut ids = Vec::new();
    for _ in 0..2 {
        let created = store
            .insert_appointment(NewAppointment { client_id: Uuid::new_v4(), date, time: slot, notes: None })
            .await
            .unwrap();
        ids.push(created.id);
    }

    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .update_appointment_status(id, AppointmentStatus::Pending, AppointmentStatus::Scheduled)
                    .await
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results.iter().filter(|r| matches!(r, Err(StoreError::SlotTaken(_)))).count(),
        1
    );

    let scheduled = store
        .appointments_on_date(date)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.status == AppointmentStatus::Scheduled)
        .count();
    assert_eq!(scheduled, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_template_replacements_all_succeed() {
    let Some(store) = store().await else { return };
    let rule = |day: u8| AvailabilityRule {
        day_of_week: day,
        times: vec![SlotTime::parse("09:00").unwrap(), SlotTime::parse("14:00").unwrap()],
        is_active: true,
    };

    for _ in 0..5 {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let rules = vec![rule(1), rule(2)];
                tokio::spawn(async move { store.replace_availability(rules).await })
            })
            .collect();

        for handle in handles {
            let stored = handle.await.unwrap().unwrap();
            assert_eq!(stored, vec![rule(1), rule(2)]);
        }
    }

    assert_eq!(store.availability().await.unwrap(), vec![rule(1), rule(2)]);
}
