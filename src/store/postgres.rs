use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres, Transaction};

use super::{ActivePolicy, AlertStore, StoreError};
use crate::api::types::{Alert, AlertStatus, NewAlert};
use crate::api::Coord;
use crate::db::Database;

const INSERT_ALERT: &str = r#"
INSERT INTO emergency_alerts (
    ambulance_id, current_lat, current_lng, destination_name, destination_lat,
    destination_lng, route_polyline, eta, distance, status
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
RETURNING id, ambulance_id, current_lat, current_lng, destination_name, destination_lat,
    destination_lng, route_polyline, eta, distance, status, updated_at;
"#;

const LOCK_AMBULANCE: &str = r#"
SELECT pg_advisory_xact_lock(hashtext($1));
"#;

const SELECT_ACTIVE_FOR_AMBULANCE: &str = r#"
SELECT EXISTS (
    SELECT 1 FROM emergency_alerts
    WHERE ambulance_id = $1 AND status = 'active' AND id IS DISTINCT FROM $2::INTEGER
);
"#;

const SELECT_AMBULANCE_ID: &str = r#"
SELECT ambulance_id FROM emergency_alerts WHERE id = $1;
"#;

const SELECT_ACTIVE: &str = r#"
SELECT id, ambulance_id, current_lat, current_lng, destination_name, destination_lat,
    destination_lng, route_polyline, eta, distance, status, updated_at
FROM emergency_alerts
WHERE status = 'active'
ORDER BY updated_at DESC, id DESC;
"#;

const UPDATE_LOCATION: &str = r#"
UPDATE emergency_alerts
SET current_lat = $2,
    current_lng = $3,
    updated_at = NOW()
WHERE id = $1
RETURNING id, ambulance_id, current_lat, current_lng, destination_name, destination_lat,
    destination_lng, route_polyline, eta, distance, status, updated_at;
"#;

const UPDATE_STATUS: &str = r#"
UPDATE emergency_alerts
SET status = $2,
    updated_at = NOW()
WHERE id = $1
RETURNING id, ambulance_id, current_lat, current_lng, destination_name, destination_lat,
    destination_lng, route_polyline, eta, distance, status, updated_at;
"#;

#[derive(Debug, FromRow)]
struct AlertRow {
    id: i32,
    ambulance_id: String,
    current_lat: f64,
    current_lng: f64,
    destination_name: String,
    destination_lat: f64,
    destination_lng: f64,
    route_polyline: String,
    eta: i32,
    distance: f64,
    status: String, // CHECK constraint limits this to the enum literals
    updated_at: DateTime<Utc>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = StoreError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let status: AlertStatus = row.status.parse().map_err(|_| StoreError::Corrupt {
            id: row.id,
            reason: format!("unknown status {:?}", row.status),
        })?;

        Ok(Alert {
            id: row.id,
            ambulance_id: row.ambulance_id,
            current_lat: row.current_lat,
            current_lng: row.current_lng,
            destination_name: row.destination_name,
            destination_lat: row.destination_lat,
            destination_lng: row.destination_lng,
            route_polyline: row.route_polyline,
            eta: row.eta,
            distance: row.distance,
            status,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgStore {
    database: Database,
    policy: ActivePolicy,
}

impl PgStore {
    pub fn new(database: Database, policy: ActivePolicy) -> Self {
        Self { database, policy }
    }
}

fn insert(alert: &NewAlert) -> QueryAs<'_, Postgres, AlertRow, PgArguments> {
    sqlx::query_as(INSERT_ALERT)
        .bind(&alert.ambulance_id)
        .bind(alert.current_lat)
        .bind(alert.current_lng)
        .bind(&alert.destination_name)
        .bind(alert.destination_lat)
        .bind(alert.destination_lng)
        .bind(&alert.route_polyline)
        .bind(alert.eta)
        .bind(alert.distance)
        .bind(alert.status.as_str())
}

/// Takes the per-ambulance lock for the rest of `tx`, then reports whether
/// another alert than `except` is active for `ambulance_id`.
async fn busy(
    tx: &mut Transaction<'_, Postgres>,
    ambulance_id: &str,
    except: Option<i32>,
) -> Result<bool, StoreError> {
    sqlx::query(LOCK_AMBULANCE)
        .bind(ambulance_id)
        .execute(&mut **tx)
        .await?;

    let busy: bool = sqlx::query_scalar(SELECT_ACTIVE_FOR_AMBULANCE)
        .bind(ambulance_id)
        .bind(except)
        .fetch_one(&mut **tx)
        .await?;

    Ok(busy)
}

impl AlertStore for PgStore {
    async fn create(&self, alert: NewAlert) -> Result<Alert, StoreError> {
        if self.policy == ActivePolicy::Shared || alert.status != AlertStatus::Active {
            let row = insert(&alert).fetch_one(&self.database.pool).await?;
            return row.try_into();
        }

        let mut tx = self.database.pool.begin().await?;

        if busy(&mut tx, &alert.ambulance_id, None).await? {
            return Err(StoreError::ActiveAlertExists(alert.ambulance_id));
        }

        let row = insert(&alert).fetch_one(&mut *tx).await?;
        tx.commit().await?;

        row.try_into()
    }

    async fn list_active(&self) -> Result<Vec<Alert>, StoreError> {
        let rows: Vec<AlertRow> = sqlx::query_as(SELECT_ACTIVE)
            .fetch_all(&self.database.pool)
            .await?;

        rows.into_iter().map(Alert::try_from).collect()
    }

    async fn update_location(
        &self,
        id: i32,
        location: Coord,
    ) -> Result<Option<Alert>, StoreError> {
        let row: Option<AlertRow> = sqlx::query_as(UPDATE_LOCATION)
            .bind(id)
            .bind(location.lat)
            .bind(location.lng)
            .fetch_optional(&self.database.pool)
            .await?;

        row.map(Alert::try_from).transpose()
    }

    async fn update_status(
        &self,
        id: i32,
        status: AlertStatus,
    ) -> Result<Option<Alert>, StoreError> {
        if self.policy == ActivePolicy::Shared || status != AlertStatus::Active {
            let row: Option<AlertRow> = sqlx::query_as(UPDATE_STATUS)
                .bind(id)
                .bind(status.as_str())
                .fetch_optional(&self.database.pool)
                .await?;

            return row.map(Alert::try_from).transpose();
        }

        let mut tx = self.database.pool.begin().await?;

        let ambulance_id: Option<String> = sqlx::query_scalar(SELECT_AMBULANCE_ID)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(ambulance_id) = ambulance_id else {
            return Ok(None);
        };

        if busy(&mut tx, &ambulance_id, Some(id)).await? {
            return Err(StoreError::ActiveAlertExists(ambulance_id));
        }

        let row: Option<AlertRow> = sqlx::query_as(UPDATE_STATUS)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        row.map(Alert::try_from).transpose()
    }
}

/// Run with `PG_URL=postgres://... cargo test -- --ignored`. Every test works
/// on its own ambulance ids, so the database may hold other rows.
#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    async fn store(policy: ActivePolicy) -> PgStore {
        let url = std::env::var("PG_URL").expect("PG_URL must point at a test database");
        let database = Database::connect(&url, 2).await.unwrap();
        database.migrate().await.unwrap();
        PgStore::new(database, policy)
    }

    fn ambulance(tag: &str) -> String {
        format!("{tag}-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
    }

    fn new_alert(ambulance_id: &str) -> NewAlert {
        NewAlert {
            ambulance_id: ambulance_id.to_string(),
            current_lat: 12.9716,
            current_lng: 77.5946,
            destination_name: "City Hospital".to_string(),
            destination_lat: 12.9352,
            destination_lng: 77.6245,
            route_polyline: "[[12.9716,77.5946],[12.9352,77.6245]]".to_string(),
            eta: 15,
            distance: 5.2,
            status: AlertStatus::Active,
        }
    }

    async fn active_ids(store: &PgStore, ambulances: &[&str]) -> Vec<i32> {
        store
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .filter(|a| ambulances.contains(&a.ambulance_id.as_str()))
            .map(|a| a.id)
            .collect()
    }

    #[tokio::test]
    #[ignore = "needs PG_URL"]
    async fn rows_round_trip_through_returning() {
        let store = store(ActivePolicy::Shared).await;
        let id = ambulance("pg-roundtrip");
        let alert = new_alert(&id);

        let created = store.create(alert.clone()).await.unwrap();
        assert_eq!(created.ambulance_id, id);
        assert_eq!(created.route_polyline, alert.route_polyline);
        assert_eq!((created.eta, created.distance), (15, 5.2));
        assert_eq!(created.status, AlertStatus::Active);
    }

    #[tokio::test]
    #[ignore = "needs PG_URL"]
    async fn list_active_orders_by_latest_update() {
        let store = store(ActivePolicy::Shared).await;
        let (a, b, c) = (ambulance("pg-a"), ambulance("pg-b"), ambulance("pg-c"));
        let first = store.create(new_alert(&a)).await.unwrap();
        let second = store.create(new_alert(&b)).await.unwrap();
        let done = store.create(new_alert(&c)).await.unwrap();
        store
            .update_status(done.id, AlertStatus::Completed)
            .await
            .unwrap();

        let ours = [a.as_str(), b.as_str(), c.as_str()];
        assert_eq!(active_ids(&store, &ours).await, vec![second.id, first.id]);

        let moved = store
            .update_location(first.id, Coord::new(13.0, 77.7))
            .await
            .unwrap()
            .unwrap();
        assert_eq!((moved.current_lat, moved.current_lng), (13.0, 77.7));
        assert_eq!(moved.destination_name, first.destination_name);
        assert_eq!(active_ids(&store, &ours).await, vec![first.id, second.id]);
    }

    #[tokio::test]
    #[ignore = "needs PG_URL"]
    async fn missing_id_updates_nothing() {
        let store = store(ActivePolicy::OnePerAmbulance).await;
        assert!(store
            .update_status(i32::MAX, AlertStatus::Active)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .update_location(i32::MAX, Coord::new(0.0, 0.0))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    #[ignore = "needs PG_URL"]
    async fn one_per_ambulance_guards_create_and_reactivation() {
        let store = store(ActivePolicy::OnePerAmbulance).await;
        let id = ambulance("pg-one");

        let old = store.create(new_alert(&id)).await.unwrap();
        assert!(matches!(
            store.create(new_alert(&id)).await.unwrap_err(),
            StoreError::ActiveAlertExists(_)
        ));

        store
            .update_status(old.id, AlertStatus::Completed)
            .await
            .unwrap();
        let newer = store.create(new_alert(&id)).await.unwrap();

        assert!(matches!(
            store
                .update_status(old.id, AlertStatus::Active)
                .await
                .unwrap_err(),
            StoreError::ActiveAlertExists(_)
        ));
        assert_eq!(active_ids(&store, &[id.as_str()]).await, vec![newer.id]);
    }
}
