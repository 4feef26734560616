//! SQLite persistence backend

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::backend::{PersistenceBackend, StoreError, StoredLab};
use crate::catalog::{Configuration, EquipmentTypeId};
use crate::composition::{Identity, PersistedId, PlacementInstance, Position, WireConnection};
use crate::steps::{ExperimentStep, Tolerance};

pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let backend = Self {
            conn: Mutex::new(conn),
        };
        backend.initialize()?;
        Ok(backend)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS lab_placements (
                id TEXT NOT NULL,
                lab_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                equipment_type_id TEXT NOT NULL,
                position_x REAL NOT NULL,
                position_y REAL NOT NULL,
                depth_order INTEGER NOT NULL,
                config_json TEXT NOT NULL,
                display_name TEXT,
                PRIMARY KEY (lab_id, id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS lab_connections (
                id TEXT NOT NULL,
                lab_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                source_json TEXT NOT NULL,
                target_json TEXT NOT NULL,
                source_terminal TEXT,
                target_terminal TEXT,
                color TEXT,
                PRIMARY KEY (lab_id, id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS lab_steps (
                lab_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                step_number INTEGER NOT NULL,
                description TEXT NOT NULL,
                procedure TEXT,
                min_tolerance REAL,
                max_tolerance REAL,
                unit TEXT,
                PRIMARY KEY (lab_id, seq)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_lab_placements_lab ON lab_placements(lab_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_lab_connections_lab ON lab_connections(lab_id)",
            [],
        )?;

        Ok(())
    }

    fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn load_placements(conn: &Connection, lab_id: &str) -> Result<Vec<PlacementInstance>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT id, equipment_type_id, position_x, position_y, depth_order, config_json, display_name
             FROM lab_placements WHERE lab_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![lab_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut placements = Vec::with_capacity(rows.len());
        for (id, type_id, x, y, depth_order, config_json, display_name) in rows {
            let configuration: Configuration = serde_json::from_str(&config_json)?;
            placements.push(PlacementInstance {
                identity: Identity::persisted(id),
                equipment_type_id: EquipmentTypeId::new(type_id),
                position: Position::new(x, y),
                depth_order,
                configuration,
                display_name,
            });
        }
        Ok(placements)
    }

    fn load_connections(conn: &Connection, lab_id: &str) -> Result<Vec<WireConnection>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT id, source_json, target_json, source_terminal, target_terminal, color
             FROM lab_connections WHERE lab_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![lab_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut connections = Vec::with_capacity(rows.len());
        for (id, source_json, target_json, source_terminal, target_terminal, color) in rows {
            connections.push(WireConnection {
                identity: Identity::persisted(id),
                source: serde_json::from_str(&source_json)?,
                target: serde_json::from_str(&target_json)?,
                source_terminal,
                target_terminal,
                color,
            });
        }
        Ok(connections)
    }

    fn load_steps(conn: &Connection, lab_id: &str) -> Result<Vec<ExperimentStep>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT step_number, description, procedure, min_tolerance, max_tolerance, unit
             FROM lab_steps WHERE lab_id = ?1 ORDER BY seq",
        )?;
        let steps = stmt
            .query_map(params![lab_id], |row| {
                let min: Option<f64> = row.get(3)?;
                let max: Option<f64> = row.get(4)?;
                Ok(ExperimentStep {
                    step_number: row.get(0)?,
                    description: row.get(1)?,
                    procedure: row.get(2)?,
                    tolerance: min.zip(max).map(|(min, max)| Tolerance::new(min, max)),
                    unit: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(steps)
    }
}

#[async_trait]
impl PersistenceBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn persist_placements(
        &self,
        lab_id: &str,
        placements: &[PlacementInstance],
    ) -> Result<Vec<PersistedId>, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM lab_placements WHERE lab_id = ?1", params![lab_id])?;

        let mut ids = Vec::with_capacity(placements.len());
        for (seq, placement) in placements.iter().enumerate() {
            let id = match &placement.identity {
                Identity::Persisted(id) => id.as_str().to_string(),
                Identity::Local(_) => Self::new_id(),
            };
            let config_json = serde_json::to_string(&placement.configuration)?;
            tx.execute(
                "INSERT OR REPLACE INTO lab_placements
                 (id, lab_id, seq, equipment_type_id, position_x, position_y, depth_order, config_json, display_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    id,
                    lab_id,
                    seq as i64,
                    placement.equipment_type_id.as_str(),
                    placement.position.x,
                    placement.position.y,
                    placement.depth_order,
                    config_json,
                    placement.display_name,
                ],
            )?;
            ids.push(PersistedId::new(id));
        }

        tx.commit()?;
        Ok(ids)
    }

    async fn persist_connections(
        &self,
        lab_id: &str,
        connections: &[WireConnection],
    ) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM lab_connections WHERE lab_id = ?1", params![lab_id])?;

        for (seq, wire) in connections.iter().enumerate() {
            let id = match &wire.identity {
                Identity::Persisted(id) => id.as_str().to_string(),
                Identity::Local(_) => Self::new_id(),
            };
            tx.execute(
                "INSERT OR REPLACE INTO lab_connections
                 (id, lab_id, seq, source_json, target_json, source_terminal, target_terminal, color)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id,
                    lab_id,
                    seq as i64,
                    serde_json::to_string(&wire.source)?,
                    serde_json::to_string(&wire.target)?,
                    wire.source_terminal,
                    wire.target_terminal,
                    wire.color,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    async fn persist_steps(&self, lab_id: &str, steps: &[ExperimentStep]) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM lab_steps WHERE lab_id = ?1", params![lab_id])?;

        for (seq, step) in steps.iter().enumerate() {
            tx.execute(
                "INSERT INTO lab_steps
                 (lab_id, seq, step_number, description, procedure, min_tolerance, max_tolerance, unit)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    lab_id,
                    seq as i64,
                    step.step_number,
                    step.description,
                    step.procedure,
                    step.tolerance.map(|t| t.min),
                    step.tolerance.map(|t| t.max),
                    step.unit,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    async fn load_lab(&self, lab_id: &str) -> Result<StoredLab, StoreError> {
        let conn = self.lock()?;
        Ok(StoredLab {
            placements: Self::load_placements(&conn, lab_id)?,
            connections: Self::load_connections(&conn, lab_id)?,
            steps: Self::load_steps(&conn, lab_id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn placement(id: Identity, ty: &str) -> PlacementInstance {
        let mut p = PlacementInstance::new(id, ty).with_position(12.5, 40.0);
        p.configuration.insert("voltage".to_string(), json!(5.0));
        p
    }

    #[tokio::test]
    async fn test_placements_roundtrip_in_order() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let ids = backend
            .persist_placements(
                "lab-1",
                &[
                    placement(Identity::local("a"), "power-supply"),
                    placement(Identity::local("b"), "resistor"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);

        let stored = backend.load_lab("lab-1").await.unwrap();
        assert_eq!(stored.placements.len(), 2);
        assert_eq!(stored.placements[0].identity, Identity::Persisted(ids[0].clone()));
        assert_eq!(stored.placements[1].equipment_type_id.as_str(), "resistor");
        assert_eq!(stored.placements[0].configuration.get("voltage"), Some(&json!(5.0)));
    }

    #[tokio::test]
    async fn test_resubmitting_persisted_ids_is_idempotent() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let first = backend
            .persist_placements("lab-1", &[placement(Identity::local("a"), "led")])
            .await
            .unwrap();

        let resubmit = vec![placement(Identity::Persisted(first[0].clone()), "led")];
        let second = backend.persist_placements("lab-1", &resubmit).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.load_lab("lab-1").await.unwrap().placements.len(), 1);
    }

    #[tokio::test]
    async fn test_connections_and_steps_roundtrip() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let wire = WireConnection::new(
            Identity::local("w"),
            Identity::persisted("p1"),
            Identity::local("stray"),
        )
        .with_color("#3b82f6");
        backend.persist_connections("lab-1", &[wire]).await.unwrap();

        let steps = vec![
            ExperimentStep::new(1, "Set voltage").with_tolerance(4.9, 5.1, "V"),
            ExperimentStep::new(2, "Observe LED"),
        ];
        backend.persist_steps("lab-1", &steps).await.unwrap();

        let stored = backend.load_lab("lab-1").await.unwrap();
        assert_eq!(stored.connections.len(), 1);
        assert!(stored.connections[0].identity.is_persisted());
        assert_eq!(stored.connections[0].target, Identity::local("stray"));
        assert_eq!(stored.steps, steps);
    }

    #[tokio::test]
    async fn test_duplicate_step_numbers_are_all_kept() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let steps = vec![
            ExperimentStep::new(1, "Set voltage"),
            ExperimentStep::new(1, "Observe LED"),
        ];
        backend.persist_steps("lab-1", &steps).await.unwrap();

        let stored = backend.load_lab("lab-1").await.unwrap();
        assert_eq!(stored.steps, steps);
    }

    #[tokio::test]
    async fn test_shared_ids_stay_within_their_lab() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let shared = vec![placement(Identity::persisted("ref-psu"), "power-supply")];
        let wire = WireConnection::new(
            Identity::persisted("ref-w1"),
            Identity::persisted("ref-psu"),
            Identity::persisted("ref-psu"),
        );

        backend.persist_placements("lab-a", &shared).await.unwrap();
        backend.persist_connections("lab-a", &[wire.clone()]).await.unwrap();
        backend.persist_placements("lab-b", &shared).await.unwrap();
        backend.persist_connections("lab-b", &[wire]).await.unwrap();

        let a = backend.load_lab("lab-a").await.unwrap();
        let b = backend.load_lab("lab-b").await.unwrap();
        assert_eq!(a.placements.len(), 1);
        assert_eq!(a.connections.len(), 1);
        assert_eq!(b.placements.len(), 1);
        assert_eq!(b.connections.len(), 1);
    }
}
