//! SQLite store for task flows and notification events.
//!
//! Two tables with JSON-valued text columns for the list and opaque
//! payloads. One connection per call; SQLite serializes writers. Task flows
//! are superseded (delete-then-insert) by the compiler, so a device fetch
//! finding zero rows is a valid state.

use crate::error::{ServerError, ServerResult};
use crate::taskflow::ModelKind;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};

/// One row in `task_flows`.
#[derive(Debug, Clone)]
pub struct TaskFlowRecord {
    pub id: i64,
    pub device_eui: String,
    /// Full original spoken request.
    pub name: String,
    pub headline: String,
    pub trigger_condition: String,
    pub target_objects: Vec<String>,
    pub actions: Vec<String>,
    pub model_type: ModelKind,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// Insert payload for a task flow.
#[derive(Debug, Clone)]
pub struct NewTaskFlow<'a> {
    pub device_eui: &'a str,
    pub name: &'a str,
    pub headline: &'a str,
    pub trigger_condition: &'a str,
    pub target_objects: Vec<String>,
    pub actions: Vec<String>,
    pub model_type: ModelKind,
}

/// One row in `notification_events`. Append-only.
#[derive(Debug, Clone)]
pub struct NotificationEventRecord {
    pub id: i64,
    pub request_id: String,
    pub device_eui: String,
    /// Device event time in ms since epoch; 0 when the device sent none.
    pub timestamp_ms: i64,
    pub text: String,
    pub img: String,
    /// Raw JSON text of the inference payload.
    pub inference_data: String,
    /// Raw JSON text of the sensor payload.
    pub sensor_data: String,
    pub created_at_ms: i64,
}

/// Insert payload for a notification event.
#[derive(Debug, Clone)]
pub struct NewNotificationEvent<'a> {
    pub request_id: &'a str,
    pub device_eui: &'a str,
    pub timestamp_ms: i64,
    pub text: String,
    pub img: String,
    pub inference_data: String,
    pub sensor_data: String,
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[derive(Clone)]
pub struct WatcherStore {
    db_path: PathBuf,
}

impl WatcherStore {
    /// Open or create the database and ensure the schema exists.
    pub fn new(db_path: PathBuf) -> ServerResult<Self> {
        let this = Self { db_path };
        this.init()?;
        Ok(this)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection, rusqlite::Error> {
        Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
    }

    fn init(&self) -> ServerResult<()> {
        if let Some(parent) = self.db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = self.open()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS task_flows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_eui TEXT NOT NULL,
                name TEXT NOT NULL,
                headline TEXT NOT NULL,
                trigger_condition TEXT NOT NULL,
                target_objects TEXT NOT NULL,
                actions TEXT NOT NULL,
                model_type INTEGER NOT NULL DEFAULT 1,
                created_at_ms INTEGER NOT NULL,
                updated_at_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_task_flows_device ON task_flows(device_eui);

            CREATE TABLE IF NOT EXISTS notification_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                request_id TEXT NOT NULL,
                device_eui TEXT NOT NULL,
                timestamp_ms INTEGER NOT NULL,
                text TEXT NOT NULL,
                img TEXT NOT NULL,
                inference_data TEXT NOT NULL,
                sensor_data TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_device ON notification_events(device_eui);
            CREATE INDEX IF NOT EXISTS idx_events_timestamp ON notification_events(timestamp_ms);
            "#,
        )?;
        Ok(())
    }

    /// Insert a task flow; assigns the surrogate id and both instants.
    pub fn save_task_flow(&self, flow: NewTaskFlow<'_>) -> ServerResult<TaskFlowRecord> {
        let conn = self.open()?;
        let ts = now_ms();
        let target_objects =
            serde_json::to_string(&flow.target_objects).unwrap_or_else(|_| "[]".to_string());
        let actions = serde_json::to_string(&flow.actions).unwrap_or_else(|_| "[]".to_string());
        conn.execute(
            r#"
            INSERT INTO task_flows (device_eui, name, headline, trigger_condition, target_objects, actions, model_type, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                flow.device_eui,
                flow.name,
                flow.headline,
                flow.trigger_condition,
                target_objects,
                actions,
                flow.model_type.as_i64(),
                ts,
                ts
            ],
        )?;
        Ok(TaskFlowRecord {
            id: conn.last_insert_rowid(),
            device_eui: flow.device_eui.to_string(),
            name: flow.name.to_string(),
            headline: flow.headline.to_string(),
            trigger_condition: flow.trigger_condition.to_string(),
            target_objects: flow.target_objects,
            actions: flow.actions,
            model_type: flow.model_type,
            created_at_ms: ts,
            updated_at_ms: ts,
        })
    }

    /// All task flows for a device, newest first.
    pub fn task_flows_by_device(&self, device_eui: &str) -> ServerResult<Vec<TaskFlowRecord>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, device_eui, name, headline, trigger_condition, target_objects, actions, model_type, created_at_ms, updated_at_ms
             FROM task_flows WHERE device_eui = ?1 ORDER BY created_at_ms DESC, id DESC",
        )?;
        let rows = stmt
            .query_map(params![device_eui], row_to_task_flow)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn task_flow_by_id(&self, id: i64) -> ServerResult<Option<TaskFlowRecord>> {
        let conn = self.open()?;
        let row = conn
            .query_row(
                "SELECT id, device_eui, name, headline, trigger_condition, target_objects, actions, model_type, created_at_ms, updated_at_ms
                 FROM task_flows WHERE id = ?1",
                params![id],
                row_to_task_flow,
            )
            .optional()?;
        Ok(row)
    }

    /// Delete one task flow; `NotFound` when nothing matched.
    pub fn delete_task_flow(&self, id: i64) -> ServerResult<()> {
        let conn = self.open()?;
        let affected = conn.execute("DELETE FROM task_flows WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(ServerError::NotFound(format!("task flow: {id}")));
        }
        Ok(())
    }

    /// Insert a notification event; assigns the surrogate id and reception
    /// instant.
    pub fn save_notification_event(
        &self,
        event: NewNotificationEvent<'_>,
    ) -> ServerResult<NotificationEventRecord> {
        let conn = self.open()?;
        let ts = now_ms();
        conn.execute(
            r#"
            INSERT INTO notification_events (request_id, device_eui, timestamp_ms, text, img, inference_data, sensor_data, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                event.request_id,
                event.device_eui,
                event.timestamp_ms,
                event.text,
                event.img,
                event.inference_data,
                event.sensor_data,
                ts
            ],
        )?;
        Ok(NotificationEventRecord {
            id: conn.last_insert_rowid(),
            request_id: event.request_id.to_string(),
            device_eui: event.device_eui.to_string(),
            timestamp_ms: event.timestamp_ms,
            text: event.text,
            img: event.img,
            inference_data: event.inference_data,
            sensor_data: event.sensor_data,
            created_at_ms: ts,
        })
    }

    /// Recent notification events for a device, newest first.
    pub fn notification_events_by_device(
        &self,
        device_eui: &str,
        limit: usize,
    ) -> ServerResult<Vec<NotificationEventRecord>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, request_id, device_eui, timestamp_ms, text, img, inference_data, sensor_data, created_at_ms
             FROM notification_events WHERE device_eui = ?1 ORDER BY timestamp_ms DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![device_eui, limit as i64], |row| {
                Ok(NotificationEventRecord {
                    id: row.get(0)?,
                    request_id: row.get(1)?,
                    device_eui: row.get(2)?,
                    timestamp_ms: row.get(3)?,
                    text: row.get(4)?,
                    img: row.get(5)?,
                    inference_data: row.get(6)?,
                    sensor_data: row.get(7)?,
                    created_at_ms: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_task_flow(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskFlowRecord> {
    let target_objects: String = row.get(5)?;
    let actions: String = row.get(6)?;
    let model_type: i64 = row.get(7)?;
    Ok(TaskFlowRecord {
        id: row.get(0)?,
        device_eui: row.get(1)?,
        name: row.get(2)?,
        headline: row.get(3)?,
        trigger_condition: row.get(4)?,
        target_objects: serde_json::from_str(&target_objects).unwrap_or_default(),
        actions: serde_json::from_str(&actions).unwrap_or_default(),
        model_type: ModelKind::from_i64(model_type),
        created_at_ms: row.get(8)?,
        updated_at_ms: row.get(9)?,
    })
}
