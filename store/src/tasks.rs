//! Task persistence and the state-machine-enforcing update path (spec.md
//! §4.3, §8 P-1..P-5). Every write goes through the same `Mutex`-guarded
//! connection as the rest of `Store`, which is what gives per-task writes
//! their linearised ordering (spec.md §5).

use crate::db::Store;
use crate::error::StoreError;
use crate::projects::parse_rfc3339;
use chrono::{DateTime, Utc};
use domain::{Task, TaskRole, TaskStatus, WorkItemMetadata};

/// Default page size for [`Store::list_agent_tasks`] (spec.md §6).
pub const DEFAULT_TASK_PAGE_SIZE: i64 = 50;

impl Store {
    /// Inserts the `(user_task, assistant_task)` pair in one transaction and
    /// calls `publish` with the assembled work item before committing; if
    /// `publish` fails, the transaction is rolled back (T-1: the pair is
    /// atomic with respect to the queue).
    pub async fn create_message_pair<F>(
        &self,
        project_id: &str,
        agent_id: &str,
        content: &str,
        metadata: WorkItemMetadata,
        publish: F,
    ) -> Result<(Task, Task), StoreError>
    where
        F: FnOnce(&Task, &Task) -> Result<(), StoreError> + Send + 'static,
    {
        let now = Utc::now();
        let user_task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            agent_id: agent_id.to_string(),
            role: TaskRole::User,
            content: content.to_string(),
            status: TaskStatus::Queued,
            created_at: now,
            updated_at: now,
            metadata: Some(metadata.clone()),
        };
        let assistant_task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            agent_id: agent_id.to_string(),
            role: TaskRole::Assistant,
            content: String::new(),
            status: TaskStatus::Queued,
            created_at: now,
            updated_at: now,
            metadata: Some(metadata),
        };

        let conn = self.conn();
        let user = user_task.clone();
        let assistant = assistant_task.clone();
        tokio::task::block_in_place(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let tx = conn.transaction()?;
            for task in [&user, &assistant] {
                tx.execute(
                    "INSERT INTO tasks (id, project_id, agent_id, role, content, status, created_at, updated_at, metadata_json)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    rusqlite::params![
                        task.id,
                        task.project_id,
                        task.agent_id,
                        role_str(task.role),
                        task.content,
                        status_str(task.status),
                        task.created_at.to_rfc3339(),
                        task.updated_at.to_rfc3339(),
                        task.metadata.as_ref().map(|m| serde_json::to_string(m).unwrap_or_default()),
                    ],
                )?;
            }
            publish(&user, &assistant)?;
            tx.commit()?;
            Ok::<_, StoreError>(())
        })?;

        Ok((user_task, assistant_task))
    }

    /// Applies `status`/`content` to `task_id` if the transition is legal.
    /// Returns the record either way (spec.md: an illegal transition is a
    /// silent no-op, not an error) — `Ok(None)` only when the task doesn't
    /// exist at all.
    pub async fn update_task(
        &self,
        task_id: &str,
        status: TaskStatus,
        content: &str,
    ) -> Result<Option<Task>, StoreError> {
        let conn = self.conn();
        let task_id = task_id.to_string();
        let content = content.to_string();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let current = match fetch_task(&conn, &task_id)? {
                Some(t) => t,
                None => return Ok(None),
            };
            if !current.status.can_transition_to(status) {
                return Ok(Some(current));
            }
            let now = Utc::now();
            conn.execute(
                "UPDATE tasks SET status = ?1, content = ?2, updated_at = ?3 WHERE id = ?4",
                rusqlite::params![status_str(status), content, now.to_rfc3339(), task_id],
            )?;
            Ok(Some(Task {
                status,
                content,
                updated_at: now,
                ..current
            }))
        })
    }

    pub async fn get_task_status(&self, task_id: &str) -> Result<Option<TaskStatus>, StoreError> {
        let conn = self.conn();
        let task_id = task_id.to_string();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            Ok(fetch_task(&conn, &task_id)?.map(|t| t.status))
        })
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Task, StoreError> {
        let conn = self.conn();
        let id = task_id.to_string();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            fetch_task(&conn, &id)?.ok_or_else(|| StoreError::NotFound(format!("task {id}")))
        })
    }

    /// Newest-first, capped at `DEFAULT_TASK_PAGE_SIZE` (spec.md §6).
    pub async fn list_agent_tasks(&self, agent_id: &str) -> Result<Vec<Task>, StoreError> {
        let conn = self.conn();
        let agent_id = agent_id.to_string();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let mut stmt = conn.prepare(
                "SELECT id, project_id, agent_id, role, content, status, created_at, updated_at, metadata_json
                 FROM tasks WHERE agent_id = ?1 ORDER BY created_at DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(rusqlite::params![agent_id, DEFAULT_TASK_PAGE_SIZE], row_to_task)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
        })
    }

    /// Idempotent on terminal states: cancelling an already-terminal task
    /// leaves it unchanged (T-3).
    pub async fn cancel_task(&self, task_id: &str) -> Result<Option<Task>, StoreError> {
        self.update_task(task_id, TaskStatus::Cancelled, "").await
    }

    /// Tasks stuck in `Processing` since before `older_than` — the reaper
    /// predicate `store` exposes for an external sweep (spec.md §9
    /// SUPPLEMENT; not itself a reaper implementation).
    pub async fn list_stale_processing(&self, older_than: DateTime<Utc>) -> Result<Vec<Task>, StoreError> {
        let conn = self.conn();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let mut stmt = conn.prepare(
                "SELECT id, project_id, agent_id, role, content, status, created_at, updated_at, metadata_json
                 FROM tasks WHERE status = 'processing' AND updated_at < ?1",
            )?;
            let rows = stmt.query_map(rusqlite::params![older_than.to_rfc3339()], row_to_task)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
        })
    }
}

fn fetch_task(conn: &rusqlite::Connection, task_id: &str) -> Result<Option<Task>, StoreError> {
    let result = conn.query_row(
        "SELECT id, project_id, agent_id, role, content, status, created_at, updated_at, metadata_json
         FROM tasks WHERE id = ?1",
        rusqlite::params![task_id],
        row_to_task,
    );
    match result {
        Ok(t) => Ok(Some(t)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn role_str(r: TaskRole) -> &'static str {
    match r {
        TaskRole::User => "user",
        TaskRole::Assistant => "assistant",
    }
}

fn parse_role(s: &str) -> TaskRole {
    match s {
        "assistant" => TaskRole::Assistant,
        _ => TaskRole::User,
    }
}

fn status_str(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Queued => "queued",
        TaskStatus::Processing => "processing",
        TaskStatus::Completed => "completed",
        TaskStatus::Failed => "failed",
        TaskStatus::Cancelled => "cancelled",
    }
}

fn parse_status(s: &str) -> TaskStatus {
    match s {
        "processing" => TaskStatus::Processing,
        "completed" => TaskStatus::Completed,
        "failed" => TaskStatus::Failed,
        "cancelled" => TaskStatus::Cancelled,
        _ => TaskStatus::Queued,
    }
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let role: String = row.get(3)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    let metadata_json: Option<String> = row.get(8)?;
    let metadata: Option<WorkItemMetadata> = metadata_json.and_then(|j| serde_json::from_str(&j).ok());
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        agent_id: row.get(2)?,
        role: parse_role(&role),
        content: row.get(4)?,
        status: parse_status(&status),
        created_at: parse_rfc3339(&created_at),
        updated_at: parse_rfc3339(&updated_at),
        metadata,
    })
}
