use crate::db::Store;
use crate::error::StoreError;
use chrono::Utc;
use domain::Project;

impl Store {
    pub async fn create_project(&self, name: &str) -> Result<Project, StoreError> {
        let project = Project {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        let conn = self.conn();
        let p = project.clone();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            conn.execute(
                "INSERT INTO projects (id, name, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![p.id, p.name, p.created_at.to_rfc3339()],
            )?;
            Ok::<_, StoreError>(())
        })?;
        Ok(project)
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, StoreError> {
        let conn = self.conn();
        let id = id.to_string();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            conn.query_row(
                "SELECT id, name, created_at FROM projects WHERE id = ?1",
                rusqlite::params![id],
                row_to_project,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("project {id}")),
                other => other.into(),
            })
        })
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let conn = self.conn();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let mut stmt = conn.prepare("SELECT id, name, created_at FROM projects ORDER BY created_at ASC")?;
            let rows = stmt.query_map([], row_to_project)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
        })
    }

    pub async fn delete_project(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn();
        let id = id.to_string();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            conn.execute("DELETE FROM projects WHERE id = ?1", rusqlite::params![id])?;
            Ok(())
        })
    }
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    let created_at: String = row.get(2)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: parse_rfc3339(&created_at),
    })
}

pub(crate) fn parse_rfc3339(s: &str) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn create_then_get_round_trips() {
        let store = Store::open_in_memory().unwrap();
        let project = store.create_project("demo").await.unwrap();
        let fetched = store.get_project(&project.id).await.unwrap();
        assert_eq!(fetched, project);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn get_missing_project_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = store.get_project("nonexistent").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn list_projects_orders_by_created_at() {
        let store = Store::open_in_memory().unwrap();
        let a = store.create_project("a").await.unwrap();
        let b = store.create_project("b").await.unwrap();
        let list = store.list_projects().await.unwrap();
        assert_eq!(list.iter().map(|p| &p.id).collect::<Vec<_>>(), vec![&a.id, &b.id]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_project_removes_it() {
        let store = Store::open_in_memory().unwrap();
        let project = store.create_project("demo").await.unwrap();
        store.delete_project(&project.id).await.unwrap();
        assert!(matches!(store.get_project(&project.id).await, Err(StoreError::NotFound(_))));
    }
}
