use crate::db::Store;
use crate::error::StoreError;
use crate::projects::parse_rfc3339;
use chrono::Utc;
use domain::{DataSource, DataSourceStatus, DataSourceType};

impl Store {
    pub async fn create_data_source(
        &self,
        project_id: &str,
        name: &str,
        kind: DataSourceType,
    ) -> Result<DataSource, StoreError> {
        let now = Utc::now();
        let ds = DataSource {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            name: name.to_string(),
            kind,
            status: DataSourceStatus::Configured,
            created_at: now,
            updated_at: now,
        };
        let conn = self.conn();
        let d = ds.clone();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            conn.execute(
                "INSERT INTO data_sources (id, project_id, name, kind_json, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    d.id,
                    d.project_id,
                    d.name,
                    serde_json::to_string(&d.kind).map_err(|e| StoreError::Malformed(e.to_string()))?,
                    status_str(d.status),
                    d.created_at.to_rfc3339(),
                    d.updated_at.to_rfc3339(),
                ],
            )?;
            Ok::<_, StoreError>(())
        })?;
        Ok(ds)
    }

    pub async fn get_data_source(&self, id: &str) -> Result<DataSource, StoreError> {
        let conn = self.conn();
        let id = id.to_string();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            conn.query_row(
                "SELECT id, project_id, name, kind_json, status, created_at, updated_at
                 FROM data_sources WHERE id = ?1",
                rusqlite::params![id],
                row_to_data_source,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("data source {id}")),
                other => other.into(),
            })
        })
    }

    pub async fn list_data_sources(&self, project_id: &str) -> Result<Vec<DataSource>, StoreError> {
        let conn = self.conn();
        let project_id = project_id.to_string();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let mut stmt = conn.prepare(
                "SELECT id, project_id, name, kind_json, status, created_at, updated_at
                 FROM data_sources WHERE project_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(rusqlite::params![project_id], row_to_data_source)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
        })
    }

    pub async fn update_data_source_status(&self, id: &str, status: DataSourceStatus) -> Result<(), StoreError> {
        let conn = self.conn();
        let id = id.to_string();
        let now = Utc::now().to_rfc3339();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let updated = conn.execute(
                "UPDATE data_sources SET status = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![status_str(status), now, id],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound(format!("data source {id}")));
            }
            Ok(())
        })
    }

    pub async fn delete_data_source(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn();
        let id = id.to_string();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            conn.execute("DELETE FROM data_sources WHERE id = ?1", rusqlite::params![id])?;
            Ok(())
        })
    }
}

fn status_str(s: DataSourceStatus) -> &'static str {
    match s {
        DataSourceStatus::Configured => "configured",
        DataSourceStatus::Connected => "connected",
        DataSourceStatus::Error => "error",
    }
}

fn parse_status(s: &str) -> DataSourceStatus {
    match s {
        "connected" => DataSourceStatus::Connected,
        "error" => DataSourceStatus::Error,
        _ => DataSourceStatus::Configured,
    }
}

fn row_to_data_source(row: &rusqlite::Row) -> rusqlite::Result<DataSource> {
    let kind_json: String = row.get(3)?;
    let status: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;
    let kind: DataSourceType = serde_json::from_str(&kind_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(DataSource {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        kind,
        status: parse_status(&status),
        created_at: parse_rfc3339(&created_at),
        updated_at: parse_rfc3339(&updated_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::GithubConfig;

    #[tokio::test(flavor = "multi_thread")]
    async fn create_then_get_round_trips() {
        let store = Store::open_in_memory().unwrap();
        let project = store.create_project("p").await.unwrap();
        let kind = DataSourceType::Github(GithubConfig {
            access_token: "tok".into(),
            extra: Default::default(),
        });
        let ds = store.create_data_source(&project.id, "main", kind).await.unwrap();
        assert_eq!(ds.status, DataSourceStatus::Configured);
        let fetched = store.get_data_source(&ds.id).await.unwrap();
        assert_eq!(fetched, ds);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_status_then_is_connected() {
        let store = Store::open_in_memory().unwrap();
        let project = store.create_project("p").await.unwrap();
        let kind = DataSourceType::Github(GithubConfig {
            access_token: "tok".into(),
            extra: Default::default(),
        });
        let ds = store.create_data_source(&project.id, "main", kind).await.unwrap();
        store.update_data_source_status(&ds.id, DataSourceStatus::Connected).await.unwrap();
        let fetched = store.get_data_source(&ds.id).await.unwrap();
        assert!(fetched.is_connected());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_status_missing_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = store.update_data_source_status("nonexistent", DataSourceStatus::Connected).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn list_data_sources_scopes_to_project() {
        let store = Store::open_in_memory().unwrap();
        let p1 = store.create_project("p1").await.unwrap();
        let p2 = store.create_project("p2").await.unwrap();
        let kind = || DataSourceType::Github(GithubConfig { access_token: "t".into(), extra: Default::default() });
        store.create_data_source(&p1.id, "a", kind()).await.unwrap();
        store.create_data_source(&p2.id, "b", kind()).await.unwrap();

        let list = store.list_data_sources(&p1.id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].project_id, p1.id);
    }
}
