use crate::db::Store;
use crate::error::StoreError;
use domain::{Agent, AgentToolServer, OutputFormat};
use std::collections::BTreeMap;

impl Store {
    pub async fn create_agent(&self, agent: Agent) -> Result<Agent, StoreError> {
        let conn = self.conn();
        let a = agent.clone();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            conn.execute(
                "INSERT INTO agents (id, project_id, name, description, instructions, output_format, tool_servers_json, env_variables_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    a.id,
                    a.project_id,
                    a.name,
                    a.description,
                    a.instructions,
                    output_format_str(a.output_format),
                    serde_json::to_string(&a.tool_servers).unwrap_or_else(|_| "[]".into()),
                    serde_json::to_string(&a.env_variables).unwrap_or_else(|_| "{}".into()),
                ],
            )?;
            Ok::<_, StoreError>(())
        })?;
        Ok(agent)
    }

    pub async fn get_agent(&self, id: &str) -> Result<Agent, StoreError> {
        let conn = self.conn();
        let id = id.to_string();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            conn.query_row(
                "SELECT id, project_id, name, description, instructions, output_format, tool_servers_json, env_variables_json
                 FROM agents WHERE id = ?1",
                rusqlite::params![id],
                row_to_agent,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("agent {id}")),
                other => other.into(),
            })
        })
    }

    pub async fn list_agents(&self, project_id: &str) -> Result<Vec<Agent>, StoreError> {
        let conn = self.conn();
        let project_id = project_id.to_string();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let mut stmt = conn.prepare(
                "SELECT id, project_id, name, description, instructions, output_format, tool_servers_json, env_variables_json
                 FROM agents WHERE project_id = ?1 ORDER BY name ASC",
            )?;
            let rows = stmt.query_map(rusqlite::params![project_id], row_to_agent)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
        })
    }

    pub async fn delete_agent(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn();
        let id = id.to_string();
        tokio::task::block_in_place(move || {
            let conn = conn.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            conn.execute("DELETE FROM agents WHERE id = ?1", rusqlite::params![id])?;
            Ok(())
        })
    }
}

fn output_format_str(f: OutputFormat) -> &'static str {
    match f {
        OutputFormat::Text => "text",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "markdown",
    }
}

fn parse_output_format(s: &str) -> Result<OutputFormat, StoreError> {
    match s {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        "markdown" => Ok(OutputFormat::Markdown),
        other => Err(StoreError::Malformed(format!("unknown output_format {other}"))),
    }
}

fn row_to_agent(row: &rusqlite::Row) -> rusqlite::Result<Agent> {
    let output_format: String = row.get(5)?;
    let tool_servers_json: String = row.get(6)?;
    let env_variables_json: String = row.get(7)?;
    let tool_servers: Vec<AgentToolServer> = serde_json::from_str(&tool_servers_json).unwrap_or_default();
    let env_variables: BTreeMap<String, String> = serde_json::from_str(&env_variables_json).unwrap_or_default();
    Ok(Agent {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        instructions: row.get(4)?,
        output_format: parse_output_format(&output_format).unwrap_or(OutputFormat::Text),
        tool_servers,
        env_variables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_agent(project_id: &str) -> Agent {
        Agent {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            name: "analyst".into(),
            description: "answers data questions".into(),
            instructions: "be concise".into(),
            output_format: OutputFormat::Markdown,
            tool_servers: vec![AgentToolServer {
                tool_type: "mcp".into(),
                server_url: "http://tools.example/mcp".into(),
            }],
            env_variables: BTreeMap::from([("LOG_LEVEL".to_string(), "debug".to_string())]),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_then_get_round_trips_nested_fields() {
        let store = Store::open_in_memory().unwrap();
        let project = store.create_project("p").await.unwrap();
        let agent = store.create_agent(sample_agent(&project.id)).await.unwrap();
        let fetched = store.get_agent(&agent.id).await.unwrap();
        assert_eq!(fetched, agent);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn list_agents_scopes_to_project() {
        let store = Store::open_in_memory().unwrap();
        let p1 = store.create_project("p1").await.unwrap();
        let p2 = store.create_project("p2").await.unwrap();
        store.create_agent(sample_agent(&p1.id)).await.unwrap();
        store.create_agent(sample_agent(&p2.id)).await.unwrap();

        let agents_p1 = store.list_agents(&p1.id).await.unwrap();
        assert_eq!(agents_p1.len(), 1);
        assert_eq!(agents_p1[0].project_id, p1.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_agent_removes_it() {
        let store = Store::open_in_memory().unwrap();
        let project = store.create_project("p").await.unwrap();
        let agent = store.create_agent(sample_agent(&project.id)).await.unwrap();
        store.delete_agent(&agent.id).await.unwrap();
        assert!(matches!(store.get_agent(&agent.id).await, Err(StoreError::NotFound(_))));
    }
}
