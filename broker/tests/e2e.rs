//! End-to-end scenarios over the HTTP surface plus an in-process worker loop
//! (spec.md §8 scenarios 1-2), modelled on the teacher's
//! `serve/tests/e2e/common.rs::spawn_server_once` bind-to-port-0-and-spawn
//! pattern, generalized from a WebSocket client to a `reqwest` HTTP client.

use objectstore::LocalFsStore;
use reasoninggraph::{MockReasoningGraph, ScriptedEmission};
use std::sync::Arc;
use std::time::Duration;
use store::Store;
use tokio::net::TcpListener;
use workqueue::{InMemoryWorkQueue, WorkQueue};

struct Harness {
    base_url: String,
    client: reqwest::Client,
    project_id: String,
    agent_id: String,
    _temp: tempfile::TempDir,
}

async fn spawn(script: Vec<ScriptedEmission>) -> Harness {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let queue: Arc<dyn WorkQueue> = Arc::new(InMemoryWorkQueue::new());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(broker::run_broker_on_listener(listener, store.clone(), queue.clone()));

    let temp = tempfile::tempdir().unwrap();
    let worker_deps = Arc::new(worker::WorkerDeps {
        store: store.clone(),
        queue: queue.clone(),
        blob_store: Arc::new(LocalFsStore::new(temp.path().join("objects"))),
        graph: Arc::new(MockReasoningGraph::new(script)),
        local_base: temp.path().join("local"),
        max_message_age: Duration::from_secs(3600),
        project_tool_servers: vec![],
        external_mcp_server_url: None,
    });
    tokio::spawn(worker::run_forever(worker_deps));

    let client = reqwest::Client::new();
    let base_url = format!("http://{addr}");

    let project: domain::Project = client
        .post(format!("{base_url}/projects"))
        .json(&serde_json::json!({"name": "p1"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let agent: domain::Agent = client
        .post(format!("{base_url}/projects/{}/agents", project.id))
        .json(&serde_json::json!({"name": "a1"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    Harness { base_url, client, project_id: project.id, agent_id: agent.id, _temp: temp }
}

impl Harness {
    async fn post_message(&self, content: &str) -> serde_json::Value {
        self.client
            .post(format!("{}/projects/{}/agents/{}/messages", self.base_url, self.project_id, self.agent_id))
            .json(&serde_json::json!({"content": content}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn cancel(&self, task_id: &str) {
        self.client
            .post(format!("{}/projects/{}/agents/{}/tasks/{}/cancel", self.base_url, self.project_id, self.agent_id, task_id))
            .send()
            .await
            .unwrap();
    }

    async fn get_task(&self, task_id: &str) -> serde_json::Value {
        self.client
            .get(format!("{}/projects/{}/agents/{}/tasks/{}", self.base_url, self.project_id, self.agent_id, task_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn poll_until_terminal(&self, task_id: &str, within: Duration) -> serde_json::Value {
        tokio::time::timeout(within, async {
            loop {
                let task = self.get_task(task_id).await;
                if matches!(task["status"].as_str(), Some("completed" | "failed" | "cancelled")) {
                    return task;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("task did not reach a terminal status in time")
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn happy_path_returns_queued_then_completes_with_a_response() {
    let h = spawn(vec![
        ScriptedEmission::new("question", serde_json::json!("what tables do we have?")),
        ScriptedEmission::new("generation", serde_json::json!("orders and customers")),
    ])
    .await;

    let created = h.post_message("What tables do we have?").await;
    assert_eq!(created["user_task"]["status"], "completed");
    assert_eq!(created["assistant_task"]["status"], "queued");
    let assistant_id = created["assistant_task"]["id"].as_str().unwrap().to_string();

    let task = h.poll_until_terminal(&assistant_id, Duration::from_secs(5)).await;
    assert_eq!(task["status"], "completed");
    let content: serde_json::Value = serde_json::from_str(task["content"].as_str().unwrap()).unwrap();
    assert_eq!(content["response"], "orders and customers");
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_race_wins_over_a_slow_generation() {
    // A generation node delayed well past the cancel call gives the worker's
    // cancellation poll (before the "generation" emission) a real window to
    // observe the cancel before the graph would otherwise complete.
    let h = spawn(vec![
        ScriptedEmission::new("question", serde_json::json!("hi")),
        ScriptedEmission::new("generation", serde_json::json!("too late")).after(Duration::from_millis(300)),
    ])
    .await;

    let created = h.post_message("hi").await;
    let assistant_id = created["assistant_task"]["id"].as_str().unwrap().to_string();
    h.cancel(&assistant_id).await;

    let task = h.poll_until_terminal(&assistant_id, Duration::from_secs(5)).await;
    assert_eq!(task["status"], "cancelled");
    let content: serde_json::Value = serde_json::from_str(task["content"].as_str().unwrap()).unwrap();
    assert_eq!(content["response"], "Task was cancelled by user.");
    assert_eq!(content["cancelled"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_generation_classifies_as_failed_unless_cancelled_first() {
    let h = spawn(vec![ScriptedEmission::new("error", serde_json::json!({"error": "timeout"}))]).await;

    let created = h.post_message("hi").await;
    let assistant_id = created["assistant_task"]["id"].as_str().unwrap().to_string();

    let task = h.poll_until_terminal(&assistant_id, Duration::from_secs(5)).await;
    assert_eq!(task["status"], "failed");
    let content: serde_json::Value = serde_json::from_str(task["content"].as_str().unwrap()).unwrap();
    assert_eq!(content["response"], "Failed to generate response");
    assert_eq!(content["error"], true);
}
