//! Integration tests for `store::Store` against a real file-backed sqlite
//! database (unit tests elsewhere in the crate use `open_in_memory`).
//! Uses the multi-thread runtime so `block_in_place` is allowed.

use domain::{Agent, OutputFormat, TaskRole, TaskStatus, WorkItemMetadata};
use store::Store;
use tempfile::NamedTempFile;

fn sample_agent(project_id: &str) -> Agent {
    Agent {
        id: uuid::Uuid::new_v4().to_string(),
        project_id: project_id.to_string(),
        name: "analyst".into(),
        description: "answers data questions".into(),
        instructions: "be concise".into(),
        output_format: OutputFormat::Text,
        tool_servers: vec![],
        env_variables: Default::default(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn reopening_the_same_file_preserves_state() {
    let file = NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();

    let store1 = Store::new(&path).unwrap();
    let project = store1.create_project("demo").await.unwrap();
    drop(store1);

    let store2 = Store::new(&path).unwrap();
    let fetched = store2.get_project(&project.id).await.unwrap();
    assert_eq!(fetched, project);
}

#[tokio::test(flavor = "multi_thread")]
async fn end_to_end_happy_path_queued_to_completed() {
    let store = Store::open_in_memory().unwrap();
    let project = store.create_project("demo").await.unwrap();
    let agent = store.create_agent(sample_agent(&project.id)).await.unwrap();

    let (user_task, assistant_task) = store
        .create_message_pair(
            &project.id,
            &agent.id,
            "what were last month's sales?",
            WorkItemMetadata::default(),
            |_, _| Ok(()),
        )
        .await
        .unwrap();

    assert_eq!(user_task.status, TaskStatus::Queued);
    assert_eq!(assistant_task.status, TaskStatus::Queued);

    // Early-ack flow: user task completes immediately, assistant starts processing.
    store.update_task(&user_task.id, TaskStatus::Completed, "what were last month's sales?").await.unwrap();
    store.update_task(&assistant_task.id, TaskStatus::Processing, "{\"status\":\"Gathering Context\"}").await.unwrap();

    // A couple of streaming content updates while still processing.
    store.update_task(&assistant_task.id, TaskStatus::Processing, "{\"status\":\"Generating Response\"}").await.unwrap();

    store
        .update_task(&assistant_task.id, TaskStatus::Completed, "{\"response\":\"sales were up 12%\"}")
        .await
        .unwrap();

    let final_user = store.get_task(&user_task.id).await.unwrap();
    let final_assistant = store.get_task(&assistant_task.id).await.unwrap();
    assert_eq!(final_user.status, TaskStatus::Completed);
    assert_eq!(final_user.role, TaskRole::User);
    assert_eq!(final_assistant.status, TaskStatus::Completed);
    assert_eq!(final_assistant.role, TaskRole::Assistant);
    assert!(final_assistant.content.contains("sales were up 12%"));

    let history = store.list_agent_tasks(&agent.id).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_race_cancelled_task_cannot_become_completed() {
    let store = Store::open_in_memory().unwrap();
    let project = store.create_project("demo").await.unwrap();
    let agent = store.create_agent(sample_agent(&project.id)).await.unwrap();
    let (_, assistant_task) = store
        .create_message_pair(&project.id, &agent.id, "long query", WorkItemMetadata::default(), |_, _| Ok(()))
        .await
        .unwrap();

    store.update_task(&assistant_task.id, TaskStatus::Processing, "").await.unwrap();
    store.cancel_task(&assistant_task.id).await.unwrap();

    // Worker tries to complete after the cancellation raced ahead of it.
    let after = store
        .update_task(&assistant_task.id, TaskStatus::Completed, "{\"response\":\"too late\"}")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.status, TaskStatus::Cancelled);
}
