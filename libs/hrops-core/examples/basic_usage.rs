//! Basic usage example for hrops-core
//!
//! This example demonstrates:
//! - Opening an in-memory database with the schema applied
//! - Resolving a session identity after the stores are built
//! - Creating, completing and listing tasks
//! - Publishing department and company-wide notices

use hrops_core::{
    CreateNoticeRequest, CreateTaskRequest, HrOpsDatabase, HrOpsError, IdentityContext,
    NoticeStore, SessionIdentity, StoreContext, TaskStore,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), HrOpsError> {
    let db = HrOpsDatabase::in_memory().await?;

    // Stores can exist before the session is known; reads are empty until then
    let identity = SessionIdentity::anonymous();
    let context = StoreContext::new(Arc::new(db), identity.clone());
    let tasks = TaskStore::new(&context);
    let notices = NoticeStore::new(&context);

    println!("Before sign-in: {} tasks", tasks.fetch_tasks().await.len());

    identity.set(IdentityContext::new(
        Some(42),
        Some(uuid::Uuid::new_v4()),
        Some(1),
    ));

    println!("\n=== Tasks ===");
    let created = tasks
        .create_task(&CreateTaskRequest {
            task_title: "Review PR".to_string(),
            assignees: vec!["u1".to_string()],
            ..Default::default()
        })
        .await?;
    println!("Created: {}", serde_json::to_string(&created)?);

    if let Some(id) = created.data.and_then(|task| task.id) {
        tasks.complete_task(id).await?;
    }
    println!("Ongoing: {}", tasks.fetch_ongoing_tasks().await.len());
    println!("Completed: {}", tasks.fetch_completed_tasks().await.len());

    println!("\n=== Notices ===");
    notices
        .create_notice(&CreateNoticeRequest {
            title: "Code freeze".to_string(),
            ..Default::default()
        })
        .await?;
    notices
        .create_notice(&CreateNoticeRequest {
            title: "Office closed Friday".to_string(),
            department_id: Some(None),
            ..Default::default()
        })
        .await?;
    for notice in notices.fetch_notices().await {
        println!("  - {} (department {:?})", notice.title, notice.department_id);
    }

    Ok(())
}
