use std::sync::Arc;

use ashley_db::repositories::EventRepo;
use ashley_events::{EventBus, EventPersistence, PlatformEvent};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn persistence_task_drains_bus_and_stops_on_drop(pool: PgPool) {
    let (workspace_id,): (i64,) =
        sqlx::query_as("INSERT INTO workspaces (name, slug) VALUES ('Acme', 'acme') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();

    let bus = Arc::new(EventBus::default());
    let task = tokio::spawn(EventPersistence::run(pool.clone(), bus.subscribe()));

    bus.publish(
        PlatformEvent::new("order.created")
            .in_workspace(workspace_id)
            .with_source("order", 1)
            .with_payload(serde_json::json!({"status": "draft"})),
    );
    bus.publish(PlatformEvent::new("order.status_changed").in_workspace(workspace_id));

    // Dropping the last sender closes the channel after the buffered events
    // are delivered.
    drop(bus);
    task.await.unwrap();

    let events = EventRepo::list_recent(&pool, workspace_id, None, 10).await.unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().any(|e| e.event_type == "order.created"
        && e.source_entity_id == Some(1)
        && e.payload["status"] == "draft"));

    let filtered = EventRepo::list_recent(&pool, workspace_id, Some("order.status_changed"), 10)
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
}
