//! Read-side tests: filtered search, denormalized enrichment, and the
//! recent-history window.

use taskboard::config::Config;
use taskboard::history::HistoryLog;
use taskboard::projects::NewProject;
use taskboard::tasks::{NewTask, TaskFilter, TaskPriority, TaskStatus};
use taskboard::users::NewUser;
use taskboard::AppContext;
use tempfile::TempDir;

async fn make_ctx(dir: &TempDir) -> AppContext {
    AppContext::init(Config {
        data_dir: dir.path().to_path_buf(),
        log_level: "error".to_string(),
        ..Default::default()
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn search_without_predicates_returns_every_task() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    for title in ["one", "two", "three"] {
        ctx.tasks.create_task(&NewTask::new(title), "u1").await.unwrap();
    }

    let all = ctx.tasks.search(&TaskFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    // Empty-string predicates count as absent.
    let filter = TaskFilter {
        text: Some(String::new()),
        status: Some(String::new()),
        ..Default::default()
    };
    assert_eq!(ctx.tasks.search(&filter).await.unwrap().len(), 3);
}

#[tokio::test]
async fn text_filter_is_case_insensitive_over_title_and_description() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    ctx.tasks
        .create_task(&NewTask::new("Fix LOGIN page"), "u1")
        .await
        .unwrap();
    ctx.tasks
        .create_task(
            &NewTask {
                description: Some("broken login flow".to_string()),
                ..NewTask::new("Bug report")
            },
            "u1",
        )
        .await
        .unwrap();
    ctx.tasks
        .create_task(&NewTask::new("Unrelated"), "u1")
        .await
        .unwrap();

    let filter = TaskFilter {
        text: Some("login".to_string()),
        ..Default::default()
    };
    assert_eq!(ctx.tasks.search(&filter).await.unwrap().len(), 2);
}

#[tokio::test]
async fn status_filter_is_case_sensitive_exact_match() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    ctx.tasks
        .create_task(
            &NewTask {
                status: TaskStatus::Completed,
                ..NewTask::new("done")
            },
            "u1",
        )
        .await
        .unwrap();
    ctx.tasks.create_task(&NewTask::new("pending"), "u1").await.unwrap();

    let filter = TaskFilter {
        status: Some("Completada".to_string()),
        ..Default::default()
    };
    let hits = ctx.tasks.search(&filter).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "done");

    // Exact match, unlike the text predicate.
    let filter = TaskFilter {
        status: Some("completada".to_string()),
        ..Default::default()
    };
    assert!(ctx.tasks.search(&filter).await.unwrap().is_empty());
}

#[tokio::test]
async fn predicates_are_conjunctive() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    ctx.tasks
        .create_task(
            &NewTask {
                priority: TaskPriority::High,
                assigned_to: Some("u2".to_string()),
                ..NewTask::new("high for u2")
            },
            "u1",
        )
        .await
        .unwrap();
    ctx.tasks
        .create_task(
            &NewTask {
                priority: TaskPriority::High,
                ..NewTask::new("high unassigned")
            },
            "u1",
        )
        .await
        .unwrap();
    ctx.tasks
        .create_task(
            &NewTask {
                assigned_to: Some("u2".to_string()),
                ..NewTask::new("medium for u2")
            },
            "u1",
        )
        .await
        .unwrap();

    let filter = TaskFilter {
        priority: Some("Alta".to_string()),
        assigned_to: Some("u2".to_string()),
        ..Default::default()
    };
    let hits = ctx.tasks.search(&filter).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "high for u2");
}

#[tokio::test]
async fn enrichment_resolves_names_and_nulls_dangling_references() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    let project = ctx
        .projects
        .create(
            &NewProject {
                name: "Backend".to_string(),
                description: None,
            },
            "u1",
        )
        .await
        .unwrap();
    let user = ctx
        .users
        .create(&NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            hashed_password: "$argon2$stub".to_string(),
        })
        .await
        .unwrap();

    ctx.tasks
        .create_task(
            &NewTask {
                project_id: Some(project.id.clone()),
                assigned_to: Some(user.id.clone()),
                ..NewTask::new("resolved")
            },
            "u1",
        )
        .await
        .unwrap();
    ctx.tasks
        .create_task(
            &NewTask {
                project_id: Some("no-such-project".to_string()),
                assigned_to: Some("no-such-user".to_string()),
                ..NewTask::new("dangling")
            },
            "u1",
        )
        .await
        .unwrap();
    ctx.tasks
        .create_task(&NewTask::new("bare"), "u1")
        .await
        .unwrap();

    let detailed = ctx.tasks.list_with_details().await.unwrap();
    assert_eq!(detailed.len(), 3);

    let resolved = detailed.iter().find(|t| t.task.title == "resolved").unwrap();
    assert_eq!(resolved.project_name.as_deref(), Some("Backend"));
    assert_eq!(resolved.assigned_to_name.as_deref(), Some("alice"));

    let dangling = detailed.iter().find(|t| t.task.title == "dangling").unwrap();
    assert_eq!(dangling.project_name, None);
    assert_eq!(dangling.assigned_to_name, None);

    let bare = detailed.iter().find(|t| t.task.title == "bare").unwrap();
    assert_eq!(bare.project_name, None);
    assert_eq!(bare.assigned_to_name, None);

    // Wire shape: task fields flattened beside the resolved names.
    let json = serde_json::to_value(resolved).unwrap();
    assert_eq!(json["status"], "Pendiente");
    assert_eq!(json["project_name"], "Backend");
    assert_eq!(json["assigned_to_name"], "alice");
}

#[tokio::test]
async fn recent_history_is_newest_first_and_clamped() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    for title in ["first", "second", "third"] {
        ctx.tasks.create_task(&NewTask::new(title), "u1").await.unwrap();
    }

    let log = HistoryLog::new(ctx.storage.pool());
    let recent = log.list_recent(None).await.unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].new_value.as_deref(), Some("third"));
    assert_eq!(recent[2].new_value.as_deref(), Some("first"));

    assert_eq!(log.list_recent(Some(2)).await.unwrap().len(), 2);
    // Oversized limits are clamped, not an error.
    assert_eq!(log.list_recent(Some(10_000)).await.unwrap().len(), 3);
}

#[tokio::test]
async fn project_and_assignee_listings() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    ctx.tasks
        .create_task(
            &NewTask {
                project_id: Some("p1".to_string()),
                assigned_to: Some("u2".to_string()),
                ..NewTask::new("both")
            },
            "u1",
        )
        .await
        .unwrap();
    ctx.tasks
        .create_task(
            &NewTask {
                project_id: Some("p1".to_string()),
                ..NewTask::new("project only")
            },
            "u1",
        )
        .await
        .unwrap();

    let store = taskboard::tasks::TaskStore::new(ctx.storage.pool());
    assert_eq!(store.list_by_project("p1").await.unwrap().len(), 2);
    assert_eq!(store.list_by_assignee("u2").await.unwrap().len(), 1);
    assert!(store.list_by_project("p2").await.unwrap().is_empty());
}
