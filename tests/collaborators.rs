//! Tests for the collaborator stores (projects, users, comments), the
//! notification outbox contract, and username enrichment of the audit feed.

use taskboard::config::Config;
use taskboard::error::Error;
use taskboard::projects::{NewProject, ProjectPatch};
use taskboard::tasks::{NewTask, NotificationType};
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

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        hashed_password: "$argon2$stub".to_string(),
    }
}

#[tokio::test]
async fn duplicate_project_name_is_a_conflict() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    let project = NewProject {
        name: "Roadmap".to_string(),
        description: None,
    };
    ctx.projects.create(&project, "u1").await.unwrap();

    let err = ctx.projects.create(&project, "u2").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::Conflict(_))
    ));
}

#[tokio::test]
async fn project_update_and_delete_report_applied() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    let project = ctx
        .projects
        .create(
            &NewProject {
                name: "Ops".to_string(),
                description: None,
            },
            "u1",
        )
        .await
        .unwrap();

    assert!(!ctx
        .projects
        .update(&project.id, &ProjectPatch::default())
        .await
        .unwrap());

    let patch = ProjectPatch {
        description: Some(Some("infra work".to_string())),
        ..Default::default()
    };
    assert!(ctx.projects.update(&project.id, &patch).await.unwrap());
    assert!(!ctx.projects.update("missing", &patch).await.unwrap());

    let reloaded = ctx.projects.get(&project.id).await.unwrap().unwrap();
    assert_eq!(reloaded.description.as_deref(), Some("infra work"));

    assert!(ctx.projects.delete(&project.id).await.unwrap());
    assert!(!ctx.projects.delete(&project.id).await.unwrap());
}

#[tokio::test]
async fn duplicate_username_or_email_is_a_conflict() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    ctx.users
        .create(&new_user("bob", "bob@example.com"))
        .await
        .unwrap();

    let err = ctx
        .users
        .create(&new_user("bob", "other@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::Conflict(_))
    ));

    let err = ctx
        .users
        .create(&new_user("bobby", "bob@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::Conflict(_))
    ));

    assert!(ctx.users.create(&new_user("ab", "ab@x.io")).await.is_err());

    let found = ctx.users.find_by_username("bob").await.unwrap().unwrap();
    assert_eq!(found.email, "bob@example.com");
}

#[tokio::test]
async fn notification_read_flag_is_monotone() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    let first = ctx
        .notifications
        .create("u2", "uno", NotificationType::TaskAssigned)
        .await
        .unwrap();
    ctx.notifications
        .create("u2", "dos", NotificationType::TaskUpdated)
        .await
        .unwrap();

    assert_eq!(
        ctx.notifications.list_for_user("u2", true).await.unwrap().len(),
        2
    );

    assert!(ctx.notifications.mark_read(&first.id).await.unwrap());
    // Already read — nothing changes.
    assert!(!ctx.notifications.mark_read(&first.id).await.unwrap());
    assert!(!ctx.notifications.mark_read("missing").await.unwrap());

    let unread = ctx.notifications.list_for_user("u2", true).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].message, "dos");

    assert!(ctx.notifications.mark_all_read("u2").await.unwrap());
    assert!(!ctx.notifications.mark_all_read("u2").await.unwrap());
    assert!(ctx
        .notifications
        .list_for_user("u2", true)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        ctx.notifications.list_for_user("u2", false).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn comments_are_ordered_and_enriched_with_usernames() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    let alice = ctx
        .users
        .create(&new_user("alice", "alice@example.com"))
        .await
        .unwrap();
    let task = ctx
        .tasks
        .create_task(&NewTask::new("Discuss"), &alice.id)
        .await
        .unwrap();

    ctx.comments
        .create(&task.id, &alice.id, "first!")
        .await
        .unwrap();
    ctx.comments
        .create(&task.id, "ghost-user", "second")
        .await
        .unwrap();
    assert!(ctx.comments.create(&task.id, &alice.id, "   ").await.is_err());

    let comments = ctx
        .comments
        .list_for_task_with_usernames(&ctx.directory, &task.id)
        .await
        .unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].comment.content, "first!");
    assert_eq!(comments[0].username, "alice");
    assert_eq!(comments[1].username, "Unknown");
}

#[tokio::test]
async fn history_feed_resolves_actor_usernames() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir).await;

    let alice = ctx
        .users
        .create(&new_user("alice", "alice@example.com"))
        .await
        .unwrap();
    let task = ctx
        .tasks
        .create_task(&NewTask::new("Audited"), &alice.id)
        .await
        .unwrap();
    ctx.tasks.delete_task(&task.id, "ghost-user").await.unwrap();

    let feed = ctx.history.for_task(&task.id).await.unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].entry.action, "CREATED");
    assert_eq!(feed[0].username, "alice");
    assert_eq!(feed[1].entry.action, "DELETED");
    assert_eq!(feed[1].username, "Unknown");

    let recent = ctx.history.recent(None).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].entry.action, "DELETED");
}
