//! taskboard — task-tracking backend core.
//!
//! Tasks, projects, users, comments, a per-task append-only audit history,
//! and per-user notifications over SQLite. The centerpiece is the task
//! mutation pipeline ([`tasks::TaskService`]): creating, updating, or
//! deleting a task deterministically derives audit entries and cross-entity
//! notifications, and the read side joins tasks against project/user display
//! names. Transport, authentication, and reporting live outside this crate.

pub mod comments;
pub mod config;
pub mod directory;
pub mod error;
pub mod history;
pub mod notifications;
pub mod projects;
pub mod storage;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use anyhow::Result;

use comments::CommentStore;
use config::Config;
use directory::DirectoryLookup;
use history::{HistoryFeed, HistoryLog};
use notifications::NotificationOutbox;
use projects::ProjectStore;
use storage::Storage;
use tasks::{TaskService, TaskStore};
use users::UserStore;

/// Shared application state: one [`Storage`] handle and every store/service
/// built from it. Construct once at process start, pass by clone, shut down
/// at exit.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub storage: Arc<Storage>,
    pub tasks: TaskService,
    pub history: HistoryFeed,
    pub notifications: NotificationOutbox,
    pub projects: ProjectStore,
    pub users: UserStore,
    pub comments: CommentStore,
    pub directory: DirectoryLookup,
}

impl AppContext {
    pub async fn init(config: Config) -> Result<Self> {
        let storage =
            Arc::new(Storage::open_with_slow_query(&config.data_dir, config.slow_query_ms).await?);
        let pool = storage.pool();

        let directory = DirectoryLookup::new(pool.clone());
        let history_log = HistoryLog::new(pool.clone());
        let notifications = NotificationOutbox::new(pool.clone());
        let tasks = TaskService::new(
            TaskStore::new(pool.clone()),
            history_log.clone(),
            notifications.clone(),
            directory.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            storage,
            tasks,
            history: HistoryFeed::new(history_log, directory.clone()),
            notifications,
            projects: ProjectStore::new(pool.clone()),
            users: UserStore::new(pool.clone()),
            comments: CommentStore::new(pool),
            directory,
        })
    }

    pub async fn shutdown(&self) {
        self.storage.close().await;
    }
}
