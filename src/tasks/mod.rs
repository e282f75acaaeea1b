//! Task subsystem: domain types, persistence, and the mutation pipeline.

pub mod schema;
pub mod service;
pub mod store;

pub use schema::{
    HistoryAction, NewTask, NotificationType, TaskPatch, TaskPriority, TaskStatus,
};
pub use service::{TaskService, TaskWithDetails};
pub use store::{TaskFilter, TaskRow, TaskStore};
