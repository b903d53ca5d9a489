//! taskhub workflow: the operations that change tasks and comments,
//! and everything that happens because of them.
//!
//! Services are generic over the repository traits in `taskhub-core`,
//! so this crate never depends on a storage engine.

pub mod activity;
pub mod comment_service;
pub mod config;
pub mod email;
pub mod notify;
pub mod realtime;
pub mod side_effect;
pub mod task_service;

pub use activity::ActivityRecorder;
pub use comment_service::CommentService;
pub use config::WorkflowConfig;
pub use email::{EmailDispatcher, NoEmail};
pub use notify::NotificationService;
pub use realtime::{RealtimeEvent, RealtimePublisher, RealtimeSession, RoomHub};
pub use side_effect::SideEffects;
pub use task_service::TaskService;
