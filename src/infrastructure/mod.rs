// Infrastructure module - Core background services and utilities
pub mod cancellable;
pub mod heartbeat;
pub mod http;
pub mod task_manager;
pub mod wait;

pub use cancellable::CancellableTask;
pub use heartbeat::HeartbeatManager;
pub use http::{
    HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, SerializedHttpClient,
    SimpleHttpClient,
};
pub use task_manager::TaskManager;
pub use wait::WaitManager;
