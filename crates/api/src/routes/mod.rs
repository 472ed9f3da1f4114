mod health;
mod session;
mod static_files;
mod trades;

pub use health::health_router;
pub use session::session_router;
pub use static_files::static_router;
pub use trades::trades_router;
