pub mod config;
pub mod error;
pub mod escrow;
pub mod types;
pub mod validate;

pub use config::{Config, DeploymentFile};
pub use error::{Error, ErrorKind, Result};
pub use escrow::EscrowClient;
pub use types::*;
