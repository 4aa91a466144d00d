pub mod app;
pub mod init;
pub mod repo;

pub use app::*;
pub use init::*;
pub use repo::*;
