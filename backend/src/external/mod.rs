//! External API integrations

pub mod pos;

pub use pos::PosClient;
