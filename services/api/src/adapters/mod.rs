pub mod checkout_gateway;
pub mod db;
pub mod email;
pub mod storage;

pub use checkout_gateway::HttpOrderGateway;
pub use db::DbAdapter;
pub use email::ResendEmailAdapter;
pub use storage::SupabaseStorageAdapter;
