pub mod copy;
pub mod delete;
pub mod dispatch;
pub mod export;
pub mod import;
