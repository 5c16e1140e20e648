//! HTTP handlers for the delivery tracker API

pub mod drafts;
pub mod health;
pub mod history;
pub mod inventory;
pub mod receipts;

pub use drafts::*;
pub use health::*;
pub use history::*;
pub use inventory::*;
pub use receipts::*;
