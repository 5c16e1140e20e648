//! Business logic services for the delivery tracker

pub mod drafts;
pub mod history;
pub mod inventory;
pub mod migration;
pub mod receipt;
pub mod submission;

pub use drafts::DraftService;
pub use history::HistoryService;
pub use inventory::InventoryService;
pub use migration::{
    CollectionReport, MigrationReport, MigrationService, LEGACY_DRAFTS, LEGACY_HISTORY,
    LEGACY_INVENTORY, LEGACY_PURCHASE_DRAFTS, MIGRATION_FLAG,
};
pub use receipt::{ReceiptImage, ReceiptRecognizer, ReceiptService, ScannedReceipt};
pub use submission::{DirectSaveOutcome, SubmissionEndpoint, SubmissionReceipt, SubmissionService};
