//! External API integrations

pub mod receipt_recognition;
pub mod webhook;

pub use receipt_recognition::ReceiptRecognitionClient;
pub use webhook::WebhookClient;
