//! Domain models for the delivery tracker

mod audit;
mod batch;
mod draft;
mod inventory;
mod line_item;

pub use audit::*;
pub use batch::*;
pub use draft::*;
pub use inventory::*;
pub use line_item::*;
