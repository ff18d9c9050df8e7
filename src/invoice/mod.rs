//! Invoicing pipeline.
//!
//! `number` allocates invoice numbers, `builder` assembles and persists the
//! frozen order snapshot, `pdf` renders it to bytes and `store` keeps the
//! rendered documents addressable by invoice number.

pub mod builder;
pub mod number;
pub mod pdf;
pub mod store;

pub use builder::InvoiceService;
pub use store::PdfStore;
