pub mod invoicing;
pub mod payer_directory;
