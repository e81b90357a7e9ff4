//! Supporting services.

pub mod locale;

pub use locale::Catalog;
