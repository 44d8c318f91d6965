pub mod client;
pub mod gviz;
pub mod locator;
pub mod parser;

pub use client::{DataSource, GoogleSheetsSource};
pub use gviz::{RawCell, RawRow};
pub use locator::SheetLocator;
pub use parser::SnapshotParser;
