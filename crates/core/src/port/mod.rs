// Port Layer - Interfaces to collaborators outside the pipeline

pub mod code_table;
pub mod events;

// Re-exports
pub use code_table::{code, CodeTable, StandardCodes};
pub use events::Events;

#[cfg(test)]
pub use code_table::MockCodeTable;
