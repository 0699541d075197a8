//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Menu price commands
pub mod menu;

/// Order placement and status commands
pub mod order;

/// Tax report commands
pub mod report;

// Export commands
pub use general::*;
pub use menu::*;
pub use order::*;
pub use report::*;
