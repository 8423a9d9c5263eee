// Carbon Calc - Core Library
// Embodied-carbon add/omit calculator used by the CLI and terminal UI

pub mod calculator;
pub mod config;
pub mod error;
pub mod ice_db;   // Reference table (ICE DB)
pub mod quantity;
pub mod session;  // Line items + add/omit lists
pub mod store;    // Saved calculations
pub mod totals;

// Re-export commonly used types
pub use calculator::Calculator;
pub use config::AppConfig;
pub use error::{CalcError, Result};
pub use ice_db::{IceDb, MaterialRecord};
pub use quantity::{compute_quantity, Dimensions};
pub use session::{Bucket, LineItem, Session};
pub use store::SessionStore;
pub use totals::{format_kg, Totals};
