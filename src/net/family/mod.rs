/*!
 * Protocol Family Module
 * Capability tables implemented by each protocol family
 */

pub mod table;
pub mod traits;

// Re-export public API
pub use table::FamilyTable;
pub use traits::{Accepted, ConnectProgress, ProtoFamily, ProtoSocket};
