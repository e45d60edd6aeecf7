//! Domain types, DTOs and derived-value formulas
//!
//! Each module owns one business area's entities plus the pure recomputation
//! formulas the route handlers apply when rows are saved or deleted.

pub mod contracts;
pub mod documents;
pub mod equipment;
pub mod evm;
pub mod fabrication;
pub mod hr;
pub mod locale;
pub mod numeric;
pub mod payments;
pub mod procurement;
pub mod projects;
pub mod quality;
pub mod refs;
pub mod tenders;
pub mod warehouse;
