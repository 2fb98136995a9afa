//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the operations that accept caller input
//! - Report types where an operation returns more than the row

pub mod certificate;
pub mod course;
pub mod enrollment;
pub mod participant;
pub mod payment;
pub mod pre_registration;
pub mod price_schedule;
pub mod report;
pub mod status;
