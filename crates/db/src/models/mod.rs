//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and, for tables the ingestion path writes, an insert DTO.

pub mod alert;
pub mod audit;
pub mod machine;
pub mod occurrence;
pub mod telemetry;
