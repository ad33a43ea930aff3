//! Per-attempt phases run by the compiler.

mod derive_ports;
mod schema_heal;
mod structural_heal;
mod validate;

pub use derive_ports::{DefaultPortDeriver, PortDeriver};
pub use schema_heal::{delivered_schema, heal_schemas, schemas_compatible};
pub use structural_heal::heal_structure;
pub use validate::{validate, validate_structure};
