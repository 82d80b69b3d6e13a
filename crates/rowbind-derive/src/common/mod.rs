//! Common utilities shared by the `Record` and `FromRow` derives.

pub mod fields;
pub mod syn_types;
