pub mod ifc;
pub mod step;

pub use crate::error::ParseError;
pub use ifc::{build_model, parse_ifc_file};
pub use step::{StepEntity, StepFile, StepValue};
