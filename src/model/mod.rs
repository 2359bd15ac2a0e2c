pub mod category;
pub mod element;
pub mod project;

pub use category::{BuiltInCategory, Category, CategoryKind};
pub use element::{Element, Parameter, ParameterGroup};
pub use project::BuildingModel;
