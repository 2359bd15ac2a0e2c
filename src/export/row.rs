use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::schema::Schema;
use crate::error::ExportError;
use crate::model::{Element, Parameter};

/// What to do when one element carries several parameters with the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// The first parameter in element order wins.
    #[default]
    FirstWins,
    /// Fail the export with [`ExportError::DuplicateParameter`].
    Strict,
}

/// One CSV line: three fixed cells plus one cell per schema column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub name: String,
    pub type_name: String,
    pub shape: String,
    pub cells: Vec<String>,
}

impl ExportRow {
    /// All cells in output order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        [
            self.name.as_str(),
            self.type_name.as_str(),
            self.shape.as_str(),
        ]
        .into_iter()
        .chain(self.cells.iter().map(String::as_str))
    }
}

/// Left outer join of an element's parameters against the schema.
///
/// The schema drives: every column yields exactly one cell, the parameter's
/// display value or an empty string when the element lacks it.
pub fn materialize_row(
    element: &Element,
    schema: &Schema,
    policy: DuplicatePolicy,
) -> Result<ExportRow, ExportError> {
    let mut by_name: HashMap<&str, &Parameter> = HashMap::with_capacity(element.parameters.len());

    for parameter in &element.parameters {
        if !schema.contains(&parameter.name) {
            continue;
        }
        if by_name.contains_key(parameter.name.as_str()) {
            if policy == DuplicatePolicy::Strict {
                return Err(ExportError::DuplicateParameter {
                    element: element.name.clone(),
                    name: parameter.name.clone(),
                });
            }
            continue;
        }
        by_name.insert(&parameter.name, parameter);
    }

    let cells = schema
        .columns()
        .map(|column| {
            by_name
                .get(column)
                .map(|p| p.display_value().to_string())
                .unwrap_or_default()
        })
        .collect();

    Ok(ExportRow {
        name: element.name.clone(),
        type_name: element.type_name.clone(),
        shape: element.shape.clone(),
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParameterGroup;
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        ["Height", "Width"].into_iter().collect()
    }

    #[test]
    fn missing_parameters_leave_empty_cells() {
        let wall = Element::new(1, "Wall-1", "Wall")
            .with_shape("Basic Wall")
            .with_parameter(Parameter::valued("Height", "Dimensions", "3m"));

        let row = materialize_row(&wall, &schema(), DuplicatePolicy::FirstWins).unwrap();

        assert_eq!(row.cells, ["3m", ""]);
        assert_eq!(
            row.fields().collect::<Vec<_>>(),
            ["Wall-1", "Wall", "Basic Wall", "3m", ""]
        );
    }

    #[test]
    fn cells_follow_schema_order_not_element_order() {
        let door = Element::new(2, "Door-1", "Door")
            .with_parameter(Parameter::valued("Width", "Dimensions", "0.9m"))
            .with_parameter(Parameter::valued("Height", "Dimensions", "2.1m"));

        let row = materialize_row(&door, &schema(), DuplicatePolicy::FirstWins).unwrap();
        assert_eq!(row.cells, ["2.1m", "0.9m"]);
    }

    #[test]
    fn joins_on_name_regardless_of_group_or_value() {
        let element = Element::new(3, "x", "Wall")
            .with_parameter(Parameter::new("Height", ParameterGroup::Invalid, Some("1m".into())))
            .with_parameter(Parameter::new(
                "Width",
                ParameterGroup::Named("Dimensions".into()),
                None,
            ));

        let row = materialize_row(&element, &schema(), DuplicatePolicy::FirstWins).unwrap();
        assert_eq!(row.cells, ["1m", ""]);
    }

    #[test]
    fn first_duplicate_wins_by_default() {
        let element = Element::new(4, "x", "Wall")
            .with_parameter(Parameter::valued("Height", "Dimensions", "3m"))
            .with_parameter(Parameter::valued("Height", "Constraints", "4m"));

        let row = materialize_row(&element, &schema(), DuplicatePolicy::FirstWins).unwrap();
        assert_eq!(row.cells, ["3m", ""]);
    }

    #[test]
    fn strict_policy_rejects_duplicates() {
        let element = Element::new(4, "Wall-9", "Wall")
            .with_parameter(Parameter::valued("Height", "Dimensions", "3m"))
            .with_parameter(Parameter::valued("Height", "Constraints", "4m"));

        let err = materialize_row(&element, &schema(), DuplicatePolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            ExportError::DuplicateParameter { ref element, ref name }
                if element == "Wall-9" && name == "Height"
        ));
    }

    #[test]
    fn duplicates_outside_schema_are_ignored_when_strict() {
        let element = Element::new(5, "x", "Wall")
            .with_parameter(Parameter::valued("Mark", "Identity Data", "a"))
            .with_parameter(Parameter::valued("Mark", "Identity Data", "b"));

        let row = materialize_row(&element, &schema(), DuplicatePolicy::Strict).unwrap();
        assert_eq!(row.cells.len(), 2);
    }
}
