use std::collections::HashSet;

use super::progress::{Pass, ProgressReporter};
use crate::error::ExportError;
use crate::model::Element;

/// Ordered set of parameter names that become CSV columns.
///
/// Columns keep first-seen order, so the same model always produces the
/// same header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
    seen: HashSet<String>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column; returns `false` when it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.seen.contains(name) {
            return false;
        }
        self.seen.insert(name.to_string());
        self.columns.push(name.to_string());
        true
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for Schema {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for name in iter {
            schema.insert(name.as_ref());
        }
        schema
    }
}

/// First pass: the union of parameter names that are in a valid group and
/// hold a value on at least one element.
///
/// Checks for cancellation before each element and reports progress in the
/// 0–50 range.
pub fn collect_schema(
    elements: &[&Element],
    reporter: &mut ProgressReporter<'_>,
) -> Result<Schema, ExportError> {
    let total = elements.len();
    let mut schema = Schema::new();

    for (count, element) in elements.iter().enumerate() {
        reporter.checkpoint(Pass::CollectDefinitions, count, total)?;

        for parameter in &element.parameters {
            if parameter.group.is_valid() && parameter.has_value() {
                schema.insert(&parameter.name);
            }
        }
    }

    tracing::debug!(columns = schema.len(), elements = total, "schema collected");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::progress::{CancellationToken, NullSink};
    use crate::model::{Parameter, ParameterGroup};
    use pretty_assertions::assert_eq;

    fn collect(elements: &[Element]) -> Schema {
        let refs: Vec<&Element> = elements.iter().collect();
        let token = CancellationToken::new();
        let mut reporter = ProgressReporter::new(&NullSink, &token);
        collect_schema(&refs, &mut reporter).unwrap()
    }

    #[test]
    fn union_in_first_seen_order() {
        let elements = vec![
            Element::new(1, "Wall-1", "Wall")
                .with_parameter(Parameter::valued("Height", "Dimensions", "3m"))
                .with_parameter(Parameter::valued("Mark", "Identity Data", "W1")),
            Element::new(2, "Door-1", "Door")
                .with_parameter(Parameter::valued("Width", "Dimensions", "0.9m"))
                .with_parameter(Parameter::valued("Height", "Dimensions", "2.1m")),
        ];

        let schema = collect(&elements);
        assert_eq!(schema.columns().collect::<Vec<_>>(), ["Height", "Mark", "Width"]);
    }

    #[test]
    fn skips_invalid_group_and_unset_values() {
        let elements = vec![Element::new(1, "Wall-1", "Wall")
            .with_parameter(Parameter::new("GlobalId", ParameterGroup::Invalid, Some("x".into())))
            .with_parameter(Parameter::new(
                "FireRating",
                ParameterGroup::Named("Other".into()),
                None,
            ))
            .with_parameter(Parameter::valued("Length", "Dimensions", "4m"))];

        let schema = collect(&elements);
        assert_eq!(schema.columns().collect::<Vec<_>>(), ["Length"]);
    }

    #[test]
    fn name_counts_once_any_element_has_a_value() {
        let elements = vec![
            Element::new(1, "a", "Wall").with_parameter(Parameter::new(
                "Comments",
                ParameterGroup::Named("Identity Data".into()),
                None,
            )),
            Element::new(2, "b", "Wall").with_parameter(Parameter::valued(
                "Comments",
                "Identity Data",
                "note",
            )),
        ];

        assert!(collect(&elements).contains("Comments"));
    }

    #[test]
    fn cancellation_aborts_collection() {
        let element = Element::new(1, "a", "Wall");
        let token = CancellationToken::new();
        token.cancel();
        let mut reporter = ProgressReporter::new(&NullSink, &token);

        let err = collect_schema(&[&element], &mut reporter).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn collects_from_iterator_without_duplicates() {
        let schema: Schema = ["a", "b", "a"].into_iter().collect();
        assert_eq!(schema.len(), 2);
    }
}
