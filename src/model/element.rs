use super::Category;

/// A model element as seen by the exporter. Read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: u64,
    pub name: String,
    /// Runtime type name, e.g. `Wall` or `Door`.
    pub type_name: String,
    pub category: Option<Category>,
    /// Element exists only inside a single view (annotations, tags).
    pub view_specific: bool,
    /// Family name of the element's type, empty when it has none.
    pub shape: String,
    pub parameters: Vec<Parameter>,
}

impl Element {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            type_name: type_name.into(),
            category: None,
            view_specific: false,
            shape: String::new(),
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn with_shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = shape.into();
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// Group a parameter is filed under. `Invalid` marks internal attributes
/// that never become columns on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterGroup {
    Invalid,
    Named(String),
}

impl ParameterGroup {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub group: ParameterGroup,
    /// Display string of the current value, `None` when unset.
    pub value: Option<String>,
}

impl Parameter {
    #[must_use]
    pub fn new(name: impl Into<String>, group: ParameterGroup, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            group,
            value,
        }
    }

    /// Shorthand for a parameter in a named group holding a value.
    #[must_use]
    pub fn valued(name: impl Into<String>, group: &str, value: impl Into<String>) -> Self {
        Self::new(
            name,
            ParameterGroup::Named(group.to_string()),
            Some(value.into()),
        )
    }

    #[must_use]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    #[must_use]
    pub fn display_value(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}
