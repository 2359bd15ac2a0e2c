use super::Element;

/// Everything read from one model file.
#[derive(Debug)]
pub struct BuildingModel {
    pub name: String,
    pub schema: String,
    pub file_path: String,
    /// Non-type elements in file order.
    pub elements: Vec<Element>,
}

impl BuildingModel {
    #[must_use]
    pub fn new(name: String, schema: String, file_path: String) -> Self {
        Self {
            name,
            schema,
            file_path,
            elements: Vec::new(),
        }
    }

    #[must_use]
    pub fn total_elements(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn total_parameters(&self) -> usize {
        self.elements.iter().map(|e| e.parameters.len()).sum()
    }
}
