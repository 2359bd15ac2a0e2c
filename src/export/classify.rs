use crate::model::{BuiltInCategory, CategoryKind, Element};

/// The one category dropped even though it looks like model data.
pub const EXCLUDED_CATEGORY: BuiltInCategory = BuiltInCategory::HvacZones;

/// Decides whether an element takes part in the export.
///
/// Rejects elements without a category, view-specific elements and the
/// [`EXCLUDED_CATEGORY`]; of the rest only model categories that support
/// sub-categories are accepted.
#[must_use]
pub fn is_exportable(element: &Element) -> bool {
    let Some(category) = &element.category else {
        return false;
    };

    if element.view_specific {
        return false;
    }

    if category.builtin == Some(EXCLUDED_CATEGORY) {
        return false;
    }

    category.kind == CategoryKind::Model && category.allows_subcategories
}
