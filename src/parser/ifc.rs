use crate::error::ParseError;
use crate::model::{
    BuildingModel, BuiltInCategory, Category, CategoryKind, Element, Parameter, ParameterGroup,
};
use crate::parser::step::{StepEntity, StepFile, StepValue};
use std::collections::HashMap;
use std::path::Path;

/// How an IFC class shows up in the exported model.
enum Classification {
    Builtin(BuiltInCategory),
    Custom(&'static str, CategoryKind, bool),
    Uncategorized,
}

struct ElementClass {
    entity: &'static str,
    type_name: &'static str,
    class: Classification,
    view_specific: bool,
}

const fn builtin(
    entity: &'static str,
    type_name: &'static str,
    category: BuiltInCategory,
) -> ElementClass {
    ElementClass {
        entity,
        type_name,
        class: Classification::Builtin(category),
        view_specific: false,
    }
}

// Entity classes read as elements. Type objects (IFC*TYPE, IFC*STYLE) are
// never elements; they only contribute the shape column.
const ELEMENT_CLASSES: &[ElementClass] = &[
    builtin("IFCWALL", "Wall", BuiltInCategory::Walls),
    builtin("IFCWALLSTANDARDCASE", "Wall", BuiltInCategory::Walls),
    builtin("IFCCURTAINWALL", "Wall", BuiltInCategory::CurtainWalls),
    builtin("IFCDOOR", "Door", BuiltInCategory::Doors),
    builtin("IFCWINDOW", "Window", BuiltInCategory::Windows),
    builtin("IFCSLAB", "Floor", BuiltInCategory::Floors),
    builtin("IFCROOF", "RoofBase", BuiltInCategory::Roofs),
    builtin("IFCCOVERING", "Ceiling", BuiltInCategory::Ceilings),
    builtin("IFCCOLUMN", "FamilyInstance", BuiltInCategory::Columns),
    builtin("IFCBEAM", "FamilyInstance", BuiltInCategory::StructuralFraming),
    builtin("IFCMEMBER", "FamilyInstance", BuiltInCategory::StructuralFraming),
    builtin("IFCPLATE", "Panel", BuiltInCategory::CurtainPanels),
    builtin("IFCFOOTING", "FamilyInstance", BuiltInCategory::StructuralFoundation),
    builtin("IFCSTAIR", "Stairs", BuiltInCategory::Stairs),
    builtin("IFCSTAIRFLIGHT", "StairsRun", BuiltInCategory::StairsRuns),
    builtin("IFCRAILING", "Railing", BuiltInCategory::Railings),
    builtin("IFCFURNISHINGELEMENT", "FamilyInstance", BuiltInCategory::Furniture),
    builtin("IFCFURNITURE", "FamilyInstance", BuiltInCategory::Furniture),
    builtin("IFCFLOWTERMINAL", "FamilyInstance", BuiltInCategory::PlumbingFixtures),
    builtin("IFCFLOWFIXTURE", "FamilyInstance", BuiltInCategory::PlumbingFixtures),
    builtin("IFCSANITARYTERMINAL", "FamilyInstance", BuiltInCategory::PlumbingFixtures),
    builtin("IFCENERGYCONVERSIONDEVICE", "FamilyInstance", BuiltInCategory::MechanicalEquipment),
    builtin("IFCPIPESEGMENT", "Pipe", BuiltInCategory::Pipes),
    builtin("IFCDUCTSEGMENT", "Duct", BuiltInCategory::Ducts),
    builtin("IFCBUILDINGELEMENTPROXY", "FamilyInstance", BuiltInCategory::GenericModels),
    builtin("IFCSPACE", "Room", BuiltInCategory::Rooms),
    builtin("IFCZONE", "Zone", BuiltInCategory::HvacZones),
    builtin("IFCGRID", "Grid", BuiltInCategory::Grids),
    builtin("IFCBUILDINGSTOREY", "Level", BuiltInCategory::Levels),
    builtin("IFCSTRUCTURALCURVEMEMBER", "AnalyticalMember", BuiltInCategory::AnalyticalMembers),
    ElementClass {
        entity: "IFCANNOTATION",
        type_name: "TextNote",
        class: Classification::Builtin(BuiltInCategory::GenericAnnotations),
        view_specific: true,
    },
    ElementClass {
        entity: "IFCOPENINGELEMENT",
        type_name: "Opening",
        class: Classification::Custom("Openings", CategoryKind::Internal, false),
        view_specific: false,
    },
    // IFC2x3 does not say whether a flow segment is a pipe or a duct.
    ElementClass {
        entity: "IFCFLOWSEGMENT",
        type_name: "MEPCurve",
        class: Classification::Custom("Flow Segments", CategoryKind::Model, true),
        view_specific: false,
    },
    ElementClass {
        entity: "IFCVIRTUALELEMENT",
        type_name: "Element",
        class: Classification::Uncategorized,
        view_specific: false,
    },
];

const QUANTITY_CLASSES: &[&str] = &[
    "IFCQUANTITYLENGTH",
    "IFCQUANTITYAREA",
    "IFCQUANTITYVOLUME",
    "IFCQUANTITYCOUNT",
    "IFCQUANTITYWEIGHT",
    "IFCQUANTITYTIME",
];

const IDENTITY_GROUP: &str = "Identity Data";

/// Parses an IFC file into a building model for export.
///
/// Every product entity listed in the class table becomes an [`Element`]
/// in file order. Parameters come from, in order: the element's own
/// attributes, its property sets and its quantity sets. The shape column
/// is the family part (`Family:Type`) of the element's type object.
///
/// # Errors
///
/// Returns [`ParseError::FileRead`] if the file cannot be read.
/// Returns [`ParseError::InvalidStep`] if the STEP format is malformed.
///
/// # Example
///
/// ```no_run
/// use daten_export::parser::parse_ifc_file;
///
/// let model = parse_ifc_file("model.ifc")?;
/// println!("{}: {} elements", model.name, model.total_elements());
/// # Ok::<(), daten_export::error::ParseError>(())
/// ```
pub fn parse_ifc_file<P: AsRef<Path>>(path: P) -> Result<BuildingModel, ParseError> {
    let content = std::fs::read_to_string(&path).map_err(|source| ParseError::FileRead {
        path: path.as_ref().to_path_buf(),
        source,
    })?;

    let step_file = StepFile::parse(&content)?;
    let file_path = path.as_ref().to_string_lossy().to_string();
    let model = build_model(&step_file, file_path);

    tracing::info!(
        project = %model.name,
        schema = %model.schema,
        elements = model.total_elements(),
        parameters = model.total_parameters(),
        "model loaded"
    );
    Ok(model)
}

/// Builds the element list from an already parsed STEP file.
#[must_use]
pub fn build_model(step_file: &StepFile, file_path: String) -> BuildingModel {
    let mut model = BuildingModel::new(
        extract_project_name(step_file),
        step_file.schema.clone(),
        file_path,
    );

    let type_of = extract_type_relationships(step_file);
    let definitions = extract_property_definitions(step_file);
    let classes: HashMap<&str, &ElementClass> =
        ELEMENT_CLASSES.iter().map(|c| (c.entity, c)).collect();

    for entity in step_file.entities.values() {
        let Some(class) = classes.get(entity.entity_type.as_str()) else {
            continue;
        };

        let mut element = Element::new(
            entity.id,
            entity.string_attribute(2).unwrap_or_default(),
            class.type_name,
        );
        element.view_specific = class.view_specific;
        element.category = match class.class {
            Classification::Builtin(builtin) => Some(Category::from(builtin)),
            Classification::Custom(name, kind, subcategories) => {
                Some(Category::custom(name, kind, subcategories))
            }
            Classification::Uncategorized => None,
        };
        element.shape = type_of
            .get(&entity.id)
            .and_then(|type_id| step_file.get_entity(*type_id))
            .and_then(|type_entity| type_entity.string_attribute(2))
            .map(family_name)
            .unwrap_or_default();

        element.parameters = intrinsic_parameters(entity);
        for definition_id in definitions.get(&entity.id).into_iter().flatten() {
            if let Some(definition) = step_file.get_entity(*definition_id) {
                element
                    .parameters
                    .extend(definition_parameters(step_file, definition));
            }
        }

        model.elements.push(element);
    }

    model
}

fn extract_project_name(step_file: &StepFile) -> String {
    step_file
        .entities_of_type("IFCPROJECT")
        .next()
        .and_then(|e| e.string_attribute(2))
        .map_or_else(|| "Unknown Project".to_string(), str::to_string)
}

/// `Basic Wall:Generic - 200mm` yields `Basic Wall`.
fn family_name(type_name: &str) -> String {
    type_name
        .split_once(':')
        .map_or(type_name, |(family, _)| family)
        .trim()
        .to_string()
}

/// Element instance → type object, from IFCRELDEFINESBYTYPE.
fn extract_type_relationships(step_file: &StepFile) -> HashMap<u64, u64> {
    let mut type_of = HashMap::new();

    for rel in step_file.entities_of_type("IFCRELDEFINESBYTYPE") {
        // Index 4 = RelatedObjects, index 5 = RelatingType
        let Some(type_id) = rel.reference_attribute(5) else {
            continue;
        };
        for instance in rel.attribute(4).map(StepValue::references).unwrap_or_default() {
            type_of.entry(instance).or_insert(type_id);
        }
    }

    type_of
}

/// Element → property definitions in relationship order, from
/// IFCRELDEFINESBYPROPERTIES.
fn extract_property_definitions(step_file: &StepFile) -> HashMap<u64, Vec<u64>> {
    let mut definitions: HashMap<u64, Vec<u64>> = HashMap::new();

    for rel in step_file.entities_of_type("IFCRELDEFINESBYPROPERTIES") {
        // Index 4 = RelatedObjects, index 5 = RelatingPropertyDefinition
        let Some(definition_id) = rel.reference_attribute(5) else {
            continue;
        };
        for element in rel.attribute(4).map(StepValue::references).unwrap_or_default() {
            definitions.entry(element).or_default().push(definition_id);
        }
    }

    definitions
}

fn intrinsic_parameters(entity: &StepEntity) -> Vec<Parameter> {
    let global_id = entity.string_attribute(0).map(str::to_string);
    let description = entity.string_attribute(3).map(str::to_string);

    vec![
        Parameter::new("GlobalId", ParameterGroup::Invalid, global_id),
        Parameter::new(
            "Comments",
            ParameterGroup::Named(IDENTITY_GROUP.to_string()),
            description,
        ),
    ]
}

fn definition_parameters(step_file: &StepFile, definition: &StepEntity) -> Vec<Parameter> {
    let group_name = definition
        .string_attribute(2)
        .map_or_else(|| format!("Set #{}", definition.id), str::to_string);

    let (members, value_index): (Vec<u64>, usize) = match definition.entity_type.as_str() {
        // IfcPropertySet.HasProperties
        "IFCPROPERTYSET" => (
            definition.attribute(4).map(StepValue::references).unwrap_or_default(),
            2,
        ),
        // IfcElementQuantity.Quantities
        "IFCELEMENTQUANTITY" => (
            definition.attribute(5).map(StepValue::references).unwrap_or_default(),
            3,
        ),
        _ => return Vec::new(),
    };

    members
        .into_iter()
        .filter_map(|id| step_file.get_entity(id))
        .filter_map(|member| {
            let name = member.string_attribute(0)?.to_string();
            if name.is_empty() {
                return None;
            }
            let value = match member.entity_type.as_str() {
                "IFCPROPERTYSINGLEVALUE" => member.attribute(value_index).and_then(display_value),
                "IFCPROPERTYENUMERATEDVALUE" => member.attribute(2).and_then(display_value),
                class if QUANTITY_CLASSES.contains(&class) => {
                    member.attribute(value_index).and_then(display_value)
                }
                _ => return None,
            };
            Some(Parameter::new(
                name,
                ParameterGroup::Named(group_name.clone()),
                value,
            ))
        })
        .collect()
}

/// Display string of a property value; `None` when the value is unset.
fn display_value(value: &StepValue) -> Option<String> {
    let text = match value {
        StepValue::Typed { value, .. } => return display_value(value),
        StepValue::Null | StepValue::Derived => return None,
        StepValue::String(s) => s.clone(),
        StepValue::Real(f) => format_real(*f),
        StepValue::Integer(i) => i.to_string(),
        StepValue::Boolean(b) => if *b { "Yes" } else { "No" }.to_string(),
        StepValue::Enum(e) if e == "U" => "Unknown".to_string(),
        StepValue::Enum(e) => e.clone(),
        StepValue::Reference(id) => format!("#{id}"),
        StepValue::List(items) => {
            let parts: Vec<String> = items.iter().filter_map(display_value).collect();
            if parts.is_empty() {
                return None;
            }
            parts.join(", ")
        }
    };
    Some(text)
}

/// Up to three decimals without trailing zeros: `3.` → `3`, `0.25` → `0.25`.
fn format_real(value: f64) -> String {
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
