/// Broad kind of a category, mirroring how authoring tools split model
/// geometry from drawing annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Model,
    Annotation,
    AnalyticalModel,
    Internal,
}

/// Built-in categories the model adapter knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltInCategory {
    Walls,
    CurtainWalls,
    CurtainPanels,
    Doors,
    Windows,
    Floors,
    Roofs,
    Ceilings,
    Columns,
    StructuralFraming,
    StructuralFoundation,
    Stairs,
    StairsRuns,
    Railings,
    Furniture,
    PlumbingFixtures,
    MechanicalEquipment,
    Pipes,
    Ducts,
    GenericModels,
    Rooms,
    HvacZones,
    Grids,
    Levels,
    GenericAnnotations,
    AnalyticalMembers,
}

impl BuiltInCategory {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Walls => "Walls",
            Self::CurtainWalls => "Curtain Walls",
            Self::CurtainPanels => "Curtain Panels",
            Self::Doors => "Doors",
            Self::Windows => "Windows",
            Self::Floors => "Floors",
            Self::Roofs => "Roofs",
            Self::Ceilings => "Ceilings",
            Self::Columns => "Columns",
            Self::StructuralFraming => "Structural Framing",
            Self::StructuralFoundation => "Structural Foundations",
            Self::Stairs => "Stairs",
            Self::StairsRuns => "Runs",
            Self::Railings => "Railings",
            Self::Furniture => "Furniture",
            Self::PlumbingFixtures => "Plumbing Fixtures",
            Self::MechanicalEquipment => "Mechanical Equipment",
            Self::Pipes => "Pipes",
            Self::Ducts => "Ducts",
            Self::GenericModels => "Generic Models",
            Self::Rooms => "Rooms",
            Self::HvacZones => "HVAC Zones",
            Self::Grids => "Grids",
            Self::Levels => "Levels",
            Self::GenericAnnotations => "Generic Annotations",
            Self::AnalyticalMembers => "Analytical Members",
        }
    }

    #[must_use]
    pub fn kind(self) -> CategoryKind {
        match self {
            Self::Grids | Self::Levels | Self::GenericAnnotations => CategoryKind::Annotation,
            Self::AnalyticalMembers => CategoryKind::AnalyticalModel,
            _ => CategoryKind::Model,
        }
    }

    /// Rooms are model data but cannot carry sub-categories.
    #[must_use]
    pub fn allows_subcategories(self) -> bool {
        !matches!(self, Self::Rooms | Self::Levels)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub kind: CategoryKind,
    pub allows_subcategories: bool,
    pub builtin: Option<BuiltInCategory>,
}

impl Category {
    #[must_use]
    pub fn custom(name: impl Into<String>, kind: CategoryKind, allows_subcategories: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            allows_subcategories,
            builtin: None,
        }
    }
}

impl From<BuiltInCategory> for Category {
    fn from(builtin: BuiltInCategory) -> Self {
        Self {
            name: builtin.name().to_string(),
            kind: builtin.kind(),
            allows_subcategories: builtin.allows_subcategories(),
            builtin: Some(builtin),
        }
    }
}
