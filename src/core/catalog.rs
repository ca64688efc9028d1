//! Project catalog: which dependent fields a project admits and their
//! valid values.
//!
//! To add a new project:
//! 1. Add a new ProjectDefinition to PROJECTS
//! 2. List its valid tools / charge codes (empty slice = field not used)
//! 3. No other changes needed - normalization and validation pick it up

/// Project definition
#[derive(Debug, Clone)]
pub struct ProjectDefinition {
    /// Project code as entered in the grid (e.g. 'DEV')
    pub code: &'static str,
    /// Human-readable project name
    pub name: &'static str,
    /// Valid tool values; empty when the project has no tool field
    pub tools: &'static [&'static str],
    /// Valid detail charge codes; empty when the project has no charge code field
    pub charge_codes: &'static [&'static str],
}

impl ProjectDefinition {
    /// A project with a non-empty tool list requires a tool on every row.
    pub fn requires_tool(&self) -> bool {
        !self.tools.is_empty()
    }

    pub fn requires_charge_code(&self) -> bool {
        !self.charge_codes.is_empty()
    }

    pub fn admits_tool(&self, tool: &str) -> bool {
        self.tools.contains(&tool)
    }

    pub fn admits_charge_code(&self, code: &str) -> bool {
        self.charge_codes.contains(&code)
    }
}

const PROJECTS: &[ProjectDefinition] = &[
    ProjectDefinition {
        code: "DEV",
        name: "Product Development",
        tools: &["CAD", "Firmware", "Lab Bench", "Simulation"],
        charge_codes: &["DEV-100", "DEV-200", "DEV-300"],
    },
    ProjectDefinition {
        code: "SUST",
        name: "Sustaining Engineering",
        tools: &["CAD", "Lab Bench"],
        charge_codes: &["SUST-410", "SUST-420"],
    },
    ProjectDefinition {
        code: "FIELD",
        name: "Field Support",
        tools: &[],
        charge_codes: &["FS-900", "FS-910"],
    },
    ProjectDefinition {
        code: "TRAIN",
        name: "Training",
        tools: &[],
        charge_codes: &[],
    },
    ProjectDefinition {
        code: "ADMIN",
        name: "Administrative Overhead",
        tools: &[],
        charge_codes: &[],
    },
];

pub fn project_definitions() -> &'static [ProjectDefinition] {
    PROJECTS
}

pub fn project_by_code(code: &str) -> Option<&'static ProjectDefinition> {
    PROJECTS.iter().find(|p| p.code == code)
}

/// Codes for the grid's project dropdown.
pub fn project_codes() -> Vec<&'static str> {
    PROJECTS.iter().map(|p| p.code).collect()
}
