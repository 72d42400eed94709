pub mod commands;

use crate::modules::{Module, ModuleDefinition};

pub const DEFINITION: ModuleDefinition = ModuleDefinition {
    id: "admin",
    name: "Administration",
    description: "Guild configuration for events, digests and permissions",
};

pub fn module() -> Module {
    Module {
        definition: DEFINITION,
        commands: commands::commands(),
    }
}
