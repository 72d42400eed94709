pub mod commands;
pub mod datetime_parser;
pub mod interactions;
pub mod membership;
pub mod panel;

use crate::modules::{Module, ModuleDefinition};

pub const DEFINITION: ModuleDefinition = ModuleDefinition {
    id: "events",
    name: "Events",
    description: "Scheduled events with capacity-aware RSVP rosters",
};

pub fn module() -> Module {
    Module {
        definition: DEFINITION,
        commands: commands::commands(),
    }
}
