pub mod shelves;

use atlas_kernel::{Migration, ModuleRegistry};

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, state: shelves::ShelfState) {
    registry.register(shelves::create_module(state));
}

/// Migrations of every module, in the order the registry would apply them.
pub fn migrations() -> Vec<(String, Migration)> {
    shelves::migrations()
        .into_iter()
        .map(|migration| (shelves::MODULE_NAME.to_string(), migration))
        .collect()
}
