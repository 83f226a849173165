use msp430_object::ObjectFile;

use crate::Linker;

/// The inputs a [`Linker`] run needs: each object file's on-disk name (used
/// to tag its symbols/relocations in the linked image, spec §6.3) and its
/// parsed contents, in the order they should be linked (spec §5 — input
/// order is an observable property, it decides section base assignment).
#[derive(Debug)]
pub struct Configuration {
    pub(crate) objects: Vec<(String, ObjectFile)>,
}

impl Configuration {
    /// Build a configuration from already-parsed object files.
    pub fn new(objects: Vec<(String, ObjectFile)>) -> Self {
        Self { objects }
    }

    /// Produce the [`Linker`] that will run over this configuration.
    pub fn linker(self) -> Linker {
        Linker::with_configuration(self)
    }
}
