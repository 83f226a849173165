//! Tracks the current section and location counter across both passes
//! (spec §4.3).

use std::collections::HashMap;

/// The section a word of output (or a symbol) belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Section {
    Text,
    Data,
    Bss,
    Named(String),
}

/// Per-section bookkeeping: the running location counter.
#[derive(Debug, Clone, Default)]
struct SectionState {
    location_counter: u16,
}

/// Tracks the active section and every section's location counter as a
/// source file is walked top to bottom.
pub struct SectionTable {
    current: Section,
    states: HashMap<Section, SectionState>,
}

impl Default for SectionTable {
    fn default() -> Self {
        let mut states = HashMap::new();
        states.insert(Section::Text, SectionState::default());
        Self { current: Section::Text, states }
    }
}

impl SectionTable {
    pub fn switch_to(&mut self, section: Section) {
        self.states.entry(section.clone()).or_default();
        self.current = section;
    }

    pub fn current(&self) -> &Section {
        &self.current
    }

    /// The current location counter within the active section, relative to
    /// that section's base.
    pub fn location_counter(&self) -> u16 {
        self.states.get(&self.current).map(|state| state.location_counter).unwrap_or(0)
    }

    /// Advance the active section's location counter by `bytes` and return
    /// the location counter it was at before advancing.
    pub fn advance(&mut self, bytes: u16) -> u16 {
        let state = self.states.entry(self.current.clone()).or_default();
        let before = state.location_counter;
        state.location_counter = state.location_counter.wrapping_add(bytes);
        before
    }

    pub fn set_location_counter(&mut self, value: u16) {
        let state = self.states.entry(self.current.clone()).or_default();
        state.location_counter = value;
    }

    /// Reserve `size` bytes in a `.usect`-declared section without emitting
    /// any words. Advances that section's own location counter, the same
    /// one a later `.sect` switch resumes from.
    pub fn reserve(&mut self, section: Section, size: u16) -> u16 {
        let state = self.states.entry(section).or_default();
        let before = state.location_counter;
        state.location_counter = state.location_counter.wrapping_add(size);
        before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_track_independent_location_counters() {
        let mut table = SectionTable::default();
        assert_eq!(table.advance(2), 0);
        assert_eq!(table.advance(4), 2);

        table.switch_to(Section::Data);
        assert_eq!(table.location_counter(), 0);
        assert_eq!(table.advance(2), 0);

        table.switch_to(Section::Text);
        assert_eq!(table.location_counter(), 6);
    }

    #[test]
    fn test_usect_reserves_without_emitting() {
        let mut table = SectionTable::default();
        let offset = table.reserve(Section::Bss, 4);
        assert_eq!(offset, 0);
        let offset = table.reserve(Section::Bss, 2);
        assert_eq!(offset, 4);
    }

    #[test]
    fn test_usect_reservation_is_visible_to_a_later_sect_switch() {
        let mut table = SectionTable::default();
        table.reserve(Section::Bss, 6);

        table.switch_to(Section::Bss);
        assert_eq!(table.location_counter(), 6);
    }
}
