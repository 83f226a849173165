//! `msp430_loader` places a linked image's words into a modeled MSP430
//! memory map and renders that map as text (spec §4.9).

#![deny(unused)]
#![deny(warnings)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_rust_codeblocks)]

use std::collections::BTreeMap;
use std::fmt;

use msp430_errors::error;
use msp430_object::ObjectFile;

error! {
    /// Error type for this crate.
    pub enum Error {
        #[code = E015]
        #[message = "A write to the modeled memory map overflowed the target region's bounds."]
        #[formatted_message("address {0:#06X} does not fall within any memory region")]
        #[help = "Pick a text/data placement base that keeps every word inside SFR, PERIPH, \
                  RAM, FLASH, or VECTORS."]
        Overflow(u16),
    }
}

/// The default placement of the `.text` section (spec §4.9).
pub const DEFAULT_TEXT_BASE: u16 = 0x4400;
/// The default placement of the `.data` section (spec §4.9).
pub const DEFAULT_DATA_BASE: u16 = 0x1C00;

/// One named region of the MSP430 memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Special function registers.
    Sfr,
    /// Memory-mapped peripherals.
    Periph,
    /// General-purpose RAM.
    Ram,
    /// Program flash.
    Flash,
    /// The interrupt vector table.
    Vectors,
}

impl fmt::Display for Region {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(match self {
            Self::Sfr => "SFR",
            Self::Periph => "PERIPH",
            Self::Ram => "RAM",
            Self::Flash => "FLASH",
            Self::Vectors => "VECTORS",
        })
    }
}

/// The regions of the memory map, in address order, as `(region, start,
/// end_inclusive)`.
const REGIONS: [(Region, u16, u16); 5] = [
    (Region::Sfr, 0x0000, 0x01FF),
    (Region::Periph, 0x0200, 0x1BFF),
    (Region::Ram, 0x1C00, 0x23FF),
    (Region::Flash, 0x4400, 0xFFBF),
    (Region::Vectors, 0xFFC0, 0xFFFF),
];

fn region_of(address: u16) -> Option<Region> {
    REGIONS
        .iter()
        .find(|(_, start, end)| (*start..=*end).contains(&address))
        .map(|(region, _, _)| *region)
}

/// The modeled memory, as the sparse set of bytes a linked image placed.
#[derive(Debug, Default)]
pub struct MemoryMap {
    bytes: BTreeMap<u16, u8>,
}

impl MemoryMap {
    /// Place every `.text` word at `text_base + offset` and every `.data`
    /// word at `data_base + offset`, little-endian, failing if any byte
    /// lands outside the five defined regions.
    pub fn load(image: &ObjectFile, text_base: u16, data_base: u16) -> Result<Self, Error> {
        let mut map = Self::default();
        for (offset, value) in &image.text {
            map.place(text_base.wrapping_add(*offset), *value)?;
        }
        for (offset, value) in &image.data {
            map.place(data_base.wrapping_add(*offset), *value)?;
        }
        Ok(map)
    }

    fn place(&mut self, address: u16, word: u16) -> Result<(), Error> {
        let low = address;
        let high = address.wrapping_add(1);

        region_of(low).ok_or(Error::Overflow(low))?;
        region_of(high).ok_or(Error::Overflow(high))?;

        self.bytes.insert(low, (word & 0xFF) as u8);
        self.bytes.insert(high, (word >> 8) as u8);
        Ok(())
    }

    /// Render the occupied memory as a textual map, one contiguous run per
    /// line, grouped by region.
    pub fn render(&self) -> String {
        let mut output = String::from("MSP430 Memory Map\n==================\n\n");

        for (region, start, end) in REGIONS {
            let occupied: Vec<(u16, u8)> =
                self.bytes.range(start..=end).map(|(address, byte)| (*address, *byte)).collect();
            if occupied.is_empty() {
                continue;
            }

            output.push_str(&format!("{region} ({start:#06X}-{end:#06X}):\n"));
            for chunk in occupied.chunks(8) {
                let base = chunk[0].0;
                let bytes: Vec<String> = chunk.iter().map(|(_, byte)| format!("{byte:02X}")).collect();
                output.push_str(&format!("  {base:#06X}: {}\n", bytes.join(" ")));
            }
            output.push('\n');
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msp430_object::{ObjectFile, Section, Symbol, SymbolType};

    fn sample_image() -> ObjectFile {
        ObjectFile {
            text: vec![(0, 0x4303), (2, 0x1234)],
            data: vec![(0, 0xBEEF)],
            symbols: vec![Symbol {
                name: "START".to_string(),
                value: 0,
                r#type: SymbolType::Relative,
                section: Section::Text,
                defined: true,
                is_global: true,
                file: None,
            }],
            relocations: Vec::new(),
        }
    }

    #[test]
    fn test_load_places_words_at_the_requested_bases() {
        let image = sample_image();
        let map = MemoryMap::load(&image, DEFAULT_TEXT_BASE, DEFAULT_DATA_BASE).unwrap();

        assert_eq!(map.bytes[&DEFAULT_TEXT_BASE], 0x03);
        assert_eq!(map.bytes[&(DEFAULT_TEXT_BASE + 1)], 0x43);
        assert_eq!(map.bytes[&DEFAULT_DATA_BASE], 0xEF);
    }

    #[test]
    fn test_load_rejects_addresses_outside_every_region() {
        let image = ObjectFile { text: vec![(0, 0)], ..ObjectFile::default() };
        let result = MemoryMap::load(&image, 0x3000, DEFAULT_DATA_BASE);
        assert!(matches!(result, Err(Error::Overflow(0x3000))));
    }

    #[test]
    fn test_render_groups_by_region() {
        let image = sample_image();
        let map = MemoryMap::load(&image, DEFAULT_TEXT_BASE, DEFAULT_DATA_BASE).unwrap();
        let rendered = map.render();
        assert!(rendered.contains("FLASH"));
        assert!(rendered.contains("RAM"));
    }
}
