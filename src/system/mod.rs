//! The address-space side of the console: page descriptors and the [`System`]
//! trait through which devices claim pages and reach the rest of the bus.

mod page_table;

pub use page_table::{Page, PageTable};

use crate::random::Random;
use bitflags::bitflags;

/// The device a page falls back to when it has no direct reference.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceId {
    Unmapped,
    Tia,
    Ram,
    Cartridge,
}

/// Buffers a direct page reference can point into.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Region {
    /// RIOT RAM, owned by the board
    Ram,
    /// Cartridge ROM image
    CartRom,
    /// Cartridge RAM
    CartRam,
}

/// Where the first byte of a page lives inside a device-owned buffer.
///
/// This is an index, not a pointer: it is resolved against the buffer on
/// every access, so a remap or a dropped cartridge can't leave it dangling.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DirectBase {
    pub region: Region,
    pub offset: usize,
}

impl DirectBase {
    pub fn new(region: Region, offset: usize) -> DirectBase {
        DirectBase { region, offset }
    }
}

bitflags! {
    /// The halves of a page a [`PageAccess`] replaces
    pub struct PageAccessType: u8 {
        const READ = 0b01;
        const WRITE = 0b10;
        const READWRITE = Self::READ.bits | Self::WRITE.bits;
    }
}

/// A claim on one page. `None` for a direct reference means every access in
/// that direction goes through the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageAccess {
    pub direct_peek: Option<DirectBase>,
    pub direct_poke: Option<DirectBase>,
    pub device: DeviceId,
    pub access_type: PageAccessType,
}

impl PageAccess {
    pub fn new(device: DeviceId, access_type: PageAccessType) -> PageAccess {
        PageAccess {
            direct_peek: None,
            direct_poke: None,
            device,
            access_type,
        }
    }

    pub fn with_peek(mut self, base: DirectBase) -> PageAccess {
        self.direct_peek = Some(base);
        self
    }

    pub fn with_poke(mut self, base: DirectBase) -> PageAccess {
        self.direct_poke = Some(base);
        self
    }
}

/// Everything a device may ask of the machine it is plugged into.
pub trait System {
    fn page_shift(&self) -> u16;

    fn page_mask(&self) -> u16 {
        (1 << self.page_shift()) - 1
    }

    /// Replaces the halves of `page` named by `access.access_type`.
    fn set_page_access(&mut self, page: u16, access: PageAccess);

    /// The bus-wide write path. Cartridges forward every write here so chips
    /// that share the address (the TIA below 0x40) see it too.
    fn chip_poke(&mut self, address: u16, value: u8);

    /// Value of the data bus for a read nobody drives. Bits set in `zmask`
    /// are the undriven ones.
    fn data_bus_state(&mut self, zmask: u8) -> u8;

    fn rand(&mut self) -> &mut Random;

    /// Called when a read hits a write port, which corrupts the addressed
    /// cell on real hardware.
    fn read_from_write_port(&mut self, _address: u16) {}
}
