mod cart3e;
mod cart4k;
mod variant;

use crate::serializer::{accept_record, Serializer, SerializerError};
use crate::system::{Region, System};

pub use cart3e::{Cartridge3E, Cartridge3EState};
pub use cart4k::Cartridge4K;
pub use variant::{is_probably_3e, CartridgeError, CartridgeVariant};

/// A window of cartridge RAM, as a debugger should present it. Reads and
/// writes use different addresses on most VCS carts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RamArea {
    pub start: u16,
    pub size: u16,
    pub read_offset: u16,
    pub write_offset: u16,
}

/// Bank switching state shared by every scheme
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BankFlags {
    pub locked: bool,
    pub changed: bool,
}

/// A cartridge claims pages of the [`System`] at install time and keeps them
/// up to date whenever it switches banks. Every method that can remap takes
/// the system it is plugged into.
pub trait Cartridge {
    /// Everything [`Cartridge::save`] writes, parsed but not yet applied
    type State;

    fn name(&self) -> &'static str;

    fn flags(&self) -> &BankFlags;
    fn flags_mut(&mut self) -> &mut BankFlags;

    /// Power-on reset. Fills cartridge RAM with random values and maps the
    /// start bank.
    fn reset(&mut self, system: &mut dyn System);

    /// Claims this cartridge's pages and maps the start bank.
    fn install(&mut self, system: &mut dyn System);

    /// Indirect read, for pages without a direct reference.
    fn peek(&mut self, system: &mut dyn System, address: u16) -> u8;

    /// Indirect write. Returns whether the write changed cartridge memory.
    fn poke(&mut self, system: &mut dyn System, address: u16, value: u8) -> bool;

    /// Maps `bank`. Returns `false` if nothing was remapped (locked, or the
    /// scheme has nothing to switch).
    fn select_bank(&mut self, system: &mut dyn System, bank: u16) -> bool;

    fn bank(&self) -> u16;
    fn bank_count(&self) -> u16;

    fn set_start_bank(&mut self, bank: u16);

    /// Overwrites the byte currently visible at `address`, ROM included.
    fn patch(&mut self, address: u16, value: u8) -> bool;

    fn image(&self) -> &[u8];

    /// Resolves direct page references. Regions the cartridge doesn't own
    /// are empty.
    fn region(&self, region: Region) -> &[u8];
    fn region_mut(&mut self, region: Region) -> &mut [u8];

    fn save(&self, out: &mut Serializer) -> bool;

    /// Parses a record written by [`Cartridge::save`] without changing
    /// anything. `Ok(None)` means the record is well formed but not ours.
    fn read_state(&self, input: &mut Serializer) -> Result<Option<Self::State>, SerializerError>;

    fn apply_state(&mut self, system: &mut dyn System, state: Self::State);

    /// Restores state written by [`Cartridge::save`]. On any failure nothing
    /// is changed and `false` is returned.
    fn load(&mut self, system: &mut dyn System, input: &mut Serializer) -> bool {
        match accept_record(self.name(), self.read_state(input)) {
            Some(state) => {
                self.apply_state(system, state);
                true
            }
            None => false,
        }
    }

    fn ram_areas(&self) -> &[RamArea] {
        &[]
    }

    fn lock_bank(&mut self) {
        self.flags_mut().locked = true;
    }

    fn unlock_bank(&mut self) {
        self.flags_mut().locked = false;
    }

    fn bank_locked(&self) -> bool {
        self.flags().locked
    }

    /// Whether a remap or patch happened since the last call
    fn bank_changed(&mut self) -> bool {
        let changed = self.flags().changed;
        self.flags_mut().changed = false;
        changed
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use crate::random::Random;
    use crate::system::{PageAccess, PageTable, System};

    /// A bare 13 bit address space that remembers chip writes
    pub struct MockSystem {
        pub pages: PageTable,
        pub chip_pokes: Vec<(u16, u8)>,
        pub write_port_reads: Vec<u16>,
        pub floating: u8,
        rand: Random,
    }

    impl MockSystem {
        pub fn new() -> MockSystem {
            MockSystem {
                pages: PageTable::new(13, 6),
                chip_pokes: Vec::new(),
                write_port_reads: Vec::new(),
                floating: 0xFF,
                rand: Random::with_seed(0xCAFE),
            }
        }
    }

    impl System for MockSystem {
        fn page_shift(&self) -> u16 {
            self.pages.page_shift()
        }

        fn set_page_access(&mut self, page: u16, access: PageAccess) {
            self.pages.set(page, &access);
        }

        fn chip_poke(&mut self, address: u16, value: u8) {
            self.chip_pokes.push((address, value));
        }

        fn data_bus_state(&mut self, zmask: u8) -> u8 {
            self.floating & zmask
        }

        fn rand(&mut self) -> &mut Random {
            &mut self.rand
        }

        fn read_from_write_port(&mut self, address: u16) {
            self.write_port_reads.push(address);
        }
    }
}
