//! tiabus is the memory and I/O core of an Atari VCS style console: a paged
//! address space shared by a bank-switched cartridge, RIOT RAM and the TIA
//! chip registers, plus the delay queue that makes TIA register writes take
//! effect exactly as many cycles later as they do on the real chip.
//!
//! There is no CPU in here. Whoever drives the console calls
//! [`Console::read`] / [`Console::write`] for every bus access and
//! [`Console::cycle`] once per color clock:
//!
//! ```no_run
//! use tiabus::{CartridgeVariant, Console, Settings};
//!
//! let settings = Settings::from_env().expect("Invalid settings");
//! let cartridge = CartridgeVariant::from_file("game.bin").expect("Could not open rom file");
//!
//! match cartridge {
//!     CartridgeVariant::Rom4K(c) => run(Console::new(c, &settings)),
//!     CartridgeVariant::Bank3E(c) => run(Console::new(c, &settings)),
//! }
//!
//! fn run<C: tiabus::Cartridge>(mut console: Console<C>) {
//!     console.reset();
//!
//!     loop {
//!         // Your CPU goes here. It reads and writes through the console...
//!         let opcode = console.read(0x1FFC);
//!         console.write(0x003F, opcode);
//!
//!         // ...and the TIA is clocked once per cycle.
//!         console.cycle();
//!     }
//! }
//! ```

mod address;
mod board;
mod cartridge;
pub mod debug;
mod random;
mod serializer;
mod settings;
mod system;
mod tia;
mod util;

pub use address::{Addr, ADDRESS_BITS, ADDRESS_MASK, PAGE_SHIFT};
pub use board::Board;
pub use cartridge::*;
pub use random::Random;
use serializer::accept_record;
pub use serializer::{Serializer, SerializerError, ValueTag};
pub use settings::{Settings, SettingsError};
pub use system::{
    DeviceId, DirectBase, Page, PageAccess, PageAccessType, PageTable, Region, System,
};
pub use tia::{DelayQueue, DelayQueueError, DelayQueueMember, Entry, Tia};

/// A [`Board`] with a cartridge plugged in. All bus traffic goes through the
/// board's page table: pages with a direct reference are served straight from
/// the backing buffer, everything else is dispatched to the owning device.
pub struct Console<C> {
    board: Board,
    cart: C,
}

impl<C: Cartridge> Console<C> {
    pub fn new(mut cart: C, settings: &Settings) -> Self {
        let mut board = Board::new(settings);

        if let Some(bank) = settings.start_bank {
            cart.set_start_bank(bank);
        }

        cart.install(&mut board);

        Self { board, cart }
    }

    /// Power-on reset: RIOT RAM and cartridge RAM are filled with random
    /// values, the TIA is cleared and the cartridge maps its start bank.
    pub fn reset(&mut self) {
        self.board.reset();
        self.cart.reset(&mut self.board);
    }

    /// Reads a byte from the bus. The value read is latched as the new data
    /// bus state.
    pub fn read(&mut self, address: u16) -> u8 {
        let address = address & self.board.pages.address_mask();
        let page = *self.board.pages.page(address);

        let value = match page.direct_peek {
            Some(base) => self.direct_byte(base, address),
            None => match page.peek_device {
                DeviceId::Cartridge => self.cart.peek(&mut self.board, address),
                device => self.board.peek_device(device, address),
            },
        };

        self.board.latch_data_bus(value);
        value
    }

    /// Writes a byte to the bus. The page is marked dirty if the write was
    /// served directly or the owning device reports that it handled it.
    pub fn write(&mut self, address: u16, value: u8) {
        let address = address & self.board.pages.address_mask();
        let page = *self.board.pages.page(address);

        let handled = match page.direct_poke {
            Some(base) => {
                *self.direct_byte_mut(base, address) = value;
                true
            }
            None => match page.poke_device {
                DeviceId::Cartridge => self.cart.poke(&mut self.board, address, value),
                device => self.board.poke_device(device, address, value),
            },
        };

        if handled {
            self.board.pages.mark_dirty(address);
        }

        self.board.latch_data_bus(value);
    }

    /// Advances the TIA by one cycle, which applies every delayed register
    /// write that is due now.
    pub fn cycle(&mut self) {
        self.board.tia.cycle();
    }

    /// Asks the cartridge to map `bank`, exactly as a hot-spot write would.
    pub fn select_bank(&mut self, bank: u16) -> bool {
        self.cart.select_bank(&mut self.board, bank)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cartridge(&self) -> &C {
        &self.cart
    }

    /// Mutable access for tooling (patching, bank locking). Don't use this to
    /// switch banks, use [`Console::select_bank`] so the page table follows.
    pub fn cartridge_mut(&mut self) -> &mut C {
        &mut self.cart
    }

    pub fn save(&self, out: &mut Serializer) -> bool {
        self.board.save(out) && self.cart.save(out)
    }

    /// Restores a state written by [`Console::save`]. Every record is parsed
    /// before anything is applied, so a failed load leaves the console as it
    /// was.
    pub fn load(&mut self, input: &mut Serializer) -> bool {
        let board = match accept_record("board", Board::read_state(input)) {
            Some(board) => board,
            None => return false,
        };

        let cart = match accept_record(self.cart.name(), self.cart.read_state(input)) {
            Some(cart) => cart,
            None => return false,
        };

        self.board.apply_state(board);
        self.cart.apply_state(&mut self.board, cart);
        true
    }

    fn direct_byte(&self, base: DirectBase, address: u16) -> u8 {
        let index = base.offset + (address & self.board.pages.page_mask()) as usize;

        match base.region {
            Region::Ram => self.board.ram[index],
            region => self.cart.region(region)[index],
        }
    }

    fn direct_byte_mut(&mut self, base: DirectBase, address: u16) -> &mut u8 {
        let index = base.offset + (address & self.board.pages.page_mask()) as usize;

        match base.region {
            Region::Ram => &mut self.board.ram[index],
            region => &mut self.cart.region_mut(region)[index],
        }
    }
}
