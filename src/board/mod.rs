//! Everything inside the console except the CPU and the cartridge, packaged
//! under one roof. The [`Board`] is the [`System`] a cartridge gets plugged
//! into.

use crate::address::{Addr, ADDRESS_BITS, PAGE_SHIFT};
use crate::random::Random;
use crate::serializer::{Serializer, SerializerError};
use crate::settings::Settings;
use crate::system::{
    DeviceId, DirectBase, PageAccess, PageAccessType, PageTable, Region, System,
};
use crate::tia::{Tia, TiaState};

pub const RAM_LEN: usize = 0x80;

const STATE_TAG: &str = "Board";

pub struct Board {
    pub(crate) pages: PageTable,
    pub(crate) tia: Tia,
    pub(crate) ram: [u8; RAM_LEN],
    data_bus: u8,
    rand: Random,
    tia_driven: bool,
    last_write_port_read: Option<u16>,
}

impl Board {
    pub fn new(settings: &Settings) -> Board {
        let rand = match settings.random_seed {
            Some(seed) => Random::with_seed(seed),
            None => Random::new(),
        };

        let mut board = Board {
            pages: PageTable::new(ADDRESS_BITS, PAGE_SHIFT),
            tia: Tia::new(),
            ram: [0; RAM_LEN],
            data_bus: 0,
            rand,
            tia_driven: settings.tia_driven,
            last_write_port_read: None,
        };

        board.install();
        board
    }

    /// Claims TIA and RIOT RAM pages. Whatever is left stays unmapped until a
    /// cartridge claims it.
    fn install(&mut self) {
        for page in 0..self.pages.num_pages() as u16 {
            let address = page << PAGE_SHIFT;

            match Addr::from(address) {
                Addr::Tia(_) => {
                    let access = PageAccess::new(DeviceId::Tia, PageAccessType::READWRITE);
                    self.pages.set(page, &access);
                }
                Addr::Ram(offset) => {
                    let base = DirectBase::new(Region::Ram, offset as usize);
                    let access = PageAccess::new(DeviceId::Ram, PageAccessType::READWRITE)
                        .with_peek(base)
                        .with_poke(base);
                    self.pages.set(page, &access);
                }
                Addr::RiotIo(_) | Addr::Cartridge(_) => (),
            }
        }

        self.pages.clear_dirty_pages();
    }

    pub fn reset(&mut self) {
        self.rand.fill(&mut self.ram);
        self.tia.reset();
        self.data_bus = 0;
        self.last_write_port_read = None;
    }

    pub fn page_table(&self) -> &PageTable {
        &self.pages
    }

    pub fn tia(&self) -> &Tia {
        &self.tia
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// The last value that was driven onto the data bus
    pub fn data_bus(&self) -> u8 {
        self.data_bus
    }

    pub fn last_write_port_read(&self) -> Option<u16> {
        self.last_write_port_read
    }

    pub(crate) fn latch_data_bus(&mut self, value: u8) {
        self.data_bus = value;
    }

    pub(crate) fn peek_device(&mut self, device: DeviceId, address: u16) -> u8 {
        match device {
            DeviceId::Tia => {
                let bus = if self.tia_driven {
                    self.rand.next_byte()
                } else {
                    self.data_bus
                };
                self.tia.peek(address, bus)
            }
            DeviceId::Ram => self.ram[(address & 0x7F) as usize],
            DeviceId::Unmapped => self.data_bus,
            DeviceId::Cartridge => {
                log::warn!("Cartridge read at {:#06X} routed to the board", address);
                self.data_bus
            }
        }
    }

    pub(crate) fn poke_device(&mut self, device: DeviceId, address: u16, value: u8) -> bool {
        match device {
            DeviceId::Tia => {
                self.tia.poke(address, value);
                true
            }
            DeviceId::Ram => {
                self.ram[(address & 0x7F) as usize] = value;
                true
            }
            DeviceId::Unmapped => {
                log::trace!("Ignoring write of {:#04X} to {:#06X}", value, address);
                false
            }
            DeviceId::Cartridge => {
                log::warn!("Cartridge write at {:#06X} routed to the board", address);
                false
            }
        }
    }

    pub fn save(&self, out: &mut Serializer) -> bool {
        out.put_string(STATE_TAG);
        out.put_bytes(&self.ram);
        out.put_byte(self.data_bus);
        self.tia.save(out)
    }

    /// Reads the board record (RIOT RAM, data bus, TIA) without touching the
    /// board.
    pub(crate) fn read_state(input: &mut Serializer) -> Result<Option<BoardState>, SerializerError> {
        let tag = input.get_string()?;
        if tag != STATE_TAG {
            log::warn!("State record {:?} does not belong to the board", tag);
            return Ok(None);
        }

        let bytes = input.get_bytes()?;
        let data_bus = input.get_byte()?;

        if bytes.len() != RAM_LEN {
            log::warn!("Board state holds {} bytes of RAM, expected {}", bytes.len(), RAM_LEN);
            return Ok(None);
        }

        let tia = match Tia::read_state(input)? {
            Some(tia) => tia,
            None => return Ok(None),
        };

        let mut ram = [0; RAM_LEN];
        ram.copy_from_slice(&bytes);
        Ok(Some(BoardState { ram, data_bus, tia }))
    }

    pub(crate) fn apply_state(&mut self, state: BoardState) {
        self.ram = state.ram;
        self.data_bus = state.data_bus;
        self.tia.apply_state(state.tia);
    }
}

pub(crate) struct BoardState {
    ram: [u8; RAM_LEN],
    data_bus: u8,
    tia: TiaState,
}

impl System for Board {
    fn page_shift(&self) -> u16 {
        self.pages.page_shift()
    }

    fn page_mask(&self) -> u16 {
        self.pages.page_mask()
    }

    fn set_page_access(&mut self, page: u16, access: PageAccess) {
        self.pages.set(page, &access);
    }

    /// Same effect as a TIA write through its own page, so that page is
    /// marked dirty too.
    fn chip_poke(&mut self, address: u16, value: u8) {
        self.tia.poke(address, value);
        self.pages.mark_dirty(address);
    }

    fn data_bus_state(&mut self, zmask: u8) -> u8 {
        if self.tia_driven {
            self.data_bus | (self.rand.next_byte() & zmask)
        } else {
            self.data_bus | zmask
        }
    }

    fn rand(&mut self) -> &mut Random {
        &mut self.rand
    }

    fn read_from_write_port(&mut self, address: u16) {
        self.last_write_port_read = Some(address);
    }
}
