use super::{BankFlags, Cartridge, CartridgeError, RamArea};
use crate::serializer::{Serializer, SerializerError};
use crate::system::{DeviceId, DirectBase, PageAccess, PageAccessType, Region, System};
use std::convert::TryFrom;

const ROM_BANK_LEN: usize = 0x800;
const RAM_BANK_LEN: usize = 0x400;
const RAM_BANK_COUNT: u16 = 32;
const RAM_LEN: usize = RAM_BANK_LEN * RAM_BANK_COUNT as usize;

/// Selectors at or above this pick a RAM bank instead of a ROM bank
const RAM_BANK_BASE: u16 = 256;

const HOTSPOT_ROM: u16 = 0x3F;
const HOTSPOT_RAM: u16 = 0x3E;

/// Hot spots live in TIA space, the cartridge only listens to writes there
const HOTSPOT_PAGES_END: u16 = 0x0040;

const NAME: &str = "Cartridge3E";

/// Tigervision's 3E scheme: up to 256 2K ROM banks and 32 1K RAM banks share
/// the lower half of the 4K window, the last 2K of ROM is fixed in the upper
/// half. Writing `n` to 0x3F maps ROM bank `n`, writing `n` to 0x3E maps RAM
/// bank `n` with its read port at 0x1000 and its write port at 0x1400.
///
/// The current bank is a single selector: `0..=255` for ROM banks,
/// `256..=287` for RAM banks.
pub struct Cartridge3E {
    image: Box<[u8]>,
    ram: Box<[u8]>,
    current_bank: u16,
    start_bank: u16,
    flags: BankFlags,
    ram_areas: [RamArea; 1],
}

impl Cartridge3E {
    pub fn new(image: Box<[u8]>) -> Result<Cartridge3E, CartridgeError> {
        if image.is_empty() || image.len() % ROM_BANK_LEN != 0 {
            return Err(CartridgeError::InvalidRomSize(image.len()));
        }

        Ok(Cartridge3E {
            image,
            ram: vec![0; RAM_LEN].into_boxed_slice(),
            current_bank: 0,
            start_bank: 0,
            flags: BankFlags::default(),
            ram_areas: [RamArea {
                start: 0x1000,
                size: RAM_BANK_LEN as u16,
                read_offset: 0x0000,
                write_offset: 0x0400,
            }],
        })
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    fn rom_bank_count(&self) -> u16 {
        // Anything past bank 255 can't be selected anyway
        (self.image.len() / ROM_BANK_LEN).min(RAM_BANK_BASE as usize) as u16
    }

    fn top_slice(&self) -> usize {
        self.image.len() - ROM_BANK_LEN
    }

    fn rom_offset(&self) -> usize {
        self.current_bank as usize * ROM_BANK_LEN
    }

    fn ram_offset(&self) -> usize {
        (self.current_bank - RAM_BANK_BASE) as usize * RAM_BANK_LEN
    }

    fn is_ram_bank(&self) -> bool {
        self.current_bank >= RAM_BANK_BASE
    }

    /// Maps `bank` regardless of the lock
    fn map_bank(&mut self, system: &mut dyn System, bank: u16) {
        let shift = system.page_shift();
        let page_size = 1usize << shift;

        if bank < RAM_BANK_BASE {
            let count = self.rom_bank_count();

            self.current_bank = if bank < count {
                bank
            } else {
                log::warn!("ROM bank {} does not exist, wrapping to {}", bank, bank % count);
                bank % count
            };

            let offset = self.rom_offset();
            for address in (0x1000u16..0x1800).step_by(page_size) {
                let base = DirectBase::new(Region::CartRom, offset + (address & 0x07FF) as usize);
                let access = PageAccess::new(DeviceId::Cartridge, PageAccessType::READWRITE)
                    .with_peek(base);
                system.set_page_access(address >> shift, access);
            }

            log::debug!("Switched to ROM bank {}", self.current_bank);
        } else {
            let ram_bank = (bank - RAM_BANK_BASE) % RAM_BANK_COUNT;
            self.current_bank = ram_bank + RAM_BANK_BASE;

            let offset = self.ram_offset();

            // Read port
            for address in (0x1000u16..0x1400).step_by(page_size) {
                let base = DirectBase::new(Region::CartRam, offset + (address & 0x03FF) as usize);
                let access = PageAccess::new(DeviceId::Cartridge, PageAccessType::READWRITE)
                    .with_peek(base);
                system.set_page_access(address >> shift, access);
            }

            // Write port
            for address in (0x1400u16..0x1800).step_by(page_size) {
                let base = DirectBase::new(Region::CartRam, offset + (address & 0x03FF) as usize);
                let access = PageAccess::new(DeviceId::Cartridge, PageAccessType::READWRITE)
                    .with_poke(base);
                system.set_page_access(address >> shift, access);
            }

            log::debug!("Switched to RAM bank {}", ram_bank);
        }

        self.flags.changed = true;
    }

    fn write_state(&self, out: &mut Serializer) {
        out.put_string(NAME);
        out.put_int(u32::from(self.current_bank));
        out.put_int(self.ram.len() as u32);
        out.put_bytes(&self.ram);
    }

    fn parse_state(input: &mut Serializer) -> Result<Option<Cartridge3EState>, SerializerError> {
        let tag = input.get_string()?;
        if tag != NAME {
            log::warn!("State record {:?} does not belong to {}", tag, NAME);
            return Ok(None);
        }

        let bank = input.get_int()?;
        let len = input.get_int()? as usize;
        let ram = input.get_bytes()?;

        let bank = match u16::try_from(bank) {
            Ok(bank) => bank,
            Err(_) => {
                log::warn!("Saved bank selector {} is out of range", bank);
                return Ok(None);
            }
        };

        if len != ram.len() || len > RAM_LEN {
            log::warn!("Saved RAM holds {} of {} bytes, expected at most {}", ram.len(), len, RAM_LEN);
            return Ok(None);
        }

        Ok(Some(Cartridge3EState { bank, ram }))
    }
}

/// Saved bank selector and cartridge RAM of a [`Cartridge3E`]
pub struct Cartridge3EState {
    bank: u16,
    ram: Vec<u8>,
}

impl Cartridge for Cartridge3E {
    type State = Cartridge3EState;

    fn name(&self) -> &'static str {
        NAME
    }

    fn flags(&self) -> &BankFlags {
        &self.flags
    }

    fn flags_mut(&mut self) -> &mut BankFlags {
        &mut self.flags
    }

    fn reset(&mut self, system: &mut dyn System) {
        system.rand().fill(&mut self.ram);
        self.select_bank(system, self.start_bank);
    }

    fn install(&mut self, system: &mut dyn System) {
        let shift = system.page_shift();
        let page_size = 1usize << shift;

        for address in (0x0000..HOTSPOT_PAGES_END).step_by(page_size) {
            let access = PageAccess::new(DeviceId::Cartridge, PageAccessType::WRITE);
            system.set_page_access(address >> shift, access);
        }

        let top = self.top_slice();
        for address in (0x1800u16..0x2000).step_by(page_size) {
            let base = DirectBase::new(Region::CartRom, top + (address & 0x07FF) as usize);
            let access =
                PageAccess::new(DeviceId::Cartridge, PageAccessType::READWRITE).with_peek(base);
            system.set_page_access(address >> shift, access);
        }

        self.select_bank(system, self.start_bank);
    }

    fn peek(&mut self, system: &mut dyn System, address: u16) -> u8 {
        let offset = address & 0x0FFF;

        if offset >= 0x0800 {
            return self.image[self.top_slice() + (offset & 0x07FF) as usize];
        }

        if !self.is_ram_bank() {
            return self.image[self.rom_offset() + (offset & 0x07FF) as usize];
        }

        let index = self.ram_offset() + (offset & 0x03FF) as usize;

        if offset < 0x0400 {
            self.ram[index]
        } else {
            // Reading the write port drives whatever floats on the bus into
            // the addressed cell
            let value = system.data_bus_state(0xFF);

            if !self.flags.locked {
                log::trace!("Read from RAM write port at {:#06X}", address);
                system.read_from_write_port(address);
                self.ram[index] = value;
            }

            value
        }
    }

    fn poke(&mut self, system: &mut dyn System, address: u16, value: u8) -> bool {
        let offset = address & 0x0FFF;

        if offset == HOTSPOT_ROM {
            self.select_bank(system, u16::from(value));
        } else if offset == HOTSPOT_RAM {
            self.select_bank(system, u16::from(value) + RAM_BANK_BASE);
        }

        // The hot spots are TIA registers as well
        system.chip_poke(offset, value);

        false
    }

    fn select_bank(&mut self, system: &mut dyn System, bank: u16) -> bool {
        if self.flags.locked {
            return false;
        }

        self.map_bank(system, bank);
        true
    }

    fn bank(&self) -> u16 {
        self.current_bank
    }

    fn bank_count(&self) -> u16 {
        self.rom_bank_count() + RAM_BANK_COUNT
    }

    fn set_start_bank(&mut self, bank: u16) {
        self.start_bank = bank;
    }

    fn patch(&mut self, address: u16, value: u8) -> bool {
        let offset = address & 0x0FFF;

        if offset >= 0x0800 {
            let index = self.top_slice() + (offset & 0x07FF) as usize;
            self.image[index] = value;
        } else if self.is_ram_bank() {
            let index = self.ram_offset() + (offset & 0x03FF) as usize;
            self.ram[index] = value;
        } else {
            let index = self.rom_offset() + (offset & 0x07FF) as usize;
            self.image[index] = value;
        }

        self.flags.changed = true;
        true
    }

    fn image(&self) -> &[u8] {
        &self.image
    }

    fn region(&self, region: Region) -> &[u8] {
        match region {
            Region::CartRom => &self.image,
            Region::CartRam => &self.ram,
            Region::Ram => &[],
        }
    }

    fn region_mut(&mut self, region: Region) -> &mut [u8] {
        match region {
            Region::CartRom => &mut self.image,
            Region::CartRam => &mut self.ram,
            Region::Ram => &mut [],
        }
    }

    fn save(&self, out: &mut Serializer) -> bool {
        self.write_state(out);
        true
    }

    fn read_state(&self, input: &mut Serializer) -> Result<Option<Cartridge3EState>, SerializerError> {
        Cartridge3E::parse_state(input)
    }

    fn apply_state(&mut self, system: &mut dyn System, state: Cartridge3EState) {
        self.ram[..state.ram.len()].copy_from_slice(&state.ram);
        // Restore the exact mapping, even for a locked cart
        self.map_bank(system, state.bank);
    }

    fn ram_areas(&self) -> &[RamArea] {
        &self.ram_areas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::mock::MockSystem;

    /// Every byte of bank `b` at offset `o` holds `b ^ (o >> 3)`, so both the
    /// bank and the position inside it can be told apart
    fn image(banks: usize) -> Box<[u8]> {
        (0..banks * ROM_BANK_LEN)
            .map(|i| ((i / ROM_BANK_LEN) ^ ((i % ROM_BANK_LEN) >> 3)) as u8)
            .collect()
    }

    fn setup(banks: usize) -> (Cartridge3E, MockSystem) {
        let mut cart = Cartridge3E::new(image(banks)).unwrap();
        let mut system = MockSystem::new();
        cart.install(&mut system);
        cart.reset(&mut system);
        (cart, system)
    }

    /// A bus read the way the console performs it
    fn read(cart: &mut Cartridge3E, system: &mut MockSystem, address: u16) -> u8 {
        let page = *system.pages.page(address);
        match page.direct_peek {
            Some(base) => cart.region(base.region)[base.offset + (address & 0x3F) as usize],
            None => {
                assert_eq!(page.peek_device, DeviceId::Cartridge);
                cart.peek(system, address)
            }
        }
    }

    fn write(cart: &mut Cartridge3E, system: &mut MockSystem, address: u16, value: u8) {
        let page = *system.pages.page(address);
        match page.direct_poke {
            Some(base) => {
                cart.region_mut(base.region)[base.offset + (address & 0x3F) as usize] = value
            }
            None => {
                assert_eq!(page.poke_device, DeviceId::Cartridge);
                cart.poke(system, address, value);
            }
        }
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(matches!(
            Cartridge3E::new(vec![].into_boxed_slice()),
            Err(CartridgeError::InvalidRomSize(0))
        ));
        assert!(matches!(
            Cartridge3E::new(vec![0; 3000].into_boxed_slice()),
            Err(CartridgeError::InvalidRomSize(3000))
        ));
    }

    #[test]
    fn rom_banks_map_into_lower_window() {
        for &banks in &[2usize, 4, 8] {
            let (mut cart, mut system) = setup(banks);

            for bank in 0..(banks as u16 * 2) {
                assert!(cart.select_bank(&mut system, bank));
                let slice = bank as usize % banks;

                for &offset in &[0x000u16, 0x03F, 0x400, 0x7FF] {
                    let expected = cart.image()[slice * ROM_BANK_LEN + offset as usize];
                    assert_eq!(read(&mut cart, &mut system, 0x1000 + offset), expected);
                }
            }
        }
    }

    #[test]
    fn bank_numbers_wrap() {
        let (mut cart, mut system) = setup(4);

        cart.select_bank(&mut system, 4);
        assert_eq!(cart.bank(), 0);

        cart.select_bank(&mut system, 3);
        assert_eq!(read(&mut cart, &mut system, 0x1000), cart.image()[3 * ROM_BANK_LEN]);

        cart.select_bank(&mut system, RAM_BANK_BASE + 33);
        assert_eq!(cart.bank(), RAM_BANK_BASE + 1);
        assert_eq!(cart.bank_count(), 4 + 32);
    }

    #[test]
    fn top_slice_is_fixed() {
        let (mut cart, mut system) = setup(4);
        let top = 3 * ROM_BANK_LEN;

        for &bank in &[0u16, 2, RAM_BANK_BASE + 5] {
            cart.select_bank(&mut system, bank);
            assert_eq!(read(&mut cart, &mut system, 0x1800), cart.image()[top]);
            assert_eq!(read(&mut cart, &mut system, 0x1FFF), cart.image()[top + 0x7FF]);
        }
    }

    #[test]
    fn hotspot_writes_switch_and_reach_the_chip() {
        let (mut cart, mut system) = setup(4);

        write(&mut cart, &mut system, 0x003F, 2);
        assert_eq!(cart.bank(), 2);

        write(&mut cart, &mut system, 0x003E, 7);
        assert_eq!(cart.bank(), RAM_BANK_BASE + 7);

        // Not a hot spot, still forwarded
        write(&mut cart, &mut system, 0x0002, 0x11);

        assert_eq!(system.chip_pokes, vec![(0x3F, 2), (0x3E, 7), (0x02, 0x11)]);
    }

    #[test]
    fn hotspot_claim_is_write_only() {
        let (_, system) = setup(2);
        let page = system.pages.page(0x0000);

        assert_eq!(page.poke_device, DeviceId::Cartridge);
        assert_eq!(page.peek_device, DeviceId::Unmapped);
    }

    #[test]
    fn ram_is_dual_ported() {
        let (mut cart, mut system) = setup(2);

        for &ram_bank in &[0u16, 5, 31] {
            cart.select_bank(&mut system, RAM_BANK_BASE + ram_bank);

            write(&mut cart, &mut system, 0x1400, 0xAA);
            write(&mut cart, &mut system, 0x17FF, ram_bank as u8);

            assert_eq!(read(&mut cart, &mut system, 0x1000), 0xAA);
            assert_eq!(read(&mut cart, &mut system, 0x13FF), ram_bank as u8);
            assert_eq!(cart.ram()[ram_bank as usize * RAM_BANK_LEN], 0xAA);
        }

        // Other banks keep their own contents
        cart.select_bank(&mut system, RAM_BANK_BASE + 5);
        assert_eq!(read(&mut cart, &mut system, 0x13FF), 5);
    }

    #[test]
    fn write_port_read_stores_floating_bus() {
        let (mut cart, mut system) = setup(2);
        cart.select_bank(&mut system, RAM_BANK_BASE + 1);
        system.floating = 0x5A;

        assert_eq!(read(&mut cart, &mut system, 0x1410), 0x5A);
        assert_eq!(read(&mut cart, &mut system, 0x1010), 0x5A);
        assert_eq!(system.write_port_reads, vec![0x1410]);
    }

    #[test]
    fn locked_cart_ignores_switches_and_write_port_reads() {
        let (mut cart, mut system) = setup(4);
        cart.select_bank(&mut system, RAM_BANK_BASE);
        write(&mut cart, &mut system, 0x1420, 0x01);
        cart.lock_bank();
        system.floating = 0x77;

        assert!(!cart.select_bank(&mut system, 2));
        write(&mut cart, &mut system, 0x003F, 2);
        assert_eq!(cart.bank(), RAM_BANK_BASE);

        assert_eq!(read(&mut cart, &mut system, 0x1420), 0x77);
        assert_eq!(read(&mut cart, &mut system, 0x1020), 0x01);
        assert!(system.write_port_reads.is_empty());

        cart.unlock_bank();
        assert!(cart.select_bank(&mut system, 2));
    }

    #[test]
    fn reselecting_keeps_ram() {
        let (mut cart, mut system) = setup(2);
        cart.select_bank(&mut system, RAM_BANK_BASE + 3);
        write(&mut cart, &mut system, 0x1400, 0x42);
        let pages_before: Vec<_> = system.pages.iter().map(|(_, p)| *p).collect();

        cart.select_bank(&mut system, RAM_BANK_BASE + 3);

        let pages_after: Vec<_> = system.pages.iter().map(|(_, p)| *p).collect();
        assert_eq!(pages_before, pages_after);
        assert_eq!(read(&mut cart, &mut system, 0x1000), 0x42);
    }

    #[test]
    fn patch_targets_visible_memory() {
        let (mut cart, mut system) = setup(2);
        let ram_before = cart.ram().to_vec();

        cart.bank_changed();
        assert!(cart.patch(0x1900, 0xEE));
        assert_eq!(cart.image()[ROM_BANK_LEN + 0x100], 0xEE);
        assert_eq!(cart.ram(), &ram_before[..]);
        assert!(cart.bank_changed());
        assert!(!cart.bank_changed());

        cart.select_bank(&mut system, RAM_BANK_BASE + 2);
        cart.patch(0x1001, 0xDD);
        assert_eq!(cart.ram()[2 * RAM_BANK_LEN + 1], 0xDD);

        // The fixed upper slice stays ROM while a RAM bank is mapped
        let ram_before = cart.ram().to_vec();
        assert!(cart.patch(0x1FFF, 0xCC));
        assert_eq!(cart.image()[ROM_BANK_LEN + 0x7FF], 0xCC);
        assert_eq!(cart.ram(), &ram_before[..]);
    }

    #[test]
    fn save_and_load_round_trip() {
        let (mut cart, mut system) = setup(4);
        cart.select_bank(&mut system, RAM_BANK_BASE + 9);
        write(&mut cart, &mut system, 0x1455, 0x99);

        let mut state = Serializer::new();
        assert!(cart.save(&mut state));

        let mut other = Cartridge3E::new(image(4)).unwrap();
        let mut other_system = MockSystem::new();
        other.install(&mut other_system);
        other.reset(&mut other_system);

        assert!(other.load(&mut other_system, &mut state));
        assert_eq!(other.bank(), RAM_BANK_BASE + 9);
        assert_eq!(other.ram(), cart.ram());
        assert_eq!(read(&mut other, &mut other_system, 0x1055), 0x99);
    }

    #[test]
    fn foreign_state_is_rejected() {
        let (mut cart, mut system) = setup(2);
        cart.select_bank(&mut system, 1);
        let ram_before = cart.ram().to_vec();

        let mut state = Serializer::new();
        state.put_string("Cartridge4K");
        assert!(!cart.load(&mut system, &mut state));

        let mut truncated = Serializer::new();
        truncated.put_string(NAME);
        truncated.put_int(RAM_BANK_BASE as u32);
        assert!(!cart.load(&mut system, &mut truncated));

        assert_eq!(cart.bank(), 1);
        assert_eq!(cart.ram(), &ram_before[..]);
    }

    #[test]
    fn ram_area_description() {
        let cart = Cartridge3E::new(image(2)).unwrap();
        assert_eq!(
            cart.ram_areas(),
            &[RamArea {
                start: 0x1000,
                size: 0x400,
                read_offset: 0x000,
                write_offset: 0x400
            }]
        );
    }
}
