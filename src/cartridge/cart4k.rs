use super::{BankFlags, Cartridge, CartridgeError};
use crate::serializer::{Serializer, SerializerError};
use crate::system::{DeviceId, DirectBase, PageAccess, PageAccessType, Region, System};

const NAME: &str = "Cartridge4K";

/// Plain 2K or 4K ROM, no bank switching. A 2K image is mirrored twice.
pub struct Cartridge4K {
    image: Box<[u8]>,
    flags: BankFlags,
}

impl Cartridge4K {
    pub fn new(image: Box<[u8]>) -> Result<Cartridge4K, CartridgeError> {
        match image.len() {
            0x0800 | 0x1000 => Ok(Cartridge4K {
                image,
                flags: BankFlags::default(),
            }),
            len => Err(CartridgeError::InvalidRomSize(len)),
        }
    }

    fn mask(&self) -> u16 {
        (self.image.len() - 1) as u16
    }
}

impl Cartridge for Cartridge4K {
    type State = ();

    fn name(&self) -> &'static str {
        NAME
    }

    fn flags(&self) -> &BankFlags {
        &self.flags
    }

    fn flags_mut(&mut self) -> &mut BankFlags {
        &mut self.flags
    }

    fn reset(&mut self, _system: &mut dyn System) {}

    fn install(&mut self, system: &mut dyn System) {
        let shift = system.page_shift();
        let page_size = 1usize << shift;

        for address in (0x1000u16..0x2000).step_by(page_size) {
            let base = DirectBase::new(Region::CartRom, (address & self.mask()) as usize);
            let access =
                PageAccess::new(DeviceId::Cartridge, PageAccessType::READWRITE).with_peek(base);
            system.set_page_access(address >> shift, access);
        }
    }

    fn peek(&mut self, _system: &mut dyn System, address: u16) -> u8 {
        self.image[(address & self.mask()) as usize]
    }

    fn poke(&mut self, _system: &mut dyn System, _address: u16, _value: u8) -> bool {
        false
    }

    fn select_bank(&mut self, _system: &mut dyn System, _bank: u16) -> bool {
        false
    }

    fn bank(&self) -> u16 {
        0
    }

    fn bank_count(&self) -> u16 {
        1
    }

    fn set_start_bank(&mut self, _bank: u16) {}

    fn patch(&mut self, address: u16, value: u8) -> bool {
        let index = (address & self.mask()) as usize;
        self.image[index] = value;
        self.flags.changed = true;
        true
    }

    fn image(&self) -> &[u8] {
        &self.image
    }

    fn region(&self, region: Region) -> &[u8] {
        match region {
            Region::CartRom => &self.image,
            _ => &[],
        }
    }

    fn region_mut(&mut self, region: Region) -> &mut [u8] {
        match region {
            Region::CartRom => &mut self.image,
            _ => &mut [],
        }
    }

    fn save(&self, out: &mut Serializer) -> bool {
        out.put_string(NAME);
        true
    }

    fn read_state(&self, input: &mut Serializer) -> Result<Option<()>, SerializerError> {
        let tag = input.get_string()?;
        if tag != NAME {
            log::warn!("State record {:?} does not belong to {}", tag, NAME);
            return Ok(None);
        }

        Ok(Some(()))
    }

    fn apply_state(&mut self, _system: &mut dyn System, _state: ()) {}
}
