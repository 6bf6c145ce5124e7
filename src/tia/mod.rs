//! Write side of the TIA register file. Only register storage and write
//! timing are modelled: some registers latch their new value a few color
//! clocks after the CPU wrote it, which is what the [`DelayQueue`] is for.

mod delay_queue;
mod delay_queue_member;

pub use delay_queue::{DelayQueue, DelayQueueError};
pub use delay_queue_member::{DelayQueueMember, Entry};

use crate::serializer::{Serializer, SerializerError};

pub const TIA_REG_COUNT: usize = 0x40;

const STATE_TAG: &str = "TIA";

/// Addresses of the registers with a non-zero write delay
pub mod reg {
    pub const VBLANK: u8 = 0x01;
    pub const REFP0: u8 = 0x0B;
    pub const REFP1: u8 = 0x0C;
    pub const PF0: u8 = 0x0D;
    pub const PF1: u8 = 0x0E;
    pub const PF2: u8 = 0x0F;
    pub const GRP0: u8 = 0x1B;
    pub const GRP1: u8 = 0x1C;
    pub const ENAM0: u8 = 0x1D;
    pub const ENAM1: u8 = 0x1E;
    pub const ENABL: u8 = 0x1F;
    pub const HMP0: u8 = 0x20;
    pub const HMBL: u8 = 0x24;
    pub const HMOVE: u8 = 0x2A;
    pub const HMCLR: u8 = 0x2B;
}

/// Color clocks between a write to `register` and the register changing
fn register_delay(register: u8) -> u8 {
    use reg::*;

    match register {
        PF0 | PF1 | PF2 => 2,
        GRP0 | GRP1 => 1,
        HMP0..=HMBL | HMCLR => 2,
        REFP0 | REFP1 => 1,
        ENAM0 | ENAM1 | ENABL => 1,
        VBLANK => 1,
        HMOVE => 6,
        _ => 0,
    }
}

pub struct Tia {
    registers: [u8; TIA_REG_COUNT],
    delay_queue: DelayQueue,
    cycles: u64,
}

impl Tia {
    pub fn new() -> Tia {
        Tia {
            registers: [0; TIA_REG_COUNT],
            delay_queue: DelayQueue::default(),
            cycles: 0,
        }
    }

    pub fn reset(&mut self) {
        self.registers = [0; TIA_REG_COUNT];
        self.delay_queue.reset();
        self.cycles = 0;
    }

    pub fn poke(&mut self, address: u16, value: u8) {
        let register = (address & 0x3F) as u8;

        match register_delay(register) {
            0 => self.registers[register as usize] = value,
            delay => {
                if let Err(err) = self.delay_queue.push(register, value, delay) {
                    log::warn!(
                        "Applying write of {:#04X} to TIA register {:#04X} immediately: {}",
                        value,
                        register,
                        err
                    );
                    self.registers[register as usize] = value;
                }
            }
        }
    }

    /// Nothing drives bits 5..0 on a read, they keep whatever the bus held.
    pub fn peek(&self, _address: u16, data_bus: u8) -> u8 {
        data_bus & 0x3F
    }

    pub fn cycle(&mut self) {
        let registers = &mut self.registers;
        self.delay_queue
            .execute(|address, value| registers[address as usize] = value);

        self.cycles += 1;
    }

    /// The value a register holds right now, ignoring pending writes
    pub fn register(&self, address: u16) -> u8 {
        self.registers[(address & 0x3F) as usize]
    }

    pub fn pending(&self, address: u16) -> Option<u8> {
        self.delay_queue.pending((address & 0x3F) as u8)
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn save(&self, out: &mut Serializer) -> bool {
        out.put_string(STATE_TAG);
        out.put_bytes(&self.registers);
        true
    }

    /// Pending delayed writes are not part of the state and are dropped.
    pub(crate) fn apply_state(&mut self, state: TiaState) {
        self.registers = state.registers;
        self.delay_queue.reset();
    }

    /// Reads a register file record without touching any TIA
    pub(crate) fn read_state(input: &mut Serializer) -> Result<Option<TiaState>, SerializerError> {
        let tag = input.get_string()?;
        if tag != STATE_TAG {
            log::warn!("State record {:?} does not belong to the TIA", tag);
            return Ok(None);
        }

        let bytes = input.get_bytes()?;
        if bytes.len() != TIA_REG_COUNT {
            log::warn!("TIA state holds {} registers, expected {}", bytes.len(), TIA_REG_COUNT);
            return Ok(None);
        }

        let mut registers = [0; TIA_REG_COUNT];
        registers.copy_from_slice(&bytes);
        Ok(Some(TiaState { registers }))
    }
}

pub(crate) struct TiaState {
    registers: [u8; TIA_REG_COUNT],
}

impl Default for Tia {
    fn default() -> Self {
        Tia::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CXCLR: u16 = 0x2C;

    #[test]
    fn undelayed_write_is_immediate() {
        let mut tia = Tia::new();
        tia.poke(CXCLR, 0x55);

        assert_eq!(tia.register(CXCLR), 0x55);
        assert_eq!(tia.pending(CXCLR), None);
    }

    #[test]
    fn playfield_write_lands_two_cycles_later() {
        let mut tia = Tia::new();
        tia.poke(reg::PF1 as u16, 0xF0);

        assert_eq!(tia.register(reg::PF1 as u16), 0);
        tia.cycle();
        assert_eq!(tia.register(reg::PF1 as u16), 0);
        tia.cycle();
        assert_eq!(tia.register(reg::PF1 as u16), 0xF0);
        assert_eq!(tia.cycles(), 2);
    }

    #[test]
    fn hmove_waits_six_cycles() {
        let mut tia = Tia::new();
        tia.poke(reg::HMOVE as u16, 1);

        for _ in 0..5 {
            tia.cycle();
        }
        assert_eq!(tia.pending(reg::HMOVE as u16), Some(1));

        tia.cycle();
        assert_eq!(tia.register(reg::HMOVE as u16), 1);
    }

    #[test]
    fn mirrored_addresses_hit_the_same_register() {
        let mut tia = Tia::new();
        // 0x41 mirrors VBLANK
        tia.poke(0x41, 0x02);
        tia.cycle();

        assert_eq!(tia.register(reg::VBLANK as u16), 0x02);
    }

    #[test]
    fn reads_float_low_bits() {
        let tia = Tia::new();
        assert_eq!(tia.peek(0x00, 0xFF), 0x3F);
        assert_eq!(tia.peek(0x00, 0xA5), 0x25);
    }

    #[test]
    fn foreign_record_is_not_a_register_file() {
        let mut state = Serializer::new();
        state.put_string("Board");

        assert!(Tia::read_state(&mut state).unwrap().is_none());
    }

    #[test]
    fn save_and_load_registers() {
        let mut tia = Tia::new();
        tia.poke(CXCLR, 0x12);
        tia.poke(reg::GRP0 as u16, 0x34);
        tia.cycle();

        let mut state = Serializer::new();
        assert!(tia.save(&mut state));

        let mut restored = Tia::new();
        restored.poke(reg::PF0 as u16, 0xFF);
        restored.apply_state(Tia::read_state(&mut state).unwrap().unwrap());

        assert_eq!(restored.register(CXCLR), 0x12);
        assert_eq!(restored.register(reg::GRP0 as u16), 0x34);
        assert_eq!(restored.pending(reg::PF0 as u16), None);
    }
}
