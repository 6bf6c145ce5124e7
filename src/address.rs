use crate::util::BitOps;

/// The VCS only decodes the lower 13 address lines
pub const ADDRESS_BITS: u16 = 13;
pub const ADDRESS_MASK: u16 = (1 << ADDRESS_BITS) - 1;

/// 64 byte pages, the smallest granularity any device maps at
pub const PAGE_SHIFT: u16 = 6;

/// Which chip answers an address, after mirroring has been removed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Addr {
    Tia(u8),        // A12 = 0, A7 = 0; register index 0x00 - 0x3F
    Ram(u8),        // A12 = 0, A9 = 0, A7 = 1; offset 0x00 - 0x7F
    RiotIo(u16),    // A12 = 0, A9 = 1, A7 = 1
    Cartridge(u16), // A12 = 1; offset 0x000 - 0xFFF
}

impl From<u16> for Addr {
    fn from(addr: u16) -> Self {
        let addr = addr & ADDRESS_MASK;

        if addr.bit(12) {
            Addr::Cartridge(addr & 0x0FFF)
        } else if !addr.bit(7) {
            Addr::Tia((addr & 0x3F) as u8)
        } else if !addr.bit(9) {
            Addr::Ram((addr & 0x7F) as u8)
        } else {
            Addr::RiotIo(addr & 0x02FF)
        }
    }
}
