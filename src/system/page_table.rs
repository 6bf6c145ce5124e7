use super::{DeviceId, DirectBase, PageAccess, PageAccessType};
use fixedbitset::FixedBitSet;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Page {
    pub direct_peek: Option<DirectBase>,
    pub direct_poke: Option<DirectBase>,
    pub peek_device: DeviceId,
    pub poke_device: DeviceId,
}

impl Page {
    const UNMAPPED: Page = Page {
        direct_peek: None,
        direct_poke: None,
        peek_device: DeviceId::Unmapped,
        poke_device: DeviceId::Unmapped,
    };
}

/// The address space, split into `1 << page_shift` byte pages.
pub struct PageTable {
    pages: Box<[Page]>,
    dirty: FixedBitSet,
    address_mask: u16,
    page_shift: u16,
}

impl PageTable {
    pub fn new(address_bits: u16, page_shift: u16) -> PageTable {
        assert!(address_bits <= 16 && page_shift < address_bits);

        let num_pages = 1usize << (address_bits - page_shift);

        PageTable {
            pages: vec![Page::UNMAPPED; num_pages].into_boxed_slice(),
            dirty: FixedBitSet::with_capacity(num_pages),
            address_mask: ((1u32 << address_bits) - 1) as u16,
            page_shift,
        }
    }

    pub fn page_shift(&self) -> u16 {
        self.page_shift
    }

    pub fn page_size(&self) -> u16 {
        1 << self.page_shift
    }

    pub fn page_mask(&self) -> u16 {
        self.page_size() - 1
    }

    pub fn address_mask(&self) -> u16 {
        self.address_mask
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn page_index(&self, address: u16) -> usize {
        ((address & self.address_mask) >> self.page_shift) as usize
    }

    pub fn page(&self, address: u16) -> &Page {
        &self.pages[self.page_index(address)]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Page)> + '_ {
        self.pages.iter().enumerate()
    }

    pub fn set(&mut self, page: u16, access: &PageAccess) {
        let index = page as usize;

        let entry = match self.pages.get_mut(index) {
            Some(entry) => entry,
            None => {
                log::warn!("Ignoring access for page {} outside the address space", page);
                return;
            }
        };

        if access.access_type.contains(PageAccessType::READ) {
            entry.direct_peek = access.direct_peek;
            entry.peek_device = access.device;
        }

        if access.access_type.contains(PageAccessType::WRITE) {
            entry.direct_poke = access.direct_poke;
            entry.poke_device = access.device;
        }

        self.dirty.insert(index);
    }

    pub fn mark_dirty(&mut self, address: u16) {
        let index = self.page_index(address);
        self.dirty.insert(index);
    }

    pub fn is_page_dirty(&self, address: u16) -> bool {
        self.dirty.contains(self.page_index(address))
    }

    /// Indices of every page installed or written since the last clear
    pub fn dirty_pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.dirty.ones()
    }

    pub fn clear_dirty_pages(&mut self) {
        self.dirty.clear();
    }
}
