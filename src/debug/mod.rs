//! Human readable dumps of the address space and the cartridge state.

mod fmt;

pub use fmt::FmtNum;

use crate::cartridge::Cartridge;
use crate::system::{DeviceId, DirectBase, PageTable};
use console::style;

/// One line per run of identical pages, with its read and write targets.
pub fn describe_page_table(pages: &PageTable) -> String {
    let shift = pages.page_shift();
    let is_dirty = |index: usize| pages.is_page_dirty((index << shift) as u16);

    let mut out = String::new();
    let mut entries = pages.iter().peekable();

    while let Some((first, page)) = entries.next() {
        let dirty = is_dirty(first);
        let mut last = first;

        while let Some((index, _)) =
            entries.next_if(|&(index, next)| next == page && is_dirty(index) == dirty)
        {
            last = index;
        }

        let start = (first << shift) as u16;
        let end = (((last + 1) << shift) - 1) as u16;

        out.push_str(&format!(
            "{}-{}  read: {:<16} write: {:<16}{}\n",
            start.fmt_addr(),
            end.fmt_addr(),
            target(page.direct_peek, page.peek_device),
            target(page.direct_poke, page.poke_device),
            if dirty { style(" dirty").red().to_string() } else { String::new() }
        ));
    }

    out
}

pub fn describe_cartridge<C: Cartridge + ?Sized>(cart: &C) -> String {
    let mut out = format!(
        "{}: {} bytes, bank {} of {}",
        style(cart.name()).green(),
        cart.image().len(),
        cart.bank().fmt_val(),
        cart.bank_count(),
    );

    if cart.bank_locked() {
        out.push_str(&format!(" {}", style("(locked)").red()));
    }

    for area in cart.ram_areas() {
        out.push_str(&format!(
            "\n  RAM {} bytes, read at {}, write at {}",
            area.size,
            (area.start + area.read_offset).fmt_addr(),
            (area.start + area.write_offset).fmt_addr(),
        ));
    }

    out
}

fn target(direct: Option<DirectBase>, device: DeviceId) -> String {
    match direct {
        Some(base) => format!("{:?}+{:#06X}", base.region, base.offset),
        None => format!("{:?}", device),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Cartridge3E;
    use crate::system::{PageAccess, PageAccessType, Region};

    #[test]
    fn groups_identical_pages() {
        console::set_colors_enabled(false);

        let mut pages = PageTable::new(13, 6);
        for page in 64..96 {
            let base = DirectBase::new(Region::CartRom, (page as usize - 64) * 64);
            pages.set(
                page,
                &PageAccess::new(DeviceId::Cartridge, PageAccessType::READ).with_peek(base),
            );
        }
        pages.clear_dirty_pages();
        pages.mark_dirty(0x0000);

        let dump = describe_page_table(&pages);
        let lines: Vec<&str> = dump.lines().collect();

        assert!(lines[0].starts_with("0x0000-0x003F"));
        assert!(lines[0].ends_with("dirty"));
        assert!(lines[1].starts_with("0x0040-0x0FFF"));
        assert!(lines[2].starts_with("0x1000-0x103F"));
        assert!(lines[2].contains("CartRom+0x0000"));
        assert!(lines.last().unwrap().starts_with("0x1800-0x1FFF"));
    }

    #[test]
    fn cartridge_summary() {
        console::set_colors_enabled(false);

        let mut cart = Cartridge3E::new(vec![0; 0x2000].into_boxed_slice()).unwrap();
        cart.lock_bank();

        let summary = describe_cartridge(&cart);
        assert!(summary.starts_with("Cartridge3E: 8192 bytes, bank 0x0000 of 36 (locked)"));
        assert!(summary.contains("read at 0x1000, write at 0x1400"));
    }
}
