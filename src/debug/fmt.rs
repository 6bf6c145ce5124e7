use console::{style, StyledObject};

/// Formats numbers as values (blue) or addresses (yellow)
pub trait FmtNum {
    fn fmt_val(self) -> StyledObject<String>;
    fn fmt_addr(self) -> StyledObject<String>;
}

impl FmtNum for u8 {
    fn fmt_val(self) -> StyledObject<String> {
        style(format!("{:#04X}", self)).blue()
    }

    fn fmt_addr(self) -> StyledObject<String> {
        style(format!("{:#04X}", self)).yellow()
    }
}

impl FmtNum for u16 {
    fn fmt_val(self) -> StyledObject<String> {
        style(format!("{:#06X}", self)).blue()
    }

    fn fmt_addr(self) -> StyledObject<String> {
        style(format!("{:#06X}", self)).yellow()
    }
}
