/// Per-bit address decoding helpers
pub trait BitOps: Copy {
    #[must_use]
    fn bit(self, bit: u8) -> bool;
}

macro_rules! impl_bitops {
    ($($type:ty),*) => {
        $(impl BitOps for $type {
            fn bit(self, bit: u8) -> bool {
                (self >> bit) & 1 != 0
            }
        })*
    };
}

impl_bitops!(u16);
