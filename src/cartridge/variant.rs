//! See documentation of [`CartridgeVariant`] for more info

use super::{Cartridge, Cartridge3E, Cartridge4K};
use std::fmt::{self, Display, Formatter};
use std::{fs, io, path::Path};

/// Every bank switching scheme in its own variant, so the emulation loop can
/// be monomorphized per scheme instead of going through a trait object on
/// every bus access.
///
/// # Example
/// ```
/// use tiabus::{Cartridge, CartridgeVariant, Console, Settings};
///
/// fn dispatch(cartridge: CartridgeVariant) {
///     match cartridge {
///         CartridgeVariant::Rom4K(c) => run(c),
///         CartridgeVariant::Bank3E(c) => run(c),
///     }
/// }
///
/// fn run<C: Cartridge>(cartridge: C) {
///     let mut console = Console::new(cartridge, &Settings::default());
///     console.reset();
///     // Emulation loop goes here
/// }
///
/// dispatch(CartridgeVariant::from_image(vec![0xEA; 0x1000].into_boxed_slice()).unwrap());
/// ```
pub enum CartridgeVariant {
    Rom4K(Cartridge4K),
    Bank3E(Cartridge3E),
}

#[derive(Debug)]
pub enum CartridgeError {
    Io(io::Error),

    /// Empty, or not made of whole 2K banks
    InvalidRomSize(usize),
}

impl Display for CartridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CartridgeError::Io(err) => write!(f, "Could not read ROM: {}", err),
            CartridgeError::InvalidRomSize(len) => {
                write!(f, "{} bytes is not a valid ROM size", len)
            }
        }
    }
}

impl std::error::Error for CartridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CartridgeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CartridgeError {
    fn from(err: io::Error) -> Self {
        CartridgeError::Io(err)
    }
}

impl CartridgeVariant {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<CartridgeVariant, CartridgeError> {
        let rom = fs::read(&path)?;
        log::info!("Read {} byte ROM from {}", rom.len(), path.as_ref().display());

        CartridgeVariant::from_image(rom.into_boxed_slice())
    }

    /// 2K and 4K images are plain ROMs, every other size made of 2K banks is
    /// treated as 3E.
    pub fn from_image(image: Box<[u8]>) -> Result<CartridgeVariant, CartridgeError> {
        match image.len() {
            0x0800 | 0x1000 => Ok(CartridgeVariant::Rom4K(Cartridge4K::new(image)?)),
            _ => {
                if !is_probably_3e(&image) {
                    log::warn!("No 3E hot spot stores found in ROM, mapping it as 3E anyway");
                }

                Ok(CartridgeVariant::Bank3E(Cartridge3E::new(image)?))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CartridgeVariant::Rom4K(c) => c.name(),
            CartridgeVariant::Bank3E(c) => c.name(),
        }
    }
}

/// 3E games switch banks with zero page stores to the hot spots, so the
/// image contains `STA $3E` or `STA $3F` somewhere.
pub fn is_probably_3e(image: &[u8]) -> bool {
    const SIGNATURES: [[u8; 2]; 2] = [[0x85, 0x3E], [0x85, 0x3F]];

    image
        .windows(2)
        .any(|window| SIGNATURES.iter().any(|sig| window == sig))
}
