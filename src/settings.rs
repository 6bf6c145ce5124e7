use std::env;
use std::fmt::{self, Display, Formatter};

pub const SEED_VAR: &str = "TIABUS_SEED";
pub const START_BANK_VAR: &str = "TIABUS_START_BANK";
pub const TIA_DRIVEN_VAR: &str = "TIABUS_TIA_DRIVEN";

/// Knobs that change how the console powers up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Makes RAM contents at reset and floating bus bits reproducible
    pub random_seed: Option<u64>,
    /// Bank the cartridge maps at install and reset
    pub start_bank: Option<u16>,
    /// Undriven data bus bits are random instead of pulled high
    pub tia_driven: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    InvalidNumber { var: &'static str, value: String },
    InvalidFlag { var: &'static str, value: String },
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::InvalidNumber { var, value } => {
                write!(f, "{}={:?} is not a valid number", var, value)
            }
            SettingsError::InvalidFlag { var, value } => {
                write!(f, "{}={:?} is not a valid flag (use 1/0, true/false, yes/no, on/off)", var, value)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

impl Settings {
    pub fn from_env() -> Result<Settings, SettingsError> {
        Settings::from_lookup(|var| env::var(var).ok())
    }

    /// Builds settings from any variable source. Unset variables keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(value) = lookup(SEED_VAR) {
            let seed = parse_int::parse::<u64>(value.trim())
                .map_err(|_| SettingsError::InvalidNumber { var: SEED_VAR, value: value.clone() })?;
            settings.random_seed = Some(seed);
        }

        if let Some(value) = lookup(START_BANK_VAR) {
            let bank = parse_int::parse::<u16>(value.trim()).map_err(|_| {
                SettingsError::InvalidNumber { var: START_BANK_VAR, value: value.clone() }
            })?;
            settings.start_bank = Some(bank);
        }

        if let Some(value) = lookup(TIA_DRIVEN_VAR) {
            settings.tia_driven = parse_flag(TIA_DRIVEN_VAR, &value)?;
        }

        Ok(settings)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SettingsError::InvalidFlag {
            var,
            value: value.to_owned(),
        }),
    }
}
