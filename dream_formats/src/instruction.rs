use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use thiserror::Error;

use crate::opcode::Opcode;

/// What an instruction does: a catalog entry or a host-defined name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Command {
    Builtin(Opcode),
    Custom(String),
}

impl Command {
    /// Resolve a script name against the catalog, falling back to a custom
    /// command. Custom names are kept lower-cased.
    pub fn from_name(name: &str) -> Self {
        match Opcode::from_name(name) {
            Some(opcode) => Command::Builtin(opcode),
            None => Command::Custom(name.to_lowercase()),
        }
    }

    pub fn opcode(&self) -> Option<Opcode> {
        match self {
            Command::Builtin(opcode) => Some(*opcode),
            Command::Custom(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Command::Builtin(opcode) => opcode.name(),
            Command::Custom(name) => name,
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Command::Builtin(Opcode::Fin)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The eight typed parameter lists, in presence-mask order (high bit first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Boolean,
    Char,
    String,
    Decimal,
    Double,
    Float,
    Int,
    UInt,
}

impl ParamKind {
    pub const ALL: [ParamKind; 8] = [
        ParamKind::Boolean,
        ParamKind::Char,
        ParamKind::String,
        ParamKind::Decimal,
        ParamKind::Double,
        ParamKind::Float,
        ParamKind::Int,
        ParamKind::UInt,
    ];

    /// Bit of this list in the binary presence mask.
    pub fn mask_bit(self) -> u8 {
        0x80 >> (self as u8)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParamKind::Boolean => "boolean",
            ParamKind::Char => "char",
            ParamKind::String => "string",
            ParamKind::Decimal => "decimal",
            ParamKind::Double => "double",
            ParamKind::Float => "float",
            ParamKind::Int => "int",
            ParamKind::UInt => "uint",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("{command} has no {kind} parameter at position {position}")]
    Missing {
        command: String,
        kind: ParamKind,
        position: usize,
    },
    #[error("{command} has no numeric parameter at position {position}")]
    MissingNumber { command: String, position: usize },
}

/// One cutscene instruction with its typed parameter lists.
///
/// Lists that carry no values are empty, never absent. Ordering is kept
/// within each list only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Instruction {
    pub command: Command,
    pub booleans: Vec<bool>,
    pub chars: Vec<char>,
    pub strings: Vec<String>,
    pub decimals: Vec<Decimal>,
    pub doubles: Vec<f64>,
    pub floats: Vec<f32>,
    pub ints: Vec<i32>,
    pub uints: Vec<u32>,
}

impl Instruction {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    pub fn builtin(opcode: Opcode) -> Self {
        Self::new(Command::Builtin(opcode))
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::new(Command::Custom(name.into()))
    }

    pub fn with_string(mut self, value: impl Into<String>) -> Self {
        self.strings.push(value.into());
        self
    }

    pub fn with_bool(mut self, value: bool) -> Self {
        self.booleans.push(value);
        self
    }

    pub fn with_int(mut self, value: i32) -> Self {
        self.ints.push(value);
        self
    }

    pub fn with_uint(mut self, value: u32) -> Self {
        self.uints.push(value);
        self
    }

    pub fn with_float(mut self, value: f32) -> Self {
        self.floats.push(value);
        self
    }

    pub fn with_double(mut self, value: f64) -> Self {
        self.doubles.push(value);
        self
    }

    pub fn opcode(&self) -> Option<Opcode> {
        self.command.opcode()
    }

    /// Number of values stored in one list.
    pub fn len_of(&self, kind: ParamKind) -> usize {
        match kind {
            ParamKind::Boolean => self.booleans.len(),
            ParamKind::Char => self.chars.len(),
            ParamKind::String => self.strings.len(),
            ParamKind::Decimal => self.decimals.len(),
            ParamKind::Double => self.doubles.len(),
            ParamKind::Float => self.floats.len(),
            ParamKind::Int => self.ints.len(),
            ParamKind::UInt => self.uints.len(),
        }
    }

    /// Presence mask as written in the binary form: bit set iff the list is
    /// non-empty.
    pub fn presence_mask(&self) -> u8 {
        ParamKind::ALL
            .iter()
            .filter(|&&kind| self.len_of(kind) > 0)
            .fold(0u8, |mask, kind| mask | kind.mask_bit())
    }

    pub fn string(&self, position: usize) -> Result<&str, ParamError> {
        self.strings
            .get(position)
            .map(String::as_str)
            .ok_or_else(|| self.missing(ParamKind::String, position))
    }

    pub fn boolean(&self, position: usize) -> Result<bool, ParamError> {
        self.booleans
            .get(position)
            .copied()
            .ok_or_else(|| self.missing(ParamKind::Boolean, position))
    }

    pub fn int(&self, position: usize) -> Result<i32, ParamError> {
        self.ints
            .get(position)
            .copied()
            .ok_or_else(|| self.missing(ParamKind::Int, position))
    }

    pub fn float(&self, position: usize) -> Result<f32, ParamError> {
        self.floats
            .get(position)
            .copied()
            .ok_or_else(|| self.missing(ParamKind::Float, position))
    }

    /// Numeric parameter at `position`, whatever suffix the author used.
    ///
    /// Lists are consulted in the fixed order uint, int, float, double,
    /// decimal; the first list long enough to hold `position` wins. Scripts
    /// depend on this order, so it must not change.
    pub fn number(&self, position: usize) -> Result<f64, ParamError> {
        if let Some(value) = self.uints.get(position) {
            return Ok(f64::from(*value));
        }
        if let Some(value) = self.ints.get(position) {
            return Ok(f64::from(*value));
        }
        if let Some(value) = self.floats.get(position) {
            return Ok(f64::from(*value));
        }
        if let Some(value) = self.doubles.get(position) {
            return Ok(*value);
        }
        if let Some(value) = self.decimals.get(position) {
            return Ok(value.to_f64().unwrap_or_default());
        }
        Err(ParamError::MissingNumber {
            command: self.command.name().to_string(),
            position,
        })
    }

    fn missing(&self, kind: ParamKind, position: usize) -> ParamError {
        ParamError::Missing {
            command: self.command.name().to_string(),
            kind,
            position,
        }
    }
}
