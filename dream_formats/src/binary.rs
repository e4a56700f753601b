//! Binary instruction layout.
//!
//! ```text
//! u8        opcode ordinal (0 = custom)
//! string    custom name, only when the ordinal is 0
//! u8        presence mask 0bBHSCDFIU (bool, char, string, decimal, double,
//!           float, int, uint)
//! per set bit, high to low:
//!   u8      value count
//!   ...     values
//! ```
//!
//! There is no per-record length or terminator, so reader and writer must
//! agree on every byte.

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rust_decimal::Decimal;

use crate::error::{DecodeError, EncodeError};
use crate::instruction::{Command, Instruction, ParamKind};
use crate::opcode::{CUSTOM_ORDINAL, Opcode};

const DECIMAL_MAX_SCALE: u32 = 28;
const DECIMAL_SIGN_BIT: u32 = 0x8000_0000;

pub fn read_instruction<R: Read>(reader: &mut R) -> Result<Instruction, DecodeError> {
    let ordinal = reader.read_u8()?;
    let command = if ordinal == CUSTOM_ORDINAL {
        Command::Custom(read_string(reader, "custom command name")?)
    } else {
        let opcode = Opcode::from_u8(ordinal).ok_or(DecodeError::UnknownOpcode(ordinal))?;
        Command::Builtin(opcode)
    };

    let mask = reader.read_u8()?;
    let mut instruction = Instruction::new(command);
    for kind in ParamKind::ALL {
        if mask & kind.mask_bit() == 0 {
            continue;
        }
        let count = reader.read_u8()? as usize;
        match kind {
            ParamKind::Boolean => {
                instruction.booleans = read_list(reader, count, |r| Ok(r.read_u8()? != 0))?;
            }
            ParamKind::Char => {
                instruction.chars = read_list(reader, count, read_char)?;
            }
            ParamKind::String => {
                instruction.strings =
                    read_list(reader, count, |r| read_string(r, "string parameter"))?;
            }
            ParamKind::Decimal => {
                instruction.decimals = read_list(reader, count, read_decimal)?;
            }
            ParamKind::Double => {
                instruction.doubles =
                    read_list(reader, count, |r| Ok(r.read_f64::<LittleEndian>()?))?;
            }
            ParamKind::Float => {
                instruction.floats =
                    read_list(reader, count, |r| Ok(r.read_f32::<LittleEndian>()?))?;
            }
            ParamKind::Int => {
                instruction.ints = read_list(reader, count, |r| Ok(r.read_i32::<LittleEndian>()?))?;
            }
            ParamKind::UInt => {
                instruction.uints =
                    read_list(reader, count, |r| Ok(r.read_u32::<LittleEndian>()?))?;
            }
        }
    }
    Ok(instruction)
}

pub fn write_instruction<W: Write>(
    writer: &mut W,
    instruction: &Instruction,
) -> Result<(), EncodeError> {
    for kind in ParamKind::ALL {
        let len = instruction.len_of(kind);
        if len > u8::MAX as usize {
            return Err(EncodeError::TooManyParameters { kind, len });
        }
    }

    match &instruction.command {
        Command::Builtin(opcode) => writer.write_u8(opcode.ordinal())?,
        Command::Custom(name) => {
            writer.write_u8(CUSTOM_ORDINAL)?;
            write_string(writer, name)?;
        }
    }

    let mask = instruction.presence_mask();
    writer.write_u8(mask)?;
    for kind in ParamKind::ALL {
        if mask & kind.mask_bit() == 0 {
            continue;
        }
        writer.write_u8(instruction.len_of(kind) as u8)?;
        match kind {
            ParamKind::Boolean => {
                for &value in &instruction.booleans {
                    writer.write_u8(u8::from(value))?;
                }
            }
            ParamKind::Char => {
                for &value in &instruction.chars {
                    write_char(writer, value)?;
                }
            }
            ParamKind::String => {
                for value in &instruction.strings {
                    write_string(writer, value)?;
                }
            }
            ParamKind::Decimal => {
                for value in &instruction.decimals {
                    write_decimal(writer, value)?;
                }
            }
            ParamKind::Double => {
                for &value in &instruction.doubles {
                    writer.write_f64::<LittleEndian>(value)?;
                }
            }
            ParamKind::Float => {
                for &value in &instruction.floats {
                    writer.write_f32::<LittleEndian>(value)?;
                }
            }
            ParamKind::Int => {
                for &value in &instruction.ints {
                    writer.write_i32::<LittleEndian>(value)?;
                }
            }
            ParamKind::UInt => {
                for &value in &instruction.uints {
                    writer.write_u32::<LittleEndian>(value)?;
                }
            }
        }
    }
    Ok(())
}

pub fn encode_instruction(instruction: &Instruction) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    write_instruction(&mut out, instruction)?;
    Ok(out)
}

pub fn decode_instruction(bytes: &[u8]) -> Result<Instruction, DecodeError> {
    read_instruction(&mut Cursor::new(bytes))
}

fn read_list<R, T, F>(reader: &mut R, count: usize, mut read_one: F) -> Result<Vec<T>, DecodeError>
where
    R: Read,
    F: FnMut(&mut R) -> Result<T, DecodeError>,
{
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(read_one(reader)?);
    }
    Ok(values)
}

fn read_7bit_len<R: Read>(reader: &mut R) -> Result<usize, DecodeError> {
    let mut value: u32 = 0;
    for shift in (0..35).step_by(7) {
        let byte = reader.read_u8()?;
        value |= u32::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value as usize);
        }
    }
    Err(DecodeError::BadLength)
}

fn write_7bit_len<W: Write>(writer: &mut W, len: usize) -> Result<(), EncodeError> {
    let mut value = len as u32;
    while value >= 0x80 {
        writer.write_u8((value as u8) | 0x80)?;
        value >>= 7;
    }
    writer.write_u8(value as u8)?;
    Ok(())
}

pub(crate) fn read_string<R: Read>(reader: &mut R, what: &'static str) -> Result<String, DecodeError> {
    let len = read_7bit_len(reader)?;
    let mut bytes = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(DecodeError::Truncated);
    }
    String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8(what))
}

pub(crate) fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<(), EncodeError> {
    write_7bit_len(writer, value.len())?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

fn read_char<R: Read>(reader: &mut R) -> Result<char, DecodeError> {
    let lead = reader.read_u8()?;
    let width = match lead {
        0x00..=0x7F => 1,
        _ if lead >> 5 == 0b110 => 2,
        _ if lead >> 4 == 0b1110 => 3,
        _ if lead >> 3 == 0b11110 => 4,
        _ => return Err(DecodeError::InvalidUtf8("char parameter")),
    };
    let mut buf = [lead, 0, 0, 0];
    reader.read_exact(&mut buf[1..width])?;
    std::str::from_utf8(&buf[..width])
        .ok()
        .and_then(|text| text.chars().next())
        .ok_or(DecodeError::InvalidUtf8("char parameter"))
}

fn write_char<W: Write>(writer: &mut W, value: char) -> Result<(), EncodeError> {
    let mut buf = [0u8; 4];
    writer.write_all(value.encode_utf8(&mut buf).as_bytes())?;
    Ok(())
}

/// Decimals are four little-endian words: low, middle and high mantissa
/// bits, then flags holding the scale (bits 16-23) and sign (bit 31).
fn read_decimal<R: Read>(reader: &mut R) -> Result<Decimal, DecodeError> {
    let lo = reader.read_u32::<LittleEndian>()?;
    let mid = reader.read_u32::<LittleEndian>()?;
    let hi = reader.read_u32::<LittleEndian>()?;
    let flags = reader.read_u32::<LittleEndian>()?;

    let scale = (flags >> 16) & 0xFF;
    if scale > DECIMAL_MAX_SCALE {
        return Err(DecodeError::BadDecimalScale(scale));
    }
    let magnitude = i128::from(lo) | (i128::from(mid) << 32) | (i128::from(hi) << 64);
    let mantissa = if flags & DECIMAL_SIGN_BIT != 0 {
        -magnitude
    } else {
        magnitude
    };
    Ok(Decimal::from_i128_with_scale(mantissa, scale))
}

fn write_decimal<W: Write>(writer: &mut W, value: &Decimal) -> Result<(), EncodeError> {
    let magnitude = value.mantissa().unsigned_abs();
    let mut flags = value.scale() << 16;
    if value.is_sign_negative() {
        flags |= DECIMAL_SIGN_BIT;
    }
    writer.write_u32::<LittleEndian>(magnitude as u32)?;
    writer.write_u32::<LittleEndian>((magnitude >> 32) as u32)?;
    writer.write_u32::<LittleEndian>((magnitude >> 64) as u32)?;
    writer.write_u32::<LittleEndian>(flags)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn every_list() -> Instruction {
        Instruction {
            command: Command::Builtin(Opcode::SoundPosition),
            booleans: vec![true, false],
            chars: vec!['a', 'é', '雪'],
            strings: vec!["theme".to_string(), "with space".to_string(), String::new()],
            decimals: vec![
                Decimal::from_str("1.50").unwrap(),
                Decimal::from_str("-79228162514264337593543950335").unwrap(),
            ],
            doubles: vec![0.25, -1e10],
            floats: vec![1.5],
            ints: vec![-7, i32::MAX],
            uints: vec![0, u32::MAX],
        }
    }

    #[test]
    fn round_trips_every_list() {
        let instruction = every_list();
        let bytes = encode_instruction(&instruction).unwrap();
        assert_eq!(decode_instruction(&bytes).unwrap(), instruction);
    }

    #[test]
    fn round_trips_sparse_lists() {
        let cases = vec![
            Instruction::builtin(Opcode::Fin),
            Instruction::builtin(Opcode::Wait).with_uint(500),
            Instruction::builtin(Opcode::DrawingColor)
                .with_string("bg")
                .with_int(255)
                .with_int(0)
                .with_int(64),
            Instruction::custom("shake").with_float(2.0).with_bool(false),
            Instruction::custom(""),
        ];
        for instruction in cases {
            let bytes = encode_instruction(&instruction).unwrap();
            assert_eq!(decode_instruction(&bytes).unwrap(), instruction);
        }
    }

    #[test]
    fn decimal_keeps_scale() {
        let mut instruction = Instruction::builtin(Opcode::Wait);
        instruction.decimals.push(Decimal::from_str("2.500").unwrap());
        let decoded = decode_instruction(&encode_instruction(&instruction).unwrap()).unwrap();
        assert_eq!(decoded.decimals[0].scale(), 3);
        assert_eq!(decoded.decimals[0].to_string(), "2.500");
    }

    #[test]
    fn presence_byte_matches_non_empty_lists() {
        let instruction = Instruction::builtin(Opcode::PlaySound)
            .with_string("theme")
            .with_float(0.8);
        let bytes = encode_instruction(&instruction).unwrap();
        assert_eq!(bytes[0], Opcode::PlaySound.ordinal());
        assert_eq!(bytes[1], 0b0010_0100);

        let fin = encode_instruction(&Instruction::builtin(Opcode::Fin)).unwrap();
        assert_eq!(fin, vec![0xFF, 0x00]);
    }

    #[test]
    fn encodes_wait_byte_for_byte() {
        let bytes = encode_instruction(&Instruction::builtin(Opcode::Wait).with_int(500)).unwrap();
        assert_eq!(bytes, vec![0x01, 0b0000_0010, 0x01, 0xF4, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn custom_name_is_length_prefixed() {
        let bytes = encode_instruction(&Instruction::custom("shake")).unwrap();
        assert_eq!(bytes, vec![0x00, 0x05, b's', b'h', b'a', b'k', b'e', 0x00]);
    }

    #[test]
    fn long_strings_use_multi_byte_prefix() {
        let long = "x".repeat(300);
        let instruction = Instruction::builtin(Opcode::WindowTitle).with_string(long.clone());
        let bytes = encode_instruction(&instruction).unwrap();
        assert_eq!(&bytes[3..5], &[0xAC, 0x02]);
        assert_eq!(decode_instruction(&bytes).unwrap().strings[0], long);
    }

    #[test]
    fn unset_bits_decode_to_empty_lists() {
        let decoded = decode_instruction(&[Opcode::HideDrawing.ordinal(), 0x20, 1, 2, b'b', b'g'])
            .unwrap();
        assert_eq!(decoded.strings, vec!["bg".to_string()]);
        assert!(decoded.booleans.is_empty());
        assert!(decoded.uints.is_empty());
    }

    #[test]
    fn rejects_unknown_opcode() {
        let err = decode_instruction(&[0x60, 0x00]).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownOpcode(0x60)));
    }

    #[test]
    fn reports_truncation() {
        let bytes = encode_instruction(&every_list()).unwrap();
        let err = decode_instruction(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated));
    }

    #[test]
    fn huge_length_prefix_is_truncation() {
        let err = decode_instruction(&[0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, b'x']).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated));
    }

    #[test]
    fn refuses_oversized_lists() {
        let mut instruction = Instruction::builtin(Opcode::Wait);
        instruction.ints = vec![1; 256];
        let err = encode_instruction(&instruction).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::TooManyParameters {
                kind: ParamKind::Int,
                len: 256
            }
        ));
    }
}
