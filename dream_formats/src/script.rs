//! Cutscene script files.
//!
//! Binary scripts start with `DCUT` followed by a little-endian instruction
//! count and the records back to back. Anything else is read as UTF-8 text.
//! The sniff only looks at the first four bytes, so a text script that
//! happens to begin with `DCUT` is taken for binary.

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;

use crate::assembler;
use crate::binary::{read_instruction, write_instruction};
use crate::error::{EncodeError, ScriptError};
use crate::instruction::Instruction;

/// Bytes that prefix every binary script.
pub const BINARY_MAGIC: [u8; 4] = *b"DCUT";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptFormat {
    Binary,
    Text,
}

impl ScriptFormat {
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&BINARY_MAGIC) {
            ScriptFormat::Binary
        } else {
            ScriptFormat::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutsceneScript {
    #[serde(skip)]
    pub source: Option<PathBuf>,
    pub format: ScriptFormat,
    pub instructions: Vec<Instruction>,
}

impl CutsceneScript {
    pub fn new(format: ScriptFormat, instructions: Vec<Instruction>) -> Self {
        Self {
            source: None,
            format,
            instructions,
        }
    }

    /// Load a script from disk, text or binary.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut parsed = Self::read_from(BufReader::new(file))?;
        parsed.source = Some(path.to_path_buf());
        log::debug!(
            "loaded {:?} cutscene {} ({} instructions)",
            parsed.format,
            path.display(),
            parsed.instructions.len()
        );
        Ok(parsed)
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, ScriptError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScriptError> {
        match ScriptFormat::sniff(bytes) {
            ScriptFormat::Binary => {
                let instructions = decode_binary(&bytes[BINARY_MAGIC.len()..])?;
                Ok(Self::new(ScriptFormat::Binary, instructions))
            }
            ScriptFormat::Text => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                let text = std::str::from_utf8(body).map_err(ScriptError::NotUtf8)?;
                let instructions = assembler::parse_str(text)?;
                Ok(Self::new(ScriptFormat::Text, instructions))
            }
        }
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), ScriptError> {
        match self.format {
            ScriptFormat::Binary => {
                let count = u32::try_from(self.instructions.len()).map_err(|_| {
                    EncodeError::TooManyInstructions {
                        count: self.instructions.len(),
                    }
                })?;
                writer.write_all(&BINARY_MAGIC)?;
                writer.write_u32::<LittleEndian>(count)?;
                for instruction in &self.instructions {
                    write_instruction(&mut writer, instruction)?;
                }
            }
            ScriptFormat::Text => {
                for line in assembler::disassemble(&self.instructions) {
                    writeln!(writer, "{line}")?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ScriptError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScriptError> {
        let file = File::create(path.as_ref())?;
        self.write_to(BufWriter::new(file))
    }
}

fn decode_binary(body: &[u8]) -> Result<Vec<Instruction>, ScriptError> {
    let mut cursor = Cursor::new(body);
    let count = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| ScriptError::TruncatedHeader)?;
    let mut instructions = Vec::new();
    for index in 0..count as usize {
        let instruction = read_instruction(&mut cursor)
            .map_err(|source| ScriptError::Decode { index, source })?;
        instructions.push(instruction);
    }
    Ok(instructions)
}

/// Load the instructions of a script file.
pub fn load_instructions(path: impl AsRef<Path>) -> Result<Vec<Instruction>, ScriptError> {
    Ok(CutsceneScript::open(path)?.instructions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::opcode::Opcode;

    fn sample() -> Vec<Instruction> {
        vec![
            Instruction::builtin(Opcode::LoadDrawing)
                .with_string("bg")
                .with_string("images/bg.png")
                .with_bool(true),
            Instruction::builtin(Opcode::Wait).with_int(500),
            Instruction::custom("flash").with_float(0.25),
            Instruction::builtin(Opcode::Fin),
        ]
    }

    #[test]
    fn binary_scripts_round_trip() {
        let script = CutsceneScript::new(ScriptFormat::Binary, sample());
        let bytes = script.to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"DCUT");
        assert_eq!(&bytes[4..8], &4u32.to_le_bytes());
        let loaded = CutsceneScript::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, script);
    }

    #[test]
    fn text_scripts_round_trip() {
        let script = CutsceneScript::new(ScriptFormat::Text, sample());
        let bytes = script.to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("loadDrawing true bg images/bg.png\n"));
        let loaded = CutsceneScript::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, script);
    }

    #[test]
    fn text_with_bom_is_accepted() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"wait 10\r\nfin\r\n");
        let loaded = CutsceneScript::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.format, ScriptFormat::Text);
        assert_eq!(loaded.instructions.len(), 2);
    }

    #[test]
    fn truncated_binary_reports_index() {
        let bytes = CutsceneScript::new(ScriptFormat::Binary, sample())
            .to_bytes()
            .unwrap();
        let err = CutsceneScript::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        match err {
            ScriptError::Decode { index, source } => {
                assert_eq!(index, 3);
                assert!(matches!(source, DecodeError::Truncated));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            CutsceneScript::from_bytes(b"DCUT\x01"),
            Err(ScriptError::TruncatedHeader)
        ));
    }

    #[test]
    fn text_starting_with_magic_is_read_as_binary() {
        let err = CutsceneScript::from_bytes(b"DCUTscene 1\n").unwrap_err();
        assert!(matches!(err, ScriptError::Decode { index: 0, .. }));
    }

    #[test]
    fn saves_and_opens_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intro.dcut");
        let script = CutsceneScript::new(ScriptFormat::Binary, sample());
        script.save(&path).unwrap();

        let loaded = CutsceneScript::open(&path).unwrap();
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.instructions, script.instructions);
        assert_eq!(load_instructions(&path).unwrap().len(), 4);
    }
}
