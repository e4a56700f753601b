pub mod assembler;
pub mod binary;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod script;

pub use assembler::{disassemble, disassemble_instruction, parse_line, parse_lines, parse_str};
pub use binary::{decode_instruction, encode_instruction, read_instruction, write_instruction};
pub use error::{DecodeError, EncodeError, ScriptError, SyntaxError};
pub use instruction::{Command, Instruction, ParamError, ParamKind};
pub use opcode::Opcode;
pub use script::{BINARY_MAGIC, CutsceneScript, ScriptFormat, load_instructions};
