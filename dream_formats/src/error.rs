use std::io;

use thiserror::Error;

use crate::instruction::ParamKind;

/// Problem on a single line of a text script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("cannot convert '{literal}' to {kind}")]
    BadNumber { literal: String, kind: ParamKind },
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated char literal")]
    UnterminatedChar,
    #[error("empty char literal")]
    EmptyChar,
}

/// Problem decoding one binary instruction.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown opcode ordinal {0:#04x}")]
    UnknownOpcode(u8),
    #[error("malformed 7-bit length prefix")]
    BadLength,
    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),
    #[error("decimal scale {0} is out of range")]
    BadDecimalScale(u32),
    #[error("unexpected end of stream")]
    Truncated,
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DecodeError::Truncated
        } else {
            DecodeError::Io(err)
        }
    }
}

/// Problem encoding one binary instruction.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{kind} list holds {len} values; at most 255 fit in a binary script")]
    TooManyParameters { kind: ParamKind, len: usize },
    #[error("{count} instructions do not fit in a binary script")]
    TooManyInstructions { count: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure loading or saving a whole script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: {source}")]
    Syntax {
        line: usize,
        #[source]
        source: SyntaxError,
    },
    #[error("instruction {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: DecodeError,
    },
    #[error("binary script header is truncated")]
    TruncatedHeader,
    #[error("text script is not valid UTF-8")]
    NotUtf8(#[source] std::str::Utf8Error),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
