//! Text form of cutscene scripts.
//!
//! One instruction per line: `opcode [params...]`. Parameters are space
//! separated; `"..."` is a string, `'.'` a char, `true`/`false` a bool and
//! numbers pick their list from a trailing `m` (decimal), `d` (double),
//! `f` (float) or `u` (uint) suffix, defaulting to int. `#...#` marks a
//! comment region anywhere on a line and `\` escapes the next character.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{ScriptError, SyntaxError};
use crate::instruction::{Command, Instruction, ParamKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Plain,
    Quoted,
    Char,
}

/// Parse every line of a script. Empty and comment-only lines are skipped.
pub fn parse_lines<I, S>(lines: I) -> Result<Vec<Instruction>, ScriptError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut instructions = Vec::new();
    for (idx, line) in lines.into_iter().enumerate() {
        let parsed = parse_line(line.as_ref())
            .map_err(|source| ScriptError::Syntax {
                line: idx + 1,
                source,
            })?;
        if let Some(instruction) = parsed {
            instructions.push(instruction);
        }
    }
    Ok(instructions)
}

pub fn parse_str(text: &str) -> Result<Vec<Instruction>, ScriptError> {
    parse_lines(text.lines())
}

/// Parse a single line; `None` when nothing is left after comment removal.
pub fn parse_line(line: &str) -> Result<Option<Instruction>, SyntaxError> {
    let cleaned: String = line
        .chars()
        .filter(|ch| !matches!(ch, '\r' | '\n' | '\t'))
        .collect();
    let code = strip_comments(&cleaned);
    let code = code.trim_start_matches(' ');
    if code.is_empty() {
        return Ok(None);
    }

    let (name, rest) = code.split_once(' ').unwrap_or((code, ""));
    let mut instruction = Instruction::new(Command::from_name(name));
    for token in tokenize(rest)? {
        match token {
            Token::Quoted(text) => instruction.strings.push(text),
            Token::Char(ch) => instruction.chars.push(ch),
            Token::Plain(text) => classify(&text, &mut instruction)?,
        }
    }
    Ok(Some(instruction))
}

/// Drop `#...#` regions. Unescaped `#` toggles comment mode; the delimiters
/// are dropped too. Escapes are left in place for the tokenizer.
pub fn strip_comments(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_comment = false;
    let mut escaped = false;
    for ch in line.chars() {
        if escaped {
            escaped = false;
            if !in_comment {
                out.push(ch);
            }
            continue;
        }
        match ch {
            '\\' => {
                escaped = true;
                if !in_comment {
                    out.push(ch);
                }
            }
            '#' => in_comment = !in_comment,
            _ if !in_comment => out.push(ch),
            _ => {}
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Plain(String),
    Quoted(String),
    Char(char),
}

fn tokenize(rest: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut mode = Mode::Plain;
    let mut escaped = false;

    for ch in rest.chars() {
        if !escaped && ch == '\\' {
            escaped = true;
            continue;
        }
        let literal = escaped;
        escaped = false;

        match mode {
            Mode::Quoted => {
                if !literal && ch == '"' {
                    tokens.push(Token::Quoted(std::mem::take(&mut current)));
                    mode = Mode::Plain;
                } else {
                    current.push(ch);
                }
            }
            Mode::Char => {
                if !literal && ch == '\'' {
                    let value = current.chars().next().ok_or(SyntaxError::EmptyChar)?;
                    tokens.push(Token::Char(value));
                    current.clear();
                    mode = Mode::Plain;
                } else {
                    current.push(ch);
                }
            }
            Mode::Plain => match ch {
                '"' if !literal => {
                    flush_plain(&mut current, &mut tokens);
                    mode = Mode::Quoted;
                }
                '\'' if !literal => {
                    flush_plain(&mut current, &mut tokens);
                    mode = Mode::Char;
                }
                ' ' if !literal => flush_plain(&mut current, &mut tokens),
                _ => current.push(ch),
            },
        }
    }

    match mode {
        Mode::Plain => flush_plain(&mut current, &mut tokens),
        Mode::Quoted => return Err(SyntaxError::UnterminatedString),
        Mode::Char => return Err(SyntaxError::UnterminatedChar),
    }
    Ok(tokens)
}

fn flush_plain(current: &mut String, tokens: &mut Vec<Token>) {
    if !current.is_empty() {
        tokens.push(Token::Plain(std::mem::take(current)));
    }
}

/// Shape a plain token would be read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Boolean(bool),
    Digit,
    Numeric,
    Text,
}

fn shape_of(token: &str) -> Shape {
    if token.eq_ignore_ascii_case("true") {
        return Shape::Boolean(true);
    }
    if token.eq_ignore_ascii_case("false") {
        return Shape::Boolean(false);
    }
    let len = token.chars().count();
    if len == 1 && token.chars().all(|ch| ch.is_ascii_digit()) {
        // A lone digit is always an int, whatever context it appears in.
        return Shape::Digit;
    }
    let body_is_numeric = token
        .chars()
        .take(len.saturating_sub(1))
        .all(|ch| ch.is_ascii_digit() || ch == '.');
    if len > 1 && body_is_numeric {
        Shape::Numeric
    } else {
        Shape::Text
    }
}

fn classify(token: &str, instruction: &mut Instruction) -> Result<(), SyntaxError> {
    match shape_of(token) {
        Shape::Boolean(value) => instruction.booleans.push(value),
        Shape::Digit => instruction.ints.push(parse_number(token, ParamKind::Int)?),
        Shape::Text => instruction.strings.push(token.to_string()),
        Shape::Numeric => {
            let last = token.char_indices().last().map_or(0, |(idx, _)| idx);
            let (body, suffix) = token.split_at(last);
            match suffix.to_ascii_lowercase().as_str() {
                "m" => instruction
                    .decimals
                    .push(parse_number(body, ParamKind::Decimal)?),
                "d" => instruction
                    .doubles
                    .push(parse_finite(body, ParamKind::Double)?),
                "f" => instruction
                    .floats
                    .push(parse_finite(body, ParamKind::Float)?),
                "u" => instruction.uints.push(parse_number(body, ParamKind::UInt)?),
                _ => instruction.ints.push(parse_number(token, ParamKind::Int)?),
            }
        }
    }
    Ok(())
}

fn parse_number<T: FromStr>(literal: &str, kind: ParamKind) -> Result<T, SyntaxError> {
    literal.parse::<T>().map_err(|_| SyntaxError::BadNumber {
        literal: literal.to_string(),
        kind,
    })
}

/// Floating-point parsing saturates to infinity instead of failing.
fn parse_finite<T>(literal: &str, kind: ParamKind) -> Result<T, SyntaxError>
where
    T: FromStr + Copy + Into<f64>,
{
    let value: T = parse_number(literal, kind)?;
    if value.into().is_finite() {
        Ok(value)
    } else {
        Err(SyntaxError::BadNumber {
            literal: literal.to_string(),
            kind,
        })
    }
}

/// Render instructions back to script lines.
pub fn disassemble(instructions: &[Instruction]) -> Vec<String> {
    instructions.iter().map(disassemble_instruction).collect()
}

/// Render one instruction. Lists are emitted in mask order (bool, char,
/// string, decimal, double, float, int, uint), so cross-list ordering from
/// the source line is not preserved.
pub fn disassemble_instruction(instruction: &Instruction) -> String {
    let mut line = lower_first(instruction.command.name());

    for value in &instruction.booleans {
        line.push(' ');
        line.push_str(if *value { "true" } else { "false" });
    }
    for value in &instruction.chars {
        line.push_str(" '");
        push_escaped(&mut line, &value.to_string());
        line.push('\'');
    }
    for value in &instruction.strings {
        line.push(' ');
        if needs_quotes(value) {
            line.push('"');
            push_escaped(&mut line, value);
            line.push('"');
        } else {
            push_escaped(&mut line, value);
        }
    }
    for value in &instruction.decimals {
        line.push_str(&format!(" {value}m"));
    }
    for value in &instruction.doubles {
        line.push_str(&format!(" {value}d"));
    }
    for value in &instruction.floats {
        line.push_str(&format!(" {value}f"));
    }
    for value in &instruction.ints {
        line.push_str(&format!(" {value}"));
    }
    for value in &instruction.uints {
        line.push_str(&format!(" {value}u"));
    }
    line
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Strings that would not read back as a plain string token get quoted.
fn needs_quotes(value: &str) -> bool {
    value.is_empty() || value.contains(' ') || shape_of(value) != Shape::Text
}

fn push_escaped(line: &mut String, value: &str) {
    for ch in value.chars() {
        if matches!(ch, '#' | '"' | '\'' | '\\') {
            line.push('\\');
        }
        line.push(ch);
    }
}
