//! TGSI-style text front end
//!
//! ```text
//! FRAG
//! DCL IN[0], COLOR
//! DCL OUT[0], COLOR
//! IMM[0] FLT32 { 0.0000, 1.0000, 0.0000, 1.0000 }
//!   0: MOV_SAT OUT[0].xyz, -|IN[0].wzyx|
//!   1: END
//! ```
//!
//! Control-flow operands are dropped and a trailing texture target is
//! ignored; the compiler rejects those instructions anyway.

use thiserror::Error;
use tgr_shader::{
    Component, Declaration, DstRegister, ImmediateValue, Instruction, Opcode, Processor,
    RegisterFile, Semantic, ShaderSource, SrcRegister, WriteMask,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing VERT or FRAG header")]
    MissingHeader,

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

type LineResult<T> = std::result::Result<T, String>;

/// Parse a whole shader
pub fn parse(text: &str) -> Result<ShaderSource, ParseError> {
    let mut source: Option<ShaderSource> = None;

    for (n, raw) in text.lines().enumerate() {
        let line = raw.find(';').map_or(raw, |i| &raw[..i]).trim();
        if line.is_empty() {
            continue;
        }

        match source.as_mut() {
            None => {
                let processor = match line {
                    "VERT" => Processor::Vertex,
                    "FRAG" => Processor::Fragment,
                    _ => return Err(ParseError::MissingHeader),
                };
                source = Some(ShaderSource::new(processor));
            }
            Some(source) => parse_line(source, line).map_err(|message| ParseError::Syntax {
                line: n + 1,
                message,
            })?,
        }
    }

    source.ok_or(ParseError::MissingHeader)
}

fn parse_line(source: &mut ShaderSource, line: &str) -> LineResult<()> {
    if let Some(rest) = line.strip_prefix("DCL ") {
        source.declarations.push(parse_declaration(rest)?);
    } else if line.starts_with("IMM") {
        let next = source.immediates.len() as u32;
        source.immediates.push(parse_immediate(line, next)?);
    } else if !line.starts_with("PROPERTY") {
        source.instructions.push(parse_instruction(line)?);
    }
    Ok(())
}

/// `FILE[i]` or `FILE[a..b]`, returning whatever follows the closing bracket
fn parse_reference(text: &str) -> LineResult<(RegisterFile, u32, u32, &str)> {
    let open = text
        .find('[')
        .ok_or_else(|| format!("expected register, got '{}'", text))?;
    let close = text[open..]
        .find(']')
        .map(|i| open + i)
        .ok_or_else(|| format!("unterminated register '{}'", text))?;

    let name = &text[..open];
    let file =
        RegisterFile::from_name(name).ok_or_else(|| format!("unknown register file '{}'", name))?;

    let range = &text[open + 1..close];
    let (first, last) = match range.split_once("..") {
        Some((a, b)) => (parse_index(a)?, parse_index(b)?),
        None => {
            let i = parse_index(range)?;
            (i, i)
        }
    };
    if last < first {
        return Err(format!("empty register range '{}'", range));
    }
    Ok((file, first, last, &text[close + 1..]))
}

fn parse_index(text: &str) -> LineResult<u32> {
    text.trim()
        .parse()
        .map_err(|_| format!("bad register index '{}'", text))
}

fn parse_declaration(text: &str) -> LineResult<Declaration> {
    let mut parts = text.split(',').map(str::trim);
    let reg = parts.next().unwrap_or_default();
    let (file, first, last, rest) = parse_reference(reg)?;
    if !rest.is_empty() {
        return Err(format!("unexpected '{}' after declaration", rest));
    }

    let mut decl = Declaration::new(file, first, last);
    if let Some(semantic) = parts.next() {
        let name = semantic.find('[').map_or(semantic, |i| &semantic[..i]);
        let semantic =
            Semantic::from_name(name).ok_or_else(|| format!("unknown semantic '{}'", name))?;
        decl = decl.with_semantic(semantic);
    }
    Ok(decl)
}

fn parse_immediate(line: &str, next: u32) -> LineResult<ImmediateValue> {
    let (head, body) = line
        .split_once('{')
        .ok_or_else(|| "immediate without '{'".to_string())?;
    let body = body
        .trim()
        .strip_suffix('}')
        .ok_or_else(|| "immediate without '}'".to_string())?;

    let mut head = head.split_whitespace();
    let index = match head.next() {
        Some("IMM") => next,
        Some(reg) => match parse_reference(reg)? {
            (RegisterFile::Immediate, index, _, "") => index,
            _ => return Err(format!("bad immediate name '{}'", reg)),
        },
        None => return Err("empty immediate".to_string()),
    };
    match head.next() {
        Some("FLT32") => {}
        other => {
            return Err(format!(
                "unsupported immediate type '{}'",
                other.unwrap_or_default()
            ))
        }
    }

    let parsed = body
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f32>()
                .map_err(|_| format!("bad immediate value '{}'", v.trim()))
        })
        .collect::<LineResult<Vec<_>>>()?;
    let values: [f32; 4] = parsed
        .try_into()
        .map_err(|v: Vec<f32>| format!("immediate needs 4 values, got {}", v.len()))?;

    Ok(ImmediateValue { index, values })
}

fn parse_instruction(line: &str) -> LineResult<Instruction> {
    // Drop a leading `N:` label.
    let line = match line.split_once(':') {
        Some((label, rest)) if label.trim().chars().all(|c| c.is_ascii_digit()) => rest.trim(),
        _ => line,
    };

    let (name, operands) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let (name, saturate) = match name.strip_suffix("_SAT") {
        Some(base) => (base, true),
        None => (name, false),
    };
    let opcode = Opcode::from_name(name).ok_or_else(|| format!("unknown opcode '{}'", name))?;

    let mut instr = Instruction::new(opcode);
    instr.saturate = saturate;
    if opcode.is_control_flow() {
        return Ok(instr);
    }

    let mut operands: Vec<&str> = operands
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if opcode.is_texture() && operands.len() > opcode.num_src() + 1 {
        operands.pop();
    }

    let expected = opcode.num_src() + usize::from(opcode.has_dst());
    if operands.len() != expected {
        return Err(format!(
            "{} takes {} operands, got {}",
            name,
            expected,
            operands.len()
        ));
    }

    let mut operands = operands.into_iter();
    if opcode.has_dst() {
        if let Some(dst) = operands.next() {
            instr = instr.with_dst(parse_dst(dst)?);
        }
    }
    for src in operands {
        instr = instr.with_src(parse_src(src)?);
    }
    Ok(instr)
}

fn parse_dst(text: &str) -> LineResult<DstRegister> {
    let (file, index, _, rest) = parse_reference(text)?;
    let mut dst = DstRegister::new(file, index);
    if let Some(mask) = rest.strip_prefix('.') {
        let mut bits = WriteMask::empty();
        for c in mask.chars() {
            let comp =
                Component::from_char(c).ok_or_else(|| format!("bad write mask '{}'", mask))?;
            bits |= WriteMask::from_bits_truncate(1 << comp.index());
        }
        dst = dst.masked(bits);
    } else if !rest.is_empty() {
        return Err(format!("unexpected '{}' after destination", rest));
    }
    Ok(dst)
}

fn parse_src(text: &str) -> LineResult<SrcRegister> {
    let (negate, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let (absolute, text) = match text.strip_prefix('|').and_then(|t| t.strip_suffix('|')) {
        Some(inner) => (true, inner.trim()),
        None => (false, text),
    };

    let (file, index, _, rest) = parse_reference(text)?;
    let mut src = SrcRegister::new(file, index);
    if let Some(swizzle) = rest.strip_prefix('.') {
        let comps = swizzle
            .chars()
            .map(|c| Component::from_char(c).ok_or_else(|| format!("bad swizzle '{}'", swizzle)))
            .collect::<LineResult<Vec<_>>>()?;
        src = match comps.as_slice() {
            [c] => src.scalar(*c),
            [x, y, z, w] => src.swizzled([*x, *y, *z, *w]),
            _ => return Err(format!("swizzle '{}' needs 1 or 4 components", swizzle)),
        };
    } else if !rest.is_empty() {
        return Err(format!("unexpected '{}' after source", rest));
    }

    if negate {
        src = src.negated();
    }
    if absolute {
        src = src.absolute();
    }
    Ok(src)
}
