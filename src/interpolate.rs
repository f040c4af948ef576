//! Message template interpolation.
//!
//! Templates use printf-style conversions (`%s`, `%d`, `%i`, `%f`, `%r`,
//! `%%`). When those cannot be applied to the supplied arguments the
//! formatter retries with brace placeholders (`{}` / `{N}`) before giving
//! up and keeping the literal template.

use crate::record::LogArg;
use std::iter::Peekable;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterpolationError {
    #[error("not enough arguments for format string")]
    NotEnoughArguments,

    #[error("not all arguments converted during string formatting")]
    TooManyArguments,

    #[error("%{conversion} format: a number is required, not {found}")]
    TypeMismatch { conversion: char, found: &'static str },

    #[error("unsupported format character '{0}'")]
    UnsupportedConversion(char),

    #[error("incomplete format")]
    Incomplete,

    #[error("replacement index {0} out of range")]
    IndexOutOfRange(usize),

    #[error("unmatched brace in format string")]
    UnmatchedBrace,
}

/// Apply printf-style conversions to `template`.
///
/// Each conversion may carry flags (`-`, `+`, space, `0`), a minimum width
/// and a precision, e.g. `%-10s`, `%05d` or `%.2f`.
pub fn percent_format(template: &str, args: &[LogArg]) -> Result<String, InterpolationError> {
    let mut out = String::with_capacity(template.len());
    let mut remaining = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let directive = Directive::parse(&mut chars);
        let conversion = chars.next().ok_or(InterpolationError::Incomplete)?;
        if conversion == '%' {
            out.push('%');
            continue;
        }
        let arg = remaining
            .next()
            .ok_or(InterpolationError::NotEnoughArguments)?;
        let rendered = match conversion {
            's' => directive.text(arg.to_string()),
            'r' => directive.text(repr(arg)),
            'd' | 'i' => directive.integer(as_integer(arg, conversion)?),
            'f' | 'F' => directive.float(as_float(arg, conversion)?),
            other => return Err(InterpolationError::UnsupportedConversion(other)),
        };
        out.push_str(&rendered);
    }

    if remaining.next().is_some() {
        return Err(InterpolationError::TooManyArguments);
    }
    Ok(out)
}

/// Flags, width and precision between `%` and the conversion character.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Directive {
    left_align: bool,
    zero_pad: bool,
    sign: Option<char>,
    width: Option<usize>,
    precision: Option<usize>,
}

impl Directive {
    fn parse<I>(chars: &mut Peekable<I>) -> Self
    where
        I: Iterator<Item = char>,
    {
        let mut directive = Directive::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => directive.left_align = true,
                '0' => directive.zero_pad = true,
                '+' => directive.sign = Some('+'),
                ' ' => {
                    directive.sign.get_or_insert(' ');
                }
                _ => break,
            }
            chars.next();
        }
        directive.width = digits(chars);
        if chars.peek() == Some(&'.') {
            chars.next();
            directive.precision = Some(digits(chars).unwrap_or(0));
        }
        directive
    }

    fn text(&self, mut value: String) -> String {
        if let Some(precision) = self.precision {
            if let Some((cut, _)) = value.char_indices().nth(precision) {
                value.truncate(cut);
            }
        }
        self.pad(value, false)
    }

    fn integer(&self, value: i64) -> String {
        let mut digits = value.unsigned_abs().to_string();
        if let Some(precision) = self.precision {
            if digits.len() < precision {
                digits.insert_str(0, &"0".repeat(precision - digits.len()));
            }
        }
        self.signed(value < 0, digits)
    }

    fn float(&self, value: f64) -> String {
        let digits = if value.is_nan() {
            "nan".to_string()
        } else if value.is_infinite() {
            "inf".to_string()
        } else {
            format!("{:.*}", self.precision.unwrap_or(6), value.abs())
        };
        self.signed(value.is_sign_negative() && !value.is_nan(), digits)
    }

    fn signed(&self, negative: bool, digits: String) -> String {
        let sign = if negative { Some('-') } else { self.sign };
        let body = match sign {
            Some(sign) => format!("{}{}", sign, digits),
            None => digits,
        };
        self.pad(body, true)
    }

    fn pad(&self, body: String, numeric: bool) -> String {
        let len = body.chars().count();
        let fill = match self.width {
            Some(width) if width > len => width - len,
            _ => return body,
        };
        if self.left_align {
            body + &" ".repeat(fill)
        } else if self.zero_pad && numeric {
            let split = usize::from(body.starts_with(|c: char| matches!(c, '-' | '+' | ' ')));
            let (sign, digits) = body.split_at(split);
            format!("{}{}{}", sign, "0".repeat(fill), digits)
        } else {
            " ".repeat(fill) + &body
        }
    }
}

fn digits<I>(chars: &mut Peekable<I>) -> Option<usize>
where
    I: Iterator<Item = char>,
{
    let mut value: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    value
}

/// Replace `{}` and `{N}` placeholders with positional arguments.
///
/// `{{` and `}}` escape literal braces.
pub fn brace_format(template: &str, args: &[LogArg]) -> Result<String, InterpolationError> {
    let mut out = String::with_capacity(template.len());
    let mut next_auto = 0usize;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut placeholder = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => placeholder.push(ch),
                        None => return Err(InterpolationError::UnmatchedBrace),
                    }
                }
                let index = if placeholder.is_empty() {
                    next_auto += 1;
                    next_auto - 1
                } else {
                    placeholder.parse::<usize>()
                        .map_err(|_| InterpolationError::UnmatchedBrace)?
                };
                let arg = args
                    .get(index)
                    .ok_or(InterpolationError::IndexOutOfRange(index))?;
                out.push_str(&arg.to_string());
            }
            '}' => return Err(InterpolationError::UnmatchedBrace),
            other => out.push(other),
        }
    }
    Ok(out)
}

// Quotes strings the way Python's `repr` does: single quotes unless the
// text contains a single quote and no double quote.
fn repr(arg: &LogArg) -> String {
    let text = match arg {
        LogArg::Str(s) => s,
        other => return other.to_string(),
    };
    let quote = if text.contains('\'') && !text.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn as_integer(arg: &LogArg, conversion: char) -> Result<i64, InterpolationError> {
    match arg {
        LogArg::Int(i) => Ok(*i),
        LogArg::Float(x) => Ok(x.trunc() as i64),
        LogArg::Bool(b) => Ok(i64::from(*b)),
        LogArg::Str(_) => Err(InterpolationError::TypeMismatch { conversion, found: "str" }),
    }
}

fn as_float(arg: &LogArg, conversion: char) -> Result<f64, InterpolationError> {
    match arg {
        LogArg::Int(i) => Ok(*i as f64),
        LogArg::Float(x) => Ok(*x),
        LogArg::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        LogArg::Str(_) => Err(InterpolationError::TypeMismatch { conversion, found: "str" }),
    }
}
