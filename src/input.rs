//! Position file decoder.
//!
//! One position per LF-terminated line, two tab-separated finite decimal
//! fields, no header. Empty lines (such as a trailing one) are ignored.

use crate::geometry::Point2D;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    /// A malformed line; `line` and `column` are 1-based.
    Parse {
        line: usize,
        column: usize,
        reason: String,
    },
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse {
                line,
                column,
                reason,
            } => write!(f, "line {line}, column {column}: {reason}"),
            Error::Io(_) => write!(f, "read error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn parse_field(field: &str, line: usize, column: usize) -> Result<f64> {
    let value: f64 = field.parse().map_err(|_| Error::Parse {
        line,
        column,
        reason: format!("invalid decimal field {field:?}"),
    })?;
    if !value.is_finite() {
        return Err(Error::Parse {
            line,
            column,
            reason: format!("field {field:?} is not finite"),
        });
    }
    Ok(value)
}

/// Decode a position stream.
///
/// On the first malformed line the whole load is discarded and the error
/// carries the line and column of the offending field.
///
/// Wrapping `r` in a [`std::io::BufReader`] is recommended.
pub fn read<R>(r: R) -> Result<Vec<Point2D>>
where
    R: io::BufRead,
{
    let mut positions = Vec::new();

    for (text, line) in r.lines().zip(1..) {
        let text = text?;
        if text.is_empty() {
            continue;
        }

        let (x_field, y_field) = text.split_once('\t').ok_or_else(|| Error::Parse {
            line,
            column: text.len() + 1,
            reason: "expected two tab-separated fields".to_owned(),
        })?;
        if y_field.contains('\t') {
            return Err(Error::Parse {
                line,
                column: x_field.len() + y_field.len() + 2,
                reason: "expected exactly two fields".to_owned(),
            });
        }

        let x = parse_field(x_field, line, 1)?;
        let y = parse_field(y_field, line, x_field.len() + 2)?;
        positions.push(Point2D::new(x, y));
    }

    Ok(positions)
}
