//! Row normalization
//!
//! Turns one roster data row into a [`Member`]. Text fields are trimmed,
//! the callsign is uppercased, and the two expiration columns are parsed as
//! integers. A bad expiration value is a diagnostic, not a failure: the row
//! still imports with 0 in that field. Cells that are not valid UTF-8
//! (Latin-1 spreadsheet exports) are decoded lossily and also reported. A
//! row without a usable callsign, or one too short to reach a mapped column,
//! is rejected outright.

use callsign_common::{normalize_callsign, Member};
use csv::ByteRecord;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

use super::columns::{ColumnMap, Field};

/// A successfully normalized row plus any non-fatal diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub member: Member,
    pub diagnostics: Vec<RowDiagnostic>,
}

/// Non-fatal problem found while normalizing a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDiagnostic {
    /// Expiration column did not parse as an integer; stored as 0
    NotANumber {
        callsign: String,
        field: Field,
        raw: String,
    },
    /// Cell was not valid UTF-8; invalid bytes became U+FFFD
    InvalidText { callsign: String, field: Field },
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowDiagnostic::NotANumber {
                callsign,
                field,
                raw,
            } => write!(
                f,
                "Cannot parse {}'s {} as a number: {:?}",
                callsign,
                field.label(),
                raw
            ),
            RowDiagnostic::InvalidText { callsign, field } => write!(
                f,
                "{}'s {} is not valid UTF-8; unreadable characters replaced",
                callsign,
                field.label()
            ),
        }
    }
}

/// Row cannot be imported
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// Header has no CALL column, so no row has a primary key
    #[error("line {line}: no CALL column in header")]
    UnmappedCallsign { line: u64 },

    /// CALL column present but blank
    #[error("line {line}: empty callsign")]
    MissingCallsign { line: u64 },

    /// Row ends before a mapped column
    #[error("line {line}: {field} is column {} but the row has only {len} fields", .offset + 1)]
    ShortRow {
        line: u64,
        field: Field,
        offset: usize,
        len: usize,
    },
}

/// Normalize one data row against the upload's column map
pub fn parse_row(columns: &ColumnMap, record: &ByteRecord) -> Result<ParsedRow, RowError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let row = RowReader {
        columns,
        record,
        line,
    };

    if !columns.is_mapped(Field::Call) {
        return Err(RowError::UnmappedCallsign { line });
    }
    let callsign = normalize_callsign(&row.raw(Field::Call)?);
    if callsign.is_empty() {
        return Err(RowError::MissingCallsign { line });
    }

    let mut diagnostics: Vec<RowDiagnostic> = row
        .undecodable_fields()
        .map(|field| RowDiagnostic::InvalidText {
            callsign: callsign.clone(),
            field,
        })
        .collect();
    let quarter_expiring = row.integer(Field::QuarterExpiring, &callsign, &mut diagnostics)?;
    let year_expiring = row.integer(Field::YearExpiring, &callsign, &mut diagnostics)?;

    let member = Member {
        last_name: row.text(Field::LastName)?,
        name: row.text(Field::Name)?,
        street: row.text(Field::Street)?,
        city: row.text(Field::City)?,
        state: row.text(Field::State)?,
        zip: row.text(Field::Zip)?,
        league: row.text(Field::League)?,
        home_repeater: row.text(Field::HomeRepeater)?,
        date_joined: row.text(Field::DateJoined)?,
        member_type: row.text(Field::MemberType)?,
        status: row.text(Field::Status)?,
        quarter_expiring,
        year_expiring,
        callsign,
    };

    Ok(ParsedRow {
        member,
        diagnostics,
    })
}

struct RowReader<'a> {
    columns: &'a ColumnMap,
    record: &'a ByteRecord,
    line: u64,
}

impl<'a> RowReader<'a> {
    /// Raw cell for `field`; unmapped fields read as empty
    fn raw(&self, field: Field) -> Result<Cow<'a, str>, RowError> {
        let Some(offset) = self.columns.offset(field) else {
            return Ok(Cow::Borrowed(""));
        };
        self.record
            .get(offset)
            .map(String::from_utf8_lossy)
            .ok_or(RowError::ShortRow {
                line: self.line,
                field,
                offset,
                len: self.record.len(),
            })
    }

    /// Mapped fields present in this row whose bytes are not UTF-8
    fn undecodable_fields(&self) -> impl Iterator<Item = Field> + '_ {
        Field::ALL.into_iter().filter(move |field| {
            self.columns
                .offset(*field)
                .and_then(|offset| self.record.get(offset))
                .is_some_and(|bytes| std::str::from_utf8(bytes).is_err())
        })
    }

    fn text(&self, field: Field) -> Result<String, RowError> {
        Ok(self.raw(field)?.trim().to_string())
    }

    /// Integer cell; unmapped reads as 0 silently, unparseable as 0 with a diagnostic
    fn integer(
        &self,
        field: Field,
        callsign: &str,
        diagnostics: &mut Vec<RowDiagnostic>,
    ) -> Result<i64, RowError> {
        if !self.columns.is_mapped(field) {
            return Ok(0);
        }
        let raw = self.raw(field)?;
        match raw.trim().parse::<i64>() {
            Ok(value) => Ok(value),
            Err(_) => {
                diagnostics.push(RowDiagnostic::NotANumber {
                    callsign: callsign.to_string(),
                    field,
                    raw: raw.to_string(),
                });
                Ok(0)
            }
        }
    }
}
