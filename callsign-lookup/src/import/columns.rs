//! Roster header resolution
//!
//! The roster export has no fixed column order. The first row names the
//! columns; [`ColumnMap`] records where each recognized header sits so rows
//! can be read by field instead of by position.

use std::collections::HashMap;
use std::fmt;

/// Recognized roster columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Call,
    LastName,
    Name,
    Street,
    City,
    State,
    Zip,
    /// Recognized but not stored
    HomePhone,
    League,
    HomeRepeater,
    DateJoined,
    MemberType,
    Status,
    QuarterExpiring,
    YearExpiring,
    /// Recognized but not stored
    Email,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::Call,
        Field::LastName,
        Field::Name,
        Field::Street,
        Field::City,
        Field::State,
        Field::Zip,
        Field::HomePhone,
        Field::League,
        Field::HomeRepeater,
        Field::DateJoined,
        Field::MemberType,
        Field::Status,
        Field::QuarterExpiring,
        Field::YearExpiring,
        Field::Email,
    ];

    /// Header token as it appears in the roster export
    pub fn header(self) -> &'static str {
        match self {
            Field::Call => "CALL",
            Field::LastName => "LASTNAME",
            Field::Name => "NAME",
            Field::Street => "STREET",
            Field::City => "CITY",
            Field::State => "STATE",
            Field::Zip => "ZIP",
            Field::HomePhone => "HOMEPHONE",
            Field::League => "LEAGUE",
            Field::HomeRepeater => "HOMERPT",
            Field::DateJoined => "DATEJOIN",
            Field::MemberType => "MEMTYPE",
            Field::Status => "STATUS",
            Field::QuarterExpiring => "QTREXP",
            Field::YearExpiring => "YEAREXP",
            Field::Email => "EMAIL",
        }
    }

    /// Match a header cell (surrounding whitespace and case ignored)
    pub fn from_header(cell: &str) -> Option<Field> {
        let token = cell.trim().to_ascii_uppercase();
        Field::ALL.iter().copied().find(|f| f.header() == token)
    }

    /// Human-readable name used in row diagnostics
    pub fn label(self) -> &'static str {
        match self {
            Field::Call => "Callsign",
            Field::LastName => "Last Name",
            Field::Name => "Name",
            Field::Street => "Street",
            Field::City => "City",
            Field::State => "State",
            Field::Zip => "Zip",
            Field::HomePhone => "Home Phone",
            Field::League => "League",
            Field::HomeRepeater => "Home Repeater",
            Field::DateJoined => "Date Joined",
            Field::MemberType => "Member Type",
            Field::Status => "Status",
            Field::QuarterExpiring => "Quarter Expiring",
            Field::YearExpiring => "Year Expiring",
            Field::Email => "Email",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Column offsets for one upload, built from its header row
///
/// Unrecognized headers are ignored. A recognized header missing from the
/// file simply has no offset. When a header repeats, the first column wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    offsets: HashMap<Field, usize>,
}

impl ColumnMap {
    pub fn from_header<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut offsets = HashMap::new();
        for (index, cell) in header.into_iter().enumerate() {
            if let Some(field) = Field::from_header(cell.as_ref()) {
                offsets.entry(field).or_insert(index);
            }
        }
        Self { offsets }
    }

    /// Zero-based column offset of `field`, if the header named it
    pub fn offset(&self, field: Field) -> Option<usize> {
        self.offsets.get(&field).copied()
    }

    pub fn is_mapped(&self, field: Field) -> bool {
        self.offsets.contains_key(&field)
    }

    /// Recognized fields the header did not name, in declaration order
    pub fn unmapped(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| !self.is_mapped(*f))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_recognized_headers_in_any_order() {
        let columns = ColumnMap::from_header(["ZIP", "NOTES", "CALL", "QTREXP"]);

        assert_eq!(columns.offset(Field::Zip), Some(0));
        assert_eq!(columns.offset(Field::Call), Some(2));
        assert_eq!(columns.offset(Field::QuarterExpiring), Some(3));
        assert_eq!(columns.offset(Field::Name), None);
        assert_eq!(columns.len(), 3);
    }

    #[test]
    fn test_header_matching_ignores_case_and_padding() {
        let columns = ColumnMap::from_header([" call ", "YearExp"]);
        assert_eq!(columns.offset(Field::Call), Some(0));
        assert_eq!(columns.offset(Field::YearExpiring), Some(1));
    }

    #[test]
    fn test_first_duplicate_header_wins() {
        let columns = ColumnMap::from_header(["CALL", "NAME", "CALL"]);
        assert_eq!(columns.offset(Field::Call), Some(0));
    }

    #[test]
    fn test_unmapped_lists_missing_fields() {
        let columns = ColumnMap::from_header(["CALL", "NAME"]);
        let unmapped = columns.unmapped();

        assert_eq!(unmapped.len(), Field::ALL.len() - 2);
        assert!(!unmapped.contains(&Field::Call));
        assert!(unmapped.contains(&Field::Email));
    }

    #[test]
    fn test_no_recognized_headers() {
        let columns = ColumnMap::from_header(["foo", "bar"]);
        assert!(columns.is_empty());
        assert!(!columns.is_mapped(Field::Call));
    }

    #[test]
    fn test_every_header_token_round_trips() {
        for field in Field::ALL {
            assert_eq!(Field::from_header(field.header()), Some(field));
        }
    }
}
