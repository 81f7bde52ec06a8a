//! # Tag Table Loader
//!
//! Reads the tab-separated tag export produced by the PLC programming tool.
//!
//! | Column | Field | Type |
//! |--------|-------|------|
//! | 1 | name | text |
//! | 2 | register kind | `Coil`, `DiscreteInput`, `HoldingRegister`, `InputRegister`, ... |
//! | 3 | address (1-based) | u16 |
//! | 4 | extended address | u32 |
//! | 5 | register count | u16 |
//! | 6 | address range | text |
//!
//! Fields follow CSV quoting with a tab delimiter: a quoted field loses its
//! quotes (`""` inside it is a literal quote), while a quote inside an
//! unquoted field or text after a closing quote is an error. Every field is
//! trimmed. Rows whose numeric columns do not parse are skipped, which is how
//! header rows drop out. A row with a different number of fields than the
//! first row is an error.

use std::io::{BufRead, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::error::{CrossCheckError, CrossCheckResult};
use crate::tag::{RegisterKind, TagDescriptor};

/// Columns every row must carry.
pub const TAG_FILE_COLUMNS: usize = 6;

/// Parse tag rows from any buffered reader.
///
/// # Example
///
/// ```rust
/// use voltage_crosscheck::tag_file::parse_tags;
///
/// let tsv = "Name\tType\tAddress\tModbusAddress\tSize\tRange\n\
///            \"Tank Level\"\tHoldingRegister\t1\t40001\t2\t1..2\n";
/// let tags = parse_tags(tsv.as_bytes()).unwrap();
/// assert_eq!(tags.len(), 1);
/// assert_eq!(tags[0].name, "Tank Level");
/// assert_eq!(tags[0].register_count, 2);
/// ```
pub fn parse_tags<R: BufRead>(mut reader: R) -> CrossCheckResult<Vec<TagDescriptor>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    let mut rows = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut tags = Vec::new();
    let mut expected_fields: Option<usize> = None;
    let mut record = StringRecord::new();

    loop {
        let start = rows.position().byte() as usize;
        if !rows.read_record(&mut record)? {
            break;
        }
        let end = rows.position().byte() as usize;
        let line_no = record.position().map_or(0, |p| p.line() as usize);

        // The reader keeps stray quotes as data
        check_quotes(text.get(start..end).unwrap_or_default())
            .map_err(|message| CrossCheckError::tag_file(line_no, message))?;

        let expected = *expected_fields.get_or_insert(record.len());
        if record.len() != expected || record.len() < TAG_FILE_COLUMNS {
            return Err(CrossCheckError::tag_file(
                line_no,
                format!(
                    "wrong number of fields: expected {}, got {}",
                    expected.max(TAG_FILE_COLUMNS),
                    record.len()
                ),
            ));
        }

        let fields: Vec<&str> = record.iter().collect();
        match parse_row(&fields) {
            Some(tag) if tag.register_count == 0 => {
                warn!("Line {}: tag {} has zero register count, skipped", line_no, tag.name);
            }
            Some(tag) => tags.push(tag),
            None => debug!("Line {}: non-numeric address columns, skipped", line_no),
        }
    }

    debug!("Loaded {} tags", tags.len());
    Ok(tags)
}

/// Load tags from a TSV file.
pub fn load_tags<P: AsRef<Path>>(path: P) -> CrossCheckResult<Vec<TagDescriptor>> {
    let file = std::fs::File::open(path.as_ref())?;
    parse_tags(std::io::BufReader::new(file))
}

/// Quote rules of a strict CSV reader over one raw record.
fn check_quotes(raw: &str) -> Result<(), &'static str> {
    #[derive(Clone, Copy)]
    enum State {
        FieldStart,
        Unquoted,
        Quoted,
        QuoteInQuoted,
    }

    let mut state = State::FieldStart;
    for c in raw.chars() {
        state = match (state, c) {
            (State::Quoted, '"') => State::QuoteInQuoted,
            (State::Quoted, _) => State::Quoted,
            // Doubled quote
            (State::QuoteInQuoted, '"') => State::Quoted,
            (_, '\t' | '\r' | '\n') => State::FieldStart,
            (State::QuoteInQuoted, _) => return Err("extraneous \" after quoted field"),
            (State::FieldStart, '"') => State::Quoted,
            (State::Unquoted, '"') => return Err("bare \" in non-quoted field"),
            (State::FieldStart | State::Unquoted, _) => State::Unquoted,
        };
    }

    match state {
        State::Quoted => Err("missing closing \" in quoted field"),
        _ => Ok(()),
    }
}

fn parse_row(fields: &[&str]) -> Option<TagDescriptor> {
    let address = fields[2].trim().parse::<u16>().ok()?;
    let extended_address = fields[3].trim().parse::<u32>().ok()?;
    let register_count = fields[4].trim().parse::<u16>().ok()?;

    let register_kind = match fields[1].parse::<RegisterKind>() {
        Ok(kind) => kind,
        Err(never) => match never {},
    };

    Some(TagDescriptor {
        name: fields[0].trim().to_string(),
        register_kind,
        address,
        extended_address,
        register_count,
        address_range: fields[5].trim().to_string(),
    })
}
