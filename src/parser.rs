//! MBO CSV input parsing.
//!
//! Streams the upstream MBO export (one event per row) into [`MboEvent`]s.
//! Rows that fail field parsing never reach the book: they are counted,
//! warned about, and dropped, matching the feed's occasional truncated
//! tail line. Empty numeric fields default to zero, the way the venue
//! export leaves optional columns blank.
//!
//! Column order:
//! `ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,price,
//! size,channel_id,order_id,flags,ts_in_delta,sequence[,symbol]` — only
//! the fields the book consumes are read, the rest are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::DateTime;
use serde::Serialize;

use crate::error::{ReconError, Result};
use crate::types::{price_from_decimal, Action, MboEvent, Side};
use crate::warnings::{WarningKind, WarningTracker};

/// I/O buffer size for file reading.
///
/// The default `BufReader` capacity is 8KB; a larger buffer reduces
/// syscall overhead on multi-hundred-megabyte day files.
pub const IO_BUFFER_SIZE: usize = 1024 * 1024; // 1 MB

/// Column positions in the MBO export.
const COL_TS_EVENT: usize = 1;
const COL_ACTION: usize = 5;
const COL_SIDE: usize = 6;
const COL_PRICE: usize = 7;
const COL_SIZE: usize = 8;
const COL_ORDER_ID: usize = 10;
const COL_FLAGS: usize = 11;
const COL_TS_IN_DELTA: usize = 12;
const COL_SEQUENCE: usize = 13;
const MIN_COLUMNS: usize = 14;

/// Statistics for a parse run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParserStats {
    /// Data rows seen (header excluded)
    pub rows_read: u64,

    /// Rows dropped because a field failed to parse
    pub rows_skipped: u64,
}

/// Parse an entire MBO CSV file into events, in source order.
///
/// The first line is the header and is skipped. Malformed rows and rows
/// with unknown action bytes are recorded on `warnings` and dropped.
pub fn parse_file<P: AsRef<Path>>(
    path: P,
    warnings: &mut WarningTracker,
) -> Result<(Vec<MboEvent>, ParserStats)> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(IO_BUFFER_SIZE, file);

    // ~100 bytes per row is a good estimate for this export
    let estimated_rows = (std::fs::metadata(path).map(|m| m.len()).unwrap_or(0) / 100) as usize;
    let mut events = Vec::with_capacity(estimated_rows);
    let mut stats = ParserStats::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        // Line 0 is the header
        if line_no == 0 || line.is_empty() {
            continue;
        }

        stats.rows_read += 1;
        match parse_line(&line, line_no + 1) {
            Ok(event) => events.push(event),
            Err(err) => {
                let kind = match err {
                    ReconError::InvalidAction(_) => WarningKind::UnknownAction,
                    _ => WarningKind::MalformedRow,
                };
                warnings.record(kind, err.to_string());
                stats.rows_skipped += 1;
            }
        }
    }

    Ok((events, stats))
}

/// Parse a single data row.
pub fn parse_line(line: &str, line_no: usize) -> Result<MboEvent> {
    let cols: Vec<&str> = line.split(',').collect();
    if cols.len() < MIN_COLUMNS {
        return Err(ReconError::malformed(
            line_no,
            format!("expected {MIN_COLUMNS}+ columns, got {}", cols.len()),
        ));
    }

    let action_char = cols[COL_ACTION].chars().next().unwrap_or('\0');
    let action = Action::from_byte(action_char as u8).ok_or(ReconError::InvalidAction(action_char))?;

    let side_char = cols[COL_SIDE].chars().next().unwrap_or('\0');
    let side = Side::from_byte(side_char as u8).ok_or(ReconError::InvalidSide(side_char))?;

    Ok(MboEvent {
        ts_event: parse_timestamp(cols[COL_TS_EVENT], line_no)?,
        action,
        side,
        price: parse_price(cols[COL_PRICE], line_no)?,
        size: parse_u64(cols[COL_SIZE], line_no, "size")?,
        order_id: parse_u64(cols[COL_ORDER_ID], line_no, "order_id")?,
        flags: parse_u64(cols[COL_FLAGS], line_no, "flags")? as u8,
        ts_in_delta: parse_i32(cols[COL_TS_IN_DELTA], line_no)?,
        sequence: parse_u64(cols[COL_SEQUENCE], line_no, "sequence")?,
    })
}

/// RFC-3339 nanosecond timestamp → nanoseconds since epoch.
fn parse_timestamp(field: &str, line_no: usize) -> Result<i64> {
    if field.is_empty() {
        return Ok(0);
    }
    let dt = DateTime::parse_from_rfc3339(field)
        .map_err(|e| ReconError::malformed(line_no, format!("timestamp {field:?}: {e}")))?;
    dt.timestamp_nanos_opt()
        .ok_or_else(|| ReconError::InvalidTimestamp(field.to_string()))
}

/// Two-decimal price field → fixed-point units; empty means no price.
fn parse_price(field: &str, line_no: usize) -> Result<i64> {
    if field.is_empty() {
        return Ok(0);
    }
    let dollars: f64 = field
        .parse()
        .map_err(|e| ReconError::malformed(line_no, format!("price {field:?}: {e}")))?;
    Ok(price_from_decimal(dollars))
}

fn parse_u64(field: &str, line_no: usize, name: &str) -> Result<u64> {
    if field.is_empty() {
        return Ok(0);
    }
    field
        .parse()
        .map_err(|e| ReconError::malformed(line_no, format!("{name} {field:?}: {e}")))
}

fn parse_i32(field: &str, line_no: usize) -> Result<i32> {
    if field.is_empty() {
        return Ok(0);
    }
    field
        .parse()
        .map_err(|e| ReconError::malformed(line_no, format!("ts_in_delta {field:?}: {e}")))
}
