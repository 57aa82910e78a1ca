//! MBP-10 CSV output.
//!
//! Writes snapshot rows in the fixed 76-column layout downstream tooling
//! expects: a zero-based row index, duplicated receive/event timestamps,
//! constant rtype/publisher/instrument columns, the attributed action and
//! side, the triggering event's pass-through fields, ten interleaved
//! bid/ask level triples, and the trailing symbol/order_id pair.
//!
//! Formatting rules: prices render as fixed two-decimal dollars with zero
//! rendering as the empty string; sizes and counts render as plain
//! decimal; timestamps render as RFC-3339 with nine fractional digits,
//! UTC.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::DateTime;

use crate::error::Result;
use crate::pipeline::SnapshotSink;
use crate::snapshot::{MbpSnapshot, DEPTH};
use crate::types::price_to_f64;

/// Output record type identifier for MBP-10 rows.
const RTYPE: u32 = 10;
/// Publisher identifier carried on every row.
const PUBLISHER_ID: u32 = 2;
/// Instrument identifier carried on every row.
const INSTRUMENT_ID: u32 = 1108;
/// Instrument symbol carried on every row.
const SYMBOL: &str = "ARL";

/// The fixed output header.
pub const MBP_HEADER: &str = concat!(
    ",ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,depth,price,size,flags,ts_in_delta,sequence,",
    "bid_px_00,bid_sz_00,bid_ct_00,ask_px_00,ask_sz_00,ask_ct_00,",
    "bid_px_01,bid_sz_01,bid_ct_01,ask_px_01,ask_sz_01,ask_ct_01,",
    "bid_px_02,bid_sz_02,bid_ct_02,ask_px_02,ask_sz_02,ask_ct_02,",
    "bid_px_03,bid_sz_03,bid_ct_03,ask_px_03,ask_sz_03,ask_ct_03,",
    "bid_px_04,bid_sz_04,bid_ct_04,ask_px_04,ask_sz_04,ask_ct_04,",
    "bid_px_05,bid_sz_05,bid_ct_05,ask_px_05,ask_sz_05,ask_ct_05,",
    "bid_px_06,bid_sz_06,bid_ct_06,ask_px_06,ask_sz_06,ask_ct_06,",
    "bid_px_07,bid_sz_07,bid_ct_07,ask_px_07,ask_sz_07,ask_ct_07,",
    "bid_px_08,bid_sz_08,bid_ct_08,ask_px_08,ask_sz_08,ask_ct_08,",
    "bid_px_09,bid_sz_09,bid_ct_09,ask_px_09,ask_sz_09,ask_ct_09,",
    "symbol,order_id"
);

/// Buffered MBP-10 CSV writer.
///
/// The header is written on construction; each snapshot becomes one row
/// stamped with a zero-based running index.
pub struct MbpCsvWriter<W: Write> {
    out: BufWriter<W>,
    rows_written: u64,
}

impl MbpCsvWriter<File> {
    /// Create (truncate) the output file and write the header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_writer(File::create(path)?)
    }
}

impl<W: Write> MbpCsvWriter<W> {
    /// Wrap a writer and emit the header.
    pub fn from_writer(inner: W) -> Result<Self> {
        let mut out = BufWriter::new(inner);
        out.write_all(MBP_HEADER.as_bytes())?;
        out.write_all(b"\n")?;
        Ok(Self {
            out,
            rows_written: 0,
        })
    }

    /// Append one snapshot row.
    pub fn write_row(&mut self, snapshot: &MbpSnapshot) -> Result<()> {
        let ts = format_timestamp(snapshot.ts_event);

        let mut row = String::with_capacity(512);
        row.push_str(&format!(
            "{},{ts},{ts},{RTYPE},{PUBLISHER_ID},{INSTRUMENT_ID},{},{},0,{},{},{},{},{}",
            self.rows_written,
            snapshot.action.to_byte() as char,
            snapshot.side.to_byte() as char,
            format_price(snapshot.price),
            snapshot.size,
            snapshot.flags,
            snapshot.ts_in_delta,
            snapshot.sequence,
        ));

        for i in 0..DEPTH {
            let bid = snapshot.levels.bids[i];
            let ask = snapshot.levels.asks[i];
            row.push_str(&format!(
                ",{},{},{},{},{},{}",
                format_price(bid.price),
                bid.size,
                bid.count,
                format_price(ask.price),
                ask.size,
                ask.count,
            ));
        }

        row.push_str(&format!(",{SYMBOL},0\n"));
        self.out.write_all(row.as_bytes())?;
        self.rows_written += 1;
        Ok(())
    }

    /// Rows written so far (excluding the header).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush buffered rows to the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        self.out
            .into_inner()
            .map_err(|e| crate::error::ReconError::Io(e.into_error()))
    }
}

impl<W: Write> SnapshotSink for MbpCsvWriter<W> {
    fn write_snapshot(&mut self, snapshot: &MbpSnapshot) -> Result<()> {
        self.write_row(snapshot)
    }
}

/// Render nanoseconds since epoch as `YYYY-MM-DDTHH:MM:SS.nnnnnnnnnZ`.
fn format_timestamp(ts_event: i64) -> String {
    let dt = DateTime::from_timestamp_nanos(ts_event);
    format!("{}Z", dt.format("%Y-%m-%dT%H:%M:%S%.9f"))
}

/// Fixed two-decimal dollars; a zero price renders empty.
fn format_price(price: i64) -> String {
    if price == 0 {
        String::new()
    } else {
        format!("{:.2}", price_to_f64(price))
    }
}
