mod meter_data;
mod tariff;

use crate::meter_data::{ReadingEntry, ReadingPair};
use crate::tariff::{Slab, Tariff};
use bigdecimal::BigDecimal;
use clap::{Args, Parser};
use csv::StringRecord;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::LazyLock;

/// Municipal water tax calculator.
/// Given the previous and current readings of your water meter, or a
/// reading-history CSV exported from the citizen portal, calculates the
/// water tax owed under the slab tariff and shows the per-slab breakdown.
#[derive(Parser, Debug)]
#[command(version, long_about)]
struct WaterTax {
    #[command(flatten)]
    input: ReadingInput,
    /// Override the built-in municipal tariff. Repeat once per slab as
    /// BOUND=RATE, where BOUND is the slab's cumulative upper bound in units
    /// and RATE is rupees per unit; the final slab must be `rest=RATE`.
    /// Example: --slab 100=8 --slab 300=12 --slab 500=18 --slab rest=25
    #[arg(long, value_name = "BOUND=RATE", long_help)]
    slab: Vec<Slab>,
}

#[derive(Args, Debug)]
#[group(required = true)]
struct ReadingInput {
    /// Reading-history CSV exported from the citizen portal.
    /// It's under "My Connections" > "Download Reading History".
    #[arg(long, value_name = "FILE", long_help, conflicts_with_all = ["previous", "current"])]
    readings_csv: Option<PathBuf>,
    /// Previous meter reading, in units.
    #[arg(short, long, requires = "current")]
    previous: Option<u64>,
    /// Current meter reading, in units.
    #[arg(short, long, requires = "previous")]
    current: Option<u64>,
}

fn main() -> ExitCode {
    let args = WaterTax::parse();

    let tariff = if args.slab.is_empty() {
        Tariff::municipal()
    } else {
        match Tariff::new(args.slab) {
            Ok(tariff) => tariff,
            Err(err) => {
                eprintln!("Invalid tariff: {err}");
                return ExitCode::FAILURE;
            }
        }
    };

    if let Some(csv_path) = &args.input.readings_csv {
        bill_export(&tariff, csv_path)
    } else {
        let pair = ReadingPair {
            previous: args.input.previous.expect("previous reading is required"),
            current: args.input.current.expect("current reading is required"),
        };
        bill_single(&tariff, pair)
    }
}

fn bill_single(tariff: &Tariff, pair: ReadingPair) -> ExitCode {
    let consumption = match pair.consumption() {
        Ok(consumption) => consumption,
        Err(err) => {
            eprintln!("Invalid readings: {err}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!("Consumption: {consumption} units");
    for charge in tariff.charges(consumption) {
        eprintln!(
            "  {} units: {} x ₹{}/unit = ₹{:.2}",
            charge.range(),
            charge.units,
            charge.rate,
            charge.amount
        );
    }
    eprintln!("Total water tax: ₹{:.2}", tariff.tax(consumption));
    ExitCode::SUCCESS
}

fn bill_export(tariff: &Tariff, csv_path: &Path) -> ExitCode {
    let entries = read_reading_export(csv_path);
    eprintln!("Found {} reading entries", entries.len());
    let mut total = BigDecimal::from(0);
    let mut skipped = 0usize;
    for entry in &entries {
        match entry.readings.consumption() {
            Ok(consumption) => {
                let tax = tariff.tax(consumption);
                eprintln!(
                    "{} {}: {} units -> ₹{:.2}",
                    entry.connection, entry.date, consumption, tax
                );
                total += tax;
            }
            Err(err) => {
                eprintln!("{} {}: skipped: {}", entry.connection, entry.date, err);
                skipped += 1;
            }
        }
    }
    eprintln!("Total water tax: ₹{total:.2}");
    if skipped > 0 {
        eprintln!("{skipped} entries had invalid readings and were not billed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

static EXPECTED_HEADERS: LazyLock<StringRecord> = LazyLock::new(|| {
    StringRecord::from(vec![
        "CONNECTION NO",
        "BILLING DATE",
        "PREVIOUS READING",
        "CURRENT READING",
    ])
});

fn read_reading_export(csv_path: &Path) -> Vec<ReadingEntry> {
    // The portal prepends title and account-summary rows to the export, so
    // scan forward to the header row before handing off to the CSV reader.
    let mut reader = BufReader::new(File::open(csv_path).expect("Readings file not found"));
    let mut line_buf = String::new();
    loop {
        line_buf.clear();
        if reader
            .read_line(&mut line_buf)
            .expect("Failed to read line")
            == 0
        {
            panic!("Readings file is empty or malformed");
        }
        if line_buf.starts_with("CONNECTION NO,") {
            break;
        }
    }
    let reader_with_headers = Cursor::new(line_buf).chain(reader);
    parse_reading_export(reader_with_headers)
}

fn parse_reading_export(reader: impl Read) -> Vec<ReadingEntry> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers().expect("CSV headers not found").clone();
    if headers != *EXPECTED_HEADERS {
        panic!(
            "Unexpected headers in readings CSV: {:?}. Expected: {:?}",
            headers, *EXPECTED_HEADERS
        );
    }
    csv_reader
        .into_records()
        .map(|r| {
            let record = r.expect("Readings file could not be deserialized");
            ReadingEntry {
                connection: record[0].to_string(),
                date: record[1].parse().expect("Invalid billing date format"),
                readings: ReadingPair {
                    previous: record[2].parse().expect("Invalid previous reading"),
                    current: record[3].parse().expect("Invalid current reading"),
                },
            }
        })
        .collect()
}
