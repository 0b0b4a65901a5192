use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use clap::Parser;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Write a synthetic opportunity table for trying out the dashboard
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
struct Args {
    /// Output file; `.parquet` writes Parquet, anything else writes CSV
    #[arg(default_value = "sample_opportunities.csv")]
    output: PathBuf,

    /// Number of opportunities
    #[arg(long, default_value_t = 500)]
    rows: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }

    /// Pick from `(value, weight)` pairs.
    fn weighted<'a>(&mut self, items: &[(&'a str, f64)]) -> &'a str {
        let total: f64 = items.iter().map(|(_, w)| w).sum();
        let mut target = self.next_f64() * total;
        for (value, weight) in items {
            if target < *weight {
                return value;
            }
            target -= weight;
        }
        items[items.len() - 1].0
    }
}

const ACCOUNTS: &[&str] = &[
    "Acme Biotech", "Globex Pharma", "Initech Labs", "Umbrella Research", "Hooli Health",
    "Stark Therapeutics", "Wayne Bioscience", "Tyrell Genomics", "Cyberdyne Diagnostics",
    "Soylent Foods", "Vandelay Industries", "Wonka Nutrition", "Oscorp Chemicals",
    "Aperture Science", "Massive Dynamic", "Gringotts Capital", "Monarch Clinical",
    "Nakatomi Trading", "Prestige Worldwide", "Dunder Mifflin",
];

const OWNERS: &[&str] = &[
    "Alice Moreau", "Bruno Costa", "Chen Wei", "Dana Okafor", "Elif Yilmaz", "Farah Haddad",
    "Gustavo Lima", "Hana Sato", "Ivan Petrov", "Julia Santos", "Kofi Mensah", "Lena Fischer",
];

const STAGES: &[(&str, f64)] = &[
    ("Closed Won", 0.30),
    ("Closed Lost", 0.25),
    ("Negotiate", 0.15),
    ("Cancelled", 0.08),
    ("Proposal", 0.12),
    ("Qualification", 0.10),
];

const TYPES: &[&str] = &["New Business", "Renewal", "Upsell", "Cross-sell"];

/// One generated opportunity, serialized with the dashboard's column headers.
#[derive(Debug, Serialize)]
struct Row {
    #[serde(rename = "Account")]
    account: String,
    #[serde(rename = "Opportunity Owner")]
    owner: String,
    #[serde(rename = "Stage")]
    stage: String,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Amount")]
    amount: f64,
    #[serde(rename = "Created Date")]
    created: Option<NaiveDate>,
    #[serde(rename = "Close Date")]
    close: Option<NaiveDate>,
}

fn generate(rows: usize, rng: &mut SimpleRng) -> Vec<Row> {
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid start date");

    (0..rows)
        .map(|_| {
            let stage = rng.weighted(STAGES);
            let created = start + Duration::days(rng.below(3 * 365) as i64);
            let closed = matches!(stage, "Closed Won" | "Closed Lost" | "Cancelled");
            let close = closed.then(|| created + Duration::days(7 + rng.below(240) as i64));
            // Roughly one row in forty has no recorded creation date.
            let created = (rng.below(40) != 0).then_some(created);
            let amount = (1_000.0 + rng.next_f64().powi(2) * 249_000.0).round();

            Row {
                account: rng.pick(ACCOUNTS).to_string(),
                owner: rng.pick(OWNERS).to_string(),
                stage: stage.to_string(),
                kind: rng.pick(TYPES).to_string(),
                amount,
                created,
                close,
            }
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    // NaiveDate::default() is the Unix epoch.
    let epoch = NaiveDate::default();
    let days = |d: Option<NaiveDate>| d.map(|d| (d - epoch).num_days() as i32);
    let text = |f: fn(&Row) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("Account", DataType::Utf8, false),
        Field::new("Opportunity Owner", DataType::Utf8, false),
        Field::new("Stage", DataType::Utf8, false),
        Field::new("Type", DataType::Utf8, false),
        Field::new("Amount", DataType::Float64, false),
        Field::new("Created Date", DataType::Date32, true),
        Field::new("Close Date", DataType::Date32, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(|r| r.account.as_str()),
            text(|r| r.owner.as_str()),
            text(|r| r.stage.as_str()),
            text(|r| r.kind.as_str()),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.amount))),
            Arc::new(Date32Array::from(rows.iter().map(|r| days(r.created)).collect::<Vec<_>>())),
            Arc::new(Date32Array::from(rows.iter().map(|r| days(r.close)).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating Parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch).context("writing Parquet batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    let rows = generate(args.rows, &mut rng);

    let is_parquet = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_parquet(&args.output, &rows)?;
    } else {
        write_csv(&args.output, &rows)?;
    }

    println!("Wrote {} opportunities to {}", rows.len(), args.output.display());
    Ok(())
}
