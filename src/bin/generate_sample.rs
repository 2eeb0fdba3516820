//! Writes a synthetic temperature-anomaly series as `sample_anomaly.csv`
//! (GISTEMP-like layout: title line, `***` gaps, repeated header mid-file)
//! and `sample_anomaly.parquet`.

use std::io::Write;
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Flat until 1950, then warming that speeds up.
fn anomaly(year: i64, rng: &mut SimpleRng) -> f64 {
    let t = (year - 1950).max(0) as f64;
    -0.2 + 0.0002 * t * t + 0.004 * t + rng.gauss(0.0, 0.08)
}

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng::new(42);

    let years: Vec<i64> = (1880..=2024).collect();
    let values: Vec<f64> = years
        .iter()
        .map(|&y| (anomaly(y, &mut rng) * 100.0).round() / 100.0)
        .collect();
    let stations: Vec<&str> = years.iter().map(|_| "GLOBAL").collect();

    // ---- CSV ----
    let mut out = std::fs::File::create("sample_anomaly.csv")?;
    writeln!(out, "Synthetic Land-Ocean: Global Means")?;
    writeln!(out, "Year,Station,J-D")?;
    for (i, (year, value)) in years.iter().zip(&values).enumerate() {
        if i == years.len() / 2 {
            writeln!(out, "Year,Station,J-D")?;
        }
        if year % 37 == 0 {
            writeln!(out, "{year},GLOBAL,***")?;
        } else {
            writeln!(out, "{year},GLOBAL,{value:.2}")?;
        }
    }

    // ---- Parquet ----
    let schema = Arc::new(Schema::new(vec![
        Field::new("Year", DataType::Int64, false),
        Field::new("Station", DataType::Utf8, false),
        Field::new("Anomaly", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(years.clone())),
            Arc::new(StringArray::from(stations)),
            Arc::new(Float64Array::from(values)),
        ],
    )?;

    let file = std::fs::File::create("sample_anomaly.parquet")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!(
        "Wrote {} years ({}–{}) to sample_anomaly.csv and sample_anomaly.parquet",
        years.len(),
        years[0],
        years[years.len() - 1]
    );
    Ok(())
}
