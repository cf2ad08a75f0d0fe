use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Bell-shaped bump on a log-frequency axis (resonance / notch).
fn log_gaussian(freq: f64, center: f64, octaves: f64, amplitude: f64) -> f64 {
    let d = (freq / center).log2();
    amplitude * (-(d * d) / (2.0 * octaves * octaves)).exp()
}

/// Sweep frequencies from `lo` to `hi` Hz, log-spaced, with slight jitter
/// the way instrument exports land off the nominal grid.
fn sweep(lo: f64, hi: f64, n: usize, rng: &mut SimpleRng) -> Vec<f64> {
    let ratio = (hi / lo).ln();
    (0..n)
        .map(|i| {
            let nominal = lo * (ratio * i as f64 / (n - 1) as f64).exp();
            nominal * (1.0 + rng.gauss(0.0, 0.002))
        })
        .collect()
}

/// Level in dB SPL for one subject at `freq`; `loss` deepens the
/// high-frequency roll-off for the more impaired conditions.
fn response(freq: f64, loss: f64, rng: &mut SimpleRng) -> f64 {
    let base = 65.0 + log_gaussian(freq, 3000.0, 0.8, 8.0);
    let roll_off = if freq > 2000.0 {
        loss * (freq / 2000.0).log2()
    } else {
        0.0
    };
    base - roll_off + rng.gauss(0.0, 0.75)
}

/// Seeded noise source so repeated runs write identical sweeps.
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut state = [0u64; 4];
        let mut x = seed;
        for word in &mut state {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *word = x;
        }
        SimpleRng { state }
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

    /// Uniform in [0, 1) from the top 53 bits.
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Measurement jitter in dB around `mean`.
    fn gauss(&mut self, mean: f64, sigma: f64) -> f64 {
        let r = (-2.0 * self.unit().max(1e-15).ln()).sqrt();
        let theta = std::f64::consts::TAU * self.unit();
        mean + sigma * r * theta.cos()
    }
}

fn write_csv(path: &Path, freqs: &[f64], levels: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["Frequency (Hz)", "dBSPL"])?;
    for (f, l) in freqs.iter().zip(levels) {
        writer.write_record([format!("{f:.3}"), format!("{l:.2}")])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, freqs: &[f64], levels: &[f64]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Freq", DataType::Float64, false),
        Field::new("Magnitude", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(freqs.to_vec())),
            Arc::new(Float64Array::from(levels.to_vec())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_experiment"));
    let mut rng = SimpleRng::new(42);

    let conditions = [("HL1", 0.0), ("HL2", 6.0), ("HL3", 12.0)];
    let subjects = ["Pon", "Mai", "Ken"];

    let mut files = 0;
    for (condition, loss) in conditions {
        let folder = root.join(condition);
        std::fs::create_dir_all(&folder)
            .with_context(|| format!("creating {}", folder.display()))?;

        for (i, subject) in subjects.iter().enumerate() {
            let freqs = sweep(20.0, 22_050.0, 1200, &mut rng);
            let levels: Vec<f64> = freqs.iter().map(|&f| response(f, loss, &mut rng)).collect();

            // Last subject of each condition is stored as Parquet.
            if i + 1 == subjects.len() {
                write_parquet(&folder.join(format!("{subject}.parquet")), &freqs, &levels)?;
            } else {
                write_csv(&folder.join(format!("{subject}.csv")), &freqs, &levels)?;
            }
            files += 1;
        }
    }

    println!(
        "Wrote {files} measurement files ({} conditions) under {}",
        conditions.len(),
        root.display()
    );
    Ok(())
}
