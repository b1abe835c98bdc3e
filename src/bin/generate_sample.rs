//! Writes a small synthetic data folder in the instrument export layouts the
//! loader understands, for trying the viewer and the `preprocess` tool.
//!
//! Usage: `generate_sample [DIR]` (default `sample_data`).
//!
//! ```text
//! DIR/
//!   TGA/HDPE-0k.csv  LDPE-0k.csv  PP-01.csv (unrecognized, skipped)
//!   DSC/HDPE-0k.csv  LDPE-0k.csv
//!   replicates/HDPE-01_1.csv ... (for `preprocess average`)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    /// Uniform in `[lo, hi)`.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Temperatures from `start` in `step` increments, with a little jitter so
/// no two exports share a grid.
fn temperatures(rng: &mut SimpleRng, start: f64, end: f64, step: f64) -> Vec<f64> {
    let n = ((end - start) / step) as usize;
    (0..=n)
        .map(|i| start + i as f64 * step + rng.uniform(-0.05, 0.05) * step)
        .collect()
}

/// Weight (mg) of a single-step decomposition.
fn tga_weight(t: f64, onset: f64, width: f64, initial: f64, residue: f64) -> f64 {
    residue + (initial - residue) / (1.0 + ((t - onset) / width).exp())
}

/// Heat flow with a sloped baseline and an endothermic melting peak.
fn dsc_signal(t: f64, melt: f64, sigma: f64, depth: f64) -> f64 {
    0.002 * t - depth * (-(t - melt).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn write_rows(path: &Path, header: &[Vec<String>], rows: &[Vec<f64>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for record in header {
        writer.write_record(record)?;
    }
    for row in rows {
        writer.write_record(row.iter().map(|v| format!("{v:.6}")))?;
    }
    writer.flush()?;
    Ok(())
}

fn text_rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect()
}

/// HDPE TGA: 3 header rows, then `index, temperature, weight`.
fn write_tga_hdpe(path: &Path, rng: &mut SimpleRng, onset: f64) -> Result<()> {
    let header = text_rows(&[
        &["Sample", "HDPE"],
        &["Method", "Ramp 10.00 °C/min to 700.00 °C"],
        &["Index", "Temperature (°C)", "Weight (mg)"],
    ]);
    let initial = rng.uniform(9.5, 10.5);
    let rows: Vec<Vec<f64>> = temperatures(rng, 25.0, 700.0, 2.0)
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            let w = tga_weight(t, onset, 12.0, initial, 0.05) + rng.gauss(0.0, 0.005);
            vec![i as f64, t, w]
        })
        .collect();
    write_rows(path, &header, &rows)
}

/// LDPE TGA: 3 header rows, then `time, heat flow, weight, temperature`.
fn write_tga_ldpe(path: &Path, rng: &mut SimpleRng, onset: f64) -> Result<()> {
    let header = text_rows(&[
        &["Sample", "LDPE"],
        &["Instrument", "TGA 5500"],
        &["Time (min)", "Heat Flow (W/g)", "Weight (mg)", "Temperature (°C)"],
    ]);
    let initial = rng.uniform(9.5, 10.5);
    let rows: Vec<Vec<f64>> = temperatures(rng, 30.0, 650.0, 2.0)
        .into_iter()
        .map(|t| {
            let w = tga_weight(t, onset, 15.0, initial, 0.1) + rng.gauss(0.0, 0.005);
            vec![(t - 30.0) / 10.0, rng.gauss(0.0, 0.01), w, t]
        })
        .collect();
    write_rows(path, &header, &rows)
}

/// HDPE DSC: no header, `temperature, heat flow`.
fn write_dsc_hdpe(path: &Path, rng: &mut SimpleRng, melt: f64) -> Result<()> {
    let rows: Vec<Vec<f64>> = temperatures(rng, 20.0, 200.0, 0.5)
        .into_iter()
        .map(|t| vec![t, dsc_signal(t, melt, 4.0, 2.5) + rng.gauss(0.0, 0.01)])
        .collect();
    write_rows(path, &[], &rows)
}

/// LDPE DSC: 10 metadata rows, then `time, temperature, heat flow`.
fn write_dsc_ldpe(path: &Path, rng: &mut SimpleRng, melt: f64) -> Result<()> {
    let header = text_rows(&[
        &["Filename", "ldpe_run.tri"],
        &["Operator", "lab"],
        &["Run Date", "2024-03-01"],
        &["Instrument", "DSC 2500"],
        &["Module", "DSC Standard Cell"],
        &["Sample", "LDPE"],
        &["Size", "5.1200", "mg"],
        &["Method", "Heat/Cool/Heat"],
        &["Comment", "synthetic"],
        &["Time (min)", "Temperature (°C)", "Heat Flow (W/g)"],
    ]);
    let rows: Vec<Vec<f64>> = temperatures(rng, 25.0, 190.0, 0.5)
        .into_iter()
        .map(|t| {
            let signal = dsc_signal(t, melt, 6.0, 1.8) + rng.gauss(0.0, 0.01);
            vec![(t - 25.0) / 10.0, t, signal]
        })
        .collect();
    write_rows(path, &header, &rows)
}

/// Headerless numeric replicate tables sharing one shape.
fn write_replicates(dir: &Path, rng: &mut SimpleRng, base: &str, n: usize) -> Result<()> {
    let temps: Vec<f64> = (0..200).map(|i| 40.0 + i as f64 * 2.5).collect();
    for k in 1..=n {
        let rows: Vec<Vec<f64>> = temps
            .iter()
            .map(|&t| vec![t, tga_weight(t, 460.0, 12.0, 10.0, 0.05) + rng.gauss(0.0, 0.02)])
            .collect();
        write_rows(&dir.join(format!("{base}_{k}.csv")), &[], &rows)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let root = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    let (tga, dsc, replicates) = (root.join("TGA"), root.join("DSC"), root.join("replicates"));
    for dir in [&tga, &dsc, &replicates] {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    for k in 1..=4 {
        let (hdpe, ldpe) = (format!("HDPE-{k:02}.csv"), format!("LDPE-{k:02}.csv"));
        let onset = rng.gauss(465.0, 2.0);
        write_tga_hdpe(&tga.join(&hdpe), &mut rng, onset)?;
        let onset = rng.gauss(450.0, 2.0);
        write_tga_ldpe(&tga.join(&ldpe), &mut rng, onset)?;
        let melt = rng.gauss(131.0, 0.5);
        write_dsc_hdpe(&dsc.join(&hdpe), &mut rng, melt)?;
        let melt = rng.gauss(110.0, 0.5);
        write_dsc_ldpe(&dsc.join(&ldpe), &mut rng, melt)?;
    }
    fs::write(tga.join("PP-01.csv"), "Sample,PP\n1,2,3\n")?;

    write_replicates(&replicates, &mut rng, "HDPE-01", 3)?;
    write_replicates(&replicates, &mut rng, "LDPE-01", 2)?;

    println!("Wrote synthetic TGA/DSC exports to {}", root.display());
    Ok(())
}
