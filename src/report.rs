//! Per-sample metrics table.
//!
//! One row per sample, fixed columns, `NA` for undefined values. Rows written
//! here are read back by [`read_csv`] for comparison across runs.

use std::io::{Read, Write};

use tracing::debug;

use crate::metrics::{ImmuneArchitecture, MixingPhenotype};
use crate::model::Phenotype;
use crate::{Error, Result};

/// Marker for a metric with no valid denominator.
pub const NA: &str = "NA";

/// Header row, in output order. Barrier columns follow [`Phenotype::TRACKED`].
pub const COLUMNS: [&str; 10] = [
    "Sample",
    "Mixing Score",
    "Phenotype",
    "Stromal Clustering",
    "Stromal Barrier - B cell",
    "Stromal Barrier - T cell",
    "Stromal Barrier - Macrophage",
    "Stromal Barrier - Killer T cell",
    "Stromal Barrier - Helper T cell",
    "Stromal Barrier - Regulatory T cell",
];

const BARRIER_OFFSET: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub sample: String,
    /// `-1` below the immune floor, `None` when undefined.
    pub mixing_score: Option<f64>,
    pub mixing_phenotype: Option<MixingPhenotype>,
    pub stromal_clustering: Option<f64>,
    /// One entry per tracked phenotype, in column order.
    pub stromal_barriers: Vec<(Phenotype, Option<f64>)>,
}

impl MetricsReport {
    pub fn from_metrics(sample: impl Into<String>, metrics: &ImmuneArchitecture) -> Self {
        let stromal_barriers = Phenotype::TRACKED
            .iter()
            .map(|&p| (p, metrics.barrier(p).and_then(|b| b.mean)))
            .collect();
        Self {
            sample: sample.into(),
            mixing_score: metrics.mixing.value(),
            mixing_phenotype: metrics.mixing.phenotype,
            stromal_clustering: metrics.stromal_clustering.average,
            stromal_barriers,
        }
    }

    pub fn barrier(&self, phenotype: Phenotype) -> Option<f64> {
        self.stromal_barriers
            .iter()
            .find(|(p, _)| *p == phenotype)
            .and_then(|(_, v)| *v)
    }

    fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(COLUMNS.len());
        row.push(self.sample.clone());
        row.push(format_value(self.mixing_score));
        row.push(self.mixing_phenotype.map_or_else(|| NA.to_string(), |p| p.to_string()));
        row.push(format_value(self.stromal_clustering));
        for &p in &Phenotype::TRACKED {
            row.push(format_value(self.barrier(p)));
        }
        row
    }

    fn from_row(record: &csv::StringRecord, line: u64) -> Result<Self> {
        if record.len() != COLUMNS.len() {
            return Err(Error::InvalidInput(format!(
                "row {line}: expected {} fields, found {}",
                COLUMNS.len(),
                record.len()
            )));
        }
        let field = |i: usize| record.get(i).unwrap_or(NA);
        let number = |i: usize| {
            parse_value(field(i)).map_err(|_| {
                Error::InvalidInput(format!("row {line}, column {:?}: not a number: {:?}", COLUMNS[i], field(i)))
            })
        };

        let mixing_phenotype = match field(2) {
            NA => None,
            s => Some(s.parse::<MixingPhenotype>()?),
        };
        let stromal_barriers = Phenotype::TRACKED
            .iter()
            .enumerate()
            .map(|(k, &p)| Ok((p, number(BARRIER_OFFSET + k)?)))
            .collect::<Result<_>>()?;

        Ok(Self {
            sample: field(0).to_string(),
            mixing_score: number(1)?,
            mixing_phenotype,
            stromal_clustering: number(3)?,
            stromal_barriers,
        })
    }
}

fn format_value(v: Option<f64>) -> String {
    v.map_or_else(|| NA.to_string(), |v| v.to_string())
}

fn parse_value(s: &str) -> std::result::Result<Option<f64>, std::num::ParseFloatError> {
    if s == NA { Ok(None) } else { s.parse().map(Some) }
}

/// Write a header and one row per report.
pub fn write_csv<W: Write>(reports: &[MetricsReport], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(COLUMNS)?;
    for report in reports {
        wtr.write_record(report.to_row())?;
    }
    wtr.flush()?;
    debug!(rows = reports.len(), "wrote metrics table");
    Ok(())
}

/// Read a table produced by [`write_csv`]. The header must match exactly.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<MetricsReport>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.iter().ne(COLUMNS.iter().copied()) {
        return Err(Error::InvalidInput(format!(
            "unexpected metrics header: {:?}",
            headers.iter().collect::<Vec<_>>()
        )));
    }

    let mut reports = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        reports.push(MetricsReport::from_row(&record?, i as u64 + 2)?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report() -> MetricsReport {
        MetricsReport {
            sample: "P01".to_string(),
            mixing_score: Some(0.2),
            mixing_phenotype: Some(MixingPhenotype::Compartmentalized),
            stromal_clustering: Some(0.125),
            stromal_barriers: Phenotype::TRACKED
                .iter()
                .map(|&p| (p, if p == Phenotype::TCell { Some(2.0) } else { None }))
                .collect(),
        }
    }

    #[test]
    fn test_columns_follow_tracked_phenotypes() {
        for (k, p) in Phenotype::TRACKED.iter().enumerate() {
            assert_eq!(COLUMNS[BARRIER_OFFSET + k], format!("Stromal Barrier - {p}"));
        }
    }

    #[test]
    fn test_write_layout() {
        let cold = MetricsReport {
            sample: "P02".to_string(),
            mixing_score: Some(-1.0),
            mixing_phenotype: Some(MixingPhenotype::Cold),
            stromal_clustering: None,
            stromal_barriers: Phenotype::TRACKED.iter().map(|&p| (p, None)).collect(),
        };
        let mut buf = Vec::new();
        write_csv(&[report(), cold], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], COLUMNS.join(","));
        assert_eq!(lines[1], "P01,0.2,Compartmentalized,0.125,NA,2,NA,NA,NA,NA");
        assert_eq!(lines[2], "P02,-1,Cold,NA,NA,NA,NA,NA,NA,NA");
    }

    #[test]
    fn test_read_back() {
        let mut buf = Vec::new();
        write_csv(&[report()], &mut buf).unwrap();
        let back = read_csv(buf.as_slice()).unwrap();
        assert_eq!(back, vec![report()]);
    }

    #[test]
    fn test_read_rejects_bad_header_and_values() {
        assert!(matches!(read_csv("a,b\n1,2\n".as_bytes()), Err(Error::InvalidInput(_))));

        let text = format!("{}\nP01,zero,Mixed,NA,NA,NA,NA,NA,NA,NA\n", COLUMNS.join(","));
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Mixing Score"));
    }
}
