//! Markdown report generator.
//!
//! Five sections mirror the five charts of the classic climate notebook:
//! temperature trend, CO2 with its rolling average, sea level with its trend
//! line, the correlation heatmap and a combined timeline.

use super::charts::{downsample, heat, scaled, sparkline, MAX_WIDTH};
use crate::result::RunOutput;
use climatelab_core::analysis::IndicatorAnalysis;
use climatelab_core::domain::{Indicator, Period};
use std::fmt::Write;

pub struct MarkdownReportGenerator;

impl MarkdownReportGenerator {
    pub fn generate(&self, run: &RunOutput) -> String {
        let mut md = String::with_capacity(4096);

        md.push_str("# ClimateLab Run Report\n\n");
        let _ = writeln!(md, "Run ID: `{}`\n", run.run_id);

        self.metadata(&mut md, run);
        self.sources(&mut md, run);
        self.temperature(&mut md, run);
        self.co2(&mut md, run);
        self.sea_level(&mut md, run);
        self.correlations(&mut md, run);
        self.combined(&mut md, run);

        md
    }

    fn metadata(&self, md: &mut String, run: &RunOutput) {
        let table = &run.table;
        md.push_str("## Run\n\n");
        md.push_str("| Field | Value |\n");
        md.push_str("| --- | --- |\n");
        let _ = writeln!(md, "| Merge Policy | {} |", table.policy());
        let _ = writeln!(md, "| Granularity | {} |", table.granularity());
        let _ = writeln!(md, "| Rows | {} |", table.len());
        if let (Some(first), Some(last)) = (table.rows().first(), table.rows().last()) {
            let _ = writeln!(md, "| Span | {} to {} |", first.period, last.period);
        }
        let _ = writeln!(
            md,
            "| Created | {} |",
            run.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        if run.analysis.options.observed_only {
            md.push_str("| Statistics | observed values only |\n");
        }
        md.push('\n');
    }

    fn sources(&self, md: &mut String, run: &RunOutput) {
        if run.sources.is_empty() {
            return;
        }
        md.push_str("## Sources\n\n");
        md.push_str("| Indicator | Origin | Via | Observations | Present | Hash |\n");
        md.push_str("| --- | --- | --- | ---: | ---: | --- |\n");
        for s in &run.sources {
            let _ = writeln!(
                md,
                "| {} | {} | {:?} | {} | {} | `{}` |",
                s.indicator,
                s.origin,
                s.source,
                s.observations,
                s.present,
                &s.content_hash[..s.content_hash.len().min(12)]
            );
        }
        md.push('\n');
    }

    fn temperature(&self, md: &mut String, run: &RunOutput) {
        let indicator = Indicator::TemperatureAnomaly;
        md.push_str("## Global Temperature Anomaly\n\n");
        self.chart(md, run, &[(indicator.label(), values(run, indicator))]);
        if let Some(a) = run.analysis.indicator(indicator) {
            self.summary_lines(md, a, "°C");
            let _ = writeln!(
                md,
                "- Trend: {:+.3} °C per decade over {} points",
                a.trend.slope * 10.0,
                a.trend.points
            );
        }
        md.push('\n');
    }

    fn co2(&self, md: &mut String, run: &RunOutput) {
        let indicator = Indicator::Co2Emissions;
        let window = run.analysis.options.rolling_window;
        md.push_str("## CO2 Emissions\n\n");

        let rolling: Vec<Option<f64>> = run
            .analysis
            .indicator(indicator)
            .map(|a| a.rolling_mean.iter().map(|(_, v)| *v).collect())
            .unwrap_or_default();
        let rolling_label = format!("{window}-period average");
        self.chart(
            md,
            run,
            &[
                (indicator.label(), values(run, indicator)),
                (rolling_label.as_str(), rolling),
            ],
        );
        if let Some(a) = run.analysis.indicator(indicator) {
            self.summary_lines(md, a, "Mt");
            if let Some((period, value)) = a
                .rolling_mean
                .iter()
                .rev()
                .find_map(|(p, v)| v.map(|v| (*p, v)))
            {
                let _ = writeln!(md, "- Latest {window}-period average: {value:.1} Mt ({period})");
            }
        }
        md.push('\n');
    }

    fn sea_level(&self, md: &mut String, run: &RunOutput) {
        let indicator = Indicator::SeaLevel;
        md.push_str("## Sea Level\n\n");

        let observed = values(run, indicator);
        let fitted: Vec<Option<f64>> = match run.analysis.indicator(indicator) {
            Some(a) => run
                .table
                .periods()
                .iter()
                .map(|p| Some(a.trend.at(p.ordinal())))
                .collect(),
            None => Vec::new(),
        };
        self.chart(
            md,
            run,
            &[(indicator.label(), observed), ("Trend line", fitted)],
        );
        if let Some(a) = run.analysis.indicator(indicator) {
            self.summary_lines(md, a, "in");
            let _ = writeln!(
                md,
                "- Trend: {:+.4} in per year ({:+.2} in per century) over {} points",
                a.trend.slope,
                a.trend.slope * 100.0,
                a.trend.points
            );
        }
        md.push('\n');
    }

    fn correlations(&self, md: &mut String, run: &RunOutput) {
        let matrix = &run.analysis.correlations;
        md.push_str("## Correlation Matrix\n\n");
        md.push_str("Pairwise-complete Pearson coefficients; `n` is the number of shared periods.\n\n");

        md.push('|');
        for indicator in Indicator::ALL {
            let _ = write!(md, " | {indicator}");
        }
        md.push_str(" |\n| ---");
        for _ in Indicator::ALL {
            md.push_str(" | ---:");
        }
        md.push_str(" |\n");

        for a in Indicator::ALL {
            let _ = write!(md, "| {a}");
            for b in Indicator::ALL {
                let r = matrix.get(a, b);
                let _ = write!(
                    md,
                    " | {} {r:+.3} (n={})",
                    heat(r),
                    matrix.observations(a, b)
                );
            }
            md.push_str(" |\n");
        }
        md.push('\n');
    }

    fn combined(&self, md: &mut String, run: &RunOutput) {
        md.push_str("## Combined Timeline\n\n");
        md.push_str("Each indicator scaled to its own range.\n\n");
        let lines: Vec<(&str, Vec<Option<f64>>)> = Indicator::ALL
            .iter()
            .map(|&i| (i.as_str(), values(run, i)))
            .collect();
        self.chart_scaled(md, run, &lines, false);
        md.push('\n');
    }

    /// Lines sharing one vertical scale.
    fn chart(&self, md: &mut String, run: &RunOutput, lines: &[(&str, Vec<Option<f64>>)]) {
        self.chart_scaled(md, run, lines, true);
    }

    fn chart_scaled(
        &self,
        md: &mut String,
        run: &RunOutput,
        lines: &[(&str, Vec<Option<f64>>)],
        shared_scale: bool,
    ) {
        let sampled: Vec<(&str, Vec<Option<f64>>)> = lines
            .iter()
            .map(|(label, v)| (*label, downsample(v, MAX_WIDTH)))
            .collect();
        let (min, max) = sampled
            .iter()
            .flat_map(|(_, v)| v.iter().flatten())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let label_width = sampled.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);

        md.push_str("```text\n");
        for (label, values) in &sampled {
            let line = if shared_scale && min.is_finite() {
                scaled(values, min, max)
            } else {
                sparkline(values)
            };
            let _ = writeln!(md, "{label:<label_width$}  {line}");
        }
        if let Some((first, last)) = span(run) {
            let width = sampled.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
            let first = first.to_string();
            let last = last.to_string();
            let gap = width.saturating_sub(first.len() + last.len()).max(1);
            let _ = writeln!(
                md,
                "{:<label_width$}  {first}{}{last}",
                "",
                " ".repeat(gap)
            );
        }
        md.push_str("```\n\n");
    }

    fn summary_lines(&self, md: &mut String, a: &IndicatorAnalysis, unit: &str) {
        let s = &a.summary;
        let _ = writeln!(
            md,
            "- Mean: {:.3} {unit} (sd {:.3}) over {} periods, {} to {}",
            s.mean, s.std_dev, s.count, s.first, s.last
        );
        let _ = writeln!(md, "- Range: {:.3} to {:.3} {unit}", s.min, s.max);
    }
}

fn values(run: &RunOutput, indicator: Indicator) -> Vec<Option<f64>> {
    let observed_only = run.analysis.options.observed_only;
    run.table
        .column(indicator)
        .into_iter()
        .map(|(_, cell)| {
            if observed_only {
                cell.observed()
            } else {
                cell.value()
            }
        })
        .collect()
}

fn span(run: &RunOutput) -> Option<(Period, Period)> {
    let rows = run.table.rows();
    Some((rows.first()?.period, rows.last()?.period))
}
