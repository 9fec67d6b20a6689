//! Merged table export (CSV).
//!
//! Columns: period, then per indicator a value column and a `*_filled` flag.
//! Absent cells are empty, never zero.

use crate::reporting::PresentError;
use climatelab_core::domain::{Indicator, MergedTable};

pub fn merged_csv(table: &MergedTable) -> Result<String, PresentError> {
    let csv_err = |source| PresentError::Csv {
        artifact: "merged.csv",
        source,
    };
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["period".to_string()];
    for indicator in Indicator::ALL {
        header.push(indicator.as_str().to_string());
        header.push(format!("{}_filled", indicator.as_str()));
    }
    wtr.write_record(&header).map_err(csv_err)?;

    for row in table.rows() {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.period.to_string());
        for indicator in Indicator::ALL {
            let cell = row.record.get(indicator);
            record.push(cell.value().map(|v| v.to_string()).unwrap_or_default());
            record.push(cell.is_filled().to_string());
        }
        wtr.write_record(&record).map_err(csv_err)?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| csv_err(csv::Error::from(e.into_error())))?;
    String::from_utf8(data).map_err(|e| PresentError::Csv {
        artifact: "merged.csv",
        source: csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
    })
}
