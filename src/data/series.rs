use super::model::{ColumnMapping, Observation, ObservationSeries, RawTable};
use crate::error::{Error, Result};

/// Turn the mapped columns of `table` into a cleaned, sorted series.
///
/// Both cells of a row are coerced to numbers; the row is dropped when either
/// side is absent or the year does not fit an `i32`. Fractional years
/// (e.g. `1998.5` for monthly data) are floored.
pub fn build_series(table: &RawTable, mapping: &ColumnMapping) -> Result<ObservationSeries> {
    if mapping.time_column == mapping.value_column {
        return Err(Error::MappingNotFound);
    }
    let time = table
        .column(&mapping.time_column)
        .ok_or_else(|| Error::UnknownColumn(mapping.time_column.clone()))?;
    let value = table
        .column(&mapping.value_column)
        .ok_or_else(|| Error::UnknownColumn(mapping.value_column.clone()))?;

    let observations = time
        .cells
        .iter()
        .zip(&value.cells)
        .filter_map(|(t, v)| {
            let year = coerce_year(t.as_f64()?)?;
            Some(Observation {
                year,
                value: v.as_f64()?,
            })
        })
        .collect();

    let series = ObservationSeries::new(observations);
    log::debug!(
        "built series of {} observations from {} rows",
        series.len(),
        table.len()
    );
    Ok(series)
}

fn coerce_year(v: f64) -> Option<i32> {
    let year = v.floor();
    (year >= i32::MIN as f64 && year <= i32::MAX as f64).then_some(year as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Cell;

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            time_column: "Year".into(),
            value_column: "J-D".into(),
        }
    }

    fn table(rows: &[(&str, &str)]) -> RawTable {
        let missing = vec!["***".to_string()];
        RawTable::from_rows(
            vec!["Year".into(), "J-D".into()],
            rows.iter()
                .map(|(y, v)| vec![Cell::from_text(y, &missing), Cell::from_text(v, &missing)])
                .collect(),
        )
    }

    #[test]
    fn drops_junk_and_missing_rows() {
        let t = table(&[
            ("2001", "0.5"),
            ("Year", "J-D"),
            ("2000", "***"),
            ("1999", "0.4"),
            ("", "0.9"),
        ]);
        let s = build_series(&t, &mapping()).unwrap();
        let years: Vec<i32> = s.observations().iter().map(|o| o.year).collect();
        assert_eq!(years, vec![1999, 2001]);
    }

    #[test]
    fn floors_fractional_years() {
        let t = table(&[("1998.9", "1.0"), ("-0.5", "2.0")]);
        let s = build_series(&t, &mapping()).unwrap();
        let years: Vec<i32> = s.observations().iter().map(|o| o.year).collect();
        assert_eq!(years, vec![-1, 1998]);
    }

    #[test]
    fn unknown_column_is_reported() {
        let t = table(&[("2000", "1")]);
        let m = ColumnMapping {
            time_column: "Year".into(),
            value_column: "Temp".into(),
        };
        assert_eq!(
            build_series(&t, &m).unwrap_err(),
            Error::UnknownColumn("Temp".into())
        );
    }
}
