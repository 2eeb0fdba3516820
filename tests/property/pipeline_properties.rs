use proptest::prelude::*;
use tide_tales::data::model::{Cell, RawTable};
use tide_tales::{Error, YearRange, build_series, classify, compute_fact_pack};

fn cell_text() -> impl Strategy<Value = String> {
    prop_oneof![
        (1700i32..2100).prop_map(|y| y.to_string()),
        (-50.0f64..50.0).prop_map(|v| format!("{v:.2}")),
        Just("***".to_string()),
        Just(String::new()),
        "[A-Za-z-]{1,6}",
    ]
}

fn arbitrary_table() -> impl Strategy<Value = RawTable> {
    (2usize..6, 0usize..12).prop_flat_map(|(n_cols, n_rows)| {
        (
            prop::collection::vec("[A-Za-z _-]{0,8}", n_cols),
            prop::collection::vec(prop::collection::vec(cell_text(), n_cols), n_rows),
        )
            .prop_map(|(headers, rows)| {
                let missing = vec!["***".to_string()];
                RawTable::from_rows(
                    headers,
                    rows.iter()
                        .map(|r| r.iter().map(|c| Cell::from_text(c, &missing)).collect())
                        .collect(),
                )
            })
    })
}

proptest! {
    #[test]
    fn classify_returns_two_distinct_existing_columns(table in arbitrary_table()) {
        let c = classify(&table).unwrap();
        prop_assert!(table.has_column(&c.mapping.time_column));
        prop_assert!(table.has_column(&c.mapping.value_column));
        prop_assert_ne!(c.mapping.time_column, c.mapping.value_column);
    }

    #[test]
    fn classify_is_idempotent(table in arbitrary_table()) {
        prop_assert_eq!(classify(&table).unwrap(), classify(&table).unwrap());
    }

    #[test]
    fn full_span_count_equals_valid_rows(rows in prop::collection::vec((cell_text(), cell_text()), 1..40)) {
        let missing = vec!["***".to_string()];
        let table = RawTable::from_rows(
            vec!["Year".into(), "Temp".into()],
            rows.iter()
                .map(|(y, v)| vec![Cell::from_text(y, &missing), Cell::from_text(v, &missing)])
                .collect(),
        );
        let valid = table.columns()[0]
            .cells
            .iter()
            .zip(&table.columns()[1].cells)
            .filter(|(y, v)| y.as_f64().is_some() && v.as_f64().is_some())
            .count();

        let c = classify(&table).unwrap();
        let series = build_series(&table, &c.mapping).unwrap();
        prop_assert_eq!(series.len(), valid);

        match series.span() {
            None => prop_assert_eq!(valid, 0),
            Some(span) => match compute_fact_pack(&series, span) {
                Ok(fp) => prop_assert_eq!(fp.count(), valid),
                Err(Error::DegenerateFit { summary }) => prop_assert_eq!(summary.count, valid),
                Err(e) => prop_assert!(false, "unexpected error {e}"),
            },
        }
    }

    #[test]
    fn inverted_range_is_always_invalid(start in -3000i32..3000, gap in 1i32..500) {
        let table = RawTable::from_rows(
            vec!["Year".into(), "Temp".into()],
            vec![vec![Cell::Number(2000.0), Cell::Number(1.0)]],
        );
        let series = build_series(&table, &classify(&table).unwrap().mapping).unwrap();
        let range = YearRange::new(start + gap, start);
        prop_assert_eq!(
            compute_fact_pack(&series, range).unwrap_err(),
            Error::InvalidRange { start: start + gap, end: start }
        );
    }
}
