use financial_table_engine::*;

fn annual_income(years: &[(i32, f64)]) -> Vec<RawStatementRecord> {
    years
        .iter()
        .map(|(year, revenue)| {
            RawStatementRecord::new(format!("{}-09-30", year))
                .with_calendar_year(*year)
                .with_metric("revenue", *revenue)
        })
        .collect()
}

fn metric_ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[test]
fn test_period_sorter_places_ttm_last() {
    let permutations = [
        vec!["TTM", "2020", "2019", "2021"],
        vec!["2020", "TTM", "2019", "2021"],
        vec!["2021", "2019", "2020", "TTM"],
    ];

    for labels in permutations {
        let sorted = sort_periods(&labels);
        assert_eq!(sorted, vec!["2019", "2020", "2021", "TTM"]);
    }

    assert_eq!(
        sort_periods(&["Mar 23", "Jan 23", "Dec 22"]),
        vec!["Dec 22", "Jan 23", "Mar 23"]
    );
}

#[test]
fn test_range_selector_bounds() {
    let requests = [
        RangeRequest::Default,
        RangeRequest::Explicit { start: 0, end: 100 },
        RangeRequest::Explicit { start: 7, end: 2 },
        RangeRequest::Preset {
            preset: RangePreset::OneYear,
        },
        RangeRequest::Preset {
            preset: RangePreset::TenYears,
        },
        RangeRequest::Preset {
            preset: RangePreset::All,
        },
    ];

    for count in 1..=30 {
        for period_type in [PeriodType::Annual, PeriodType::Quarterly] {
            for request in &requests {
                let selection = select_range(count, period_type, request, &Default::default());
                let range = selection.range;
                assert!(range.start <= range.end, "{:?} over {}", request, count);
                assert!(range.end <= count - 1, "{:?} over {}", request, count);
            }
        }
    }
}

#[test]
fn test_statistics_examples() {
    let growth = compute_stats(&MetricSeries::from_pairs([("2020", 100.0), ("2021", 150.0)]));
    assert!((growth.total_change_percent.unwrap() - 50.0).abs() < 1e-9);
    assert!((growth.cagr_percent.unwrap() - 50.0).abs() < 1e-9);

    let zero_base = compute_stats(&MetricSeries::from_pairs([("2020", 0.0), ("2021", 150.0)]));
    assert_eq!(zero_base.total_change_percent, None);

    let single = compute_stats(&MetricSeries::from_pairs([("2023", 12.0)]));
    assert_eq!(single.total_change_percent, None);
    assert_eq!(single.cagr_percent, None);
}

#[test]
fn test_entity_missing_a_period_gets_sentinel() {
    let request = TableRequest {
        entities: vec![
            EntityStatements::new("AAA").with_income(annual_income(&[(2022, 80.0), (2023, 100.0)])),
            EntityStatements::new("BBB").with_income(annual_income(&[(2022, 40.0)])),
        ],
        metrics: metric_ids(&["revenue"]),
        period_type: PeriodType::Annual,
        range: RangeRequest::Default,
    };

    let output = build_financial_table(&request);
    let row = output.rows.iter().find(|r| r.period == "2023").unwrap();
    assert_eq!(row.value("AAA", "revenue"), Some(100.0));
    assert_eq!(row.values.get("BBB_revenue"), Some(&None));

    let zero_filled = build_financial_table_with_config(
        &request,
        EngineConfig {
            missing_value: MissingValuePolicy::Zero,
            ..EngineConfig::default()
        },
    )
    .unwrap();
    let row = zero_filled.rows.iter().find(|r| r.period == "2023").unwrap();
    assert_eq!(row.values.get("BBB_revenue"), Some(&Some(0.0)));
}

#[test]
fn test_merger_is_idempotent() {
    let request = TableRequest {
        entities: vec![
            EntityStatements::new("AAA")
                .with_income(annual_income(&[(2021, 1.0), (2022, 2.0), (2023, 3.0)]))
                .with_balance_sheet(vec![
                    RawStatementRecord::new("2023-09-30").with_metric("totalAssets", "$1,000"),
                ]),
            EntityStatements::new("BBB").with_income(annual_income(&[(2020, 5.0)])),
        ],
        metrics: metric_ids(&["revenue", "totalAssets"]),
        ..TableRequest::default()
    };

    let first = build_financial_table(&request);
    let second = build_financial_table(&request);
    assert_eq!(first, second);
    assert_eq!(first.periods, vec!["2020", "2021", "2022", "2023"]);
}

#[test]
fn test_five_year_preset_with_ttm() {
    let mut income = annual_income(&[
        (2019, 100.0),
        (2020, 110.0),
        (2021, 121.0),
        (2022, 133.1),
        (2023, 146.41),
    ]);
    income.push(RawStatementRecord::ttm().with_metric("revenue", 150.0));

    let request = TableRequest {
        entities: vec![EntityStatements::new("AAA").with_income(income)],
        metrics: metric_ids(&["revenue"]),
        period_type: PeriodType::Annual,
        range: RangeRequest::Preset {
            preset: RangePreset::FiveYears,
        },
    };

    let output = build_financial_table(&request);
    assert_eq!(
        output.visible_periods(),
        vec!["2019", "2020", "2021", "2022", "2023", "TTM"]
    );

    let stats = output.stats["AAA_revenue"];
    assert!((stats.total_change_percent.unwrap() - 46.41).abs() < 1e-6);
    assert!((stats.cagr_percent.unwrap() - 10.0).abs() < 1e-6);
}

#[test]
fn test_one_year_preset_at_four_and_five_periods() {
    let one_year = RangeRequest::Preset {
        preset: RangePreset::OneYear,
    };
    let build = |years: &[(i32, f64)]| {
        build_financial_table(&TableRequest {
            entities: vec![EntityStatements::new("AAA").with_income(annual_income(years))],
            metrics: metric_ids(&["revenue"]),
            period_type: PeriodType::Annual,
            range: one_year,
        })
    };

    let four = build(&[(2020, 1.0), (2021, 2.0), (2022, 3.0), (2023, 4.0)]);
    assert_eq!(four.range, VisibleRange::new(0, 3));
    assert_eq!(four.visible_periods(), vec!["2020", "2021", "2022", "2023"]);

    let five = build(&[(2019, 1.0), (2020, 1.0), (2021, 2.0), (2022, 3.0), (2023, 4.0)]);
    assert_eq!(five.range, VisibleRange::new(1, 4));
    assert_eq!(five.visible_periods(), vec!["2020", "2021", "2022", "2023"]);
}

#[test]
fn test_entities_with_different_fiscal_calendars() {
    let quarter = |date: &str, revenue: f64| RawStatementRecord::new(date).with_metric("revenue", revenue);

    let request = TableRequest {
        entities: vec![
            EntityStatements::new("AAA").with_income(vec![
                quarter("2023-03-31", 10.0),
                quarter("2023-06-30", 11.0),
            ]),
            EntityStatements::new("BBB").with_income(vec![
                quarter("2023-04-29", 20.0),
                quarter("2023-07-29", 21.0),
            ]),
        ],
        metrics: metric_ids(&["revenue"]),
        period_type: PeriodType::Quarterly,
        range: RangeRequest::Default,
    };

    let output = build_financial_table(&request);
    assert_eq!(output.periods, vec!["Mar 23", "Apr 23", "Jun 23", "Jul 23"]);
    assert_eq!(output.rows[1].value("AAA", "revenue"), None);
    assert_eq!(output.rows[1].value("BBB", "revenue"), Some(20.0));
    assert!(output.rows.iter().all(|r| !r.is_ttm()));
}

#[test]
fn test_malformed_upstream_data_degrades_gracefully() {
    let request = TableRequest {
        entities: vec![EntityStatements::new("AAA").with_income(vec![
            RawStatementRecord::new("31/12/2023").with_metric("revenue", 1.0),
            RawStatementRecord::new("2022-12-31").with_metric("revenue", "n/a"),
        ])],
        metrics: metric_ids(&["revenue"]),
        period_type: PeriodType::Annual,
        range: RangeRequest::Explicit { start: 4, end: 9 },
    };

    let output = build_financial_table(&request);
    assert_eq!(output.visible_periods(), vec!["2022"]);
    assert_eq!(output.rows[0].value("AAA", "revenue"), None);

    let kinds: Vec<&Anomaly> = output.anomalies.iter().collect();
    assert!(kinds
        .iter()
        .any(|a| matches!(a, Anomaly::MalformedPeriod { .. })));
    assert!(kinds
        .iter()
        .any(|a| matches!(a, Anomaly::OutOfRangeWindow { .. })));
    assert!(kinds
        .iter()
        .any(|a| matches!(a, Anomaly::InsufficientData { points: 0, .. })));
}

#[test]
fn test_provider_json_request() -> anyhow::Result<()> {
    let json = r#"{
        "entities": [
            {
                "entityId": "AAA",
                "income": [
                    {"date": "2023-09-30", "calendarYear": "2023", "period": "FY", "revenue": 383285000000, "eps": 6.16},
                    {"date": "2022-09-24", "calendarYear": "2022", "period": "FY", "revenue": 394328000000, "eps": 6.15},
                    {"date": "TTM", "revenue": "385,706,000,000"}
                ],
                "balanceSheet": [
                    {"date": "2023-09-30", "calendarYear": "2023", "totalAssets": 352583000000},
                    {"date": "2022-09-24", "calendarYear": "2022", "totalAssets": 352755000000}
                ],
                "cashFlow": [
                    {"date": "2023-09-30", "calendarYear": "2023", "freeCashFlow": 99584000000}
                ]
            }
        ],
        "metrics": ["revenue", "totalAssets", "freeCashFlow"],
        "periodType": "annual",
        "range": {"mode": "preset", "preset": "All"}
    }"#;

    let request: TableRequest = serde_json::from_str(json)?;
    let output = build_financial_table(&request);

    assert_eq!(output.periods, vec!["2022", "2023", "TTM"]);
    let ttm = output.rows.last().unwrap();
    assert_eq!(ttm.value("AAA", "revenue"), Some(385_706_000_000.0));
    assert_eq!(ttm.value("AAA", "totalAssets"), None);
    assert_eq!(output.rows[1].value("AAA", "freeCashFlow"), Some(99_584_000_000.0));

    let revenue = output.stats["AAA_revenue"];
    assert!(revenue.total_change_percent.unwrap() < 0.0);
    assert!(revenue.cagr_percent.unwrap() < 0.0);
    assert!(output.stats["AAA_freeCashFlow"].cagr_percent.is_none());

    let rendered = serde_json::to_value(&output)?;
    assert!(rendered["stats"]["AAA_revenue"]["totalChangePercent"].is_number());
    assert!(rendered["rows"][2]["values"]["AAA_totalAssets"].is_null());
    Ok(())
}

#[test]
fn test_output_schema_generation() {
    let schema = TableOutput::schema_as_json().unwrap();
    assert!(schema.contains("periods"));
    assert!(schema.contains("anomalies"));
    assert!(schema.contains("totalChangePercent"));
}
