mod common;

use std::collections::BTreeSet;

use common::{FACILITIES, fixture_path};
use facility_filter::{
    cache::SourceCache,
    capabilities::normalize,
    data::{Table, cell_from_raw},
    filter::{self, CategorySelection, FilterParameters},
    pipeline::{Notice, Pipeline},
    projector::{self, MapOutcome},
    source::SourceOptions,
};
use proptest::prelude::*;

const CATEGORIES: &[&str] = &["公園", "博物館", "庁舎", ""];
const NAMES: &[&str] = &["City Hall", "hall of fame", "corridor", "兼六園", ""];
const REVIEWS: &[&str] = &["0", "3", "12", "N/A", ""];
const CODES: &[&str] = &["1101", "1203", "1301", ""];
const KEYWORDS: &[&str] = &["hall", "HALL", "園", "", "zzz"];

fn is_subsequence(filtered: &Table, original: &Table) -> bool {
    let mut remaining = original.rows.iter();
    filtered
        .rows
        .iter()
        .all(|row| remaining.by_ref().any(|candidate| candidate == row))
}

fn arb_table() -> impl Strategy<Value = Table> {
    let row = (
        prop::sample::select(NAMES),
        prop::sample::select(CATEGORIES),
        prop::sample::select(REVIEWS),
        prop::sample::select(CODES),
    );
    prop::collection::vec(row, 0..24).prop_map(|rows| {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, (name, category, reviews, code))| {
                vec![
                    Some(idx.to_string()),
                    cell_from_raw(name),
                    cell_from_raw(category),
                    cell_from_raw(reviews),
                    cell_from_raw(code),
                ]
            })
            .collect();
        Table::with_rows(
            ["id", "名称", "施設分類", "reviews", "POIコード"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows,
        )
    })
}

fn arb_params() -> impl Strategy<Value = FilterParameters> {
    (
        prop::option::of(prop::sample::select(CATEGORIES)),
        prop::option::of(-1i64..15),
        prop::option::of(prop::sample::select(KEYWORDS)),
        prop::collection::btree_set(prop::sample::select(CODES), 0..3),
    )
        .prop_map(|(category, min, keyword, codes)| FilterParameters {
            selected_category: category
                .map(CategorySelection::parse)
                .unwrap_or_default(),
            min_review_count: min,
            keyword: keyword.map(str::to_string),
            selected_codes: codes.into_iter().map(str::to_string).collect(),
        })
}

proptest! {
    #[test]
    fn filtering_yields_an_ordered_subsequence(table in arb_table(), params in arb_params()) {
        let (table, caps) = normalize(table);
        let filtered = filter::apply(&table, &caps, &params);
        prop_assert!(filtered.len() <= table.len());
        prop_assert!(is_subsequence(&filtered, &table));
        prop_assert_eq!(&filtered.headers, &table.headers);
    }

    #[test]
    fn filtering_is_reproducible(table in arb_table(), params in arb_params()) {
        let (table, caps) = normalize(table);
        prop_assert_eq!(
            filter::apply(&table, &caps, &params),
            filter::apply(&table, &caps, &params)
        );
    }

    #[test]
    fn predicates_are_an_intersection(table in arb_table(), params in arb_params()) {
        let (table, caps) = normalize(table);
        let combined: BTreeSet<usize> = filter::matching_rows(&table, &caps, &params)
            .into_iter()
            .collect();
        let singles = [
            FilterParameters { selected_category: params.selected_category.clone(), ..Default::default() },
            FilterParameters { min_review_count: params.min_review_count, ..Default::default() },
            FilterParameters { keyword: params.keyword.clone(), ..Default::default() },
            FilterParameters { selected_codes: params.selected_codes.clone(), ..Default::default() },
        ];
        let mut expected: BTreeSet<usize> = (0..table.len()).collect();
        for single in &singles {
            let rows: BTreeSet<usize> = filter::matching_rows(&table, &caps, single)
                .into_iter()
                .collect();
            expected = expected.intersection(&rows).copied().collect();
        }
        prop_assert_eq!(combined, expected);
    }

    #[test]
    fn unset_parameters_are_identity(table in arb_table()) {
        let (table, caps) = normalize(table);
        prop_assert_eq!(filter::apply(&table, &caps, &FilterParameters::default()), table);
    }
}

#[test]
fn unknown_category_yields_empty_result() {
    let mut cache = SourceCache::new();
    let source = cache
        .load_path(&fixture_path(FACILITIES), SourceOptions::default())
        .expect("load fixture");
    let params = FilterParameters {
        selected_category: CategorySelection::Exact("水族館".into()),
        ..Default::default()
    };
    let output = Pipeline::default().run(&source, &params).expect("run");
    assert_eq!(output.filtered_rows, 0);
    assert_eq!(output.map, MapOutcome::NoMappablePoints);
    assert!(output.notices.contains(&Notice::NoMappablePoints));
    assert_eq!(output.categories.len(), 6);
}

#[test]
fn header_whitespace_is_trimmed_in_fixture() {
    let mut cache = SourceCache::new();
    let source = cache
        .load_path(&fixture_path(FACILITIES), SourceOptions::default())
        .expect("load fixture");
    assert!(source.table.has_column("名称_通称"));
    assert_eq!(source.capabilities.name_columns.len(), 2);
}

#[test]
fn repeated_loads_of_the_fixture_hit_the_cache() {
    let mut cache = SourceCache::new();
    let path = fixture_path(FACILITIES);
    let first = cache.load_path(&path, SourceOptions::default()).expect("first");
    let second = cache.load_path(&path, SourceOptions::default()).expect("second");
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn five_rows_with_two_invalid_coordinates_map_three_points() {
    let rows = [
        ["36.56", "136.65"],
        ["abc", "136.60"],
        ["36.57", "136.61"],
        ["", "136.62"],
        ["36.59", "136.67"],
    ];
    let table = Table::with_rows(
        vec!["lat".into(), "lon".into()],
        rows.iter()
            .map(|row| row.iter().map(|cell| cell_from_raw(cell)).collect())
            .collect(),
    );
    let (table, caps) = normalize(table);
    let outcome = projector::map_points(&table, &caps);
    assert_eq!(outcome.points().len(), 3);
    let export = projector::export(&table, Default::default()).expect("export");
    assert_eq!(
        String::from_utf8(export.bytes).expect("utf-8").lines().count(),
        6
    );
}
