//! End-to-end linkage scenarios over small, literal datasets.

use bloomlink::{
    link, ColumnSpec, DataTable, Embedder, EmbedderConfig, FeatureFactory, MatchError,
    MatchOptions,
};

fn embedder() -> Embedder {
    Embedder::new(EmbedderConfig::default(), FeatureFactory::standard()).unwrap()
}

fn person_colspec() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("first", "name"),
        ColumnSpec::new("last", "name"),
        ColumnSpec::new("sex", "sex"),
        ColumnSpec::new("instrument", "misc_shingled"),
    ]
}

fn roster_colspec() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("name", "name"),
        ColumnSpec::new("sex", "sex"),
        ColumnSpec::new("main_instrument", "misc_shingled").with_label("instrument"),
    ]
}

/// Clean trio: split-name columns on one side, free-text full names plus
/// synonyms on the other.
#[test]
fn trio_clean_links_all_three() {
    let band = DataTable::from_rows(
        vec!["first", "last", "sex", "instrument"],
        vec![
            vec![
                Some("Laura".into()),
                Some("Ochoa".into()),
                Some("f".into()),
                Some("bass".into()),
            ],
            vec![
                Some("Mark".into()),
                Some("Speer".into()),
                Some("m".into()),
                Some("guitar".into()),
            ],
            vec![
                Some("DJ".into()),
                Some("Johnson".into()),
                Some("m".into()),
                Some("drums".into()),
            ],
        ],
    )
    .unwrap();

    let roster = DataTable::from_rows(
        vec!["name", "sex", "main_instrument"],
        vec![
            vec![
                Some("Laura 'Leezy' Lee Ochoa".into()),
                Some("female".into()),
                Some("bass guitar".into()),
            ],
            vec![
                Some("Donald J Johnson".into()),
                Some("male".into()),
                Some("percussion".into()),
            ],
            vec![
                Some("Marc Spear".into()),
                Some("male".into()),
                Some("electric guitar".into()),
            ],
        ],
    )
    .unwrap();

    let outcome = link(
        &embedder(),
        &band,
        &person_colspec(),
        &roster,
        &roster_colspec(),
        &MatchOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome.matching.left(), &[0, 1, 2]);
    assert_eq!(outcome.matching.right(), &[0, 2, 1]);

    // Every matched pair out-scores every impostor in its row and column.
    let sim = &outcome.similarities;
    for (i, j) in outcome.matching.pairs() {
        let s = sim.score(i, j);
        assert!(s >= 0.4, "pair ({i}, {j}) scored only {s}");
        for other in 0..3 {
            if other != j {
                assert!(s > sim.score(i, other));
            }
            if other != i {
                assert!(s > sim.score(other, j));
            }
        }
    }
    // The two format-clean pairs clear 0.5 comfortably.
    assert!(sim.score(0, 0) >= 0.5);
    assert!(sim.score(1, 2) >= 0.5);
}

/// Misspelled trio: typos on both sides, phonetically stable names.
#[test]
fn trio_misspelled_links_despite_typos() {
    let colspec = vec![ColumnSpec::new("name", "name")];
    let left = DataTable::from_rows(
        vec!["name"],
        vec![
            vec![Some("Laura Daten".into())],
            vec![Some("Kaspar Gorman".into())],
            vec![Some("Grete Knopf".into())],
        ],
    )
    .unwrap();
    let right = DataTable::from_rows(
        vec!["name"],
        vec![
            vec![Some("Laura Datten".into())],
            vec![Some("Greta Knopf".into())],
            vec![Some("Casper Goreman".into())],
        ],
    )
    .unwrap();

    let outcome = link(
        &embedder(),
        &left,
        &colspec,
        &right,
        &colspec,
        &MatchOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome.matching.left(), &[0, 1, 2]);
    assert_eq!(outcome.matching.right(), &[0, 2, 1]);
    for (i, j) in outcome.matching.pairs() {
        assert!(
            outcome.similarities.score(i, j) >= 0.5,
            "pair ({i}, {j}) scored {}",
            outcome.similarities.score(i, j)
        );
    }
}

/// A missing date of birth must not sink a record: the remaining features
/// still carry it to its counterpart.
#[test]
fn missing_dob_still_links() {
    let colspec = vec![
        ColumnSpec::new("name", "name"),
        ColumnSpec::new("dob", "dob"),
    ];
    let left = DataTable::from_rows(
        vec!["name", "dob"],
        vec![
            vec![Some("Laura Ochoa".into()), None],
            vec![Some("Mark Speer".into()), Some("1987-06-05".into())],
        ],
    )
    .unwrap();
    let right = DataTable::from_rows(
        vec!["name", "dob"],
        vec![
            vec![Some("Mark Speer".into()), Some("1987-06-05".into())],
            vec![Some("Laura Ochoa".into()), Some("1990-02-11".into())],
        ],
    )
    .unwrap();

    let outcome = link(
        &embedder(),
        &left,
        &colspec,
        &right,
        &colspec,
        &MatchOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome.matching.left(), &[0, 1]);
    assert_eq!(outcome.matching.right(), &[1, 0]);

    let sim = &outcome.similarities;
    assert!(sim.score(0, 1) > 0.0);
    assert!(sim.score(0, 1) > sim.score(0, 0));
}

/// Partial dates keep the shared components scoring: year and month agree
/// even when the day is missing on one side.
#[test]
fn partial_dob_scores_above_disjoint_dob() {
    let colspec = vec![ColumnSpec::new("dob", "dob")];
    let e = embedder();

    let left = DataTable::from_rows(
        vec!["dob"],
        vec![vec![Some("1987-06-05".into())], vec![Some("1955-11-30".into())]],
    )
    .unwrap();
    let right = DataTable::from_rows(
        vec!["dob"],
        vec![vec![Some("1987-06".into())], vec![Some("2003-01-02".into())]],
    )
    .unwrap();

    let outcome = link(
        &e,
        &left,
        &colspec,
        &right,
        &colspec,
        &MatchOptions::new().with_require_thresholds(false),
    )
    .unwrap();

    let sim = &outcome.similarities;
    // Year + month agree for (0, 0); the disjoint dates score at most a
    // stray filter collision.
    assert!(sim.score(0, 0) > 0.5);
    assert!(sim.score(0, 1) < 0.2);
    assert!(sim.score(1, 0) < 0.2);
}

/// Different filter widths mean different embedding spaces; comparison must
/// refuse outright.
#[test]
fn config_mismatch_fails_before_comparison() {
    let factory = FeatureFactory::standard();
    let embedder_a = Embedder::new(
        EmbedderConfig::default().with_filter_size(1024),
        factory.clone(),
    )
    .unwrap();
    let embedder_b =
        Embedder::new(EmbedderConfig::default().with_filter_size(2048), factory).unwrap();

    let table = DataTable::from_rows(vec!["name"], vec![vec![Some("Laura Ochoa".into())]]).unwrap();
    let colspec = vec![ColumnSpec::new("name", "name")];

    let left = embedder_a.embed(&table, &colspec, true).unwrap();
    let right = embedder_b.embed(&table, &colspec, true).unwrap();

    let err = bloomlink::compare(&embedder_a, &left, &right).unwrap_err();
    assert!(matches!(err, MatchError::ConfigMismatch { .. }));
}

/// A near-duplicate inside one dataset raises that record's threshold above
/// its best cross-dataset score; enforcement drops the pair, relaxation
/// brings it back.
#[test]
fn near_duplicate_triggers_threshold_rejection() {
    let colspec = vec![ColumnSpec::new("name", "name")];
    let e = embedder();

    // Rows 0 and 1 are near-duplicates of each other; their mutual
    // similarity exceeds anything dataset 2 can offer.
    let left = DataTable::from_rows(
        vec!["name"],
        vec![
            vec![Some("Laura Daten".into())],
            vec![Some("Laura Datten".into())],
            vec![Some("Mark Speer".into())],
        ],
    )
    .unwrap();
    let right = DataTable::from_rows(
        vec!["name"],
        vec![vec![Some("Lara Daton".into())], vec![Some("Marc Spear".into())]],
    )
    .unwrap();

    let strict = link(
        &e,
        &left,
        &colspec,
        &right,
        &colspec,
        &MatchOptions::default(),
    )
    .unwrap();

    // Both Laura rows are blocked by their mutual threshold; only Mark links.
    assert_eq!(strict.matching.left(), &[2]);
    assert_eq!(strict.matching.right(), &[1]);

    let relaxed = link(
        &e,
        &left,
        &colspec,
        &right,
        &colspec,
        &MatchOptions::new().with_require_thresholds(false),
    )
    .unwrap();

    // Without threshold enforcement a Laura row claims its counterpart.
    assert_eq!(relaxed.matching.len(), 2);
    assert!(relaxed.matching.pairs().any(|(_, j)| j == 0));
    assert!(strict.matching.pairs().all(|(_, j)| j != 0));
}

/// Filters only ever shrink the result: every pair surviving a stronger
/// filter is present under the weaker one.
#[test]
fn stronger_filters_yield_subsets() {
    let colspec = vec![ColumnSpec::new("name", "name")];
    let e = embedder();
    let left = DataTable::from_rows(
        vec!["name"],
        vec![
            vec![Some("Laura Daten".into())],
            vec![Some("Kaspar Gorman".into())],
            vec![Some("Grete Knopf".into())],
        ],
    )
    .unwrap();
    let right = DataTable::from_rows(
        vec!["name"],
        vec![
            vec![Some("Laura Datten".into())],
            vec![Some("Greta Knopf".into())],
            vec![Some("Casper Goreman".into())],
        ],
    )
    .unwrap();

    let left_embedded = e.embed(&left, &colspec, true).unwrap();
    let right_embedded = e.embed(&right, &colspec, true).unwrap();
    let sim = bloomlink::compare(&e, &left_embedded, &right_embedded).unwrap();

    let weak = sim
        .matching(&MatchOptions::new().with_require_thresholds(false))
        .unwrap();
    let with_thresholds = sim.matching(&MatchOptions::default()).unwrap();
    let with_cutoff = sim
        .matching(&MatchOptions::new().with_abs_cutoff(0.6))
        .unwrap();

    let weak_pairs: Vec<_> = weak.pairs().collect();
    for pair in with_thresholds.pairs() {
        assert!(weak_pairs.contains(&pair));
    }
    for pair in with_cutoff.pairs() {
        assert!(weak_pairs.contains(&pair));
    }
}
