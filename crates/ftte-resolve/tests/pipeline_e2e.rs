//! End-to-end runs over a synthetic inventory ZIP.

use std::io::Write;
use std::path::PathBuf;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use ftte_resolve::{run, ResolveError, RunOptions};

const CASSETTES: &str = "\u{feff}cs_code;cs_type;cs_bp_code\n\
    C1;E;\n\
    C2;E;   \n\
    C3;E;BP9\n\
    C4;T;\n";

const CABLES: &str = "cb_code;cb_typelog;cb_etiquet;cb_nd1;cb_nd2\n\
    CB1;TR;TR-0001;ND7;ND8\n\
    CB2;DI;DI-0002;PE01;ND9\n\
    CB3;DI;DI-0003;ND5;ND6\n\
    CB4;DI;DI-0004;ND4;PE77\n";

const FIBERS: &str = "fo_code;fo_cb_code\n\
    F1;CB1\n\
    F2;CB2\n\
    F3;CB3\n\
    F4;CB4\n\
    F5;UNKNOWN_CABLE\n";

const SITES: &str = "st_nd_code;st_code\nPE01;S1\n";

const LOCALS: &str = "lc_typelog;lc_st_code;lc_code;lc_etiquet\n\
    SRO;S1;PM1;Local PM1\n\
    NRO;S1;X1;Not a PM\n";

const POSITIONS: &str = "ps_cs_code;ps_1;ps_2\n\
    C1;F1;F2\n\
    C2;F2;F1\n\
    C1;F2;F3\n\
    C1;F1;F4\n\
    C1;F1;F5\n\
    C3;F1;F2\n\
    C4;F1;F2\n";

fn write_archive(dir: &std::path::Path, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("export.zip");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, body) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}

fn default_entries() -> Vec<(&'static str, &'static str)> {
    vec![
        ("t_cassette.csv", CASSETTES),
        ("t_cable.csv", CABLES),
        ("t_fibre.csv", FIBERS),
        ("t_site.csv", SITES),
        ("t_local.csv", LOCALS),
        ("t_position.csv", POSITIONS),
    ]
}

#[test]
fn resolves_eligible_positions_and_counts_rejections() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(dir.path(), &default_entries());

    let summary = run(
        &archive,
        &RunOptions {
            debug: false,
            out_dir: dir.path().to_path_buf(),
        },
    )
    .unwrap();

    // C1/F1+F2 and C2/F2+F1 resolve; the whitespace-only base port of C2
    // still counts as eligible.
    assert_eq!(summary.load.eligible_cassettes, 2);
    assert_eq!(summary.load.fibers_indexed, 4);
    assert_eq!(summary.stats.positions_seen, 7);
    assert_eq!(summary.stats.resolved, 2);
    assert_eq!(summary.stats.not_tr_di_pair, 1); // C1/F2+F3 is DI-DI
    assert_eq!(summary.stats.site_not_found, 1); // PE77 has no site row
    assert_eq!(summary.stats.fiber_not_found, 1); // F5's cable is unknown
    assert_eq!(summary.stats.local_not_found, 0);
    assert_eq!(summary.stats.rejections(), 3);
    assert!(summary.diagnostics_path.is_none());

    let body = std::fs::read_to_string(&summary.result_path).unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Cassette FTTE;Fibre Transport;Cable Transport;Fibre Distribution;Cable Distribution;Noeud PE;Site;Local PM;Etiquette PM",
            "C1;F1;TR-0001;F2;DI-0002;PE01;S1;PM1;Local PM1",
            "C2;F1;TR-0001;F2;DI-0002;PE01;S1;PM1;Local PM1",
        ]
    );
    assert!(summary
        .result_path
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("ftte_results_"));
    assert_eq!(summary.result_bytes, body.len() as u64);
}

#[test]
fn rerun_produces_identical_rows() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(dir.path(), &default_entries());
    let options = RunOptions {
        debug: false,
        out_dir: dir.path().to_path_buf(),
    };

    let first = run(&archive, &options).unwrap();
    let second = run(&archive, &options).unwrap();
    let body_1 = std::fs::read_to_string(&first.result_path).unwrap();
    let body_2 = std::fs::read_to_string(&second.result_path).unwrap();
    assert_eq!(body_1, body_2);
}

#[test]
fn debug_mode_writes_the_anomaly_report() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(dir.path(), &default_entries());

    let summary = run(
        &archive,
        &RunOptions {
            debug: true,
            out_dir: dir.path().to_path_buf(),
        },
    )
    .unwrap();

    assert!(summary
        .result_path
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("ftte_debug_"));
    assert_eq!(summary.cassettes_with_positions, Some(2));
    assert_eq!(summary.distinct_pms, Some(1));

    let report_path = summary.diagnostics_path.unwrap();
    let report = std::fs::read_to_string(report_path).unwrap();
    // PM1 received both C1 and C2, which the report flags.
    assert!(report.contains("PM PM1: 2 cassettes - C1, C2"));
    assert!(report.contains("Cassette C1"));
    assert!(report.contains("not a TR/DI pair: DI-DI"));
    assert!(report.contains("site not found for node PE77"));
    assert!(report.contains("fiber 2 F5 not found"));
    assert!(report.contains("Total positions processed: 7"));
    assert!(report.contains("Distinct PMs found: 1"));
}

#[test]
fn latin1_table_bytes_are_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = default_entries();
    entries.retain(|(name, _)| *name != "t_local.csv");
    let path = dir.path().join("export.zip");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, body) in &entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer
        .start_file("t_local.csv", SimpleFileOptions::default())
        .unwrap();
    // "Pièce PM1" encoded as Latin-1: invalid as UTF-8.
    writer
        .write_all(b"lc_typelog;lc_st_code;lc_code;lc_etiquet\nSRO;S1;PM1;Pi\xE8ce PM1\n")
        .unwrap();
    writer.finish().unwrap();

    let summary = run(
        &path,
        &RunOptions {
            debug: false,
            out_dir: dir.path().to_path_buf(),
        },
    )
    .unwrap();
    let body = std::fs::read_to_string(&summary.result_path).unwrap();
    assert!(body.contains("PM1;Pi\u{e8}ce PM1"));
}

#[test]
fn missing_table_fails_before_any_processing() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = default_entries();
    entries.retain(|(name, _)| *name != "t_fibre.csv");
    let archive = write_archive(dir.path(), &entries);

    let err = run(&archive, &RunOptions::default()).unwrap_err();
    match err {
        ResolveError::Table(ftte_resolve::TableError::MissingTable(name)) => {
            assert_eq!(name, "t_fibre.csv")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_eligible_cassettes_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = default_entries();
    entries[0] = ("t_cassette.csv", "cs_code;cs_type;cs_bp_code\nC1;T;\n");
    let archive = write_archive(dir.path(), &entries);

    let err = run(
        &archive,
        &RunOptions {
            debug: false,
            out_dir: dir.path().to_path_buf(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ResolveError::NoEligibleCassettes));
}

#[test]
fn empty_cassette_table_is_a_fatal_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = default_entries();
    entries[0] = ("t_cassette.csv", "");
    let archive = write_archive(dir.path(), &entries);

    let err = run(
        &archive,
        &RunOptions {
            debug: false,
            out_dir: dir.path().to_path_buf(),
        },
    )
    .unwrap_err();
    match err {
        ResolveError::Table(ftte_resolve::TableError::EmptyTable(name)) => {
            assert_eq!(name, "t_cassette.csv")
        }
        other => panic!("unexpected error: {other}"),
    }
}
