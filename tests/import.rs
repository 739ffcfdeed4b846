use std::fs;
use std::path::{Path, PathBuf};

use gemma_vcf::database::StoredAllele;
use gemma_vcf::{import_vcf, import_vcf_stream, Database, Error, ImportOptions, Table};
use tempfile::TempDir;

fn store() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gemma.db");
    (dir, path)
}

fn import(vcf: &str, db: &Path) -> gemma_vcf::Result<usize> {
    import_vcf(vcf, db, &ImportOptions::default()).map(|summary| summary.records)
}

fn append() -> ImportOptions {
    ImportOptions {
        append: true,
        ..Default::default()
    }
}

fn site(db: &Database, sample: &str, chrom: &str, pos: u32) -> Vec<Option<String>> {
    db.site(sample, chrom, pos).unwrap().unwrap()
}

fn called(alleles: &[&str]) -> Vec<Option<String>> {
    alleles.iter().map(|a| Some(a.to_string())).collect()
}

#[test]
fn valid_files_import_three_records() {
    for name in &[
        "sample.vcf",
        "sample.vcf.gz",
        "orthogonal.vcf",
        "orthogonal.gz",
        "no_samples.vcf",
        "only_mandatory.vcf",
    ] {
        let (_dir, db) = store();
        let summary = import_vcf(
            Path::new("resources").join(name),
            &db,
            &ImportOptions::default(),
        )
        .unwrap();
        assert_eq!(summary.records, 3, "{}", name);
        assert!(summary.skipped.is_empty(), "{}", name);
    }
}

#[test]
fn sample_rows() {
    let (_dir, path) = store();
    assert_eq!(import("resources/sample.vcf", &path).unwrap(), 3);

    let db = Database::open(&path).unwrap();
    assert_eq!(db.count(Table::Alternates).unwrap(), 9);
    assert_eq!(db.count(Table::Variants).unwrap(), 12);
    assert_eq!(db.samples().unwrap(), ["SAMPLE_A", "SAMPLE_B"]);
    assert_eq!(db.chromosomes().unwrap(), ["scaffold_1", "scaffold_2"]);

    assert_eq!(site(&db, "SAMPLE_A", "scaffold_1", 672), called(&["CAA", "CAA"]));
    assert_eq!(
        site(&db, "SAMPLE_B", "scaffold_1", 672),
        vec![Some("*".to_string()), None]
    );
    assert_eq!(site(&db, "SAMPLE_A", "scaffold_1", 5607), called(&["G", "C"]));
    assert_eq!(site(&db, "SAMPLE_B", "scaffold_1", 5607), called(&["G", "T"]));
    assert_eq!(
        site(&db, "SAMPLE_A", "scaffold_2", 2911),
        called(&["ATACTCGGTA", "ATACTCGGTA"])
    );
    assert_eq!(
        site(&db, "SAMPLE_B", "scaffold_2", 2911),
        called(&["AT", "ATACTCGGTA"])
    );

    assert_eq!(
        db.alternates_at("scaffold_1", 672).unwrap(),
        vec![
            StoredAllele { id: 0, allele: "CAAA".into(), snp: false },
            StoredAllele { id: 1, allele: "CAA".into(), snp: false },
            StoredAllele { id: 2, allele: "*".into(), snp: false },
        ]
    );
    let snps = db
        .alternates_at("scaffold_1", 5607)
        .unwrap()
        .into_iter()
        .map(|a| a.snp)
        .collect::<Vec<_>>();
    assert_eq!(snps, [false, true, true]);
}

#[test]
fn files_without_samples_store_no_calls() {
    for name in &["resources/no_samples.vcf", "resources/only_mandatory.vcf"] {
        let (_dir, path) = store();
        import(name, &path).unwrap();
        let db = Database::open(&path).unwrap();
        assert_eq!(db.count(Table::Alternates).unwrap(), 9, "{}", name);
        assert!(db.is_empty(Table::Variants).unwrap(), "{}", name);
    }
}

#[test]
fn second_import_is_refused() {
    let (_dir, path) = store();
    import("resources/sample.vcf", &path).unwrap();
    let err = import("resources/sample.vcf", &path).unwrap_err();
    assert!(matches!(err, Error::AlreadyImported));
    assert!(err.to_string().contains("already been imported"));

    // Also refused for new data, without touching the store.
    let err = import("resources/orthogonal.vcf", &path).unwrap_err();
    assert!(matches!(err, Error::AlreadyImported));
    let db = Database::open(&path).unwrap();
    assert_eq!(db.count(Table::Alternates).unwrap(), 9);
    assert_eq!(db.site("SAMPLE_A", "scaffold_1", 8632).unwrap(), None);
}

#[test]
fn refused_even_if_only_alternates_exist() {
    let (_dir, path) = store();
    import("resources/only_mandatory.vcf", &path).unwrap();
    let err = import("resources/orthogonal.vcf", &path).unwrap_err();
    assert!(matches!(err, Error::AlreadyImported));
}

#[test]
fn appending_the_same_file_is_a_duplicate_entry() {
    let (_dir, path) = store();
    import("resources/sample.vcf", &path).unwrap();
    let err = import_vcf("resources/sample.vcf", &path, &append()).unwrap_err();
    assert!(matches!(err, Error::DuplicateEntry(_)), "{:?}", err);

    let db = Database::open(&path).unwrap();
    assert_eq!(db.count(Table::Alternates).unwrap(), 9);
    assert_eq!(db.count(Table::Variants).unwrap(), 12);
}

#[test]
fn appending_an_orthogonal_file() {
    let (_dir, path) = store();
    import("resources/sample.vcf", &path).unwrap();
    let summary = import_vcf("resources/orthogonal.vcf", &path, &append()).unwrap();
    assert_eq!(summary.records, 3);

    let db = Database::open(&path).unwrap();
    assert_eq!(db.count(Table::Alternates).unwrap(), 18);
    assert_eq!(db.count(Table::Variants).unwrap(), 24);
    assert_eq!(site(&db, "SAMPLE_A", "scaffold_1", 8632), called(&["G", "A"]));
    assert_eq!(site(&db, "SAMPLE_B", "scaffold_1", 87632), called(&["GTG", "CTG"]));
    assert_eq!(site(&db, "SAMPLE_B", "scaffold_2", 9737), called(&["*", "*"]));
    assert_eq!(site(&db, "SAMPLE_A", "scaffold_1", 5607), called(&["G", "C"]));
}

#[test]
fn compressed_input_stores_the_same_rows() {
    let (_plain_dir, plain) = store();
    let (_gz_dir, gz) = store();
    import("resources/sample.vcf", &plain).unwrap();
    import("resources/sample.vcf.gz", &gz).unwrap();

    let plain = Database::open(&plain).unwrap();
    let gz = Database::open(&gz).unwrap();
    for &(chrom, pos) in &[("scaffold_1", 672), ("scaffold_1", 5607), ("scaffold_2", 2911)] {
        assert_eq!(
            plain.alternates_at(chrom, pos).unwrap(),
            gz.alternates_at(chrom, pos).unwrap()
        );
        for sample in &["SAMPLE_A", "SAMPLE_B"] {
            assert_eq!(
                plain.site(sample, chrom, pos).unwrap(),
                gz.site(sample, chrom, pos).unwrap()
            );
        }
    }
}

#[test]
fn stream_import() {
    let (_dir, path) = store();
    let file = fs::File::open("resources/orthogonal.vcf").unwrap();
    let summary = import_vcf_stream(file, &path, &ImportOptions::default()).unwrap();
    assert_eq!(summary.records, 3);
}

#[test]
fn unknown_suffix_is_rejected_before_reading() {
    let (_dir, path) = store();
    let err = import("resources/sample.bcf", &path).unwrap_err();
    assert!(matches!(err, Error::UnrecognizedExtension { .. }));
    let db = Database::open(&path).unwrap();
    assert!(db.is_empty(Table::Alternates).unwrap());
}

#[test]
fn ploidy_mismatch_skips_only_that_line() {
    let (_dir, path) = store();
    let summary = import_vcf("resources/ploidy_mismatch.vcf", &path, &ImportOptions::default())
        .unwrap();
    assert_eq!(summary.records, 2);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].line_number, 4);
    assert!(summary.skipped[0].message.contains("ploidy"));

    let db = Database::open(&path).unwrap();
    assert_eq!(site(&db, "SAMPLE_A", "scaffold_1", 300), called(&["A", "T"]));
    assert_eq!(db.site("SAMPLE_A", "scaffold_1", 200).unwrap(), None);
    assert!(db.alternates_at("scaffold_1", 200).unwrap().is_empty());
}

#[test]
fn strict_import_stops_at_the_rejected_line() {
    let (_dir, path) = store();
    let options = ImportOptions {
        strict: true,
        ..Default::default()
    };
    let err = import_vcf("resources/ploidy_mismatch.vcf", &path, &options).unwrap_err();
    match err {
        Error::Parse(err) => {
            assert!(!err.is_fatal());
            assert_eq!(err.line_number, 4);
            assert_eq!(err.path, "resources/ploidy_mismatch.vcf");
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
    let db = Database::open(&path).unwrap();
    assert_eq!(db.count(Table::Alternates).unwrap(), 2);
}

#[test]
fn invalid_files_are_rejected() {
    for entry in fs::read_dir("resources/invalid").unwrap() {
        let vcf = entry.unwrap().path();
        let (_dir, path) = store();
        let result = import_vcf(
            &vcf,
            &path,
            &ImportOptions {
                strict: true,
                ..Default::default()
            },
        );
        assert!(
            matches!(result, Err(Error::Parse(_))),
            "{}: {:?}",
            vcf.display(),
            result
        );
    }
}

#[test]
fn fatal_errors_keep_committed_records() {
    let (_dir, path) = store();
    let err = import("resources/invalid/double_header.vcf", &path).unwrap_err();
    match &err {
        Error::Parse(e) => {
            assert!(e.is_fatal());
            assert_eq!(e.message, "multiple headers seen on lines 2 and 4");
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
    let db = Database::open(&path).unwrap();
    assert_eq!(db.count(Table::Alternates).unwrap(), 2);
    assert_eq!(db.site("SAMPLE_A", "scaffold_1", 200).unwrap(), None);
}
