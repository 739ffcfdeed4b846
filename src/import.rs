//! Loading VCF files into a [`Database`].

use std::io::{BufRead, Read};
use std::path::Path;

use tracing::{info, warn};

use crate::database::{Database, Table};
use crate::error::{Error, ParseError, Result};
use crate::grammar::VcfGrammar;
use crate::reader::Records;

/// Records of a VCF source, validated line by line.
pub type VcfRecords<R> = Records<VcfGrammar, R>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Import even if the store already holds variant data.
    pub append: bool,
    /// Abort on the first rejected data line instead of skipping it.
    pub strict: bool,
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportSummary {
    /// Records written to the store.
    pub records: usize,
    /// Data lines that were rejected and skipped.
    pub skipped: Vec<ParseError>,
}

/// Imports the VCF (or gzipped VCF) file at `path` into the store at `database`.
///
/// ```
/// use gemma_vcf::{import_vcf, ImportOptions};
///
/// let dir = tempfile::tempdir()?;
/// let db = dir.path().join("gemma.db");
/// let summary = import_vcf("resources/sample.vcf", &db, &ImportOptions::default())?;
/// assert_eq!(summary.records, 3);
/// assert!(summary.skipped.is_empty());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn import_vcf<P: AsRef<Path>, D: AsRef<Path>>(
    path: P,
    database: D,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let mut db = Database::open(database)?;
    check_destination(&db, options)?;
    let records = VcfRecords::from_path(path, VcfGrammar::new())?;
    let summary = import_records(records, &mut db, options)?;
    db.close()?;
    Ok(summary)
}

/// Like [`import_vcf`], reading uncompressed VCF text from `reader`.
pub fn import_vcf_stream<R: Read, D: AsRef<Path>>(
    reader: R,
    database: D,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let mut db = Database::open(database)?;
    check_destination(&db, options)?;
    let records = VcfRecords::from_reader(reader, VcfGrammar::new());
    let summary = import_records(records, &mut db, options)?;
    db.close()?;
    Ok(summary)
}

/// Unless appending, the store must not hold any variant data yet.
fn check_destination(db: &Database, options: &ImportOptions) -> Result<()> {
    if options.append {
        return Ok(());
    }
    if db.is_empty(Table::Variants)? && db.is_empty(Table::Alternates)? {
        Ok(())
    } else {
        Err(Error::AlreadyImported)
    }
}

/// Writes every record to `db`, one transaction per record.
///
/// Rejected data lines are logged and collected, unless `options.strict` is
/// set. Any other error stops the import; records written before it stay.
pub fn import_records<R: BufRead>(
    mut records: VcfRecords<R>,
    db: &mut Database,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    info!(path = records.path(), append = options.append, "importing VCF");
    let mut summary = ImportSummary::default();
    for record in records.by_ref() {
        match record {
            Ok(record) => {
                db.insert_variant_call(&record)?;
                summary.records += 1;
            }
            Err(Error::Parse(err)) if !err.is_fatal() && !options.strict => {
                warn!(path = %err.path, line = err.line_number, "skipping line: {}", err.message);
                summary.skipped.push(err);
            }
            Err(err) => return Err(err),
        }
    }
    info!(
        path = records.path(),
        records = summary.records,
        skipped = summary.skipped.len(),
        samples = records.grammar().header().map_or(0, |h| h.samples().len()),
        "VCF import finished"
    );
    Ok(summary)
}
