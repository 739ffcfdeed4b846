//! SQLite store for imported variant calls.
//!
//! Schema:
//! - alternates: every allele of a site, id 0 being the reference
//! - variants: the allele id each sample carries on each chromosome copy

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use strum::{AsRefStr, Display, EnumIter};
use tracing::debug;

use crate::error::Result;
use crate::record::VcfRecord;

const PRAGMAS: &str = "
PRAGMA synchronous = OFF;
PRAGMA journal_mode = MEMORY;
PRAGMA foreign_keys = ON;
";

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS alternates (
    AlternateID INTEGER NOT NULL,
    Chromosome TEXT NOT NULL,
    Position INTEGER NOT NULL,
    Alternate TEXT NOT NULL,
    SNP INTEGER NOT NULL,
    PRIMARY KEY (AlternateID, Chromosome, Position)
);

CREATE TABLE IF NOT EXISTS variants (
    SampleID TEXT NOT NULL,
    Chromosome TEXT NOT NULL,
    Position INTEGER NOT NULL,
    ChromosomeCopy INTEGER NOT NULL,
    AlternateID INTEGER,
    PRIMARY KEY (SampleID, Chromosome, Position, ChromosomeCopy),
    FOREIGN KEY (AlternateID, Chromosome, Position)
        REFERENCES alternates (AlternateID, Chromosome, Position)
);
";

const INSERT_ALTERNATE: &str = "INSERT INTO alternates (AlternateID, Chromosome, Position, Alternate, SNP) VALUES (?1, ?2, ?3, ?4, ?5)";

const INSERT_VARIANT: &str = "INSERT INTO variants (SampleID, Chromosome, Position, ChromosomeCopy, AlternateID) VALUES (?1, ?2, ?3, ?4, ?5)";

#[derive(Debug, Clone, Copy, Eq, PartialEq, AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Table {
    Alternates,
    Variants,
}

/// One row of `alternates`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAllele {
    /// 0 for the reference, otherwise the 1-based ALT position.
    pub id: u32,
    pub allele: String,
    pub snp: bool,
}

/// Connection to a variant store, schema created on open.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening variant store");
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }

    pub fn count(&self, table: Table) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as u64)
    }

    pub fn is_empty(&self, table: Table) -> Result<bool> {
        Ok(self.count(table)? == 0)
    }

    /// Writes a record's alleles and calls in one transaction.
    ///
    /// Alleles go in first so every call has its allele row. On error nothing
    /// of this record is kept.
    pub fn insert_variant_call(&mut self, record: &VcfRecord) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut alternates = tx.prepare_cached(INSERT_ALTERNATE)?;
            alternates.execute(params![
                0u32,
                record.chrom(),
                record.pos(),
                record.ref_allele(),
                false
            ])?;
            for (i, alt) in record.alt_alleles().iter().enumerate() {
                alternates.execute(params![
                    i as u32 + 1,
                    record.chrom(),
                    record.pos(),
                    alt.as_str(),
                    alt.is_snp()
                ])?;
            }

            let mut variants = tx.prepare_cached(INSERT_VARIANT)?;
            for sample in record.samples() {
                let genotype = match sample.genotype() {
                    Some(genotype) => genotype,
                    None => continue,
                };
                for (copy, allele) in genotype.iter().enumerate() {
                    variants.execute(params![
                        sample.name(),
                        record.chrom(),
                        record.pos(),
                        copy as u32 + 1,
                        allele.index()
                    ])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Distinct sample names with at least one stored call.
    pub fn samples(&self) -> Result<Vec<String>> {
        self.distinct("SampleID", Table::Variants)
    }

    pub fn chromosomes(&self) -> Result<Vec<String>> {
        self.distinct("Chromosome", Table::Alternates)
    }

    fn distinct(&self, column: &str, table: Table) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {0} FROM {1} ORDER BY {0}",
            column, table
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Alleles stored for a site, reference first.
    pub fn alternates_at(&self, chrom: &str, pos: u32) -> Result<Vec<StoredAllele>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT AlternateID, Alternate, SNP FROM alternates
             WHERE Chromosome = ?1 AND Position = ?2 ORDER BY AlternateID",
        )?;
        let rows = stmt.query_map(params![chrom, pos], |row| {
            Ok(StoredAllele {
                id: row.get(0)?,
                allele: row.get(1)?,
                snp: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// The allele a sample carries on each chromosome copy of a site.
    ///
    /// Copies are in order; a missing call is `None`. Returns `None` if the
    /// sample has no calls at the site.
    pub fn site(&self, sample: &str, chrom: &str, pos: u32) -> Result<Option<Vec<Option<String>>>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT v.ChromosomeCopy, a.Alternate FROM variants v
             LEFT JOIN alternates a
               ON a.AlternateID = v.AlternateID
              AND a.Chromosome = v.Chromosome
              AND a.Position = v.Position
             WHERE v.SampleID = ?1 AND v.Chromosome = ?2 AND v.Position = ?3
             ORDER BY v.ChromosomeCopy",
        )?;
        let alleles = stmt
            .query_map(params![sample, chrom, pos], |row| row.get::<_, Option<String>>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(if alleles.is_empty() {
            None
        } else {
            Some(alleles)
        })
    }

    /// The stored allele id of one copy, `Some(None)` for a missing call.
    pub fn call(
        &self,
        sample: &str,
        chrom: &str,
        pos: u32,
        copy: u32,
    ) -> Result<Option<Option<u32>>> {
        Ok(self
            .conn
            .query_row(
                "SELECT AlternateID FROM variants
                 WHERE SampleID = ?1 AND Chromosome = ?2 AND Position = ?3 AND ChromosomeCopy = ?4",
                params![sample, chrom, pos, copy],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Closes the connection, reporting any error the drop would swallow.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}
