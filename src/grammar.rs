//! The VCF grammar: which lines may appear where, and what makes a data line valid.
//!
//! Lines move the grammar through three states. The first line must be
//! `##fileformat=...`; `##` meta lines may follow; exactly one `#` column header
//! switches to data lines. Anything wrong with the first two kinds of line is
//! fatal, since no data line could be read against them. Data lines are checked
//! one at a time and a bad one is only rejected.

use std::mem;

use indexmap::IndexMap;
use itertools::Itertools;
use multimap::MultiMap;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::error::GrammarError;
use crate::parser::{self, MISSING};
use crate::reader::Grammar;
use crate::record::{Sample, VcfRecord};
use crate::types::{
    is_nucleotides, Allele, Column, GenotypeAllele, Header, Info, FORMAT_COLUMN, GENOTYPE_TAG,
    MANDATORY_COLUMNS,
};

type Checked<T> = Result<T, GrammarError>;

#[derive(Debug)]
enum State {
    AwaitingFormat,
    AwaitingHeader {
        fileformat: String,
        meta: MultiMap<String, String>,
    },
    ReadingData(DataState),
    /// A fatal error was reported; no further line is accepted.
    Halted,
}

#[derive(Debug)]
struct DataState {
    header: Header,
    header_line: usize,
    /// Fixed by the first genotype in the stream.
    ploidy: Option<usize>,
}

#[derive(Debug)]
pub struct VcfGrammar {
    state: State,
}

impl Default for VcfGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl VcfGrammar {
    pub fn new() -> Self {
        VcfGrammar {
            state: State::AwaitingFormat,
        }
    }

    /// The `##fileformat=` value, once line 1 has been read.
    pub fn fileformat(&self) -> Option<&str> {
        match &self.state {
            State::AwaitingHeader { fileformat, .. } => Some(fileformat),
            State::ReadingData(data) => Some(data.header.fileformat()),
            State::AwaitingFormat | State::Halted => None,
        }
    }

    pub fn header(&self) -> Option<&Header> {
        match &self.state {
            State::ReadingData(data) => Some(&data.header),
            _ => None,
        }
    }

    /// Allele count per genotype, once a genotype has been seen.
    pub fn ploidy(&self) -> Option<usize> {
        match &self.state {
            State::ReadingData(data) => data.ploidy,
            _ => None,
        }
    }
}

impl Grammar for VcfGrammar {
    type Record = VcfRecord;
    const EXTENSION: &'static str = ".vcf";

    fn line(&mut self, number: usize, line: &str) -> Checked<Option<VcfRecord>> {
        // Fatal errors leave the state at `Halted`.
        let (next, result) = match mem::replace(&mut self.state, State::Halted) {
            State::AwaitingFormat => match parser::fileformat(line) {
                Ok((_, fileformat)) => (
                    State::AwaitingHeader {
                        fileformat: fileformat.to_owned(),
                        meta: MultiMap::new(),
                    },
                    Ok(None),
                ),
                Err(_) => (
                    State::Halted,
                    Err(GrammarError::fatal("invalid file format line")),
                ),
            },
            State::AwaitingHeader {
                fileformat,
                mut meta,
            } => {
                if line.starts_with("##") {
                    if let Ok((_, (key, value))) = parser::meta_line(line) {
                        meta.insert(key.to_owned(), value.to_owned());
                    }
                    (State::AwaitingHeader { fileformat, meta }, Ok(None))
                } else if let Some(columns) = line.strip_prefix('#') {
                    match header(fileformat, meta, columns) {
                        Ok(header) => {
                            debug!(
                                columns = header.columns().len(),
                                samples = header.samples().len(),
                                line = number,
                                "parsed VCF header"
                            );
                            let data = DataState {
                                header,
                                header_line: number,
                                ploidy: None,
                            };
                            (State::ReadingData(data), Ok(None))
                        }
                        Err(err) => (State::Halted, Err(err)),
                    }
                } else {
                    (
                        State::Halted,
                        Err(GrammarError::fatal("data line seen before the header line")),
                    )
                }
            }
            State::ReadingData(mut data) => {
                if line.starts_with("##") {
                    (State::ReadingData(data), Ok(None))
                } else if line.starts_with('#') {
                    let message = format!(
                        "multiple headers seen on lines {} and {}",
                        data.header_line, number
                    );
                    (State::Halted, Err(GrammarError::fatal(message)))
                } else {
                    let result = data.record(line).map(Some);
                    (State::ReadingData(data), result)
                }
            }
            State::Halted => (
                State::Halted,
                Err(GrammarError::fatal("no lines are accepted after a fatal error")),
            ),
        };
        self.state = next;
        result
    }
}

/// Validates the `#CHROM ...` line (without its `#`).
fn header(
    fileformat: String,
    meta: MultiMap<String, String>,
    line: &str,
) -> Checked<Header> {
    let columns = line.split('\t').map(str::to_owned).collect_vec();
    if columns.len() < MANDATORY_COLUMNS {
        return Err(GrammarError::fatal(
            "missing at least one mandatory header column",
        ));
    }

    let fixed = &columns[..MANDATORY_COLUMNS];
    if !fixed.iter().all_unique() {
        return Err(GrammarError::fatal(
            "at least one mandatory header column is duplicated",
        ));
    }
    for column in Column::iter() {
        if !fixed.iter().any(|c| c == column.as_ref()) {
            return Err(GrammarError::fatal(format!(
                "the mandatory column {} is missing",
                column
            )));
        }
    }

    if let Some(format) = columns.get(MANDATORY_COLUMNS) {
        if format != FORMAT_COLUMN {
            return Err(GrammarError::fatal(format!(
                "expected ninth column to be '{}', got {}",
                FORMAT_COLUMN, format
            )));
        }
    }

    let samples = columns.iter().skip(MANDATORY_COLUMNS + 1);
    if let Some(name) = samples.duplicates().next() {
        return Err(GrammarError::fatal(format!(
            "at least one sample ID is duplicated: {}",
            name
        )));
    }
    // A sample named like a fixed column would shadow it in the name lookup.
    if let Some(name) = columns
        .iter()
        .skip(MANDATORY_COLUMNS + 1)
        .find(|name| fixed.contains(*name) || *name == FORMAT_COLUMN)
    {
        return Err(GrammarError::fatal(format!(
            "sample ID {} collides with a fixed column",
            name
        )));
    }

    Ok(Header::new(fileformat, meta, columns))
}

impl DataState {
    fn field<'a>(&self, fields: &[&'a str], column: Column) -> &'a str {
        // Every mandatory column is in the header and the field count was checked.
        self.header
            .index_of(column.as_ref())
            .and_then(|i| fields.get(i).copied())
            .unwrap_or(MISSING)
    }

    fn record(&mut self, line: &str) -> Checked<VcfRecord> {
        let fields = line.split('\t').collect_vec();
        let expected = self.header.columns().len();
        if fields.len() != expected {
            return Err(GrammarError::line(format!(
                "expected {} columns, got {}",
                expected,
                fields.len()
            )));
        }

        let pos = match parser::unsigned(self.field(&fields, Column::Pos)) {
            Some(pos) if pos >= 1 => pos,
            _ => {
                return Err(GrammarError::line(format!(
                    "position ({}) is not a positive integer",
                    self.field(&fields, Column::Pos)
                )))
            }
        };
        let qual = parser::quality(self.field(&fields, Column::Qual)).ok_or_else(|| {
            GrammarError::line(format!(
                "quality ({}) is not a number",
                self.field(&fields, Column::Qual)
            ))
        })?;

        let alt_alleles = self
            .field(&fields, Column::Alt)
            .split(',')
            .map(Allele::from)
            .collect_vec();
        let info = info(self.field(&fields, Column::Info))?;
        let samples = self.samples(&fields, alt_alleles.len())?;

        let ref_allele = self.field(&fields, Column::Ref);
        if !is_nucleotides(ref_allele) {
            return Err(GrammarError::line(format!(
                "reference ({}) has an invalid base",
                ref_allele
            )));
        }
        for (i, alt) in alt_alleles.iter().enumerate() {
            if let Allele::Bases(bases) = alt {
                if !is_nucleotides(bases) {
                    return Err(GrammarError::line(format!(
                        "alternate {} ({}) has an invalid base",
                        i, bases
                    )));
                }
            }
        }

        let id = self.field(&fields, Column::Id);
        Ok(VcfRecord {
            chrom: self.field(&fields, Column::Chrom).to_owned(),
            pos,
            id: if id == MISSING {
                None
            } else {
                Some(id.to_owned())
            },
            ref_allele: ref_allele.to_owned(),
            alt_alleles,
            qual,
            filter: self.field(&fields, Column::Filter).to_owned(),
            info,
            samples,
        })
    }

    fn samples(&mut self, fields: &[&str], alt_count: usize) -> Checked<Vec<Sample>> {
        let names = self.header.samples();
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let format_tags = fields[MANDATORY_COLUMNS].split(':').collect_vec();

        let mut samples = Vec::with_capacity(names.len());
        for (name, column) in names.iter().zip(&fields[MANDATORY_COLUMNS + 1..]) {
            let parts = column.split(':').collect_vec();
            if parts.len() != format_tags.len() {
                return Err(GrammarError::line(format!(
                    "parts for sample \"{}\" inconsistent with expected format",
                    name
                )));
            }

            let mut genotype = None;
            let mut sample_fields = IndexMap::new();
            for (&tag, &part) in format_tags.iter().zip(&parts) {
                if tag == GENOTYPE_TAG {
                    genotype = Some(genotype_alleles(&mut self.ploidy, name, part, alt_count)?);
                } else {
                    sample_fields.insert(tag.to_owned(), part.to_owned());
                }
            }
            samples.push(Sample {
                name: name.clone(),
                genotype,
                fields: sample_fields,
            });
        }
        Ok(samples)
    }
}

/// Parses one GT value, fixing the stream's ploidy if this is the first one.
fn genotype_alleles(
    ploidy: &mut Option<usize>,
    name: &str,
    gt: &str,
    alt_count: usize,
) -> Checked<Vec<GenotypeAllele>> {
    let alleles = match parser::genotype(gt) {
        Ok((_, alleles)) => alleles,
        Err(_) => {
            return Err(GrammarError::line(format!(
                "sample {} has a malformed genotype ({})",
                name, gt
            )))
        }
    };
    if alleles
        .iter()
        .filter_map(|a| a.index())
        .any(|i| i as usize > alt_count)
    {
        return Err(GrammarError::line(format!(
            "sample {} has a genotype out of range",
            name
        )));
    }
    match *ploidy {
        None => *ploidy = Some(alleles.len()),
        Some(ploidy) if ploidy != alleles.len() => {
            return Err(GrammarError::line(format!(
                "sample {} has unexpected ploidy {} expected {} based on preceding samples",
                name,
                alleles.len(),
                ploidy
            )))
        }
        Some(_) => {}
    }
    Ok(alleles)
}

/// `key=value;FLAG;...`, with `.` for an empty column.
fn info(column: &str) -> Checked<Info> {
    let mut info = Info::default();
    if column == MISSING {
        return Ok(info);
    }
    for entry in column.split(';').filter(|entry| !entry.is_empty()) {
        let mut parts = entry.split('=');
        let key = parts.next().unwrap_or_default();
        let value = parts.next();
        if parts.next().is_some() {
            return Err(GrammarError::line(
                "illformed info field, possibly missing a semicolon",
            ));
        }
        match value {
            Some(value) if !value.is_empty() => info.insert(key, value),
            _ => info.push_flag(key),
        }
    }
    Ok(info)
}
