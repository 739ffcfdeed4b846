use std::fmt;

use getset::Getters;
use indexmap::IndexMap;
use multimap::MultiMap;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The eight fixed columns every VCF header must name.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, AsRefStr, Display, EnumIter, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Column {
    Chrom,
    Pos,
    Id,
    Ref,
    Alt,
    Qual,
    Filter,
    Info,
}

/// Number of mandatory columns.
pub const MANDATORY_COLUMNS: usize = 8;

/// The ninth column, present whenever samples are.
pub const FORMAT_COLUMN: &str = "FORMAT";

pub const GENOTYPE_TAG: &str = "GT";

#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct Header {
    /// Value of the leading `##fileformat=` line.
    fileformat: String,
    /// Every other `##key=value` line, by key.
    meta: MultiMap<String, String>,
    columns: Vec<String>,
    #[getset(skip)]
    column_index: IndexMap<String, usize>,
    samples: Vec<String>,
}

impl Header {
    /// Assembles a header from already validated parts.
    pub(crate) fn new(
        fileformat: String,
        meta: MultiMap<String, String>,
        columns: Vec<String>,
    ) -> Self {
        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        let samples = columns.iter().skip(MANDATORY_COLUMNS + 1).cloned().collect();
        Header {
            fileformat,
            meta,
            columns,
            column_index,
            samples,
        }
    }

    /// Position of a named column in every data line.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    pub fn has_format(&self) -> bool {
        self.columns.len() > MANDATORY_COLUMNS
    }
}

/// One entry of ALT, or REF.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Allele {
    Bases(String),
    /// `*`: no allele here, e.g. because of an upstream deletion.
    NoCall,
}

pub(crate) const NO_CALL: &str = "*";

impl Allele {
    pub fn as_str(&self) -> &str {
        match self {
            Allele::Bases(b) => b,
            Allele::NoCall => NO_CALL,
        }
    }

    /// Exactly one nucleotide letter.
    pub fn is_snp(&self) -> bool {
        match self {
            Allele::Bases(b) => b.len() == 1 && is_nucleotides(b),
            Allele::NoCall => false,
        }
    }
}

impl From<&str> for Allele {
    fn from(s: &str) -> Self {
        if s == NO_CALL {
            Allele::NoCall
        } else {
            Allele::Bases(s.to_owned())
        }
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-empty and only `A`, `C`, `G`, `T` in either case.
pub(crate) fn is_nucleotides(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T'))
}

/// Phased or unphased alleles, represented as indices into `[REF, ALT...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenotypeAllele {
    Unphased(u32),
    Phased(u32),
    UnphasedMissing,
    PhasedMissing,
}

impl GenotypeAllele {
    pub(crate) fn new(index: Option<u32>, phased: bool) -> Self {
        match (index, phased) {
            (Some(i), false) => GenotypeAllele::Unphased(i),
            (Some(i), true) => GenotypeAllele::Phased(i),
            (None, false) => GenotypeAllele::UnphasedMissing,
            (None, true) => GenotypeAllele::PhasedMissing,
        }
    }

    /// Get the index into the list of alleles.
    pub fn index(self) -> Option<u32> {
        match self {
            GenotypeAllele::Unphased(i) | GenotypeAllele::Phased(i) => Some(i),
            GenotypeAllele::UnphasedMissing | GenotypeAllele::PhasedMissing => None,
        }
    }

    pub fn is_phased(self) -> bool {
        matches!(
            self,
            GenotypeAllele::Phased(_) | GenotypeAllele::PhasedMissing
        )
    }
}

/// INFO column: `key=value` pairs and bare flags, in file order.
#[derive(Debug, Clone, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Info {
    values: IndexMap<String, String>,
    flags: Vec<String>,
}

impl Info {
    pub(crate) fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_owned(), value.to_owned());
    }

    pub(crate) fn push_flag(&mut self, flag: &str) {
        self.flags.push(flag.to_owned());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.flags.is_empty()
    }
}
