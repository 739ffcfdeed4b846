use getset::{CopyGetters, Getters};
use indexmap::IndexMap;

use crate::types::{Allele, GenotypeAllele, Info};

/// One data line of a VCF file, validated.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct VcfRecord {
    #[getset(get = "pub")]
    pub(crate) chrom: String,
    /// 1-based.
    #[getset(get_copy = "pub")]
    pub(crate) pos: u32,
    /// `None` when the ID column is `.`.
    #[getset(get = "pub")]
    pub(crate) id: Option<String>,
    #[getset(get = "pub")]
    pub(crate) ref_allele: String,
    #[getset(get = "pub")]
    pub(crate) alt_alleles: Vec<Allele>,
    #[getset(get_copy = "pub")]
    pub(crate) qual: Option<f32>,
    #[getset(get = "pub")]
    pub(crate) filter: String,
    #[getset(get = "pub")]
    pub(crate) info: Info,
    /// One entry per header sample, in header order.
    #[getset(get = "pub")]
    pub(crate) samples: Vec<Sample>,
}

impl VcfRecord {
    /// Alleles in index order: REF first, then ALT.
    pub fn alleles(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.ref_allele.as_str()).chain(self.alt_alleles.iter().map(Allele::as_str))
    }

    /// Resolves a genotype index to its allele string.
    pub fn allele(&self, index: u32) -> Option<&str> {
        self.alleles().nth(index as usize)
    }
}

/// A sample's column on one data line.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Sample {
    pub(crate) name: String,
    /// `GT`, if the FORMAT column lists it.
    pub(crate) genotype: Option<Vec<GenotypeAllele>>,
    /// Every other FORMAT field, by tag.
    pub(crate) fields: IndexMap<String, String>,
}

impl Sample {
    /// Number of chromosome copies called, zero without a genotype.
    pub fn ploidy(&self) -> usize {
        self.genotype.as_ref().map_or(0, Vec::len)
    }
}
