//! Streaming import of VCF variant calls into a SQLite store.
//!
//! ```
//! use gemma_vcf::{VcfGrammar, VcfRecords};
//!
//! let records = VcfRecords::from_path("resources/sample.vcf", VcfGrammar::new())?;
//! let positions = records
//!     .map(|record| record.map(|r| r.pos()))
//!     .collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(positions, [672, 5607, 2911]);
//! # Ok::<(), gemma_vcf::Error>(())
//! ```

pub mod database;
pub mod error;
pub mod grammar;
pub mod import;
pub(crate) mod parser;
pub mod reader;
pub mod record;
pub mod source;
pub mod types;

pub use database::{Database, Table};
pub use error::{Error, ParseError, Result};
pub use grammar::VcfGrammar;
pub use import::{import_records, import_vcf, import_vcf_stream, ImportOptions, ImportSummary, VcfRecords};
pub use reader::{Grammar, Records};
pub use record::{Sample, VcfRecord};
