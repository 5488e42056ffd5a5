//! Reference contig table.
//!
//! Loading an index is the aligner's business; the core only needs the
//! ordered contig list and lookups by position and by name. Alignments name
//! their contig with a [`ContigId`] into this table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{RapiError, Result};

/// Index into [`ReferenceIndex`]'s contig table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContigId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contig {
    pub name: String,
    pub len: u64,
    pub assembly_identifier: Option<String>,
    pub species: Option<String>,
    pub uri: Option<String>,
    pub md5: Option<String>,
}

impl Contig {
    pub fn new(name: impl Into<String>, len: u64) -> Self {
        Self {
            name: name.into(),
            len,
            assembly_identifier: None,
            species: None,
            uri: None,
            md5: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    path: PathBuf,
    contigs: Vec<Contig>,
    by_name: HashMap<String, ContigId>,
}

impl ReferenceIndex {
    pub fn new(path: impl AsRef<Path>, contigs: Vec<Contig>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(contigs.len());
        for (i, c) in contigs.iter().enumerate() {
            if c.name.is_empty() {
                return Err(RapiError::param(format!("contig {i} has an empty name")));
            }
            if by_name.insert(c.name.clone(), ContigId(i)).is_some() {
                return Err(RapiError::param(format!(
                    "duplicate contig name '{}'",
                    c.name
                )));
            }
        }
        log::debug!(
            "Reference {} with {} contigs",
            path.as_ref().display(),
            contigs.len()
        );
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            contigs,
            by_name,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    pub fn contig(&self, id: ContigId) -> Option<&Contig> {
        self.contigs.get(id.0)
    }

    pub fn id_of(&self, name: &str) -> Option<ContigId> {
        self.by_name.get(name).copied()
    }

    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContigId, &Contig)> {
        self.contigs.iter().enumerate().map(|(i, c)| (ContigId(i), c))
    }
}
