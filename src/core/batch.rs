//! Rectangular batch of reads: `n_fragments` rows of `reads_per_fragment`.

use crate::core::read::Read;
use crate::error::{RapiError, Result};

#[derive(Debug, Clone)]
pub struct ReadBatch {
    reads_per_fragment: usize,
    n_fragments: usize,
    reads: Vec<Read>,
}

impl ReadBatch {
    pub fn new(reads_per_fragment: usize, n_fragments: usize) -> Result<Self> {
        if reads_per_fragment == 0 {
            return Err(RapiError::param("reads_per_fragment must be at least 1"));
        }
        let mut batch = Self {
            reads_per_fragment,
            n_fragments: 0,
            reads: Vec::new(),
        };
        batch.reserve(n_fragments)?;
        Ok(batch)
    }

    /// Grow to hold at least `n_fragments` fragments.
    ///
    /// Existing reads are kept and new slots are empty. Shrinking is a no-op.
    /// On allocation failure the batch is left as it was.
    pub fn reserve(&mut self, n_fragments: usize) -> Result<()> {
        if n_fragments <= self.n_fragments {
            return Ok(());
        }
        let n_reads = n_fragments
            .checked_mul(self.reads_per_fragment)
            .ok_or_else(|| RapiError::param(format!("{n_fragments} fragments overflow")))?;
        self.reads.try_reserve_exact(n_reads - self.reads.len())?;
        self.reads.resize_with(n_reads, Read::default);
        self.n_fragments = n_fragments;
        Ok(())
    }

    pub fn reads_per_fragment(&self) -> usize {
        self.reads_per_fragment
    }

    pub fn n_fragments(&self) -> usize {
        self.n_fragments
    }

    /// Total number of read slots.
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    fn index(&self, fragment: usize, read: usize) -> Result<usize> {
        if fragment >= self.n_fragments || read >= self.reads_per_fragment {
            return Err(RapiError::param(format!(
                "read ({fragment}, {read}) outside batch of {} x {}",
                self.n_fragments, self.reads_per_fragment
            )));
        }
        Ok(fragment * self.reads_per_fragment + read)
    }

    /// Fill one slot. The read is built completely before it replaces the
    /// slot, so a failed call leaves the previous contents in place.
    pub fn set_read(
        &mut self,
        fragment: usize,
        read: usize,
        id: &str,
        seq: &[u8],
        qual: Option<&[u8]>,
        q_offset: u8,
    ) -> Result<()> {
        let idx = self.index(fragment, read)?;
        self.reads[idx] = Read::new(id, seq, qual, q_offset)?;
        Ok(())
    }

    pub fn read(&self, fragment: usize, read: usize) -> Result<&Read> {
        let idx = self.index(fragment, read)?;
        Ok(&self.reads[idx])
    }

    pub fn read_mut(&mut self, fragment: usize, read: usize) -> Result<&mut Read> {
        let idx = self.index(fragment, read)?;
        Ok(&mut self.reads[idx])
    }

    /// All reads of one fragment.
    pub fn fragment(&self, fragment: usize) -> Result<&[Read]> {
        let start = self.index(fragment, 0)?;
        Ok(&self.reads[start..start + self.reads_per_fragment])
    }

    /// Iterate over fragments in order.
    pub fn fragments(&self) -> std::slice::Chunks<'_, Read> {
        self.reads.chunks(self.reads_per_fragment)
    }

    pub(crate) fn reads(&self) -> &[Read] {
        &self.reads
    }

    pub(crate) fn reads_mut(&mut self) -> &mut [Read] {
        &mut self.reads
    }
}
