// Aligner session
//
// Owns the search service, the worker pool and the state carried across
// batches. Each call to `align_reads` runs two fork-join passes over the
// batch: search every read, then pair/finalize every fragment.

use std::time::Instant;

use rayon::prelude::*;

use crate::core::batch::ReadBatch;
use crate::core::io::sam_output::ProgramInfo;
use crate::core::read::Read;
use crate::core::reference::ReferenceIndex;
use crate::error::{RapiError, Result};
use crate::finalization::finalize_single_end;
use crate::mem_opt::MemOpt;
use crate::opts::RapiOpts;
use crate::paired::PairingEngine;
use crate::paired::insert_size::{InsertSizeStats, ORIENTATION_NAMES, stats_from_override};
use crate::search::{Candidate, SearchService, sort_dedup_candidates};

/// State carried from one batch to the next.
#[derive(Debug, Clone, Default)]
pub struct AlignerState {
    /// Reads aligned so far; seeds the per-read ids used for tie-breaking.
    pub n_reads_processed: u64,
    /// Insert size statistics of the last paired batch.
    pub insert_stats: Option<[InsertSizeStats; 4]>,
}

pub struct AlignerSession<S: SearchService> {
    service: S,
    state: AlignerState,
    /// Worker pool sized by `MemOpt::n_threads`, built on first use.
    pool: Option<rayon::ThreadPool>,
}

fn build_pool(n_threads: usize) -> Result<rayon::ThreadPool> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads.max(1))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build thread pool: {}", e))?;
    log::debug!("Built worker pool with {} threads", pool.current_num_threads());
    Ok(pool)
}

/// Search one read and normalise its candidate list.
fn search_read<S: SearchService>(
    service: &S,
    reference: &ReferenceIndex,
    read: &Read,
) -> anyhow::Result<Vec<Candidate>> {
    if read.is_empty() {
        return Ok(Vec::new());
    }
    let mut cands = service.search(reference, read.seq.as_bytes())?;
    sort_dedup_candidates(&mut cands);
    Ok(cands)
}

/// Insert size statistics for a paired batch: the manual override when set,
/// otherwise inferred by the service from the searched pairs.
fn batch_insert_stats<S: SearchService>(
    service: &S,
    opt: &MemOpt,
    per_fragment: &[Vec<Vec<Candidate>>],
) -> [InsertSizeStats; 4] {
    if let Some(o) = &opt.insert_size_override {
        return stats_from_override(o);
    }
    let pairs: Vec<[&[Candidate]; 2]> = per_fragment
        .iter()
        .filter(|f| f.len() == 2)
        .map(|f| [&f[0][..], &f[1][..]])
        .collect();
    let stats = service.infer_insert_stats(opt, &pairs);
    for (d, s) in stats.iter().enumerate().filter(|(_, s)| !s.failed) {
        log::debug!(
            "[PE] {}: avg={:.2} std={:.2} bounds=[{}, {}]",
            ORIENTATION_NAMES[d],
            s.avg,
            s.std,
            s.low,
            s.high
        );
    }
    stats
}

impl<S: SearchService> AlignerSession<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: AlignerState::default(),
            pool: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn state(&self) -> &AlignerState {
        &self.state
    }

    pub fn name(&self) -> &str {
        self.service.name()
    }

    pub fn version(&self) -> &str {
        self.service.version()
    }

    /// `@PG` identity of this session's aligner.
    pub fn program_info(&self) -> ProgramInfo {
        ProgramInfo::new(self.service.name(), self.service.version())
    }

    /// Align every read of `batch`, replacing each read's alignments.
    ///
    /// Batches with one read per fragment are aligned single-end, batches
    /// with two are aligned as pairs. Larger fragments are not supported.
    pub fn align_reads(
        &mut self,
        reference: &ReferenceIndex,
        batch: &mut ReadBatch,
        opts: &RapiOpts,
    ) -> Result<()> {
        let rpf = batch.reads_per_fragment();
        if rpf > 2 {
            return Err(RapiError::OpNotSupported(format!(
                "{} reads per fragment (at most 2 are supported)",
                rpf
            )));
        }
        let opt = opts.effective_mem_opt()?;
        let pool = match self.pool.take() {
            Some(pool) if pool.current_num_threads() == opt.n_threads => pool,
            _ => build_pool(opt.n_threads)?,
        };
        let pool = self.pool.insert(pool);
        let start = Instant::now();

        // Pass 1: search
        let service = &self.service;
        let per_fragment: Vec<Vec<Vec<Candidate>>> = pool.install(|| {
            batch
                .reads()
                .par_chunks(rpf)
                .map(|fragment| {
                    fragment
                        .iter()
                        .map(|read| search_read(service, reference, read))
                        .collect::<anyhow::Result<Vec<_>>>()
                })
                .collect::<anyhow::Result<Vec<_>>>()
        })?;
        log::debug!(
            "Searched {} reads in {:.3} s",
            batch.len(),
            start.elapsed().as_secs_f64()
        );

        // Pass 2: pairing / finalization
        let n_processed = self.state.n_reads_processed;
        if rpf == 2 {
            let stats = batch_insert_stats(service, &opt, &per_fragment);
            let engine = PairingEngine::new(service, reference, &opt, &stats);
            pool.install(|| {
                batch
                    .reads_mut()
                    .par_chunks_mut(2)
                    .zip(per_fragment.into_par_iter())
                    .enumerate()
                    .try_for_each(|(f, (reads, cands))| -> Result<()> {
                        let mut it = cands.into_iter();
                        let cands = [it.next().unwrap_or_default(), it.next().unwrap_or_default()];
                        let id = n_processed / 2 + f as u64;
                        let [a0, a1] = engine.pair_end(id, [&reads[0], &reads[1]], cands)?;
                        reads[0].alignments = a0;
                        reads[1].alignments = a1;
                        Ok(())
                    })
            })?;
            self.state.insert_stats = Some(stats);
        } else {
            pool.install(|| {
                batch
                    .reads_mut()
                    .par_iter_mut()
                    .zip(per_fragment.into_par_iter())
                    .enumerate()
                    .try_for_each(|(i, (read, cands))| -> Result<()> {
                        let mut cands = cands.into_iter().next().unwrap_or_default();
                        service.mark_primary(&opt, &mut cands, n_processed + i as u64);
                        read.alignments = finalize_single_end(&opt, reference, &cands)?;
                        Ok(())
                    })
            })?;
        }

        self.state.n_reads_processed += batch.len() as u64;
        log::info!(
            "Processed {} reads ({} per fragment) in {:.3} s",
            batch.len(),
            rpf,
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
