//! Ordered fan-out of many recommendation requests.
//!
//! Items share nothing mutable, so they can be split across scoped worker
//! threads; results are stitched back together in input order. A failing
//! item degrades to its own fallback and never aborts the batch.

use crate::engine::RecommendationEngine;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::debug;
use upi_core::types::{RecommendRequest, RecommendationOutcome};

pub struct BatchCoordinator {
    engine: Arc<RecommendationEngine>,
    workers: usize,
}

impl BatchCoordinator {
    /// `workers` of 0 or 1 processes the batch on the calling thread.
    pub fn new(engine: Arc<RecommendationEngine>, workers: usize) -> Self {
        Self {
            engine,
            workers: workers.max(1),
        }
    }

    /// One outcome per request, in request order.
    pub fn recommend_batch(&self, requests: &[RecommendRequest]) -> Vec<RecommendationOutcome> {
        self.recommend_batch_on(requests, Local::now().date_naive())
    }

    pub fn recommend_batch_on(
        &self,
        requests: &[RecommendRequest],
        date: NaiveDate,
    ) -> Vec<RecommendationOutcome> {
        metrics::counter!("recommendations.batch_requests").increment(1);

        if self.workers == 1 || requests.len() < 2 {
            return requests
                .iter()
                .map(|request| self.engine.recommend_on(request, date))
                .collect();
        }

        let chunk_size = requests.len().div_ceil(self.workers);
        debug!(
            batch_size = requests.len(),
            workers = self.workers,
            chunk_size = chunk_size,
            "Fanning out recommendation batch"
        );

        let engine = self.engine.as_ref();
        std::thread::scope(|scope| {
            let handles: Vec<_> = requests
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|request| engine.recommend_on(request, date))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(outcomes) => outcomes,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}
