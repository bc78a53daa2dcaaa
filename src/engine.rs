//! Resumable layered breadth-first search from the root person.
//!
//! The engine alternates between a person tier and the group tier that
//! follows it: it expands one person, then drains the group tier (each group
//! pushing its unseen members into the next person tier), then returns to the
//! person tier for its next node. A person tier counts as complete only once
//! its cursor has caught up with its length and the group tier below it is
//! drained, after which the search continues on the next person tier. A run
//! resumed from saved state first finishes any group tier that was left
//! partly drained, so nodes are expanded in the same order as in an
//! uninterrupted search. Every person is
//! therefore admitted at its true distance, and the tier contents depend only
//! on the graph, not on where previous runs were stopped.
//!
//! Store writes happen only when a run ends (found, exhausted or
//! interrupted) and only when caching is requested, so the persisted state is
//! always a consistent step boundary.

use tracing::{debug, info, warn};

use crate::{
    DegreesError,
    config::SearchOptions,
    graph::PersonResult,
    interrupt::Interrupt,
    path::reconstruct_path,
    pyramid::{Pyramid, TierKind},
    results::ResultCacheWriter,
    store::GraphStore,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FindOutcome {
    Found(PersonResult),
    NotConnected,
    AlreadyRoot,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchSummary {
    pub steps: u64,
    pub iterations: u64,
    pub tiers: usize,
    pub people_discovered: usize,
    pub groups_discovered: usize,
    pub results_written: usize,
    pub resumed: bool,
}

pub struct PyramidEngine<S> {
    store: S,
    options: SearchOptions,
    interrupt: Interrupt,
}

impl<S> PyramidEngine<S>
where
    S: GraphStore,
{
    pub fn new(store: S, options: SearchOptions) -> Self {
        Self {
            store,
            options,
            interrupt: Interrupt::new(),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Shortest path from the root to `target`, expanding the search only as
    /// far as needed. Every person discovered on the way is cached when
    /// `caching` is set.
    pub fn find(&self, target: i64, caching: bool) -> Result<FindOutcome, DegreesError> {
        let root = self.root()?;
        if target == root {
            return Ok(FindOutcome::AlreadyRoot);
        }
        let mut run = self.start(root, caching)?;
        if let Some((tier, node)) = run.pyramid.locate_person(target) {
            let result = PersonResult::new(target, reconstruct_path(&run.pyramid.tiers, tier, node)?);
            debug!(target, tier, "target already in search state");
            run.writer.record(result.clone());
            self.finish(&mut run, caching)?;
            return Ok(FindOutcome::Found(result));
        }
        run.target = Some(target);
        info!(target, resumed = run.resumed, "searching");
        match self.drive(&mut run, caching)? {
            Some((tier, node)) => {
                let result =
                    PersonResult::new(target, reconstruct_path(&run.pyramid.tiers, tier, node)?);
                self.finish(&mut run, caching)?;
                info!(
                    target,
                    degrees = result.degrees,
                    iterations = run.iterations,
                    "target found"
                );
                Ok(FindOutcome::Found(result))
            }
            None => {
                self.finish(&mut run, caching)?;
                info!(target, iterations = run.iterations, "target not connected");
                Ok(FindOutcome::NotConnected)
            }
        }
    }

    /// Expands the search until the root's component is exhausted.
    pub fn find_all(&self, caching: bool) -> Result<SearchSummary, DegreesError> {
        let root = self.root()?;
        let mut run = self.start(root, caching)?;
        info!(resumed = run.resumed, "solving every reachable person");
        self.drive(&mut run, caching)?;
        self.finish(&mut run, caching)?;
        let summary = run.summary();
        info!(
            people = summary.people_discovered,
            groups = summary.groups_discovered,
            tiers = summary.tiers,
            iterations = summary.iterations,
            "search exhausted"
        );
        Ok(summary)
    }

    fn root(&self) -> Result<i64, DegreesError> {
        self.store.root_person()?.ok_or(DegreesError::RootNotSet)
    }

    fn start(&self, root: i64, caching: bool) -> Result<Run, DegreesError> {
        let mut writer = if caching {
            ResultCacheWriter::new(self.options.batch_size)
        } else {
            ResultCacheWriter::disabled()
        };
        let (pyramid, resumed) = match self.store.load_pyramid()? {
            Some(pyramid) if pyramid.root == root => (pyramid, true),
            Some(stale) => {
                debug!(stale_root = stale.root, root, "discarding search state of another root");
                (Pyramid::new(root), false)
            }
            None => (Pyramid::new(root), false),
        };
        if !resumed {
            writer.record(PersonResult::new(root, Vec::new()));
        }
        Ok(Run {
            active: pyramid.resume_index(),
            pyramid,
            writer,
            target: None,
            resumed,
            steps: 0,
            iterations: 0,
            progress_interval: self.options.progress_interval,
        })
    }

    /// Steps until the target is admitted, the search is exhausted (`None`)
    /// or the interrupt is raised.
    fn drive(&self, run: &mut Run, caching: bool) -> Result<Option<(usize, usize)>, DegreesError> {
        loop {
            if self.interrupt.is_raised() {
                warn!(
                    steps = run.steps,
                    tier = run.active,
                    people = run.pyramid.people_discovered(),
                    persisted = caching,
                    "search interrupted"
                );
                if caching {
                    self.finish(run, caching)?;
                }
                return Err(DegreesError::Interrupted);
            }
            match run.step(&self.store)? {
                Step::Continue => {}
                Step::Found { tier, node } => return Ok(Some((tier, node))),
                Step::Exhausted => return Ok(None),
            }
        }
    }

    fn finish(&self, run: &mut Run, caching: bool) -> Result<(), DegreesError> {
        if !caching {
            return Ok(());
        }
        run.writer.flush(&self.store)?;
        self.store.save_pyramid(&run.pyramid)
    }
}

enum Step {
    Continue,
    Found { tier: usize, node: usize },
    Exhausted,
}

struct Run {
    pyramid: Pyramid,
    writer: ResultCacheWriter,
    active: usize,
    target: Option<i64>,
    resumed: bool,
    steps: u64,
    iterations: u64,
    progress_interval: u64,
}

impl Run {
    fn step<S: GraphStore>(&mut self, store: &S) -> Result<Step, DegreesError> {
        let active = self.active;
        let Some(tier) = self.pyramid.tiers.get(active) else {
            return Ok(Step::Exhausted);
        };
        let kind = tier.kind;
        // A group tier left half drained by an interrupted run is finished
        // before its person tier expands or completes.
        if kind == TierKind::People
            && self
                .pyramid
                .tiers
                .get(active + 1)
                .is_some_and(|next| !next.is_drained())
        {
            self.active += 1;
            return Ok(Step::Continue);
        }
        let Some((index, node)) = tier.current() else {
            match kind {
                TierKind::People => {
                    self.pyramid.last_completed = Some(active);
                    self.active += 2;
                }
                // The person tier above decides whether to expand its next
                // node or to complete.
                TierKind::Groups => self.active -= 1,
            }
            return Ok(Step::Continue);
        };
        self.steps += 1;
        match kind {
            TierKind::People => {
                for group in store.neighbors_of_person(node.entity_id)? {
                    self.tick();
                    self.pyramid.admit(active, group, index);
                }
                self.pyramid.tiers[active].advance();
                if active + 1 < self.pyramid.tiers.len() {
                    self.active += 1;
                }
                Ok(Step::Continue)
            }
            TierKind::Groups => {
                let mut via_group: Option<Vec<i64>> = None;
                let mut found = None;
                for person in store.neighbors_of_group(node.entity_id)? {
                    self.tick();
                    let Some(slot) = self.pyramid.admit(active, person, index) else {
                        continue;
                    };
                    let is_target = self.target == Some(person);
                    if is_target {
                        found = Some(slot);
                    }
                    if !self.writer.is_enabled() {
                        continue;
                    }
                    let path = match &via_group {
                        Some(path) => path.clone(),
                        None => {
                            let mut path = reconstruct_path(&self.pyramid.tiers, active, index)?;
                            path.push(node.entity_id);
                            via_group = Some(path.clone());
                            path
                        }
                    };
                    self.writer.record(PersonResult::new(person, path));
                }
                self.pyramid.tiers[active].advance();
                match found {
                    Some(node) => Ok(Step::Found {
                        tier: active + 1,
                        node,
                    }),
                    None => Ok(Step::Continue),
                }
            }
        }
    }

    fn tick(&mut self) {
        self.iterations += 1;
        if self.progress_interval > 0 && self.iterations % self.progress_interval == 0 {
            debug!(
                iterations = self.iterations,
                tier = self.active,
                people = self.pyramid.people_discovered(),
                groups = self.pyramid.groups_discovered(),
                "search progress"
            );
        }
    }

    fn summary(&self) -> SearchSummary {
        SearchSummary {
            steps: self.steps,
            iterations: self.iterations,
            tiers: self.pyramid.tier_count(),
            people_discovered: self.pyramid.people_discovered(),
            groups_discovered: self.pyramid.groups_discovered(),
            results_written: self.writer.written(),
            resumed: self.resumed,
        }
    }
}
