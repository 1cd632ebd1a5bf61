//! Bounded recursive search behind `find_files` and `find_directories`.
//!
//! The amount of work is discovered while the walk runs: every listing
//! may reveal more directories to examine. A [`Budget`] tracks how many
//! directories were admitted and how many have reported back; the search
//! is finished exactly when the two meet.
//!
//! Admitted directories are listed concurrently through one
//! `FuturesUnordered` set polled by the calling task. The first branch
//! that fails ends the search: the set is dropped with it, so pending
//! listings are cancelled rather than left to finish unobserved.

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use rummage_types::{Envelope, Status};

use crate::directory::{Directory, FindOptions};
use crate::entity::Entity;
use crate::error::{Failure, OpResult};
use crate::template::Template;

/// Which kind of entity a search collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Collect {
    Files,
    Directories,
}

/// Work counters for one search.
#[derive(Debug)]
pub(crate) struct Budget {
    limit: usize,
    total: usize,
    processed: usize,
}

impl Budget {
    /// A budget with the root already admitted. A limit of zero is
    /// treated as one: the root is always examined.
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            total: 1,
            processed: 0,
        }
    }

    /// Admit one more directory if the limit allows it.
    pub(crate) fn admit(&mut self) -> bool {
        if self.total < self.limit {
            self.total += 1;
            true
        } else {
            false
        }
    }

    /// Record one finished examination; true once every admitted
    /// directory has reported.
    pub(crate) fn complete(&mut self) -> bool {
        debug_assert!(self.processed < self.total, "completed more than admitted");
        self.processed += 1;
        self.is_done()
    }

    pub(crate) fn is_done(&self) -> bool {
        self.processed == self.total
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }
}

/// Run a search rooted at `root`. Gates on the root have already passed.
pub(crate) async fn run(root: &Directory, options: &FindOptions, collect: Collect) -> OpResult<Vec<Entity>> {
    let mut budget = Budget::new(options.search_limit);
    let mut found = Vec::new();
    let mut pending = FuturesUnordered::new();

    let children = match root.enumerate(&Template::Any).await?.into_parts() {
        (Status::Ok, children) => children.unwrap_or_default(),
        (status, _) => return Ok(Envelope::status(status)),
    };
    for dir in sort(children, &options.template, collect, &mut found) {
        if budget.admit() {
            pending.push(examine(dir));
        }
    }
    let mut done = budget.complete();

    while !done {
        let Some((dir, result)) = pending.next().await else {
            break;
        };

        let children = match result?.into_parts() {
            (Status::Ok, children) => children.unwrap_or_default(),
            (status, _) => {
                tracing::warn!(path = %dir.full_path(), %status, "search branch failed, cancelling siblings");
                return Err(Failure::Status(status));
            }
        };
        for sub in sort(children, &options.template, collect, &mut found) {
            if budget.admit() {
                pending.push(examine(sub));
            } else {
                tracing::trace!(path = %sub.full_path(), "search limit reached, not descending");
            }
        }
        done = budget.complete();
    }
    debug_assert!(budget.is_done());

    found.sort_by(|a: &Entity, b: &Entity| a.full_path().cmp(b.full_path()));
    tracing::debug!(
        path = %root.full_path(),
        examined = budget.total(),
        found = found.len(),
        "search finished"
    );
    Ok(Envelope::ok(found))
}

async fn examine(dir: Directory) -> (Directory, OpResult<Vec<Entity>>) {
    tracing::debug!(path = %dir.full_path(), "examining directory");
    let result = dir.enumerate(&Template::Any).await;
    (dir, result)
}

/// Move matching children into `found` and return the directories that
/// are candidates for descent.
///
/// Directory matching and descent are independent: a directory is a
/// descent candidate whether or not its name matched.
fn sort(children: Vec<Entity>, template: &Template, collect: Collect, found: &mut Vec<Entity>) -> Vec<Directory> {
    let mut subdirs = Vec::new();
    for child in children {
        match child {
            Entity::File(file) => {
                if collect == Collect::Files && template.matches(file.full_name()) {
                    found.push(Entity::File(file));
                }
            }
            Entity::Directory(dir) => {
                if collect == Collect::Directories && template.matches(dir.full_name()) {
                    found.push(Entity::Directory(dir.clone()));
                }
                subdirs.push(dir);
            }
        }
    }
    subdirs
}
