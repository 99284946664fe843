//! Per-state async locks.
//!
//! Every intent holds the locks of all states it reads or writes until its
//! result is committed, so two writes to one state never interleave.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{ShareLock, model::StateName};

#[derive(Clone, Default)]
pub(crate) struct StateLocks {
    locks: ShareLock<HashMap<StateName, Arc<Mutex<()>>>>,
}

/// Guards for a set of state names, released on drop.
pub(crate) struct LockSet {
    names: Vec<StateName>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl LockSet {
    pub(crate) fn covers(
        &self,
        name: &str,
    ) -> bool {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }
}

impl StateLocks {
    pub(crate) fn new() -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Locks every name in `names`. Names are taken in sorted order so
    /// overlapping sets cannot deadlock.
    pub(crate) async fn lock<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> LockSet {
        let mut names: Vec<StateName> = names.iter().map(|n| n.as_ref().to_string()).collect();
        names.sort();
        names.dedup();

        let mutexes: Vec<Arc<Mutex<()>>> = {
            let mut locks = self.locks.write().unwrap();
            // entries nobody holds or waits on
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            names.iter().map(|n| locks.entry(n.clone()).or_default().clone()).collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }

        LockSet {
            names,
            _guards: guards,
        }
    }
}
