//! Local list state with optimistic create and delete.
//!
//! A create shows a provisional entry under a temporary key until the backend
//! answers; a delete removes the entry first and puts it back where it was if
//! the backend refuses. Either way the list ends in a state the backend
//! agrees with.

use std::{
    collections::HashSet,
    fmt,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::records::Record;

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Local identifier of an entry the backend has not stored yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TempId {
    millis: i64,
    seq: u64,
}

impl TempId {
    pub fn next() -> Self {
        Self {
            millis: chrono::Utc::now().timestamp_millis(),
            seq: TEMP_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp-{}-{}", self.millis, self.seq)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotKey {
    Pending(TempId),
    Saved(Uuid),
}

#[derive(Clone, Debug)]
pub struct Entry<T> {
    pub key: SlotKey,
    pub item: T,
}

struct State<T> {
    entries: Vec<Entry<T>>,
    deleting: HashSet<Uuid>,
}

pub struct OptimisticList<T: Record> {
    state: Mutex<State<T>>,
}

impl<T: Record> Default for OptimisticList<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                entries: Vec::new(),
                deleting: HashSet::new(),
            }),
        }
    }
}

impl<T: Record> OptimisticList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the list with freshly loaded records.
    pub fn replace_all(&self, items: Vec<T>) {
        let mut state = self.lock();
        state.entries = items
            .into_iter()
            .map(|item| Entry {
                key: SlotKey::Saved(item.id()),
                item,
            })
            .collect();
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.lock().entries.iter().map(|e| e.item.clone()).collect()
    }

    pub fn entries(&self) -> Vec<Entry<T>> {
        self.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Swaps a saved entry for its updated version, in place.
    pub fn upsert(&self, item: T) {
        let key = SlotKey::Saved(item.id());
        let mut state = self.lock();
        match state.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.item = item,
            None => state.entries.push(Entry { key, item }),
        }
    }

    /// Shows `provisional` at the end of the list while `remote` runs. On
    /// success the entry takes the stored record and its ID; on failure it
    /// is removed again.
    pub async fn create<F>(&self, provisional: T, remote: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let temp = TempId::next();
        let pending = SlotKey::Pending(temp);
        self.lock().entries.push(Entry {
            key: pending,
            item: provisional,
        });
        tracing::debug!("{} {} shown before save", T::RESOURCE, temp);

        match remote.await {
            Ok(saved) => {
                let saved_key = SlotKey::Saved(saved.id());
                let mut state = self.lock();
                let already_listed = state.entries.iter().any(|e| e.key == saved_key);
                match state.entries.iter().position(|e| e.key == pending) {
                    Some(index) if already_listed => {
                        state.entries.remove(index);
                    }
                    Some(index) => {
                        state.entries[index] = Entry {
                            key: saved_key,
                            item: saved.clone(),
                        };
                    }
                    // A reload dropped the provisional entry meanwhile
                    None if !already_listed => state.entries.push(Entry {
                        key: saved_key,
                        item: saved.clone(),
                    }),
                    None => {}
                }
                Ok(saved)
            }
            Err(e) => {
                self.lock().entries.retain(|entry| entry.key != pending);
                tracing::warn!("{} {} rolled back: {}", T::RESOURCE, temp, e);
                Err(e)
            }
        }
    }

    /// Removes the saved entry `id` while `remote` runs and restores it at
    /// its old position if `remote` fails. A second delete of the same ID
    /// before the first settles is refused.
    pub async fn delete<F>(&self, id: Uuid, remote: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        let key = SlotKey::Saved(id);
        let (index, removed) = {
            let mut state = self.lock();
            if state.deleting.contains(&id) {
                return Err(Error::MutationInProgress);
            }
            let Some(index) = state.entries.iter().position(|e| e.key == key) else {
                return Err(Error::not_found(T::RESOURCE, id));
            };
            state.deleting.insert(id);
            (index, state.entries.remove(index))
        };

        let result = remote.await;

        let mut state = self.lock();
        state.deleting.remove(&id);
        if let Err(e) = result {
            let index = index.min(state.entries.len());
            state.entries.insert(index, removed);
            tracing::warn!("{} {} delete rolled back: {}", T::RESOURCE, id, e);
            return Err(e);
        }
        Ok(())
    }
}
