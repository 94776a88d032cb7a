//! Reload/lifecycle (component L): a reference-counted handle to the
//! live store, swapped atomically when a new database opens clean.
//! Reload runs on its own thread so a slow open (building indices,
//! warming pages) never blocks readers already holding the old handle.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use crate::error::{DnsDbError, DnsDbResult};
use crate::store::KvStore;

/// A live, swappable reference to the current store. Cloning is cheap
/// (an `Arc` bump); every clone sees the same generation until the next
/// successful `reload`.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<RwLock<Arc<dyn KvStore>>>,
    destroyed: Arc<AtomicBool>,
}

/// A reader borrowed from a [`DbHandle`] at a point in time. Holding one
/// across a `reload()` call is safe — it keeps seeing the generation it
/// was issued from until dropped.
pub struct Reader {
    store: Arc<dyn KvStore>,
}

impl Reader {
    pub fn store(&self) -> &dyn KvStore {
        self.store.as_ref()
    }

    /// Releases this reader. Provided for symmetry with `new_reader()`;
    /// dropping the value has the identical effect.
    pub fn close(self) {
        drop(self)
    }
}

impl DbHandle {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        DbHandle {
            inner: Arc::new(RwLock::new(store)),
            destroyed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Marks this handle destroyed. Existing [`Reader`]s already checked
    /// out keep working; only future `new_reader()` calls are refused.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::Release);
    }

    /// Checks out the current generation's store. Returns `None` once
    /// `destroy()` has been called.
    pub fn new_reader(&self) -> Option<Reader> {
        if self.is_destroyed() {
            return None;
        }
        let store = self.inner.read().unwrap().clone();
        Some(Reader { store })
    }

    /// Swaps in `next`, built off-thread so opening it (and whatever
    /// validation the caller passes in `open`) never blocks a reader
    /// holding the previous generation. `open` runs on a spawned thread;
    /// if it hasn't produced a result within `timeout`, `reload` returns
    /// `ReloadTimeout` and the old generation stays live — the spawned
    /// thread is abandoned, not killed, and any late result is dropped.
    pub fn reload<F>(&self, open: F, validation_key: &[u8], timeout: Duration) -> DnsDbResult<()>
    where
        F: FnOnce() -> DnsDbResult<Arc<dyn KvStore>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(open());
        });

        let next = match rx.recv_timeout(timeout) {
            Ok(result) => result?,
            Err(mpsc::RecvTimeoutError::Timeout) => return Err(DnsDbError::ReloadTimeout),
            Err(mpsc::RecvTimeoutError::Disconnected) => return Err(DnsDbError::ReloadTimeout),
        };

        if next.get(validation_key)?.is_none() {
            return Err(DnsDbError::ValidationKeyNotFound);
        }

        *self.inner.write().unwrap() = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn handle_with(store: MemStore) -> DbHandle {
        DbHandle::new(Arc::new(store))
    }

    #[test]
    fn new_reader_sees_live_generation() {
        let store = MemStore::new();
        store.put(b"k", vec![1]).unwrap();
        let handle = handle_with(store);
        let reader = handle.new_reader().unwrap();
        assert_eq!(reader.store().get(b"k").unwrap(), Some(vec![1]));
    }

    #[test]
    fn destroyed_handle_refuses_new_readers() {
        let handle = handle_with(MemStore::new());
        handle.destroy();
        assert!(handle.new_reader().is_none());
    }

    #[test]
    fn reload_swaps_generation_on_success() {
        let old = MemStore::new();
        old.put(b"gen", vec![1]).unwrap();
        let handle = handle_with(old);

        let next = MemStore::new();
        next.put(b"ok", vec![1]).unwrap();
        next.put(b"gen", vec![2]).unwrap();
        handle
            .reload(move || Ok(Arc::new(next) as Arc<dyn KvStore>), b"ok", Duration::from_secs(1))
            .unwrap();

        let reader = handle.new_reader().unwrap();
        assert_eq!(reader.store().get(b"gen").unwrap(), Some(vec![2]));
    }

    #[test]
    fn reload_rejects_a_store_missing_the_validation_key() {
        let handle = handle_with(MemStore::new());
        let next = MemStore::new();
        let err = handle
            .reload(move || Ok(Arc::new(next) as Arc<dyn KvStore>), b"missing", Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, DnsDbError::ValidationKeyNotFound));
    }

    #[test]
    fn reload_times_out_if_open_never_returns() {
        let handle = handle_with(MemStore::new());
        let err = handle
            .reload(
                || {
                    thread::sleep(Duration::from_secs(5));
                    Ok(Arc::new(MemStore::new()) as Arc<dyn KvStore>)
                },
                b"ok",
                Duration::from_millis(50),
            )
            .unwrap_err();
        assert!(matches!(err, DnsDbError::ReloadTimeout));
    }
}
