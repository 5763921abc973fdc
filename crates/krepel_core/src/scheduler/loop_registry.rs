//! # Loop Registry
//!
//! Named, prioritized zero-argument callbacks ticked once per frame.
//!
//! ## Re-entrancy
//!
//! Every method takes `&self`, so a callback may add, remove or reprioritize
//! entries (including itself) while the registry is ticking:
//!
//! ```text
//! tick():  [Idle] ──► sort if needed ──► run entries 0..n ──► [Idle] ──► sweep
//!                                          │
//!                      remove(name) ───────┴──► mark is_garbage (skipped)
//!                      set(new)     ───────────► appended, runs next tick
//! ```
//!
//! Removal during a tick only marks the entry; the sweep after the tick
//! erases it, so the walk in progress never sees the list shrink.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{LoopError, LoopResult};

/// Shared callback storage. Cloned out of the entry list before invocation.
type LoopCallback = Rc<RefCell<dyn FnMut()>>;

struct LoopEntry {
    name: String,
    priority: i32,
    callback: LoopCallback,
    /// Marked for removal; skipped until the post-tick sweep erases it.
    is_garbage: bool,
}

/// Snapshot of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopEntryInfo {
    /// Unique entry name.
    pub name: String,
    /// Higher priorities run earlier.
    pub priority: i32,
    /// Removed during the current tick, erased once the tick ends.
    pub pending_removal: bool,
}

/// Priority-ordered registry of named per-frame callbacks.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use krepel_core::LoopRegistry;
///
/// let order = Rc::new(RefCell::new(Vec::new()));
/// let registry = Rc::new(LoopRegistry::new());
///
/// for name in ["a", "b", "c"] {
///     let order = Rc::clone(&order);
///     registry.set(name, move || order.borrow_mut().push(name));
/// }
/// registry.set_priority("b", 10).unwrap();
/// registry.tick();
///
/// assert_eq!(*order.borrow(), ["b", "a", "c"]);
/// ```
pub struct LoopRegistry {
    entries: RefCell<Vec<LoopEntry>>,
    ticking: Cell<bool>,
    needs_sorting: Cell<bool>,
    keep_ticking: Cell<bool>,
}

impl LoopRegistry {
    /// Creates an empty registry in the idle state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            ticking: Cell::new(false),
            needs_sorting: Cell::new(false),
            keep_ticking: Cell::new(true),
        }
    }

    /// Registers `callback` under `name` at priority 0, or replaces the
    /// callback of an existing entry while keeping its priority.
    pub fn set<F>(&self, name: &str, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.set_with_priority(name, 0, callback);
    }

    /// Like [`set`](Self::set), with the priority used if the entry is new.
    pub fn set_with_priority<F>(&self, name: &str, priority: i32, callback: F)
    where
        F: FnMut() + 'static,
    {
        let callback: LoopCallback = Rc::new(RefCell::new(callback));
        let replaced = {
            let mut entries = self.entries.borrow_mut();
            if let Some(entry) = entries.iter_mut().find(|entry| entry.name == name) {
                if entry.is_garbage {
                    tracing::debug!(name, "reviving loop callback removed during this tick");
                    entry.is_garbage = false;
                } else {
                    tracing::debug!(name, "overwriting existing loop callback");
                }
                Some(std::mem::replace(&mut entry.callback, callback))
            } else {
                entries.push(LoopEntry {
                    name: name.to_owned(),
                    priority,
                    callback,
                    is_garbage: false,
                });
                self.needs_sorting.set(true);
                tracing::debug!(name, priority, "loop callback added");
                None
            }
        };
        // The old closure may own handles whose drop code runs arbitrary logic.
        drop(replaced);
    }

    /// Registers a new entry at priority 0.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::AlreadyExists`] if `name` is taken, including by
    /// an entry removed earlier in the current tick.
    pub fn add<F>(&self, name: &str, callback: F) -> LoopResult<()>
    where
        F: FnMut() + 'static,
    {
        if self.contains(name) {
            tracing::warn!(name, "loop callback already registered");
            return Err(LoopError::AlreadyExists(name.to_owned()));
        }
        self.set(name, callback);
        Ok(())
    }

    /// Removes the entry called `name`.
    ///
    /// While ticking, the entry is only marked and stays reserved until the
    /// tick ends.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::NotFound`] if no such entry exists.
    pub fn remove(&self, name: &str) -> LoopResult<()> {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let Some(index) = entries.iter().position(|entry| entry.name == name) else {
                tracing::info!(name, "cannot remove unknown loop callback");
                return Err(LoopError::NotFound(name.to_owned()));
            };
            if self.ticking.get() {
                entries[index].is_garbage = true;
                tracing::debug!(name, "loop callback marked for removal");
                None
            } else {
                tracing::debug!(name, "loop callback removed");
                Some(entries.remove(index))
            }
        };
        drop(removed);
        Ok(())
    }

    /// Changes the priority of an existing entry. Takes effect on the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::NotFound`] if no such entry exists.
    pub fn set_priority(&self, name: &str, priority: i32) -> LoopResult<()> {
        let mut entries = self.entries.borrow_mut();
        let entry = Self::find_mut(&mut entries, name)?;
        entry.priority = priority;
        self.needs_sorting.set(true);
        Ok(())
    }

    /// Returns the priority of an existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::NotFound`] if no such entry exists.
    pub fn get_priority(&self, name: &str) -> LoopResult<i32> {
        self.get(name).map(|info| info.priority)
    }

    /// Returns a snapshot of the entry called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::NotFound`] if no such entry exists.
    pub fn get(&self, name: &str) -> LoopResult<LoopEntryInfo> {
        let entries = self.entries.borrow();
        entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| LoopEntryInfo {
                name: entry.name.clone(),
                priority: entry.priority,
                pending_removal: entry.is_garbage,
            })
            .ok_or_else(|| {
                tracing::debug!(name, "unable to find loop callback");
                LoopError::NotFound(name.to_owned())
            })
    }

    /// Returns whether `name` is registered (or reserved until the sweep).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().iter().any(|entry| entry.name == name)
    }

    /// Number of entries, including ones pending removal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns whether no entry is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Runs every live callback once, highest priority first.
    ///
    /// Entries with equal priority keep their insertion order. Entries added
    /// during the tick first run on the next one. The registry returns to the
    /// idle state and sweeps removed entries even if a callback panics.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a callback of this registry.
    pub fn tick(&self) {
        assert!(
            !self.ticking.get(),
            "Invalid operation: the loop registry is already ticking"
        );
        self.ticking.set(true);
        let _guard = TickGuard { registry: self };

        if self.needs_sorting.get() {
            tracing::debug!("sorting loop callbacks by priority");
            self.sort_by_priority();
        }

        let count = self.entries.borrow().len();
        for index in 0..count {
            let callback = {
                let entries = self.entries.borrow();
                let entry = &entries[index];
                if entry.is_garbage {
                    continue;
                }
                tracing::trace!(name = %entry.name, priority = entry.priority, "ticking loop callback");
                Rc::clone(&entry.callback)
            };
            let mut callback = callback.borrow_mut();
            (&mut *callback)();
        }
    }

    /// Returns entry names in the order the next tick will run them.
    ///
    /// # Panics
    ///
    /// Panics while ticking, since reordering mid-tick is not allowed.
    #[must_use]
    pub fn tick_order(&self) -> Vec<String> {
        assert!(
            !self.ticking.get(),
            "Invalid operation: cannot sort the loop registry while ticking"
        );
        if self.needs_sorting.get() {
            self.sort_by_priority();
        }
        self.entries
            .borrow()
            .iter()
            .filter(|entry| !entry.is_garbage)
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Logs the tick order at info level.
    pub fn log_tick_order(&self) {
        for (position, name) in self.tick_order().iter().enumerate() {
            tracing::info!(position, name = %name, "tick order");
        }
    }

    /// Removes every entry and restores the default flags.
    ///
    /// # Panics
    ///
    /// Panics while ticking.
    pub fn reset(&self) {
        assert!(
            !self.ticking.get(),
            "Invalid operation: cannot reset the loop registry while ticking"
        );
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        self.needs_sorting.set(false);
        self.keep_ticking.set(true);
        drop(entries);
    }

    /// Returns whether [`tick`](Self::tick) is currently executing.
    #[inline]
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.ticking.get()
    }

    /// Advisory flag read by the frame driver between ticks.
    #[inline]
    #[must_use]
    pub fn keep_ticking(&self) -> bool {
        self.keep_ticking.get()
    }

    /// Sets the advisory keep-ticking flag.
    #[inline]
    pub fn set_keep_ticking(&self, value: bool) {
        self.keep_ticking.set(value);
    }

    fn sort_by_priority(&self) {
        // `sort_by` is stable: equal priorities keep insertion order.
        self.entries
            .borrow_mut()
            .sort_by(|a, b| b.priority.cmp(&a.priority));
        self.needs_sorting.set(false);
    }

    fn sweep(&self) {
        let garbage: Vec<LoopEntry> = {
            let mut entries = self.entries.borrow_mut();
            let (garbage, live) = std::mem::take(&mut *entries)
                .into_iter()
                .partition(|entry| entry.is_garbage);
            *entries = live;
            garbage
        };
        if !garbage.is_empty() {
            tracing::debug!(count = garbage.len(), "swept removed loop callbacks");
        }
    }

    fn find_mut<'a>(entries: &'a mut [LoopEntry], name: &str) -> LoopResult<&'a mut LoopEntry> {
        entries
            .iter_mut()
            .find(|entry| entry.name == name)
            .ok_or_else(|| {
                tracing::debug!(name, "unable to find loop callback");
                LoopError::NotFound(name.to_owned())
            })
    }
}

impl Default for LoopRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoopRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = match self.entries.try_borrow() {
            Ok(entries) => entries.iter().map(|entry| entry.name.clone()).collect(),
            Err(_) => Vec::new(),
        };
        f.debug_struct("LoopRegistry")
            .field("entries", &names)
            .field("ticking", &self.ticking.get())
            .field("needs_sorting", &self.needs_sorting.get())
            .field("keep_ticking", &self.keep_ticking.get())
            .finish()
    }
}

/// Returns the registry to idle and sweeps, also when a callback unwinds.
struct TickGuard<'a> {
    registry: &'a LoopRegistry,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.registry.ticking.set(false);
        self.registry.sweep();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    type Trace = Rc<RefCell<Vec<&'static str>>>;

    fn recorder(registry: &LoopRegistry, trace: &Trace, name: &'static str) {
        let trace = Rc::clone(trace);
        registry.set(name, move || trace.borrow_mut().push(name));
    }

    fn take(trace: &Trace) -> Vec<&'static str> {
        std::mem::take(&mut *trace.borrow_mut())
    }

    #[test]
    fn test_empty_tick() {
        let registry = LoopRegistry::new();
        registry.tick();
        assert!(!registry.is_ticking());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let registry = LoopRegistry::new();
        let trace = Trace::default();
        for name in ["a", "b", "c"] {
            recorder(&registry, &trace, name);
        }

        registry.tick();
        assert_eq!(take(&trace), ["a", "b", "c"]);

        registry.set_priority("b", 10).unwrap();
        registry.tick();
        assert_eq!(take(&trace), ["b", "a", "c"]);
        assert_eq!(registry.get_priority("b"), Ok(10));
    }

    #[test]
    fn test_negative_priority_runs_last() {
        let registry = LoopRegistry::new();
        let trace = Trace::default();
        recorder(&registry, &trace, "extract");
        recorder(&registry, &trace, "logic");
        recorder(&registry, &trace, "present");
        registry.set_priority("extract", -100).unwrap();
        registry.set_priority("present", 100).unwrap();

        assert_eq!(registry.tick_order(), ["present", "logic", "extract"]);
        registry.tick();
        assert_eq!(take(&trace), ["present", "logic", "extract"]);
    }

    #[test]
    fn test_set_overwrites_callback_keeps_priority() {
        let registry = LoopRegistry::new();
        let trace = Trace::default();
        registry.set_with_priority("x", 5, || {});
        let inner = Rc::clone(&trace);
        registry.set_with_priority("x", 99, move || inner.borrow_mut().push("new"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_priority("x"), Ok(5));
        registry.tick();
        assert_eq!(take(&trace), ["new"]);
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let registry = LoopRegistry::new();
        assert!(registry.add("foo", || {}).is_ok());
        assert_eq!(
            registry.add("foo", || {}),
            Err(LoopError::AlreadyExists("foo".into()))
        );
    }

    #[test]
    fn test_unknown_names_report_not_found() {
        let registry = LoopRegistry::new();
        assert_eq!(registry.remove("nope"), Err(LoopError::NotFound("nope".into())));
        assert!(registry.set_priority("nope", 1).is_err());
        assert!(registry.get_priority("nope").is_err());
        assert!(registry.get("nope").is_err());
    }

    #[test]
    fn test_remove_while_idle_is_immediate() {
        let registry = LoopRegistry::new();
        let trace = Trace::default();
        recorder(&registry, &trace, "foo");
        registry.tick();
        registry.remove("foo").unwrap();
        assert!(!registry.contains("foo"));
        registry.tick();
        assert_eq!(take(&trace), ["foo"]);
    }

    #[test]
    fn test_self_removal_is_deferred() {
        let registry = Rc::new(LoopRegistry::new());
        let trace = Trace::default();
        recorder(&registry, &trace, "before");

        let weak = Rc::downgrade(&registry);
        let inner = Rc::clone(&trace);
        registry.set("self", move || {
            inner.borrow_mut().push("self");
            let registry = weak.upgrade().unwrap();
            registry.remove("self").unwrap();
            let info = registry.get("self").unwrap();
            assert!(info.pending_removal);
            assert!(registry.contains("self"));
        });
        recorder(&registry, &trace, "after");

        registry.tick();
        assert_eq!(take(&trace), ["before", "self", "after"]);
        assert_eq!(registry.get("self"), Err(LoopError::NotFound("self".into())));

        recorder(&registry, &trace, "self");
        registry.tick();
        assert_eq!(take(&trace), ["before", "after", "self"]);
    }

    #[test]
    fn test_removing_later_sibling_skips_it() {
        let registry = Rc::new(LoopRegistry::new());
        let trace = Trace::default();
        let weak = Rc::downgrade(&registry);
        registry.set("killer", move || {
            weak.upgrade().unwrap().remove("victim").unwrap();
        });
        recorder(&registry, &trace, "victim");

        registry.tick();
        assert!(take(&trace).is_empty());
        assert!(!registry.contains("victim"));
    }

    #[test]
    fn test_entries_added_during_tick_run_next_tick() {
        let registry = Rc::new(LoopRegistry::new());
        let trace = Trace::default();
        let weak = Rc::downgrade(&registry);
        let inner = Rc::clone(&trace);
        registry.set("spawner", move || {
            let registry = weak.upgrade().unwrap();
            if !registry.contains("spawned") {
                recorder(&registry, &inner, "spawned");
            }
        });

        registry.tick();
        assert!(take(&trace).is_empty());
        registry.tick();
        assert_eq!(take(&trace), ["spawned"]);
    }

    #[test]
    fn test_priority_change_during_tick_applies_next_tick() {
        let registry = Rc::new(LoopRegistry::new());
        let trace = Trace::default();
        recorder(&registry, &trace, "a");
        let weak = Rc::downgrade(&registry);
        let inner = Rc::clone(&trace);
        registry.set("b", move || {
            inner.borrow_mut().push("b");
            weak.upgrade().unwrap().set_priority("b", 1).unwrap();
        });

        registry.tick();
        assert_eq!(take(&trace), ["a", "b"]);
        registry.tick();
        assert_eq!(take(&trace), ["b", "a"]);
    }

    #[test]
    fn test_set_revives_entry_removed_this_tick() {
        let registry = Rc::new(LoopRegistry::new());
        let trace = Trace::default();
        recorder(&registry, &trace, "target");
        let weak = Rc::downgrade(&registry);
        let inner = Rc::clone(&trace);
        registry.set("toggler", move || {
            let registry = weak.upgrade().unwrap();
            registry.remove("target").unwrap();
            recorder(&registry, &inner, "target");
        });

        registry.tick();
        assert!(registry.contains("target"));
        assert!(!registry.get("target").unwrap().pending_removal);
    }

    #[test]
    fn test_keep_ticking_flag() {
        let registry = Rc::new(LoopRegistry::new());
        assert!(registry.keep_ticking());
        let weak = Rc::downgrade(&registry);
        registry.set("quit", move || weak.upgrade().unwrap().set_keep_ticking(false));

        let mut ticks = 0;
        while registry.keep_ticking() {
            registry.tick();
            ticks += 1;
        }
        assert_eq!(ticks, 1);

        registry.reset();
        assert!(registry.keep_ticking());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_panicking_callback_leaves_registry_idle_and_swept() {
        let registry = Rc::new(LoopRegistry::new());
        let weak = Rc::downgrade(&registry);
        registry.set("doomed", move || {
            weak.upgrade().unwrap().remove("doomed").unwrap();
            panic!("callback failure");
        });

        let result = catch_unwind(AssertUnwindSafe(|| registry.tick()));
        assert!(result.is_err());
        assert!(!registry.is_ticking());
        assert!(!registry.contains("doomed"));
    }

    #[test]
    #[should_panic(expected = "already ticking")]
    fn test_nested_tick_panics() {
        let registry = Rc::new(LoopRegistry::new());
        let weak = Rc::downgrade(&registry);
        registry.set("nested", move || weak.upgrade().unwrap().tick());
        registry.tick();
    }

    #[test]
    #[should_panic(expected = "cannot reset the loop registry while ticking")]
    fn test_reset_while_ticking_panics() {
        let registry = Rc::new(LoopRegistry::new());
        let weak = Rc::downgrade(&registry);
        registry.set("reset", move || weak.upgrade().unwrap().reset());
        registry.tick();
    }
}
