use crate::slot::Snapshot;
use crate::sync::{AtomicBool, Mutex, Ordering};
use crate::value::Versioned;

/// A working-copy/publish cell.
///
/// An `update` or `set` changes the working value but does not yet make it
/// visible to realtime readers; an explicit `publish` does. This decouples
/// "edit" from "make visible": a writer can stage several changes and commit
/// them as one version.
///
/// A newly constructed cell behaves as if it published its default value
/// exactly once, so [`SyncCell::read_rt`] is valid immediately.
///
/// 一个工作副本/发布单元。
/// `update` 或 `set` 修改工作值但尚未对实时读者可见；显式的 `publish`
/// 才使其可见。这把"编辑"与"生效"解耦：写者可以暂存多次修改，再作为
/// 一个版本一次性提交。
/// 新构造的单元表现得如同恰好发布过一次默认值，因此构造后立即调用
/// [`SyncCell::read_rt`] 是合法的。
pub struct SyncCell<T> {
    working: Mutex<T>,
    published: Versioned<T>,
    /// Set on publish, cleared on realtime read. A hint, not a guarantee.
    /// 发布时置位，实时读取时清除。只是提示，不是保证。
    unread: AtomicBool,
}

impl<T: Clone + Default> SyncCell<T> {
    /// Create a cell whose working value and first published version are
    /// `T::default()`.
    /// 创建一个单元，其工作值和第一个发布版本都是 `T::default()`。
    pub fn new() -> Self {
        Self::with_options(false)
    }

    /// Like [`SyncCell::new`], with reclamation running after every publish.
    /// 与 [`SyncCell::new`] 相同，但每次发布后都会执行回收。
    pub fn with_auto_reclaim() -> Self {
        Self::with_options(true)
    }

    fn with_options(auto_reclaim: bool) -> Self {
        let working = T::default();
        let published = if auto_reclaim {
            Versioned::with_auto_reclaim(working.clone())
        } else {
            Versioned::new(working.clone())
        };
        SyncCell {
            working: Mutex::new(working),
            published,
            unread: AtomicBool::new(true),
        }
    }
}

impl<T: Clone + Default> Default for SyncCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> SyncCell<T> {
    /// Deep copy of the working value. Non-realtime.
    /// 工作值的深拷贝。非实时。
    pub fn read_working(&self) -> T {
        self.working.lock().clone()
    }

    /// Replace the working value without publishing. Non-realtime.
    /// 替换工作值但不发布。非实时。
    pub fn set(&self, value: T) {
        *self.working.lock() = value;
    }

    /// Mutate the working value without publishing and return a copy of the
    /// result. Non-realtime. Concurrent updates serialize on the working
    /// mutex.
    ///
    /// 修改工作值但不发布，并返回结果的副本。非实时。并发的 update 在
    /// 工作值互斥锁上串行化。
    pub fn update<F: FnOnce(&mut T)>(&self, update_fn: F) -> T {
        let mut working = self.working.lock();
        update_fn(&mut working);
        working.clone()
    }

    /// Make the current working value visible to realtime readers.
    ///
    /// The working value is copied out with its mutex held, the mutex is
    /// released, and the copy is installed as a new published version; a
    /// `read_rt` that returns this version therefore always observes it
    /// fully constructed.
    ///
    /// 使当前工作值对实时读者可见。
    /// 工作值在持有其互斥锁时被拷出，随后释放锁，再把副本安装为新的发布
    /// 版本；因此返回该版本的 `read_rt` 观察到的一定是完整构造的值。
    pub fn publish(&self) {
        let value = self.read_working();
        self.published.set(value);
        self.unread.store(true, Ordering::Release);
    }

    /// `set` followed by `publish`.
    /// 先 `set` 后 `publish`。
    pub fn set_publish(&self, value: T) {
        self.set(value);
        self.publish();
    }

    /// `update` followed by `publish`; returns the new working value.
    /// 先 `update` 后 `publish`；返回新的工作值。
    pub fn update_publish<F: FnOnce(&mut T)>(&self, update_fn: F) -> T {
        let value = self.update(update_fn);
        self.publish();
        value
    }
}

impl<T> SyncCell<T> {
    /// Acquire the most recently published version. Realtime-safe,
    /// lock-free; clears the unread hint.
    ///
    /// 获取最近发布的版本。实时安全、无锁；清除未读提示。
    #[inline]
    pub fn read_rt(&self) -> Snapshot<T> {
        let snapshot = self.published.read();
        self.unread.store(false, Ordering::Release);
        snapshot
    }

    /// Has the most recent publish been observed by a realtime reader yet?
    /// A possibly-stale hint.
    ///
    /// 最近一次发布是否已被实时读者观察到？可能过期的提示。
    #[inline]
    pub fn is_unread(&self) -> bool {
        self.unread.load(Ordering::Acquire)
    }

    /// Reclaim versions no reader references any more. Non-realtime.
    /// 回收不再被任何读者引用的版本。非实时。
    pub fn reclaim(&self) {
        self.published.reclaim();
    }

    /// Read the published version without touching the unread hint.
    /// 读取已发布版本但不触碰未读提示。
    pub(crate) fn peek_published(&self) -> Snapshot<T> {
        self.published.read()
    }

    #[cfg(test)]
    pub(crate) fn live_versions(&self) -> usize {
        self.published.live_versions()
    }

    #[cfg(test)]
    pub(crate) fn total_versions(&self) -> usize {
        self.published.total_versions()
    }
}
