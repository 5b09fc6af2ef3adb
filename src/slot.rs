use std::cell::UnsafeCell;
use std::sync::Arc;

/// A reusable storage cell for one payload version.
///
/// The payload is wrapped in an `Option` so that the cell's memory can be
/// reused across versions while still running the payload destructor exactly
/// once per logical lifetime: `clear()` destroys the payload in place and
/// leaves the cell canonically empty, and a later `set()` constructs a fresh
/// payload into the same cell.
///
/// Mutation goes through an `UnsafeCell` because the cell is shared (the
/// container and any number of `Snapshot` holders reference it through an
/// `Arc`), yet the reclamation protocol guarantees exclusivity at every
/// mutation site: a cell is only written while the writer mutex is held AND
/// the container holds the sole reference to it.
///
/// 一个可复用的存储单元，保存某个值的一个版本。
/// 值被包裹在 `Option` 中，这样单元的内存可以跨版本复用，同时仍然保证
/// 每个逻辑生命周期恰好运行一次析构：`clear()` 就地销毁值并把单元置空，
/// 之后的 `set()` 在同一单元中构造新值。
/// 修改通过 `UnsafeCell` 进行；回收协议保证每个修改点都是独占的：
/// 只有在持有写者互斥锁、且容器是该单元唯一引用者时才会写入。
pub(crate) struct SlotCell<T> {
    payload: UnsafeCell<Option<T>>,
}

// The payload may be constructed on one writer thread and destroyed on
// another (writers are serialized, not pinned), hence `T: Send` for both.
// Readers share `&T` concurrently, hence `T: Sync` for `Sync`.
//
// 值可能在一个写者线程上构造、在另一个写者线程上销毁（写者被串行化，
// 但不绑定到固定线程），因此两者都要求 `T: Send`。
// 读者并发共享 `&T`，因此 `Sync` 还要求 `T: Sync`。
unsafe impl<T: Send> Send for SlotCell<T> {}
unsafe impl<T: Send + Sync> Sync for SlotCell<T> {}

impl<T> SlotCell<T> {
    /// Create an EMPTY cell.
    /// 创建一个空单元。
    pub(crate) fn empty() -> Self {
        SlotCell {
            payload: UnsafeCell::new(None),
        }
    }

    /// Store a payload, transitioning EMPTY/RECLAIMED -> LIVE.
    ///
    /// # Safety
    /// The caller must hold the writer mutex and the cell must be
    /// unreachable by readers: either freshly allocated, or flagged dead
    /// with only the container's reference remaining.
    ///
    /// 存入一个值，状态从空/已回收变为存活。
    /// 安全性：调用者必须持有写者互斥锁，且该单元对读者不可达
    /// （刚分配，或已标记为死且仅剩容器自身的引用）。
    #[inline]
    pub(crate) unsafe fn set(&self, value: T) {
        unsafe { *self.payload.get() = Some(value) };
    }

    /// Destroy the payload in place, transitioning LIVE -> RECLAIMED.
    ///
    /// # Safety
    /// Same contract as [`SlotCell::set`]: writer mutex held, no external
    /// observer holds the cell.
    ///
    /// 就地销毁值，状态从存活变为已回收。
    /// 安全性：与 [`SlotCell::set`] 相同，持有写者互斥锁且没有外部观察者。
    #[inline]
    pub(crate) unsafe fn clear(&self) {
        unsafe { *self.payload.get() = None };
    }

    /// Borrow the payload.
    ///
    /// # Safety
    /// The caller must hold shared ownership that keeps the cell LIVE for
    /// the lifetime of the returned reference (a `Snapshot` does exactly
    /// this).
    ///
    /// 借用值。
    /// 安全性：调用者必须持有使单元在返回引用的生命周期内保持存活的
    /// 共享所有权（`Snapshot` 正是如此）。
    #[inline]
    pub(crate) unsafe fn payload(&self) -> Option<&T> {
        unsafe { (*self.payload.get()).as_ref() }
    }
}

/// True when only the container's own reference to the cell remains, i.e.
/// no published pointer and no reader snapshot keeps it alive.
///
/// 当仅剩容器自身对该单元的引用时为真，即没有已发布指针、也没有任何
/// 读者快照使其存活。
#[inline]
pub(crate) fn is_garbage<T>(slot: &Arc<SlotCell<T>>) -> bool {
    Arc::strong_count(slot) <= 1
}

/// Shared, immutable ownership of one published payload version.
///
/// While a `Snapshot` exists the slot it references stays LIVE, regardless
/// of interleaved publishes and reclamation; the payload behind it is
/// guaranteed to be present and fully constructed.
///
/// Cloning and dropping a `Snapshot` are realtime-safe (a single atomic
/// refcount operation, no allocation).
///
/// 对某个已发布版本的共享只读所有权。
/// 只要 `Snapshot` 存在，它引用的单元就保持存活，不受交错的发布和回收
/// 影响；其背后的值保证存在且已完整构造。
/// 克隆和丢弃 `Snapshot` 都是实时安全的（一次原子引用计数操作，无分配）。
pub struct Snapshot<T> {
    slot: Arc<SlotCell<T>>,
}

impl<T> Snapshot<T> {
    #[inline]
    pub(crate) fn new(slot: Arc<SlotCell<T>>) -> Self {
        Snapshot { slot }
    }

    /// True when both snapshots reference the same slot, i.e. the same
    /// published version identity (not merely equal payloads).
    ///
    /// 当两个快照引用同一个单元（同一个已发布版本，而不仅仅是相等的值）
    /// 时为真。
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.slot, &b.slot)
    }

    /// Raw slot address, for memory-reuse assertions in tests.
    /// 单元的裸地址，用于测试中的内存复用断言。
    #[cfg(test)]
    pub(crate) fn slot_addr(&self) -> *const () {
        Arc::as_ptr(&self.slot) as *const ()
    }
}

impl<T> std::ops::Deref for Snapshot<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: this snapshot holds shared ownership of the slot, so the
        // reclamation protocol cannot clear it while we are alive.
        // SAFETY：本快照持有该单元的共享所有权，回收协议不可能在我们存活
        // 期间清除它。
        unsafe { self.slot.payload() }
            .expect("BUG: a Snapshot observed a reclaimed slot. This indicates a library bug.")
    }
}

impl<T> Clone for Snapshot<T> {
    #[inline]
    fn clone(&self) -> Self {
        Snapshot {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Snapshot").field(&**self).finish()
    }
}

/// Holder of the published-slot pointer.
///
/// The realtime read path needs to observe the pointer and raise the slot's
/// refcount atomically with respect to reclamation, in bounded lock-free
/// steps. `arc-swap` provides exactly that: `load_full()` is lock-free, and
/// a completed `store()` guarantees that every in-flight load of the
/// previous value is already reflected in its strong count, so the
/// container-only-reference test in `reclaim` is conservative.
///
/// 已发布单元指针的持有者。
/// 实时读取路径需要在有界的无锁步骤内读取指针并相对于回收原子地增加
/// 引用计数。`arc-swap` 恰好提供这一点：`load_full()` 是无锁的，而一次
/// 完成的 `store()` 保证对旧值的所有在途读取都已反映在其强引用计数中，
/// 因此 `reclaim` 中"仅剩容器引用"的判断是保守的。
#[cfg(not(loom))]
pub(crate) struct CurrentPtr<T> {
    inner: arc_swap::ArcSwap<SlotCell<T>>,
}

#[cfg(not(loom))]
impl<T> CurrentPtr<T> {
    pub(crate) fn new(slot: Arc<SlotCell<T>>) -> Self {
        CurrentPtr {
            inner: arc_swap::ArcSwap::new(slot),
        }
    }

    #[inline]
    pub(crate) fn load(&self) -> Arc<SlotCell<T>> {
        self.inner.load_full()
    }

    #[inline]
    pub(crate) fn store(&self, slot: Arc<SlotCell<T>>) {
        self.inner.store(slot);
    }
}

// Loom cannot model arc-swap's internals, so the model-checking build
// substitutes a mutex around the same Arc. This preserves the
// acquire/release edge between publish and read that the tests verify; it
// does not model lock-freedom, which loom cannot observe anyway.
//
// loom 无法对 arc-swap 的内部建模，因此模型检查构建用一个互斥锁包住同一个
// Arc。这保留了发布与读取之间的 acquire/release 边（测试验证的就是它），
// 无锁性 loom 本来也观察不到。
#[cfg(loom)]
pub(crate) struct CurrentPtr<T> {
    inner: loom::sync::Mutex<Arc<SlotCell<T>>>,
}

#[cfg(loom)]
impl<T> CurrentPtr<T> {
    pub(crate) fn new(slot: Arc<SlotCell<T>>) -> Self {
        CurrentPtr {
            inner: loom::sync::Mutex::new(slot),
        }
    }

    pub(crate) fn load(&self) -> Arc<SlotCell<T>> {
        Arc::clone(&self.inner.lock().unwrap())
    }

    pub(crate) fn store(&self, slot: Arc<SlotCell<T>>) {
        *self.inner.lock().unwrap() = slot;
    }
}
