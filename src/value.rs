use crate::slot::{is_garbage, CurrentPtr, SlotCell, Snapshot};
use crate::sync::{fence, Mutex, Ordering};
use std::sync::Arc;
use std::vec::Vec;

/// A versioned value store with lock-free reads and deferred reclamation.
///
/// Writers install new versions under a writer mutex: the payload is stored
/// into an empty slot (allocating a new one at the tail only when none is
/// empty) and published by atomically switching the current-slot pointer.
/// Readers acquire shared ownership of the published slot with a single
/// lock-free pointer load; while a [`Snapshot`] is held, its slot is pinned
/// and cannot be reclaimed.
///
/// Old versions are not destroyed eagerly. [`Versioned::reclaim`] destroys
/// payloads referenced only by the container itself and flags their slots
/// for reuse; it is called by a non-realtime actor, or runs automatically
/// after every write when the store was built with
/// [`Versioned::with_auto_reclaim`].
/// Slot memory is never returned to the allocator while the store exists,
/// so the steady-state slot count equals the peak number of simultaneously
/// referenced versions.
///
/// Every method is thread-safe. Only [`Versioned::read`] is realtime-safe.
///
/// 一个带无锁读取和延迟回收的版本化值存储。
/// 写者在写者互斥锁下安装新版本：值被存入一个空单元（仅当没有空单元时
/// 才在尾部分配新单元），然后通过原子切换当前单元指针来发布。
/// 读者用一次无锁指针加载获得已发布单元的共享所有权；持有 [`Snapshot`]
/// 期间其单元被钉住，不会被回收。
/// 旧版本不会被立即销毁。[`Versioned::reclaim`] 销毁仅被容器自身引用的
/// 值并把其单元标记为可复用；单元内存在存储存活期间从不归还给分配器，
/// 稳态单元数等于同时被引用版本数的峰值。
/// 所有方法都是线程安全的，只有 [`Versioned::read`] 是实时安全的。
pub struct Versioned<T> {
    writer: Mutex<WriterState<T>>,
    current: CurrentPtr<T>,
    auto_reclaim: bool,
}

struct WriterState<T> {
    /// The writer-side copy that `modify` transforms.
    /// 供 `modify` 变换的写者侧副本。
    working: T,
    /// Growable slot collection. Indices are stable; payload addresses are
    /// stable because each slot lives behind its own `Arc`.
    /// 只增的单元集合。下标稳定；值地址也稳定，因为每个单元都位于自己的
    /// `Arc` 之后。
    slots: Vec<Arc<SlotCell<T>>>,
    /// `dead[i]` is true iff `slots[i]` is EMPTY or RECLAIMED.
    /// 当且仅当 `slots[i]` 为空或已回收时 `dead[i]` 为真。
    dead: Vec<bool>,
}

impl<T: Clone> Versioned<T> {
    /// Create a store whose first published version is `initial`.
    /// 创建一个存储，其第一个发布版本为 `initial`。
    pub fn new(initial: T) -> Self {
        Self::with_options(initial, false)
    }

    /// Like [`Versioned::new`], but every write also runs a reclamation
    /// pass while it already holds the writer mutex.
    ///
    /// 与 [`Versioned::new`] 相同，但每次写入都会在已持有写者互斥锁时
    /// 顺带执行一次回收。
    pub fn with_auto_reclaim(initial: T) -> Self {
        Self::with_options(initial, true)
    }

    fn with_options(initial: T, auto_reclaim: bool) -> Self {
        let slot = Arc::new(SlotCell::empty());
        // SAFETY: the slot was just allocated; nothing else references it.
        // SAFETY：单元刚刚分配，没有任何其他引用者。
        unsafe { slot.set(initial.clone()) };
        Versioned {
            writer: Mutex::new(WriterState {
                working: initial,
                slots: vec![Arc::clone(&slot)],
                dead: vec![false],
            }),
            current: CurrentPtr::new(slot),
            auto_reclaim,
        }
    }

    /// Transform the working value and publish the result as a new version.
    ///
    /// Non-realtime: takes the writer mutex and may allocate a slot. The
    /// payload is fully stored before the release-ordered publish, so any
    /// reader that observes the new version observes it complete.
    ///
    /// 变换工作值并把结果作为新版本发布。
    /// 非实时：获取写者互斥锁并可能分配单元。值在 release 发布之前已完整
    /// 写入，因此观察到新版本的读者看到的一定是完整的值。
    pub fn modify<F: FnOnce(&mut T)>(&self, update_fn: F) {
        let mut state = self.writer.lock();
        update_fn(&mut state.working);
        let value = state.working.clone();
        let index = state.empty_slot();
        let slot = Arc::clone(&state.slots[index]);
        // SAFETY: the slot at `index` is dead, so only the container
        // references it; no reader can reach it until the store below.
        // SAFETY：`index` 处的单元是死的，仅被容器引用；在下面的发布之前
        // 读者无法触及它。
        unsafe { slot.set(value) };
        state.dead[index] = false;
        self.current.store(slot);
        if self.auto_reclaim {
            state.reclaim();
        }
    }

    /// Publish `value` as a new version, discarding the prior working value.
    /// 把 `value` 作为新版本发布，丢弃之前的工作值。
    pub fn set(&self, value: T) {
        self.modify(move |working| *working = value);
    }
}

impl<T> Versioned<T> {
    /// Acquire shared ownership of the currently published version.
    ///
    /// Realtime-safe and lock-free: one acquire-ordered pointer load plus
    /// one refcount increment. The returned snapshot stays valid for as
    /// long as the caller keeps it.
    ///
    /// 获取当前已发布版本的共享所有权。
    /// 实时安全且无锁：一次 acquire 指针加载加一次引用计数递增。返回的
    /// 快照在调用者持有期间一直有效。
    #[inline]
    pub fn read(&self) -> Snapshot<T> {
        Snapshot::new(self.current.load())
    }

    /// Destroy every payload that no snapshot references any more and flag
    /// its slot for reuse. Non-realtime: takes the writer mutex.
    ///
    /// The currently published slot is never reclaimed: the published
    /// pointer itself holds a reference, keeping its refcount above the
    /// container-only level.
    ///
    /// 销毁所有不再被任何快照引用的值，并把其单元标记为可复用。
    /// 非实时：获取写者互斥锁。
    /// 当前已发布的单元永远不会被回收：发布指针本身持有一个引用，使其
    /// 引用计数高于"仅剩容器"的水平。
    pub fn reclaim(&self) {
        self.writer.lock().reclaim();
    }

    /// Number of slots currently holding a live payload.
    /// 当前持有存活值的单元数。
    #[cfg(test)]
    pub(crate) fn live_versions(&self) -> usize {
        self.writer.lock().dead.iter().filter(|dead| !**dead).count()
    }

    /// Total number of slots ever allocated.
    /// 迄今分配过的单元总数。
    #[cfg(test)]
    pub(crate) fn total_versions(&self) -> usize {
        self.writer.lock().slots.len()
    }
}

impl<T> WriterState<T> {
    /// Index of a dead slot, appending a fresh one when none exists.
    /// 返回一个死单元的下标；不存在时在尾部追加一个新单元。
    fn empty_slot(&mut self) -> usize {
        for (index, dead) in self.dead.iter().enumerate() {
            if *dead {
                return index;
            }
        }
        self.slots.push(Arc::new(SlotCell::empty()));
        self.dead.push(true);
        self.slots.len() - 1
    }

    fn reclaim(&mut self) {
        for (slot, dead) in self.slots.iter().zip(self.dead.iter_mut()) {
            if *dead {
                continue;
            }
            if is_garbage(slot) {
                // The last snapshot dropped its reference with a release
                // decrement; this fence orders the payload destruction
                // after that reader's final accesses.
                // 最后一个快照以 release 递减释放其引用；此屏障使值的销毁
                // 排在该读者最后一次访问之后。
                fence(Ordering::Acquire);
                // SAFETY: writer mutex held and only the container
                // references the slot, so no reader can be observing the
                // payload and none can appear (the slot is not current).
                // SAFETY：持有写者互斥锁且仅容器引用该单元，因此没有读者
                // 正在观察该值，也不会再出现（该单元不是当前版本）。
                unsafe { slot.clear() };
                *dead = true;
            }
        }
    }
}
