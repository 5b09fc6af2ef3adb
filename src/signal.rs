use crate::cell::SyncCell;
use crate::slot::Snapshot;
use crate::sync::{AtomicU64, Ordering};
use std::cell::UnsafeCell;
use std::sync::Arc;

/// A monotonic frame counter, incremented by the realtime side once at the
/// start of each processing frame (e.g. each audio callback). Initial
/// value 1. Ordinary relaxed loads suffice for observers: the signal only
/// gates whether a [`SignalledSyncCell`] refreshes its cache.
///
/// 单调的帧计数器，由实时侧在每个处理帧（例如每次音频回调）开始时递增
/// 一次。初始值为 1。观察者用普通的 relaxed 加载即可：信号只用来决定
/// [`SignalledSyncCell`] 是否刷新缓存。
pub struct FrameSignal {
    value: AtomicU64,
}

impl FrameSignal {
    pub fn new() -> Self {
        FrameSignal {
            value: AtomicU64::new(1),
        }
    }

    /// Advance to the next frame. Realtime side only.
    /// 推进到下一帧。仅限实时侧调用。
    #[inline]
    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Current frame number.
    /// 当前帧号。
    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for FrameSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Debug-build guard for the single-realtime-reader contract: the first
/// thread to call a realtime read is recorded, and any later call from a
/// different thread panics.
///
/// 调试构建下对"单一实时读者"契约的检查：记录第一个调用实时读取的线程，
/// 之后来自其他线程的调用会 panic。
struct SingleReader {
    #[cfg(debug_assertions)]
    thread: std::sync::OnceLock<std::thread::ThreadId>,
}

impl SingleReader {
    fn new() -> Self {
        SingleReader {
            #[cfg(debug_assertions)]
            thread: std::sync::OnceLock::new(),
        }
    }

    #[inline]
    fn check(&self) {
        #[cfg(debug_assertions)]
        {
            let current = std::thread::current().id();
            let first = *self.thread.get_or_init(|| current);
            assert_eq!(
                first, current,
                "BUG: read_rt called from two different threads. \
                 A signalled cell supports exactly one realtime reader."
            );
        }
    }
}

struct CacheState<T> {
    last_seen: u64,
    cached: Snapshot<T>,
}

/// The reader-owned cache. Interior mutability is sound because exactly one
/// realtime thread mutates it (the contract checked by [`SingleReader`]);
/// violating that contract is undefined behavior in release builds.
///
/// 读者独占的缓存。内部可变性之所以成立，是因为只有一个实时线程会修改它
/// （由 [`SingleReader`] 检查的契约）；在发布构建中违反该契约是未定义
/// 行为。
struct ReaderCache<T> {
    state: UnsafeCell<CacheState<T>>,
    single_reader: SingleReader,
}

unsafe impl<T: Send + Sync> Send for ReaderCache<T> {}
unsafe impl<T: Send + Sync> Sync for ReaderCache<T> {}

/// A [`SyncCell`] whose realtime reads are stable across a frame.
///
/// Two successive [`read_rt`](SignalledSyncCell::read_rt) calls within the
/// same frame return the same version, even if a writer publishes in
/// between: the published value is only re-fetched when the associated
/// [`FrameSignal`] has advanced past the locally recorded frame number.
///
/// The motivating shape is an audio callback:
///
/// ```
/// use std::sync::Arc;
/// use rt_sync::{FrameSignal, SignalledSyncCell};
///
/// let signal = Arc::new(FrameSignal::new());
/// let cell: SignalledSyncCell<u32> = SignalledSyncCell::new(Arc::clone(&signal));
///
/// // audio callback:
/// signal.increment();
/// let value1 = cell.read_rt();
/// // ... a UI thread may publish a new version here ...
/// let value2 = cell.read_rt();
/// assert_eq!(*value1, *value2); // same frame, same version
/// ```
///
/// At most one realtime thread may call `read_rt` on a given instance.
///
/// 实时读取在一帧内保持稳定的 [`SyncCell`]。
/// 同一帧内的两次 [`read_rt`](SignalledSyncCell::read_rt) 返回同一版本，
/// 即使期间有写者发布：只有当关联的 [`FrameSignal`] 超过本地记录的帧号
/// 时才会重新获取已发布的值。
/// 每个实例最多只允许一个实时线程调用 `read_rt`。
pub struct SignalledSyncCell<T> {
    cell: SyncCell<T>,
    signal: Arc<FrameSignal>,
    reader: ReaderCache<T>,
}

impl<T: Clone + Default> SignalledSyncCell<T> {
    /// Create a cell gated by `signal`, with a published default value.
    /// 创建一个由 `signal` 门控、已发布默认值的单元。
    pub fn new(signal: Arc<FrameSignal>) -> Self {
        Self::with_cell(SyncCell::new(), signal)
    }

    /// Like [`SignalledSyncCell::new`], reclaiming after every publish.
    /// 与 [`SignalledSyncCell::new`] 相同，但每次发布后都会回收。
    pub fn with_auto_reclaim(signal: Arc<FrameSignal>) -> Self {
        Self::with_cell(SyncCell::with_auto_reclaim(), signal)
    }

    fn with_cell(cell: SyncCell<T>, signal: Arc<FrameSignal>) -> Self {
        let cached = cell.peek_published();
        SignalledSyncCell {
            cell,
            signal,
            reader: ReaderCache {
                // last_seen starts below the signal's initial value, so the
                // first read_rt always fetches.
                // last_seen 从低于信号初始值开始，因此第一次 read_rt 总会
                // 获取。
                state: UnsafeCell::new(CacheState {
                    last_seen: 0,
                    cached,
                }),
                single_reader: SingleReader::new(),
            },
        }
    }
}

impl<T: Clone> SignalledSyncCell<T> {
    /// See [`SyncCell::read_working`].
    pub fn read_working(&self) -> T {
        self.cell.read_working()
    }

    /// See [`SyncCell::set`].
    pub fn set(&self, value: T) {
        self.cell.set(value);
    }

    /// See [`SyncCell::update`].
    pub fn update<F: FnOnce(&mut T)>(&self, update_fn: F) -> T {
        self.cell.update(update_fn)
    }

    /// See [`SyncCell::publish`].
    pub fn publish(&self) {
        self.cell.publish();
    }

    /// See [`SyncCell::set_publish`].
    pub fn set_publish(&self, value: T) {
        self.cell.set_publish(value);
    }

    /// See [`SyncCell::update_publish`].
    pub fn update_publish<F: FnOnce(&mut T)>(&self, update_fn: F) -> T {
        self.cell.update_publish(update_fn)
    }
}

impl<T> SignalledSyncCell<T> {
    /// The most recently fetched published version, re-fetched only when
    /// the frame signal has advanced. Realtime-safe, lock-free.
    ///
    /// 最近获取的已发布版本；仅当帧信号推进后才重新获取。实时安全、无锁。
    #[inline]
    pub fn read_rt(&self) -> Snapshot<T> {
        self.reader.single_reader.check();
        // SAFETY: at most one realtime thread calls read_rt on this
        // instance, so the cache is effectively thread-local here.
        // SAFETY：每个实例最多一个实时线程调用 read_rt，因此这里的缓存
        // 实际上是线程本地的。
        let cache = unsafe { &mut *self.reader.state.get() };
        let signal_value = self.signal.get();
        if signal_value > cache.last_seen {
            cache.last_seen = signal_value;
            cache.cached = self.cell.read_rt();
        }
        cache.cached.clone()
    }

    /// See [`SyncCell::is_unread`].
    #[inline]
    pub fn is_unread(&self) -> bool {
        self.cell.is_unread()
    }

    /// See [`SyncCell::reclaim`].
    pub fn reclaim(&self) {
        self.cell.reclaim();
    }

    pub(crate) fn peek_published(&self) -> Snapshot<T> {
        self.cell.peek_published()
    }
}

/// Like [`SignalledSyncCell`], but parks fetched snapshots in one of N
/// caller-chosen slots, so several published versions can be kept alive at
/// once. The motivating use is an audio application that crossfades between
/// the old and the new project state: set N == 2 and ping-pong between the
/// two slots.
///
/// Same single-realtime-reader contract as the inner cell.
///
/// 与 [`SignalledSyncCell`] 类似，但把取得的快照停放在 N 个由调用者选择
/// 的槽位之一，从而可以同时保持多个已发布版本存活。典型用途是在新旧工程
/// 状态之间交叉淡化的音频程序：取 N == 2 并在两个槽位间乒乓。
/// 与内部单元相同的单一实时读者契约。
pub struct SignalledSyncArray<T, const N: usize> {
    inner: SignalledSyncCell<T>,
    parked: UnsafeCell<[Snapshot<T>; N]>,
}

unsafe impl<T: Send + Sync, const N: usize> Send for SignalledSyncArray<T, N> {}
unsafe impl<T: Send + Sync, const N: usize> Sync for SignalledSyncArray<T, N> {}

impl<T: Clone + Default, const N: usize> SignalledSyncArray<T, N> {
    pub fn new(signal: Arc<FrameSignal>) -> Self {
        let inner = SignalledSyncCell::new(signal);
        let parked = std::array::from_fn(|_| inner.peek_published());
        SignalledSyncArray {
            inner,
            parked: UnsafeCell::new(parked),
        }
    }

    /// See [`SyncCell::set_publish`].
    pub fn set_publish(&self, value: T) {
        self.inner.set_publish(value);
    }
}

impl<T, const N: usize> SignalledSyncArray<T, N> {
    /// Fetch the frame-stable published version and park it in `slot`,
    /// keeping that version alive until the slot is overwritten. Realtime-
    /// safe, lock-free.
    ///
    /// 获取帧稳定的已发布版本并停放到 `slot`，使该版本存活到槽位被覆盖
    /// 为止。实时安全、无锁。
    pub fn read_into(&self, slot: usize) -> Snapshot<T> {
        assert!(slot < N, "slot index {} out of range (N = {})", slot, N);
        let snapshot = self.inner.read_rt();
        // SAFETY: read_rt above enforces the single-realtime-reader
        // contract, and only that reader reaches the parked array.
        // SAFETY：上面的 read_rt 已强制单一实时读者契约，且只有该读者会
        // 访问停放数组。
        let parked = unsafe { &mut *self.parked.get() };
        parked[slot] = snapshot.clone();
        snapshot
    }

    /// See [`SyncCell::is_unread`].
    pub fn is_unread(&self) -> bool {
        self.inner.is_unread()
    }

    /// See [`SyncCell::reclaim`].
    pub fn reclaim(&self) {
        self.inner.reclaim();
    }
}
