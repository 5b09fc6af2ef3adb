use crate::sync::{AtomicBool, Ordering};

/// A single-bit set/test-and-clear latch.
///
/// [`fire`](EdgeTrigger::fire) arms it; [`take`](EdgeTrigger::take) reports
/// whether it was armed and clears it. Relaxed ordering throughout: the
/// trigger carries an edge, not cross-thread data.
///
/// 单比特的置位/测试并清除锁存器。
/// [`fire`](EdgeTrigger::fire) 置位；[`take`](EdgeTrigger::take) 报告是否
/// 已置位并清除。全程 relaxed 顺序：触发器只传递一个边沿，不携带跨线程
/// 数据。
pub struct EdgeTrigger {
    armed: AtomicBool,
}

impl EdgeTrigger {
    pub fn new() -> Self {
        EdgeTrigger {
            armed: AtomicBool::new(false),
        }
    }

    /// Arm the trigger.
    /// 置位触发器。
    #[inline]
    pub fn fire(&self) {
        self.armed.store(true, Ordering::Relaxed);
    }

    /// Was the trigger armed? Clears it either way.
    /// 触发器是否已置位？无论如何都会清除。
    #[inline]
    pub fn take(&self) -> bool {
        self.armed.swap(false, Ordering::Relaxed)
    }
}

impl Default for EdgeTrigger {
    fn default() -> Self {
        Self::new()
    }
}
