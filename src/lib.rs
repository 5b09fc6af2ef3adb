//! Realtime-safe synchronization primitives for audio applications (and
//! other hard-realtime producer/consumer contexts): non-realtime writers
//! publish updates to realtime readers that never block, never allocate,
//! and never wait on anything of unbounded latency.
//!
//! - [`Versioned`]: a versioned value store with lock-free reads and
//!   deferred reclamation; slot memory is reused, never freed.
//! - [`SyncCell`]: a mutex-protected working copy with an explicit
//!   publish step separating "edit" from "make visible".
//! - [`SignalledSyncCell`] / [`FrameSignal`]: reads that stay stable
//!   across one processing frame for a single realtime reader.
//! - [`SignalledSyncArray`]: parks several fetched versions at once
//!   (e.g. for crossfades).
//! - [`TurnBall`] / [`TurnPlayer`]: cooperative turn passing among a
//!   compile-time fixed set of participants.
//! - [`EdgeTrigger`]: a single-bit set/test-and-clear latch.
//!
//! Methods suffixed `_rt` (plus [`Snapshot`] clone/drop/deref, the
//! [`FrameSignal`] and [`TurnPlayer`] operations, and [`EdgeTrigger`]) are
//! realtime-safe; everything else may lock or allocate.
//!
//! 面向音频程序（以及其他硬实时生产者/消费者场景）的实时安全同步原语：
//! 非实时写者向实时读者发布更新，读者永不阻塞、永不分配内存、也不等待
//! 任何延迟无界的操作。
//! 以 `_rt` 结尾的方法（以及 [`Snapshot`] 的克隆/丢弃/解引用、
//! [`FrameSignal`] 与 [`TurnPlayer`] 的操作、[`EdgeTrigger`]）是实时安全
//! 的；其余方法可能加锁或分配。

mod ball;
mod cell;
mod signal;
mod slot;
mod sync;
mod trigger;
mod value;

pub use ball::{TurnBall, TurnPlayer};
pub use cell::SyncCell;
pub use signal::{FrameSignal, SignalledSyncArray, SignalledSyncCell};
pub use slot::Snapshot;
pub use trigger::EdgeTrigger;
pub use value::Versioned;

#[cfg(test)]
mod tests;
