//! 生命周期和内存回收测试模块
//! 测试快照对单元的钉住、延迟回收、内存复用和析构时机

use crate::{SyncCell, Versioned};
use std::sync::Arc;

/// 测试1: 快照把旧版本钉住，回收不影响它
#[test]
fn test_pin_across_reclaim() {
    let cell = SyncCell::<String>::new();
    cell.set_publish(String::from("A"));

    let held = cell.read_rt();
    assert_eq!(*held, "A");

    cell.set_publish(String::from("B"));
    cell.reclaim();

    // 被持有的版本仍然存活
    assert_eq!(*held, "A");
    // 存活版本: "A"（被持有）和 "B"（当前）
    assert_eq!(cell.live_versions(), 2);

    drop(held);
    cell.reclaim();
    assert_eq!(cell.live_versions(), 1);
}

/// 测试2: 回收后的单元在下次发布时被复用
#[test]
fn test_slot_memory_reuse() {
    let cell = SyncCell::<i32>::new();

    // 记录第一个发布（构造时的默认值）所在单元的地址
    let first_addr = {
        let snapshot = cell.read_rt();
        snapshot.slot_addr()
    };

    cell.set_publish(2);
    cell.reclaim();
    cell.set_publish(3);

    // 发布 3 复用了默认值的单元
    let snapshot = cell.read_rt();
    assert_eq!(*snapshot, 3);
    assert_eq!(snapshot.slot_addr(), first_addr);
}

/// 测试3: 无读者时回收把存活版本降到 1
#[test]
fn test_reclaim_progress() {
    let value = Versioned::new(0i32);
    for i in 1..=10 {
        value.set(i);
    }

    assert!(value.live_versions() > 1);

    value.reclaim();
    assert_eq!(value.live_versions(), 1);
    assert_eq!(*value.read(), 10);
}

/// 测试4: 克隆的快照同样钉住单元
#[test]
fn test_cloned_snapshot_pins() {
    let value = Versioned::new(String::from("x"));
    let a = value.read();
    let b = a.clone();

    value.set(String::from("y"));
    drop(a);
    value.reclaim();

    // b 仍然持有旧版本
    assert_eq!(*b, "x");
    assert_eq!(value.live_versions(), 2);

    drop(b);
    value.reclaim();
    assert_eq!(value.live_versions(), 1);
}

/// 测试5: 值的析构只在回收时发生
#[test]
fn test_destructor_runs_at_reclaim() {
    let probe = Arc::new(());

    let value = Versioned::new(Arc::clone(&probe));
    // probe 本体 + 工作值 + 单元里的版本
    assert_eq!(Arc::strong_count(&probe), 3);

    let held = value.read();
    value.set(Arc::new(()));
    // 工作值已替换，旧版本仍在单元中
    assert_eq!(Arc::strong_count(&probe), 2);

    // 快照钉住期间回收不会析构
    value.reclaim();
    assert_eq!(Arc::strong_count(&probe), 2);

    drop(held);
    value.reclaim();
    assert_eq!(Arc::strong_count(&probe), 1);
}

/// 测试6: 自动回收模式在每次写入后回收
#[test]
fn test_auto_reclaim() {
    let value = Versioned::with_auto_reclaim(0i32);

    for i in 1..=100 {
        value.set(i);
        assert_eq!(value.live_versions(), 1);
    }

    // 无读者时稳态只需要两个单元来回交替
    assert_eq!(value.total_versions(), 2);
    assert_eq!(*value.read(), 100);
}

/// 测试7: 单元集合只增不减，稳态大小等于同时被引用的版本峰值
#[test]
fn test_growth_bounded_by_held_versions() {
    let value = Versioned::new(0i32);

    // 持有 3 个不同版本的快照
    let mut held = Vec::new();
    for i in 1..=3 {
        value.set(i);
        held.push(value.read());
    }

    let peak = value.total_versions();

    // 之后的发布/回收循环不再增长
    for i in 4..=50 {
        value.set(i);
        value.reclaim();
        assert!(value.total_versions() <= peak + 1);
    }

    // 被持有的快照始终有效
    for (index, snapshot) in held.iter().enumerate() {
        assert_eq!(**snapshot, index as i32 + 1);
    }
}

/// 测试8: SignalledSyncCell 的缓存把上一个版本钉住直到刷新
#[test]
fn test_signalled_cache_pins_until_refresh() {
    use crate::{FrameSignal, SignalledSyncCell};

    let signal = Arc::new(FrameSignal::new());
    let cell = SignalledSyncCell::<String>::new(Arc::clone(&signal));

    signal.increment();
    cell.set_publish(String::from("old"));
    let old = cell.read_rt();
    assert_eq!(*old, "old");
    drop(old);

    cell.set_publish(String::from("new"));
    cell.reclaim();

    // 缓存仍引用 "old"，信号未推进时它保持存活
    assert_eq!(*cell.read_rt(), "old");

    signal.increment();
    assert_eq!(*cell.read_rt(), "new");

    // 缓存释放旧版本后即可回收
    cell.reclaim();
    let _ = cell.read_rt();
}

/// 测试9: 快照在 Versioned 丢弃前取得，随 Versioned 正常析构
#[test]
fn test_drop_order() {
    let value = Versioned::new(String::from("payload"));
    let snapshot = value.read();
    drop(value);

    // 单元由快照共享所有，容器先走不影响它
    assert_eq!(*snapshot, "payload");
}
