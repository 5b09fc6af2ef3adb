//! 边界情况测试模块
//! 测试空回收、重复回收、信号边界、N 参与者回合和特殊负载类型

use crate::{FrameSignal, SignalledSyncArray, SignalledSyncCell, Snapshot, SyncCell, TurnBall, Versioned};
use std::sync::Arc;

/// 测试1: 没有垃圾时回收是空操作
#[test]
fn test_reclaim_nothing_to_do() {
    let value = Versioned::new(1i32);

    value.reclaim();
    value.reclaim();

    assert_eq!(value.live_versions(), 1);
    assert_eq!(*value.read(), 1);
}

/// 测试2: 回收是幂等的
#[test]
fn test_reclaim_idempotent() {
    let value = Versioned::new(0i32);
    for i in 1..=5 {
        value.set(i);
    }

    value.reclaim();
    let live = value.live_versions();
    value.reclaim();
    assert_eq!(value.live_versions(), live);
    assert_eq!(live, 1);
}

/// 测试3: 当前版本永远不会被回收
#[test]
fn test_current_never_reclaimed() {
    let value = Versioned::new(String::from("keep"));

    // 没有任何读者持有快照
    value.reclaim();

    // 已发布的版本必须完好
    assert_eq!(*value.read(), "keep");
}

/// 测试4: 信号推进但没有新发布时重新获取同一版本
#[test]
fn test_signal_advance_without_publish() {
    let signal = Arc::new(FrameSignal::new());
    let cell = SignalledSyncCell::<i32>::new(Arc::clone(&signal));

    signal.increment();
    cell.set_publish(5);
    let first = cell.read_rt();

    signal.increment();
    let second = cell.read_rt();

    // 重新获取的是同一个已发布单元
    assert!(Snapshot::ptr_eq(&first, &second));
    assert_eq!(*second, 5);
}

/// 测试5: 连续多帧各自观察最新发布
#[test]
fn test_signal_gated_refresh_sequence() {
    let signal = Arc::new(FrameSignal::new());
    let cell = SignalledSyncCell::<i32>::new(Arc::clone(&signal));

    for frame in 1..=10 {
        cell.set_publish(frame);
        signal.increment();
        assert_eq!(*cell.read_rt(), frame);
        // 帧内再发布不可见
        cell.set_publish(frame + 100);
        assert_eq!(*cell.read_rt(), frame);
        // 把帧内发布的值冲掉，保持下一轮的期望简单
        cell.set_publish(frame + 1);
    }
}

/// 测试6: 三个参与者按环传递
#[test]
fn test_turn_ball_three_party_ring() {
    let ball = TurnBall::<3>::new(0);
    let mut players: Vec<_> = (0..3).map(|id| ball.player(id)).collect();

    for round in 0..9 {
        let id = round % 3;
        let next = (id + 1) % 3;

        // 只有轮到的参与者能接到球
        for (other, player) in players.iter_mut().enumerate() {
            if other != id {
                assert!(!player.try_catch());
            }
        }
        assert!(players[id].try_catch());
        players[id].throw_to(next);
    }
}

/// 测试7: 接球与投球的守恒
#[test]
fn test_turn_conservation() {
    let ball = TurnBall::<2>::new(0);
    let mut p0 = ball.player(0);
    let mut p1 = ball.player(1);

    let mut catches = 0i32;
    let mut throws = 0i32;

    let holding = |p0: &crate::TurnPlayer<2>, p1: &crate::TurnPlayer<2>| {
        usize::from(p0.holding()) + usize::from(p1.holding())
    };

    assert_eq!(catches - throws, 0);
    assert_eq!(holding(&p0, &p1), 0);

    assert!(p0.try_catch());
    catches += 1;
    assert_eq!(catches - throws, 1);
    assert_eq!(holding(&p0, &p1), 1);

    p0.throw_to(1);
    throws += 1;
    assert_eq!(catches - throws, 0);
    assert_eq!(holding(&p0, &p1), 0);

    assert!(p1.try_catch());
    catches += 1;
    assert_eq!(catches - throws, 1);
    assert_eq!(holding(&p0, &p1), 1);
}

/// 测试8: 零大小负载
#[test]
fn test_zero_sized_payload() {
    let cell = SyncCell::<()>::new();
    cell.set_publish(());
    cell.reclaim();
    let snapshot = cell.read_rt();
    assert_eq!(*snapshot, ());
}

/// 测试9: 大负载的发布与回收
#[test]
fn test_large_payload() {
    let cell = SyncCell::<Vec<u8>>::new();

    cell.set_publish(vec![0xAB; 1 << 16]);
    let snapshot = cell.read_rt();
    assert_eq!(snapshot.len(), 1 << 16);
    assert!(snapshot.iter().all(|&b| b == 0xAB));

    drop(snapshot);
    cell.set_publish(Vec::new());
    cell.reclaim();
    assert!(cell.read_rt().is_empty());
}

/// 测试10: SignalledSyncArray 把多个版本同时停放
#[test]
fn test_signalled_array_parks_versions() {
    let signal = Arc::new(FrameSignal::new());
    let array = SignalledSyncArray::<i32, 2>::new(Arc::clone(&signal));

    signal.increment();
    array.set_publish(1);
    let old = array.read_into(0);
    assert_eq!(*old, 1);

    signal.increment();
    array.set_publish(2);
    let new = array.read_into(1);
    assert_eq!(*new, 2);

    // 槽位 0 仍然停放着版本 1，回收不能动它
    array.reclaim();
    assert_eq!(*old, 1);

    // 覆盖槽位 0 之后版本 1 才可回收
    signal.increment();
    drop(old);
    let replaced = array.read_into(0);
    assert_eq!(*replaced, 2);
    array.reclaim();
}

/// 测试11: 工作值读取与发布互不干扰
#[test]
fn test_read_working_does_not_publish() {
    let cell = SyncCell::<i32>::new();
    cell.set(41);

    assert_eq!(cell.read_working(), 41);
    assert_eq!(*cell.read_rt(), 0);

    cell.update(|v| *v += 1);
    assert_eq!(cell.read_working(), 42);
    assert_eq!(*cell.read_rt(), 0);
}

/// 测试12: Snapshot 的 Debug 输出包含负载
#[test]
fn test_snapshot_debug() {
    let value = Versioned::new(7i32);
    let snapshot = value.read();
    assert_eq!(format!("{:?}", snapshot), "Snapshot(7)");
}
