use crate::sync::{AtomicI32, Ordering};
use std::sync::Arc;

const NO_HOLDER: i32 = -1;

/// A ball thrown between N participants.
///
/// Coordinates exclusive access to a shared region among a compile-time
/// fixed set of participants, each typically a long-running thread. Only
/// the participant currently holding the ball may touch the region. When it
/// is done it must throw the ball to another named participant; everyone
/// else polls with [`TurnPlayer::try_catch`] and simply goes back to its
/// own work on a miss; there is no retry loop, so a realtime participant
/// never spins.
///
/// The release store of a throw happens-before the acquire catch, so
/// anything the thrower wrote to the shared region is visible to the
/// catcher.
///
/// As long as every participant that catches eventually throws to another,
/// every participant along the throw edges receives the ball infinitely
/// often. A participant nobody throws to starves by design.
///
/// 在 N 个参与者之间投掷的球。
/// 在编译期固定的一组参与者（通常是各自长期运行的线程）之间协调对共享
/// 区域的独占访问。只有当前持球的参与者可以接触该区域；用完后必须把球
/// 投给另一个指定的参与者，其余参与者通过 [`TurnPlayer::try_catch`] 轮询，
/// 未接到就回去做自己的工作；没有重试循环，实时参与者永远不会自旋。
/// 投掷的 release 存储 happens-before 接球的 acquire CAS，因此投掷者写入
/// 共享区域的内容对接球者可见。
/// 只要每个接到球的参与者最终把球投给别人，投掷边沿上的每个参与者都会
/// 无限次地接到球。没有人投给的参与者按设计饥饿。
pub struct TurnBall<const N: usize> {
    /// The participant the ball was last thrown to, or NO_HOLDER while it
    /// is locally held (or transiently inside a catch).
    /// 球最近被投向的参与者；球被本地持有（或接球瞬间）时为 NO_HOLDER。
    holder: AtomicI32,
}

impl<const N: usize> TurnBall<N> {
    const MIN_PARTICIPANTS: () = assert!(N >= 2, "a TurnBall needs at least two participants");

    /// Create a ball initially thrown to `first_catcher`.
    /// 创建一个球，初始投向 `first_catcher`。
    pub fn new(first_catcher: usize) -> Arc<Self> {
        let () = Self::MIN_PARTICIPANTS;
        assert!(
            first_catcher < N,
            "first catcher {} out of range (N = {})",
            first_catcher,
            N
        );
        Arc::new(TurnBall {
            holder: AtomicI32::new(first_catcher as i32),
        })
    }

    /// Create the handle participant `id` uses to catch and throw.
    /// 创建参与者 `id` 用来接球和投球的句柄。
    pub fn player(self: &Arc<Self>, id: usize) -> TurnPlayer<N> {
        assert!(id < N, "participant id {} out of range (N = {})", id, N);
        TurnPlayer {
            ball: Arc::clone(self),
            id: id as i32,
            has_token: false,
        }
    }

    #[inline]
    fn try_catch(&self, id: i32) -> bool {
        self.holder
            .compare_exchange_weak(id, NO_HOLDER, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn throw(&self, target: i32) {
        self.holder.store(target, Ordering::Release);
    }
}

/// One participant's side of a [`TurnBall`].
///
/// Not `Sync`: each participant handle belongs to the thread that plays
/// that role. It is `Send`, so a handle can be created up front and moved
/// into its thread.
///
/// [`TurnBall`] 的单个参与者一侧。
/// 不是 `Sync`：每个参与者句柄属于扮演该角色的线程。它是 `Send` 的，
/// 因此可以提前创建句柄再移动进对应线程。
pub struct TurnPlayer<const N: usize> {
    ball: Arc<TurnBall<N>>,
    id: i32,
    has_token: bool,
}

impl<const N: usize> TurnPlayer<N> {
    /// Attempt to catch the ball.
    ///
    /// Returns true on success. Returns false if the ball has not been
    /// thrown to this participant, or spuriously, because the underlying
    /// compare-exchange is the weak form; a ball thrown to us is always
    /// caught eventually. Catching while already holding is a programming
    /// error.
    ///
    /// 尝试接球。
    /// 成功返回 true。球没有投向本参与者时返回 false；也可能因为底层
    /// 使用弱形式的 compare-exchange 而伪失败；投向我们的球最终总能接到。
    /// 已持球时再接球是编程错误。
    #[inline]
    pub fn try_catch(&mut self) -> bool {
        debug_assert!(
            !self.has_token,
            "BUG: try_catch while already holding the ball"
        );
        if self.ball.try_catch(self.id) {
            self.has_token = true;
        }
        self.has_token
    }

    /// Throw the ball to `target`.
    ///
    /// Precondition: this participant holds the ball, and `target` is a
    /// valid participant other than itself. Violations are programming
    /// errors, checked in debug builds.
    ///
    /// 把球投给 `target`。
    /// 前置条件：本参与者持球，且 `target` 是除自己以外的合法参与者。
    /// 违反属于编程错误，在调试构建中检查。
    #[inline]
    pub fn throw_to(&mut self, target: usize) {
        debug_assert!(self.has_token, "BUG: throw_to without holding the ball");
        debug_assert!(
            target < N && target as i32 != self.id,
            "BUG: invalid throw target {}",
            target
        );
        self.has_token = false;
        self.ball.throw(target as i32);
    }

    /// If this participant holds the ball, or can catch it right now, run
    /// `critical` and then throw to `target`. Returns whether `critical`
    /// ran.
    ///
    /// 若本参与者持球（或此刻能接到球），则运行 `critical` 并随后投给
    /// `target`。返回 `critical` 是否执行。
    pub fn with_token<F: FnOnce()>(&mut self, target: usize, critical: F) -> bool {
        if !self.has_token && !self.try_catch() {
            return false;
        }
        critical();
        self.throw_to(target);
        true
    }

    /// Does this participant currently hold the ball?
    /// 本参与者当前是否持球？
    #[inline]
    pub fn holding(&self) -> bool {
        self.has_token
    }
}
