/// Stream name prefix. Mirrors the source's `trading:` namespacing
/// (`trading:tx_event`, `trading:new_swap_event`) so multiple services can
/// share one Redis instance without key collisions.
const PREFIX: &str = "copytrade";

/// The four streams the pipeline moves work items through, §2/§5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    /// Raw classified leader swaps from the (external) block watcher.
    LeaderTx,
    /// Shaped follower orders ready for the Route Registry/Executor.
    CopyIntent,
    /// Terminal settlement outcomes, consumed by the Notifier.
    CopySettled,
    /// Out-of-band control messages (pause/resume a subscription, etc.).
    MonitorControl,
}

impl Topic {
    pub fn stream_key(self) -> String {
        format!("{PREFIX}:{}", self.name())
    }

    pub fn name(self) -> &'static str {
        match self {
            Topic::LeaderTx => "leader_tx",
            Topic::CopyIntent => "copy_intent",
            Topic::CopySettled => "copy_settled",
            Topic::MonitorControl => "monitor_control",
        }
    }

    /// Consumer group name for this topic. One group per logical stage so
    /// independent stages can each see every message (at-least-once,
    /// §5) without stealing work from one another.
    pub fn group(self, stage: &str) -> String {
        format!("{}:{stage}", self.stream_key())
    }
}
