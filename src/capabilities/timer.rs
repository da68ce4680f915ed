//! Shell-scheduled timers. The core never sleeps; it asks the shell to fire
//! after a duration and correlates the completion by id. Tests drive this
//! with virtual time by injecting the completion event directly.

use serde::{Deserialize, Serialize};

use crux_core::capability::{Capability, CapabilityContext, Operation};

/// Correlation token for one scheduled timer. Ids are minted by the model
/// (monotonic counters), so a completion that no longer matches the current
/// id is stale and gets dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerOperation {
    Start { id: TimerId, millis: u64 },
    Cancel { id: TimerId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerOutput {
    Fired { id: TimerId },
    Cancelled { id: TimerId },
}

impl Operation for TimerOperation {
    type Output = TimerOutput;
}

pub struct Timer<Ev> {
    context: CapabilityContext<TimerOperation, Ev>,
}

impl<Ev> Capability<Ev> for Timer<Ev> {
    type Operation = TimerOperation;
    type MappedSelf<MappedEv> = Timer<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Timer::new(self.context.map_event(f))
    }
}

impl<Ev> Timer<Ev>
where
    Ev: Send + 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<TimerOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn start<F>(&self, id: TimerId, millis: u64, make_event: F)
    where
        F: FnOnce(TimerOutput) -> Ev + Send + Sync + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let output = context
                .request_from_shell(TimerOperation::Start { id, millis })
                .await;
            context.update_app(make_event(output));
        });
    }

    /// Ask the shell to resolve a pending timer early as `Cancelled`.
    /// Best-effort; stale-id checks in the model are the real defense.
    pub fn cancel(&self, id: TimerId) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(TimerOperation::Cancel { id }).await;
        });
    }
}
