//! Route changes requested from the shell. The card itself never navigates;
//! embedding contexts can disable this entirely via
//! [`crate::model::CardConfig::navigation_disabled`].

use serde::{Deserialize, Serialize};

use crux_core::capability::{Capability, CapabilityContext, Operation};

use crate::RecordId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigateOperation {
    ToDetail { id: RecordId },
    ToEdit { id: RecordId },
}

impl Operation for NavigateOperation {
    type Output = ();
}

pub struct Navigate<Ev> {
    context: CapabilityContext<NavigateOperation, Ev>,
}

impl<Ev> Capability<Ev> for Navigate<Ev> {
    type Operation = NavigateOperation;
    type MappedSelf<MappedEv> = Navigate<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Navigate::new(self.context.map_event(f))
    }
}

impl<Ev> Navigate<Ev>
where
    Ev: Send + 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<NavigateOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn to_detail(&self, id: RecordId) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(NavigateOperation::ToDetail { id }).await;
        });
    }

    pub fn to_edit(&self, id: RecordId) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(NavigateOperation::ToEdit { id }).await;
        });
    }
}
