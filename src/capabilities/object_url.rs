//! Display URLs for locally selected binaries. Creation and revocation are
//! browser-level resources owned by the shell; the core only tracks which
//! blob handles already have a URL (see [`crate::object_url::ObjectUrlCache`]).

use serde::{Deserialize, Serialize};

use crux_core::capability::{Capability, CapabilityContext, Operation};

use crate::record::BlobRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectUrlOperation {
    Create { blob: BlobRef },
    Revoke { urls: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectUrlOutput {
    Created { url: String },
    Revoked,
}

impl Operation for ObjectUrlOperation {
    type Output = ObjectUrlOutput;
}

pub struct ObjectUrl<Ev> {
    context: CapabilityContext<ObjectUrlOperation, Ev>,
}

impl<Ev> Capability<Ev> for ObjectUrl<Ev> {
    type Operation = ObjectUrlOperation;
    type MappedSelf<MappedEv> = ObjectUrl<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        ObjectUrl::new(self.context.map_event(f))
    }
}

impl<Ev> ObjectUrl<Ev>
where
    Ev: Send + 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<ObjectUrlOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn create<F>(&self, blob: BlobRef, make_event: F)
    where
        F: FnOnce(ObjectUrlOutput) -> Ev + Send + Sync + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let output = context
                .request_from_shell(ObjectUrlOperation::Create { blob })
                .await;
            context.update_app(make_event(output));
        });
    }

    /// Revoke URLs the shell minted earlier. Fire-and-forget: once revoked
    /// there is nothing for the core to react to.
    pub fn revoke(&self, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }
        let context = self.context.clone();
        self.context.spawn(async move {
            context
                .notify_shell(ObjectUrlOperation::Revoke { urls })
                .await;
        });
    }
}
