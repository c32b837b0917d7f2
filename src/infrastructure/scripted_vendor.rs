use crate::domain::ports::VendorGateway;
use crate::domain::transaction::{FailureType, PaymentRequest, VendorOutcome};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScriptedOutcome {
    Approve,
    Pending,
    Decline {
        failure_type: FailureType,
        reason: String,
    },
}

impl From<ScriptedOutcome> for VendorOutcome {
    fn from(outcome: ScriptedOutcome) -> Self {
        match outcome {
            ScriptedOutcome::Approve => VendorOutcome::Approved,
            ScriptedOutcome::Pending => VendorOutcome::Pending,
            ScriptedOutcome::Decline {
                failure_type,
                reason,
            } => VendorOutcome::Declined {
                reason,
                failure_type,
            },
        }
    }
}

/// Scripted vendor behaviour, usually part of a fixture file.
///
/// Each vendor plays its outcomes in order and then keeps repeating the last
/// one. Vendors without a script approve. Instruments listed in
/// `declined_instruments` are declined by every vendor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorScript {
    #[serde(default)]
    pub vendors: HashMap<String, Vec<ScriptedOutcome>>,
    #[serde(default)]
    pub declined_instruments: HashSet<Uuid>,
}

/// One call received by the scripted gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorCall {
    pub vendor_id: String,
    pub payment_id: Uuid,
    pub instrument_id: Uuid,
}

/// A deterministic `VendorGateway` for tests, demos and the CLI.
#[derive(Clone, Default)]
pub struct ScriptedVendorGateway {
    queues: Arc<Mutex<HashMap<String, VecDeque<ScriptedOutcome>>>>,
    declined_instruments: Arc<HashSet<Uuid>>,
    calls: Arc<Mutex<Vec<VendorCall>>>,
}

impl ScriptedVendorGateway {
    /// A gateway on which every vendor approves every payment.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_script(script: VendorScript) -> Self {
        let queues = script
            .vendors
            .into_iter()
            .map(|(vendor, outcomes)| (vendor, outcomes.into_iter().collect()))
            .collect();
        Self {
            queues: Arc::new(Mutex::new(queues)),
            declined_instruments: Arc::new(script.declined_instruments),
            calls: Arc::default(),
        }
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<VendorCall> {
        self.calls.lock().await.clone()
    }

    async fn next_outcome(&self, vendor_id: &str) -> ScriptedOutcome {
        let mut queues = self.queues.lock().await;
        match queues.get_mut(vendor_id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(ScriptedOutcome::Approve),
            Some(queue) => queue.front().cloned().unwrap_or(ScriptedOutcome::Approve),
            None => ScriptedOutcome::Approve,
        }
    }
}

#[async_trait]
impl VendorGateway for ScriptedVendorGateway {
    async fn execute(&self, vendor_id: &str, request: &PaymentRequest) -> Result<VendorOutcome> {
        self.calls.lock().await.push(VendorCall {
            vendor_id: vendor_id.to_string(),
            payment_id: request.payment_id,
            instrument_id: request.instrument.instrument_id,
        });

        if self
            .declined_instruments
            .contains(&request.instrument.instrument_id)
        {
            return Ok(VendorOutcome::Declined {
                reason: "Insufficient funds".to_string(),
                failure_type: FailureType::InstrumentDecline,
            });
        }

        Ok(self.next_outcome(vendor_id).await.into())
    }
}
