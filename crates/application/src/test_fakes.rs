use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dishpatch_core::{AppError, AppResult};
use dishpatch_domain::{IntentParameters, PermissionTable, ResolvedIntent};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, oneshot};

use crate::{
    AdminQueryService, AuthorizationGate, CapabilityRegistry, CapabilityRouter, IntentResolver,
    PLATFORM_CAPABILITIES, ReadOperation, ResolverError,
};

/// Resolver answering from a fixed text → outcome script.
#[derive(Default)]
pub(crate) struct ScriptedIntentResolver {
    script: HashMap<String, Result<ResolvedIntent, ResolverError>>,
    calls: AtomicUsize,
}

impl ScriptedIntentResolver {
    pub(crate) fn answer(
        mut self,
        text: &str,
        capability: &str,
        parameters: &[(&str, Value)],
    ) -> AppResult<Self> {
        let parameters: Map<String, Value> = parameters
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect();
        self.script.insert(
            text.to_owned(),
            Ok(ResolvedIntent::new(capability, parameters)?),
        );
        Ok(self)
    }

    pub(crate) fn fail(mut self, text: &str, error: ResolverError) -> Self {
        self.script.insert(text.to_owned(), Err(error));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentResolver for ScriptedIntentResolver {
    async fn resolve(&self, text: &str) -> Result<ResolvedIntent, ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .get(text)
            .cloned()
            .unwrap_or_else(|| Err(ResolverError::Ambiguous(format!("no intent for '{text}'"))))
    }
}

/// Read operation returning a fixed payload per capability and recording calls.
pub(crate) struct FixedReadOperation {
    payload: Value,
    calls: Mutex<Vec<IntentParameters>>,
}

impl FixedReadOperation {
    pub(crate) fn new(payload: Value) -> Self {
        Self {
            payload,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) async fn calls(&self) -> Vec<IntentParameters> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ReadOperation for FixedReadOperation {
    async fn fetch(&self, parameters: &IntentParameters) -> AppResult<Value> {
        self.calls.lock().await.push(parameters.clone());
        Ok(self.payload.clone())
    }
}

/// Read operation that waits for the test to release a payload per `label` parameter.
#[derive(Default)]
pub(crate) struct GatedReadOperation {
    gates: Mutex<HashMap<String, oneshot::Receiver<AppResult<Value>>>>,
}

impl GatedReadOperation {
    pub(crate) async fn gate(&self, label: &str) -> oneshot::Sender<AppResult<Value>> {
        let (sender, receiver) = oneshot::channel();
        self.gates.lock().await.insert(label.to_owned(), receiver);
        sender
    }
}

#[async_trait]
impl ReadOperation for GatedReadOperation {
    async fn fetch(&self, parameters: &IntentParameters) -> AppResult<Value> {
        let label = parameters
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let receiver = self
            .gates
            .lock()
            .await
            .remove(&label)
            .ok_or_else(|| AppError::Internal(format!("no gate for label '{label}'")))?;

        receiver
            .await
            .map_err(|_| AppError::Internal(format!("gate '{label}' dropped")))?
    }
}

/// Builds a query service over the platform table with per-capability operations.
pub(crate) fn service_with(
    resolver: Arc<dyn IntentResolver>,
    operations: &HashMap<&'static str, Arc<dyn ReadOperation>>,
) -> AppResult<AdminQueryService> {
    let registry = CapabilityRegistry::from_table(PLATFORM_CAPABILITIES, |definition| {
        Ok(operations
            .get(definition.name)
            .cloned()
            .unwrap_or_else(|| {
                Arc::new(FixedReadOperation::new(Value::Null)) as Arc<dyn ReadOperation>
            }))
    })?;
    let gate = AuthorizationGate::new(
        Arc::new(PermissionTable::platform_default()),
        Arc::new(registry),
    );

    Ok(AdminQueryService::new(
        resolver,
        gate,
        CapabilityRouter::default(),
    ))
}
