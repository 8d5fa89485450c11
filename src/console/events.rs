//! Events sent back to the UI loop by spawned API tasks

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::api::{ApiClient, ApiResult, TokenResponse};
use crate::models::{load_detail, AdminResource, DetailRequest, RecordDetail, Resource, ResourceGateway};
use crate::query::RequestTicket;
use crate::schema::FieldDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    Verify(bool),
}

impl MutationKind {
    pub fn past_tense(&self) -> &'static str {
        match self {
            MutationKind::Create => "created",
            MutationKind::Update => "updated",
            MutationKind::Delete => "deleted",
            MutationKind::Verify(true) => "verified",
            MutationKind::Verify(false) => "unverified",
        }
    }
}

/// Results of background work
#[derive(Debug)]
pub enum AppEvent {
    ListLoaded {
        ticket: RequestTicket,
        resource: Resource,
        result: ApiResult<Value>,
    },
    MutationFinished {
        resource: Resource,
        kind: MutationKind,
        result: ApiResult<Value>,
    },
    DetailLoaded {
        ticket: RequestTicket,
        resource: Resource,
        result: ApiResult<RecordDetail>,
    },
    LoginFinished(ApiResult<TokenResponse>),
}

/// What a screen needs to start background work
#[derive(Clone)]
pub struct TaskContext {
    gateway: Arc<dyn ResourceGateway>,
    events: UnboundedSender<AppEvent>,
}

impl TaskContext {
    pub fn new(gateway: Arc<dyn ResourceGateway>, events: UnboundedSender<AppEvent>) -> Self {
        Self { gateway, events }
    }

    fn send(events: &UnboundedSender<AppEvent>, event: AppEvent) {
        if events.send(event).is_err() {
            debug!("Event loop closed; dropping task result");
        }
    }

    pub fn spawn_list(&self, resource: Resource, ticket: RequestTicket) {
        let gateway = Arc::clone(&self.gateway);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = gateway.list(resource).await;
            Self::send(&events, AppEvent::ListLoaded { ticket, resource, result });
        });
    }

    pub fn spawn_detail(
        &self,
        resource: Resource,
        ticket: RequestTicket,
        title: String,
        requests: Vec<DetailRequest>,
    ) {
        let gateway = Arc::clone(&self.gateway);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = load_detail(gateway.as_ref(), title, requests).await;
            Self::send(&events, AppEvent::DetailLoaded { ticket, resource, result });
        });
    }

    /// Encode a submitted form for `R` and create or update the record
    pub fn spawn_submit<R: AdminResource>(
        &self,
        id: Option<String>,
        fields: Vec<FieldDescriptor>,
        submission: Map<String, Value>,
    ) {
        let gateway = Arc::clone(&self.gateway);
        let events = self.events.clone();
        tokio::spawn(async move {
            let kind = if id.is_some() {
                MutationKind::Update
            } else {
                MutationKind::Create
            };
            let result: ApiResult<Value> = async {
                let payload = R::encode_submission(&fields, submission).await?;
                match &id {
                    Some(id) => gateway.update(R::RESOURCE, id, payload).await,
                    None => gateway.create(R::RESOURCE, payload).await,
                }
            }
            .await;
            Self::send(
                &events,
                AppEvent::MutationFinished {
                    resource: R::RESOURCE,
                    kind,
                    result,
                },
            );
        });
    }

    pub fn spawn_delete(&self, resource: Resource, id: String) {
        let gateway = Arc::clone(&self.gateway);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = gateway.remove(resource, &id).await;
            Self::send(
                &events,
                AppEvent::MutationFinished {
                    resource,
                    kind: MutationKind::Delete,
                    result,
                },
            );
        });
    }

    pub fn spawn_verify(&self, id: String, verify: bool) {
        let gateway = Arc::clone(&self.gateway);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = gateway.verify_mechanic(&id, verify).await;
            Self::send(
                &events,
                AppEvent::MutationFinished {
                    resource: Resource::Mechanics,
                    kind: MutationKind::Verify(verify),
                    result,
                },
            );
        });
    }

    pub fn spawn_login(&self, client: ApiClient, username: String, password: String) {
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = client.login(&username, &password).await;
            Self::send(&events, AppEvent::LoginFinished(result));
        });
    }
}
