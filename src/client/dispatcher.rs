//! Serialized dispatcher task
//!
//! Owns the command processor and handles one inbound event at a time.
//! Responses produced while handling an event are routed to the request that
//! registered a continuation for it and broadcast to every subscriber.

use crate::command::{CommandProcessor, ProfileEvents, Response};
use crate::core::ProfileMap;
use crate::event::Event;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{Level, event};
use uuid::Uuid;

pub(crate) type SharedState = Option<Arc<ProfileMap>>;

pub(crate) struct Envelope {
    pub event: Event,
    pub reply: Option<oneshot::Sender<Event>>,
}

/// [`ProfileEvents`] backed by a watch channel (shared state) and an outbox
pub(crate) struct DispatchEvents {
    shared_state: watch::Sender<SharedState>,
    outbox: Vec<Event>,
}

impl DispatchEvents {
    pub fn new(shared_state: watch::Sender<SharedState>) -> Self {
        Self {
            shared_state,
            outbox: Vec::new(),
        }
    }
}

impl ProfileEvents for DispatchEvents {
    fn advertise(&mut self, snapshot: Arc<ProfileMap>) {
        self.shared_state.send_replace(Some(snapshot));
    }

    fn respond(&mut self, correlation_id: Option<Uuid>, response: Response) {
        match response.into_event(correlation_id) {
            Ok(response) => self.outbox.push(response),
            Err(err) => event!(Level::ERROR, error = %err, "failed to build profile response"),
        }
    }
}

pub(crate) async fn run(
    mut processor: CommandProcessor<DispatchEvents>,
    mut inbox: mpsc::Receiver<Envelope>,
    responses: broadcast::Sender<Event>,
) {
    let mut pending: HashMap<Uuid, oneshot::Sender<Event>> = HashMap::new();

    let loaded = processor.on_registered();
    if loaded {
        event!(Level::DEBUG, attributes = processor.store().len(), "profile dispatcher started");
    } else {
        event!(Level::ERROR, "profile data could not be loaded, commands will be dropped");
    }
    deliver(&mut processor, &mut pending, &responses);

    while let Some(envelope) = inbox.recv().await {
        // Requesters that timed out have dropped their receiver.
        pending.retain(|_, reply| !reply.is_closed());

        if let Some(reply) = envelope.reply {
            pending.insert(envelope.event.id, reply);
        }
        event!(
            Level::TRACE,
            event_id = %envelope.event.id,
            name = %envelope.event.name,
            "dispatching profile event"
        );
        processor.handle_event(&envelope.event);
        deliver(&mut processor, &mut pending, &responses);
    }

    event!(Level::DEBUG, "profile dispatcher stopped");
}

fn deliver(
    processor: &mut CommandProcessor<DispatchEvents>,
    pending: &mut HashMap<Uuid, oneshot::Sender<Event>>,
    responses: &broadcast::Sender<Event>,
) {
    let outbox = std::mem::take(&mut processor.events_mut().outbox);
    for response in outbox {
        if let Some(reply) = response.response_id.and_then(|id| pending.remove(&id)) {
            let _ = reply.send(response.clone());
        }
        // No subscribers is not an error.
        let _ = responses.send(response);
    }
}
