use std::collections::{HashMap, HashSet};
use strum_macros::{Display, EnumIter};
use tracing::{debug, warn};

use crate::model::{event::Event, od_request::OdRequest, user::Student};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub events: Vec<Event>,
    pub od_requests: Vec<OdRequest>,
    pub top_students: Vec<Student>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    SetEvents(Vec<Event>),
    AddEvent(Event),
    SetOdRequests(Vec<OdRequest>),
    /// Replaces the request with the same id, if present
    UpdateOdRequest(OdRequest),
    SetTopStudents(Vec<Student>),
    SetLoading(bool),
    SetError(Option<String>),
}

impl AppAction {
    /// The data this action writes, if any.
    pub fn resource(&self) -> Option<Resource> {
        match self {
            AppAction::SetEvents(_) | AppAction::AddEvent(_) => Some(Resource::Events),
            AppAction::SetOdRequests(_) | AppAction::UpdateOdRequest(_) => {
                Some(Resource::OdRequests)
            }
            AppAction::SetTopStudents(_) => Some(Resource::TopStudents),
            AppAction::SetLoading(_) | AppAction::SetError(_) => None,
        }
    }
}

pub fn reduce(state: &mut AppState, action: AppAction) {
    match action {
        AppAction::SetEvents(events) => state.events = events,
        AppAction::AddEvent(event) => state.events.push(event),
        AppAction::SetOdRequests(requests) => state.od_requests = requests,
        AppAction::UpdateOdRequest(updated) => {
            if let Some(slot) = state.od_requests.iter_mut().find(|r| r.id == updated.id) {
                *slot = updated;
            }
        }
        AppAction::SetTopStudents(students) => state.top_students = students,
        AppAction::SetLoading(loading) => state.is_loading = loading,
        AppAction::SetError(error) => state.error = error,
    }
}

/// What an in-flight call is loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Resource {
    Events,
    OdRequests,
    TopStudents,
}

/// Issued when a call starts. Only the latest ticket of a resource may land
/// its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    resource: Resource,
    generation: u64,
}

impl Ticket {
    pub fn resource(&self) -> Resource {
        self.resource
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// The ticket was superseded or cancelled, the result was discarded
    Stale,
    /// The action writes another resource than the ticket loads. The call is
    /// finished but its result was discarded.
    Mismatched,
}

#[derive(Debug, Default)]
pub struct AppStore {
    state: AppState,
    generations: HashMap<Resource, u64>,
    in_flight: HashSet<Resource>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, action: AppAction) {
        reduce(&mut self.state, action);
    }

    fn bump(&mut self, resource: Resource) -> u64 {
        let generation = self.generations.entry(resource).or_default();
        *generation += 1;
        *generation
    }

    fn sync_loading(&mut self) {
        let loading = !self.in_flight.is_empty();
        self.dispatch(AppAction::SetLoading(loading));
    }

    /// Starts a call for `resource`, superseding any call already running for it.
    pub fn begin(&mut self, resource: Resource) -> Ticket {
        let generation = self.bump(resource);
        self.in_flight.insert(resource);
        self.dispatch(AppAction::SetError(None));
        self.sync_loading();
        Ticket {
            resource,
            generation,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.in_flight.contains(&ticket.resource)
            && self.generations.get(&ticket.resource) == Some(&ticket.generation)
    }

    /// Lands the outcome of a call. A failed call is recorded as the store's
    /// error message. Only actions for the ticket's own resource (or ones
    /// touching no resource) are applied.
    pub fn complete(&mut self, ticket: Ticket, outcome: Result<AppAction, String>) -> Applied {
        if !self.is_current(ticket) {
            debug!(resource = %ticket.resource, generation = ticket.generation, "Discarding stale result");
            return Applied::Stale;
        }

        self.in_flight.remove(&ticket.resource);
        let applied = match outcome {
            Ok(action) => match action.resource() {
                Some(target) if target != ticket.resource => {
                    warn!(resource = %ticket.resource, %target, "Discarding result for another resource");
                    Applied::Mismatched
                }
                _ => {
                    self.dispatch(action);
                    Applied::Applied
                }
            },
            Err(message) => {
                self.dispatch(AppAction::SetError(Some(message)));
                Applied::Applied
            }
        };
        self.sync_loading();
        applied
    }

    /// Abandons the running call for `resource`; its result will be stale.
    pub fn cancel(&mut self, resource: Resource) {
        if self.in_flight.remove(&resource) {
            self.bump(resource);
            self.sync_loading();
        }
    }

    /// Drops all data and abandons every running call.
    pub fn reset(&mut self) {
        let abandoned: Vec<_> = self.in_flight.drain().collect();
        for resource in abandoned {
            self.bump(resource);
        }
        self.state = AppState::default();
    }
}
