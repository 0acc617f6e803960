//! Bookkeeping for keyed effects (switch / exhaust concurrency).
//!
//! Every [`EffectId`] owns one slot holding a generation counter, whether a
//! member of the family is in flight, and the abort handle of the running
//! task. Admission and completion both run while the Store's state write lock
//! is held, so deciding "is this result still current" and applying it to the
//! state happen atomically with respect to new actions.

use catalog_core::effect::{Concurrency, EffectId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::AbortHandle;

/// Proof that a keyed effect was admitted, used to report its completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    id: EffectId,
    generation: u64,
}

impl Ticket {
    /// The family this ticket belongs to
    #[must_use]
    pub const fn id(&self) -> &EffectId {
        &self.id
    }

    /// The generation this ticket was issued for
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    in_flight: bool,
    abort: Option<AbortHandle>,
}

/// Outcome of asking to start a keyed effect
#[derive(Debug)]
pub enum Admission {
    /// Start the effect; report completion with the ticket
    Start(Ticket),

    /// Start the effect; an older one of the same family was cancelled
    Superseded(Ticket),

    /// Drop the effect; one of the same family is still in flight
    Ignored,
}

/// Shared table of keyed effect slots
#[derive(Debug, Clone, Default)]
pub struct KeyedEffects {
    slots: Arc<Mutex<HashMap<EffectId, Slot>>>,
}

impl KeyedEffects {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_slots<T>(&self, f: impl FnOnce(&mut HashMap<EffectId, Slot>) -> T) -> T {
        // Slot updates never panic midway, so a poisoned lock still holds consistent data
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut slots)
    }

    /// Decide whether a new effect in `id`'s family may start
    pub fn admit(&self, id: &EffectId, policy: Concurrency) -> Admission {
        self.with_slots(|slots| {
            let slot = slots.entry(id.clone()).or_default();

            match policy {
                Concurrency::Exhaust if slot.in_flight => Admission::Ignored,
                Concurrency::Exhaust => {
                    slot.generation += 1;
                    slot.in_flight = true;
                    Admission::Start(Ticket {
                        id: id.clone(),
                        generation: slot.generation,
                    })
                },
                Concurrency::Switch => {
                    let superseded = slot.in_flight;
                    if let Some(abort) = slot.abort.take() {
                        abort.abort();
                    }
                    slot.generation += 1;
                    slot.in_flight = true;
                    let ticket = Ticket {
                        id: id.clone(),
                        generation: slot.generation,
                    };
                    if superseded {
                        Admission::Superseded(ticket)
                    } else {
                        Admission::Start(ticket)
                    }
                },
            }
        })
    }

    /// Remember the task running `ticket` so a later switch can abort it
    pub fn attach(&self, ticket: &Ticket, abort: AbortHandle) {
        self.with_slots(|slots| {
            if let Some(slot) = slots.get_mut(&ticket.id) {
                if slot.generation == ticket.generation && slot.in_flight {
                    slot.abort = Some(abort);
                }
            }
        });
    }

    /// Whether `ticket` is still the most recent admission of its family
    #[must_use]
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.with_slots(|slots| {
            slots
                .get(&ticket.id)
                .is_some_and(|slot| slot.generation == ticket.generation && slot.in_flight)
        })
    }

    /// Mark `ticket`'s effect as finished
    ///
    /// Returns `true` if the ticket was current, meaning its result should be
    /// applied. Stale tickets leave the slot untouched and return `false`.
    pub fn finish(&self, ticket: &Ticket) -> bool {
        self.with_slots(|slots| match slots.get_mut(&ticket.id) {
            Some(slot) if slot.generation == ticket.generation && slot.in_flight => {
                slot.in_flight = false;
                slot.abort = None;
                true
            },
            _ => false,
        })
    }

    /// Whether any effect of `id`'s family is in flight
    #[must_use]
    pub fn in_flight(&self, id: &EffectId) -> bool {
        self.with_slots(|slots| slots.get(id).is_some_and(|slot| slot.in_flight))
    }
}

/// Releases a ticket on drop if the task ends without finishing normally
/// (panic or abort), so an exhaust family cannot stay blocked forever.
pub struct TicketGuard {
    table: KeyedEffects,
    ticket: Option<Ticket>,
}

impl TicketGuard {
    /// Guard `ticket` in `table`
    #[must_use]
    pub const fn new(table: KeyedEffects, ticket: Ticket) -> Self {
        Self {
            table,
            ticket: Some(ticket),
        }
    }

    /// Disarm the guard; the caller reports completion itself
    pub fn disarm(&mut self) -> Option<Ticket> {
        self.ticket.take()
    }
}

impl Drop for TicketGuard {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            let _ = self.table.finish(&ticket);
        }
    }
}
