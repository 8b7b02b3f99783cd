//! Draft actor: one task per draft serializing every mutation.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, sleep};

use super::errors::{DraftError, DraftResult};
use super::messages::{DraftCommand, DraftEvent, DraftMessage, DraftOutcome};
use super::state_machine::Draft;
use crate::db::{DraftRepository, StorageError};
use crate::pairing::{PairingEngine, SeatRandomizer};
use crate::tournament::models::{DraftId, TournamentId};

/// Attempts for one snapshot write
pub const PERSIST_ATTEMPTS: u32 = 3;

/// Backoff unit between write attempts
const PERSIST_BACKOFF: Duration = Duration::from_millis(50);

/// Inbox capacity per draft
const INBOX_CAPACITY: usize = 100;

/// Draft actor handle for sending messages
#[derive(Clone, Debug)]
pub struct DraftHandle {
    sender: mpsc::Sender<DraftMessage>,
    draft_id: DraftId,
}

impl DraftHandle {
    /// Create a new draft handle
    pub fn new(sender: mpsc::Sender<DraftMessage>, draft_id: DraftId) -> Self {
        Self { sender, draft_id }
    }

    /// Get draft ID
    pub fn draft_id(&self) -> DraftId {
        self.draft_id
    }

    /// Apply a command and wait for the committed result
    pub async fn execute(&self, command: DraftCommand) -> DraftResult<DraftOutcome> {
        let (response, rx) = oneshot::channel();
        self.sender
            .send(DraftMessage::Execute { command, response })
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?;
        rx.await.map_err(|_| DraftError::Unavailable(self.draft_id))?
    }

    /// Current committed state of the draft
    pub async fn snapshot(&self) -> DraftResult<Draft> {
        let (response, rx) = oneshot::channel();
        self.sender
            .send(DraftMessage::Snapshot { response })
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?;
        rx.await.map_err(|_| DraftError::Unavailable(self.draft_id))
    }

    /// Ask the actor to stop
    pub async fn close(&self) {
        let _ = self.sender.send(DraftMessage::Close).await;
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Draft actor owning a single draft aggregate
pub struct DraftActor {
    tournament_id: TournamentId,

    /// Last committed state
    draft: Draft,

    engine: PairingEngine,

    repository: Arc<dyn DraftRepository>,

    inbox: mpsc::Receiver<DraftMessage>,
}

impl DraftActor {
    /// Create a new draft actor
    ///
    /// Returns the actor, to be spawned with [`DraftActor::run`], and a handle
    /// for sending it messages.
    pub fn new(
        tournament_id: TournamentId,
        draft: Draft,
        engine: PairingEngine,
        repository: Arc<dyn DraftRepository>,
    ) -> (Self, DraftHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let handle = DraftHandle::new(sender, draft.id);

        let actor = Self {
            tournament_id,
            draft,
            engine,
            repository,
            inbox,
        };

        (actor, handle)
    }

    /// Run the draft actor event loop
    pub async fn run(mut self) {
        log::info!("Draft {} '{}' actor starting", self.draft.id, self.draft.cube);

        while let Some(message) = self.inbox.recv().await {
            match message {
                DraftMessage::Execute { command, response } => {
                    let result = self.execute(command).await;
                    let _ = response.send(result);
                }

                DraftMessage::Snapshot { response } => {
                    let _ = response.send(self.draft.clone());
                }

                DraftMessage::Close => break,
            }
        }

        log::info!("Draft {} '{}' actor stopped", self.draft.id, self.draft.cube);
    }

    /// Apply to a copy, persist the copy, then commit it
    async fn execute(&mut self, command: DraftCommand) -> DraftResult<DraftOutcome> {
        let name = command.name();
        let mut next = self.draft.clone();

        let event = match self.apply(&mut next, command) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Draft {}: {} rejected: {}", self.draft.id, name, e);
                return Err(e);
            }
        };

        self.persist(&next).await?;
        self.draft = next;

        Ok(DraftOutcome {
            event,
            draft: self.draft.clone(),
        })
    }

    fn apply(&self, draft: &mut Draft, command: DraftCommand) -> DraftResult<DraftEvent> {
        let event = match command {
            DraftCommand::Seat => {
                let mut randomizer = SeatRandomizer::for_step(draft.pairing_seed, 0);
                draft.seat(&mut randomizer)?;
                DraftEvent::Seated {
                    players: draft.seats().len(),
                }
            }

            DraftCommand::Pair => {
                let step = u64::from(draft.round()) + 1;
                let mut randomizer = SeatRandomizer::for_step(draft.pairing_seed, step);
                let plan = draft.pair(&self.engine, &mut randomizer)?;
                DraftEvent::Paired { plan }
            }

            DraftCommand::FinishRound => DraftEvent::RoundFinished {
                round: draft.finish_round()?,
            },

            DraftCommand::FinishDraft => {
                draft.finish()?;
                DraftEvent::DraftFinished
            }

            DraftCommand::Reset => {
                draft.reset();
                DraftEvent::Reset
            }

            DraftCommand::Report {
                match_id,
                player,
                score,
            } => {
                draft.report(match_id, player, score)?;
                DraftEvent::ResultReported { match_id }
            }

            DraftCommand::Confirm { match_id, actor } => {
                draft.confirm(match_id, actor)?;
                DraftEvent::ResultConfirmed { match_id }
            }

            DraftCommand::Override { match_id, score } => {
                draft.override_result(match_id, score)?;
                DraftEvent::ResultOverridden { match_id }
            }

            DraftCommand::CheckIn { player } => {
                draft.check_in(player)?;
                DraftEvent::CheckedIn { player }
            }

            DraftCommand::CheckOut { player } => {
                draft.check_out(player)?;
                DraftEvent::CheckedOut { player }
            }
        };

        Ok(event)
    }

    async fn persist(&self, draft: &Draft) -> Result<(), StorageError> {
        let mut attempt = 1;
        loop {
            match self.repository.save_draft(self.tournament_id, draft).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < PERSIST_ATTEMPTS => {
                    log::warn!(
                        "Draft {}: write attempt {}/{} failed: {}",
                        draft.id,
                        attempt,
                        PERSIST_ATTEMPTS,
                        e
                    );
                    sleep(PERSIST_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!(
                        "Draft {}: giving up after {} write attempts: {}",
                        draft.id,
                        PERSIST_ATTEMPTS,
                        e
                    );
                    return Err(e);
                }
            }
        }
    }
}
