//! Report queue orchestrator
//!
//! Drives the [`ReportJob`] state machine: spawns content generation per
//! recipient, holds results for operator review, dispatches delivery
//! fire-and-forget, and records delivery state. One queue serves one
//! operator session; all cross-task state lives behind `Arc<RwLock>`.

use crate::error::{Error, Result};
use crate::report::content::{GeneratedReport, ReportContentGenerator};
use crate::report::job::{AdvanceOutcome, GenerationTicket, JobState, ReportJob};
use crate::report::tracker::DeliveryTracker;
use crate::services::{DeliveryChannel, RosterStore};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tutordesk_common::events::{EngagementEvent, EventBus, ReportKind};
use tutordesk_common::model::{Student, StudentIntent};
use tutordesk_common::Clock;

/// Queue state snapshot for the review panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueState {
    /// No job open
    Idle,
    /// Generation outstanding for the recipient at this index
    Generating(usize),
    /// Content ready for review at this index
    Ready(usize),
    /// The job reached its terminal state
    Finished,
}

/// Sequential report composition and delivery queue
#[derive(Clone)]
pub struct ReportQueue {
    job: Arc<RwLock<Option<ReportJob>>>,
    content: Arc<ReportContentGenerator>,
    roster: Arc<dyn RosterStore>,
    delivery: Arc<dyn DeliveryChannel>,
    tracker: Arc<DeliveryTracker>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    gen_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ReportQueue {
    /// Create a queue for one operator session
    pub fn new(
        content: Arc<ReportContentGenerator>,
        roster: Arc<dyn RosterStore>,
        delivery: Arc<dyn DeliveryChannel>,
        tracker: Arc<DeliveryTracker>,
        bus: EventBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            job: Arc::new(RwLock::new(None)),
            content,
            roster,
            delivery,
            tracker,
            bus,
            clock,
            gen_task: Arc::new(Mutex::new(None)),
        }
    }

    /// Open a job over a recipient batch and start generating for the
    /// first recipient
    ///
    /// Rejects an empty batch with [`Error::EmptyRecipients`]. A
    /// previously open job is dropped; its outstanding generation result
    /// is discarded by the ticket guard when it resolves.
    pub async fn open(&self, recipients: Vec<Student>, kind: ReportKind) -> Result<()> {
        let (job, ticket) = ReportJob::open(recipients, kind)?;
        let recipient_count = job.len();

        {
            let mut slot = self.job.write().await;
            *slot = Some(job);
        }

        info!(kind = kind.as_str(), recipient_count, "report job opened");
        self.bus.emit_lossy(EngagementEvent::ReportJobOpened {
            kind,
            recipient_count,
            timestamp: self.clock.now(),
        });

        self.spawn_generation(ticket).await;
        Ok(())
    }

    /// Current queue state
    pub async fn state(&self) -> QueueState {
        match self.job.read().await.as_ref() {
            None => QueueState::Idle,
            Some(job) => match job.state() {
                JobState::Generating { index } => QueueState::Generating(*index),
                JobState::Ready { index, .. } => QueueState::Ready(*index),
                JobState::Finished => QueueState::Finished,
            },
        }
    }

    /// Current content, if ready for review
    pub async fn content(&self) -> Option<String> {
        self.job
            .read()
            .await
            .as_ref()
            .and_then(|job| job.content().map(str::to_string))
    }

    /// Current recipient under review, if the job is open
    pub async fn current_recipient(&self) -> Option<Student> {
        self.job
            .read()
            .await
            .as_ref()
            .and_then(|job| job.current_recipient().cloned())
    }

    /// Override the generated content verbatim
    pub async fn edit(&self, text: String) -> Result<()> {
        let mut slot = self.job.write().await;
        let job = slot
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no report job open".to_string()))?;
        job.edit(text)
    }

    /// Change the report kind and re-generate for the current recipient
    pub async fn set_kind(&self, kind: ReportKind) -> Result<()> {
        let ticket = {
            let mut slot = self.job.write().await;
            let job = slot
                .as_mut()
                .ok_or_else(|| Error::InvalidState("no report job open".to_string()))?;
            job.set_kind(kind)?
        };

        self.spawn_generation(ticket).await;
        Ok(())
    }

    /// Send the current content and advance
    ///
    /// The advance happens first and holds regardless of the external
    /// channel's outcome: delivery and record failures are logged, never
    /// rolled back into the queue.
    pub async fn send(&self) -> Result<()> {
        let advance = {
            let mut slot = self.job.write().await;
            let job = slot
                .as_mut()
                .ok_or_else(|| Error::InvalidState("no report job open".to_string()))?;
            job.send()?
        };

        let now = self.clock.now();
        if let Some(text) = &advance.content {
            if let Err(e) = self.delivery.send(&advance.recipient.phone, text).await {
                warn!(
                    recipient = %advance.recipient.guid,
                    error = %e,
                    "delivery channel failed; queue advanced regardless"
                );
            }
        }

        if advance.kind.is_periodic() {
            if let Err(e) = self
                .tracker
                .record(advance.recipient.guid, advance.kind, now)
                .await
            {
                warn!(recipient = %advance.recipient.guid, error = %e, "delivery record failed");
            }
            if let Err(e) = self
                .roster
                .apply_intent(advance.recipient.guid, StudentIntent::report_delivered(now))
                .await
            {
                warn!(recipient = %advance.recipient.guid, error = %e, "last-report intent failed");
            }
        }

        info!(
            recipient = %advance.recipient.guid,
            kind = advance.kind.as_str(),
            index = advance.index,
            "report sent"
        );
        self.bus.emit_lossy(EngagementEvent::ReportSent {
            student_id: advance.recipient.guid,
            kind: advance.kind,
            index: advance.index,
            timestamp: now,
        });

        self.after_advance(advance).await;
        Ok(())
    }

    /// Advance past the current recipient without sending
    pub async fn skip(&self) -> Result<()> {
        let advance = {
            let mut slot = self.job.write().await;
            let job = slot
                .as_mut()
                .ok_or_else(|| Error::InvalidState("no report job open".to_string()))?;
            job.skip()?
        };

        debug!(
            recipient = %advance.recipient.guid,
            index = advance.index,
            "recipient skipped"
        );
        self.bus.emit_lossy(EngagementEvent::ReportRecipientSkipped {
            student_id: advance.recipient.guid,
            index: advance.index,
            timestamp: self.clock.now(),
        });

        self.after_advance(advance).await;
        Ok(())
    }

    /// Force the job to its terminal state (operator cancel)
    ///
    /// A generation still outstanding is discarded when it resolves.
    pub async fn close(&self) {
        let was_open = {
            let mut slot = self.job.write().await;
            slot.as_mut().map(|job| job.close()).unwrap_or(false)
        };

        if was_open {
            info!("report job cancelled");
            self.bus.emit_lossy(EngagementEvent::ReportJobFinished {
                cancelled: true,
                timestamp: self.clock.now(),
            });
        }
    }

    /// Wait for the most recently spawned generation task to settle
    ///
    /// The review panel awaits this after open/advance/kind changes to
    /// know the content either became ready or was discarded as stale.
    pub async fn await_generation(&self) {
        let handle = self.gen_task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    async fn after_advance(&self, advance: AdvanceOutcome) {
        match advance.next {
            Some(ticket) => self.spawn_generation(ticket).await,
            None => {
                info!("report job finished");
                self.bus.emit_lossy(EngagementEvent::ReportJobFinished {
                    cancelled: false,
                    timestamp: self.clock.now(),
                });
            }
        }
    }

    async fn spawn_generation(&self, ticket: GenerationTicket) {
        self.bus.emit_lossy(EngagementEvent::ReportGenerating {
            index: ticket.index,
            kind: ticket.kind,
            timestamp: self.clock.now(),
        });

        let recipient = {
            self.job
                .read()
                .await
                .as_ref()
                .and_then(|job| job.recipient_at(ticket.index).cloned())
        };
        let Some(recipient) = recipient else {
            return;
        };

        let job = Arc::clone(&self.job);
        let content = Arc::clone(&self.content);
        let bus = self.bus.clone();
        let clock = Arc::clone(&self.clock);
        let handle = tokio::spawn(async move {
            let GeneratedReport { text, degraded } = content.generate(&recipient, ticket.kind).await;

            let mut slot = job.write().await;
            let applied = slot
                .as_mut()
                .map(|job| job.complete_generation(ticket, text, degraded))
                .unwrap_or(false);

            if applied {
                bus.emit_lossy(EngagementEvent::ReportReady {
                    index: ticket.index,
                    degraded,
                    timestamp: clock.now(),
                });
            } else {
                debug!(index = ticket.index, "discarding stale generation result");
            }
        });

        *self.gen_task.lock().await = Some(handle);
    }
}
