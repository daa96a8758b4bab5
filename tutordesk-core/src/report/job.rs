//! Report job state machine
//!
//! Pure ordered traversal over a recipient batch. The async orchestrator
//! ([`super::queue::ReportQueue`]) drives this machine and performs the
//! side effects; everything here is synchronous and deterministic.
//!
//! States: `Generating(i)` → `Ready(i, content)` → (send | skip) →
//! `Generating(i+1)` … → `Finished`. The index never decreases and
//! `Finished` is terminal.

use crate::error::{Error, Result};
use tutordesk_common::events::ReportKind;
use tutordesk_common::model::Student;
use uuid::Uuid;

/// Generation trigger handed to the orchestrator
///
/// A completion is applied only when its ticket still matches the job's
/// identity, current index, kind, and epoch; anything else is a stale
/// result from before an advance, kind change, close, or reopen, and is
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket {
    /// Job the generation was started for
    pub job: Uuid,
    /// 0-based recipient index the generation was started for
    pub index: usize,
    /// Kind the generation was started under
    pub kind: ReportKind,
    /// Trigger counter at start time
    pub epoch: u64,
}

/// Observable job state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Content generation outstanding for the recipient at `index`
    Generating {
        /// 0-based recipient index
        index: usize,
    },
    /// Content ready for operator review
    Ready {
        /// 0-based recipient index
        index: usize,
        /// Current content, operator-editable
        content: String,
    },
    /// Terminal: every recipient sent-or-skipped, or operator cancel
    Finished,
}

/// Result of a send or skip advance
#[derive(Debug, Clone)]
pub struct AdvanceOutcome {
    /// Recipient that was sent or skipped
    pub recipient: Student,
    /// Their 0-based index in the batch
    pub index: usize,
    /// Kind in effect at the advance
    pub kind: ReportKind,
    /// Content to deliver; `None` for a skip
    pub content: Option<String>,
    /// Generation trigger for the next recipient, `None` when finished
    pub next: Option<GenerationTicket>,
}

/// Ordered, resumable traversal over a recipient batch
#[derive(Debug)]
pub struct ReportJob {
    id: Uuid,
    recipients: Vec<Student>,
    kind: ReportKind,
    state: JobState,
    epoch: u64,
    degraded: bool,
}

impl ReportJob {
    /// Open a job over a non-empty recipient batch
    ///
    /// Returns the job in `Generating(0)` together with the first
    /// generation ticket.
    pub fn open(
        recipients: Vec<Student>,
        kind: ReportKind,
    ) -> Result<(Self, GenerationTicket)> {
        if recipients.is_empty() {
            return Err(Error::EmptyRecipients);
        }

        let mut job = Self {
            id: Uuid::new_v4(),
            recipients,
            kind,
            state: JobState::Finished,
            epoch: 0,
            degraded: false,
        };
        let ticket = job.begin_generation(0);
        Ok((job, ticket))
    }

    /// Start a generation for `index`, invalidating any outstanding ticket
    fn begin_generation(&mut self, index: usize) -> GenerationTicket {
        self.epoch += 1;
        self.state = JobState::Generating { index };
        self.degraded = false;
        GenerationTicket {
            job: self.id,
            index,
            kind: self.kind,
            epoch: self.epoch,
        }
    }

    /// Apply a finished generation
    ///
    /// Returns `false` when the ticket is stale (the job advanced,
    /// changed kind, or closed since the trigger); the result is
    /// discarded and the state is untouched.
    pub fn complete_generation(
        &mut self,
        ticket: GenerationTicket,
        content: String,
        degraded: bool,
    ) -> bool {
        let current = match self.state {
            JobState::Generating { index } => index,
            _ => return false,
        };
        if ticket.job != self.id
            || ticket.index != current
            || ticket.kind != self.kind
            || ticket.epoch != self.epoch
        {
            return false;
        }

        self.state = JobState::Ready {
            index: current,
            content,
        };
        self.degraded = degraded;
        true
    }

    /// Change the report kind and re-generate for the current recipient
    ///
    /// Valid only in `Ready`; while a generation is outstanding the state
    /// tag rejects the operation.
    pub fn set_kind(&mut self, kind: ReportKind) -> Result<GenerationTicket> {
        match self.state {
            JobState::Ready { index, .. } => {
                self.kind = kind;
                Ok(self.begin_generation(index))
            }
            _ => Err(Error::InvalidState(
                "kind can only change while content is ready".to_string(),
            )),
        }
    }

    /// Override the generated content verbatim
    pub fn edit(&mut self, text: String) -> Result<()> {
        match &mut self.state {
            JobState::Ready { content, .. } => {
                *content = text;
                self.degraded = false;
                Ok(())
            }
            _ => Err(Error::InvalidState(
                "content can only be edited while ready".to_string(),
            )),
        }
    }

    /// Send the current content and advance
    pub fn send(&mut self) -> Result<AdvanceOutcome> {
        let (index, content) = match &self.state {
            JobState::Ready { index, content } => (*index, content.clone()),
            _ => {
                return Err(Error::InvalidState(
                    "send requires ready content".to_string(),
                ))
            }
        };

        let recipient = self.recipients[index].clone();
        let kind = self.kind;
        let next = self.advance_from(index);
        Ok(AdvanceOutcome {
            recipient,
            index,
            kind,
            content: Some(content),
            next,
        })
    }

    /// Advance past the current recipient without sending
    pub fn skip(&mut self) -> Result<AdvanceOutcome> {
        let index = match &self.state {
            JobState::Ready { index, .. } => *index,
            _ => {
                return Err(Error::InvalidState(
                    "skip requires ready content".to_string(),
                ))
            }
        };

        let recipient = self.recipients[index].clone();
        let kind = self.kind;
        let next = self.advance_from(index);
        Ok(AdvanceOutcome {
            recipient,
            index,
            kind,
            content: None,
            next,
        })
    }

    fn advance_from(&mut self, index: usize) -> Option<GenerationTicket> {
        if index + 1 < self.recipients.len() {
            Some(self.begin_generation(index + 1))
        } else {
            self.state = JobState::Finished;
            self.epoch += 1;
            None
        }
    }

    /// Force `Finished` from any state (operator cancel)
    ///
    /// Returns `false` when the job was already finished. Outstanding
    /// generation tickets are invalidated either way.
    pub fn close(&mut self) -> bool {
        let was_open = self.state != JobState::Finished;
        self.state = JobState::Finished;
        self.epoch += 1;
        was_open
    }

    /// Current state
    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Kind currently in effect
    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    /// Number of recipients in the batch
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    /// Whether the batch is empty (never true for an opened job)
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Recipient at `index`, if in range
    pub fn recipient_at(&self, index: usize) -> Option<&Student> {
        self.recipients.get(index)
    }

    /// Current recipient while the job is open
    pub fn current_recipient(&self) -> Option<&Student> {
        match self.state {
            JobState::Generating { index } | JobState::Ready { index, .. } => {
                self.recipients.get(index)
            }
            JobState::Finished => None,
        }
    }

    /// Current content, if ready
    pub fn content(&self) -> Option<&str> {
        match &self.state {
            JobState::Ready { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Whether the current content is the generation-failure fallback
    pub fn degraded(&self) -> bool {
        self.degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn students(count: usize) -> Vec<Student> {
        (0..count)
            .map(|i| Student {
                guid: Uuid::from_u128(i as u128 + 1),
                name: format!("Student {}", i),
                code: format!("M10{:02}", i),
                phone: format!("+1555010{}", i),
                attended_today: false,
                paid: true,
                streak_days: 0,
                points: 0,
            })
            .collect()
    }

    fn ready(job: &mut ReportJob, ticket: GenerationTicket) {
        assert!(job.complete_generation(ticket, format!("content {}", ticket.index), false));
    }

    #[test]
    fn test_open_rejects_empty_batch() {
        let result = ReportJob::open(Vec::new(), ReportKind::AbsenceAlert);
        assert!(matches!(result, Err(Error::EmptyRecipients)));
    }

    #[test]
    fn test_open_starts_generating_first_recipient() {
        let (job, ticket) = ReportJob::open(students(3), ReportKind::AbsenceAlert).unwrap();
        assert_eq!(*job.state(), JobState::Generating { index: 0 });
        assert_eq!(ticket.index, 0);
        assert_eq!(ticket.kind, ReportKind::AbsenceAlert);
        assert_eq!(job.current_recipient().unwrap().name, "Student 0");
    }

    #[test]
    fn test_send_advances_through_batch_to_finished() {
        let (mut job, t0) = ReportJob::open(students(3), ReportKind::AbsenceAlert).unwrap();
        ready(&mut job, t0);

        let advance = job.send().unwrap();
        assert_eq!(advance.index, 0);
        assert_eq!(advance.content.as_deref(), Some("content 0"));
        let t1 = advance.next.unwrap();
        assert_eq!(t1.index, 1);
        assert_eq!(*job.state(), JobState::Generating { index: 1 });

        ready(&mut job, t1);
        let advance = job.skip().unwrap();
        assert!(advance.content.is_none());
        let t2 = advance.next.unwrap();

        ready(&mut job, t2);
        let advance = job.send().unwrap();
        assert_eq!(advance.index, 2);
        assert!(advance.next.is_none());
        assert_eq!(*job.state(), JobState::Finished);
    }

    #[test]
    fn test_send_rejected_while_generating() {
        let (mut job, _ticket) =
            ReportJob::open(students(2), ReportKind::PeriodicShort).unwrap();
        assert!(matches!(job.send(), Err(Error::InvalidState(_))));
        assert!(matches!(job.skip(), Err(Error::InvalidState(_))));
        assert!(matches!(
            job.edit("text".to_string()),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            job.set_kind(ReportKind::PeriodicLong),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_edit_overrides_content_verbatim() {
        let (mut job, ticket) = ReportJob::open(students(1), ReportKind::AbsenceAlert).unwrap();
        ready(&mut job, ticket);

        job.edit("operator text".to_string()).unwrap();
        assert_eq!(job.content(), Some("operator text"));

        let advance = job.send().unwrap();
        assert_eq!(advance.content.as_deref(), Some("operator text"));
    }

    #[test]
    fn test_set_kind_regenerates_same_index() {
        let (mut job, t0) = ReportJob::open(students(2), ReportKind::PeriodicShort).unwrap();
        ready(&mut job, t0);

        let t1 = job.set_kind(ReportKind::PeriodicLong).unwrap();
        assert_eq!(t1.index, 0);
        assert_eq!(t1.kind, ReportKind::PeriodicLong);
        assert_eq!(*job.state(), JobState::Generating { index: 0 });

        // The pre-change ticket is now stale
        assert!(!job.complete_generation(t0, "old".to_string(), false));
        assert!(job.complete_generation(t1, "new".to_string(), false));
        assert_eq!(job.content(), Some("new"));
    }

    #[test]
    fn test_stale_completion_after_close_is_discarded() {
        let (mut job, ticket) =
            ReportJob::open(students(2), ReportKind::PeriodicShort).unwrap();

        assert!(job.close());
        assert_eq!(*job.state(), JobState::Finished);

        // The outstanding generation resolves late; nothing changes
        assert!(!job.complete_generation(ticket, "late".to_string(), false));
        assert_eq!(*job.state(), JobState::Finished);
    }

    #[test]
    fn test_ticket_from_another_job_is_discarded() {
        // Same index, kind, and epoch as a fresh job would issue; only
        // the job identity differs (close-then-reopen race)
        let (_old_job, foreign) =
            ReportJob::open(students(1), ReportKind::AbsenceAlert).unwrap();
        let (mut job, own) = ReportJob::open(students(1), ReportKind::AbsenceAlert).unwrap();

        assert!(!job.complete_generation(foreign, "stale".to_string(), false));
        assert_eq!(*job.state(), JobState::Generating { index: 0 });
        assert!(job.complete_generation(own, "fresh".to_string(), false));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut job, _ticket) =
            ReportJob::open(students(1), ReportKind::AbsenceAlert).unwrap();
        assert!(job.close());
        assert!(!job.close());
    }

    #[test]
    fn test_degraded_flag_tracks_fallback_content() {
        let (mut job, ticket) =
            ReportJob::open(students(1), ReportKind::PeriodicShort).unwrap();
        assert!(job.complete_generation(ticket, "fallback".to_string(), true));
        assert!(job.degraded());

        // Operator editing clears the degraded marker
        job.edit("fixed by hand".to_string()).unwrap();
        assert!(!job.degraded());
    }

    #[test]
    fn test_finished_is_terminal() {
        let (mut job, ticket) = ReportJob::open(students(1), ReportKind::AbsenceAlert).unwrap();
        ready(&mut job, ticket);
        job.send().unwrap();
        assert_eq!(*job.state(), JobState::Finished);

        assert!(matches!(job.send(), Err(Error::InvalidState(_))));
        assert!(matches!(job.skip(), Err(Error::InvalidState(_))));
        assert!(job.current_recipient().is_none());
    }
}
