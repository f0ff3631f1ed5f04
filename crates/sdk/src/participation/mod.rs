/// Join form.
pub mod form;

/// Request-account and join flow against the API.
#[cfg(client)]
pub mod flow;

use serde::{Deserialize, Serialize};
use tournament_client::types::ParticipationStatus;

pub use form::{JoinForm, JoinFormErrors};

#[cfg(client)]
pub use flow::JoinFlow;

/// Participation of the current user in a competition.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipationState {
    /// No trading account has been requested.
    NotRequested,
    /// A trading account has been requested, the user has not joined yet.
    Requested,
    /// Joined. Terminal.
    Joined,
}

impl From<ParticipationStatus> for ParticipationState {
    fn from(status: ParticipationStatus) -> Self {
        match (status.has_requested_account, status.has_joined) {
            (false, false) => Self::NotRequested,
            (true, false) => Self::Requested,
            (true, true) => Self::Joined,
            (false, true) => {
                tracing::warn!(
                    ?status,
                    "joined without a requested account, treating as requested"
                );
                Self::Requested
            }
        }
    }
}

/// Participation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParticipationEvent {
    /// Request a trading account.
    RequestAccount,
    /// Join with the received trading account.
    Join,
}

impl ParticipationEvent {
    fn source(&self) -> ParticipationState {
        match self {
            Self::RequestAccount => ParticipationState::NotRequested,
            Self::Join => ParticipationState::Requested,
        }
    }

    fn target(&self) -> ParticipationState {
        match self {
            Self::RequestAccount => ParticipationState::Requested,
            Self::Join => ParticipationState::Joined,
        }
    }
}

/// A transition applied before the server confirmed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tentative {
    /// State to return to on rollback.
    pub from: ParticipationState,
    /// Tentative state.
    pub to: ParticipationState,
    /// Event that caused the transition.
    pub event: ParticipationEvent,
}

/// Outcome of a reconciliation with the server status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The local state already matched.
    Unchanged,
    /// The state moved forward.
    Advanced {
        /// Previous state.
        from: ParticipationState,
        /// New state.
        to: ParticipationState,
    },
    /// The state moved back to the one reported by the server, undoing a
    /// tentative transition or a request the server no longer has.
    RolledBack {
        /// Tentative state.
        from: ParticipationState,
        /// Restored state.
        to: ParticipationState,
    },
    /// The server reported an earlier state than a committed join; the
    /// local state was kept.
    Ignored {
        /// State reported by the server.
        reported: ParticipationState,
    },
}

/// Participation state machine.
///
/// Forward transitions are gated by [`can_request_account`](Self::can_request_account)
/// and [`can_join`](Self::can_join). A committed [`ParticipationState::Joined`]
/// is never left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipationMachine {
    state: ParticipationState,
    tentative: Option<Tentative>,
}

impl ParticipationMachine {
    /// Create a machine in `state`.
    pub fn new(state: ParticipationState) -> Self {
        Self {
            state,
            tentative: None,
        }
    }

    /// Current state, tentative or not.
    pub fn state(&self) -> ParticipationState {
        self.state
    }

    /// Last committed state.
    pub fn committed(&self) -> ParticipationState {
        self.tentative.map_or(self.state, |tentative| tentative.from)
    }

    /// Pending tentative transition.
    pub fn tentative(&self) -> Option<&Tentative> {
        self.tentative.as_ref()
    }

    /// Returns whether a tentative transition is waiting for the server.
    pub fn needs_reconciliation(&self) -> bool {
        self.tentative.is_some()
    }

    /// Returns whether "request account" is available.
    pub fn can_request_account(&self) -> bool {
        self.state == ParticipationState::NotRequested
    }

    /// Returns whether "join" is available.
    pub fn can_join(&self) -> bool {
        self.state == ParticipationState::Requested
    }

    /// Returns whether `event` is allowed in the current state.
    pub fn can(&self, event: ParticipationEvent) -> bool {
        match event {
            ParticipationEvent::RequestAccount => self.can_request_account(),
            ParticipationEvent::Join => self.can_join(),
        }
    }

    fn check(&self, event: ParticipationEvent) -> crate::Result<()> {
        if self.can(event) {
            debug_assert_eq!(self.state, event.source());
            Ok(())
        } else {
            Err(crate::Error::Transition {
                state: self.state,
                event,
            })
        }
    }

    /// Apply a transition the server has already confirmed.
    pub fn apply(&mut self, event: ParticipationEvent) -> crate::Result<ParticipationState> {
        self.check(event)?;
        self.tentative = None;
        self.state = event.target();
        tracing::info!(%event, state = %self.state, "participation changed");
        Ok(self.state)
    }

    /// Apply a transition that still has to be confirmed.
    pub fn begin(&mut self, event: ParticipationEvent) -> crate::Result<Tentative> {
        self.check(event)?;
        let tentative = Tentative {
            from: self.committed(),
            to: event.target(),
            event,
        };
        self.state = tentative.to;
        self.tentative = Some(tentative);
        tracing::debug!(?tentative, "tentative participation change");
        Ok(tentative)
    }

    /// Commit the pending tentative transition.
    pub fn confirm(&mut self) -> Option<Tentative> {
        self.tentative.take()
    }

    /// Undo the pending tentative transition.
    pub fn rollback(&mut self) -> Option<Tentative> {
        let tentative = self.tentative.take()?;
        self.state = tentative.from;
        tracing::info!(?tentative, "tentative participation change rolled back");
        Some(tentative)
    }

    /// Align with the status reported by the server.
    ///
    /// The reported state is taken as is, forward or backward, except that a
    /// committed [`ParticipationState::Joined`] is never left.
    pub fn reconcile(&mut self, status: ParticipationStatus) -> Reconciliation {
        let reported = ParticipationState::from(status);
        let previous = self.state;
        let committed = self.committed();
        self.tentative = None;

        if committed == ParticipationState::Joined {
            if reported != ParticipationState::Joined {
                tracing::warn!(%reported, "server reported an earlier state than joined");
                return Reconciliation::Ignored { reported };
            }
            return Reconciliation::Unchanged;
        }

        self.state = reported;
        match reported.cmp(&previous) {
            std::cmp::Ordering::Equal => Reconciliation::Unchanged,
            std::cmp::Ordering::Greater => {
                tracing::info!(from = %previous, to = %reported, "participation advanced");
                Reconciliation::Advanced {
                    from: previous,
                    to: reported,
                }
            }
            std::cmp::Ordering::Less => {
                tracing::info!(from = %previous, to = %reported, "participation rolled back");
                Reconciliation::RolledBack {
                    from: previous,
                    to: reported,
                }
            }
        }
    }
}

/// Message shown above the participation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// A trading account has been requested.
    AccountRequested,
    /// The join form is open.
    FillJoinForm,
    /// Joined.
    Joined,
}

impl Notice {
    /// Text of the notice.
    pub fn text(&self) -> &'static str {
        match self {
            Self::AccountRequested => {
                "You will receive an email soon with the trading account details required to join the competition."
            }
            Self::FillJoinForm => {
                "Check your email and fill out this form with the trading account details you received."
            }
            Self::Joined => "You have successfully joined the competition. See you at kickoff! 🚀",
        }
    }

    fn for_state(state: ParticipationState) -> Option<Self> {
        match state {
            ParticipationState::NotRequested => None,
            ParticipationState::Requested => Some(Self::AccountRequested),
            ParticipationState::Joined => Some(Self::Joined),
        }
    }
}

/// State of the join panel shown before the competition starts.
#[derive(Debug, Clone)]
pub struct JoinPanel {
    machine: ParticipationMachine,
    notice: Option<Notice>,
    form_open: bool,
    form: JoinForm,
    errors: JoinFormErrors,
}

impl JoinPanel {
    /// Create the panel from the status reported by the server.
    pub fn new(status: ParticipationStatus) -> Self {
        let state = ParticipationState::from(status);
        Self {
            machine: ParticipationMachine::new(state),
            notice: Notice::for_state(state),
            form_open: false,
            form: JoinForm::default(),
            errors: JoinFormErrors::default(),
        }
    }

    /// The participation state machine.
    pub fn machine(&self) -> &ParticipationMachine {
        &self.machine
    }

    /// Current participation state.
    pub fn state(&self) -> ParticipationState {
        self.machine.state()
    }

    /// Current notice.
    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }

    /// Returns whether the join form is shown.
    pub fn is_form_open(&self) -> bool {
        self.form_open && self.machine.can_join()
    }

    /// The join form.
    pub fn form(&self) -> &JoinForm {
        &self.form
    }

    /// Edit the join form.
    pub fn form_mut(&mut self) -> &mut JoinForm {
        &mut self.form
    }

    /// Validation errors of the last submission.
    pub fn errors(&self) -> &JoinFormErrors {
        &self.errors
    }

    /// Open the join form.
    pub fn open_form(&mut self) -> crate::Result<()> {
        self.machine.check(ParticipationEvent::Join)?;
        self.errors = JoinFormErrors::default();
        self.form_open = true;
        self.notice = Some(Notice::FillJoinForm);
        Ok(())
    }

    /// Close the join form without submitting.
    pub fn cancel_form(&mut self) {
        self.form_open = false;
        self.errors = JoinFormErrors::default();
        self.notice = (self.machine.state() >= ParticipationState::Requested)
            .then_some(Notice::AccountRequested);
    }

    /// Validate the form, recording the errors.
    pub fn validate_form(&mut self) -> crate::Result<tournament_client::types::JoinRequest> {
        self.machine.check(ParticipationEvent::Join)?;
        match self.form.validate() {
            Ok(request) => {
                self.errors = JoinFormErrors::default();
                Ok(request)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(crate::Error::InvalidJoinForm(errors))
            }
        }
    }

    /// Record a tentative account request.
    pub fn account_requested(&mut self) -> crate::Result<Tentative> {
        let tentative = self.machine.begin(ParticipationEvent::RequestAccount)?;
        self.notice = Some(Notice::AccountRequested);
        Ok(tentative)
    }

    /// Record a confirmed join.
    pub fn joined(&mut self) -> crate::Result<()> {
        self.machine.apply(ParticipationEvent::Join)?;
        self.form_open = false;
        self.form.clear();
        self.errors = JoinFormErrors::default();
        self.notice = Some(Notice::Joined);
        Ok(())
    }

    /// Align with the status reported by the server.
    pub fn reconcile(&mut self, status: ParticipationStatus) -> Reconciliation {
        let outcome = self.machine.reconcile(status);
        let state = self.machine.state();
        match outcome {
            Reconciliation::Unchanged | Reconciliation::Ignored { .. } => {}
            Reconciliation::Advanced { .. } | Reconciliation::RolledBack { .. } => {
                self.notice = Notice::for_state(state);
                if state != ParticipationState::Requested {
                    self.form_open = false;
                }
            }
        }
        outcome
    }
}
