//! Formation mode state machine.
//!
//! The controller only records which formation is active and which photo is
//! focused; every visible consequence is derived per tick by the entities.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::particle::EntityId;

/// Current formation. The focus target lives inside `Focus`, so a target
/// exists exactly when the mode is focus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Compact,
    Dispersed,
    Focus(EntityId),
}

impl Mode {
    pub fn id(self) -> ModeId {
        match self {
            Mode::Compact => ModeId::Compact,
            Mode::Dispersed => ModeId::Dispersed,
            Mode::Focus(_) => ModeId::Focus,
        }
    }

    pub fn focus_target(self) -> Option<EntityId> {
        match self {
            Mode::Focus(id) => Some(id),
            _ => None,
        }
    }
}

/// Mode without payload, as used by buttons and UI notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModeId {
    Compact,
    Dispersed,
    Focus,
}

/// Requested transition. `Focus(None)` picks a random photo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeRequest {
    Compact,
    Dispersed,
    Focus(Option<EntityId>),
}

impl From<ModeId> for ModeRequest {
    fn from(id: ModeId) -> Self {
        match id {
            ModeId::Compact => ModeRequest::Compact,
            ModeId::Dispersed => ModeRequest::Dispersed,
            ModeId::Focus => ModeRequest::Focus(None),
        }
    }
}

/// Result of applying a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: Mode,
    pub to: Mode,
    /// Set when a focus request could not be honoured and fell back to compact.
    pub fell_back: bool,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Clone, Debug, Default)]
pub struct ModeController {
    mode: Mode,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn focus_target(&self) -> Option<EntityId> {
        self.mode.focus_target()
    }

    /// Apply `request`. `photos` lists every photo entity currently alive.
    ///
    /// An explicit focus target that is not among `photos` is replaced by a
    /// random photo. With no photos at all, focus falls back to compact.
    pub fn request<R: Rng + ?Sized>(
        &mut self,
        request: ModeRequest,
        photos: &[EntityId],
        rng: &mut R,
    ) -> Transition {
        let from = self.mode;
        let mut fell_back = false;
        let to = match request {
            ModeRequest::Compact => Mode::Compact,
            ModeRequest::Dispersed => Mode::Dispersed,
            ModeRequest::Focus(wanted) => {
                let explicit = wanted.filter(|id| photos.contains(id));
                if let Some(id) = wanted.filter(|_| explicit.is_none()) {
                    log::warn!("focus target {id} is not a photo; choosing at random");
                }
                match explicit.or_else(|| photos.choose(rng).copied()) {
                    Some(id) => Mode::Focus(id),
                    None => {
                        log::warn!("focus requested with no photos; staying compact");
                        fell_back = true;
                        Mode::Compact
                    }
                }
            }
        };
        self.mode = to;
        if from != to {
            log::info!("mode {:?} -> {:?}", from, to);
        }
        Transition { from, to, fell_back }
    }
}
