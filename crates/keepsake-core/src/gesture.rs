//! Single- versus double-click disambiguation.
//!
//! Photo hits are resolved immediately. Clicks on empty space go through a
//! two-state timer (`Idle` / `Armed`) that is advanced explicitly by the
//! caller's clock, so a cancelled timer can never fire later and one logical
//! double-click never yields a single-click action.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use smallvec::SmallVec;

use crate::constants::DOUBLE_CLICK_WINDOW;
use crate::mode::ModeId;
use crate::particle::EntityId;

/// Monotonic time source measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock backed by `instant`, usable on native and wasm targets.
pub struct SystemClock {
    origin: instant::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: instant::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Rc<Cell<Duration>>);

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, t: Duration) {
        self.0.set(t);
    }

    pub fn advance(&self, dt: Duration) {
        self.0.set(self.0.get() + dt);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoHit {
    pub id: EntityId,
    pub caption: String,
}

/// What a pointer ray struck, nearest photo first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointerHit {
    pub photo: Option<PhotoHit>,
    /// Whether the ray intersected the formation's geometry at all.
    pub formation: bool,
}

impl PointerHit {
    pub fn miss() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GestureCommand {
    ShowCaption(String),
    Focus(EntityId),
    FocusRandom,
    Disperse,
    /// The deferred single-click on empty space. Currently carries no effect.
    SingleClick,
}

pub type GestureCommands = SmallVec<[GestureCommand; 2]>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTimer {
    Idle,
    Armed { deadline: Duration },
}

#[derive(Clone, Debug)]
pub struct GestureDisambiguator {
    window: Duration,
    timer: ClickTimer,
    last_miss: Option<Duration>,
}

impl Default for GestureDisambiguator {
    fn default() -> Self {
        Self::new(DOUBLE_CLICK_WINDOW)
    }
}

impl GestureDisambiguator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            timer: ClickTimer::Idle,
            last_miss: None,
        }
    }

    pub fn timer(&self) -> ClickTimer {
        self.timer
    }

    /// Fire the armed single-click if its deadline has passed.
    pub fn poll(&mut self, now: Duration) -> Option<GestureCommand> {
        match self.timer {
            ClickTimer::Armed { deadline } if now >= deadline => {
                self.timer = ClickTimer::Idle;
                log::debug!("single click fired at {:?}", now);
                Some(GestureCommand::SingleClick)
            }
            _ => None,
        }
    }

    fn cancel(&mut self) {
        if let ClickTimer::Armed { deadline } = self.timer {
            log::debug!("single click due at {:?} cancelled", deadline);
        }
        self.timer = ClickTimer::Idle;
    }

    pub fn on_click(&mut self, now: Duration, hit: &PointerHit, mode: ModeId) -> GestureCommands {
        let mut out = GestureCommands::new();
        out.extend(self.poll(now));

        if let Some(photo) = &hit.photo {
            if mode == ModeId::Dispersed && !photo.caption.is_empty() {
                out.push(GestureCommand::ShowCaption(photo.caption.clone()));
            } else {
                out.push(GestureCommand::Focus(photo.id));
            }
            return out;
        }

        match self.last_miss {
            Some(prev) if now.saturating_sub(prev) < self.window => {
                // Second half of a double-click.
                self.cancel();
                self.last_miss = None;
            }
            _ => {
                self.timer = ClickTimer::Armed {
                    deadline: now + self.window,
                };
                self.last_miss = Some(now);
            }
        }
        out
    }

    pub fn on_double_click(
        &mut self,
        now: Duration,
        hit: &PointerHit,
        mode: ModeId,
    ) -> GestureCommands {
        let mut out = GestureCommands::new();
        out.extend(self.poll(now));
        self.cancel();
        self.last_miss = None;

        match mode {
            ModeId::Dispersed => out.push(GestureCommand::FocusRandom),
            ModeId::Compact if hit.formation => out.push(GestureCommand::Disperse),
            _ => log::debug!("double click ignored in {:?}", mode),
        }
        out
    }
}
