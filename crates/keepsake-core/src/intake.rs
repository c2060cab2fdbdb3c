//! Sequential photo intake.
//!
//! A batch is decoded concurrently by the caller; once every item has
//! settled the queue presents items strictly in submission order, one
//! caption prompt at a time. Resolving a prompt hands out a [`BuildTicket`]
//! that must be completed (or abandoned) before the next prompt appears, so
//! no entity for item `i + 1` can exist before item `i` is decided.
//!
//! A newer batch decodes behind the presented one and only takes over once
//! every one of its items has decoded.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty image payload")]
    Empty,
    #[error("malformed image payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("no caption prompt is pending")]
    NoPrompt,
    #[error("item {index} is outside batch {batch} of {len}")]
    IndexOutOfRange { batch: BatchId, index: usize, len: usize },
    #[error("build ticket for batch {batch} item {index} is not in flight")]
    UnknownTicket { batch: BatchId, index: usize },
    #[error("entity limit reached")]
    EntityLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(pub u64);

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptionDecision {
    Submit(String),
    Skip,
    /// Closing the prompt without choosing; behaves like `Skip`.
    Dismiss,
}

impl CaptionDecision {
    pub fn into_caption(self) -> String {
        match self {
            CaptionDecision::Submit(text) => text.trim().to_string(),
            CaptionDecision::Skip | CaptionDecision::Dismiss => String::new(),
        }
    }
}

/// Proof that a caption decision was made for one item. Not `Clone`: it is
/// consumed exactly once by [`PhotoIntake::complete`] or
/// [`PhotoIntake::abandon`].
#[derive(Debug, PartialEq, Eq)]
pub struct BuildTicket {
    batch: BatchId,
    index: usize,
    caption: String,
}

impl BuildTicket {
    pub fn batch(&self) -> BatchId {
        self.batch
    }
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn caption(&self) -> &str {
        &self.caption
    }
}

/// Everything needed to build the renderable for a decided item.
#[derive(Debug)]
pub struct PhotoBuild {
    pub ticket: BuildTicket,
    pub image: DecodedImage,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntakeEvent {
    Prompt { batch: BatchId, index: usize },
    /// A newer batch took over while this prompt was still showing.
    PromptWithdrawn { batch: BatchId, index: usize },
    DecodeFailed { batch: BatchId, index: usize, error: DecodeError },
    BatchFinished { batch: BatchId },
}

#[derive(Clone, Debug)]
enum Slot {
    Decoding,
    Ready(DecodedImage),
    Failed(DecodeError),
    Taken,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntakeStage {
    Idle,
    /// Nothing is presented and a staged batch is still decoding.
    Decoding,
    Awaiting { index: usize },
    Building { index: usize },
}

/// A batch whose decodes have not all settled yet. It replaces the
/// presented batch only once every slot has left `Slot::Decoding`.
#[derive(Debug)]
struct Staged {
    batch: BatchId,
    slots: Vec<Slot>,
}

impl Staged {
    fn settled(&self) -> bool {
        self.slots.iter().all(|s| !matches!(s, Slot::Decoding))
    }
}

#[derive(Debug)]
pub struct PhotoIntake {
    next_batch: u64,
    batch: BatchId,
    slots: Vec<Slot>,
    cursor: usize,
    stage: IntakeStage,
    staged: Option<Staged>,
}

impl Default for PhotoIntake {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoIntake {
    pub fn new() -> Self {
        Self {
            next_batch: 0,
            batch: BatchId(0),
            slots: Vec::new(),
            cursor: 0,
            stage: IntakeStage::Idle,
            staged: None,
        }
    }

    /// The batch currently being presented.
    pub fn batch(&self) -> BatchId {
        self.batch
    }

    /// The batch still decoding behind the presented one, if any.
    pub fn staged_batch(&self) -> Option<BatchId> {
        self.staged.as_ref().map(|s| s.batch)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn stage(&self) -> IntakeStage {
        match self.stage {
            IntakeStage::Idle if self.staged.is_some() => IntakeStage::Decoding,
            stage => stage,
        }
    }

    /// Start decoding a new batch of `len` items. The presented batch keeps
    /// running until the new one has fully decoded. An empty batch stages
    /// nothing.
    pub fn begin_batch(&mut self, len: usize) -> BatchId {
        self.next_batch += 1;
        let batch = BatchId(self.next_batch);
        if len == 0 {
            log::info!("batch {batch} is empty");
            return batch;
        }
        if let Some(old) = self.staged.take() {
            log::info!("batch {} replaced before it was presented", old.batch);
        }
        self.staged = Some(Staged {
            batch,
            slots: vec![Slot::Decoding; len],
        });
        log::info!("batch {batch} started with {len} item(s)");
        batch
    }

    /// Record one decode completion. Completions may arrive in any order;
    /// the batch is presented once all of them have settled.
    pub fn decode_finished(
        &mut self,
        batch: BatchId,
        index: usize,
        result: Result<DecodedImage, DecodeError>,
        out: &mut Vec<IntakeEvent>,
    ) -> Result<(), IntakeError> {
        let Some(staged) = self.staged.as_mut().filter(|s| s.batch == batch) else {
            if batch == self.batch && index >= self.slots.len() {
                return Err(IntakeError::IndexOutOfRange {
                    batch,
                    index,
                    len: self.slots.len(),
                });
            }
            log::debug!("dropping decode of item {index} from batch {batch}: not decoding");
            return Ok(());
        };
        let len = staged.slots.len();
        let slot = staged
            .slots
            .get_mut(index)
            .ok_or(IntakeError::IndexOutOfRange { batch, index, len })?;
        if !matches!(slot, Slot::Decoding) {
            log::debug!("duplicate decode for batch {batch} item {index} ignored");
            return Ok(());
        }
        *slot = match result {
            Ok(image) => Slot::Ready(image),
            Err(error) => Slot::Failed(error),
        };
        // A build in flight finishes first; `settle` promotes afterwards.
        if !matches!(self.stage, IntakeStage::Building { .. }) {
            self.promote_if_settled(out);
        }
        Ok(())
    }

    /// Index of the item currently waiting on a caption decision.
    pub fn pending_prompt(&self) -> Option<usize> {
        match self.stage {
            IntakeStage::Awaiting { index } => Some(index),
            _ => None,
        }
    }

    pub fn prompt_image(&self) -> Option<&DecodedImage> {
        match self.slots.get(self.pending_prompt()?)? {
            Slot::Ready(image) => Some(image),
            _ => None,
        }
    }

    pub fn resolve(&mut self, decision: CaptionDecision) -> Result<PhotoBuild, IntakeError> {
        let index = self.pending_prompt().ok_or(IntakeError::NoPrompt)?;
        let image = match std::mem::replace(&mut self.slots[index], Slot::Taken) {
            Slot::Ready(image) => image,
            other => {
                self.slots[index] = other;
                return Err(IntakeError::NoPrompt);
            }
        };
        self.stage = IntakeStage::Building { index };
        let caption = decision.into_caption();
        log::debug!(
            "batch {} item {index} decided (caption {:?})",
            self.batch,
            caption
        );
        Ok(PhotoBuild {
            ticket: BuildTicket {
                batch: self.batch,
                index,
                caption,
            },
            image,
        })
    }

    /// Finish a build and move to the next item. Returns the resolved caption.
    pub fn complete(
        &mut self,
        ticket: BuildTicket,
        out: &mut Vec<IntakeEvent>,
    ) -> Result<String, IntakeError> {
        self.settle(&ticket, out)?;
        Ok(ticket.caption)
    }

    /// Give up on a build; the item produces no entity and the queue moves on.
    pub fn abandon(
        &mut self,
        ticket: BuildTicket,
        out: &mut Vec<IntakeEvent>,
    ) -> Result<(), IntakeError> {
        log::warn!(
            "build for batch {} item {} abandoned",
            ticket.batch,
            ticket.index
        );
        self.settle(&ticket, out)
    }

    fn settle(&mut self, ticket: &BuildTicket, out: &mut Vec<IntakeEvent>) -> Result<(), IntakeError> {
        if ticket.batch != self.batch
            || self.stage != (IntakeStage::Building { index: ticket.index })
        {
            return Err(IntakeError::UnknownTicket {
                batch: ticket.batch,
                index: ticket.index,
            });
        }
        self.cursor = ticket.index + 1;
        self.stage = IntakeStage::Idle;
        if !self.promote_if_settled(out) {
            self.present(out);
        }
        Ok(())
    }

    /// Swap a fully decoded staged batch in, dropping the unresolved tail of
    /// the presented one. Returns whether a swap happened.
    fn promote_if_settled(&mut self, out: &mut Vec<IntakeEvent>) -> bool {
        let next = match self.staged.take() {
            Some(next) if next.settled() => next,
            other => {
                self.staged = other;
                return false;
            }
        };
        if let IntakeStage::Awaiting { index } = self.stage {
            log::info!(
                "batch {} superseded with {} item(s) unresolved",
                self.batch,
                self.slots.len() - index
            );
            out.push(IntakeEvent::PromptWithdrawn {
                batch: self.batch,
                index,
            });
        }
        self.batch = next.batch;
        self.slots = next.slots;
        self.cursor = 0;
        self.present(out);
        true
    }

    fn present(&mut self, out: &mut Vec<IntakeEvent>) {
        while self.cursor < self.slots.len() {
            let index = self.cursor;
            match &self.slots[index] {
                Slot::Ready(_) => {
                    self.stage = IntakeStage::Awaiting { index };
                    out.push(IntakeEvent::Prompt {
                        batch: self.batch,
                        index,
                    });
                    return;
                }
                Slot::Failed(error) => {
                    log::warn!("batch {} item {index} failed to decode: {error}", self.batch);
                    out.push(IntakeEvent::DecodeFailed {
                        batch: self.batch,
                        index,
                        error: error.clone(),
                    });
                }
                Slot::Decoding | Slot::Taken => {}
            }
            self.cursor += 1;
        }
        self.stage = IntakeStage::Idle;
        log::info!("batch {} finished", self.batch);
        out.push(IntakeEvent::BatchFinished { batch: self.batch });
    }
}
