//! The explicit state object every operation goes through.
//!
//! `Scene` owns the entity set, the mode controller, the gesture timer and
//! the intake queue. All mutation happens synchronously inside its methods,
//! so a tick or a raycast never observes a half-inserted entity.

use fnv::FnvHashMap;
use glam::Vec3;
use rand::prelude::*;

use crate::backend::{GeometryDesc, MaterialDesc, RenderBackend, RenderHandle};
use crate::constants::*;
use crate::gesture::{
    Clock, GestureCommand, GestureDisambiguator, PhotoHit, PointerHit, SystemClock,
};
use crate::intake::{
    BatchId, BuildTicket, CaptionDecision, DecodeError, DecodedImage, IntakeError, IntakeEvent,
    PhotoBuild, PhotoIntake,
};
use crate::mode::{Mode, ModeController, ModeId, ModeRequest, Transition};
use crate::particle::{pulse_time, Category, EntityId, FrameContext, Particle};
use crate::placement::Placement;
use crate::state::Ray;

#[derive(Clone, Debug)]
pub struct SceneParams {
    pub ornament_count: usize,
    pub dust_count: usize,
    pub height: f32,
    pub radius: f32,
    pub seed: u64,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            ornament_count: DEFAULT_ORNAMENT_COUNT,
            dust_count: DEFAULT_DUST_COUNT,
            height: TREE_HEIGHT,
            radius: TREE_RADIUS,
            seed: 42,
        }
    }
}

/// Notifications for the UI layer.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneEvent {
    ModeChanged(ModeId),
    CaptionPromptRequested { batch: BatchId, index: usize },
    /// The prompt for this item is no longer answerable; close it.
    CaptionPromptWithdrawn { batch: BatchId, index: usize },
    CaptionDisplayRequested(String),
    DecodeFailed { batch: BatchId, index: usize, error: DecodeError },
    PhotoAdded { id: EntityId, caption: String },
    BatchFinished { batch: BatchId },
}

impl From<IntakeEvent> for SceneEvent {
    fn from(ev: IntakeEvent) -> Self {
        match ev {
            IntakeEvent::Prompt { batch, index } => {
                SceneEvent::CaptionPromptRequested { batch, index }
            }
            IntakeEvent::PromptWithdrawn { batch, index } => {
                SceneEvent::CaptionPromptWithdrawn { batch, index }
            }
            IntakeEvent::DecodeFailed {
                batch,
                index,
                error,
            } => SceneEvent::DecodeFailed {
                batch,
                index,
                error,
            },
            IntakeEvent::BatchFinished { batch } => SceneEvent::BatchFinished { batch },
        }
    }
}

pub struct Scene {
    params: SceneParams,
    rng: StdRng,
    clock: Box<dyn Clock>,
    entities: Vec<Particle>,
    by_handle: FnvHashMap<RenderHandle, EntityId>,
    photos: Vec<EntityId>,
    modes: ModeController,
    gestures: GestureDisambiguator,
    intake: PhotoIntake,
    elapsed: f64,
}

impl Scene {
    /// Build the startup population of ornaments and dust.
    pub fn new<C, B>(params: SceneParams, clock: C, backend: &mut B) -> Self
    where
        C: Clock + 'static,
        B: RenderBackend + ?Sized,
    {
        let mut scene = Self {
            rng: StdRng::seed_from_u64(params.seed),
            params,
            clock: Box::new(clock),
            entities: Vec::new(),
            by_handle: FnvHashMap::default(),
            photos: Vec::new(),
            modes: ModeController::new(),
            gestures: GestureDisambiguator::default(),
            intake: PhotoIntake::new(),
            elapsed: 0.0,
        };
        for _ in 0..scene.params.ornament_count {
            let category = *Category::ORNAMENTS
                .choose(&mut scene.rng)
                .unwrap_or(&Category::Bauble);
            let color = *ORNAMENT_PALETTE
                .choose(&mut scene.rng)
                .unwrap_or(&ORNAMENT_PALETTE[0]);
            let metallic = scene.rng.gen_range(0.2..0.9);
            let handle = backend.create_renderable(
                GeometryDesc::for_category(category),
                MaterialDesc::Ornament { color, metallic },
            );
            scene.spawn(category, handle, None);
        }
        for _ in 0..scene.params.dust_count {
            let handle = backend.create_renderable(
                GeometryDesc::for_category(Category::Dust),
                MaterialDesc::Glow { color: DUST_COLOR },
            );
            scene.spawn(Category::Dust, handle, None);
        }
        log::info!(
            "scene ready: {} ornaments, {} dust",
            scene.params.ornament_count,
            scene.params.dust_count
        );
        scene
    }

    pub fn with_system_clock<B: RenderBackend + ?Sized>(params: SceneParams, backend: &mut B) -> Self {
        Self::new(params, SystemClock::new(), backend)
    }

    fn spawn(
        &mut self,
        category: Category,
        handle: RenderHandle,
        caption: Option<String>,
    ) -> Option<EntityId> {
        let Some(id) = EntityId::from_index(self.entities.len()) else {
            log::error!("entity limit reached, {category:?} not spawned");
            return None;
        };
        let placement = Placement::generate(
            &mut self.rng,
            self.params.height,
            self.params.radius,
            category.is_dust(),
        );
        let (lo, hi) = match category {
            Category::Bauble => BAUBLE_SCALE,
            Category::GiftBox => GIFT_BOX_SCALE,
            Category::CandyCane => CANDY_CANE_SCALE,
            Category::Dust => DUST_SCALE,
            Category::Photo => (PHOTO_SCALE, PHOTO_SCALE),
        };
        let base_scale = self.rng.gen_range(lo..=hi);
        let spin_max = if category.is_photo() {
            PHOTO_SPIN_RATE_MAX
        } else {
            SPIN_RATE_MAX
        };
        let spin_rate = Vec3::new(
            self.rng.gen_range(-spin_max..=spin_max),
            self.rng.gen_range(-spin_max..=spin_max),
            self.rng.gen_range(-spin_max..=spin_max),
        );
        self.entities.push(Particle::new(
            id, handle, category, placement, base_scale, spin_rate, caption,
        ));
        self.by_handle.insert(handle, id);
        if category.is_photo() {
            self.photos.push(id);
        }
        Some(id)
    }

    pub fn params(&self) -> &SceneParams {
        &self.params
    }
    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }
    pub fn entities(&self) -> &[Particle] {
        &self.entities
    }
    pub fn entity(&self, id: EntityId) -> Option<&Particle> {
        self.entities.get(id.0 as usize)
    }
    pub fn photo_ids(&self) -> &[EntityId] {
        &self.photos
    }
    pub fn intake(&self) -> &PhotoIntake {
        &self.intake
    }
    pub fn gestures(&self) -> &GestureDisambiguator {
        &self.gestures
    }
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    // ---------------- Modes ----------------

    pub fn request_mode(&mut self, request: ModeRequest, out: &mut Vec<SceneEvent>) -> Transition {
        let transition = self.modes.request(request, &self.photos, &mut self.rng);
        if transition.changed() || transition.fell_back {
            out.push(SceneEvent::ModeChanged(transition.to.id()));
        }
        transition
    }

    pub fn mode_button_pressed(&mut self, mode: ModeId, out: &mut Vec<SceneEvent>) -> Transition {
        self.request_mode(mode.into(), out)
    }

    // ---------------- Pointer ----------------

    /// Classify what a world-space ray strikes.
    pub fn pick<B: RenderBackend + ?Sized>(&self, ray: &Ray, backend: &B) -> PointerHit {
        let candidates: Vec<RenderHandle> = self.entities.iter().map(|e| e.handle()).collect();
        let hits = backend.raycast(ray, &candidates);
        let photo = hits
            .iter()
            .filter_map(|(h, _)| self.by_handle.get(h).and_then(|id| self.entity(*id)))
            .find(|e| e.is_photo())
            .map(|e| PhotoHit {
                id: e.id(),
                caption: e.caption().unwrap_or_default().to_string(),
            });
        PointerHit {
            photo,
            formation: !hits.is_empty(),
        }
    }

    pub fn pointer_clicked<B: RenderBackend + ?Sized>(
        &mut self,
        x: f32,
        y: f32,
        backend: &B,
        out: &mut Vec<SceneEvent>,
    ) {
        let hit = self.pick(&backend.screen_ray(x, y), backend);
        self.click(&hit, out);
    }

    pub fn pointer_double_clicked<B: RenderBackend + ?Sized>(
        &mut self,
        x: f32,
        y: f32,
        backend: &B,
        out: &mut Vec<SceneEvent>,
    ) {
        let hit = self.pick(&backend.screen_ray(x, y), backend);
        self.double_click(&hit, out);
    }

    /// Click with an already-resolved hit.
    pub fn click(&mut self, hit: &PointerHit, out: &mut Vec<SceneEvent>) {
        let now = self.clock.now();
        let commands = self.gestures.on_click(now, hit, self.mode().id());
        for command in commands {
            self.apply(command, out);
        }
    }

    pub fn double_click(&mut self, hit: &PointerHit, out: &mut Vec<SceneEvent>) {
        let now = self.clock.now();
        let commands = self.gestures.on_double_click(now, hit, self.mode().id());
        for command in commands {
            self.apply(command, out);
        }
    }

    /// Fire the deferred single-click if it is due.
    pub fn poll_gestures(&mut self, out: &mut Vec<SceneEvent>) {
        let now = self.clock.now();
        if let Some(command) = self.gestures.poll(now) {
            self.apply(command, out);
        }
    }

    fn apply(&mut self, command: GestureCommand, out: &mut Vec<SceneEvent>) {
        match command {
            GestureCommand::ShowCaption(text) => out.push(SceneEvent::CaptionDisplayRequested(text)),
            GestureCommand::Focus(id) => {
                self.request_mode(ModeRequest::Focus(Some(id)), out);
            }
            GestureCommand::FocusRandom => {
                self.request_mode(ModeRequest::Focus(None), out);
            }
            GestureCommand::Disperse => {
                self.request_mode(ModeRequest::Dispersed, out);
            }
            GestureCommand::SingleClick => log::debug!("single click on empty space"),
        }
    }

    // ---------------- Per tick ----------------

    /// One synchronous pass over every entity, pushing transforms to `backend`.
    pub fn tick<B: RenderBackend + ?Sized>(
        &mut self,
        dt: f32,
        backend: &mut B,
        out: &mut Vec<SceneEvent>,
    ) {
        self.poll_gestures(out);
        self.elapsed += f64::from(dt);

        // The group keeps orbiting, so the local focus point is recomputed
        // from the current inverse every tick.
        let inverse = backend.group_inverse_world_transform();
        let eye = backend.camera_world_position();
        let focus_world = eye + backend.camera_world_direction() * FOCUS_DISTANCE;
        let ctx = FrameContext {
            mode: self.modes.mode(),
            elapsed: pulse_time(self.elapsed),
            focus_point: inverse.transform_point3(focus_world),
            camera_position: inverse.transform_point3(eye),
        };
        for entity in &mut self.entities {
            entity.update(dt, &ctx);
            backend.set_transform(entity.handle(), entity.transform());
        }
    }

    // ---------------- Photo intake ----------------

    /// Start a new upload batch of `len` images.
    pub fn begin_photo_batch(&mut self, len: usize, out: &mut Vec<SceneEvent>) -> BatchId {
        let batch = self.intake.begin_batch(len);
        if len == 0 {
            out.push(SceneEvent::BatchFinished { batch });
        }
        batch
    }

    pub fn image_decoded(
        &mut self,
        batch: BatchId,
        index: usize,
        result: Result<DecodedImage, DecodeError>,
        out: &mut Vec<SceneEvent>,
    ) -> Result<(), IntakeError> {
        let mut events = Vec::new();
        let res = self.intake.decode_finished(batch, index, result, &mut events);
        out.extend(events.into_iter().map(SceneEvent::from));
        res
    }

    pub fn caption_decided(&mut self, decision: CaptionDecision) -> Result<PhotoBuild, IntakeError> {
        self.intake.resolve(decision)
    }

    pub fn caption_submitted(&mut self, text: &str) -> Result<PhotoBuild, IntakeError> {
        self.caption_decided(CaptionDecision::Submit(text.to_string()))
    }

    pub fn caption_skipped(&mut self) -> Result<PhotoBuild, IntakeError> {
        self.caption_decided(CaptionDecision::Skip)
    }

    pub fn caption_dismissed(&mut self) -> Result<PhotoBuild, IntakeError> {
        self.caption_decided(CaptionDecision::Dismiss)
    }

    /// The renderable for a decided photo exists: append the entity, then
    /// move the queue on.
    pub fn photo_built(
        &mut self,
        ticket: BuildTicket,
        handle: RenderHandle,
        out: &mut Vec<SceneEvent>,
    ) -> Result<EntityId, IntakeError> {
        if EntityId::from_index(self.entities.len()).is_none() {
            log::error!(
                "entity limit reached, batch {} item {} dropped",
                ticket.batch(),
                ticket.index()
            );
            self.photo_build_failed(ticket, out)?;
            return Err(IntakeError::EntityLimit);
        }
        let mut events = Vec::new();
        let caption = self.intake.complete(ticket, &mut events)?;
        let id = self
            .spawn(Category::Photo, handle, Some(caption.clone()))
            .ok_or(IntakeError::EntityLimit)?;
        log::info!("photo {id} added (caption {:?})", caption);
        out.push(SceneEvent::PhotoAdded { id, caption });
        out.extend(events.into_iter().map(SceneEvent::from));
        Ok(id)
    }

    pub fn photo_build_failed(
        &mut self,
        ticket: BuildTicket,
        out: &mut Vec<SceneEvent>,
    ) -> Result<(), IntakeError> {
        let mut events = Vec::new();
        let res = self.intake.abandon(ticket, &mut events);
        out.extend(events.into_iter().map(SceneEvent::from));
        res
    }

    /// Build the photo's renderable through `backend` and append it.
    pub fn build_photo<B: RenderBackend + ?Sized>(
        &mut self,
        build: PhotoBuild,
        backend: &mut B,
        out: &mut Vec<SceneEvent>,
    ) -> Result<EntityId, IntakeError> {
        let handle = backend.create_renderable(
            GeometryDesc::Plane {
                aspect: build.image.aspect(),
            },
            MaterialDesc::Photo {
                image: &build.image,
            },
        );
        self.photo_built(build.ticket, handle, out)
    }
}
