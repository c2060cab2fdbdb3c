use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use keepsake_core::{
    HeadlessBackend, InstanceRaw, ModeId, RenderBackend, Scene, SceneEvent, SceneParams,
};

mod decode;

const FRAME_DT: f32 = 1.0 / 60.0;

/// Scripted pointer and button input, keyed by frame number.
#[derive(Clone, Copy, Debug)]
enum Action {
    Button(ModeId),
    /// Double-click on the middle of the formation.
    DoubleClickCenter,
    /// Single click on the first photo, if there is one.
    ClickFirstPhoto,
}

const TIMELINE: &[(u32, Action)] = &[
    (90, Action::DoubleClickCenter),
    (210, Action::ClickFirstPhoto),
    (300, Action::Button(ModeId::Focus)),
    (420, Action::Button(ModeId::Dispersed)),
    (500, Action::Button(ModeId::Compact)),
];

struct Options {
    images: Vec<PathBuf>,
    captions: VecDeque<String>,
    frames: u32,
    seed: u64,
    dump: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Options> {
    let mut opts = Options {
        images: Vec::new(),
        captions: VecDeque::new(),
        frames: 600,
        seed: 42,
        dump: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--captions" => {
                let list = args.next().context("--captions needs a value")?;
                opts.captions = list.split(',').map(str::to_string).collect();
            }
            "--frames" => {
                let v = args.next().context("--frames needs a value")?;
                opts.frames = v.parse().with_context(|| format!("bad frame count {v:?}"))?;
            }
            "--seed" => {
                let v = args.next().context("--seed needs a value")?;
                opts.seed = v.parse().with_context(|| format!("bad seed {v:?}"))?;
            }
            "--dump" => {
                opts.dump = Some(args.next().context("--dump needs a path")?.into());
            }
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            path => opts.images.push(path.into()),
        }
    }
    Ok(opts)
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let mut opts = parse_args()?;
    let mut backend = HeadlessBackend::default();
    let mut scene = Scene::with_system_clock(
        SceneParams {
            seed: opts.seed,
            ..SceneParams::default()
        },
        &mut backend,
    );

    let mut events = Vec::new();
    let (tx, rx) = mpsc::channel();
    if !opts.images.is_empty() {
        let batch = scene.begin_photo_batch(opts.images.len(), &mut events);
        decode::spawn_decoders(batch, &opts.images, &tx);
    }
    drop(tx);

    let mut pending: VecDeque<SceneEvent> = VecDeque::new();
    for frame in 0..opts.frames {
        // Decode completions land between ticks, never during one.
        while let Ok(done) = rx.try_recv() {
            if let Err(e) = scene.image_decoded(done.batch, done.index, done.result, &mut events) {
                log::error!("decode result rejected: {e}");
            }
        }

        for (_, action) in TIMELINE.iter().filter(|(f, _)| *f == frame) {
            perform(*action, &mut scene, &backend, &mut events);
        }

        backend.advance(FRAME_DT);
        scene.tick(FRAME_DT, &mut backend, &mut events);

        pending.extend(events.drain(..));
        while let Some(ev) = pending.pop_front() {
            handle_event(ev, &mut scene, &mut backend, &mut opts.captions, &mut events);
            pending.extend(events.drain(..));
        }

        thread::sleep(Duration::from_secs_f32(FRAME_DT));
    }

    log::info!(
        "finished after {} frames in {:?}: {} entities, {} photos",
        opts.frames,
        scene.mode(),
        scene.entities().len(),
        scene.photo_ids().len()
    );
    for id in scene.photo_ids() {
        if let Some(photo) = scene.entity(*id) {
            log::info!("photo {id}: caption {:?}", photo.caption().unwrap_or_default());
        }
    }

    if let Some(path) = &opts.dump {
        let mut instances: Vec<InstanceRaw> = Vec::new();
        backend.instances(&mut instances);
        std::fs::write(path, bytemuck::cast_slice(&instances))
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("wrote {} instances to {}", instances.len(), path.display());
    }
    Ok(())
}

fn perform(action: Action, scene: &mut Scene, backend: &HeadlessBackend, out: &mut Vec<SceneEvent>) {
    log::info!("input: {:?}", action);
    match action {
        Action::Button(mode) => {
            scene.mode_button_pressed(mode, out);
        }
        Action::DoubleClickCenter => {
            let (x, y) = backend.project(glam::Vec3::ZERO);
            scene.pointer_clicked(x, y, backend, out);
            scene.pointer_clicked(x, y, backend, out);
            scene.pointer_double_clicked(x, y, backend, out);
        }
        Action::ClickFirstPhoto => {
            let target = scene
                .photo_ids()
                .first()
                .and_then(|id| scene.entity(*id))
                .and_then(|p| backend.world_position(p.handle()));
            match target {
                Some(world) => {
                    let (x, y) = backend.project(world);
                    scene.pointer_clicked(x, y, backend, out);
                }
                None => log::info!("no photo to click yet"),
            }
        }
    }
}

fn handle_event(
    ev: SceneEvent,
    scene: &mut Scene,
    backend: &mut HeadlessBackend,
    captions: &mut VecDeque<String>,
    out: &mut Vec<SceneEvent>,
) {
    match ev {
        SceneEvent::CaptionPromptRequested { batch, index } => {
            let size = scene
                .intake()
                .prompt_image()
                .map(|img| (img.width, img.height));
            log::info!("caption prompt for batch {batch} item {index} ({size:?})");
            let decided = match captions.pop_front() {
                Some(text) if !text.is_empty() => scene.caption_submitted(&text),
                Some(_) => scene.caption_skipped(),
                None => scene.caption_dismissed(),
            };
            match decided {
                Ok(build) => {
                    if let Err(e) = scene.build_photo(build, backend, out) {
                        log::error!("photo build rejected: {e}");
                    }
                }
                Err(e) => log::error!("caption decision rejected: {e}"),
            }
        }
        SceneEvent::CaptionPromptWithdrawn { batch, index } => {
            log::info!("caption prompt for batch {batch} item {index} withdrawn")
        }
        SceneEvent::CaptionDisplayRequested(text) => log::info!("caption: {text}"),
        SceneEvent::ModeChanged(mode) => log::info!("mode changed to {:?}", mode),
        SceneEvent::DecodeFailed { index, error, .. } => {
            log::warn!("skipping image {index}: {error}")
        }
        SceneEvent::PhotoAdded { id, caption } => {
            log::info!("photo {id} joined the tree ({caption:?}); camera at {}", backend.camera_world_position())
        }
        SceneEvent::BatchFinished { batch } => log::info!("batch {batch} done"),
    }
}
