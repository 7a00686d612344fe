//! The orchestrator: owns the room/IEM geometry, the shared late-reverb
//! network, the image-source slot pool, and every concurrency primitive
//! the audio and IEM threads need, and exposes the engine's public
//! operations.
//!
//! Grounded on the reference engine's `Context` (construction/teardown,
//! the init/update/remove scene calls, `GetOutput`'s per-block render
//! loop) with its raw-pointer task handoff and shared-ptr RCU swap
//! translated into [`SpinLock`]/[`ReleasePool`]/`Arc`/`Mutex`, since the
//! original's pointer-passing would need `unsafe` here.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use racoustic_audio::{Fdn, FeedbackMatrix, ImageSourceSlot, ReverbSourceRing};
use racoustic_config::EngineConfig;
use racoustic_iem::{Directivity, ImageSourceData, Iem, IemConfig, Source, SourceId};
use racoustic_math::{AbsorptionVector, Quat, ReverbFormula, Vec3};
use racoustic_room::{Room, WallId};

use crate::diffraction_kind::DiffractionModelKind;
use crate::error::EngineResult;
use crate::release_pool::ReleasePool;
use crate::reverb_time::ReverbTimeSource;
use crate::spatialiser::{NullSpatialiser, Spatialiser};
use crate::spin_lock::SpinLock;
use crate::thread_pool::ThreadPool;

/// Listener-relative head radius (metres). A source moved closer than this
/// is pushed back out along its approach direction, matching the
/// reference engine's `UpdateSource` clamp.
const HEAD_RADIUS_M: f32 = 0.0875;

/// IEM background cycle period.
const IEM_CYCLE_PERIOD: Duration = Duration::from_millis(10);

/// Fixed image-source slot pool size. A path beyond this count is
/// dropped rather than grown into.
const MAX_IMAGE_SOURCES: usize = 64;

/// Supported FDN channel counts, coarsest-first-match from the requested
/// count. `1` is dropped from the reference engine's list since the FDN
/// itself requires at least 2 channels to form a feedback matrix.
const SUPPORTED_FDN_CHANNEL_COUNTS: [usize; 9] = [2, 4, 6, 8, 12, 16, 20, 24, 32];

fn supported_fdn_channel_count(requested: usize) -> usize {
    SUPPORTED_FDN_CHANNEL_COUNTS
        .iter()
        .copied()
        .find(|&n| n >= requested.max(2))
        .unwrap_or(32)
}

type PathMap = BTreeMap<SourceId, BTreeMap<String, ImageSourceData>>;

/// Spatialisation quality the host selects via `update_spatialisation_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialisationMode {
    /// No binaural rendering; mono-to-stereo passthrough.
    None,
    /// Cheaper approximation, fewer HRTF taps.
    Performance,
    /// Full-quality rendering.
    Quality,
}

#[derive(Debug, Clone, Copy)]
struct ListenerState {
    position: Vec3,
    orientation: Quat,
}

/// Geometry and IEM state shared between the host-facing [`Context`] and
/// the IEM background thread.
struct SharedScene {
    room: Mutex<Room>,
    iem: Mutex<Iem>,
    listener: Mutex<ListenerState>,
    latest_paths: Mutex<Arc<PathMap>>,
    latest_reflection_gains: Mutex<Arc<Vec<Vec<f32>>>>,
    fdn_channel_count: AtomicUsize,
    running: AtomicBool,
    path_release_pool: ReleasePool<PathMap>,
}

fn spawn_iem_thread(scene: Arc<SharedScene>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while scene.running.load(Ordering::Acquire) {
            let cycle_start = Instant::now();
            let listener_position = scene
                .listener
                .lock()
                .expect("listener mutex poisoned")
                .position;

            let gains = {
                let mut room = scene.room.lock().expect("room mutex poisoned");
                let mut iem = scene.iem.lock().expect("iem mutex poisoned");
                iem.run_cycle(&mut room);
                let snapshot = Arc::new(iem.published().clone());
                drop(iem);

                let channel_count = scene.fdn_channel_count.load(Ordering::Relaxed);
                let gains = if channel_count >= 2 {
                    ReverbSourceRing::new(channel_count).reflection_gains_db(&room, listener_position)
                } else {
                    Vec::new()
                };
                drop(room);

                let old_paths = {
                    let mut guard = scene.latest_paths.lock().expect("latest_paths mutex poisoned");
                    std::mem::replace(&mut *guard, snapshot)
                };
                scene.path_release_pool.add(old_paths);
                gains
            };
            *scene
                .latest_reflection_gains
                .lock()
                .expect("reflection gains mutex poisoned") = Arc::new(gains);

            let elapsed = cycle_start.elapsed();
            if elapsed < IEM_CYCLE_PERIOD {
                std::thread::sleep(IEM_CYCLE_PERIOD - elapsed);
            }
        }
    })
}

struct SlotJobOutput {
    slot: ImageSourceSlot,
    mono: Vec<f32>,
}

struct JobSpec {
    slot_index: usize,
    source_id: SourceId,
    relative_position: Vec3,
    feeds_fdn: bool,
}

/// The orchestrator: owns the scene, drives the IEM background thread and
/// the audio-rate worker pool, and exposes the engine's stable surface.
pub struct Context {
    config: EngineConfig,
    head_radius_m: f32,
    scene: Arc<SharedScene>,
    iem_thread: Option<JoinHandle<()>>,
    thread_pool: ThreadPool,
    slot_render_lock: Arc<SpinLock>,
    slots: Vec<Option<ImageSourceSlot>>,
    key_to_slot: BTreeMap<String, usize>,
    diffraction_kind: DiffractionModelKind,
    spatialisation_mode: SpatialisationMode,
    impulse_response_mode: bool,
    spatialiser_factory: Box<dyn Fn() -> Box<dyn Spatialiser> + Send + Sync>,
    slot_spatialisers: Vec<Box<dyn Spatialiser>>,
    reverb_spatialisers: Vec<Box<dyn Spatialiser>>,
    fdn: Option<Fdn>,
    reverb_ring: ReverbSourceRing,
    reverb_gain_linear: f32,
    reverb_volume_m3: f32,
    reverb_time_mode: ReverbTimeSource,
    next_source_id: SourceId,
    pending_input: BTreeMap<SourceId, Vec<f32>>,
    output_buffer: Vec<f32>,
    output_valid: bool,
    fdn_input_scratch: Vec<f32>,
}

impl Context {
    /// Build a new engine instance from a validated configuration,
    /// spawning the IEM background thread and the audio worker pool. The
    /// public `init() -> bool` ABI call is this method's `Result::is_ok()`.
    pub fn init(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let num_bands = config.num_bands();

        let scene = Arc::new(SharedScene {
            room: Mutex::new(Room::new(num_bands)),
            iem: Mutex::new(Iem::new(IemConfig {
                max_reflection_order: config.max_reflection_order as usize,
                max_shadow_diffraction_order: config.max_shadow_diffraction_order as usize,
                max_specular_diffraction_order: config.max_specular_diffraction_order as usize,
                min_edge_length: 0.05,
                direct_always_audible: config.direct_always_audible,
                late_reverb_active: config.late_reverb_active,
            })),
            listener: Mutex::new(ListenerState {
                position: Vec3::ZERO,
                orientation: Quat::IDENTITY,
            }),
            latest_paths: Mutex::new(Arc::new(BTreeMap::new())),
            latest_reflection_gains: Mutex::new(Arc::new(Vec::new())),
            fdn_channel_count: AtomicUsize::new(0),
            running: AtomicBool::new(true),
            path_release_pool: ReleasePool::new(),
        });
        let iem_thread = Some(spawn_iem_thread(Arc::clone(&scene)));

        Ok(Self {
            config,
            head_radius_m: HEAD_RADIUS_M,
            scene,
            iem_thread,
            thread_pool: ThreadPool::with_default_size(),
            slot_render_lock: Arc::new(SpinLock::new(0)),
            slots: (0..MAX_IMAGE_SOURCES).map(|_| None).collect(),
            key_to_slot: BTreeMap::new(),
            diffraction_kind: DiffractionModelKind::Attenuate,
            spatialisation_mode: SpatialisationMode::Performance,
            impulse_response_mode: false,
            spatialiser_factory: Box::new(|| Box::new(NullSpatialiser) as Box<dyn Spatialiser>),
            slot_spatialisers: (0..MAX_IMAGE_SOURCES)
                .map(|_| Box::new(NullSpatialiser) as Box<dyn Spatialiser>)
                .collect(),
            reverb_spatialisers: Vec::new(),
            fdn: None,
            reverb_ring: ReverbSourceRing::new(2),
            reverb_gain_linear: 1.0,
            reverb_volume_m3: 0.0,
            reverb_time_mode: ReverbTimeSource::Formula(ReverbFormula::Sabine),
            next_source_id: 0,
            pending_input: BTreeMap::new(),
            output_buffer: vec![0.0; 0],
            output_valid: false,
            fdn_input_scratch: Vec::new(),
        })
    }

    /// Stop the IEM background thread and the audio worker pool. Called
    /// automatically on drop; exposed separately so a host can shut the
    /// engine down deterministically before releasing it.
    pub fn exit(&mut self) {
        self.scene.running.store(false, Ordering::Release);
        if let Some(handle) = self.iem_thread.take() {
            let _ = handle.join();
        }
        self.thread_pool.stop();
    }

    // -- Scene construction --------------------------------------------

    /// Register a new source at the origin, returning its stable ID.
    pub fn init_source(&mut self) -> SourceId {
        let id = self.next_source_id;
        self.next_source_id += 1;
        self.scene
            .iem
            .lock()
            .expect("iem mutex poisoned")
            .add_source(Source::new(id, Vec3::ZERO));
        id
    }

    /// Move and reorient a source, clamping its distance to the listener
    /// so it never sits inside the modelled head radius.
    pub fn update_source(&mut self, id: SourceId, position: Vec3, orientation: Quat) {
        let clamped = self.clamp_to_head_radius(position);
        let mut iem = self.scene.iem.lock().expect("iem mutex poisoned");
        if let Some(source) = iem.source_mut(id) {
            source.set_position(clamped);
            source.set_orientation(orientation);
        }
    }

    /// Change a source's directivity pattern.
    pub fn update_source_directivity(&mut self, id: SourceId, directivity: Directivity) {
        let mut iem = self.scene.iem.lock().expect("iem mutex poisoned");
        if let Some(source) = iem.source_mut(id) {
            source.set_directivity(directivity);
        }
    }

    /// Remove a source and drop any audio queued for it.
    pub fn remove_source(&mut self, id: SourceId) {
        self.pending_input.remove(&id);
        self.scene
            .iem
            .lock()
            .expect("iem mutex poisoned")
            .remove_source(id);
    }

    /// Add a triangular wall. Rejects the call (returning `None`) if
    /// `absorption_alpha`'s band count does not match the configured band
    /// table, or if the geometry is degenerate.
    pub fn init_wall(&mut self, vertex_triplet: [Vec3; 3], absorption_alpha: &[f32]) -> Option<WallId> {
        if absorption_alpha.len() != self.config.num_bands() {
            tracing::warn!(
                expected = self.config.num_bands(),
                got = absorption_alpha.len(),
                "init_wall: absorption band-count mismatch"
            );
            return None;
        }
        let area = triangle_area(&vertex_triplet);
        let absorption = AbsorptionVector::from_alpha(absorption_alpha, area);
        let mut room = self.scene.room.lock().expect("room mutex poisoned");
        match room.add_wall(vertex_triplet.to_vec(), absorption) {
            Ok(id) => {
                room.update_planes_and_edges();
                Some(id)
            }
            Err(err) => {
                tracing::debug!(%err, "init_wall rejected");
                None
            }
        }
    }

    /// Replace a wall's vertex triplet in place.
    pub fn update_wall(&mut self, id: WallId, vertex_triplet: [Vec3; 3]) {
        let mut room = self.scene.room.lock().expect("room mutex poisoned");
        if let Err(err) = room.update_wall(id, vertex_triplet.to_vec()) {
            tracing::debug!(%err, "update_wall rejected");
        }
    }

    /// Replace a wall's per-band absorption coefficients.
    pub fn update_wall_absorption(&mut self, id: WallId, absorption_alpha: &[f32]) {
        if absorption_alpha.len() != self.config.num_bands() {
            tracing::warn!(
                expected = self.config.num_bands(),
                got = absorption_alpha.len(),
                "update_wall_absorption: band-count mismatch"
            );
            return;
        }
        let mut room = self.scene.room.lock().expect("room mutex poisoned");
        let area = room.wall(id).map(|wall| wall.absorption().area_m2()).unwrap_or(0.0);
        room.update_wall_absorption(id, AbsorptionVector::from_alpha(absorption_alpha, area));
    }

    /// Remove a wall. Unknown IDs are a no-op.
    pub fn remove_wall(&mut self, id: WallId) {
        self.scene.room.lock().expect("room mutex poisoned").remove_wall(id);
    }

    /// Force the deferred plane/edge rebuild after a batch of wall edits.
    pub fn update_planes_and_edges(&mut self) {
        self.scene
            .room
            .lock()
            .expect("room mutex poisoned")
            .update_planes_and_edges();
    }

    // -- Reverb configuration --------------------------------------------

    /// Build the shared late-reverb network for a room of this volume and
    /// bounding-box dimensions. Returns `false` (without building
    /// anything) if `room_dimensions_m` is empty.
    pub fn init_late_reverb(&mut self, volume_m3: f32, room_dimensions_m: &[f32], matrix: FeedbackMatrix) -> bool {
        if room_dimensions_m.is_empty() {
            tracing::warn!("init_late_reverb: empty room dimensions");
            return false;
        }
        let channel_count = supported_fdn_channel_count(self.config.fdn_channel_count);
        self.fdn = Some(Fdn::new(
            channel_count,
            room_dimensions_m,
            self.config.sample_rate,
            self.config.num_bands(),
            matrix,
        ));
        self.reverb_ring = ReverbSourceRing::new(channel_count);
        self.reverb_spatialisers = (0..channel_count).map(|_| (self.spatialiser_factory)()).collect();
        self.scene.fdn_channel_count.store(channel_count, Ordering::Relaxed);
        self.fdn_input_scratch.clear();
        self.reverb_volume_m3 = volume_m3;
        self.apply_reverb_time();
        true
    }

    /// Re-derive T60 from a room-acoustics formula.
    pub fn update_reverb_time(&mut self, formula: ReverbFormula) {
        self.reverb_time_mode = ReverbTimeSource::Formula(formula);
        self.apply_reverb_time();
    }

    /// Force T60 to a fixed per-band vector, bypassing the formula.
    pub fn update_reverb_time_custom(&mut self, t60_per_band: &[f32]) {
        self.reverb_time_mode = ReverbTimeSource::Custom(t60_per_band.to_vec());
        self.apply_reverb_time();
    }

    fn apply_reverb_time(&mut self) {
        let Some(fdn) = self.fdn.as_mut() else {
            return;
        };
        let t60 = match &self.reverb_time_mode {
            ReverbTimeSource::Custom(t60) => t60.clone(),
            ReverbTimeSource::Formula(formula) => self
                .scene
                .room
                .lock()
                .expect("room mutex poisoned")
                .get_reverb_time(*formula, self.reverb_volume_m3),
        };
        for channel in 0..fdn.num_channels() {
            fdn.set_channel_t60(channel, self.config.sample_rate, &t60);
        }
    }

    /// Set the late-reverb network's output gain, in dB.
    pub fn update_late_reverb_gain(&mut self, gain_db: f32) {
        self.reverb_gain_linear = racoustic_dsp::db_to_linear(gain_db);
    }

    /// Zero every FDN delay line and filter state.
    pub fn reset_fdn(&mut self) {
        if let Some(fdn) = self.fdn.as_mut() {
            fdn.reset();
        }
    }

    /// Push new per-class path-order limits and enumeration toggles into
    /// the IEM loop.
    pub fn update_iem_config(
        &mut self,
        direct_always_audible: bool,
        max_reflection_order: u32,
        max_shadow_diffraction_order: u32,
        max_specular_diffraction_order: u32,
        late_reverb_active: bool,
        min_edge_length: f32,
    ) {
        self.config.direct_always_audible = direct_always_audible;
        self.config.max_reflection_order = max_reflection_order;
        self.config.max_shadow_diffraction_order = max_shadow_diffraction_order;
        self.config.max_specular_diffraction_order = max_specular_diffraction_order;
        self.config.late_reverb_active = late_reverb_active;
        self.scene
            .iem
            .lock()
            .expect("iem mutex poisoned")
            .set_config(IemConfig {
                max_reflection_order: max_reflection_order as usize,
                max_shadow_diffraction_order: max_shadow_diffraction_order as usize,
                max_specular_diffraction_order: max_specular_diffraction_order as usize,
                min_edge_length,
                direct_always_audible,
                late_reverb_active,
            });
    }

    /// Switch every attached slot's diffraction filter to `kind`,
    /// crossfading over each slot's queued model change.
    pub fn update_diffraction_model(&mut self, kind: DiffractionModelKind) {
        self.diffraction_kind = kind;
        let sample_rate = self.config.sample_rate;
        for slot in self.slots.iter_mut().flatten() {
            slot.queue_diffraction_model(kind.build(sample_rate));
        }
    }

    /// Move and reorient the listener.
    pub fn update_listener(&mut self, position: Vec3, orientation: Quat) {
        *self.scene.listener.lock().expect("listener mutex poisoned") = ListenerState { position, orientation };
        self.scene
            .iem
            .lock()
            .expect("iem mutex poisoned")
            .set_listener(position);
    }

    // -- Spatialisation ---------------------------------------------------

    /// Record a request to load HRTF/ILD data. This crate never parses
    /// the asset itself (that loader is an external collaborator, see
    /// [`Spatialiser`]); it validates the call shape and logs it. Install
    /// the actual renderer via [`Context::set_spatialiser_factory`].
    pub fn load_spatialisation_files(&mut self, hrtf_resample_step: i32, paths: &[String; 3]) -> bool {
        if paths.iter().any(|p| p.is_empty()) {
            tracing::error!("load_spatialisation_files requires three non-empty paths");
            return false;
        }
        tracing::info!(
            resample_step = hrtf_resample_step,
            hrtf = %paths[0],
            near_field_ild = %paths[1],
            spatialisation_ild = %paths[2],
            "spatialisation files requested; rendering is delegated to the host's Spatialiser"
        );
        true
    }

    /// Install the factory the engine uses to build per-slot and
    /// per-reverb-source `Spatialiser` instances, replacing every existing
    /// instance immediately.
    pub fn set_spatialiser_factory(&mut self, factory: impl Fn() -> Box<dyn Spatialiser> + Send + Sync + 'static) {
        self.spatialiser_factory = Box::new(factory);
        for slot in &mut self.slot_spatialisers {
            *slot = (self.spatialiser_factory)();
        }
        for slot in &mut self.reverb_spatialisers {
            *slot = (self.spatialiser_factory)();
        }
    }

    /// Record a headphone-EQ request. Actual convolution is the host
    /// `Spatialiser`'s responsibility.
    pub fn set_headphone_eq(&mut self, left_ir: &[f32], right_ir: &[f32]) {
        tracing::debug!(
            left_len = left_ir.len(),
            right_len = right_ir.len(),
            "set_headphone_eq recorded; applied by the host Spatialiser"
        );
    }

    /// Switch spatialisation quality for every image source.
    pub fn update_spatialisation_mode(&mut self, mode: SpatialisationMode) {
        self.spatialisation_mode = mode;
    }

    /// Toggle impulse-response measurement mode: when enabled, every
    /// interpolated parameter jumps immediately instead of ramping, so a
    /// captured IR is not smeared by the lerp itself.
    pub fn update_impulse_response_mode(&mut self, lerp_factor: f32, enabled: bool) {
        self.impulse_response_mode = enabled;
        self.config.lerp_factor = if enabled { 1.0 } else { lerp_factor };
    }

    // -- Audio path ---------------------------------------------------

    /// Queue one source's mono audio for the next `process_output` call.
    pub fn submit_audio(&mut self, source_id: SourceId, samples: &[f32]) {
        self.pending_input.insert(source_id, samples.to_vec());
    }

    /// Render one block: every attached image-source path through its
    /// slot chain (in parallel, via the worker pool), the shared FDN one
    /// sample at a time, and the FDN's per-channel output through the
    /// fixed reverb-source ring — all summed into the interleaved stereo
    /// output buffer. Returns `false` (dropping the buffer) if any output
    /// sample is non-finite.
    pub fn process_output(&mut self) -> bool {
        let frames = self.config.frames_per_callback;
        if self.output_buffer.len() != 2 * frames {
            self.output_buffer = vec![0.0; 2 * frames];
        } else {
            self.output_buffer.iter_mut().for_each(|s| *s = 0.0);
        }

        let paths = Arc::clone(&*self.scene.latest_paths.lock().expect("latest_paths mutex poisoned"));
        let listener = *self.scene.listener.lock().expect("listener mutex poisoned");
        let channel_count = self.fdn.as_ref().map(Fdn::num_channels).unwrap_or(0);

        if self.fdn_input_scratch.len() != channel_count * frames {
            self.fdn_input_scratch = vec![0.0; channel_count * frames];
        } else {
            self.fdn_input_scratch.iter_mut().for_each(|s| *s = 0.0);
        }

        let (jobs, active_keys) = self.build_jobs(&*paths, listener);
        self.release_stale_slots(&active_keys);
        self.run_jobs(jobs, frames, channel_count);
        self.render_fdn(frames, channel_count);

        self.pending_input.clear();

        if self.output_buffer.iter().any(|s| !s.is_finite()) {
            tracing::error!("process_output: non-finite sample, output buffer dropped");
            self.output_buffer.iter_mut().for_each(|s| *s = 0.0);
            self.output_valid = false;
            return false;
        }
        self.output_valid = true;
        true
    }

    fn build_jobs(&mut self, paths: &PathMap, listener: ListenerState) -> (Vec<JobSpec>, BTreeSet<String>) {
        let mut active_keys = BTreeSet::new();
        let mut jobs = Vec::new();
        let source_ids: Vec<SourceId> = self.pending_input.keys().copied().collect();

        for source_id in source_ids {
            let Some(source_paths) = paths.get(&source_id) else {
                continue;
            };
            for (key, data) in source_paths {
                if !data.visible {
                    continue;
                }
                active_keys.insert(key.clone());
                let distance_m = data.image_position.distance(listener.position);
                let slot_index = match self.key_to_slot.get(key).copied() {
                    Some(index) => {
                        if let Some(slot) = self.slots[index].as_mut() {
                            slot.update(data, distance_m);
                        }
                        index
                    }
                    None => match self.claim_slot(key, data, distance_m) {
                        Some(index) => index,
                        None => {
                            tracing::warn!(key = %key, "process_output: no free image-source slot");
                            continue;
                        }
                    },
                };
                jobs.push(JobSpec {
                    slot_index,
                    source_id,
                    relative_position: data.image_position - listener.position,
                    feeds_fdn: data.feeds_fdn,
                });
            }
        }
        (jobs, active_keys)
    }

    fn claim_slot(&mut self, key: &str, data: &ImageSourceData, distance_m: f32) -> Option<usize> {
        let index = self
            .slots
            .iter()
            .position(|slot| slot.as_ref().map_or(true, ImageSourceSlot::can_edit))?;
        let model = data
            .diffraction
            .as_ref()
            .map(|_| self.diffraction_kind.build(self.config.sample_rate));
        let slot = self.slots[index]
            .get_or_insert_with(|| ImageSourceSlot::new(self.config.sample_rate, self.config.num_bands()));
        slot.init(data, distance_m, model);
        self.slot_spatialisers[index] = (self.spatialiser_factory)();
        self.key_to_slot.insert(key.to_string(), index);
        Some(index)
    }

    fn release_stale_slots(&mut self, active_keys: &BTreeSet<String>) {
        let stale: Vec<String> = self
            .key_to_slot
            .keys()
            .filter(|key| !active_keys.contains(*key))
            .cloned()
            .collect();
        for key in stale {
            if let Some(index) = self.key_to_slot.remove(&key) {
                if let Some(slot) = self.slots[index].as_mut() {
                    slot.remove();
                }
            }
        }
    }

    fn run_jobs(&mut self, jobs: Vec<JobSpec>, frames: usize, channel_count: usize) {
        let results: Arc<Vec<Mutex<Option<SlotJobOutput>>>> =
            Arc::new((0..jobs.len()).map(|_| Mutex::new(None)).collect());

        for (job_index, job) in jobs.iter().enumerate() {
            let Some(slot) = self.slots[job.slot_index].take() else {
                continue;
            };
            let input = self
                .pending_input
                .get(&job.source_id)
                .cloned()
                .unwrap_or_else(|| vec![0.0; frames]);
            let results = Arc::clone(&results);
            self.thread_pool.submit(&self.slot_render_lock, move || {
                let mut slot = slot;
                let mut mono = vec![0.0f32; input.len()];
                slot.process(&input, &mut mono);
                *results[job_index].lock().expect("job result mutex poisoned") = Some(SlotJobOutput { slot, mono });
            });
        }
        self.slot_render_lock.lock();

        for (job_index, job) in jobs.iter().enumerate() {
            let Some(output) = results[job_index].lock().expect("job result mutex poisoned").take() else {
                continue;
            };
            self.slots[job.slot_index] = Some(output.slot);
            if job.feeds_fdn && channel_count > 0 {
                let channel = job.slot_index % channel_count;
                let base = channel * frames;
                for (frame, &s) in output.mono.iter().enumerate() {
                    self.fdn_input_scratch[base + frame] += s;
                }
            } else {
                let mut stereo = vec![0.0f32; 2 * output.mono.len()];
                self.slot_spatialisers[job.slot_index].render(&output.mono, job.relative_position, &mut stereo);
                for (out, s) in self.output_buffer.iter_mut().zip(stereo.iter()) {
                    *out += s;
                }
            }
        }
    }

    fn render_fdn(&mut self, frames: usize, channel_count: usize) {
        if channel_count == 0 {
            return;
        }
        let Some(fdn) = self.fdn.as_mut() else {
            return;
        };

        let mut channel_blocks = vec![vec![0.0f32; frames]; channel_count];
        let mut in_sample = vec![0.0f32; channel_count];
        let mut out_sample = vec![0.0f32; channel_count];
        for frame in 0..frames {
            for channel in 0..channel_count {
                in_sample[channel] = self.fdn_input_scratch[channel * frames + frame];
            }
            fdn.process(&in_sample, &mut out_sample);
            for channel in 0..channel_count {
                channel_blocks[channel][frame] = out_sample[channel] * self.reverb_gain_linear;
            }
        }

        let mut stereo = vec![0.0f32; 2 * frames];
        for source in self.reverb_ring.sources() {
            let channel = source.channel();
            let Some(block) = channel_blocks.get(channel) else {
                continue;
            };
            let Some(spatialiser) = self.reverb_spatialisers.get_mut(channel) else {
                continue;
            };
            spatialiser.render(block, source.direction(), &mut stereo);
            for (out, s) in self.output_buffer.iter_mut().zip(stereo.iter()) {
                *out += s;
            }
        }
    }

    /// The last rendered stereo output, or `None` if `process_output` has
    /// not yet succeeded (or its output was dropped for being non-finite).
    pub fn get_output_buffer(&self) -> Option<&[f32]> {
        self.output_valid.then_some(self.output_buffer.as_slice())
    }

    fn clamp_to_head_radius(&self, position: Vec3) -> Vec3 {
        let listener = self.scene.listener.lock().expect("listener mutex poisoned");
        let offset = position - listener.position;
        let distance = offset.length();
        if distance >= self.head_radius_m {
            return position;
        }
        let direction = if distance > 1e-6 {
            offset.normalized()
        } else {
            listener.orientation.forward()
        };
        listener.position + direction * self.head_radius_m
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.exit();
    }
}

fn triangle_area(vertices: &[Vec3; 3]) -> f32 {
    (vertices[1] - vertices[0]).cross(vertices[2] - vertices[0]).length() * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EngineConfig {
        EngineConfig {
            sample_rate: 48000.0,
            frames_per_callback: 32,
            band_table_hz: vec![500.0, 1000.0],
            fdn_channel_count: 2,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn init_rejects_invalid_config() {
        let mut cfg = test_config();
        cfg.sample_rate = 0.0;
        assert!(Context::init(cfg).is_err());
    }

    #[test]
    fn process_output_is_silent_with_no_sources() {
        let mut ctx = Context::init(test_config()).unwrap();
        assert!(ctx.process_output());
        let buf = ctx.get_output_buffer().unwrap();
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn direct_path_from_a_submitted_source_reaches_the_output() {
        let mut ctx = Context::init(test_config()).unwrap();
        let id = ctx.init_source();
        ctx.update_source(id, Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
        ctx.update_listener(Vec3::ZERO, Quat::IDENTITY);
        // Give the IEM background thread time to publish the direct path.
        std::thread::sleep(Duration::from_millis(40));
        ctx.submit_audio(id, &[1.0; 32]);
        assert!(ctx.process_output());
        let buf = ctx.get_output_buffer().unwrap().to_vec();
        assert!(buf.iter().any(|&s| s.abs() > 0.0));
    }

    #[test]
    fn init_wall_rejects_band_count_mismatch() {
        let mut ctx = Context::init(test_config()).unwrap();
        let triangle = [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 1.0),
        ];
        assert!(ctx.init_wall(triangle, &[0.1]).is_none());
    }

    #[test]
    fn init_late_reverb_rejects_empty_dimensions() {
        let mut ctx = Context::init(test_config()).unwrap();
        assert!(!ctx.init_late_reverb(50.0, &[], FeedbackMatrix::Householder));
    }

    #[test]
    fn init_late_reverb_builds_an_fdn_and_is_silent_when_fed_nothing() {
        let mut ctx = Context::init(test_config()).unwrap();
        assert!(ctx.init_late_reverb(50.0, &[4.0, 3.0, 3.0], FeedbackMatrix::Householder));
        assert!(ctx.process_output());
        let buf = ctx.get_output_buffer().unwrap();
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn head_radius_clamp_pushes_a_source_back_out() {
        let ctx = Context::init(test_config()).unwrap();
        let too_close = Vec3::new(0.01, 0.0, 0.0);
        let clamped = ctx.clamp_to_head_radius(too_close);
        assert!(clamped.length() >= HEAD_RADIUS_M - 1e-4);
    }
}
