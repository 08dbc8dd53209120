use crate::assets::{AssetSource, sibling_path};
use crate::bounds::{bone_bounds, skeleton_bounds};
use crate::event::EventQueue;
use crate::{
    Aabb, DrawableConfig, Error, MeshBuilder, SpineEvent, SpineMesh, TextureLoader, Vertex,
};
use glam::{Mat4, Vec2};
use spine2d::{
    AnimationState, AnimationStateData, Atlas, BlendMode, Physics, Skeleton, SkeletonData,
};
use std::sync::Arc;

/// How the indices of a [`DrawCommand`] are assembled.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Primitive {
    #[default]
    Triangles,
    /// Index pairs, as produced by [`SpineDrawable::draw_wireframe`].
    Lines,
}

/// One draw call for a range of the uploaded index buffer.
#[derive(Debug)]
pub struct DrawCommand<'a, T> {
    /// `None` when no atlas page backs the batch; hosts bind a white texture instead.
    pub texture: Option<&'a T>,
    pub blend: BlendMode,
    pub premultiplied_alpha: bool,
    pub primitive: Primitive,
    pub first_index: usize,
    pub index_count: usize,
    pub transform: Mat4,
    pub color: [f32; 4],
}

/// Host-side receiver of tessellated geometry.
///
/// A drawable uploads its mesh once per draw and then issues one command per batch; index
/// ranges in the commands refer to the most recently uploaded mesh.
pub trait DrawSink<T> {
    fn upload_mesh(&mut self, vertices: &[Vertex], indices: &[u16]);
    fn add_draw_command(&mut self, command: DrawCommand<'_, T>);
}

/// Per-frame contract between the host scene and anything it updates and draws.
pub trait Component<T> {
    fn update(&mut self, delta: f32);
    fn draw(&mut self, transform: Mat4, color: [f32; 4], sink: &mut dyn DrawSink<T>);
    fn draw_wireframe(&mut self, transform: Mat4, color: [f32; 4], sink: &mut dyn DrawSink<T>);
    fn bounding_box(&self) -> Option<Aabb>;
}

type EventCallback = Box<dyn FnMut(usize, &SpineEvent)>;

/// A Spine skeleton instance with its atlas, page textures and animation state.
///
/// `T` is the host's texture handle, produced by a [`TextureLoader`] once per atlas page.
pub struct SpineDrawable<T> {
    atlas: Atlas,
    textures: Vec<T>,
    skeleton: Skeleton,
    state: AnimationState,
    events: EventQueue,
    event_callback: Option<EventCallback>,
    time_scale: f32,
    builder: MeshBuilder,
    mesh: SpineMesh,
    /// False once the pose changed after `mesh` was built.
    mesh_current: bool,
    wireframe: Vec<u16>,
    bounding_box: Option<Aabb>,
}

impl<T> SpineDrawable<T> {
    /// Reads `atlas_file` and `skeleton_file` from `assets`, loading one texture per atlas page.
    ///
    /// Page image paths are resolved relative to the atlas file.
    pub fn load<A, L>(
        assets: &A,
        textures: &mut L,
        atlas_file: &str,
        skeleton_file: &str,
        config: &DrawableConfig,
    ) -> Result<Self, Error>
    where
        A: AssetSource + ?Sized,
        L: TextureLoader<Texture = T> + ?Sized,
    {
        let atlas_text = assets.read_to_string(atlas_file)?;
        let mut atlas = Atlas::parse(&atlas_text)?;

        let mut page_textures = Vec::with_capacity(atlas.pages.len());
        for page in &mut atlas.pages {
            let path = sibling_path(atlas_file, &page.name);
            let loaded = textures.load_texture(&path, page)?;
            if page.width == 0 || page.height == 0 {
                page.width = loaded.width;
                page.height = loaded.height;
            } else if (page.width, page.height) != (loaded.width, loaded.height) {
                log::warn!(
                    "atlas page '{}' declares {}x{} but texture is {}x{}",
                    page.name,
                    page.width,
                    page.height,
                    loaded.width,
                    loaded.height
                );
            }
            log::debug!("loaded atlas page {path} ({}x{})", page.width, page.height);
            page_textures.push(loaded.texture);
        }

        let json = assets.read_to_string(skeleton_file)?;
        let data = SkeletonData::from_json_str_with_scale(&json, config.scale)?;
        log::debug!(
            "loaded skeleton {skeleton_file}: {} bones, {} slots, {} animations",
            data.bones.len(),
            data.slots.len(),
            data.animations.len()
        );

        Self::from_parts(atlas, page_textures, data, config)
    }

    /// Builds a drawable from already parsed data. `textures[i]` backs `atlas.pages[i]`.
    pub fn from_parts(
        atlas: Atlas,
        textures: Vec<T>,
        data: Arc<SkeletonData>,
        config: &DrawableConfig,
    ) -> Result<Self, Error> {
        config.validate()?;
        if textures.len() != atlas.pages.len() {
            return Err(Error::InvalidValue {
                message: format!(
                    "{} textures supplied for {} atlas pages",
                    textures.len(),
                    atlas.pages.len()
                ),
            });
        }

        let mut skeleton = Skeleton::new(data.clone());
        if let Some(skin) = config.skin.as_deref() {
            skeleton.set_skin(Some(skin))?;
        }
        skeleton.set_to_setup_pose();
        skeleton.x = config.offset[0];
        skeleton.y = config.offset[1];
        skeleton.scale_x = signed(skeleton.scale_x, config.flip_x);
        skeleton.scale_y = signed(skeleton.scale_y, config.flip_y);
        skeleton.update_world_transform();

        let mut state_data = AnimationStateData::new(data);
        state_data.default_mix = config.default_mix;
        for mix in &config.mixes {
            state_data.set_mix(&mix.from, &mix.to, mix.duration)?;
        }

        let events = EventQueue::default();
        let mut state = AnimationState::new(state_data);
        state.set_listener(events.clone());

        let mut drawable = Self {
            atlas,
            textures,
            skeleton,
            state,
            events,
            event_callback: None,
            time_scale: config.time_scale,
            builder: MeshBuilder::new(config.max_vertices),
            mesh: SpineMesh::default(),
            mesh_current: false,
            wireframe: Vec::new(),
            bounding_box: None,
        };
        drawable.update_bounding_box();
        Ok(drawable)
    }

    /// Advances the skeleton by `delta` seconds (scaled by [`Self::time_scale`]) and poses it.
    pub fn update(&mut self, delta: f32) {
        if !delta.is_finite() || delta < 0.0 {
            return;
        }
        let delta = delta * self.time_scale;

        self.skeleton.update(delta);
        self.state.update(delta);
        self.state.apply(&mut self.skeleton);
        self.skeleton.update_world_transform_with_physics(Physics::Update);

        self.mesh_current = false;
        self.update_bounding_box();
        self.dispatch_events();
    }

    /// Tessellates the current pose and hands it to `sink`.
    ///
    /// Nothing is uploaded when no attachment is visible.
    pub fn draw<S>(&mut self, transform: Mat4, color: [f32; 4], sink: &mut S)
    where
        S: DrawSink<T> + ?Sized,
    {
        self.ensure_mesh();
        if self.mesh.is_empty() {
            return;
        }

        sink.upload_mesh(&self.mesh.vertices, &self.mesh.indices);
        for batch in &self.mesh.batches {
            let texture = batch.material.page.and_then(|page| self.textures.get(page));
            sink.add_draw_command(DrawCommand {
                texture,
                blend: batch.material.blend,
                premultiplied_alpha: batch.material.premultiplied_alpha,
                primitive: Primitive::Triangles,
                first_index: batch.first_index,
                index_count: batch.index_count,
                transform,
                color,
            });
        }
    }

    /// Uploads the triangle edges of the current pose as one untextured line list.
    pub fn draw_wireframe<S>(&mut self, transform: Mat4, color: [f32; 4], sink: &mut S)
    where
        S: DrawSink<T> + ?Sized,
    {
        self.ensure_mesh();
        self.mesh.wireframe_indices(&mut self.wireframe);
        if self.wireframe.is_empty() {
            return;
        }

        sink.upload_mesh(&self.mesh.vertices, &self.wireframe);
        sink.add_draw_command(DrawCommand {
            texture: None,
            blend: BlendMode::Normal,
            premultiplied_alpha: false,
            primitive: Primitive::Lines,
            first_index: 0,
            index_count: self.wireframe.len(),
            transform,
            color,
        });
    }

    /// Bounding-box attachments when the skeleton shows any, otherwise the geometry of the
    /// current pose, otherwise the active bone origins.
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.bounding_box
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// `time_scale` must be finite and non-negative; `0` pauses playback.
    pub fn set_time_scale(&mut self, time_scale: f32) -> Result<(), Error> {
        if !time_scale.is_finite() || time_scale < 0.0 {
            return Err(Error::InvalidValue {
                message: format!("time scale must be finite and >= 0, got {time_scale}"),
            });
        }
        self.time_scale = time_scale;
        Ok(())
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.skeleton.x, self.skeleton.y)
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.skeleton.x = offset.x;
        self.skeleton.y = offset.y;
        self.refresh_pose();
    }

    pub fn flip_x(&self) -> bool {
        self.skeleton.scale_x < 0.0
    }

    pub fn set_flip_x(&mut self, flip_x: bool) {
        self.skeleton.scale_x = signed(self.skeleton.scale_x, flip_x);
        self.refresh_pose();
    }

    pub fn flip_y(&self) -> bool {
        self.skeleton.scale_y < 0.0
    }

    pub fn set_flip_y(&mut self, flip_y: bool) {
        self.skeleton.scale_y = signed(self.skeleton.scale_y, flip_y);
        self.refresh_pose();
    }

    /// Returns bones and slots to the setup pose. Tracks keep playing on the next update.
    pub fn reset(&mut self) {
        self.skeleton.set_to_setup_pose();
        self.refresh_pose();
    }

    pub fn clear_tracks(&mut self) {
        self.state.clear_tracks();
        self.dispatch_events();
    }

    pub fn clear_track(&mut self, track_index: usize) {
        self.state.clear_track(track_index);
        self.dispatch_events();
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.skeleton.data.animation(name).is_some()
    }

    pub fn animation_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.skeleton.data.animations.iter().map(|a| a.name.as_str())
    }

    /// Name of the animation currently playing on `track_index`.
    pub fn animation_name(&self, track_index: usize) -> Option<String> {
        self.state
            .with_track_entry(track_index, |entry| entry.animation.name.clone())
    }

    pub fn set_animation(
        &mut self,
        track_index: usize,
        name: &str,
        looped: bool,
    ) -> Result<(), Error> {
        let result = self.state.set_animation(track_index, name, looped);
        self.dispatch_events();
        result.map(|_| ()).map_err(Error::from)
    }

    /// Queues `name` after the last entry on `track_index`. A `delay <= 0` is relative to the end
    /// of the previous entry, as in the runtime.
    pub fn add_animation(
        &mut self,
        track_index: usize,
        name: &str,
        looped: bool,
        delay: f32,
    ) -> Result<(), Error> {
        let result = self.state.add_animation(track_index, name, looped, delay);
        self.dispatch_events();
        result.map(|_| ()).map_err(Error::from)
    }

    pub fn set_animation_mix(&mut self, from: &str, to: &str, duration: f32) -> Result<(), Error> {
        self.state.data_mut().set_mix(from, to, duration)?;
        Ok(())
    }

    /// Restarts the animation on `track_index` and seeks it to `progress` (0..=1) of its
    /// duration. Events produced while seeking are discarded, and entries queued on the track
    /// are dropped.
    pub fn set_animation_progress(
        &mut self,
        track_index: usize,
        progress: f32,
    ) -> Result<(), Error> {
        if !progress.is_finite() {
            return Err(Error::InvalidValue {
                message: format!("animation progress must be finite, got {progress}"),
            });
        }
        let Some((name, looped, duration)) = self.state.with_track_entry(track_index, |entry| {
            (
                entry.animation.name.clone(),
                entry.looped,
                entry.animation.duration,
            )
        }) else {
            return Ok(());
        };
        if !self.has_animation(&name) {
            return Ok(());
        }

        self.events.set_muted(true);
        self.state.clear_track(track_index);
        let result = self.state.set_animation(track_index, &name, looped);
        if result.is_ok() {
            self.state.update(duration * progress.clamp(0.0, 1.0));
            self.state.apply(&mut self.skeleton);
        }
        self.events.set_muted(false);
        result?;

        self.refresh_pose();
        Ok(())
    }

    /// Position of the current entry on `track_index` within its animation, in 0..=1.
    ///
    /// A looping entry reports `1.0` when it sits exactly on the end of a completed loop.
    pub fn animation_progress(&self, track_index: usize) -> f32 {
        self.state
            .with_track_entry(track_index, |entry| {
                let duration = entry.animation_end - entry.animation_start;
                if duration <= 0.0 {
                    return 0.0;
                }
                if entry.looped {
                    let within = entry.track_time % duration;
                    if within == 0.0 && entry.track_time > 0.0 {
                        1.0
                    } else {
                        within / duration
                    }
                } else {
                    (entry.track_time / duration).clamp(0.0, 1.0)
                }
            })
            .unwrap_or(0.0)
    }

    /// Installs the callback receiving `(track_index, event)` for every animation state event.
    pub fn set_event_callback<F>(&mut self, callback: F)
    where
        F: FnMut(usize, &SpineEvent) + 'static,
    {
        self.event_callback = Some(Box::new(callback));
    }

    pub fn clear_event_callback(&mut self) {
        self.event_callback = None;
    }

    /// Switches skin and re-applies the setup attachments of the new skin.
    pub fn set_skin(&mut self, name: &str) -> Result<(), Error> {
        self.skeleton.set_skin(Some(name))?;
        self.skeleton.set_to_setup_pose();
        self.state.apply(&mut self.skeleton);
        self.dispatch_events();
        self.refresh_pose();
        Ok(())
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Direct access to the runtime skeleton. Call [`Self::update`] or [`Self::reset`]
    /// afterwards so world transforms and the bounding box are recomputed.
    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        self.mesh_current = false;
        &mut self.skeleton
    }

    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    pub fn animation_state_mut(&mut self) -> &mut AnimationState {
        &mut self.state
    }

    pub fn page_texture(&self, page: usize) -> Option<&T> {
        self.textures.get(page)
    }

    /// Geometry of the most recently tessellated pose.
    pub fn mesh(&self) -> &SpineMesh {
        &self.mesh
    }

    fn ensure_mesh(&mut self) {
        if !self.mesh_current {
            self.builder.build(&mut self.mesh, &self.skeleton, &self.atlas);
            self.mesh_current = true;
            self.update_bounding_box();
        }
    }

    fn refresh_pose(&mut self) {
        self.skeleton.update_world_transform();
        self.mesh_current = false;
        self.update_bounding_box();
    }

    fn update_bounding_box(&mut self) {
        if let Some(bounds) = skeleton_bounds(&self.skeleton) {
            self.bounding_box = Some(bounds);
            return;
        }
        if !self.mesh_current {
            self.builder.build(&mut self.mesh, &self.skeleton, &self.atlas);
            self.mesh_current = true;
        }
        self.bounding_box = self.mesh.bounds().or_else(|| bone_bounds(&self.skeleton));
    }

    fn dispatch_events(&mut self) {
        let events = self.events.drain();
        let Some(callback) = self.event_callback.as_mut() else {
            return;
        };
        for event in &events {
            log::trace!(
                "track {} {:?}: {} {}",
                event.track_index,
                event.kind,
                event.animation_name,
                event.name
            );
            callback(event.track_index, event);
        }
    }
}

impl<T> Component<T> for SpineDrawable<T> {
    fn update(&mut self, delta: f32) {
        SpineDrawable::update(self, delta);
    }

    fn draw(&mut self, transform: Mat4, color: [f32; 4], sink: &mut dyn DrawSink<T>) {
        SpineDrawable::draw(self, transform, color, sink);
    }

    fn draw_wireframe(&mut self, transform: Mat4, color: [f32; 4], sink: &mut dyn DrawSink<T>) {
        SpineDrawable::draw_wireframe(self, transform, color, sink);
    }

    fn bounding_box(&self) -> Option<Aabb> {
        SpineDrawable::bounding_box(self)
    }
}

fn signed(scale: f32, negative: bool) -> f32 {
    if negative { -scale.abs() } else { scale.abs() }
}
