//! The garden scene: scattered grass with wind, the ground slab, the flying
//! avatar, the follow camera and the waypoint beacons, advanced one frame at a
//! time in a fixed order.

use engine_core::{
    normalize_to_height, world_matrix, world_position, world_scale, AvatarRoot, AvatarVisual, MeshInstance,
    Name, Parent, ScatteredProp, Transform,
};
use glam::{Vec3, Vec4};
use hecs::{Entity, World};
use input::{InputMode, InputState};
use procgen::ScatterLayout;
use renderer::{
    apply_wind_sway, scale_compensation, Camera, CameraUniform, InstanceData, Material, MaterialId, MaterialKind,
    ShaderError, Vertex, WindMaterials, WindUniform, LIT_SHADER_TEMPLATE,
};

use crate::camera_rig::ParallaxRig;
use crate::config::{ConfigError, SceneConfig};
use crate::flight::AvatarController;
use crate::waypoints::{BeaconVisual, WaypointEvent, WaypointTracker};

pub const PLATFORM_MESH: u32 = 0;
pub const GRASS_MESH: u32 = 1;
pub const AVATAR_MESH: u32 = 2;

const GRASS_COLOR: Vec4 = Vec4::new(0.55, 0.78, 0.36, 1.0);
const PLATFORM_COLOR: Vec4 = Vec4::new(0.78, 0.92, 0.45, 1.0);
const AVATAR_COLOR: Vec4 = Vec4::new(0.61, 0.72, 0.83, 1.0);

/// Something the host UI should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// Show the waypoint's popup.
    BeaconEntered { id: String, title: String, message: String },
    BeaconExited { id: String },
    /// The player steered for the first time (hide the controls hint).
    FirstMove,
}

impl From<WaypointEvent> for SceneEvent {
    fn from(event: WaypointEvent) -> Self {
        match event {
            WaypointEvent::Entered { id, title, message } => SceneEvent::BeaconEntered { id, title, message },
            WaypointEvent::Exited { id } => SceneEvent::BeaconExited { id },
        }
    }
}

/// One scattered patch: its material and the model nodes that use it.
#[derive(Debug)]
pub struct PatchRender {
    pub key: String,
    pub material: Material,
    /// Mean world scale of the patch's models.
    pub average_scale: f32,
    models: Vec<Entity>,
}

impl PatchRender {
    pub fn models(&self) -> &[Entity] {
        &self.models
    }
}

#[derive(Debug)]
struct MountedAvatar {
    controller: AvatarController,
    root: Entity,
    visual: Entity,
}

pub struct GardenScene {
    pub world: World,
    pub camera: Camera,
    config: SceneConfig,
    layout: ScatterLayout,
    patches: Vec<PatchRender>,
    wind: WindMaterials,
    rig: ParallaxRig,
    waypoints: WaypointTracker,
    avatar: Option<MountedAvatar>,
    avatar_material: Material,
    platform_material: Material,
    platform_vertices: Vec<Vertex>,
    platform_indices: Vec<u32>,
    elapsed: f32,
}

impl GardenScene {
    /// Generate every patch, patch their materials for wind and lay out the
    /// ground. The avatar is not mounted yet.
    pub fn build(config: SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let layout = ScatterLayout::build(&config.patches)?;
        let waypoints = WaypointTracker::new(config.waypoints.clone())?;

        let mut world = World::new();
        let mut wind = WindMaterials::new();

        let model_bounds = config.grass.bounds();
        let fit = normalize_to_height(&model_bounds, config.grass.target_height, config.grass.sit_on_ground);
        let source_material = Material::new(MaterialKind::Standard, "grass").with_color(GRASS_COLOR);

        let mut patches = Vec::with_capacity(layout.patches.len());
        for patch in &layout.patches {
            let key = patch.spec.key.clone();
            let mut material = source_material.clone();
            material.name = format!("grass:{}", key);

            let models: Vec<Entity> = patch
                .instances
                .iter()
                .enumerate()
                .map(|(index, instance)| {
                    let node = world.spawn((
                        instance.transform(patch.spec.base_rotation),
                        ScatteredProp {
                            patch_key: key.clone(),
                            index,
                        },
                        Name::new(format!("{}#{}", key, index)),
                    ));
                    world.spawn((
                        Transform::from_position(Vec3::new(0.0, fit.lift, 0.0)).with_uniform_scale(fit.scale),
                        Parent(node),
                        MeshInstance::new(GRASS_MESH, material.id()),
                    ))
                })
                .collect();

            let scales: Vec<f32> = models
                .iter()
                .filter_map(|m| world_scale(&world, *m))
                .map(|s| (s.x + s.y + s.z) / 3.0)
                .collect();
            let average_scale = if scales.is_empty() {
                1.0
            } else {
                scales.iter().sum::<f32>() / scales.len() as f32
            };

            apply_wind_sway(
                &mut wind,
                &mut material,
                model_bounds.min.y,
                model_bounds.max.y,
                scale_compensation(average_scale),
            );
            patches.push(PatchRender {
                key,
                material,
                average_scale,
                models,
            });
        }

        let platform_material = Material::new(MaterialKind::Standard, "platform").with_color(PLATFORM_COLOR);
        let mesh = config.platform.build_mesh();
        let platform_vertices = mesh
            .vertices
            .iter()
            .map(|v| Vertex::new(v.position, v.normal, v.uv).with_color(PLATFORM_COLOR))
            .collect();
        world.spawn((
            Transform::default(),
            MeshInstance::new(PLATFORM_MESH, platform_material.id()),
            Name::new("platform"),
        ));

        let mut camera = Camera::looking_at(config.camera.position, config.rig.center);
        camera.fov_degrees = config.camera.fov_degrees;
        camera.near = config.camera.near;
        camera.far = config.camera.far;

        log::info!(
            "Built garden: {} patches, {} props, {} waypoints, platform {} triangles",
            patches.len(),
            layout.instance_count(),
            waypoints.len(),
            mesh.triangle_count()
        );

        Ok(Self {
            world,
            camera,
            rig: ParallaxRig::new(config.rig),
            avatar_material: Material::new(MaterialKind::Standard, "avatar").with_color(AVATAR_COLOR),
            config,
            layout,
            patches,
            wind,
            waypoints,
            avatar: None,
            platform_material,
            platform_vertices,
            platform_indices: mesh.indices,
            elapsed: 0.0,
        })
    }

    /// Spawn the avatar at its intro pose with fresh input state. Returns the
    /// root node; mounting twice keeps the existing avatar.
    pub fn mount_avatar(&mut self) -> Entity {
        if let Some(avatar) = &self.avatar {
            return avatar.root;
        }
        let cfg = &self.config.avatar;
        let controller = AvatarController::new(cfg.rest_position, cfg.rest_rotation, self.config.input_mode)
            .with_tuning(self.config.flight_tuning());

        let root = self
            .world
            .spawn((controller.root_transform(), AvatarRoot, Name::new("avatar")));
        let visual = self.world.spawn((
            controller.visual_transform(),
            Parent(root),
            AvatarVisual,
            MeshInstance::new(AVATAR_MESH, self.avatar_material.id()),
        ));
        log::debug!("Mounted avatar at {:?}", controller.position());
        self.avatar = Some(MountedAvatar {
            controller,
            root,
            visual,
        });
        root
    }

    /// Despawn the avatar nodes and drop its input state.
    pub fn unmount_avatar(&mut self) -> bool {
        let Some(avatar) = self.avatar.take() else {
            return false;
        };
        for entity in [avatar.visual, avatar.root] {
            if self.world.despawn(entity).is_err() {
                log::warn!("Avatar node {:?} was already gone", entity);
            }
        }
        log::debug!("Unmounted avatar");
        true
    }

    /// Advance the scene: avatar, then camera, then waypoints, then the wind clock.
    pub fn frame(&mut self, elapsed: f32, dt: f32, aspect: f32) -> Vec<SceneEvent> {
        let mut events = Vec::new();
        self.camera.set_aspect(aspect);

        if let Some(avatar) = self.avatar.as_mut() {
            if avatar.controller.tick(dt) {
                events.push(SceneEvent::FirstMove);
            }
            if let Ok(mut t) = self.world.get::<&mut Transform>(avatar.root) {
                *t = avatar.controller.root_transform();
            }
            if let Ok(mut t) = self.world.get::<&mut Transform>(avatar.visual) {
                *t = avatar.controller.visual_transform();
            }
        }

        let avatar_position = self.avatar_position();
        self.rig.update(&mut self.camera, avatar_position, aspect, dt);
        events.extend(self.waypoints.update(avatar_position).into_iter().map(SceneEvent::from));
        self.wind.set_time(elapsed);
        self.elapsed = elapsed;

        for event in &events {
            match event {
                SceneEvent::BeaconEntered { id, .. } => log::info!("Entered waypoint {}", id),
                SceneEvent::BeaconExited { id } => log::info!("Left waypoint {}", id),
                SceneEvent::FirstMove => log::debug!("First movement"),
            }
        }
        events
    }

    /// World position of the avatar root, if mounted.
    pub fn avatar_position(&self) -> Option<Vec3> {
        self.avatar.as_ref().and_then(|a| world_position(&self.world, a.root))
    }

    pub fn avatar(&self) -> Option<&AvatarController> {
        self.avatar.as_ref().map(|a| &a.controller)
    }

    /// Input of the mounted avatar; `None` when nothing is mounted.
    pub fn input_mut(&mut self) -> Option<&mut InputState> {
        self.avatar.as_mut().map(|a| a.controller.input_mut())
    }

    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.config.input_mode = mode;
        if let Some(avatar) = self.avatar.as_mut() {
            avatar.controller.set_input_mode(mode);
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn layout(&self) -> &ScatterLayout {
        &self.layout
    }

    pub fn patches(&self) -> &[PatchRender] {
        &self.patches
    }

    /// View-projection and eye position for the camera bind group.
    pub fn camera_uniform(&self) -> CameraUniform {
        let mut uniform = CameraUniform::new();
        uniform.update(&self.camera);
        uniform
    }

    pub fn wind(&self) -> &WindMaterials {
        &self.wind
    }

    pub fn wind_uniform(&self, material: MaterialId) -> Option<WindUniform> {
        self.wind.get(material).map(|s| s.to_uniform())
    }

    pub fn waypoints(&self) -> &WaypointTracker {
        &self.waypoints
    }

    pub fn beacons(&self) -> Vec<BeaconVisual> {
        self.waypoints.beacons(&self.config.beacon, self.elapsed)
    }

    /// Per-patch instance buffers built from the models' world matrices.
    pub fn instance_buffers(&self) -> Vec<(&str, Vec<InstanceData>)> {
        self.patches
            .iter()
            .map(|patch| {
                let color = patch.material.color.into();
                let instances = patch
                    .models
                    .iter()
                    .filter_map(|m| world_matrix(&self.world, *m))
                    .map(|m| InstanceData::new(m.to_cols_array_2d(), color))
                    .collect();
                (patch.key.as_str(), instances)
            })
            .collect()
    }

    /// Vertex shader source of a patch's material, hooks applied.
    pub fn patch_shader(&self, key: &str) -> Option<Result<String, ShaderError>> {
        self.patches
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.material.compile(LIT_SHADER_TEMPLATE))
    }

    pub fn platform_mesh(&self) -> (&[Vertex], &[u32]) {
        (&self.platform_vertices, &self.platform_indices)
    }

    pub fn platform_material(&self) -> &Material {
        &self.platform_material
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoints::WaypointDefinition;
    use input::{ElementState, KeyCode};

    const DT: f32 = 1.0 / 60.0;
    const ASPECT: f32 = 16.0 / 9.0;

    fn run(scene: &mut GardenScene, frames: usize, clock: &mut f32) -> Vec<SceneEvent> {
        let mut events = Vec::new();
        for _ in 0..frames {
            *clock += DT;
            events.extend(scene.frame(*clock, DT, ASPECT));
        }
        events
    }

    #[test]
    fn default_scene_scatters_every_patch_with_wind() {
        let scene = GardenScene::build(SceneConfig::default()).unwrap();
        assert_eq!(scene.patches().len(), 5);
        assert_eq!(scene.layout().instance_count(), 10 + 12 + 18 + 18 + 11);
        assert_eq!(scene.wind().len(), 5);

        let fit_scale = 0.25;
        for (patch, scattered) in scene.patches().iter().zip(&scene.layout().patches) {
            let expected = fit_scale * scattered.average_scale();
            assert!((patch.average_scale - expected).abs() < 1e-5, "{}", patch.key);
            let state = scene.wind().get(patch.material.id()).unwrap();
            assert!((state.scale_compensation - 1.0 / expected).abs() < 1e-3);
            assert_eq!((state.height_min, state.height_max), (0.0, 1.0));
        }

        let buffers = scene.instance_buffers();
        assert_eq!(buffers[0].0, "grass1");
        assert_eq!(buffers[0].1.len(), 10);
        let shader = scene.patch_shader("grass1").unwrap().unwrap();
        assert!(shader.contains("struct WindUniforms"));
        assert!(!scene.platform_mesh().1.is_empty());
    }

    #[test]
    fn scattered_models_sit_at_instance_positions() {
        let scene = GardenScene::build(SceneConfig::default()).unwrap();
        let patch = &scene.patches()[0];
        let scattered = &scene.layout().patches[0];
        for (model, instance) in patch.models().iter().zip(&scattered.instances) {
            let p = world_position(&scene.world, *model).unwrap();
            assert!((p - instance.position).length() < 1e-5);
        }
    }

    #[test]
    fn flight_through_a_waypoint_emits_events_in_order() {
        let mut config = SceneConfig::default();
        let rest = config.avatar.rest_position;
        config.waypoints = vec![WaypointDefinition::new("probe", "Probe", "hello", rest + Vec3::new(1.0, 0.0, 0.0))
            .with_radii(0.3, None)];
        let mut scene = GardenScene::build(config).unwrap();
        scene.mount_avatar();

        let mut clock = 0.0;
        assert!(run(&mut scene, 130, &mut clock).is_empty());

        scene
            .input_mut()
            .unwrap()
            .process_keyboard(KeyCode::KeyD, ElementState::Pressed);
        let events = run(&mut scene, 120, &mut clock);

        assert_eq!(events.first(), Some(&SceneEvent::FirstMove));
        assert_eq!(events.iter().filter(|e| **e == SceneEvent::FirstMove).count(), 1);
        let entered = events
            .iter()
            .position(|e| matches!(e, SceneEvent::BeaconEntered { id, .. } if id == "probe"))
            .expect("entered the probe waypoint");
        let exited = events
            .iter()
            .position(|e| *e == SceneEvent::BeaconExited { id: "probe".into() })
            .expect("left the probe waypoint");
        assert!(entered < exited);
    }

    #[test]
    fn frame_drives_camera_and_wind_clock() {
        let mut scene = GardenScene::build(SceneConfig::default()).unwrap();
        let start = scene.camera.position();
        scene.frame(0.5, DT, ASPECT);
        assert_eq!(scene.camera.position(), start, "no avatar, camera untouched");
        assert_eq!(scene.camera.aspect, ASPECT);
        assert!(scene.wind().uniforms().all(|(_, u)| u.time == 0.5));

        scene.mount_avatar();
        let mut clock = 0.5;
        run(&mut scene, 30, &mut clock);
        assert_ne!(scene.camera.position(), start);
        let id = scene.patches()[2].material.id();
        assert_eq!(scene.wind_uniform(id).unwrap().time, clock);
    }

    #[test]
    fn projection_follows_viewport_aspect() {
        let mut scene = GardenScene::build(SceneConfig::default()).unwrap();
        scene.mount_avatar();
        scene.frame(0.1, DT, 0.6);
        assert_eq!(scene.camera.aspect, 0.6);
        let uniform = scene.camera_uniform();
        assert_eq!(uniform.view_proj, scene.camera.view_projection_matrix().to_cols_array_2d());
        let eye = scene.camera.position();
        assert_eq!(uniform.position, [eye.x, eye.y, eye.z, 1.0]);

        // A collapsed viewport keeps the last good aspect.
        scene.frame(0.2, DT, 0.0);
        assert_eq!(scene.camera.aspect, 0.6);
    }

    #[test]
    fn unmount_despawns_avatar_and_input() {
        let mut scene = GardenScene::build(SceneConfig::default()).unwrap();
        let before = scene.world.len();
        let root = scene.mount_avatar();
        assert_eq!(scene.mount_avatar(), root);
        assert_eq!(scene.world.len(), before + 2);

        scene.frame(0.1, DT, ASPECT);
        assert!(scene.unmount_avatar());
        assert_eq!(scene.world.len(), before);
        assert!(scene.input_mut().is_none());
        assert!(scene.avatar_position().is_none());
        assert!(scene.frame(0.2, DT, ASPECT).is_empty());
        assert!(!scene.unmount_avatar());
    }

    #[test]
    fn avatar_node_follows_controller() {
        let mut scene = GardenScene::build(SceneConfig::default()).unwrap();
        scene.mount_avatar();
        let mut clock = 0.0;
        run(&mut scene, 10, &mut clock);
        let controller = scene.avatar().unwrap().position();
        let node = scene.avatar_position().unwrap();
        assert!((controller - node).length() < 1e-5);
    }

    #[test]
    fn touch_mode_switches_tuning() {
        let mut scene = GardenScene::build(SceneConfig::default()).unwrap();
        scene.mount_avatar();
        scene.set_input_mode(InputMode::Touch);
        assert_eq!(scene.avatar().unwrap().tuning().max_vel, 0.027);
    }
}
