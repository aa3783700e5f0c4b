//! Orbit camera.
//!
//! The camera circles a fixed center. Its state is an azimuth `theta`, an
//! elevation `phi` and the logarithm of the distance to the center. Input does
//! not move the camera directly but adds to per-axis velocities that are
//! integrated once per frame and decay by `damping`, which gives the orbit its
//! inertia.
//!
//! - [`OrbitCamera`] holds the state and builds the view matrix
//! - [`Projection`] builds the perspective matrix for the current viewport
//! - [`CameraController`] turns winit window events into orbit input
//! - [`CameraUniform`] / [`CameraResources`] are the GPU side

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use cgmath::{Matrix4, Point3, Vector3};
use wgpu::util::DeviceExt;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

use crate::math::{self, OPENGL_TO_WGPU_MATRIX};

/// Wheel travel that counts as one notch for pixel-precise devices.
const PIXELS_PER_LINE: f32 = 100.0;
/// Zoom velocity per wheel notch before `zoom_speed`.
const ZOOM_PER_LINE: f32 = 0.05;

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    pub center: Point3<f32>,
    pub theta: f32,
    pub phi: f32,
    log_distance: f32,
    d_theta: f32,
    d_phi: f32,
    d_log_distance: f32,
    pub damping: f32,
    pub rotation_speed: f32,
    pub zoom_speed: f32,
    min_distance: f32,
    max_distance: f32,
}

impl OrbitCamera {
    const FRONT: Vector3<f32> = Vector3::new(0.0, 0.0, 1.0);
    const RIGHT: Vector3<f32> = Vector3::new(1.0, 0.0, 0.0);
    const UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

    pub fn new(center: Point3<f32>, distance: f32) -> Self {
        let mut camera = Self {
            center,
            theta: 0.0,
            phi: 0.0,
            log_distance: 0.0,
            d_theta: 0.0,
            d_phi: 0.0,
            d_log_distance: 0.0,
            damping: 0.9,
            rotation_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.1,
            max_distance: 1000.0,
        };
        camera.set_distance(distance);
        camera
    }

    /// Limit the eye distance to `[min, max]`.
    pub fn with_distance_bounds(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min.max(f32::MIN_POSITIVE);
        self.max_distance = max.max(self.min_distance);
        let distance = self.distance();
        self.set_distance(distance);
        self
    }

    pub fn distance(&self) -> f32 {
        self.log_distance.exp()
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.log_distance = distance
            .clamp(self.min_distance, self.max_distance)
            .ln();
    }

    /// Add orbit velocity. `dx`/`dy` are cursor deltas as fractions of the viewport.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.d_theta += self.rotation_speed * TAU * dx;
        self.d_phi += self.rotation_speed * TAU * dy;
    }

    /// Add zoom velocity. Positive values move the eye away from the center.
    pub fn zoom(&mut self, amount: f32) {
        self.d_log_distance += self.zoom_speed * amount;
    }

    /// Integrate one frame of velocity and let it decay.
    pub fn update(&mut self) {
        self.theta += self.d_theta;
        self.phi = (self.phi + self.d_phi).clamp(-FRAC_PI_2, FRAC_PI_2);
        self.log_distance = (self.log_distance + self.d_log_distance)
            .clamp(self.min_distance.ln(), self.max_distance.ln());

        self.d_theta *= self.damping;
        self.d_phi *= self.damping;
        self.d_log_distance *= self.damping;
    }

    /// Whether any input velocity is left to integrate.
    pub fn is_moving(&self) -> bool {
        const REST: f32 = 1e-6;
        self.d_theta.abs() > REST || self.d_phi.abs() > REST || self.d_log_distance.abs() > REST
    }

    pub fn eye(&self) -> Point3<f32> {
        let r = self.distance();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        self.center
            + Self::FRONT * (r * sin_theta * cos_phi)
            + Self::RIGHT * (r * cos_theta * cos_phi)
            + Self::UP * (r * sin_phi)
    }

    pub fn view(&self) -> Matrix4<f32> {
        math::look_at(self.eye(), self.center, Self::UP)
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 0.0), 4.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: f32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        math::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(1, 1, FRAC_PI_4, 0.01, 1000.0)
    }
}

/// Maps winit window events onto an [`OrbitCamera`].
///
/// Dragging with the left mouse button orbits, the wheel zooms.
#[derive(Debug, Default)]
pub struct CameraController {
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
    viewport: (u32, u32),
}

impl CameraController {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dragging: false,
            last_cursor: None,
            viewport: (width.max(1), height.max(1)),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Returns true if the event was consumed by the camera.
    pub fn handle_window_events(&mut self, camera: &mut OrbitCamera, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let current = (position.x, position.y);
                if let (true, Some(last)) = (self.dragging, self.last_cursor) {
                    let dx = (current.0 - last.0) as f32 / self.viewport.0 as f32;
                    let dy = (current.1 - last.1) as f32 / self.viewport.1 as f32;
                    camera.rotate(dx, dy);
                }
                self.last_cursor = Some(current);
                self.dragging
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                // Scrolling up (positive) pulls the camera closer.
                camera.zoom(-lines * ZOOM_PER_LINE);
                true
            }
            _ => false,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view: Matrix4::identity().into(),
            projection: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &OrbitCamera, projection: &Projection) {
        self.view = camera.view().into();
        self.projection = (OPENGL_TO_WGPU_MATRIX * projection.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the camera needs on the GPU side plus its CPU state.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: OrbitCamera,
    pub controller: CameraController,
    pub projection: Projection,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        camera: OrbitCamera,
        projection: Projection,
        viewport: [u32; 2],
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, &projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller: CameraController::new(viewport[0], viewport[1]),
            projection,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        self.controller.resize(width, height);
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        self.controller.handle_window_events(&mut self.camera, event)
    }

    /// Advance the orbit by one frame and push the matrices to the GPU.
    pub fn update(&mut self, queue: &wgpu::Queue) {
        self.camera.update();
        self.uniform.update_view_proj(&self.camera, &self.projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, MetricSpace};
    use winit::dpi::PhysicalPosition;
    use winit::event::{DeviceId, TouchPhase};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn initial_eye_is_on_the_right_axis() {
        let camera = OrbitCamera::default();
        let eye = camera.eye();
        assert!(approx(eye.x, 4.0) && approx(eye.y, 0.0) && approx(eye.z, 0.0));
        assert!(approx(camera.distance(), 4.0));
    }

    #[test]
    fn eye_keeps_its_distance_while_orbiting() {
        let mut camera = OrbitCamera::new(Point3::new(1.0, 2.0, 3.0), 5.0);
        camera.theta = 1.1;
        camera.phi = -0.4;
        assert!(approx(camera.eye().distance(camera.center), 5.0));
        camera.theta = FRAC_PI_2;
        camera.phi = 0.0;
        let offset = camera.eye() - camera.center;
        assert!(approx(offset.normalize().z, 1.0));
    }

    #[test]
    fn velocity_decays_with_damping() {
        let mut camera = OrbitCamera::default();
        camera.rotate(0.1, 0.0);
        let first = TAU * 0.1;
        camera.update();
        assert!(approx(camera.theta, first));
        camera.update();
        assert!(approx(camera.theta, first + first * 0.9));
        for _ in 0..500 {
            camera.update();
        }
        assert!(!camera.is_moving());
        assert!(approx(camera.theta, first / (1.0 - 0.9)));
    }

    #[test]
    fn full_drag_comes_to_rest_in_bounded_frames() {
        let mut camera = OrbitCamera::default();
        assert!(!camera.is_moving());
        camera.rotate(1.0, -1.0);
        camera.zoom(1.0);
        assert!(camera.is_moving());

        let mut frames = 0;
        while camera.is_moving() {
            camera.update();
            frames += 1;
            assert!(frames < 200, "camera still moving after {frames} frames");
        }
        assert!(frames > 100);
    }

    #[test]
    fn elevation_and_distance_are_clamped() {
        let mut camera = OrbitCamera::default().with_distance_bounds(1.0, 10.0);
        camera.rotate(0.0, 10.0);
        camera.zoom(100.0);
        for _ in 0..50 {
            camera.update();
        }
        assert!(camera.phi <= FRAC_PI_2);
        assert!(approx(camera.phi, FRAC_PI_2));
        assert!(approx(camera.distance(), 10.0));

        camera.zoom(-1000.0);
        for _ in 0..50 {
            camera.update();
        }
        assert!(approx(camera.distance(), 1.0));
    }

    #[test]
    fn view_looks_at_center() {
        use cgmath::Transform;
        let mut camera = OrbitCamera::default();
        camera.theta = 0.7;
        camera.phi = 0.3;
        let p = camera.view().transform_point(camera.center);
        assert!(approx(p.x, 0.0) && approx(p.y, 0.0));
        assert!(approx(p.z, -4.0));
    }

    fn device() -> DeviceId {
        // SAFETY: the dummy id is only compared against other ids in winit, never dereferenced.
        unsafe { DeviceId::dummy() }
    }

    fn cursor(x: f64, y: f64) -> WindowEvent {
        WindowEvent::CursorMoved {
            device_id: device(),
            position: PhysicalPosition::new(x, y),
        }
    }

    fn left(state: ElementState) -> WindowEvent {
        WindowEvent::MouseInput {
            device_id: device(),
            state,
            button: MouseButton::Left,
        }
    }

    #[test]
    fn drag_rotates_only_while_pressed() {
        let mut camera = OrbitCamera::default();
        let mut controller = CameraController::new(200, 100);

        controller.handle_window_events(&mut camera, &cursor(10.0, 10.0));
        controller.handle_window_events(&mut camera, &cursor(50.0, 10.0));
        camera.update();
        assert!(approx(camera.theta, 0.0));

        assert!(controller.handle_window_events(&mut camera, &left(ElementState::Pressed)));
        assert!(controller.is_dragging());
        controller.handle_window_events(&mut camera, &cursor(70.0, 20.0));
        camera.update();
        assert!(approx(camera.theta, TAU * 0.1));
        assert!(approx(camera.phi, TAU * 0.1));

        controller.handle_window_events(&mut camera, &left(ElementState::Released));
        assert!(!controller.is_dragging());
    }

    #[test]
    fn wheel_up_zooms_in() {
        let mut camera = OrbitCamera::default();
        let mut controller = CameraController::new(100, 100);
        let wheel = WindowEvent::MouseWheel {
            device_id: device(),
            delta: MouseScrollDelta::LineDelta(0.0, 2.0),
            phase: TouchPhase::Moved,
        };
        assert!(controller.handle_window_events(&mut camera, &wheel));
        camera.update();
        assert!(camera.distance() < 4.0);
    }

    #[test]
    fn uniform_projection_is_wgpu_corrected() {
        let camera = OrbitCamera::default();
        let projection = Projection::new(800, 600, FRAC_PI_4, 0.01, 1000.0);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, &projection);
        let expected: [[f32; 4]; 4] = (OPENGL_TO_WGPU_MATRIX * projection.calc_matrix()).into();
        assert_eq!(uniform.projection, expected);
        assert!(approx(projection.aspect(), 800.0 / 600.0));
    }
}
