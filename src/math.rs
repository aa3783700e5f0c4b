//! View and projection matrices.
//!
//! Both functions produce OpenGL-style matrices (right-handed, clip-space depth
//! in `[-1, 1]`). Multiply the projection by [`OPENGL_TO_WGPU_MATRIX`] before
//! handing it to wgpu, which expects depth in `[0, 1]`.

use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, Vector4};

/// Remaps OpenGL clip-space depth `[-1, 1]` to wgpu's `[0, 1]`.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const EPSILON: f32 = 0.000001;

/// Normalizes `v`, or returns the zero vector when `v` has no length.
fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    let len = v.magnitude();
    if len == 0.0 { Vector3::new(0.0, 0.0, 0.0) } else { v / len }
}

/// Builds a view matrix for a viewer at `eye` looking at `center`.
///
/// Returns the identity when `eye` and `center` coincide (within `1e-6` on
/// every axis). A degenerate `up` (parallel to the view direction) yields a
/// zeroed right/up basis instead of NaNs.
pub fn look_at(eye: Point3<f32>, center: Point3<f32>, up: Vector3<f32>) -> Matrix4<f32> {
    if (eye.x - center.x).abs() < EPSILON
        && (eye.y - center.y).abs() < EPSILON
        && (eye.z - center.z).abs() < EPSILON
    {
        return Matrix4::identity();
    }

    let z = (eye - center).normalize();
    let x = normalize_or_zero(up.cross(z));
    let y = normalize_or_zero(z.cross(x));
    let eye = eye - Point3::new(0.0, 0.0, 0.0);

    Matrix4::from_cols(
        Vector4::new(x.x, y.x, z.x, 0.0),
        Vector4::new(x.y, y.y, z.y, 0.0),
        Vector4::new(x.z, y.z, z.z, 0.0),
        Vector4::new(-x.dot(eye), -y.dot(eye), -z.dot(eye), 1.0),
    )
}

/// Builds a perspective projection.
///
/// * `fovy` is the vertical field of view in radians
/// * `aspect` is typically viewport width / height
pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let f = 1.0 / (fovy / 2.0).tan();
    let nf = 1.0 / (near - far);
    Matrix4::from_cols(
        Vector4::new(f / aspect, 0.0, 0.0, 0.0),
        Vector4::new(0.0, f, 0.0, 0.0),
        Vector4::new(0.0, 0.0, (far + near) * nf, -1.0),
        Vector4::new(0.0, 0.0, 2.0 * far * near * nf, 0.0),
    )
}
