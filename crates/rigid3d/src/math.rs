//! 3x3 matrix helpers for shape matching.
//!
//! glam covers the vector/matrix arithmetic; this module adds the pieces it
//! lacks: outer products, a polar decomposition built on a Jacobi
//! eigen-solver, and conversions to the host's row-major layout.

use glam::{Mat3, Quat, Vec3};

use crate::constants::EPSILON;

/// Maximum Jacobi sweeps for the symmetric eigen-solver.
const JACOBI_MAX_SWEEPS: usize = 32;

/// Inputs with a smaller Frobenius norm are treated as the zero matrix.
const ZERO_MATRIX_NORM: f32 = 1e-12;

/// Singular values below this fraction of the largest are treated as zero.
const RANK_TOLERANCE: f32 = 1e-5;

/// Outer product `p * q^T`.
#[inline]
pub fn outer_product(p: Vec3, q: Vec3) -> Mat3 {
    Mat3::from_cols(p * q.x, p * q.y, p * q.z)
}

/// True when every entry of `m` is strictly below `eps` in magnitude.
pub fn is_near_zero(m: Mat3, eps: f32) -> bool {
    m.to_cols_array().iter().all(|v| v.abs() < eps)
}

/// Substitutes the identity for a (numerically) zero rotation.
///
/// This is the caller-side policy for degenerate covariance matrices:
/// objects with a single particle, or collapsed onto a point.
pub fn rotation_or_identity(r: Mat3) -> Mat3 {
    if is_near_zero(r, EPSILON) {
        log::trace!("degenerate covariance, substituting identity rotation");
        Mat3::IDENTITY
    } else {
        r
    }
}

/// Factor `a = r * s` with `r` a proper rotation and `s` symmetric.
///
/// `s` is positive-semidefinite whenever `det(a) >= 0`; for reflections the
/// negative sign lands on the smallest singular value so that `r` stays a
/// rotation. Rank-deficient inputs still yield an orthonormal `r` by
/// completing the missing axes to a right-handed frame.
///
/// A numerically zero `a` returns `(Mat3::ZERO, Mat3::ZERO)`; callers apply
/// [`rotation_or_identity`].
pub fn polar_decompose(a: Mat3) -> (Mat3, Mat3) {
    let norm_sq = a.x_axis.length_squared() + a.y_axis.length_squared() + a.z_axis.length_squared();
    if !(norm_sq.sqrt() >= ZERO_MATRIX_NORM) {
        return (Mat3::ZERO, Mat3::ZERO);
    }

    // Right singular vectors and squared singular values from A^T A.
    let (eigenvalues, mut v) = symmetric_eigen(a.transpose() * a);
    if v.determinant() < 0.0 {
        v.z_axis = -v.z_axis;
    }

    let sigma = eigenvalues.max(Vec3::ZERO).to_array().map(f32::sqrt);
    let tolerance = sigma[0] * RANK_TOLERANCE;

    let u0 = (a * v.x_axis).normalize_or_zero();
    if u0 == Vec3::ZERO {
        return (Mat3::ZERO, Mat3::ZERO);
    }
    let u1 = if sigma[1] > tolerance {
        let av1 = a * v.y_axis;
        (av1 - u0 * av1.dot(u0)).normalize_or(u0.any_orthonormal_vector())
    } else {
        u0.any_orthonormal_vector()
    };
    let u2 = u0.cross(u1);
    let u = Mat3::from_cols(u0, u1, u2);

    let r = u * v.transpose();
    let s = r.transpose() * a;
    let s = (s + s.transpose()) * 0.5;
    (r, s)
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns eigenvalues sorted in descending order and the matching unit
/// eigenvectors as the columns of the second matrix.
pub fn symmetric_eigen(m: Mat3) -> (Vec3, Mat3) {
    // a[row][col]; m is symmetric so the storage order does not matter.
    let mut a = m.to_cols_array_2d();
    let mut v = Mat3::IDENTITY.to_cols_array_2d();

    let scale = a[0][0].abs() + a[1][1].abs() + a[2][2].abs();
    for _ in 0..JACOBI_MAX_SWEEPS {
        let off = a[0][1] * a[0][1] + a[0][2] * a[0][2] + a[1][2] * a[1][2];
        if off <= f32::MIN_POSITIVE || off.sqrt() <= scale * f32::EPSILON {
            break;
        }

        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            let apq = a[p][q];
            if apq == 0.0 {
                continue;
            }
            let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
            let t = theta.signum() / (theta.abs() + theta.hypot(1.0));
            let c = 1.0 / t.hypot(1.0);
            let s = t * c;

            a[p][p] -= t * apq;
            a[q][q] += t * apq;
            a[p][q] = 0.0;
            a[q][p] = 0.0;

            let r = 3 - p - q;
            let arp = a[r][p];
            let arq = a[r][q];
            a[r][p] = c * arp - s * arq;
            a[p][r] = a[r][p];
            a[r][q] = s * arp + c * arq;
            a[q][r] = a[r][q];

            // v stores eigenvectors as columns: v[col][row].
            for row in 0..3 {
                let vp = v[p][row];
                let vq = v[q][row];
                v[p][row] = c * vp - s * vq;
                v[q][row] = s * vp + c * vq;
            }
        }
    }

    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| a[j][j].total_cmp(&a[i][i]));

    let values = Vec3::new(a[order[0]][order[0]], a[order[1]][order[1]], a[order[2]][order[2]]);
    let vectors = Mat3::from_cols(
        Vec3::from_array(v[order[0]]),
        Vec3::from_array(v[order[1]]),
        Vec3::from_array(v[order[2]]),
    );
    (values, vectors)
}

/// Rows of `m`, the layout the host reads rotation matrices in.
pub fn mat3_to_rows(m: Mat3) -> [[f32; 3]; 3] {
    m.transpose().to_cols_array_2d()
}

/// Inverse of [`mat3_to_rows`].
pub fn mat3_from_rows(rows: [[f32; 3]; 3]) -> Mat3 {
    Mat3::from_cols_array_2d(&rows).transpose()
}

/// Quaternion for a rotation matrix, for hosts that drive transforms with quaternions.
///
/// Degenerate (zero) matrices map to the identity quaternion.
pub fn mat3_to_quat(m: Mat3) -> Quat {
    Quat::from_mat3(&rotation_or_identity(m)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat_close(a: Mat3, b: Mat3, tol: f32) {
        assert!(a.abs_diff_eq(b, tol), "matrices differ:\n{:?}\n{:?}", a, b);
    }

    #[test]
    fn test_outer_product() {
        let m = outer_product(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0));
        // Row i, column j = p[i] * q[j]
        assert_eq!(m.row(0), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(m.row(1), Vec3::new(8.0, 10.0, 12.0));
        assert_eq!(m.row(2), Vec3::new(12.0, 15.0, 18.0));
    }

    #[test]
    fn test_polar_of_rotation_is_rotation() {
        let rot = Mat3::from_quat(Quat::from_euler(glam::EulerRot::XYZ, 0.3, -0.7, 1.1));
        let (r, s) = polar_decompose(rot);
        assert_mat_close(r, rot, 1e-5);
        assert_mat_close(s, Mat3::IDENTITY, 1e-5);
    }

    #[test]
    fn test_polar_of_scaled_rotation() {
        let rot = Mat3::from_rotation_z(std::f32::consts::FRAC_PI_6);
        let stretch = Mat3::from_diagonal(Vec3::new(3.0, 2.0, 0.5));
        let (r, s) = polar_decompose(rot * stretch);
        assert_mat_close(r, rot, 1e-5);
        assert_mat_close(s, stretch, 1e-4);
    }

    #[test]
    fn test_polar_rank_deficient_gives_rotation() {
        // Planar covariance: a single layer of particles.
        let a = outer_product(Vec3::X, Vec3::X) + outer_product(Vec3::Z, Vec3::Z);
        let (r, s) = polar_decompose(a);
        assert_mat_close(r.transpose() * r, Mat3::IDENTITY, 1e-5);
        assert!((r.determinant() - 1.0).abs() < 1e-5);
        assert_mat_close(r * s, a, 1e-5);
    }

    #[test]
    fn test_polar_reflection_keeps_proper_rotation() {
        let a = Mat3::from_diagonal(Vec3::new(2.0, 1.0, -0.5));
        let (r, s) = polar_decompose(a);
        assert!((r.determinant() - 1.0).abs() < 1e-5);
        assert_mat_close(r * s, a, 1e-5);
    }

    #[test]
    fn test_polar_zero_matrix_defers_to_caller() {
        let (r, s) = polar_decompose(Mat3::ZERO);
        assert_eq!(r, Mat3::ZERO);
        assert_eq!(s, Mat3::ZERO);
        assert_eq!(rotation_or_identity(r), Mat3::IDENTITY);
    }

    #[test]
    fn test_symmetric_eigen_sorted() {
        let m = Mat3::from_cols(
            Vec3::new(4.0, 1.0, 0.0),
            Vec3::new(1.0, 3.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        );
        let (values, vectors) = symmetric_eigen(m);
        assert!(values.x >= values.y && values.y >= values.z);
        for (i, lambda) in values.to_array().into_iter().enumerate() {
            let v = vectors.col(i);
            assert!((m * v - v * lambda).length() < 1e-4, "eigenpair {} off", i);
        }
    }

    #[test]
    fn test_row_major_round_trip() {
        let m = Mat3::from_rotation_y(0.4);
        let rows = mat3_to_rows(m);
        assert_eq!(rows[0], m.row(0).to_array());
        assert_eq!(mat3_from_rows(rows), m);
    }

    #[test]
    fn test_quat_from_zero_rotation_is_identity() {
        assert_eq!(mat3_to_quat(Mat3::ZERO), Quat::IDENTITY);
    }
}
