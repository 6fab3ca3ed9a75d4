/*!
Principal component analysis of small point sets, using cyclic Jacobi
rotations on the 3x3 covariance matrix.
*/

use glam::{DVec3, Mat3, Vec3};

/// Safety cap on Jacobi sweeps. A 3x3 matrix converges in a handful.
const MAX_SWEEPS: usize = 50;

/// Axes with zero extent are given this length so the frame stays invertible.
const MIN_AXIS_LENGTH: f32 = 1e-15;

/// A coordinate frame: three axes as the columns of a matrix, and an origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub axes: Mat3,
    pub origin: Vec3,
}

impl Frame {
    pub fn axis(&self, i: usize) -> Vec3 {
        self.axes.col(i)
    }

    /// Unit vector along the third axis.
    pub fn normal(&self) -> Vec3 {
        self.axes.z_axis.normalize_or_zero()
    }

    /// Map a point from frame coordinates to world coordinates.
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.origin + self.axes * local
    }

    pub fn is_right_handed(&self) -> bool {
        self.axes.determinant() >= 0.
    }

    /// Negate the first axis if the frame is left handed.
    pub fn make_right_handed(&mut self) {
        if self
            .axes
            .x_axis
            .cross(self.axes.y_axis)
            .dot(self.axes.z_axis)
            < 0.
        {
            self.axes.x_axis = -self.axes.x_axis;
        }
    }
}

/// Rotate the pair of values by the Jacobi rotation given by `tau` and `vsin`.
fn rotate(v1: &mut f64, v2: &mut f64, tau: f64, vsin: f64) {
    let (t1, t2) = (*v1, *v2);
    *v1 -= vsin * (t2 + t1 * tau);
    *v2 += vsin * (t1 - t2 * tau);
}

/// Eigen decomposition of the symmetric matrix, of which only the upper
/// triangle is read. Returns the eigenvalues, and the eigenvectors as rows.
fn jacobi_eigen(mut a: [[f64; 3]; 3]) -> ([f64; 3], [[f64; 3]; 3]) {
    const N: usize = 3;
    let mut val = [a[0][0], a[1][1], a[2][2]];
    let mut vec = [[1., 0., 0.], [0., 1., 0.], [0., 0., 1.]];
    for _ in 0..MAX_SWEEPS {
        let offdiag: f64 = (0..(N - 1))
            .flat_map(|i| ((i + 1)..N).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j].abs())
            .sum();
        if offdiag == 0. {
            break;
        }
        for i in 0..(N - 1) {
            for j in (i + 1)..N {
                let aij = a[i][j];
                let thresh = 1e2 * aij.abs();
                if val[i].abs() + thresh == val[i].abs() && val[j].abs() + thresh == val[j].abs() {
                    a[i][j] = 0.;
                    continue;
                }
                if aij == 0. {
                    continue;
                }
                let dd = val[j] - val[i];
                let vtan = if dd.abs() + thresh == dd.abs() {
                    aij / dd
                } else {
                    let theta = 0.5 * dd / aij;
                    let t = 1. / (theta.abs() + (1. + theta * theta).sqrt());
                    if theta < 0. { -t } else { t }
                };
                let vcos = 1. / (1. + vtan * vtan).sqrt();
                let vsin = vtan * vcos;
                let tau = vsin / (1. + vcos);
                val[i] -= vtan * aij;
                val[j] += vtan * aij;
                a[i][j] = 0.;
                for k in 0..i {
                    let (mut x, mut y) = (a[k][i], a[k][j]);
                    rotate(&mut x, &mut y, tau, vsin);
                    (a[k][i], a[k][j]) = (x, y);
                }
                for k in (i + 1)..j {
                    let (mut x, mut y) = (a[i][k], a[k][j]);
                    rotate(&mut x, &mut y, tau, vsin);
                    (a[i][k], a[k][j]) = (x, y);
                }
                for k in (j + 1)..N {
                    let (mut x, mut y) = (a[i][k], a[j][k]);
                    rotate(&mut x, &mut y, tau, vsin);
                    (a[i][k], a[j][k]) = (x, y);
                }
                for k in 0..N {
                    let (mut x, mut y) = (vec[i][k], vec[j][k]);
                    rotate(&mut x, &mut y, tau, vsin);
                    (vec[i][k], vec[j][k]) = (x, y);
                }
            }
        }
    }
    // Insertion sort, descending.
    for i in 1..N {
        let mut j = i;
        while j > 0 && val[j - 1] < val[j] {
            val.swap(j - 1, j);
            vec.swap(j - 1, j);
            j -= 1;
        }
    }
    (val, vec)
}

/// Principal component frame of the points. The origin is the centroid, and
/// the axes are the eigenvectors of the covariance matrix in order of
/// decreasing eigenvalue, each scaled by the square root of its eigenvalue.
/// Axes with no extent get a tiny non zero length, so the frame is always
/// invertible, and the frame is always right handed. The third axis is the
/// direction of least variance, i.e. the normal of a best fit plane.
///
/// Also returns the eigenvalues in decreasing order.
pub fn principal_components(points: &[Vec3]) -> (Frame, Vec3) {
    assert!(!points.is_empty(), "Need at least one point");
    let n = points.len() as f64;
    let center = points
        .iter()
        .fold(DVec3::ZERO, |sum, p| sum + p.as_dvec3())
        / n;
    let mut cov = [[0f64; 3]; 3];
    for c0 in 0..3 {
        for c1 in 0..=c0 {
            let sum: f64 = points
                .iter()
                .map(|p| {
                    let d = p.as_dvec3() - center;
                    d[c0] * d[c1]
                })
                .sum();
            cov[c0][c1] = sum / n;
            cov[c1][c0] = sum / n;
        }
    }
    let (val, vec) = jacobi_eigen(cov);
    let mut cols = [Vec3::ZERO; 3];
    for i in 0..3 {
        let len = val[i].max(0.).sqrt() as f32;
        let len = if len == 0. { MIN_AXIS_LENGTH } else { len };
        cols[i] = DVec3::from_array(vec[i]).as_vec3() * len;
    }
    let mut frame = Frame {
        axes: Mat3::from_cols(cols[0], cols[1], cols[2]),
        origin: center.as_vec3(),
    };
    frame.make_right_handed();
    let eigenvalues = Vec3::new(val[0] as f32, val[1] as f32, val[2] as f32);
    (frame, eigenvalues)
}
