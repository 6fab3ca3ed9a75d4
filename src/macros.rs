/// Assert that two `f32` values differ by at most `eps`, which defaults to
/// `f32::EPSILON`. Each argument is evaluated once.
#[cfg(test)]
macro_rules! assert_f32_eq {
    ($a:expr, $b:expr, $eps:expr) => {{
        let (a, b, eps): (f32, f32, f32) = ($a, $b, $eps);
        let error = (a - b).abs();
        assert!(
            error <= eps,
            "{} = {a} and {} = {b} differ by {error:e}, more than {eps:e}",
            stringify!($a),
            stringify!($b),
        );
    }};
    ($a:expr, $b:expr) => {
        $crate::macros::assert_f32_eq!($a, $b, f32::EPSILON)
    };
}

/// Assert that two points are within `eps` of each other along every axis.
#[cfg(test)]
macro_rules! assert_vec3_eq {
    ($a:expr, $b:expr, $eps:expr) => {{
        let (a, b): (glam::Vec3, glam::Vec3) = ($a, $b);
        assert!(
            a.abs_diff_eq(b, $eps),
            "{} = {a} and {} = {b} are farther apart than {}",
            stringify!($a),
            stringify!($b),
            $eps,
        );
    }};
}

#[cfg(test)]
pub(crate) use assert_f32_eq;
#[cfg(test)]
pub(crate) use assert_vec3_eq;
