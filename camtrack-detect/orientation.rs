use camtrack_core::ImageView;

/// Circular patch used for the intensity-centroid orientation.
#[derive(Debug, Clone)]
pub struct CircularPatch {
    radius: i32,
    /// Half-width of the patch at each vertical offset `0..=radius`.
    u_max: Vec<i32>,
}

impl CircularPatch {
    pub fn new(radius: usize) -> Self {
        if radius == 0 {
            return Self {
                radius: 0,
                u_max: vec![0],
            };
        }
        let r = radius as i32;
        let mut u_max = vec![0i32; radius + 2];
        let half_diag = r as f64 * std::f64::consts::SQRT_2 / 2.0;
        let v_max = (half_diag + 1.0).floor() as i32;
        let v_min = half_diag.ceil() as i32;

        for v in 0..=v_max.min(r) {
            u_max[v as usize] = (((r * r - v * v) as f64).sqrt()).round() as i32;
        }
        // Mirror the lower octant so the patch is symmetric.
        let mut v0 = 0i32;
        let mut v = r;
        while v >= v_min {
            while u_max[v0 as usize] == u_max[v0 as usize + 1] {
                v0 += 1;
            }
            u_max[v as usize] = v0;
            v0 += 1;
            v -= 1;
        }
        u_max.truncate(radius + 1);
        Self { radius: r, u_max }
    }

    pub fn radius(&self) -> usize {
        self.radius as usize
    }

    /// Angle of the vector from `(x, y)` to the patch's intensity centroid,
    /// in degrees within `[0, 360)`. Pixels outside the image are clamped.
    pub fn angle(&self, view: &ImageView<'_>, x: usize, y: usize) -> f32 {
        let (cx, cy) = (x as i64, y as i64);
        let mut m10 = 0i64;
        let mut m01 = 0i64;

        for u in -self.radius..=self.radius {
            m10 += u as i64 * view.at_clamped(cx + u as i64, cy) as i64;
        }
        for v in 1..=self.radius {
            let d = self.u_max[v as usize];
            let mut v_sum = 0i64;
            for u in -d..=d {
                let below = view.at_clamped(cx + u as i64, cy + v as i64) as i64;
                let above = view.at_clamped(cx + u as i64, cy - v as i64) as i64;
                v_sum += below - above;
                m10 += u as i64 * (below + above);
            }
            m01 += v as i64 * v_sum;
        }

        let deg = (m01 as f32).atan2(m10 as f32).to_degrees();
        if deg < 0.0 {
            deg + 360.0
        } else {
            deg
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camtrack_core::GrayFrame;

    #[test]
    fn patch_is_round() {
        let patch = CircularPatch::new(15);
        assert_eq!(patch.u_max[0], 15);
        assert_eq!(patch.u_max[15], 3);
        assert!(patch.u_max.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn centroid_points_at_bright_side() {
        let patch = CircularPatch::new(7);
        let mut img = GrayFrame::filled(31, 31, 0);
        for y in 0..31 {
            for x in 16..31 {
                img.set(x, y, 200);
            }
        }
        let a = patch.angle(&img.view(), 15, 15);
        assert!(a < 1.0 || a > 359.0, "angle {a}");

        let mut img = GrayFrame::filled(31, 31, 0);
        for y in 16..31 {
            for x in 0..31 {
                img.set(x, y, 200);
            }
        }
        let a = patch.angle(&img.view(), 15, 15);
        assert!((a - 90.0).abs() < 1.0, "angle {a}");
    }

    #[test]
    fn flat_patch_has_zero_angle() {
        let patch = CircularPatch::new(5);
        let img = GrayFrame::filled(20, 20, 100);
        assert_eq!(patch.angle(&img.view(), 10, 10), 0.0);
    }
}
