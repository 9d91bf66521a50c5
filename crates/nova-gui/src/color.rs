/// Opaque vertex color; GUI vertices carry no alpha.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// From a packed `0xAARRGGBB` color; alpha is dropped.
    pub fn from_argb(argb: u32) -> Self {
        let c = |shift: u32| ((argb >> shift) & 0xFF) as f32 / 255.0;
        Rgb::new(c(16), c(8), c(0))
    }

    pub fn blend(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let inv = 1.0 - t;
        Rgb::new(
            self.r * inv + other.r * t,
            self.g * inv + other.g * t,
            self.b * inv + other.b * t,
        )
    }

    pub fn scale(self, factor: f32) -> Rgb {
        let f = factor.max(0.0);
        Rgb::new(
            (self.r * f).min(1.0),
            (self.g * f).min(1.0),
            (self.b * f).min(1.0),
        )
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_unpacks_channels() {
        let c = Rgb::from_argb(0x80FF0000);
        assert_eq!(c, Rgb::new(1.0, 0.0, 0.0));
        let c = Rgb::from_argb(0xFF00FF00);
        assert_eq!(c.g, 1.0);
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(Rgb::WHITE.blend(Rgb::BLACK, 0.0), Rgb::WHITE);
        assert_eq!(Rgb::WHITE.blend(Rgb::BLACK, 1.0), Rgb::BLACK);
    }
}
