use std::ops::Mul;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T> Rect<T> {
    pub const fn new(x: T, y: T, width: T, height: T) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

impl Rect<f32> {
    /// The unit rectangle `(0, 0, 1, 1)`, covering a whole texture in UV space.
    pub const UNIT: Rect<f32> = Rect::new(0.0, 0.0, 1.0, 1.0);

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

impl Rect<u32> {
    /// Converts a pixel-space rectangle into the `0..1` space of a surface of
    /// the given size.
    pub fn normalize(&self, extent: Size<u32>) -> Rect<f32> {
        let width = extent.width as f32;
        let height = extent.height as f32;
        Rect {
            x: self.x as f32 / width,
            y: self.y as f32 / height,
            width: self.width as f32 / width,
            height: self.height as f32 / height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub fn new(width: T, height: T) -> Self {
        Size { width, height }
    }

    pub fn cast<U: From<T>>(self) -> Size<U> {
        Size {
            width: U::from(self.width),
            height: U::from(self.height),
        }
    }
}

impl<T: Mul + Copy> Mul<T> for Size<T> {
    type Output = Size<<T as Mul>::Output>;

    fn mul(self, rhs: T) -> Self::Output {
        Size {
            width: self.width * rhs,
            height: self.height * rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_pixel_rect() {
        let rect = Rect::new(32u32, 16, 64, 48);
        let uv = rect.normalize(Size::new(128, 64));
        assert_relative_eq!(uv.x, 0.25);
        assert_relative_eq!(uv.y, 0.25);
        assert_relative_eq!(uv.width, 0.5);
        assert_relative_eq!(uv.height, 0.75);
        assert_relative_eq!(uv.right(), 0.75);
        assert_relative_eq!(uv.bottom(), 1.0);
    }

    #[test]
    fn test_size_scale() {
        let size = Size::new(3u32, 4) * 2;
        assert_eq!(size, Size::new(6, 8));
        let wide: Size<u64> = size.cast();
        assert_eq!(wide.width, 6);
    }
}
