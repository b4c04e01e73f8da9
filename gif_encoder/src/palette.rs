use rayon::prelude::*;

use raster_core::models::{Image, Pixel};

use crate::{clustering::cluster, errors::PaletteError};

/// The only palette size the container format is written with.
pub const PALETTE_SIZE: usize = 256;

/// Fixed 256-entry color table. Index in `colors` is the color's identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: Vec<Pixel>,
}

impl Palette {

    pub fn new(colors: Vec<Pixel>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }

        if colors.len() != PALETTE_SIZE {
            return Err(PaletteError::InvalidSize {
                size: colors.len(),
            });
        }

        Ok(Palette {
            colors,
        })
    }

    pub fn grayscale() -> Self {
        Palette {
            colors: (0..PALETTE_SIZE).map(|i| Pixel::from_rgb(i as u8, i as u8, i as u8)).collect(),
        }
    }

    /// Builds a palette from the colors of the given frames with k-means. Missing entries are padded
    /// with black. The same frames and seed always produce the same palette.
    pub fn clustered(images: &[Image], seed: u64) -> Self {
        let pixels: Vec<Pixel> = images.iter()
            .flat_map(|image| image.pixels.iter().cloned())
            .collect();

        let mut colors = cluster(&pixels, PALETTE_SIZE, 1, 10, 100, seed);
        colors.resize(PALETTE_SIZE, Pixel::black());

        Palette {
            colors,
        }
    }

    pub fn colors(&self) -> &[Pixel] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: u8) -> Pixel {
        self.colors[index as usize]
    }

    /// Exact RGB membership; alpha is not compared.
    pub fn contains(&self, color: &Pixel) -> bool {
        self.colors.iter().any(|v| v.same_rgb(color))
    }

    pub fn index_of(&self, color: &Pixel) -> u8 {
        nearest(&self.colors, color) as u8
    }

    /// Quantizes a whole raster in row-major order. Pixels are looked up in parallel, the resulting
    /// order is the pixel order.
    pub fn index_image(&self, image: &Image) -> Vec<u8> {
        image.pixels.par_iter()
            .map(|pixel| self.index_of(pixel))
            .collect()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.colors.len() * 3);

        for color in &self.colors {
            data.push(color.red);
            data.push(color.green);
            data.push(color.blue);
        }

        data
    }
}

/// Index of the entry closest to `color` by euclidean RGB distance. Ties go to the lowest index.
pub fn closest_index(colors: &[Pixel], color: &Pixel) -> Result<usize, PaletteError> {
    if colors.is_empty() {
        return Err(PaletteError::Empty);
    }

    Ok(nearest(colors, color))
}

fn nearest(colors: &[Pixel], color: &Pixel) -> usize {
    let mut closest_color = 0;
    let mut closest_distance = u32::MAX;

    for (index, candidate) in colors.iter().enumerate() {
        let distance = candidate.distance_squared(color);
        if distance < closest_distance {
            closest_distance = distance;
            closest_color = index;
        }
    }

    closest_color
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_must_have_256_colors() {
        assert!(matches!(Palette::new(Vec::new()), Err(PaletteError::Empty)));
        assert!(matches!(
            Palette::new(vec![Pixel::black(); 16]),
            Err(PaletteError::InvalidSize { size: 16 })
        ));
        assert!(Palette::new(vec![Pixel::black(); 256]).is_ok());
    }

    #[test]
    fn closest_index_on_empty_palette_fails() {
        assert!(closest_index(&[], &Pixel::white()).is_err());
    }

    #[test]
    fn grayscale_lookup() {
        let palette = Palette::grayscale();

        assert_eq!(palette.index_of(&Pixel::from_rgb(0, 0, 0)), 0);
        assert_eq!(palette.index_of(&Pixel::from_rgb(255, 255, 255)), 255);
        assert_eq!(palette.index_of(&Pixel::from_rgb(100, 100, 100)), 100);
        assert_eq!(palette.index_of(&Pixel::from_rgb(90, 100, 110)), 100);
    }

    #[test]
    fn alpha_is_ignored() {
        let palette = Palette::grayscale();
        assert_eq!(palette.index_of(&Pixel::from_rgba(42, 42, 42, 0)), 42);
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        let mut colors = vec![Pixel::white(); 256];
        colors[3] = Pixel::from_rgb(10, 0, 0);
        colors[7] = Pixel::from_rgb(0, 10, 0);
        colors[9] = Pixel::from_rgb(10, 0, 0);
        let palette = Palette::new(colors).unwrap();

        assert_eq!(palette.index_of(&Pixel::black()), 3);
        assert_eq!(closest_index(palette.colors(), &Pixel::from_rgb(5, 5, 0)).unwrap(), 3);
    }

    #[test]
    fn requantizing_is_idempotent() {
        let palette = Palette::clustered(&[Image::test_image()], 7);
        let probes = [
            Pixel::from_rgb(12, 200, 3),
            Pixel::from_rgb(250, 1, 99),
            Pixel::from_rgb(128, 128, 128),
            Pixel::from_rgb(3, 155, 229),
        ];

        for probe in probes.iter() {
            let index = palette.index_of(probe);
            let quantized = palette.get(index);
            assert_eq!(palette.index_of(&quantized), index);
        }

        let gray = Palette::grayscale();
        for value in 0..=255u8 {
            let color = Pixel::from_rgb(value, value / 2, 255 - value);
            let index = gray.index_of(&color);
            assert_eq!(gray.index_of(&gray.get(index)), index);
        }
    }

    #[test]
    fn index_image_preserves_row_major_order() {
        let mut image = Image::new(3, 2);
        image.set_pixel(1, 0, Pixel::from_rgb(10, 10, 10));
        image.set_pixel(2, 1, Pixel::from_rgb(200, 200, 200));

        let indices = Palette::grayscale().index_image(&image);

        assert_eq!(indices, vec![0, 10, 0, 0, 0, 200]);
    }

    #[test]
    fn contains_compares_rgb() {
        let palette = Palette::grayscale();

        assert!(palette.contains(&Pixel::from_rgba(5, 5, 5, 0)));
        assert!(!palette.contains(&Pixel::from_rgb(5, 6, 5)));
    }

    #[test]
    fn color_table_bytes() {
        let data = Palette::grayscale().to_bytes();

        assert_eq!(data.len(), 768);
        assert_eq!(&data[0..6], &[0, 0, 0, 1, 1, 1]);
        assert_eq!(&data[765..], &[255, 255, 255]);
    }
}
